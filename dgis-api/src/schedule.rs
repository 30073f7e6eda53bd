use serde::Deserialize;

/// Envelope of a schedule API response.
///
/// One envelope carries several sub-responses (one per queried stop or
/// variant); only those with `status == "ok"` contain usable schedules.
#[derive(Deserialize, Debug, Clone)]
pub struct ScheduleEnvelope {
    #[serde(default)]
    pub responses: Vec<ScheduleResponse>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ScheduleEntry {
    #[serde(default)]
    pub schedule: Option<TripSchedule>,
}

/// The schedule of a single trip variant.
#[derive(Deserialize, Debug, Clone)]
pub struct TripSchedule {
    /// `"interval_trip"` denotes a recurring frequency-based service.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Headway in minutes, for interval trips.
    #[serde(default)]
    pub period: Option<u32>,
    #[serde(default)]
    pub work_hours: Option<WorkHours>,
}

/// Service window as epoch seconds.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct WorkHours {
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub finish_time: Option<i64>,
}

impl WorkHours {
    /// Returns the (start, finish) pair when both bounds are present.
    pub fn range(&self) -> Option<(i64, i64)> {
        Some((self.start_time?, self.finish_time?))
    }
}

impl ScheduleEnvelope {
    /// Finds the first usable interval-trip schedule in the envelope.
    ///
    /// A schedule is usable when its sub-response status is `"ok"` and the
    /// trip is a recurring interval trip with both a period and a complete
    /// work-hours window.
    pub fn first_interval_trip(&self) -> Option<&TripSchedule> {
        self.responses
            .iter()
            .filter(|response| response.status == "ok")
            .filter_map(|response| response.schedules.first())
            .filter_map(|entry| entry.schedule.as_ref())
            .find(|schedule| {
                schedule.kind == "interval_trip"
                    && schedule.period.is_some()
                    && schedule.work_hours.is_some_and(|hours| hours.range().is_some())
            })
    }
}
