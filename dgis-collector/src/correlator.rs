//! Correlation of the two response streams into merged route records.
//!
//! A click on a route candidate triggers two independent network
//! completions: the route detail ("byid") response and the schedule
//! response. They share a route identifier but arrive in no guaranteed
//! order. The correlator buffers schedule fragments keyed by route id and
//! consumes them when the matching detail document arrives; if the detail
//! document arrives first, the merged record simply carries no schedule.
//!
//! The correlator runs as its own task over a bounded event channel and is
//! the sole owner of the pending-fragment map, so no locking is needed.

use crate::navigator::ResponseEvent;
use crate::store::RecordStore;
use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use dgis_api::{DetailEnvelope, RouteItem, ScheduleEnvelope};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Schedule data buffered until the matching detail document arrives.
///
/// At most one fragment is buffered per route id; a later schedule response
/// for the same id replaces an unconsumed one (last-write-wins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFragment {
    /// Display interval, e.g. `каждые 12 минут`.
    pub interval: Option<String>,
    /// Service window, e.g. `06:00–22:30` (local wall clock).
    pub hours: Option<String>,
}

/// One entry of the in-memory collected-routes log.
#[derive(Debug, Clone)]
pub struct CollectedRoute {
    pub id: String,
    /// URL of the detail response this record came from.
    pub url: String,
    /// File name of the persisted JSON artifact.
    pub file_name: String,
    pub collected_at: DateTime<Utc>,
}

/// Summary of a finished collection session.
#[derive(Debug, Default)]
pub struct SessionSummary {
    pub routes: Vec<CollectedRoute>,
}

pub struct ResponseCorrelator {
    pending: std::collections::HashMap<String, ScheduleFragment>,
    collected: Vec<CollectedRoute>,
    store: RecordStore,
}

impl ResponseCorrelator {
    pub fn new(store: RecordStore) -> Self {
        ResponseCorrelator {
            pending: std::collections::HashMap::new(),
            collected: Vec::new(),
            store,
        }
    }

    /// Consumes the response stream until the channel closes, then returns
    /// the session summary. Unconsumed schedule fragments are dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<ResponseEvent>) -> SessionSummary {
        while let Some(event) = events.recv().await {
            self.observe(event).await;
        }
        SessionSummary {
            routes: self.collected,
        }
    }

    /// Processes one observed response.
    ///
    /// Malformed payloads are logged and skipped; nothing here aborts the
    /// session.
    pub async fn observe(&mut self, event: ResponseEvent) {
        if event.status != 200 {
            return;
        }
        if dgis_api::is_detail_url(&event.url) {
            self.observe_detail(&event).await;
        } else if dgis_api::is_schedule_url(&event.url) {
            self.observe_schedule(&event);
        }
    }

    fn observe_schedule(&mut self, event: &ResponseEvent) {
        let Some(route_id) = dgis_api::route_id_from_schedule_url(&event.url) else {
            debug!(url = %event.url, "schedule response without a route id in the path");
            return;
        };
        let envelope: ScheduleEnvelope = match serde_json::from_str(&event.body) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(%error, url = %event.url, "discarding malformed schedule payload");
                return;
            }
        };
        if let Some(fragment) = fragment_from_envelope(&envelope) {
            debug!(route_id, interval = ?fragment.interval, "buffered schedule fragment");
            // Replaces any prior unconsumed fragment for this id.
            self.pending.insert(route_id, fragment);
        }
    }

    async fn observe_detail(&mut self, event: &ResponseEvent) {
        let document: JsonValue = match serde_json::from_str(&event.body) {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, url = %event.url, "discarding malformed detail payload");
                return;
            }
        };
        let route = {
            let envelope: DetailEnvelope = match serde_json::from_value(document.clone()) {
                Ok(envelope) => envelope,
                Err(error) => {
                    warn!(%error, url = %event.url, "detail payload has an unexpected shape");
                    return;
                }
            };
            let Some(route) = envelope.first_route() else {
                // The byid endpoint also serves non-route objects.
                return;
            };
            route.clone()
        };

        // Lookup, never wait: if the schedule has not arrived yet, the
        // merged record carries no interval/hours.
        let fragment = self.pending.remove(&route.id);

        match self.store.persist(&route, document, fragment).await {
            Ok(file_name) => {
                info!(route_id = %route.id, file_name, "persisted route");
                self.collected.push(CollectedRoute {
                    id: route.id.clone(),
                    url: event.url.clone(),
                    file_name,
                    collected_at: Utc::now(),
                });
            }
            Err(error) => {
                warn!(%error, route_id = %route.id, "failed to persist route");
            }
        }
    }

    #[cfg(test)]
    fn pending_fragment(&self, route_id: &str) -> Option<&ScheduleFragment> {
        self.pending.get(route_id)
    }
}

/// Builds a schedule fragment from the first usable interval-trip schedule
/// in the envelope, if any.
pub fn fragment_from_envelope(envelope: &ScheduleEnvelope) -> Option<ScheduleFragment> {
    let schedule = envelope.first_interval_trip()?;
    let period = schedule.period?;
    let (start, finish) = schedule.work_hours?.range()?;
    Some(ScheduleFragment {
        interval: Some(format!("каждые {period} минут")),
        hours: format_work_hours(start, finish),
    })
}

/// Formats a service window as `HH:MM–HH:MM` in local wall-clock time.
pub fn format_work_hours(start: i64, finish: i64) -> Option<String> {
    format_work_hours_in(&Local, start, finish)
}

fn format_work_hours_in<Tz: TimeZone>(tz: &Tz, start: i64, finish: i64) -> Option<String> {
    let start = tz.timestamp_opt(start, 0).single()?;
    let finish = tz.timestamp_opt(finish, 0).single()?;
    Some(format!(
        "{:02}:{:02}–{:02}:{:02}",
        start.hour(),
        start.minute(),
        finish.hour(),
        finish.minute()
    ))
}

/// Builds the `additional_info` object injected into the persisted document.
pub(crate) fn additional_info(
    route: &RouteItem,
    fragment: Option<&ScheduleFragment>,
) -> JsonValue {
    let terminus = |name: &Option<String>| name.as_deref().unwrap_or("").to_string();
    let route_line = format!("{} → {}", terminus(&route.from_name), terminus(&route.to_name));
    serde_json::json!({
        "name": format!("{} - {route_line}", route.name.as_deref().unwrap_or("unknown")),
        "route": route_line,
        "interval": fragment.and_then(|fragment| fragment.interval.clone()),
        "hours": fragment.and_then(|fragment| fragment.hours.clone()),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::RecordStore;
    use serde_json::json;
    use std::path::PathBuf;

    fn temp_base(tag: &str) -> PathBuf {
        let base = std::env::temp_dir().join(format!(
            "dgis-correlator-{tag}-{}",
            std::process::id()
        ));
        // Start from a clean slate; earlier runs may have left artifacts.
        let _ = std::fs::remove_dir_all(&base);
        base
    }

    fn detail_event(route_id: &str, name: &str) -> ResponseEvent {
        ResponseEvent {
            url: format!("https://catalog.api.2gis.com/3.0/items/byid?id={route_id}"),
            status: 200,
            body: json!({
                "result": {
                    "items": [{
                        "type": "route",
                        "id": route_id,
                        "name": name,
                        "from_name": "A",
                        "to_name": "B",
                        "directions": [{
                            "type": "forward",
                            "platforms": [
                                { "name": "Stop", "geometry": { "centroid": "POINT(66.9 39.6)" } }
                            ]
                        }]
                    }]
                }
            })
            .to_string(),
        }
    }

    fn schedule_event(route_id: &str, period: u32) -> ResponseEvent {
        ResponseEvent {
            url: format!(
                "https://routing.api.2gis.com/ctx/search_schedule/routes/{route_id}?lang=ru"
            ),
            status: 200,
            body: json!({
                "responses": [{
                    "status": "ok",
                    "schedules": [{
                        "schedule": {
                            "type": "interval_trip",
                            "period": period,
                            "work_hours": { "start_time": 21_600, "finish_time": 79_200 }
                        }
                    }]
                }]
            })
            .to_string(),
        }
    }

    async fn persisted_additional_info(base: &std::path::Path, name: &str) -> JsonValue {
        let path = base.join("routes").join("samarkand").join(format!("{name}.json"));
        let raw = tokio::fs::read(path).await.expect("artifact written");
        let document: JsonValue = serde_json::from_slice(&raw).expect("valid artifact");
        document["additional_info"].clone()
    }

    fn correlator(base: &std::path::Path) -> ResponseCorrelator {
        ResponseCorrelator::new(RecordStore::new(base, "samarkand"))
    }

    #[tokio::test]
    async fn merge_is_order_independent() {
        let base = temp_base("order");

        let mut first = correlator(&base);
        first.observe(schedule_event("1", 12)).await;
        first.observe(detail_event("1", "22")).await;
        let schedule_first = persisted_additional_info(&base, "22").await;

        let mut second = correlator(&base);
        second.observe(detail_event("1", "22")).await;
        second.observe(schedule_event("1", 12)).await;
        let detail_first = persisted_additional_info(&base, "22").await;

        // Detail-first has no schedule at merge time; the interval is null.
        assert_eq!(detail_first["interval"], JsonValue::Null);
        assert_eq!(schedule_first["interval"], "каждые 12 минут");
        // Everything except the merged schedule is identical either way.
        assert_eq!(schedule_first["name"], detail_first["name"]);
        assert_eq!(schedule_first["route"], detail_first["route"]);
    }

    #[tokio::test]
    async fn merged_record_is_identical_when_schedule_precedes_detail() {
        let base = temp_base("merged");

        let mut correlator = correlator(&base);
        correlator.observe(schedule_event("9", 7)).await;
        correlator.observe(detail_event("9", "9A")).await;

        let info = persisted_additional_info(&base, "9A").await;
        assert_eq!(info["interval"], "каждые 7 минут");
        assert_eq!(info["name"], "9A - A → B");
        assert_eq!(info["route"], "A → B");
        assert_eq!(correlator.collected.len(), 1);
        assert_eq!(correlator.collected[0].id, "9");
        // Consumed on merge.
        assert!(correlator.pending_fragment("9").is_none());
    }

    #[tokio::test]
    async fn second_schedule_overwrites_unconsumed_fragment() {
        let base = temp_base("overwrite");

        let mut correlator = correlator(&base);
        correlator.observe(schedule_event("5", 10)).await;
        correlator.observe(schedule_event("5", 20)).await;
        assert_eq!(
            correlator
                .pending_fragment("5")
                .and_then(|fragment| fragment.interval.as_deref()),
            Some("каждые 20 минут")
        );

        correlator.observe(detail_event("5", "5")).await;
        let info = persisted_additional_info(&base, "5").await;
        assert_eq!(info["interval"], "каждые 20 минут");
    }

    #[tokio::test]
    async fn malformed_payloads_are_swallowed() {
        let base = temp_base("malformed");

        let mut correlator = correlator(&base);
        correlator
            .observe(ResponseEvent {
                url: "https://catalog.api.2gis.com/3.0/items/byid?id=1".into(),
                status: 200,
                body: "{ not json".into(),
            })
            .await;
        correlator
            .observe(ResponseEvent {
                url: "https://routing.api.2gis.com/ctx/search_schedule/routes/1".into(),
                status: 200,
                body: "[]".into(),
            })
            .await;
        // Non-200s are ignored outright.
        let mut rejected = detail_event("1", "22");
        rejected.status = 404;
        correlator.observe(rejected).await;

        assert!(correlator.collected.is_empty());
    }

    #[tokio::test]
    async fn non_route_items_are_ignored() {
        let base = temp_base("nonroute");

        let mut correlator = correlator(&base);
        correlator
            .observe(ResponseEvent {
                url: "https://catalog.api.2gis.com/3.0/items/byid?id=2".into(),
                status: 200,
                body: json!({
                    "result": { "items": [{ "type": "building", "id": "2" }] }
                })
                .to_string(),
            })
            .await;

        assert!(correlator.collected.is_empty());
    }

    #[test]
    fn work_hours_formatting_is_wall_clock() {
        // 06:00 and 22:30 UTC on 2023-11-14.
        let formatted = format_work_hours_in(&Utc, 1_699_941_600, 1_700_001_000)
            .expect("in-range timestamps");
        assert_eq!(formatted, "06:00–22:30");
    }

    #[test]
    fn fragment_requires_a_usable_schedule() {
        let envelope: ScheduleEnvelope = serde_json::from_value(json!({
            "responses": [{ "status": "ok", "schedules": [] }]
        }))
        .expect("valid envelope");
        assert!(fragment_from_envelope(&envelope).is_none());
    }
}
