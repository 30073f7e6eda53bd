//! # 2GIS API data models
//!
//! Serde models for the two API payloads the collector observes while
//! driving the map UI: the route detail ("byid") envelope and the schedule
//! envelope, plus helpers for classifying response URLs and pulling
//! identifiers out of them.
//!
//! All fields are modeled leniently (`Option` + `#[serde(default)]`):
//! the payloads are not a contract we control, and a missing field should
//! degrade to "no data" rather than a parse failure for the whole response.

// Private modules by default
mod detail;
mod schedule;
mod url;

pub use detail::{
    DetailEnvelope, DetailResult, Direction, DirectionGeometry, GeometrySegment, Platform,
    PlatformGeometry, RouteItem,
};
pub use schedule::{ScheduleEntry, ScheduleEnvelope, ScheduleResponse, TripSchedule, WorkHours};
pub use url::{
    DETAIL_URL_MARKER, SCHEDULE_URL_MARKER, is_detail_url, is_schedule_url, page_number_from_url,
    route_id_from_schedule_url,
};
