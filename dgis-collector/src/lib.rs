//! # 2GIS transit route collector
//!
//! Drives a headless browser against the 2GIS map UI to discover bus and
//! tram routes for a city, correlates the asynchronous API responses the UI
//! triggers into one merged record per route, and persists each record as a
//! JSON document plus a GeoJSON feature collection under `routes/<city>/`.
//!
//! The browser itself is not part of this crate: the host supplies a
//! [`PageNavigator`] implementation and the matching response-event stream,
//! and subscribes to `tracing` for progress reporting. See
//! [`start_collection`] for the entry point.

// Private modules by default
mod control;
mod correlator;
mod discovery;
mod navigator;
mod pagination;
mod session;
mod store;

// Pub use for re-export without too many levels of hierarchy;
// most modules only have a couple of definitions worth exporting.
pub use control::{CollectorHandle, start_collection};
pub use correlator::{
    CollectedRoute, ResponseCorrelator, ScheduleFragment, SessionSummary, format_work_hours,
    fragment_from_envelope,
};
pub use discovery::{CANDIDATE_SELECTORS, DiscoveryLoop, SCHEDULE_TAB_SELECTOR, looks_like_route};
pub use navigator::{NavigatorError, PageElement, PageNavigator, ResponseEvent, WatchId};
pub use pagination::{Advance, PAGINATION_SELECTORS, PageLink, PaginationWalker};
pub use session::{
    BASE_URL, DEFAULT_TIMEOUT, SEARCH_QUERY, Session, SessionError, SessionOptions,
};
pub use store::{RecordStore, StoreError};
