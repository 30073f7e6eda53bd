//! Response and listing URL classification.
//!
//! The collector never calls these endpoints itself; it observes the
//! requests the map UI makes and classifies them by URL fragment, the same
//! way the response interceptor matches them in the browser.

use regex::Regex;
use std::sync::LazyLock;

/// URL fragment identifying a route detail response.
pub const DETAIL_URL_MARKER: &str = "byid";

/// URL fragment identifying a schedule response.
pub const SCHEDULE_URL_MARKER: &str = "routing.api.2gis.com/ctx/search_schedule";

static ROUTE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"routes/(\d+)").expect("static regex"));
static PAGE_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&]page=(\d+)").expect("static regex"));
static PAGE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/page/(\d+)").expect("static regex"));

/// Whether this URL belongs to the route detail stream.
pub fn is_detail_url(url: &str) -> bool {
    url.contains(DETAIL_URL_MARKER)
}

/// Whether this URL belongs to the schedule stream.
pub fn is_schedule_url(url: &str) -> bool {
    url.contains(SCHEDULE_URL_MARKER)
}

/// Extracts the route identifier from a schedule request URL.
///
/// Schedule requests embed the route id in the path as `routes/<digits>`.
pub fn route_id_from_schedule_url(url: &str) -> Option<String> {
    ROUTE_ID
        .captures(url)
        .map(|captures| captures[1].to_string())
}

/// Extracts the page number from a results listing URL.
///
/// Both `?page=N` query parameters and `/page/N` path segments occur in the
/// wild. Returns `None` when neither is present (the first page carries no
/// page marker at all).
pub fn page_number_from_url(url: &str) -> Option<u32> {
    PAGE_QUERY
        .captures(url)
        .or_else(|| PAGE_PATH.captures(url))
        .and_then(|captures| captures[1].parse().ok())
}
