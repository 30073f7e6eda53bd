//! Per-page enumeration and activation of route candidates.
//!
//! Candidates are found with an ordered list of selector strategies; the
//! first strategy producing any plausible route element wins outright
//! (first-match-wins, not a union). Activating a candidate triggers the
//! detail and schedule responses the correlator consumes; the loop itself
//! only paces the browser and isolates per-candidate failures.

use crate::navigator::{NavigatorError, PageElement, PageNavigator};
use std::time::Duration;
use tracing::{debug, warn};

/// Candidate selector strategies, tried in order.
pub const CANDIDATE_SELECTORS: &[&str] = &[
    "[data-testid=\"search-result-item\"]",
    ".search-results-item",
    ".minicard",
    ".search-result",
    "[class*=\"searchResult\"]",
    "[class*=\"miniCard\"]",
    "a[href*=\"route\"]",
];

/// Selector for the schedule tab on a route page.
pub const SCHEDULE_TAB_SELECTOR: &str = "[class*=\"schedule\"], [data-testid*=\"schedule\"], \
     [class*=\"timetable\"], [href*=\"schedule\"], [class*=\"working-hours\"], [class*=\"time\"]";

/// Route-type markers in candidate text: bus (`М`) and tram (`Т`) line
/// prefixes plus the word for "bus", as the site renders them.
const ROUTE_TEXT_MARKERS: &[&str] = &["М", "Т", "автобус"];

const SCHEDULE_TAB_ATTEMPTS: u32 = 3;

/// Whether an element plausibly denotes a transit route.
pub fn looks_like_route(text: &str, href: Option<&str>) -> bool {
    let text = text.trim();
    ROUTE_TEXT_MARKERS.iter().any(|marker| text.contains(marker))
        || href.is_some_and(|href| href.contains("route"))
        || (!text.is_empty() && text.chars().all(|c| c.is_ascii_digit()))
}

pub struct DiscoveryLoop {
    timeout: Duration,
}

impl DiscoveryLoop {
    pub fn new(timeout: Duration) -> Self {
        DiscoveryLoop { timeout }
    }

    /// Processes every route candidate on the current results page.
    ///
    /// Returns the number of candidates found. A failure on any single
    /// candidate is logged and the loop continues with the next one.
    pub async fn run_page<N: PageNavigator + ?Sized>(&self, navigator: &mut N) -> usize {
        let candidates = self.enumerate(navigator).await;
        let total = candidates.len();

        for (position, candidate) in candidates.iter().enumerate() {
            if let Err(error) = self.visit(navigator, candidate).await {
                warn!(
                    %error,
                    position,
                    text = %candidate.text,
                    "skipping route candidate"
                );
            }
        }

        total
    }

    /// Enumerates candidates with the first selector strategy that yields
    /// any plausible route element.
    async fn enumerate<N: PageNavigator + ?Sized>(&self, navigator: &mut N) -> Vec<PageElement> {
        // Tolerated on failure: results may already be rendered.
        if let Err(error) = navigator
            .wait_for_selector(CANDIDATE_SELECTORS[0], self.timeout)
            .await
        {
            debug!(%error, "results container did not appear; probing anyway");
        }

        for selector in CANDIDATE_SELECTORS {
            let elements = match navigator.query_all(selector).await {
                Ok(elements) => elements,
                Err(error) => {
                    debug!(%error, selector, "candidate selector failed");
                    continue;
                }
            };
            let matches: Vec<PageElement> = elements
                .into_iter()
                .filter(|element| looks_like_route(&element.text, element.href.as_deref()))
                .collect();
            if !matches.is_empty() {
                debug!(selector, count = matches.len(), "found route candidates");
                return matches;
            }
        }

        Vec::new()
    }

    /// Activates one candidate: arms both response watchers, clicks, probes
    /// for a schedule tab, waits everything out, and returns to the results
    /// listing if navigation moved away from it.
    async fn visit<N: PageNavigator + ?Sized>(
        &self,
        navigator: &mut N,
        candidate: &PageElement,
    ) -> Result<(), NavigatorError> {
        // Arm before clicking: either response can complete before the
        // click call returns.
        let detail_watch = navigator.arm_response_watch(dgis_api::DETAIL_URL_MARKER);
        let schedule_watch = navigator.arm_response_watch(dgis_api::SCHEDULE_URL_MARKER);

        if !navigator.click(&candidate.selector, candidate.index).await? {
            debug!(text = %candidate.text, "candidate vanished before the click");
            return Ok(());
        }

        // The schedule tab is optional and its markup is unstable; probe a
        // few times, scrolling in between to force lazy content.
        for attempt in 1..=SCHEDULE_TAB_ATTEMPTS {
            match navigator.click(SCHEDULE_TAB_SELECTOR, 0).await {
                Ok(true) => {}
                Ok(false) => debug!(attempt, "schedule tab not found"),
                Err(error) => debug!(%error, attempt, "schedule tab probe failed"),
            }
            if let Err(error) = navigator.scroll_to_bottom().await {
                debug!(%error, "scroll failed");
            }
        }

        if let Err(error) = navigator.wait_for_navigation(self.timeout).await {
            warn!(%error, "navigation after candidate click did not settle");
        }

        // The detail response is required for a record; the schedule
        // response is best-effort.
        if let Err(error) = navigator.await_response(detail_watch, self.timeout).await {
            warn!(%error, text = %candidate.text, "no route detail response for candidate");
        }
        if navigator
            .await_response(schedule_watch, self.timeout)
            .await
            .is_err()
        {
            debug!(text = %candidate.text, "no schedule response for candidate");
        }

        let url = navigator.current_url();
        if url.contains("route") || !url.contains("search") {
            navigator.go_back().await?;
            if let Err(error) = navigator.wait_for_navigation(self.timeout).await {
                warn!(%error, "navigation back to the results listing did not settle");
            }
        }

        Ok(())
    }
}
