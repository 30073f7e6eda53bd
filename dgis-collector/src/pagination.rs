//! Advancement through paginated result listings.
//!
//! Result pages link to each other with heuristic markup, including stale
//! and duplicate links. The walker tracks every page number it has been on
//! and refuses to revisit one, which bounds the walk on any finite link
//! graph. The current page is marked visited *before* the next link is
//! chosen, so a page whose pagination later fails is still never re-entered.

use crate::navigator::{PageElement, PageNavigator};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Pagination link selectors, tried in order; the first selector yielding
/// any usable link wins.
pub const PAGINATION_SELECTORS: &[&str] = &[
    "a._1q8es29[href*=\"page\"]",
    "a[href*=\"page\"]",
    "a[href*=\"Page\"]",
    ".pagination a[href*=\"page\"]",
    "[class*=\"pagination\"] a[href*=\"page\"]",
    "a[data-testid*=\"page\"]",
];

/// A pagination link with its parsed target page number.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub element: PageElement,
    pub page: u32,
}

/// Outcome of one advancement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Navigation to the given page number was triggered and settled.
    Advanced(u32),
    /// No unvisited forward link remains; the walk is over.
    Exhausted,
}

pub struct PaginationWalker {
    visited: BTreeSet<u32>,
    current: u32,
}

impl Default for PaginationWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationWalker {
    pub fn new() -> Self {
        PaginationWalker {
            visited: BTreeSet::new(),
            current: 1,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current
    }

    /// Page numbers already visited. Grows monotonically.
    pub fn visited(&self) -> &BTreeSet<u32> {
        &self.visited
    }

    /// Syncs the walker with the page the navigator is on and marks it
    /// visited. A URL without a page marker is page 1.
    fn mark_current(&mut self, url: &str) {
        self.current = dgis_api::page_number_from_url(url).unwrap_or(1);
        self.visited.insert(self.current);
    }

    /// Picks the next link: an exact `current + 1` target if one exists,
    /// otherwise the smallest unvisited target strictly beyond the current
    /// page.
    fn choose_next<'a>(&self, links: &'a [PageLink]) -> Option<&'a PageLink> {
        links
            .iter()
            .find(|link| link.page == self.current + 1 && !self.visited.contains(&link.page))
            .or_else(|| {
                links
                    .iter()
                    .filter(|link| link.page > self.current && !self.visited.contains(&link.page))
                    .min_by_key(|link| link.page)
            })
    }

    /// Attempts to advance to the next results page.
    ///
    /// Every failure along the way (selector errors, a vanished link, an
    /// unsettled navigation) degrades to [`Advance::Exhausted`] or a logged
    /// warning; pagination never aborts the session.
    pub async fn advance<N: PageNavigator + ?Sized>(
        &mut self,
        navigator: &mut N,
        timeout: Duration,
    ) -> Advance {
        self.mark_current(&navigator.current_url());

        let links = collect_links(navigator).await;
        let Some(next) = self.choose_next(&links) else {
            debug!(
                current = self.current,
                candidates = links.len(),
                "no unvisited forward page link"
            );
            return Advance::Exhausted;
        };
        let target = next.page;

        match navigator.click(&next.element.selector, next.element.index).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(target, "pagination link vanished before the click");
                return Advance::Exhausted;
            }
            Err(error) => {
                warn!(%error, target, "failed to click pagination link");
                return Advance::Exhausted;
            }
        }
        if let Err(error) = navigator.wait_for_navigation(timeout).await {
            warn!(%error, target, "pagination navigation did not settle");
        }

        Advance::Advanced(target)
    }
}

/// Enumerates pagination links with the first selector strategy that yields
/// any. Links whose href carries no parsable page number are dropped.
async fn collect_links<N: PageNavigator + ?Sized>(navigator: &mut N) -> Vec<PageLink> {
    for selector in PAGINATION_SELECTORS {
        let elements = match navigator.query_all(selector).await {
            Ok(elements) => elements,
            Err(error) => {
                debug!(%error, selector, "pagination selector failed");
                continue;
            }
        };
        let links: Vec<PageLink> = elements
            .into_iter()
            .filter_map(|element| {
                let page = dgis_api::page_number_from_url(element.href.as_deref()?)?;
                Some(PageLink { element, page })
            })
            .collect();
        if !links.is_empty() {
            return links;
        }
    }
    Vec::new()
}
