//! The browser capability surface.
//!
//! The collector does not implement browser automation itself; it consumes a
//! [`PageNavigator`] supplied by the host (a headless browser wrapper, or a
//! scripted fake in tests). The trait mirrors the handful of page operations
//! the collection session actually performs.
//!
//! Alongside the navigator, the host supplies a bounded
//! [`tokio::sync::mpsc`] receiver of [`ResponseEvent`]s: every API response
//! the page produces, in arrival order, independent of whatever the session
//! task is currently awaiting. The host must close that channel (drop the
//! sender) when the navigator is dropped, otherwise the correlator task
//! never observes end-of-session.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigatorError {
    /// A bounded wait (navigation, selector, response) elapsed.
    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout { timeout: Duration, what: String },
    /// The browser session itself failed (page crashed, connection lost).
    #[error("browser session error: {0}")]
    Session(String),
}

/// A network response observed by the page.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub url: String,
    /// HTTP status; the correlator only consumes 200s.
    pub status: u16,
    pub body: String,
}

/// An element matched on the current page.
///
/// Elements are addressed by `(selector, index)` rather than by handle:
/// the page may re-render between enumeration and activation, and a stale
/// handle would fail where a re-query succeeds.
#[derive(Debug, Clone)]
pub struct PageElement {
    pub selector: String,
    pub index: usize,
    /// Visible text, trimmed.
    pub text: String,
    pub href: Option<String>,
}

/// Token for a response watcher armed before the interaction that triggers
/// the response. Arming must happen first: the response can complete before
/// the interaction call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Page operations the collection session performs.
///
/// All waits are bounded by the timeout passed per call; exceeding it is a
/// recoverable [`NavigatorError::Timeout`], not a session failure.
#[async_trait]
pub trait PageNavigator: Send {
    /// Navigates to an absolute URL and waits for the page to settle.
    ///
    /// # Errors
    ///
    /// Fails on navigation timeout or a broken browser session.
    async fn goto(&mut self, url: &str) -> Result<(), NavigatorError>;

    /// Types a query into the site search input and submits it.
    ///
    /// # Errors
    ///
    /// Fails when no search input can be located or the session is broken.
    async fn search(&mut self, query: &str) -> Result<(), NavigatorError>;

    /// Returns all elements matching a selector on the current page.
    ///
    /// # Errors
    ///
    /// Fails only on a broken session; a selector matching nothing yields
    /// an empty vec.
    async fn query_all(&mut self, selector: &str) -> Result<Vec<PageElement>, NavigatorError>;

    /// Clicks the `index`-th element matching `selector`.
    ///
    /// Returns `false` when no such element exists anymore (a click miss,
    /// not an error).
    ///
    /// # Errors
    ///
    /// Fails only on a broken session.
    async fn click(&mut self, selector: &str, index: usize) -> Result<bool, NavigatorError>;

    /// Scrolls the page to the bottom, forcing lazy content to load.
    ///
    /// # Errors
    ///
    /// Fails only on a broken session.
    async fn scroll_to_bottom(&mut self) -> Result<(), NavigatorError>;

    /// Waits until an element matching `selector` appears.
    ///
    /// # Errors
    ///
    /// Fails with [`NavigatorError::Timeout`] when nothing appears in time.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), NavigatorError>;

    /// Arms a watcher for the next successful response whose URL contains
    /// `url_fragment`. Responses arriving after this call are captured even
    /// if [`PageNavigator::await_response`] is called later.
    fn arm_response_watch(&mut self, url_fragment: &str) -> WatchId;

    /// Waits for the response captured by a previously armed watcher.
    ///
    /// # Errors
    ///
    /// Fails with [`NavigatorError::Timeout`] when no matching response
    /// arrives in time.
    async fn await_response(
        &mut self,
        watch: WatchId,
        timeout: Duration,
    ) -> Result<ResponseEvent, NavigatorError>;

    /// Waits for an in-flight navigation to settle.
    ///
    /// # Errors
    ///
    /// Fails with [`NavigatorError::Timeout`] when the page does not settle
    /// in time.
    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), NavigatorError>;

    /// Navigates back in page history.
    ///
    /// # Errors
    ///
    /// Fails only on a broken session.
    async fn go_back(&mut self) -> Result<(), NavigatorError>;

    /// The URL of the current page.
    fn current_url(&self) -> String;
}
