//! The collection session: one browser page, one city, one walk over the
//! paginated route listing.
//!
//! The session owns the navigator and drives it strictly sequentially,
//! while the correlator task consumes the response stream concurrently.
//! Shared mutable state is confined to those two actors: the correlator
//! alone owns the pending-fragment map, the walker alone owns the
//! visited-pages set.

use crate::correlator::{ResponseCorrelator, SessionSummary};
use crate::discovery::DiscoveryLoop;
use crate::navigator::{NavigatorError, PageNavigator, ResponseEvent};
use crate::pagination::{Advance, PaginationWalker};
use crate::store::RecordStore;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The search query that surfaces the bus route listing.
pub const SEARCH_QUERY: &str = "Маршруты автобусов";

/// Base URL of the map site; the city slug is appended.
pub const BASE_URL: &str = "https://2gis.uz";

/// Default bound for every navigation, selector, and response wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// City slug, normalized to lower case and trimmed.
    pub city: String,
    pub timeout: Duration,
    /// Directory under which `routes/<city>/` is created.
    pub output_dir: PathBuf,
}

impl SessionOptions {
    pub fn new(city: &str) -> Self {
        SessionOptions {
            city: city.trim().to_lowercase(),
            timeout: DEFAULT_TIMEOUT,
            output_dir: PathBuf::from("."),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// No usable city name was supplied.
    #[error("no city name given")]
    EmptyCity,
    /// The initial navigation to the city map failed. Fatal: nothing can
    /// be collected without a page.
    #[error("failed to open the city map: {0}")]
    Init(#[source] NavigatorError),
    /// The search query could not be submitted.
    #[error("failed to submit the route search: {0}")]
    Search(#[source] NavigatorError),
    /// The correlator task panicked or was cancelled out from under us.
    #[error("correlator task failed: {0}")]
    Correlator(#[from] tokio::task::JoinError),
    /// The session was stopped before it finished.
    #[error("collection stopped")]
    Stopped,
}

/// A collection session over an injected navigator.
///
/// `responses` must be the bounded response-event stream belonging to the
/// same browser page as `navigator`; the host closes it when the page goes
/// away (see the [`crate::navigator`] module docs).
pub struct Session<N> {
    navigator: N,
    responses: mpsc::Receiver<ResponseEvent>,
    options: SessionOptions,
}

impl<N: PageNavigator + 'static> Session<N> {
    pub fn new(
        navigator: N,
        responses: mpsc::Receiver<ResponseEvent>,
        options: SessionOptions,
    ) -> Self {
        Session {
            navigator,
            responses,
            options,
        }
    }

    /// Runs the session to completion.
    ///
    /// Whatever has been persisted when this returns stays persisted,
    /// including on error.
    ///
    /// # Errors
    ///
    /// Initialization failures ([`SessionError::Init`],
    /// [`SessionError::Search`]) are fatal and reported here. Everything
    /// downstream of a successful search degrades to skip-and-continue.
    pub async fn run(self) -> Result<SessionSummary, SessionError> {
        let Session {
            mut navigator,
            responses,
            options,
        } = self;

        if options.city.is_empty() {
            return Err(SessionError::EmptyCity);
        }

        info!(city = %options.city, "starting route collection");
        let store = RecordStore::new(&options.output_dir, &options.city);
        let correlator = tokio::spawn(ResponseCorrelator::new(store).run(responses));

        let outcome = drive(&mut navigator, &options).await;

        // Dropping the navigator releases the browser page; the host drops
        // the response sender with it, which ends the correlator task.
        drop(navigator);
        let summary = correlator.await?;

        outcome?;
        info!(
            city = %options.city,
            routes = summary.routes.len(),
            "route collection finished"
        );
        Ok(summary)
    }
}

async fn drive<N: PageNavigator + ?Sized>(
    navigator: &mut N,
    options: &SessionOptions,
) -> Result<(), SessionError> {
    navigator
        .goto(&format!("{BASE_URL}/{}", options.city))
        .await
        .map_err(SessionError::Init)?;
    navigator
        .search(SEARCH_QUERY)
        .await
        .map_err(SessionError::Search)?;
    if let Err(error) = navigator.wait_for_navigation(options.timeout).await {
        warn!(%error, "navigation after search did not settle");
    }

    let discovery = DiscoveryLoop::new(options.timeout);
    let mut walker = PaginationWalker::new();

    loop {
        let candidates = discovery.run_page(navigator).await;
        info!(
            page = walker.current_page(),
            candidates, "processed results page"
        );

        match walker.advance(navigator, options.timeout).await {
            Advance::Advanced(page) => debug!(page, "advanced to the next results page"),
            Advance::Exhausted => break,
        }
    }

    Ok(())
}
