//! Start/stop control surface for the host shell.
//!
//! The GUI (or whatever drives this library) issues exactly two commands:
//! start a collection session for a city, and stop an in-progress one.
//! Progress and error reporting flow one way through the `tracing` event
//! stream, which the host subscribes to.

use crate::correlator::SessionSummary;
use crate::navigator::{PageNavigator, ResponseEvent};
use crate::session::{Session, SessionError, SessionOptions};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a running collection session.
pub struct CollectorHandle {
    task: JoinHandle<Result<SessionSummary, SessionError>>,
}

/// Starts a collection session on the current tokio runtime.
///
/// `navigator` and `responses` come from the host's browser layer and must
/// belong to the same page.
pub fn start_collection<N>(
    navigator: N,
    responses: mpsc::Receiver<ResponseEvent>,
    options: SessionOptions,
) -> CollectorHandle
where
    N: PageNavigator + 'static,
{
    let session = Session::new(navigator, responses, options);
    CollectorHandle {
        task: tokio::spawn(session.run()),
    }
}

impl CollectorHandle {
    /// Stops the session.
    ///
    /// Aborting mid-step is always safe: no partial-route rollback is
    /// attempted, and whatever has been persisted stays persisted.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Awaits the session outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stopped`] if [`CollectorHandle::stop`] was
    /// called first, or whatever the session itself failed with.
    pub async fn join(self) -> Result<SessionSummary, SessionError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(error) if error.is_cancelled() => Err(SessionError::Stopped),
            Err(error) => Err(SessionError::Correlator(error)),
        }
    }
}
