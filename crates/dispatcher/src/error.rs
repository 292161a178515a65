//! Dispatcher error types

use std::time::Duration;

use contracts::SendError;
use thiserror::Error;

/// Terminal outcome of a dispatcher's background task
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Transport failed with an unclassified error; no further points are sent
    #[error("dispatcher stopped on fatal send error: {0}")]
    Fatal(#[source] SendError),

    /// Worker task panicked
    #[error("dispatcher worker panicked: {0}")]
    WorkerPanicked(String),

    /// Worker did not stop in time and was aborted
    #[error("dispatcher worker did not stop within {0:?}, aborted")]
    ShutdownTimeout(Duration),
}

