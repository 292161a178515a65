//! Transport and Codec traits - Dispatcher output interface
//!
//! Defines the abstract interface for wire delivery of batches.

use crate::{DataPoint, SendError};

/// Batch delivery trait
///
/// The dispatcher's background task is the only caller; implementations are
/// never accessed concurrently.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Endpoint description (used for logging)
    fn endpoint(&self) -> &str;

    /// Deliver one non-empty batch
    ///
    /// # Errors
    /// `SendError::Transport` for recoverable failures, `SendError::Internal`
    /// for anything that should stop the dispatcher.
    async fn send(&mut self, batch: &[DataPoint]) -> Result<(), SendError>;

    /// Release the underlying resource; safe to call repeatedly
    async fn close(&mut self);
}

/// Turns a batch into wire bytes
pub trait Codec: Send + Sync {
    /// Encode a batch in order
    fn encode(&self, batch: &[DataPoint]) -> std::io::Result<Vec<u8>>;
}
