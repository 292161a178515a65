//! Worker - the single background task that drains the queue into the transport

use std::sync::Arc;
use std::time::Duration;

use contracts::{DataPoint, DispatcherConfig, SendError, Transport, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace, warn};

use crate::error::DispatcherError;
use crate::metrics::DispatcherMetrics;
use crate::queue::BoundedQueue;

/// Batching policy taken from configuration
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchPolicy {
    pub flush_interval: Duration,
    pub max_batch_size: Option<usize>,
    pub retry_interval: Duration,
}

impl From<&DispatcherConfig> for BatchPolicy {
    fn from(config: &DispatcherConfig) -> Self {
        Self {
            flush_interval: config.flush_interval(),
            max_batch_size: config.max_batch_size,
            retry_interval: config.retry_interval(),
        }
    }
}

/// Everything the worker shares with the dispatcher front end
pub(crate) struct Intake {
    pub queue: Arc<BoundedQueue<DataPoint>>,
    pub metrics: Arc<DispatcherMetrics>,
    pub cancel: CancellationToken,
    pub policy: BatchPolicy,
}

impl Intake {
    /// Wait for the first point, hold the debounce window, then take what is queued
    ///
    /// Returns `None` once cancelled; a partly collected batch is abandoned.
    async fn collect_batch(&self) -> Option<Vec<DataPoint>> {
        let first = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            point = self.queue.dequeue() => point,
        };

        if !self.policy.flush_interval.is_zero() && !self.pause(self.policy.flush_interval).await
        {
            return None;
        }

        let mut batch = vec![first];
        let remaining = self.policy.max_batch_size.map(|max| max.saturating_sub(1));
        batch.extend(self.queue.drain_available(remaining));
        Some(batch)
    }

    /// Put a failed batch back at the head of the queue
    fn requeue(&self, batch: Vec<DataPoint>, error: &TransportError) {
        self.metrics.inc_transport_failures();
        let points = batch.len();
        let lost = self.queue.requeue_front(batch);
        self.metrics.add_requeue_dropped(lost);
        warn!(error = %error, points, lost, "Transport failed, batch re-queued");
    }

    /// Sleep for `duration`; false if cancelled first
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// Consumer side of the queue; sole owner of the transport
pub(crate) struct Worker<T> {
    pub transport: T,
    pub intake: Intake,
}

impl<T: Transport> Worker<T> {
    /// Run until cancelled or a fatal send error, then close the transport
    #[instrument(
        name = "dispatcher_worker_loop",
        skip(self),
        fields(endpoint = %self.transport.endpoint())
    )]
    pub async fn run(mut self) -> Result<(), DispatcherError> {
        debug!("Dispatcher worker started");

        let outcome = self.dispatch_until_stopped().await;
        self.transport.close().await;

        match &outcome {
            Ok(()) => debug!("Dispatcher worker stopped"),
            Err(e) => error!(error = %e, "Dispatcher worker terminated"),
        }
        outcome
    }

    async fn dispatch_until_stopped(&mut self) -> Result<(), DispatcherError> {
        let intake = &self.intake;
        let transport = &mut self.transport;

        loop {
            let Some(batch) = intake.collect_batch().await else {
                return Ok(());
            };

            let result = tokio::select! {
                biased;
                _ = intake.cancel.cancelled() => return Ok(()),
                result = transport.send(&batch) => result,
            };

            match result {
                Ok(()) => {
                    intake.metrics.record_sent(batch.len());
                    trace!(points = batch.len(), "Batch sent");
                }
                Err(SendError::Transport(e)) => {
                    intake.requeue(batch, &e);
                    if !intake.pause(intake.policy.retry_interval).await {
                        return Ok(());
                    }
                }
                Err(fatal) => {
                    // Stop accepting points; nothing will ever drain them.
                    intake.cancel.cancel();
                    return Err(DispatcherError::Fatal(fatal));
                }
            }
        }
    }
}
