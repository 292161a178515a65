//! Dispatcher - non-blocking front end over the queue and its worker task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use contracts::{
    DataPoint, DispatchStats, DispatcherConfig, EmitterConfig, MetricValue, Transport,
    TransportConfig,
};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::DispatcherError;
use crate::metrics::DispatcherMetrics;
use crate::queue::BoundedQueue;
use crate::transport::Connection;
use crate::worker::{BatchPolicy, Intake, Worker};

type WorkerHandle = JoinHandle<Result<(), DispatcherError>>;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Buffers data points and ships them to a transport from a background task
///
/// `send` never blocks and never fails; `close` stops the task and closes
/// the transport. Dropping the dispatcher cancels the task as well.
pub struct Dispatcher {
    queue: Arc<BoundedQueue<DataPoint>>,
    metrics: Arc<DispatcherMetrics>,
    cancel: CancellationToken,
    closed: AtomicBool,
    worker: Mutex<Option<WorkerHandle>>,
    shutdown_timeout: Duration,
    endpoint: String,
}

impl Dispatcher {
    /// Start a dispatcher over the default connection for `transport`
    ///
    /// The connection is opened lazily by the worker on its first send.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &DispatcherConfig, transport: &TransportConfig) -> Self {
        Self::spawn(config, Connection::from_config(transport))
    }

    /// Start a dispatcher from a complete emitter configuration
    pub fn from_emitter_config(config: &EmitterConfig) -> Self {
        Self::from_config(&config.dispatcher, &config.transport)
    }

    /// Start a dispatcher over a custom transport
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn spawn<T: Transport + 'static>(config: &DispatcherConfig, transport: T) -> Self {
        let queue = Arc::new(BoundedQueue::new(config.queue_size));
        let metrics = Arc::new(DispatcherMetrics::new());
        let cancel = CancellationToken::new();
        let endpoint = transport.endpoint().to_string();

        let worker = Worker {
            transport,
            intake: Intake {
                queue: Arc::clone(&queue),
                metrics: Arc::clone(&metrics),
                cancel: cancel.clone(),
                policy: BatchPolicy::from(config),
            },
        };
        let handle = tokio::spawn(worker.run());

        info!(
            endpoint = %endpoint,
            queue_size = config.queue_size,
            flush_interval_ms = config.flush_interval_ms,
            "Dispatcher started"
        );

        Self {
            queue,
            metrics,
            cancel,
            closed: AtomicBool::new(false),
            worker: Mutex::new(Some(handle)),
            shutdown_timeout: config.shutdown_timeout(),
            endpoint,
        }
    }

    /// Endpoint of the underlying transport
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// False once closed or once the worker has stopped on a fatal error
    pub fn is_running(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.cancel.is_cancelled()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Report one data point (fire-and-forget)
    ///
    /// A missing timestamp is resolved to the current time here, once.
    /// Invalid points, points sent after close, and points arriving while the
    /// queue is full are all discarded silently.
    pub fn send(&self, name: impl Into<String>, value: impl MetricValue, timestamp: Option<i64>) {
        if !self.is_running() {
            return;
        }

        let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp());
        let point = match DataPoint::new(name, value, timestamp) {
            Ok(point) => point,
            Err(e) => {
                self.metrics.inc_rejected();
                debug!(error = %e, "Data point rejected");
                return;
            }
        };

        if self.queue.try_enqueue(point) {
            self.metrics.inc_accepted();
        } else {
            self.metrics.inc_dropped();
            trace!(capacity = self.queue.capacity(), "Queue full, data point dropped");
        }
    }

    /// Snapshot of the dispatcher's counters
    pub fn stats(&self) -> DispatchStats {
        self.metrics.snapshot(self.queue.len())
    }

    /// Wait until every accepted point has been sent or lost, up to `timeout`
    ///
    /// `close` abandons queued points, so callers that want them delivered
    /// (e.g. a one-shot command) wait here first. Returns false on timeout or
    /// if the worker is no longer running.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.is_running() {
                return false;
            }
            let stats = self.stats();
            if stats.sent_points + stats.requeue_dropped >= stats.accepted {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    /// Stop the worker and close the transport
    ///
    /// Idempotent. The first call waits (up to the configured shutdown
    /// timeout) for the worker and returns its terminal outcome; later calls
    /// return `Ok(())` immediately. If another caller is already in
    /// [`join`](Self::join), this only requests cancellation.
    #[instrument(name = "dispatcher_close", skip(self), fields(endpoint = %self.endpoint))]
    pub async fn close(&self) -> Result<(), DispatcherError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.cancel.cancel();

        let outcome = match self.take_worker() {
            Some(handle) => Self::await_worker(handle, self.shutdown_timeout).await,
            None => Ok(()),
        };

        info!(stats = ?self.stats(), "Dispatcher closed");
        outcome
    }

    /// Wait for the worker to end on its own and return its outcome
    ///
    /// The worker only ends by itself on a fatal send error, so this is how
    /// an owner observes one. Returns `Ok(())` if the outcome was already
    /// taken by `close` or an earlier `join`.
    pub async fn join(&self) -> Result<(), DispatcherError> {
        match self.take_worker() {
            Some(handle) => flatten_join(handle.await),
            None => Ok(()),
        }
    }

    fn take_worker(&self) -> Option<WorkerHandle> {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn await_worker(
        mut handle: WorkerHandle,
        timeout: Duration,
    ) -> Result<(), DispatcherError> {
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(joined) => flatten_join(joined),
            Err(_) => {
                handle.abort();
                warn!(timeout = ?timeout, "Dispatcher worker unresponsive, aborted");
                Err(DispatcherError::ShutdownTimeout(timeout))
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn flatten_join(
    joined: Result<Result<(), DispatcherError>, JoinError>,
) -> Result<(), DispatcherError> {
    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(DispatcherError::WorkerPanicked(e.to_string())),
    }
}
