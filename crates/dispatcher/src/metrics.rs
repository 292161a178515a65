//! Dispatcher counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::DispatchStats;

/// Counters shared between the dispatcher front end and its worker
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Points accepted into the queue
    accepted: AtomicU64,
    /// Points dropped because the queue was full
    dropped: AtomicU64,
    /// Points rejected as invalid
    rejected: AtomicU64,
    /// Points lost while re-queueing a failed batch
    requeue_dropped: AtomicU64,
    /// Points delivered
    sent_points: AtomicU64,
    /// Batches delivered
    sent_batches: AtomicU64,
    /// Transport failures
    transport_failures: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn inc_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requeue_dropped(&self) -> u64 {
        self.requeue_dropped.load(Ordering::Relaxed)
    }

    pub fn add_requeue_dropped(&self, count: usize) {
        self.requeue_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn sent_points(&self) -> u64 {
        self.sent_points.load(Ordering::Relaxed)
    }

    pub fn sent_batches(&self) -> u64 {
        self.sent_batches.load(Ordering::Relaxed)
    }

    /// Record one delivered batch of `points` points
    pub fn record_sent(&self, points: usize) {
        self.sent_points.fetch_add(points as u64, Ordering::Relaxed);
        self.sent_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    pub fn inc_transport_failures(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self, queue_len: usize) -> DispatchStats {
        DispatchStats {
            queue_len,
            accepted: self.accepted(),
            dropped: self.dropped(),
            rejected: self.rejected(),
            requeue_dropped: self.requeue_dropped(),
            sent_points: self.sent_points(),
            sent_batches: self.sent_batches(),
            transport_failures: self.transport_failures(),
        }
    }
}
