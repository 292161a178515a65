//! Dispatcher counter snapshot shared with observability

use serde::Serialize;

/// Point-in-time copy of a dispatcher's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Points currently waiting in the queue
    pub queue_len: usize,
    /// Points accepted into the queue
    pub accepted: u64,
    /// Points dropped because the queue was full
    pub dropped: u64,
    /// Points rejected as invalid input
    pub rejected: u64,
    /// Points lost while re-queueing a failed batch
    pub requeue_dropped: u64,
    /// Points delivered to the transport
    pub sent_points: u64,
    /// Batches delivered to the transport
    pub sent_batches: u64,
    /// Transport failures observed
    pub transport_failures: u64,
}
