//! Command implementations.

mod pipe;
mod send;
mod validate;

pub use pipe::run_pipe;
pub use send::run_send;
pub use validate::run_validate;

use std::time::Duration;

use contracts::DispatchStats;
use dispatcher::Dispatcher;
use tracing::{info, warn};

use crate::error::Result;

/// Give queued points a chance to reach the collector, then shut down
async fn drain_and_close(
    dispatcher: &Dispatcher,
    drain_timeout: Duration,
) -> Result<DispatchStats> {
    if !dispatcher.wait_idle(drain_timeout).await {
        let stats = dispatcher.stats();
        warn!(
            queue_len = stats.queue_len,
            timeout_secs = drain_timeout.as_secs(),
            "Queue not drained before timeout, remaining points are abandoned"
        );
    }

    dispatcher.close().await?;
    let stats = dispatcher.stats();
    info!(
        accepted = stats.accepted,
        sent = stats.sent_points,
        dropped = stats.dropped,
        rejected = stats.rejected,
        "Emitter shut down"
    );
    Ok(stats)
}

fn print_stats(stats: &DispatchStats) {
    println!(
        "Sent {} of {} accepted points in {} batches",
        stats.sent_points, stats.accepted, stats.sent_batches
    );
    if stats.dropped + stats.rejected + stats.requeue_dropped > 0 {
        println!(
            "  Dropped: {} (queue full), {} (invalid), {} (requeue overflow)",
            stats.dropped, stats.rejected, stats.requeue_dropped
        );
    }
    if stats.transport_failures > 0 {
        println!("  Transport failures: {}", stats.transport_failures);
    }
}
