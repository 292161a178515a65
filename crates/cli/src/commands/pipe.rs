//! `pipe` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dispatcher::Dispatcher;
use metric::MetricBuilder;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::{drain_and_close, print_stats};
use crate::cli::PipeArgs;
use crate::input::parse_line;
use crate::settings;

/// Counters for one pass over the input
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipeSummary {
    pub lines: usize,
    pub submitted: usize,
    pub invalid: usize,
}

/// Execute the `pipe` command
pub async fn run_pipe(args: &PipeArgs) -> Result<()> {
    let config = settings::resolve(&args.emitter)?;

    if args.metrics_port > 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let dispatcher = Arc::new(Dispatcher::from_emitter_config(&config));
    let prefix = config.prefix.clone().unwrap_or_default();
    info!(endpoint = dispatcher.endpoint(), "Reading data points from stdin");

    let stats_task = spawn_stats_reporter(
        Arc::clone(&dispatcher),
        Duration::from_secs(args.stats_interval.max(1)),
    );

    let reader = BufReader::new(tokio::io::stdin());
    let summary = tokio::select! {
        result = pump_lines(reader, &dispatcher, &prefix) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            PipeSummary::default()
        }
    };
    debug!(?summary, "Input finished");

    let stats = drain_and_close(&dispatcher, Duration::from_secs(args.emitter.drain_timeout)).await;
    stats_task.abort();
    let stats = stats?;

    observability::record_dispatch_stats(&stats);
    print_stats(&stats);
    if summary.invalid > 0 {
        println!("  Invalid input lines: {}", summary.invalid);
    }
    Ok(())
}

/// Feed every line of `reader` to the dispatcher
///
/// Malformed lines are logged and skipped.
pub async fn pump_lines<R>(
    reader: R,
    dispatcher: &Dispatcher,
    prefix: &str,
) -> Result<PipeSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = PipeSummary::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        summary.lines += 1;
        match parse_line(summary.lines, &line) {
            Ok(Some(point)) => {
                let name = MetricBuilder::new(point.name).prefix(prefix).full_name();
                dispatcher.send(name, point.value, point.timestamp);
                summary.submitted += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Skipping input line");
                summary.invalid += 1;
            }
        }
    }

    Ok(summary)
}

fn spawn_stats_reporter(
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let stats = dispatcher.stats();
            observability::record_dispatch_stats(&stats);
            info!(
                queue_len = stats.queue_len,
                accepted = stats.accepted,
                sent = stats.sent_points,
                dropped = stats.dropped,
                delivery_ratio = observability::delivery_ratio(&stats),
                "Emitter statistics"
            );
        }
    })
}
