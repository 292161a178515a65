//! `send` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dispatcher::Dispatcher;
use metric::MetricBuilder;
use tracing::info;

use super::{drain_and_close, print_stats};
use crate::cli::SendArgs;
use crate::input::parse_value;
use crate::settings;

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<()> {
    let config = settings::resolve(&args.emitter)?;
    let value = parse_value(&args.value)?;

    let dispatcher = Arc::new(Dispatcher::from_emitter_config(&config));
    let metric = MetricBuilder::new(args.name.as_str())
        .prefix(config.prefix.clone().unwrap_or_default())
        .build(Arc::clone(&dispatcher));

    info!(
        name = metric.name(),
        value,
        endpoint = dispatcher.endpoint(),
        "Sending data point"
    );
    metric.send(value, args.timestamp);

    let drain_timeout = Duration::from_secs(args.emitter.drain_timeout);
    let stats = drain_and_close(&dispatcher, drain_timeout).await?;
    print_stats(&stats);

    if stats.sent_points == 0 {
        anyhow::bail!("Data point was not delivered to {}", dispatcher.endpoint());
    }
    Ok(())
}
