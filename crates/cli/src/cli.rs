//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Metric Emitter - send data points to a plaintext line-protocol collector
#[derive(Parser, Debug)]
#[command(
    name = "metric-emitter",
    author,
    version,
    about = "Asynchronous metrics emitter for line-protocol collectors",
    long_about = "Buffers data points in a bounded queue and ships them in batches to a \n\
                  metrics collector over TCP or UDP, as plain or gzip-compressed \n\
                  `<name> <value> <timestamp>` lines."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        env = "METRIC_EMITTER_VERBOSE"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "METRIC_EMITTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a single data point
    Send(SendArgs),

    /// Read `name value [timestamp]` lines from stdin and send each
    Pipe(PipeArgs),

    /// Validate configuration file without sending anything
    Validate(ValidateArgs),
}

/// Connection and batching options shared by sending commands
#[derive(Args, Debug, Clone, Default)]
pub struct EmitterArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "METRIC_EMITTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override collector host
    #[arg(long, env = "METRIC_EMITTER_HOST")]
    pub host: Option<String>,

    /// Override collector port
    #[arg(long, env = "METRIC_EMITTER_PORT")]
    pub port: Option<u16>,

    /// Use UDP instead of TCP
    #[arg(long)]
    pub udp: bool,

    /// Gzip-compress each batch
    #[arg(long)]
    pub gzip: bool,

    /// Override bounded queue capacity
    #[arg(long, env = "METRIC_EMITTER_QUEUE_SIZE")]
    pub queue_size: Option<usize>,

    /// Override debounce window in milliseconds
    #[arg(long, env = "METRIC_EMITTER_FLUSH_INTERVAL_MS")]
    pub flush_interval_ms: Option<u64>,

    /// Prefix prepended to every metric name
    #[arg(long, env = "METRIC_EMITTER_PREFIX")]
    pub prefix: Option<String>,

    /// How long to wait for queued points to be delivered before exiting (seconds)
    #[arg(long, default_value = "5", env = "METRIC_EMITTER_DRAIN_TIMEOUT")]
    pub drain_timeout: u64,
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    #[command(flatten)]
    pub emitter: EmitterArgs,

    /// Metric name (dotted path)
    pub name: String,

    /// Integer value (integral floats such as `3.0` are accepted)
    #[arg(allow_hyphen_values = true)]
    pub value: String,

    /// Epoch seconds (defaults to now)
    #[arg(long)]
    pub timestamp: Option<i64>,
}

/// Arguments for the `pipe` command
#[derive(Parser, Debug, Clone)]
pub struct PipeArgs {
    #[command(flatten)]
    pub emitter: EmitterArgs,

    /// Metrics server port for the emitter's own counters (0 = disabled)
    #[arg(long, default_value = "0", env = "METRIC_EMITTER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Interval between self-metrics updates in seconds
    #[arg(long, default_value = "10")]
    pub stats_interval: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "emitter.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
