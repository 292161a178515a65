//! Emitter configuration - Config Loader output
//!
//! Describes the queue/batching policy and the collector endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default collector host
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Conventional plaintext line-protocol port
pub const DEFAULT_PORT: u16 = 2003;
/// Default bounded queue capacity
pub const DEFAULT_QUEUE_SIZE: usize = 1000;
/// Default upper bound on one UDP datagram's payload
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 8192;
/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_DATAGRAM_PAYLOAD_LEN: usize = 65_507;

/// Complete emitter configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitterConfig {
    /// Prefix prepended to metric names by the facade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Queue and batching settings
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Collector endpoint settings
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Bounded queue capacity
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// Debounce window after the first point of a batch (0 = no wait)
    #[serde(default)]
    pub flush_interval_ms: u64,

    /// Upper bound on points per batch (None = unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_size: Option<usize>,

    /// Pause after a transport failure before retrying
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// How long `close` waits for the background task
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

fn default_queue_size() -> usize {
    DEFAULT_QUEUE_SIZE
}

fn default_retry_interval_ms() -> u64 {
    1000
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
            flush_interval_ms: 0,
            max_batch_size: None,
            retry_interval_ms: default_retry_interval_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl DispatcherConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Socket flavour used to reach the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Stream socket, ordered and reliable
    #[default]
    Tcp,
    /// Datagram socket, fire-and-forget
    Udp,
}

/// Payload encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// `<name> <value> <timestamp>\n` lines
    #[default]
    Plain,
    /// Plain lines wrapped in gzip framing
    Gzip,
}

/// Collector endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Collector host
    #[serde(default = "default_host")]
    pub host: String,

    /// Collector port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Stream or datagram
    #[serde(default)]
    pub kind: TransportKind,

    /// Payload encoding
    #[serde(default)]
    pub codec: CodecKind,

    /// Datagram size limit; UDP batches are split at line boundaries to fit
    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_payload_len() -> usize {
    DEFAULT_MAX_PAYLOAD_LEN
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            kind: TransportKind::default(),
            codec: CodecKind::default(),
            max_payload_len: default_max_payload_len(),
        }
    }
}

impl TransportConfig {
    /// Create a config for the given endpoint with default kind and codec
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// `host:port` string used in logs and errors
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
