//! # Observability
//!
//! emitter 自身的可观测性：日志订阅器 + 可选 Prometheus 端点。
//!
//! - `RUST_LOG` 优先于 [`ObservabilityConfig::log_level`]
//! - `-v/-q` 风格的详细程度通过 [`ObservabilityConfig::for_verbosity`] 映射
//! - Dispatcher 计数器通过 [`record_dispatch_stats`] 写入 `metrics` facade，
//!   只有安装了 Prometheus recorder 时才会被导出
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig::for_verbosity(1, false))?;
//! observability::record_dispatch_stats(&dispatcher.stats());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{delivery_ratio, record_dispatch_stats};

/// 以默认配置初始化（JSON 日志，info 级别，无指标端点）
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 可观测性配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 不导出)
    pub metrics_port: Option<u16>,
    /// 未设置 `RUST_LOG` 时使用的过滤指令
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::for_verbosity(0, false)
    }
}

impl ObservabilityConfig {
    /// `quiet` 只保留 warn；否则 0 = info, 1 = debug, 2+ = trace
    pub fn for_verbosity(verbose: u8, quiet: bool) -> Self {
        let log_level = match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            log_level: log_level.to_string(),
        }
    }

    pub fn with_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    /// 0 表示禁用
    pub fn with_metrics_port(mut self, port: u16) -> Self {
        self.metrics_port = (port != 0).then_some(port);
        self
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 每行一个 JSON 对象，带线程与源码位置
    #[default]
    Json,
    Pretty,
    Compact,
}

/// 安装全局 tracing 订阅器，按需启动 Prometheus 端点
///
/// 进程内只能成功调用一次。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        log_level = %config.log_level,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

/// 只启动 Prometheus 端点（0.0.0.0:`port`）
///
/// 用于日志已初始化、之后才知道端口的场景（如 `pipe --metrics-port`）。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint listening");
    Ok(())
}
