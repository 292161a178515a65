//! # Dispatcher
//!
//! 异步指标分发模块。
//!
//! 负责：
//! - 非阻塞接收数据点（队列满则丢弃新数据）
//! - 单一后台任务批量发送
//! - 区分可重试的传输错误与致命错误

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod transport;
mod worker;

pub use contracts::{DataPoint, DispatchStats, Transport};
pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
pub use metrics::DispatcherMetrics;
pub use queue::BoundedQueue;
pub use transport::{Connection, GzipCodec, LineCodec, PlainCodec};
