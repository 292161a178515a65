//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the emitter.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data model
//! - A [`DataPoint`] is one `(name, value, timestamp)` observation
//! - Values are integers; timestamps are whole epoch seconds
//! - A batch is a non-empty `&[DataPoint]` handed to a [`Transport`]

mod config;
mod data_point;
mod error;
mod stats;
mod transport;

pub use config::*;
pub use data_point::{is_valid_name, DataPoint, MetricValue};
pub use error::*;
pub use stats::DispatchStats;
pub use transport::*;
