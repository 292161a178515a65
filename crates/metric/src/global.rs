//! Process-wide default dispatcher and name prefix
//!
//! Optional convenience on top of [`Metric`]; nothing in the dispatcher
//! depends on it.

use std::sync::{Arc, PoisonError, RwLock};

use dispatcher::Dispatcher;
use tracing::debug;

use crate::{Aggregate, Metric, MetricBuilder, TimeUnit};

static DEFAULT: RwLock<Option<Arc<Dispatcher>>> = RwLock::new(None);
static PREFIX: RwLock<Option<String>> = RwLock::new(None);

/// Install the default dispatcher, returning the previous one
pub fn set_default(dispatcher: Arc<Dispatcher>) -> Option<Arc<Dispatcher>> {
    debug!(endpoint = %dispatcher.endpoint(), "Default dispatcher installed");
    DEFAULT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(dispatcher)
}

/// Remove the default dispatcher, returning it
pub fn take_default() -> Option<Arc<Dispatcher>> {
    DEFAULT.write().unwrap_or_else(PoisonError::into_inner).take()
}

pub fn default() -> Option<Arc<Dispatcher>> {
    DEFAULT.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Set the prefix applied by [`metric`]; an empty prefix clears it
pub fn set_prefix(prefix: impl Into<String>) {
    let prefix = prefix.into();
    *PREFIX.write().unwrap_or_else(PoisonError::into_inner) =
        (!prefix.is_empty()).then_some(prefix);
}

pub fn clear_prefix() {
    *PREFIX.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub fn prefix() -> Option<String> {
    PREFIX.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Start a builder carrying the global prefix
pub fn builder(name: impl Into<String>) -> MetricBuilder {
    let builder = MetricBuilder::new(name);
    match prefix() {
        Some(prefix) => builder.prefix(prefix),
        None => builder,
    }
}

/// Metric on the default dispatcher with the global prefix
///
/// `None` when no default dispatcher is installed.
pub fn metric(name: impl Into<String>) -> Option<Metric> {
    default().map(|dispatcher| builder(name).build(dispatcher))
}

/// Run `f`, reporting `<prefix>.<name>.count = 1` on the default dispatcher
pub fn count<R>(name: impl Into<String>, f: impl FnOnce() -> R) -> R {
    match default() {
        Some(dispatcher) => builder(name)
            .aggregate(Aggregate::Count)
            .build(dispatcher)
            .count(f),
        None => f(),
    }
}

/// Run `f`, reporting `<prefix>.<name>.time.ns` on the default dispatcher
pub fn time<R>(name: impl Into<String>, f: impl FnOnce() -> R) -> R {
    match default() {
        Some(dispatcher) => builder(name)
            .unit(TimeUnit::Nanos)
            .build(dispatcher)
            .time(f),
        None => f(),
    }
}
