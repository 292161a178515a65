//! # Metric
//!
//! Named-metric convenience layer over [`Dispatcher::send`].
//!
//! - Dotted names built from an optional prefix, a base name, an aggregate
//!   suffix and a time unit suffix
//! - `count` / `time` helpers wrapping a closure or a future
//! - An optional process-wide default dispatcher and prefix ([`global`])

pub mod global;
mod kind;

pub use kind::{Aggregate, TimeUnit};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use contracts::MetricValue;
use dispatcher::Dispatcher;

/// A named metric bound to a dispatcher
#[derive(Clone)]
pub struct Metric {
    name: String,
    unit: Option<TimeUnit>,
    dispatcher: Arc<Dispatcher>,
}

impl Metric {
    /// Metric with a bare name, no prefix and no suffixes
    pub fn new(name: impl Into<String>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            dispatcher,
        }
    }

    pub fn builder(name: impl Into<String>) -> MetricBuilder {
        MetricBuilder::new(name)
    }

    /// Full dotted name sent on the wire
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Report a value; invalid values are dropped by the dispatcher
    pub fn send(&self, value: impl MetricValue, timestamp: Option<i64>) {
        self.dispatcher.send(self.name.as_str(), value, timestamp);
    }

    /// Run `f` and report `1`
    pub fn count<R>(&self, f: impl FnOnce() -> R) -> R {
        let result = f();
        self.send(1, None);
        result
    }

    /// Await `fut` and report `1`
    pub async fn count_async<F: Future>(&self, fut: F) -> F::Output {
        let result = fut.await;
        self.send(1, None);
        result
    }

    /// Run `f` and report its duration in this metric's unit (ns if unset)
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let started = Instant::now();
        let result = f();
        self.report_elapsed(started);
        result
    }

    /// Await `fut` and report its duration in this metric's unit (ns if unset)
    pub async fn time_async<F: Future>(&self, fut: F) -> F::Output {
        let started = Instant::now();
        let result = fut.await;
        self.report_elapsed(started);
        result
    }

    fn report_elapsed(&self, started: Instant) {
        let unit = self.unit.unwrap_or(TimeUnit::Nanos);
        self.send(unit.convert(started.elapsed()), None);
    }
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("endpoint", &self.dispatcher.endpoint())
            .finish()
    }
}

/// Builds the dotted name `<prefix>.<name>.<aggregate>.time.<unit>`
#[derive(Debug, Clone, Default)]
pub struct MetricBuilder {
    name: String,
    prefix: Option<String>,
    aggregate: Option<Aggregate>,
    unit: Option<TimeUnit>,
}

impl MetricBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Prefix joined with a dot; an empty prefix is ignored
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// The dotted name this builder produces
    pub fn full_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            parts.push(prefix);
        }
        parts.push(&self.name);
        if let Some(aggregate) = self.aggregate {
            parts.push(aggregate.suffix());
        }
        if let Some(unit) = self.unit {
            parts.push(unit.suffix());
        }
        parts.join(".")
    }

    pub fn build(self, dispatcher: Arc<Dispatcher>) -> Metric {
        Metric {
            name: self.full_name(),
            unit: self.unit,
            dispatcher,
        }
    }
}
