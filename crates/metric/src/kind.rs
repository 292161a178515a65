//! Name suffixes for aggregates and time units

use std::time::Duration;

/// How the collector should aggregate the series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Max,
    Min,
    Avg,
    Sum,
    Count,
}

impl Aggregate {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Count => "count",
        }
    }
}

/// Unit of a timing metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

impl TimeUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Millis => "time.ms",
            Self::Micros => "time.us",
            Self::Nanos => "time.ns",
        }
    }

    /// Whole units in `elapsed`, truncated
    pub fn convert(self, elapsed: Duration) -> u128 {
        match self {
            Self::Millis => elapsed.as_millis(),
            Self::Micros => elapsed.as_micros(),
            Self::Nanos => elapsed.as_nanos(),
        }
    }
}
