//! DataPoint - the unit of telemetry carried from caller to collector

use std::fmt;

use crate::ContractError;

/// A single reported observation.
///
/// Fields are private: once built, a point is immutable. The timestamp is
/// always resolved (epoch seconds) by the time a point exists, so a point
/// that is retried keeps the timestamp it was accepted with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPoint {
    name: String,
    value: i64,
    timestamp: i64,
}

impl DataPoint {
    /// Build a validated data point.
    ///
    /// # Errors
    /// Returns [`ContractError::InvalidDataPoint`] when the name is empty or
    /// contains whitespace, or when the value is not integer-representable.
    pub fn new(
        name: impl Into<String>,
        value: impl MetricValue,
        timestamp: i64,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(ContractError::invalid_data_point(
                name,
                "name must be non-empty and contain no whitespace",
            ));
        }
        let value = value.to_metric_value().ok_or_else(|| {
            ContractError::invalid_data_point(&name, "value is not integer-representable")
        })?;

        Ok(Self {
            name,
            value,
            timestamp,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Renders the line-protocol body of the point, without the trailing newline.
impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.value, self.timestamp)
    }
}

/// Check that a metric name can be written to the line protocol unchanged.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Conversion of a reported number into the integer carried on the wire.
///
/// Returns `None` when the number has no exact `i64` representation.
pub trait MetricValue {
    fn to_metric_value(self) -> Option<i64>;
}

macro_rules! impl_metric_value_for_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MetricValue for $ty {
                fn to_metric_value(self) -> Option<i64> {
                    i64::try_from(self).ok()
                }
            }
        )*
    };
}

impl_metric_value_for_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl MetricValue for f64 {
    fn to_metric_value(self) -> Option<i64> {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        let in_range = self >= i64::MIN as f64 && self < i64::MAX as f64;
        if self.is_finite() && self.fract() == 0.0 && in_range {
            Some(self as i64)
        } else {
            None
        }
    }
}

impl MetricValue for f32 {
    fn to_metric_value(self) -> Option<i64> {
        f64::from(self).to_metric_value()
    }
}
