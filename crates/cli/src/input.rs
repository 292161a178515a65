//! 输入解析：`<name> <value> [timestamp]` 文本行。

use contracts::{is_valid_name, MetricValue};

use crate::error::{CliError, Result};

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPoint {
    pub name: String,
    pub value: i64,
    pub timestamp: Option<i64>,
}

/// Parse a value argument
///
/// Integers are taken as-is; floats are accepted only when integral.
pub fn parse_value(raw: &str) -> Result<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(MetricValue::to_metric_value)
        .ok_or_else(|| CliError::invalid_value(raw))
}

/// Parse one line of `pipe` input
///
/// Blank lines and `#` comments yield `None`.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<InputPoint>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let (name, value, timestamp) = match fields.as_slice() {
        [name, value] => (*name, *value, None),
        [name, value, ts] => (*name, *value, Some(*ts)),
        _ => {
            return Err(CliError::invalid_line(
                line_no,
                format!("expected 2 or 3 fields, found {}", fields.len()),
            ))
        }
    };

    if !is_valid_name(name) {
        return Err(CliError::invalid_line(line_no, format!("invalid name '{name}'")));
    }
    let value =
        parse_value(value).map_err(|e| CliError::invalid_line(line_no, e.to_string()))?;
    let timestamp = timestamp
        .map(|ts| {
            ts.parse::<i64>()
                .map_err(|_| CliError::invalid_line(line_no, format!("invalid timestamp '{ts}'")))
        })
        .transpose()?;

    Ok(Some(InputPoint {
        name: name.to_string(),
        value,
        timestamp,
    }))
}
