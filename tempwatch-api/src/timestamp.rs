//! Normalization of raw sensor timestamps to epoch milliseconds.
//!
//! Devices write either an integer epoch value or, in older firmware, a
//! `YYYY-MM-DD hh:mm:ss` string. The integer unit is a property of the
//! deployment and must be configured; it is never inferred from magnitude.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::PrimitiveDateTime;
use time::macros::format_description;

/// Unit of integer timestamps written by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    Seconds,
    #[default]
    Millis,
}

impl TimestampUnit {
    pub fn to_millis(&self, value: i64) -> Option<i64> {
        match self {
            TimestampUnit::Seconds => value.checked_mul(1000),
            TimestampUnit::Millis => Some(value),
        }
    }
}

/// Converts a raw JSON timestamp into epoch milliseconds.
///
/// Returns `None` for anything that cannot be interpreted.
pub fn normalize(value: &Value, unit: TimestampUnit) -> Option<i64> {
    match value {
        Value::Number(number) => {
            let raw = match number.as_i64() {
                Some(raw) => raw,
                None => {
                    let float = number.as_f64()?;
                    if !float.is_finite() || float.abs() > i64::MAX as f64 {
                        return None;
                    }
                    float.trunc() as i64
                }
            };
            unit.to_millis(raw)
        }
        Value::String(text) => parse_legacy(text),
        _ => None,
    }
}

/// Parses a legacy `YYYY-MM-DD hh:mm:ss` timestamp, read as UTC, into epoch milliseconds.
pub fn parse_legacy(text: &str) -> Option<i64> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let datetime = PrimitiveDateTime::parse(text.trim(), format).ok()?;
    let millis = datetime.assume_utc().unix_timestamp_nanos() / 1_000_000;

    i64::try_from(millis).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_integer_units() {
        assert_eq!(
            normalize(&json!(1_700_000_000), TimestampUnit::Seconds),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            normalize(&json!(1_700_000_000_123i64), TimestampUnit::Millis),
            Some(1_700_000_000_123)
        );
        assert_eq!(normalize(&json!(i64::MAX), TimestampUnit::Seconds), None);
    }

    #[test]
    fn test_legacy_string() {
        assert_eq!(
            normalize(&json!("2023-11-14 22:13:20"), TimestampUnit::Millis),
            Some(1_700_000_000_000)
        );
        assert_eq!(parse_legacy("14/11/2023 22:13"), None);
    }

    #[test]
    fn test_unrecognized_values() {
        assert_eq!(normalize(&Value::Null, TimestampUnit::Millis), None);
        assert_eq!(normalize(&json!(true), TimestampUnit::Millis), None);
        assert_eq!(normalize(&json!({"seconds": 1}), TimestampUnit::Millis), None);
    }
}
