// =============================================================================
// Field parsing helpers shared by the normalizers
// =============================================================================
//
// Binance encodes prices and quantities as JSON strings ("37000.00") and
// timestamps as epoch milliseconds, but a few endpoints send plain numbers.
// Both shapes are accepted everywhere.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parse a JSON value that may be either a numeric string or a number.
///
/// Non-finite results ("NaN", "inf") are rejected.
pub fn parse_f64(val: &Value) -> Option<f64> {
    let parsed = match val {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Parse an epoch-millisecond timestamp (number or numeric string).
pub fn parse_epoch_ms(val: &Value) -> Option<DateTime<Utc>> {
    let ms = match val {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    DateTime::from_timestamp_millis(ms)
}
