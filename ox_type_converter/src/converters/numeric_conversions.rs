//! Numeric conversion functions
//!
//! Numeric casts follow form-input expectations: booleans count as 0/1,
//! numeric text is parsed after trimming, and anything without a finite
//! numeric reading (null, blank text, lists, maps) yields `None` so that
//! comparisons against it fail closed.

use serde_json::Value;

/// Cast a value to `f64`.
pub fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Cast a value to `i64`. Floats are accepted only when they carry no fraction.
pub fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| to_f64(value).and_then(float_to_i64))
        }
        other => to_f64(other).and_then(float_to_i64),
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Wrap an `f64` as a JSON number, preferring an integer representation.
pub fn number_value(f: f64) -> Value {
    match float_to_i64(f) {
        Some(i) => Value::from(i),
        None => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
    }
}
