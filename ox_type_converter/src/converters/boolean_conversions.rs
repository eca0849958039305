//! Boolean conversion functions

use serde_json::Value;

/// Truthiness as form rules see it: null, false, zero and "" are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Emptiness test used by `is_empty` conditions and `clear_value` rules.
///
/// Anything falsy is empty, and so is an empty list. Note that this makes
/// `0` and `false` empty as well.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        other => !is_truthy(other),
    }
}

/// Parse a boolean from text, accepting the usual form spellings.
pub fn string_to_boolean(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}
