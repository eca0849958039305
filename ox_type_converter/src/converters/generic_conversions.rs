//! Generic conversion functions
//!
//! Equality helpers and the entry point that routes a value through the
//! global conversion registry.

use crate::converters::numeric_conversions::to_f64;
use crate::registry::CONVERSION_REGISTRY;
use crate::value_type::ValueType;
use crate::HashMap;
use serde_json::Value;

/// Convert a value to the requested kind using the built-in registry.
pub fn convert_value(value: &Value, to_type: ValueType, parameters: &HashMap<String, String>) -> Result<Value, String> {
    CONVERSION_REGISTRY.convert(value, to_type, parameters)
}

/// Structural equality where numbers compare by value (`1 == 1.0`).
pub fn deep_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| b.get(k).map(|other| deep_equals(v, other)).unwrap_or(false))
        }
        _ => left == right,
    }
}

/// Equality that also matches a number against its textual form and a
/// boolean against `"true"`/`"false"`, as values coming from text inputs
/// or query strings often carry.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    if deep_equals(left, right) {
        return true;
    }
    match (left, right) {
        (Value::Number(_), Value::String(s)) | (Value::String(s), Value::Number(_)) => {
            if s.trim().is_empty() {
                return false;
            }
            matches!((to_f64(left), to_f64(right)), (Some(a), Some(b)) if a == b)
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => s == &b.to_string(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_equals_normalizes_numbers() {
        assert!(deep_equals(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!deep_equals(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!deep_equals(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_loose_equals() {
        assert!(loose_equals(&json!("5"), &json!(5)));
        assert!(loose_equals(&json!(true), &json!("true")));
        assert!(!loose_equals(&json!(""), &json!(0)));
        assert!(!loose_equals(&json!("a"), &json!("b")));
    }

    #[test]
    fn test_convert_value_integer() {
        let result = convert_value(&json!("12"), ValueType::Integer, &HashMap::new());
        assert_eq!(result, Ok(json!(12)));
    }
}
