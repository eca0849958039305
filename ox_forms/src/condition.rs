//! Condition operators.
//!
//! Every operator reads the referenced field (missing reads as null) and
//! compares it with the condition's `value` or `values`. Anything that cannot
//! be compared evaluates to false; `Operator::Unknown` is always false.

use regex::Regex;
use serde_json::{Map, Value};

use ox_type_converter::{deep_equals, is_empty, loose_equals, to_display_string, to_f64};

use crate::path::get_path;
use crate::schema::{Condition, Logic, Operator};

/// Combine conditions: `All` over nothing is true, `Any` over nothing is false.
pub fn evaluate_conditions(conditions: &[Condition], logic: Logic, values: &Map<String, Value>) -> bool {
    match logic {
        Logic::All => conditions.iter().all(|c| evaluate_condition(c, values)),
        Logic::Any => conditions.iter().any(|c| evaluate_condition(c, values)),
    }
}

pub fn evaluate_condition(condition: &Condition, values: &Map<String, Value>) -> bool {
    let actual = get_path(values, &condition.field).unwrap_or(&Value::Null);
    let result = condition
        .operator
        .test(actual, condition.value.as_ref(), condition.values.as_deref());
    log::trace!(
        "condition {} {:?} -> {}",
        condition.field,
        condition.operator,
        result
    );
    result
}

impl Operator {
    pub fn test(&self, actual: &Value, expected: Option<&Value>, expected_many: Option<&[Value]>) -> bool {
        let expected_or_null = expected.unwrap_or(&Value::Null);
        match self {
            Operator::Equals => loose_equals(actual, expected_or_null),
            Operator::NotEquals => !loose_equals(actual, expected_or_null),
            Operator::GreaterThan => compare_numbers(actual, expected, |a, b| a > b),
            Operator::GreaterThanOrEqual => compare_numbers(actual, expected, |a, b| a >= b),
            Operator::LessThan => compare_numbers(actual, expected, |a, b| a < b),
            Operator::LessThanOrEqual => compare_numbers(actual, expected, |a, b| a <= b),
            Operator::Contains => expected.map(|e| contains(actual, e)).unwrap_or(false),
            Operator::NotContains => expected.map(|e| !contains(actual, e)).unwrap_or(false),
            Operator::StartsWith => compare_text(actual, expected, |a, b| a.starts_with(b)),
            Operator::EndsWith => compare_text(actual, expected, |a, b| a.ends_with(b)),
            Operator::Regex => expected.map(|p| matches_pattern(actual, p)).unwrap_or(false),
            Operator::In => candidates(expected, expected_many)
                .map(|list| list.iter().any(|c| loose_equals(actual, c)))
                .unwrap_or(false),
            Operator::NotIn => candidates(expected, expected_many)
                .map(|list| !list.iter().any(|c| loose_equals(actual, c)))
                .unwrap_or(false),
            Operator::IsEmpty => is_empty(actual),
            Operator::IsNotEmpty => !is_empty(actual),
            Operator::Between => within_bounds(actual, expected, expected_many).unwrap_or(false),
            Operator::NotBetween => within_bounds(actual, expected, expected_many)
                .map(|inside| !inside)
                .unwrap_or(false),
            Operator::LengthEquals => compare_length(actual, expected, |a, b| a == b),
            Operator::LengthGreaterThan => compare_length(actual, expected, |a, b| a > b),
            Operator::LengthLessThan => compare_length(actual, expected, |a, b| a < b),
            Operator::HasKey => match (actual, expected) {
                (Value::Object(map), Some(key)) => map.contains_key(&to_display_string(key)),
                _ => false,
            },
            Operator::ArrayIncludes => match actual {
                Value::Array(items) => match (expected, expected_many) {
                    (_, Some(all)) => all.iter().all(|w| items.iter().any(|i| deep_equals(i, w))),
                    (Some(one), None) => items.iter().any(|i| deep_equals(i, one)),
                    (None, None) => false,
                },
                _ => false,
            },
            Operator::DeepEquals => deep_equals(actual, expected_or_null),
            Operator::Unknown => {
                log::warn!("Unknown condition operator evaluated as false");
                false
            }
        }
    }
}

fn compare_numbers(actual: &Value, expected: Option<&Value>, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (to_f64(actual), expected.and_then(to_f64)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn compare_text(actual: &Value, expected: Option<&Value>, cmp: impl Fn(&str, &str) -> bool) -> bool {
    match (actual, expected) {
        (Value::Null, _) | (_, None) => false,
        (a, Some(e)) => cmp(&to_display_string(a).to_lowercase(), &to_display_string(e).to_lowercase()),
    }
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|i| loose_equals(i, expected)),
        Value::Null => false,
        other => to_display_string(other)
            .to_lowercase()
            .contains(&to_display_string(expected).to_lowercase()),
    }
}

fn matches_pattern(actual: &Value, pattern: &Value) -> bool {
    let Some(pattern) = pattern.as_str() else {
        return false;
    };
    match Regex::new(pattern) {
        Ok(re) => re.is_match(&to_display_string(actual)),
        Err(e) => {
            log::warn!("Invalid regex '{}' in condition: {}", pattern, e);
            false
        }
    }
}

/// `values` wins; a `value` that is itself a list is accepted too.
fn candidates<'a>(expected: Option<&'a Value>, expected_many: Option<&'a [Value]>) -> Option<&'a [Value]> {
    expected_many.or_else(|| expected.and_then(Value::as_array).map(Vec::as_slice))
}

/// `None` when the bounds or the value are not numeric.
fn within_bounds(actual: &Value, expected: Option<&Value>, expected_many: Option<&[Value]>) -> Option<bool> {
    let bounds = candidates(expected, expected_many)?;
    if bounds.len() != 2 {
        return None;
    }
    let (min, max) = (to_f64(&bounds[0])?, to_f64(&bounds[1])?);
    let value = to_f64(actual)?;
    Some(value >= min && value <= max)
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::Null => Some(0),
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        Value::Bool(_) | Value::Number(_) => None,
    }
}

fn compare_length(actual: &Value, expected: Option<&Value>, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (length_of(actual), expected.and_then(to_f64)) {
        (Some(len), Some(b)) => cmp(len as f64, b),
        _ => false,
    }
}
