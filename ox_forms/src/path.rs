//! Dot-path access into nested form values (`address.city`, `lines.0.qty`).

use serde_json::{Map, Value};

/// Read a value. A top-level key that literally contains dots wins over
/// nested traversal.
pub fn get_path<'a>(values: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = values.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = values.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write a value, creating intermediate objects as needed. Numeric segments
/// index into existing arrays; an out-of-range index is an error.
pub fn set_path(values: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), String> {
    if values.contains_key(path) || !path.contains('.') {
        values.insert(path.to_string(), value);
        return Ok(());
    }
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments.split_last().ok_or_else(|| "empty path".to_string())?;
    let mut current = values
        .entry(parents[0].to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    for segment in &parents[1..] {
        current = step_into(current, segment, path)?;
    }
    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            let slot = items
                .get_mut(index)
                .ok_or_else(|| format!("index {} out of range in '{}'", index, path))?;
            *slot = value;
            Ok(())
        }
        other => {
            let mut map = Map::new();
            map.insert(last.to_string(), value);
            *other = Value::Object(map);
            Ok(())
        }
    }
}

fn step_into<'a>(current: &'a mut Value, segment: &str, path: &str) -> Result<&'a mut Value, String> {
    if !current.is_object() && !current.is_array() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index = parse_index(segment, path)?;
            items
                .get_mut(index)
                .ok_or_else(|| format!("index {} out of range in '{}'", index, path))
        }
        _ => unreachable!("converted to an object above"),
    }
}

fn parse_index(segment: &str, path: &str) -> Result<usize, String> {
    segment
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not an index in '{}'", segment, path))
}
