use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a JSON value, with numbers split into integer and float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Map,
}

impl ValueType {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueType::Integer,
            Value::Number(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::List,
            Value::Object(_) => ValueType::Map,
        }
    }

    /// Get the type name as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Map => "map",
        }
    }

    /// Parse a type name. `bool`, `int`, `number`, `array` and `object` are accepted as aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(ValueType::Null),
            "boolean" | "bool" => Some(ValueType::Boolean),
            "integer" | "int" => Some(ValueType::Integer),
            "float" | "number" => Some(ValueType::Float),
            "string" => Some(ValueType::String),
            "list" | "array" => Some(ValueType::List),
            "map" | "object" => Some(ValueType::Map),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
