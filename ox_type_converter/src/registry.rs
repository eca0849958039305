use crate::HashMap;
use crate::converters::*;
use crate::value_type::ValueType;
use lazy_static::lazy_static;
use serde_json::Value;

/// Conversion function type: takes a value plus string parameters, returns the converted value
pub type ConversionFn = fn(&Value, &HashMap<String, String>) -> Result<Value, String>;

const ALL_TYPES: [ValueType; 7] = [
    ValueType::Null,
    ValueType::Boolean,
    ValueType::Integer,
    ValueType::Float,
    ValueType::String,
    ValueType::List,
    ValueType::Map,
];

/// Registry for managing conversion functions, keyed by source and target kind.
pub struct ConversionRegistry {
    conversions: HashMap<ValueType, HashMap<ValueType, ConversionFn>>,
}

lazy_static! {
    /// The built-in conversion registry. Read-only; build a separate
    /// `ConversionRegistry::with_builtins()` to register custom conversions.
    pub static ref CONVERSION_REGISTRY: ConversionRegistry = ConversionRegistry::with_builtins();
}

impl ConversionRegistry {
    /// Create an empty conversion registry
    pub fn new() -> Self {
        Self {
            conversions: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in conversion
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_conversions();
        registry
    }

    /// Register a conversion function
    pub fn register_conversion(&mut self, from_type: ValueType, to_type: ValueType, converter: ConversionFn) {
        self.conversions
            .entry(from_type)
            .or_default()
            .insert(to_type, converter);
    }

    /// Get a conversion function for a specific conversion
    pub fn get_converter(&self, from_type: ValueType, to_type: ValueType) -> Option<&ConversionFn> {
        self.conversions
            .get(&from_type)
            .and_then(|to_types| to_types.get(&to_type))
    }

    /// Convert a value, looking the converter up by the value's own kind
    pub fn convert(&self, value: &Value, to_type: ValueType, parameters: &HashMap<String, String>) -> Result<Value, String> {
        let from_type = ValueType::of(value);
        if from_type == to_type {
            return Ok(value.clone());
        }
        match self.get_converter(from_type, to_type) {
            Some(converter) => converter(value, parameters),
            None => Err(format!("No converter available from '{}' to '{}'", from_type, to_type)),
        }
    }

    /// Get all available conversion pairs
    pub fn get_available_conversions(&self) -> Vec<(ValueType, ValueType)> {
        let mut conversions = Vec::new();
        for (from_type, to_types) in &self.conversions {
            for to_type in to_types.keys() {
                conversions.push((*from_type, *to_type));
            }
        }
        conversions
    }

    /// Check if a conversion is available
    pub fn has_conversion(&self, from_type: ValueType, to_type: ValueType) -> bool {
        self.get_converter(from_type, to_type).is_some()
    }

    fn register_builtin_conversions(&mut self) {
        for from in ALL_TYPES {
            if from != ValueType::List && from != ValueType::Map {
                self.register_conversion(from, ValueType::Integer, to_integer_value);
                self.register_conversion(from, ValueType::Float, to_float_value);
                self.register_conversion(from, ValueType::Boolean, to_boolean_value);
            }
            self.register_conversion(from, ValueType::String, |v, _p| Ok(Value::String(to_display_string(v))));
            self.register_conversion(from, ValueType::List, to_list_value);
        }
        self.register_conversion(ValueType::String, ValueType::Map, |v, _p| {
            match v.as_str().map(parse_lenient) {
                Some(Value::Object(map)) => Ok(Value::Object(map)),
                _ => Err(format!("'{}' is not a JSON object", to_display_string(v))),
            }
        });
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn to_integer_value(value: &Value, _parameters: &HashMap<String, String>) -> Result<Value, String> {
    to_i64(value)
        .map(Value::from)
        .ok_or_else(|| format!("Cannot convert '{}' to integer", to_display_string(value)))
}

fn to_float_value(value: &Value, _parameters: &HashMap<String, String>) -> Result<Value, String> {
    to_f64(value)
        .map(number_value)
        .ok_or_else(|| format!("Cannot convert '{}' to float", to_display_string(value)))
}

fn to_boolean_value(value: &Value, _parameters: &HashMap<String, String>) -> Result<Value, String> {
    match value {
        Value::String(s) => string_to_boolean(s).map(Value::Bool),
        other => Ok(Value::Bool(is_truthy(other))),
    }
}

/// Lists accept JSON array text or a separated string (`separator`, default `,`).
fn to_list_value(value: &Value, parameters: &HashMap<String, String>) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::String(s) => {
            if let Value::Array(items) = parse_lenient(s) {
                return Ok(Value::Array(items));
            }
            if s.is_empty() {
                return Ok(Value::Array(Vec::new()));
            }
            let separator = parameters.get("separator").map(String::as_str).unwrap_or(",");
            Ok(Value::Array(
                s.split(separator).map(|part| Value::String(part.trim().to_string())).collect(),
            ))
        }
        Value::Object(_) => Err("Cannot convert a map to a list".to_string()),
        other => Ok(Value::Array(vec![other.clone()])),
    }
}
