//! Type conversion modules
//!
//! One file per target kind, re-exported here so callers can reach every
//! coercion through `converters::*`.

pub mod string_conversions;
pub mod numeric_conversions;
pub mod boolean_conversions;
pub mod generic_conversions;

pub use string_conversions::*;
pub use numeric_conversions::*;
pub use boolean_conversions::*;
pub use generic_conversions::*;

use crate::value_type::ValueType;

/// Main type converter that provides access to all conversion functions
pub struct TypeConverter;

impl TypeConverter {
    /// Infer the kind a raw string would have once decoded.
    ///
    /// Query strings and text inputs carry everything as text; this reports
    /// what the text looks like so callers can decide whether to coerce.
    pub fn infer_from_string(value: &str) -> ValueType {
        let trimmed = value.trim();
        if trimmed.parse::<i64>().is_ok() {
            ValueType::Integer
        } else if trimmed.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
            ValueType::Float
        } else if trimmed == "true" || trimmed == "false" {
            ValueType::Boolean
        } else {
            ValueType::String
        }
    }
}
