//! ox_type_converter - loose coercion of JSON values
//!
//! Form rules and URL state both receive values whose JSON kind is not known
//! up front (a number typed into a text box, a page size read from a query
//! string). This crate holds the coercions they share, organized the same way
//! as before: one module per target kind plus a registry of named conversions.

pub mod value_type;
pub mod converters;
pub mod registry;

pub use value_type::ValueType;
pub use converters::TypeConverter;
pub use converters::generic_conversions::{convert_value, deep_equals, loose_equals};
pub use converters::numeric_conversions::{to_f64, to_i64};
pub use converters::string_conversions::{parse_lenient, to_display_string};
pub use converters::boolean_conversions::{is_empty, is_truthy};
pub use registry::{ConversionFn, ConversionRegistry, CONVERSION_REGISTRY};

pub use std::collections::HashMap;
