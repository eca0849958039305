use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use ox_type_converter::{to_display_string, to_f64};

use crate::path::get_path;
use crate::schema::{FieldDescriptor, FieldType, FormSchema, ValidationRule};
use crate::state::FieldState;

/// Represents a validation error for a specific field.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Validates form values against a schema and the derived field states.
///
/// Hidden fields are skipped; `required` comes from the derived state so
/// `required_if` rules take effect.
pub struct Validator;

impl Validator {
    pub fn validate(
        &self,
        schema: &FormSchema,
        values: &Map<String, Value>,
        states: &HashMap<String, FieldState>,
    ) -> Vec<ValidationError> {
        self.validate_fields(schema.fields(), values, states)
    }

    pub fn validate_fields<'f>(
        &self,
        fields: impl IntoIterator<Item = &'f FieldDescriptor>,
        values: &Map<String, Value>,
        states: &HashMap<String, FieldState>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for field in fields {
            self.validate_field(field, &field.name, values, states, &mut errors);
        }
        errors
    }

    fn validate_field(
        &self,
        field: &FieldDescriptor,
        key: &str,
        values: &Map<String, Value>,
        states: &HashMap<String, FieldState>,
        errors: &mut Vec<ValidationError>,
    ) {
        let state = states.get(key).cloned().unwrap_or_else(|| FieldState::from_descriptor(field));
        if state.hidden {
            return;
        }
        let value = get_path(values, key).unwrap_or(&Value::Null);

        if state.required && is_missing(field, value) {
            let message = field
                .rules
                .iter()
                .find(|r| r.rule_type == "required")
                .and_then(|r| r.message.clone())
                .unwrap_or_else(|| format!("{} is required", field.label));
            errors.push(ValidationError {
                field: key.to_string(),
                message,
            });
            return;
        }

        for rule in &field.rules {
            if let Err(msg) = self.check_rule(rule, value, field) {
                errors.push(ValidationError {
                    field: key.to_string(),
                    message: msg,
                });
            }
        }

        if field.field_type == FieldType::List {
            if let Some(items) = value.as_array() {
                self.check_list_bounds(field, key, items.len(), errors);
                for index in 0..items.len() {
                    for template in field.template() {
                        let item_key = format!("{}.{}.{}", key, index, template.name);
                        self.validate_field(template, &item_key, values, states, errors);
                    }
                }
            }
        }
    }

    fn check_list_bounds(&self, field: &FieldDescriptor, key: &str, len: usize, errors: &mut Vec<ValidationError>) {
        let Some(config) = &field.list else {
            return;
        };
        if let Some(min) = config.min {
            if len < min {
                errors.push(ValidationError {
                    field: key.to_string(),
                    message: format!("{} needs at least {} item(s)", field.label, min),
                });
            }
        }
        if let Some(max) = config.max {
            if len > max {
                errors.push(ValidationError {
                    field: key.to_string(),
                    message: format!("{} allows at most {} item(s)", field.label, max),
                });
            }
        }
    }

    fn check_rule(&self, rule: &ValidationRule, value: &Value, field: &FieldDescriptor) -> Result<(), String> {
        if is_missing(field, value) {
            // Optional and empty: nothing else to check.
            return Ok(());
        }
        let fail = |default: String| Err(rule.message.clone().unwrap_or(default));
        match rule.rule_type.as_str() {
            "required" => {}
            "min" => {
                let min_val = rule.parameters.as_f64().ok_or("Invalid min parameter")?;
                let val = to_f64(value).ok_or_else(|| format!("{} must be a number", field.label))?;
                if val < min_val {
                    return fail(format!("{} must be at least {}", field.label, min_val));
                }
            }
            "max" => {
                let max_val = rule.parameters.as_f64().ok_or("Invalid max parameter")?;
                let val = to_f64(value).ok_or_else(|| format!("{} must be a number", field.label))?;
                if val > max_val {
                    return fail(format!("{} must be at most {}", field.label, max_val));
                }
            }
            "min_length" => {
                let min_len = rule.parameters.as_u64().ok_or("Invalid min_length parameter")? as usize;
                if length_of(value) < min_len {
                    return fail(format!("{} must be at least {} characters", field.label, min_len));
                }
            }
            "max_length" => {
                let max_len = rule.parameters.as_u64().ok_or("Invalid max_length parameter")? as usize;
                if length_of(value) > max_len {
                    return fail(format!("{} must be at most {} characters", field.label, max_len));
                }
            }
            "pattern" | "regex" => {
                let pattern = rule.parameters.as_str().ok_or("Invalid regex parameter")?;
                let re = Regex::new(pattern).map_err(|_| "Invalid regex pattern")?;
                if !re.is_match(&to_display_string(value)) {
                    return fail(format!("{} has invalid format", field.label));
                }
            }
            "email" => {
                if !EMAIL.is_match(&to_display_string(value)) {
                    return fail(format!("{} must be a valid email address", field.label));
                }
            }
            "url" => {
                if !URL.is_match(&to_display_string(value)) {
                    return fail(format!("{} must be a valid URL", field.label));
                }
            }
            other => {
                log::debug!("Skipping unknown validation rule '{}' on '{}'", other, field.name);
            }
        }
        Ok(())
    }
}

/// Required-ness check. Zero is a real value here; unchecked boxes are not.
fn is_missing(field: &FieldDescriptor, value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Bool(false) => matches!(field.field_type, FieldType::Checkbox | FieldType::Switch),
        _ => false,
    }
}

fn length_of(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        other => to_display_string(other).chars().count(),
    }
}

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref URL: Regex = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap();
}
