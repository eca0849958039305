use std::collections::HashMap;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

use crate::schema::{FieldDescriptor, FieldType, OptionItem};
use crate::state::FieldState;
use crate::validation::ValidationError;

/// Context passed to renderers
pub struct RenderContext<'a> {
    pub values: &'a serde_json::Map<String, Value>,
    pub states: &'a HashMap<String, FieldState>,
    pub errors: &'a [ValidationError],
    /// Active wizard step, when the schema is a wizard.
    pub active_step: Option<usize>,
    pub props: &'a HashMap<String, Value>,
}

impl RenderContext<'_> {
    pub fn errors_for(&self, key: &str) -> Vec<String> {
        self.errors
            .iter()
            .filter(|e| e.field == key)
            .map(|e| e.message.clone())
            .collect()
    }
}

/// One field as an element renderer sees it. `key` is the full value path,
/// which differs from `field.name` inside list items.
pub struct FieldView<'a> {
    pub key: String,
    pub field: &'a FieldDescriptor,
    pub component: String,
    pub default_props: &'a Value,
    pub value: Value,
    pub state: FieldState,
    pub errors: Vec<String>,
}

/// Headless description of a rendered input.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Widget {
    pub name: String,
    pub component: String,
    pub field_type: FieldType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub value: Value,
    pub disabled: bool,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub props: Value,
}

impl Widget {
    /// Widget carrying everything the view knows; `props` are the registry's
    /// default props overlaid with the field's own.
    pub fn from_view(view: &FieldView) -> Self {
        Self {
            name: view.key.clone(),
            component: view.component.clone(),
            field_type: view.field.field_type,
            label: view.field.label.clone(),
            placeholder: view.field.placeholder.clone(),
            value: view.value.clone(),
            disabled: view.state.disabled,
            required: view.state.required,
            options: view.state.options.clone(),
            errors: view.errors.clone(),
            props: merge_props(view.default_props, &view.field.props),
        }
    }

    pub fn with_prop(mut self, key: &str, value: Value) -> Self {
        if !self.props.is_object() {
            self.props = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.props {
            map.insert(key.to_string(), value);
        }
        self
    }
}

fn merge_props(defaults: &Value, own: &Value) -> Value {
    match (defaults, own) {
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged = base.clone();
            for (k, v) in overrides {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, Value::Null) => defaults.clone(),
        _ => own.clone(),
    }
}

pub trait ElementRenderer: Send + Sync {
    /// Field types this renderer handles (e.g., [Text, Email])
    fn handled_field_types(&self) -> Vec<FieldType>;

    /// Render the field into a widget description
    fn render(&self, view: &FieldView, ctx: &RenderContext) -> Result<Widget, Error>;
}
