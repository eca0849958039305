use serde::Serialize;
use serde_json::Value;

use crate::schema::{FieldDescriptor, OptionItem, RuleType};

/// Derived per-field UI flags, recomputed from the descriptor on every pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    pub hidden: bool,
    pub disabled: bool,
    pub required: bool,
    pub options: Vec<OptionItem>,
}

impl FieldState {
    pub fn from_descriptor(field: &FieldDescriptor) -> Self {
        Self {
            hidden: field.hidden,
            disabled: field.disabled,
            required: field.is_required(),
            options: field.options.clone(),
        }
    }
}

/// Keys a rule pass decided on. Later rules overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldStatePatch {
    pub hidden: Option<bool>,
    pub disabled: Option<bool>,
    pub required: Option<bool>,
    pub options: Option<Vec<OptionItem>>,
}

impl FieldStatePatch {
    pub fn is_empty(&self) -> bool {
        self.hidden.is_none() && self.disabled.is_none() && self.required.is_none() && self.options.is_none()
    }

    pub fn apply_to(self, state: &mut FieldState) {
        if let Some(hidden) = self.hidden {
            state.hidden = hidden;
        }
        if let Some(disabled) = self.disabled {
            state.disabled = disabled;
        }
        if let Some(required) = self.required {
            state.required = required;
        }
        if let Some(options) = self.options {
            state.options = options;
        }
    }
}

/// A value write requested by a rule; applied by the session after the pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueWrite {
    pub field: String,
    pub value: Value,
    pub source: RuleType,
}

/// What one value change did to the form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    /// Fields whose derived state differs from before the change.
    pub changed_states: Vec<String>,
    /// Fields written by rules (never the field the user edited, unless a rule rewrote it).
    pub written_fields: Vec<String>,
    /// Evaluator passes run.
    pub passes: usize,
}

impl ChangeSet {
    pub fn state_changed(&self, field: &str) -> bool {
        self.changed_states.iter().any(|f| f == field)
    }

    pub fn was_written(&self, field: &str) -> bool {
        self.written_fields.iter().any(|f| f == field)
    }
}
