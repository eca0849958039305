//! One mounted form: values, derived field states and the settle loop.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use uuid::Uuid;

use ox_callback_manager::CallbackRegistry;
use ox_type_converter::deep_equals;

use crate::autosave::{AutoSave, AutoSaveSink};
use crate::binding::{initial_values, template_item};
use crate::error::FormError;
use crate::evaluator::DependencyEvaluator;
use crate::list;
use crate::path::{get_path, set_path};
use crate::render::{FormEngine, RenderNode};
use crate::schema::{FieldDescriptor, FieldType, FormSchema};
use crate::state::{ChangeSet, FieldState, ValueWrite};
use crate::traits::RenderContext;
use crate::validation::{ValidationError, Validator};
use crate::wizard::WizardState;

/// Everything one evaluator pass produced.
struct PassResult {
    states: HashMap<String, FieldState>,
    writes: Vec<ValueWrite>,
    errors: Vec<ValidationError>,
}

pub struct FormSession {
    id: Uuid,
    schema: Arc<FormSchema>,
    callbacks: Arc<CallbackRegistry>,
    values: Map<String, Value>,
    states: HashMap<String, FieldState>,
    rule_errors: Vec<ValidationError>,
    validation_errors: Vec<ValidationError>,
    wizard: Option<WizardState>,
    auto_save: Option<AutoSave>,
    mounted: bool,
}

impl FormSession {
    /// Bind `record` (if any) over the schema defaults and derive the initial
    /// field states.
    pub async fn mount(
        schema: Arc<FormSchema>,
        callbacks: Arc<CallbackRegistry>,
        record: Option<&Map<String, Value>>,
    ) -> Result<Self, FormError> {
        schema.check()?;
        let values = initial_values(&schema, record).map_err(|e| FormError::Binding(e.to_string()))?;
        let wizard = match schema.step_count() {
            0 => None,
            steps => Some(WizardState::new(steps)),
        };
        let mut session = Self {
            id: Uuid::new_v4(),
            schema,
            callbacks,
            values,
            states: HashMap::new(),
            rule_errors: Vec::new(),
            validation_errors: Vec::new(),
            wizard,
            auto_save: None,
            mounted: true,
        };
        let changes = session.settle().await;
        log::debug!(
            "Mounted form '{}' ({}) after {} pass(es)",
            session.schema.id,
            session.id,
            changes.passes
        );
        Ok(session)
    }

    /// Enable debounced auto-save using the schema's configured delay.
    pub fn with_auto_save(mut self, sink: AutoSaveSink) -> Self {
        match self.schema.config.auto_save_delay_ms {
            Some(ms) => self.auto_save = Some(AutoSave::new(Duration::from_millis(ms), sink)),
            None => log::warn!("Form '{}' has no auto_save_delay_ms; auto-save disabled", self.schema.id),
        }
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        get_path(&self.values, key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn field_state(&self, key: &str) -> Option<&FieldState> {
        self.states.get(key)
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.states.get(key).is_some_and(|s| !s.hidden)
    }

    /// Errors raised by custom rules followed by the last validation result.
    pub fn errors(&self) -> Vec<ValidationError> {
        self.rule_errors.iter().chain(&self.validation_errors).cloned().collect()
    }

    pub fn auto_save_pending(&self) -> bool {
        self.auto_save.as_ref().is_some_and(AutoSave::is_pending)
    }

    /// Record a user edit and settle every dependent field.
    pub async fn set_value(&mut self, key: &str, value: Value) -> Result<ChangeSet, FormError> {
        self.ensure_mounted()?;
        if self.schema.resolve_field(key).is_none() {
            return Err(FormError::UnknownField(key.to_string()));
        }
        set_path(&mut self.values, key, value).map_err(|message| FormError::InvalidPath {
            path: key.to_string(),
            message,
        })?;
        Ok(self.after_change().await)
    }

    async fn after_change(&mut self) -> ChangeSet {
        let changes = self.settle().await;
        if let Some(auto_save) = &mut self.auto_save {
            auto_save.schedule(self.values.clone());
        }
        changes
    }

    /// Run evaluator passes until no rule writes a value or the configured
    /// pass limit is reached. Writes land only between passes.
    async fn settle(&mut self) -> ChangeSet {
        let before = self.states.clone();
        let max_passes = self.schema.config.max_settle_passes.max(1);
        let mut written = BTreeSet::new();
        let mut passes = 0;

        loop {
            passes += 1;
            let pass = self.run_pass().await;
            self.states = pass.states;
            self.rule_errors = pass.errors;
            let applied = self.apply_writes(pass.writes);
            if applied.is_empty() {
                break;
            }
            written.extend(applied);
            if passes >= max_passes {
                log::warn!(
                    "Form '{}' still writing values after {} pass(es); stopping",
                    self.schema.id,
                    passes
                );
                break;
            }
        }

        let mut changed_states: Vec<String> = self
            .states
            .iter()
            .filter(|(key, state)| before.get(*key) != Some(*state))
            .map(|(key, _)| key.clone())
            .chain(before.keys().filter(|key| !self.states.contains_key(*key)).cloned())
            .collect();
        changed_states.sort();
        log::debug!(
            "Form '{}' settled in {} pass(es), {} state change(s)",
            self.schema.id,
            passes,
            changed_states.len()
        );

        ChangeSet {
            changed_states,
            written_fields: written.into_iter().collect(),
            passes,
        }
    }

    async fn run_pass(&self) -> PassResult {
        let evaluator = DependencyEvaluator::new(&self.callbacks);
        let mut result = PassResult {
            states: HashMap::new(),
            writes: Vec::new(),
            errors: Vec::new(),
        };

        for field in self.schema.fields() {
            let outcome = evaluator.evaluate_field(field, &self.values).await;
            let mut state = FieldState::from_descriptor(field);
            outcome.patch.apply_to(&mut state);
            result.states.insert(field.name.clone(), state);
            result.writes.extend(outcome.writes);
            result.errors.extend(outcome.errors.into_iter().map(|(field, message)| ValidationError { field, message }));

            if field.field_type == FieldType::List {
                self.run_list_items(&evaluator, field, &mut result).await;
            }
        }
        result
    }

    /// Evaluate each item's template fields against the item's own values,
    /// falling back to form-level values for names the item lacks.
    async fn run_list_items(&self, evaluator: &DependencyEvaluator<'_>, list: &FieldDescriptor, result: &mut PassResult) {
        let Some(items) = get_path(&self.values, &list.name).and_then(Value::as_array) else {
            return;
        };
        for (index, item) in items.iter().enumerate() {
            let prefix = format!("{}.{}", list.name, index);
            let mut scope = self.values.clone();
            if let Value::Object(item) = item {
                scope.extend(item.clone());
            }
            let scoped = |name: String| {
                if list.template().iter().any(|t| t.name == name) {
                    format!("{}.{}", prefix, name)
                } else {
                    name
                }
            };
            for template in list.template() {
                let outcome = evaluator.evaluate_field(template, &scope).await;
                let mut state = FieldState::from_descriptor(template);
                outcome.patch.apply_to(&mut state);
                result.states.insert(format!("{}.{}", prefix, template.name), state);
                result.writes.extend(outcome.writes.into_iter().map(|w| ValueWrite {
                    field: scoped(w.field),
                    ..w
                }));
                result.errors.extend(outcome.errors.into_iter().map(|(field, message)| ValidationError {
                    field: scoped(field),
                    message,
                }));
            }
        }
    }

    /// Apply writes that change something; returns the keys actually written.
    fn apply_writes(&mut self, writes: Vec<ValueWrite>) -> Vec<String> {
        let mut applied = Vec::new();
        for write in writes {
            if get_path(&self.values, &write.field).is_some_and(|current| deep_equals(current, &write.value)) {
                continue;
            }
            match set_path(&mut self.values, &write.field, write.value) {
                Ok(()) => {
                    log::debug!("{:?} rule wrote '{}'", write.source, write.field);
                    applied.push(write.field);
                }
                Err(e) => log::warn!("Dropping {:?} write to '{}': {}", write.source, write.field, e),
            }
        }
        applied
    }

    /// Validate every visible field. The result is kept for rendering.
    pub fn validate(&mut self) -> Result<(), FormError> {
        let errors = Validator.validate(&self.schema, &self.values, &self.states);
        self.finish_validation(errors)
    }

    fn validate_step(&mut self, step: usize) -> Result<(), FormError> {
        let schema = self.schema.clone();
        let fields = schema.groups().get(step).map(|g| g.fields.as_slice()).unwrap_or(&[]);
        let errors = Validator.validate_fields(fields, &self.values, &self.states);
        self.finish_validation(errors)
    }

    fn finish_validation(&mut self, errors: Vec<ValidationError>) -> Result<(), FormError> {
        self.validation_errors = errors.clone();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormError::Validation(errors))
        }
    }

    /// Validate everything and hand back the values. A pending auto-save is
    /// cancelled on success.
    pub fn submit(&mut self) -> Result<Map<String, Value>, FormError> {
        self.ensure_mounted()?;
        self.validate()?;
        if let Some(auto_save) = &mut self.auto_save {
            auto_save.cancel();
        }
        log::debug!("Form '{}' submitted", self.schema.id);
        Ok(self.values.clone())
    }

    /// Drop derived state and stop the auto-save timer.
    pub fn unmount(&mut self) {
        if let Some(auto_save) = &mut self.auto_save {
            auto_save.cancel();
        }
        self.states.clear();
        self.rule_errors.clear();
        self.validation_errors.clear();
        self.mounted = false;
    }

    fn ensure_mounted(&self) -> Result<(), FormError> {
        if self.mounted {
            Ok(())
        } else {
            Err(FormError::Unmounted)
        }
    }

    pub fn active_step(&self) -> Option<usize> {
        self.wizard.map(|w| w.current)
    }

    pub fn wizard(&self) -> Option<&WizardState> {
        self.wizard.as_ref()
    }

    fn current_wizard(&self) -> Result<WizardState, FormError> {
        self.ensure_mounted()?;
        self.wizard.ok_or(FormError::NotAWizard)
    }

    /// Move forward once the active step's visible fields are valid.
    pub fn next_step(&mut self) -> Result<usize, FormError> {
        let mut wizard = self.current_wizard()?;
        self.validate_step(wizard.current)?;
        wizard.advance();
        self.wizard = Some(wizard);
        Ok(wizard.current)
    }

    pub fn previous_step(&mut self) -> Result<usize, FormError> {
        let mut wizard = self.current_wizard()?;
        wizard.back();
        self.validation_errors.clear();
        self.wizard = Some(wizard);
        Ok(wizard.current)
    }

    /// Jump to `step`. Jumping forward validates every step being passed.
    pub fn go_to_step(&mut self, step: usize) -> Result<usize, FormError> {
        let mut wizard = self.current_wizard()?;
        if step >= wizard.step_count {
            return Err(FormError::StepOutOfRange(step));
        }
        for passed in wizard.current..step {
            self.validate_step(passed)?;
        }
        wizard.go_to(step)?;
        self.wizard = Some(wizard);
        Ok(step)
    }

    pub async fn add_list_item(&mut self, name: &str) -> Result<ChangeSet, FormError> {
        self.edit_list(name, |field, items| list::add_item(field, items, template_item(field)).map(|_| ()))?;
        Ok(self.after_change().await)
    }

    pub async fn remove_list_item(&mut self, name: &str, index: usize) -> Result<ChangeSet, FormError> {
        self.edit_list(name, |field, items| list::remove_item(field, items, index).map(|_| ()))?;
        Ok(self.after_change().await)
    }

    pub async fn move_list_item(&mut self, name: &str, from: usize, to: usize) -> Result<ChangeSet, FormError> {
        self.edit_list(name, |field, items| list::move_item(field, items, from, to))?;
        Ok(self.after_change().await)
    }

    pub async fn duplicate_list_item(&mut self, name: &str, index: usize) -> Result<ChangeSet, FormError> {
        self.edit_list(name, |field, items| list::duplicate_item(field, items, index).map(|_| ()))?;
        Ok(self.after_change().await)
    }

    fn edit_list(
        &mut self,
        name: &str,
        op: impl FnOnce(&FieldDescriptor, &mut Vec<Value>) -> Result<(), FormError>,
    ) -> Result<(), FormError> {
        self.ensure_mounted()?;
        let schema = self.schema.clone();
        let field = schema.field(name).ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        if field.field_type != FieldType::List {
            return Err(FormError::NotAList(name.to_string()));
        }
        if self.states.get(name).is_some_and(|s| s.disabled) {
            return Err(FormError::ListBounds {
                name: name.to_string(),
                message: "list is disabled".to_string(),
            });
        }
        let mut items = get_path(&self.values, name)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        op(field, &mut items)?;
        set_path(&mut self.values, name, Value::Array(items)).map_err(|message| FormError::InvalidPath {
            path: name.to_string(),
            message,
        })
    }

    /// Render the current state through `engine`.
    pub fn render(&self, engine: &FormEngine, props: &HashMap<String, Value>) -> anyhow::Result<RenderNode> {
        if !self.mounted {
            return Err(FormError::Unmounted.into());
        }
        let errors = self.errors();
        let ctx = RenderContext {
            values: &self.values,
            states: &self.states,
            errors: &errors,
            active_step: self.active_step(),
            props,
        };
        engine.render(&self.schema, &ctx)
    }
}
