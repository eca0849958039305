//! Dependency rule interpreter.
//!
//! Evaluation reads a snapshot of the form values and returns what should
//! change; it never writes values itself. Malformed configuration (unknown
//! rule types, missing callbacks, failing callbacks) degrades to a no-op.

use serde_json::{Map, Value};

use ox_callback_manager::{Callback, CallbackRegistry, FormHandle};
use ox_type_converter::{deep_equals, is_empty, loose_equals};

use crate::condition::evaluate_conditions;
use crate::path::get_path;
use crate::schema::{DependencyRule, FieldDescriptor, OptionItem, RuleType};
use crate::state::{FieldStatePatch, ValueWrite};

/// Result of evaluating one field's rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOutcome {
    pub patch: FieldStatePatch,
    pub writes: Vec<ValueWrite>,
    /// `(field, message)` pairs raised by custom callbacks.
    pub errors: Vec<(String, String)>,
}

pub struct DependencyEvaluator<'a> {
    callbacks: &'a CallbackRegistry,
}

impl<'a> DependencyEvaluator<'a> {
    pub fn new(callbacks: &'a CallbackRegistry) -> Self {
        Self { callbacks }
    }

    pub fn rule_applies(&self, rule: &DependencyRule, values: &Map<String, Value>) -> bool {
        evaluate_conditions(&rule.conditions, rule.logic, values)
    }

    /// Run a field's rules in declaration order against `values`.
    pub async fn evaluate_field(&self, field: &FieldDescriptor, values: &Map<String, Value>) -> FieldOutcome {
        let mut outcome = FieldOutcome::default();
        // Value as it will be once earlier writes from this list land.
        let mut current = get_path(values, &field.name).cloned().unwrap_or(Value::Null);

        for rule in &field.dependencies {
            let met = self.rule_applies(rule, values);
            // Toggles write on every pass; everything after the guard needs the rule met.
            match rule.rule_type {
                RuleType::Show => outcome.patch.hidden = Some(!met),
                RuleType::Hide => outcome.patch.hidden = Some(met),
                RuleType::Enable => outcome.patch.disabled = Some(!met),
                RuleType::Disable => outcome.patch.disabled = Some(met),
                RuleType::Require => outcome.patch.required = Some(met),
                RuleType::Optional => outcome.patch.required = Some(!met),
                _ if !met => {}
                RuleType::SetValue => match &rule.target {
                    Some(target) if !deep_equals(&current, target) => {
                        current = target.clone();
                        outcome.writes.push(write(field, target.clone(), RuleType::SetValue));
                    }
                    Some(_) => {}
                    None => log::warn!("set_value rule on '{}' has no target", field.name),
                },
                RuleType::ClearValue => {
                    if !is_empty(&current) {
                        current = Value::Null;
                        outcome.writes.push(write(field, Value::Null, RuleType::ClearValue));
                    }
                }
                RuleType::SetOptions => {
                    let source = match &rule.target {
                        Some(target) => Some(target.clone()),
                        None => self.compute(field, rule, values).await,
                    };
                    match source.as_ref().and_then(OptionItem::list_from_value) {
                        Some(options) => outcome.patch.options = Some(options),
                        None => log::warn!("set_options rule on '{}' produced no option list", field.name),
                    }
                }
                RuleType::FilterOptions => {
                    let allowed = rule
                        .target
                        .as_ref()
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();
                    let base = outcome.patch.options.take().unwrap_or_else(|| field.options.clone());
                    outcome.patch.options = Some(
                        base.into_iter()
                            .filter(|o| allowed.iter().any(|a| loose_equals(&o.value, a)))
                            .collect(),
                    );
                }
                RuleType::Calculate => {
                    if let Some(result) = self.compute(field, rule, values).await {
                        if !deep_equals(&result, &current) {
                            current = result.clone();
                            outcome.writes.push(write(field, result, RuleType::Calculate));
                        }
                    }
                }
                RuleType::Custom => self.run_custom(field, rule, values, &mut outcome),
                RuleType::Unknown => {
                    log::warn!("Unknown dependency rule type on '{}' ignored", field.name);
                }
            }
        }
        outcome
    }

    /// Run a value-producing callback. Async callbacks are awaited only when
    /// the rule is declared async.
    async fn compute(&self, field: &FieldDescriptor, rule: &DependencyRule, values: &Map<String, Value>) -> Option<Value> {
        let callback = self.lookup(field, rule)?;
        if matches!(callback, Callback::AsyncCalculate(_)) && !rule.is_async {
            log::warn!(
                "Rule on '{}' uses async callback '{}' but is not declared async",
                field.name,
                rule.callback.as_deref().unwrap_or_default()
            );
            return None;
        }
        match callback.compute(values).await {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Callback for '{}' failed: {}", field.name, e);
                None
            }
        }
    }

    fn run_custom(
        &self,
        field: &FieldDescriptor,
        rule: &DependencyRule,
        values: &Map<String, Value>,
        outcome: &mut FieldOutcome,
    ) {
        let Some(callback) = self.lookup(field, rule) else {
            return;
        };
        let Callback::Custom(f) = callback else {
            log::warn!("Custom rule on '{}' references a {} callback", field.name, callback.kind());
            return;
        };
        let mut handle = PendingForm {
            values,
            writes: Vec::new(),
            errors: Vec::new(),
        };
        match f(&mut handle, values, &field.name) {
            Ok(Some(message)) => log::debug!("Custom rule on '{}': {}", field.name, message),
            Ok(None) => {}
            Err(e) => log::warn!("Custom rule on '{}' failed: {}", field.name, e),
        }
        outcome.writes.extend(handle.writes);
        outcome.errors.extend(handle.errors);
    }

    fn lookup(&self, field: &FieldDescriptor, rule: &DependencyRule) -> Option<&'a Callback> {
        let Some(id) = rule.callback.as_deref() else {
            log::warn!("{:?} rule on '{}' has no callback id", rule.rule_type, field.name);
            return None;
        };
        let callback = self.callbacks.get(id);
        if callback.is_none() {
            log::warn!("Callback '{}' referenced by '{}' is not registered", id, field.name);
        }
        callback
    }
}

fn write(field: &FieldDescriptor, value: Value, source: RuleType) -> ValueWrite {
    ValueWrite {
        field: field.name.clone(),
        value,
        source,
    }
}

/// Form handle given to custom callbacks: reads see earlier writes from the
/// same callback, writes are queued for the session.
struct PendingForm<'v> {
    values: &'v Map<String, Value>,
    writes: Vec<ValueWrite>,
    errors: Vec<(String, String)>,
}

impl FormHandle for PendingForm<'_> {
    fn get_value(&self, name: &str) -> Option<Value> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.field == name)
            .map(|w| w.value.clone())
            .or_else(|| get_path(self.values, name).cloned())
    }

    fn set_value(&mut self, name: &str, value: Value) {
        self.writes.push(ValueWrite {
            field: name.to_string(),
            value,
            source: RuleType::Custom,
        });
    }

    fn set_error(&mut self, name: &str, message: String) {
        self.errors.push((name.to_string(), message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Condition, FieldType, Operator};
    use futures::FutureExt;
    use serde_json::json;

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn when_a_is_true(rule_type: RuleType) -> DependencyRule {
        DependencyRule::new(rule_type, vec![Condition::new("a", Operator::Equals, json!(true))])
    }

    #[tokio::test]
    async fn test_toggle_rules_follow_condition() {
        let registry = CallbackRegistry::new();
        let evaluator = DependencyEvaluator::new(&registry);
        let field = FieldDescriptor::new("b", FieldType::Text).with_dependency(when_a_is_true(RuleType::Show));

        let off = evaluator.evaluate_field(&field, &values(json!({"a": false}))).await;
        assert_eq!(off.patch.hidden, Some(true));
        let on = evaluator.evaluate_field(&field, &values(json!({"a": true}))).await;
        assert_eq!(on.patch.hidden, Some(false));
        assert!(on.writes.is_empty());
    }

    #[tokio::test]
    async fn test_later_rule_wins_for_same_key() {
        let registry = CallbackRegistry::new();
        let evaluator = DependencyEvaluator::new(&registry);
        let field = FieldDescriptor::new("b", FieldType::Text)
            .with_dependency(when_a_is_true(RuleType::Show))
            .with_dependency(when_a_is_true(RuleType::Hide));

        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": true}))).await;
        assert_eq!(outcome.patch.hidden, Some(true));
    }

    #[tokio::test]
    async fn test_set_value_compares_before_writing() {
        let registry = CallbackRegistry::new();
        let evaluator = DependencyEvaluator::new(&registry);
        let field = FieldDescriptor::new("b", FieldType::Text)
            .with_dependency(when_a_is_true(RuleType::SetValue).with_target(json!("fixed")));

        let first = evaluator.evaluate_field(&field, &values(json!({"a": true, "b": "x"}))).await;
        assert_eq!(first.writes.len(), 1);
        assert_eq!(first.writes[0].value, json!("fixed"));

        let second = evaluator.evaluate_field(&field, &values(json!({"a": true, "b": "fixed"}))).await;
        assert!(second.writes.is_empty());
    }

    #[tokio::test]
    async fn test_clear_value_only_when_non_empty() {
        let registry = CallbackRegistry::new();
        let evaluator = DependencyEvaluator::new(&registry);
        let field = FieldDescriptor::new("b", FieldType::Text).with_dependency(when_a_is_true(RuleType::ClearValue));

        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": true, "b": "x"}))).await;
        assert_eq!(outcome.writes[0].value, Value::Null);
        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": true, "b": ""}))).await;
        assert!(outcome.writes.is_empty());
    }

    #[tokio::test]
    async fn test_filter_options_intersects_static_options() {
        let registry = CallbackRegistry::new();
        let evaluator = DependencyEvaluator::new(&registry);
        let mut field = FieldDescriptor::new("city", FieldType::Select)
            .with_dependency(when_a_is_true(RuleType::FilterOptions).with_target(json!(["osl", "ber"])));
        field.options = vec![
            OptionItem::new("Oslo", json!("osl")),
            OptionItem::new("Paris", json!("par")),
            OptionItem::new("Berlin", json!("ber")),
        ];

        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": true}))).await;
        let labels: Vec<String> = outcome.patch.options.unwrap().into_iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["Oslo", "Berlin"]);

        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": false}))).await;
        assert_eq!(outcome.patch.options, None);
    }

    #[tokio::test]
    async fn test_set_options_from_target_scalars() {
        let registry = CallbackRegistry::new();
        let evaluator = DependencyEvaluator::new(&registry);
        let field = FieldDescriptor::new("size", FieldType::Select)
            .with_dependency(when_a_is_true(RuleType::SetOptions).with_target(json!(["S", {"label": "Medium", "value": "M"}])));

        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": true}))).await;
        assert_eq!(
            outcome.patch.options,
            Some(vec![OptionItem::new("S", json!("S")), OptionItem::new("Medium", json!("M"))])
        );
    }

    #[tokio::test]
    async fn test_calculate_and_async_calculate() {
        let mut registry = CallbackRegistry::new();
        registry.register_calculation("double", |v| Ok(json!(v.get("n").and_then(Value::as_i64).unwrap_or(0) * 2)));
        registry.register_async_calculation("remote", |_v| async { Ok::<_, ox_callback_manager::CallbackError>(json!("late")) }.boxed());
        let evaluator = DependencyEvaluator::new(&registry);

        let calc = FieldDescriptor::new("twice", FieldType::Number).with_dependency(
            DependencyRule::new(RuleType::Calculate, vec![]).with_callback("double"),
        );
        let outcome = evaluator.evaluate_field(&calc, &values(json!({"n": 4, "twice": 0}))).await;
        assert_eq!(outcome.writes[0].value, json!(8));
        let outcome = evaluator.evaluate_field(&calc, &values(json!({"n": 4, "twice": 8.0}))).await;
        assert!(outcome.writes.is_empty());

        let undeclared = FieldDescriptor::new("late", FieldType::Text).with_dependency(
            DependencyRule::new(RuleType::Calculate, vec![]).with_callback("remote"),
        );
        assert!(evaluator.evaluate_field(&undeclared, &Map::new()).await.writes.is_empty());

        let declared = FieldDescriptor::new("late", FieldType::Text).with_dependency(
            DependencyRule::new(RuleType::Calculate, vec![]).with_callback("remote").asynchronous(),
        );
        let outcome = evaluator.evaluate_field(&declared, &Map::new()).await;
        assert_eq!(outcome.writes[0].value, json!("late"));
    }

    #[tokio::test]
    async fn test_custom_callback_collects_writes_and_errors() {
        let mut registry = CallbackRegistry::new();
        registry.register_custom("guard", |form, _values, field| {
            form.set_error(field, "Not allowed".to_string());
            form.set_value("note", json!("blocked"));
            Ok(None)
        });
        let evaluator = DependencyEvaluator::new(&registry);
        let field = FieldDescriptor::new("b", FieldType::Text)
            .with_dependency(when_a_is_true(RuleType::Custom).with_callback("guard"));

        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": true}))).await;
        assert_eq!(outcome.errors, vec![("b".to_string(), "Not allowed".to_string())]);
        assert_eq!(outcome.writes[0].field, "note");

        let outcome = evaluator.evaluate_field(&field, &values(json!({"a": false}))).await;
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_rules_are_no_ops() {
        let registry = CallbackRegistry::new();
        let evaluator = DependencyEvaluator::new(&registry);
        let rule: DependencyRule = serde_json::from_value(json!({"type": "teleport", "conditions": []})).unwrap();
        let field = FieldDescriptor::new("b", FieldType::Text)
            .with_dependency(rule)
            .with_dependency(DependencyRule::new(RuleType::Calculate, vec![]).with_callback("missing"));

        let outcome = evaluator.evaluate_field(&field, &Map::new()).await;
        assert!(outcome.patch.is_empty());
        assert!(outcome.writes.is_empty());
    }
}
