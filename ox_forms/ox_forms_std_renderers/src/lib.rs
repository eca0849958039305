use anyhow::{Error, Result};
use ox_forms::registry::TypeRegistry;
use ox_forms::schema::FieldType;
use ox_forms::traits::{ElementRenderer, FieldView, RenderContext, Widget};
use ox_type_converter::{is_truthy, to_display_string, to_f64};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct TextInputRenderer;

impl ElementRenderer for TextInputRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![
            FieldType::Text,
            FieldType::Textarea,
            FieldType::Password,
            FieldType::Email,
            FieldType::Url,
            FieldType::Phone,
            FieldType::Color,
            FieldType::AutoComplete,
        ]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        let input_type = match view.field.field_type {
            FieldType::Password => "password",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Phone => "tel",
            FieldType::Color => "color",
            _ => "text",
        };
        let mut widget = Widget::from_view(view)
            .with_prop("input_type", json!(input_type))
            .with_prop("multiline", json!(view.field.field_type == FieldType::Textarea));
        widget.value = Value::String(to_display_string(&view.value));
        Ok(widget)
    }
}

pub struct NumberInputRenderer;

impl ElementRenderer for NumberInputRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![
            FieldType::Number,
            FieldType::Currency,
            FieldType::Percent,
            FieldType::Slider,
            FieldType::Rate,
        ]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        let mut widget = Widget::from_view(view).with_prop("input_type", json!("number"));
        widget = match view.field.field_type {
            FieldType::Currency => widget.with_prop("format", json!("currency")),
            FieldType::Percent => widget.with_prop("format", json!("percent")),
            FieldType::Slider => widget.with_prop("control", json!("slider")),
            FieldType::Rate => {
                let count = view.field.props.get("count").cloned().unwrap_or(json!(5));
                widget.with_prop("control", json!("rate")).with_prop("count", count)
            }
            _ => widget,
        };
        for rule in &view.field.rules {
            if rule.rule_type == "min" || rule.rule_type == "max" {
                widget = widget.with_prop(&rule.rule_type, rule.parameters.clone());
            }
        }
        widget.value = match &view.value {
            Value::Null => Value::Null,
            other => match to_f64(other) {
                Some(n) => json!(n),
                None => {
                    log::debug!("Non-numeric value for '{}' shown as empty", view.key);
                    Value::Null
                }
            },
        };
        Ok(widget)
    }
}

pub struct ToggleRenderer;

impl ElementRenderer for ToggleRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![FieldType::Switch, FieldType::Checkbox]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        let mut widget = Widget::from_view(view);
        widget.value = Value::Bool(is_truthy(&view.value));
        Ok(widget)
    }
}

pub struct ChoiceRenderer;

impl ElementRenderer for ChoiceRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![
            FieldType::Radio,
            FieldType::Select,
            FieldType::MultiSelect,
            FieldType::CheckboxGroup,
            FieldType::Cascader,
            FieldType::TreeSelect,
            FieldType::Tags,
        ]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        let multiple = view.field.field_type.is_multi_valued();
        let mut widget = Widget::from_view(view).with_prop("multiple", json!(multiple));
        if multiple {
            widget.value = match &view.value {
                Value::Array(_) => view.value.clone(),
                Value::Null => json!([]),
                scalar => json!([scalar]),
            };
        } else if !view.value.is_null() && !view.state.options.iter().any(|o| o.value == view.value) {
            log::debug!("Value of '{}' is not among its options", view.key);
        }
        Ok(widget)
    }
}

pub struct DateTimeRenderer;

impl ElementRenderer for DateTimeRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![FieldType::Date, FieldType::DateRange, FieldType::Time, FieldType::DateTime]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        let default_format = match view.field.field_type {
            FieldType::Time => "HH:mm:ss",
            FieldType::DateTime => "YYYY-MM-DD HH:mm:ss",
            _ => "YYYY-MM-DD",
        };
        let format = view.field.props.get("format").cloned().unwrap_or(json!(default_format));
        Ok(Widget::from_view(view)
            .with_prop("format", format)
            .with_prop("range", json!(view.field.field_type == FieldType::DateRange)))
    }
}

pub struct UploadRenderer;

impl ElementRenderer for UploadRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![FieldType::Upload, FieldType::Image]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        let mut widget = Widget::from_view(view).with_prop("multiple", json!(true));
        if view.field.field_type == FieldType::Image {
            widget = widget.with_prop("accept", json!("image/*"));
        }
        if view.value.is_null() {
            widget.value = json!([]);
        }
        Ok(widget)
    }
}

pub struct RichContentRenderer;

impl ElementRenderer for RichContentRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![FieldType::RichText, FieldType::Json]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        let mut widget = Widget::from_view(view);
        if view.field.field_type == FieldType::Json {
            widget = widget.with_prop("language", json!("json"));
            widget.value = match &view.value {
                Value::String(_) | Value::Null => view.value.clone(),
                structured => Value::String(serde_json::to_string_pretty(structured)?),
            };
        } else {
            widget = widget.with_prop("format", json!("html"));
        }
        Ok(widget)
    }
}

pub struct HiddenRenderer;

impl ElementRenderer for HiddenRenderer {
    fn handled_field_types(&self) -> Vec<FieldType> {
        vec![FieldType::Hidden]
    }

    fn render(&self, view: &FieldView, _ctx: &RenderContext) -> Result<Widget, Error> {
        Ok(Widget::from_view(view).with_prop("input_type", json!("hidden")))
    }
}

/// Register every standard renderer. Type mappings loaded beforehand win.
pub fn register_standard_renderers(registry: &mut TypeRegistry) {
    registry.register_for_handled_types("text-input", Arc::new(TextInputRenderer));
    registry.register_for_handled_types("number-input", Arc::new(NumberInputRenderer));
    registry.register_for_handled_types("toggle", Arc::new(ToggleRenderer));
    registry.register_for_handled_types("choice", Arc::new(ChoiceRenderer));
    registry.register_for_handled_types("date-time", Arc::new(DateTimeRenderer));
    registry.register_for_handled_types("upload", Arc::new(UploadRenderer));
    registry.register_for_handled_types("rich-content", Arc::new(RichContentRenderer));
    registry.register_for_handled_types("hidden", Arc::new(HiddenRenderer));
}

/// A registry with the standard renderers, checked for completeness.
pub fn standard_registry() -> Result<TypeRegistry, ox_forms::FormError> {
    let mut registry = TypeRegistry::new();
    register_standard_renderers(&mut registry);
    registry.verify()?;
    Ok(registry)
}
