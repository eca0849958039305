use std::collections::HashMap;

use anyhow::Result;
use ox_type_converter::{convert_value, TypeConverter, ValueType};
use serde_json::{Map, Value};

use crate::path::{get_path, set_path};
use crate::schema::{FieldDescriptor, FieldType, FormSchema};

/// Trait for binding records to forms.
pub trait Binder<T> {
    /// Builds the initial form values from a record.
    fn hydrate(&self, schema: &FormSchema, record: &T) -> Result<Map<String, Value>>;

    /// Extracts submitted form values back into a record.
    fn extract(&self, record: &mut T, values: &Map<String, Value>) -> Result<()>;
}

/// Binder for plain JSON object records.
pub struct RecordBinder;

impl Binder<Map<String, Value>> for RecordBinder {
    fn hydrate(&self, schema: &FormSchema, record: &Map<String, Value>) -> Result<Map<String, Value>> {
        initial_values(schema, Some(record))
    }

    fn extract(&self, record: &mut Map<String, Value>, values: &Map<String, Value>) -> Result<()> {
        for (key, value) in values {
            record.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Field defaults overlaid with whatever the record supplies. Record keys the
/// schema does not know are carried through untouched.
pub fn initial_values(schema: &FormSchema, record: Option<&Map<String, Value>>) -> Result<Map<String, Value>> {
    let mut values = record.cloned().unwrap_or_default();
    for field in schema.fields() {
        let value = match record.and_then(|r| get_path(r, &field.name)) {
            Some(existing) => fill_list_items(field, existing.clone()),
            None => field.initial_value(),
        };
        set_path(&mut values, &field.name, value).map_err(anyhow::Error::msg)?;
    }
    Ok(values)
}

/// A fresh list item built from the template defaults.
pub fn template_item(list: &FieldDescriptor) -> Value {
    let mut item = Map::new();
    for template in list.template() {
        item.insert(template.name.clone(), template.initial_value());
    }
    Value::Object(item)
}

fn fill_list_items(field: &FieldDescriptor, value: Value) -> Value {
    if field.field_type != FieldType::List {
        return value;
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(mut map) => {
                        for template in field.template() {
                            map.entry(template.name.clone()).or_insert_with(|| template.initial_value());
                        }
                        Value::Object(map)
                    }
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

/// Submitted values with text coerced to the kind the field declares.
///
/// Inputs hand back whatever the user typed, so a number field may hold
/// `"42"`. Text that does not look like the declared kind is left alone.
pub fn typed_values(schema: &FormSchema, values: &Map<String, Value>) -> Map<String, Value> {
    let mut typed = values.clone();
    for field in schema.fields() {
        let Some(target) = declared_kind(field.field_type) else {
            continue;
        };
        let Some(Value::String(raw)) = get_path(values, &field.name) else {
            continue;
        };
        let looks_like = TypeConverter::infer_from_string(raw);
        let compatible = match target {
            ValueType::Float => matches!(looks_like, ValueType::Integer | ValueType::Float),
            other => looks_like == other,
        };
        if !compatible {
            continue;
        }
        match convert_value(&Value::String(raw.clone()), target, &HashMap::new()) {
            Ok(converted) => {
                if let Err(e) = set_path(&mut typed, &field.name, converted) {
                    log::warn!("Could not store coerced value for '{}': {}", field.name, e);
                }
            }
            Err(e) => log::warn!("Could not coerce '{}' to {:?}: {}", field.name, target, e),
        }
    }
    typed
}

fn declared_kind(field_type: FieldType) -> Option<ValueType> {
    match field_type {
        FieldType::Number | FieldType::Currency | FieldType::Percent | FieldType::Slider | FieldType::Rate => {
            Some(ValueType::Float)
        }
        FieldType::Switch | FieldType::Checkbox => Some(ValueType::Boolean),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FormLayout, ListConfig};
    use serde_json::json;

    fn schema() -> FormSchema {
        let mut lines = FieldDescriptor::new("lines", FieldType::List);
        lines.list = Some(ListConfig {
            fields: vec![
                FieldDescriptor::new("sku", FieldType::Text),
                FieldDescriptor::new("qty", FieldType::Number).with_default(json!(1)),
            ],
            min: None,
            max: None,
        });
        FormSchema::new(
            "order",
            FormLayout::Fields(vec![
                FieldDescriptor::new("name", FieldType::Text).with_default(json!("anon")),
                FieldDescriptor::new("active", FieldType::Switch),
                FieldDescriptor::new("address.city", FieldType::Text),
                lines,
            ]),
        )
    }

    #[test]
    fn test_defaults_without_record() {
        let values = initial_values(&schema(), None).unwrap();
        assert_eq!(values["name"], json!("anon"));
        assert_eq!(values["active"], json!(false));
        assert_eq!(values["lines"], json!([]));
        assert_eq!(get_path(&values, "address.city"), Some(&Value::Null));
    }

    #[test]
    fn test_record_overrides_defaults_and_fills_items() {
        let record = json!({
            "name": "Ada",
            "extra": 7,
            "address": {"city": "Oslo"},
            "lines": [{"sku": "A-1"}]
        });
        let values = RecordBinder.hydrate(&schema(), record.as_object().unwrap()).unwrap();
        assert_eq!(values["name"], json!("Ada"));
        assert_eq!(values["extra"], json!(7));
        assert_eq!(get_path(&values, "address.city"), Some(&json!("Oslo")));
        assert_eq!(values["lines"], json!([{"sku": "A-1", "qty": 1}]));
    }

    #[test]
    fn test_template_item_and_extract() {
        let schema = schema();
        let lines = schema.field("lines").unwrap();
        assert_eq!(template_item(lines), json!({"sku": null, "qty": 1}));

        let mut record = Map::new();
        let values = initial_values(&schema, None).unwrap();
        RecordBinder.extract(&mut record, &values).unwrap();
        assert_eq!(record["name"], json!("anon"));
    }

    #[test]
    fn test_typed_values_coerces_declared_kinds() {
        let schema = FormSchema::new(
            "profile",
            FormLayout::Fields(vec![
                FieldDescriptor::new("age", FieldType::Number),
                FieldDescriptor::new("ratio", FieldType::Percent),
                FieldDescriptor::new("active", FieldType::Switch),
                FieldDescriptor::new("zip", FieldType::Text),
                FieldDescriptor::new("score", FieldType::Rate),
            ]),
        );
        let values = json!({
            "age": "42",
            "ratio": "0.5",
            "active": "true",
            "zip": "0042",
            "score": "lots"
        });
        let typed = typed_values(&schema, values.as_object().unwrap());
        assert_eq!(typed["age"], json!(42));
        assert_eq!(typed["ratio"], json!(0.5));
        assert_eq!(typed["active"], json!(true));
        assert_eq!(typed["zip"], json!("0042"));
        assert_eq!(typed["score"], json!("lots"));
    }
}
