use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TypeMappingConfig {
    pub mappings: HashMap<FieldType, DefaultFieldConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DefaultFieldConfig {
    pub component: String,
    #[serde(default)]
    pub default_props: Value,
}

use crate::error::FormError;
use crate::schema::{FieldDescriptor, FieldType};
use crate::traits::ElementRenderer;
use std::sync::Arc;

#[derive(Default)]
pub struct TypeRegistry {
    /// Maps field types (e.g. Email) to default configs (e.g. component="email-input")
    mapping: HashMap<FieldType, DefaultFieldConfig>,
    /// Maps component names (e.g. "email-input") to actual renderers
    element_renderers: HashMap<String, Arc<dyn ElementRenderer>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_config(&mut self, config: TypeMappingConfig) {
        self.mapping.extend(config.mappings);
    }

    pub fn resolve_component_config(&self, field_type: FieldType) -> Option<&DefaultFieldConfig> {
        self.mapping.get(&field_type)
    }

    pub fn register_element_renderer(&mut self, name: &str, renderer: Arc<dyn ElementRenderer>) {
        self.element_renderers.insert(name.to_string(), renderer);
    }

    /// Registers `renderer` under `name` and maps every type it handles to it,
    /// unless a mapping was already loaded for that type.
    pub fn register_for_handled_types(&mut self, name: &str, renderer: Arc<dyn ElementRenderer>) {
        for field_type in renderer.handled_field_types() {
            self.mapping.entry(field_type).or_insert_with(|| DefaultFieldConfig {
                component: name.to_string(),
                default_props: Value::Null,
            });
        }
        self.register_element_renderer(name, renderer);
    }

    pub fn get_element_renderer(&self, component_name: &str) -> Option<Arc<dyn ElementRenderer>> {
        self.element_renderers.get(component_name).cloned()
    }

    /// Component name, default props and renderer for a field. A field's own
    /// `component` override takes precedence over the type mapping.
    pub fn resolve_renderer(
        &self,
        field: &FieldDescriptor,
    ) -> Result<(String, &Value, Arc<dyn ElementRenderer>), FormError> {
        let config = self.mapping.get(&field.field_type);
        let component = match (&field.component, config) {
            (Some(name), _) => name.clone(),
            (None, Some(config)) => config.component.clone(),
            (None, None) => return Err(FormError::UnregisteredFieldType(field.field_type)),
        };
        let renderer = self
            .get_element_renderer(&component)
            .ok_or_else(|| FormError::UnregisteredComponent(component.clone()))?;
        // Mapped props belong to the mapped component, not to an override.
        let default_props = config
            .filter(|c| c.component == component)
            .map(|c| &c.default_props)
            .unwrap_or(&Value::Null);
        Ok((component, default_props, renderer))
    }

    /// Every non-structural field type must map to a registered renderer.
    pub fn verify(&self) -> Result<(), FormError> {
        for field_type in FieldType::ALL {
            if field_type.is_structural() {
                continue;
            }
            let registered = self
                .mapping
                .get(&field_type)
                .is_some_and(|config| self.element_renderers.contains_key(&config.component));
            if !registered {
                return Err(FormError::UnregisteredFieldType(field_type));
            }
        }
        Ok(())
    }

    /// Checks that every component override in `fields` resolves.
    pub fn verify_overrides<'f>(&self, fields: impl IntoIterator<Item = &'f FieldDescriptor>) -> Result<(), FormError> {
        for field in fields {
            if let Some(component) = &field.component {
                if !self.element_renderers.contains_key(component) {
                    return Err(FormError::UnregisteredComponent(component.clone()));
                }
            }
            self.verify_overrides(field.template())?;
        }
        Ok(())
    }
}
