use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormError;

/// Widget kinds a field can take. `List` is structural: the engine renders it
/// as repeated sub-forms rather than handing it to an element renderer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Password,
    Email,
    Url,
    Phone,
    Number,
    Currency,
    Percent,
    Slider,
    Rate,
    Switch,
    Checkbox,
    CheckboxGroup,
    Radio,
    Select,
    MultiSelect,
    Cascader,
    TreeSelect,
    AutoComplete,
    Tags,
    Date,
    DateRange,
    Time,
    DateTime,
    Color,
    Upload,
    Image,
    RichText,
    Json,
    Hidden,
    List,
}

impl FieldType {
    pub const ALL: [FieldType; 32] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Password,
        FieldType::Email,
        FieldType::Url,
        FieldType::Phone,
        FieldType::Number,
        FieldType::Currency,
        FieldType::Percent,
        FieldType::Slider,
        FieldType::Rate,
        FieldType::Switch,
        FieldType::Checkbox,
        FieldType::CheckboxGroup,
        FieldType::Radio,
        FieldType::Select,
        FieldType::MultiSelect,
        FieldType::Cascader,
        FieldType::TreeSelect,
        FieldType::AutoComplete,
        FieldType::Tags,
        FieldType::Date,
        FieldType::DateRange,
        FieldType::Time,
        FieldType::DateTime,
        FieldType::Color,
        FieldType::Upload,
        FieldType::Image,
        FieldType::RichText,
        FieldType::Json,
        FieldType::Hidden,
        FieldType::List,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Password => "password",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Phone => "phone",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Percent => "percent",
            FieldType::Slider => "slider",
            FieldType::Rate => "rate",
            FieldType::Switch => "switch",
            FieldType::Checkbox => "checkbox",
            FieldType::CheckboxGroup => "checkbox_group",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multi_select",
            FieldType::Cascader => "cascader",
            FieldType::TreeSelect => "tree_select",
            FieldType::AutoComplete => "auto_complete",
            FieldType::Tags => "tags",
            FieldType::Date => "date",
            FieldType::DateRange => "date_range",
            FieldType::Time => "time",
            FieldType::DateTime => "date_time",
            FieldType::Color => "color",
            FieldType::Upload => "upload",
            FieldType::Image => "image",
            FieldType::RichText => "rich_text",
            FieldType::Json => "json",
            FieldType::Hidden => "hidden",
            FieldType::List => "list",
        }
    }

    /// Rendered by the engine itself.
    pub fn is_structural(&self) -> bool {
        matches!(self, FieldType::List)
    }

    /// Holds an array value.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            FieldType::CheckboxGroup
                | FieldType::MultiSelect
                | FieldType::Cascader
                | FieldType::Tags
                | FieldType::DateRange
                | FieldType::Upload
                | FieldType::Image
                | FieldType::List
        )
    }

    /// Value a field of this type starts with when no default is declared.
    pub fn empty_value(&self) -> Value {
        match self {
            FieldType::Switch | FieldType::Checkbox => Value::Bool(false),
            t if t.is_multi_valued() => Value::Array(Vec::new()),
            _ => Value::Null,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OptionItem {
    pub label: String,
    pub value: Value,
}

impl OptionItem {
    pub fn new(label: &str, value: Value) -> Self {
        Self { label: label.to_string(), value }
    }

    /// Read an option list from loose JSON: `[{label, value}]` objects or bare
    /// scalars, which use their text form as label.
    pub fn list_from_value(value: &Value) -> Option<Vec<OptionItem>> {
        let items = value.as_array()?;
        Some(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => {
                        let value = map.get("value").cloned().unwrap_or(Value::Null);
                        let label = map
                            .get("label")
                            .map(ox_type_converter::to_display_string)
                            .unwrap_or_else(|| ox_type_converter::to_display_string(&value));
                        OptionItem { label, value }
                    }
                    scalar => OptionItem {
                        label: ox_type_converter::to_display_string(scalar),
                        value: scalar.clone(),
                    },
                })
                .collect(),
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ValidationRule {
    pub rule_type: String, // "required", "min", "max", "min_length", "max_length", "pattern", "email", "url"
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(rule_type: &str, parameters: Value) -> Self {
        Self {
            rule_type: rule_type.to_string(),
            parameters,
            message: None,
        }
    }
}

/// What a dependency rule does when its conditions hold.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    #[serde(alias = "show_if")]
    Show,
    #[serde(alias = "hide_if")]
    Hide,
    #[serde(alias = "enable_if")]
    Enable,
    #[serde(alias = "disable_if")]
    Disable,
    #[serde(alias = "required_if", alias = "require_if")]
    Require,
    #[serde(alias = "optional_if")]
    Optional,
    SetValue,
    ClearValue,
    SetOptions,
    FilterOptions,
    Calculate,
    Custom,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    #[serde(alias = "and", alias = "AND", alias = "ALL")]
    All,
    #[serde(alias = "or", alias = "OR", alias = "ANY")]
    Any,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[serde(alias = "eq", alias = "==")]
    Equals,
    #[serde(alias = "ne", alias = "!=")]
    NotEquals,
    #[serde(alias = "gt", alias = ">")]
    GreaterThan,
    #[serde(alias = "gte", alias = ">=")]
    GreaterThanOrEqual,
    #[serde(alias = "lt", alias = "<")]
    LessThan,
    #[serde(alias = "lte", alias = "<=")]
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    #[serde(alias = "matches")]
    Regex,
    In,
    NotIn,
    IsEmpty,
    IsNotEmpty,
    Between,
    NotBetween,
    LengthEquals,
    LengthGreaterThan,
    LengthLessThan,
    HasKey,
    ArrayIncludes,
    DeepEquals,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

impl Condition {
    pub fn new(field: &str, operator: Operator, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: Some(value),
            values: None,
        }
    }

    pub fn with_values(field: &str, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: None,
            values: Some(values),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DependencyRule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: Logic,
    /// Id of a callback in the `CallbackRegistry` (calculate, custom, set_options).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

impl DependencyRule {
    pub fn new(rule_type: RuleType, conditions: Vec<Condition>) -> Self {
        Self {
            rule_type,
            conditions,
            logic: Logic::All,
            callback: None,
            target: None,
            is_async: false,
        }
    }

    pub fn any(mut self) -> Self {
        self.logic = Logic::Any;
        self
    }

    pub fn with_target(mut self, target: Value) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_callback(mut self, id: &str) -> Self {
        self.callback = Some(id.to_string());
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }
}

/// Repeating sub-form settings for `list` fields. Template field names are
/// relative to one item.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ListConfig {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct FieldDescriptor {
    /// Unique within the form; dots address nested objects.
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Concrete component override (e.g., "my-custom-email-input")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
    #[serde(default)]
    pub options: Vec<OptionItem>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListConfig>,
    #[serde(default)]
    pub props: Value,
}

impl FieldDescriptor {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            label: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_dependency(mut self, rule: DependencyRule) -> Self {
        self.dependencies.push(rule);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn initial_value(&self) -> Value {
        self.default_value.clone().unwrap_or_else(|| self.field_type.empty_value())
    }

    pub fn is_required(&self) -> bool {
        self.required || self.rules.iter().any(|r| r.rule_type == "required")
    }

    /// Template fields of a list, empty for every other type.
    pub fn template(&self) -> &[FieldDescriptor] {
        self.list.as_ref().map(|l| l.fields.as_slice()).unwrap_or(&[])
    }
}

/// A titled group of fields: a section panel, a wizard step or a tab.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct FieldGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub collapsible: bool,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// The grouping mode of a schema. A schema uses exactly one.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FormLayout {
    Fields(Vec<FieldDescriptor>),
    Sections(Vec<FieldGroup>),
    Steps(Vec<FieldGroup>),
    Tabs(Vec<FieldGroup>),
}

impl Default for FormLayout {
    fn default() -> Self {
        FormLayout::Fields(Vec::new())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActionDefinition {
    pub name: String,
    pub label: String,
    #[serde(default = "default_action_type")]
    pub action_type: String, // "submit", "reset", "button"
    #[serde(default)]
    pub props: Value,
}

fn default_action_type() -> String {
    "button".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FormConfig {
    /// Debounce delay for auto-save; `None` disables it.
    #[serde(default)]
    pub auto_save_delay_ms: Option<u64>,
    /// Evaluator passes per change before writes stop propagating.
    #[serde(default = "default_max_settle_passes")]
    pub max_settle_passes: usize,
}

fn default_max_settle_passes() -> usize {
    8
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            auto_save_delay_ms: None,
            max_settle_passes: default_max_settle_passes(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct FormSchema {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub layout: FormLayout,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub config: FormConfig,
}

impl FormSchema {
    pub fn new(id: &str, layout: FormLayout) -> Self {
        Self {
            id: id.to_string(),
            title: id.to_string(),
            layout,
            ..Default::default()
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, FormError> {
        let schema: FormSchema = serde_json::from_str(s).map_err(|e| FormError::ParseError(e.to_string()))?;
        schema.check()?;
        Ok(schema)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, FormError> {
        let schema: FormSchema = serde_yaml::from_str(s).map_err(|e| FormError::ParseError(e.to_string()))?;
        schema.check()?;
        Ok(schema)
    }

    /// Groups in declaration order; a flat schema yields none.
    pub fn groups(&self) -> &[FieldGroup] {
        match &self.layout {
            FormLayout::Fields(_) => &[],
            FormLayout::Sections(groups) | FormLayout::Steps(groups) | FormLayout::Tabs(groups) => groups,
        }
    }

    /// Every top-level leaf, whichever container holds it.
    pub fn fields(&self) -> Vec<&FieldDescriptor> {
        match &self.layout {
            FormLayout::Fields(fields) => fields.iter().collect(),
            _ => self.groups().iter().flat_map(|g| g.fields.iter()).collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().into_iter().find(|f| f.name == name)
    }

    /// Resolve a value key to its descriptor, including list item keys such
    /// as `lines.2.qty`.
    pub fn resolve_field(&self, key: &str) -> Option<&FieldDescriptor> {
        if let Some(field) = self.field(key) {
            return Some(field);
        }
        self.fields()
            .into_iter()
            .filter(|f| f.field_type == FieldType::List)
            .find_map(|list| {
                let rest = key.strip_prefix(list.name.as_str())?.strip_prefix('.')?;
                let (index, name) = rest.split_once('.')?;
                index.parse::<usize>().ok()?;
                list.template().iter().find(|t| t.name == name)
            })
    }

    pub fn step_count(&self) -> usize {
        match &self.layout {
            FormLayout::Steps(steps) => steps.len(),
            _ => 0,
        }
    }

    /// Enforce the structural invariants: non-empty names, names unique across
    /// the whole form (and within each list template), non-empty wizard.
    pub fn check(&self) -> Result<(), FormError> {
        let mut seen = HashSet::new();
        for field in self.fields() {
            if field.name.trim().is_empty() {
                return Err(FormError::EmptyFieldName(self.id.clone()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(FormError::DuplicateFieldName(field.name.clone()));
            }
            let mut template_names = HashSet::new();
            for template in field.template() {
                if template.name.trim().is_empty() {
                    return Err(FormError::EmptyFieldName(field.name.clone()));
                }
                if !template_names.insert(template.name.as_str()) {
                    return Err(FormError::DuplicateFieldName(format!("{}.{}", field.name, template.name)));
                }
            }
        }
        if matches!(&self.layout, FormLayout::Steps(steps) if steps.is_empty()) {
            return Err(FormError::StepOutOfRange(0));
        }
        Ok(())
    }
}
