use crate::error::FormError;
use crate::list;
use crate::path::get_path;
use crate::registry::TypeRegistry;
use crate::schema::{FieldDescriptor, FieldGroup, FieldType, FormLayout, FormSchema};
use crate::state::FieldState;
use crate::traits::{FieldView, RenderContext, Widget};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StepHeader {
    pub index: usize,
    pub title: String,
    pub active: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TabNode {
    pub title: String,
    pub children: Vec<RenderNode>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ListItemNode {
    pub index: usize,
    pub children: Vec<RenderNode>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ActionButton {
    pub name: String,
    pub label: String,
    pub action_type: String,
    pub props: Value,
}

/// Headless output of one render pass.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
    Form {
        id: String,
        title: String,
        children: Vec<RenderNode>,
    },
    Section {
        title: String,
        description: Option<String>,
        collapsible: bool,
        collapsed: bool,
        children: Vec<RenderNode>,
    },
    Stepper {
        steps: Vec<StepHeader>,
        active: usize,
        can_go_back: bool,
        can_go_forward: bool,
        is_last: bool,
        children: Vec<RenderNode>,
    },
    Tabs {
        tabs: Vec<TabNode>,
    },
    Field {
        widget: Widget,
    },
    List {
        name: String,
        label: String,
        items: Vec<ListItemNode>,
        can_add: bool,
        can_remove: bool,
        disabled: bool,
    },
    Actions {
        buttons: Vec<ActionButton>,
    },
}

impl RenderNode {
    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::Form { children, .. }
            | RenderNode::Section { children, .. }
            | RenderNode::Stepper { children, .. } => children,
            _ => &[],
        }
    }

    /// Every widget in the subtree, depth first.
    pub fn widgets(&self) -> Vec<&Widget> {
        let mut out = Vec::new();
        self.collect_widgets(&mut out);
        out
    }

    fn collect_widgets<'a>(&'a self, out: &mut Vec<&'a Widget>) {
        match self {
            RenderNode::Field { widget } => out.push(widget),
            RenderNode::Tabs { tabs } => tabs.iter().flat_map(|t| &t.children).for_each(|c| c.collect_widgets(out)),
            RenderNode::List { items, .. } => items.iter().flat_map(|i| &i.children).for_each(|c| c.collect_widgets(out)),
            other => other.children().iter().for_each(|c| c.collect_widgets(out)),
        }
    }

    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets().into_iter().find(|w| w.name == name)
    }
}

pub struct FormEngine<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> FormEngine<'a> {
    /// Fails unless every non-structural field type has a renderer.
    pub fn new(registry: &'a TypeRegistry) -> Result<Self, FormError> {
        registry.verify()?;
        Ok(Self { registry })
    }

    pub fn render(&self, schema: &FormSchema, ctx: &RenderContext) -> Result<RenderNode> {
        self.registry.verify_overrides(schema.fields())?;

        let mut children = match &schema.layout {
            FormLayout::Fields(fields) => self.render_fields(fields, None, ctx)?,
            FormLayout::Sections(sections) => sections
                .iter()
                .map(|s| self.render_section(s, ctx))
                .collect::<Result<Vec<_>>>()?,
            FormLayout::Steps(steps) => vec![self.render_stepper(steps, ctx)?],
            FormLayout::Tabs(tabs) => vec![RenderNode::Tabs {
                tabs: tabs
                    .iter()
                    .map(|t| {
                        Ok(TabNode {
                            title: t.title.clone(),
                            children: self.render_fields(&t.fields, None, ctx)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            }],
        };

        if !schema.actions.is_empty() {
            children.push(RenderNode::Actions {
                buttons: schema
                    .actions
                    .iter()
                    .map(|a| ActionButton {
                        name: a.name.clone(),
                        label: a.label.clone(),
                        action_type: a.action_type.clone(),
                        props: a.props.clone(),
                    })
                    .collect(),
            });
        }

        Ok(RenderNode::Form {
            id: schema.id.clone(),
            title: schema.title.clone(),
            children,
        })
    }

    fn render_section(&self, section: &FieldGroup, ctx: &RenderContext) -> Result<RenderNode> {
        Ok(RenderNode::Section {
            title: section.title.clone(),
            description: section.description.clone(),
            collapsible: section.collapsible,
            collapsed: section.collapsible && section.collapsed,
            children: self.render_fields(&section.fields, None, ctx)?,
        })
    }

    fn render_stepper(&self, steps: &[FieldGroup], ctx: &RenderContext) -> Result<RenderNode> {
        let last = steps.len().saturating_sub(1);
        let active = ctx.active_step.unwrap_or(0).min(last);
        let children = match steps.get(active) {
            Some(step) => self.render_fields(&step.fields, None, ctx)?,
            None => Vec::new(),
        };
        Ok(RenderNode::Stepper {
            steps: steps
                .iter()
                .enumerate()
                .map(|(index, s)| StepHeader {
                    index,
                    title: s.title.clone(),
                    active: index == active,
                })
                .collect(),
            active,
            can_go_back: active > 0,
            can_go_forward: active < last,
            is_last: active == last,
            children,
        })
    }

    /// Render a field list. `prefix` is the value path of the enclosing list
    /// item, if any.
    pub fn render_fields(
        &self,
        fields: &[FieldDescriptor],
        prefix: Option<&str>,
        ctx: &RenderContext,
    ) -> Result<Vec<RenderNode>> {
        let mut nodes = Vec::new();
        for field in fields {
            let key = match prefix {
                Some(prefix) => format!("{}.{}", prefix, field.name),
                None => field.name.clone(),
            };
            let state = ctx
                .states
                .get(&key)
                .cloned()
                .unwrap_or_else(|| FieldState::from_descriptor(field));
            if state.hidden {
                continue;
            }
            let node = if field.field_type == FieldType::List {
                self.render_list(field, &key, &state, ctx)?
            } else {
                self.render_field(field, key, state, ctx)?
            };
            nodes.push(node);
        }
        Ok(nodes)
    }

    pub fn render_field(
        &self,
        field: &FieldDescriptor,
        key: String,
        state: FieldState,
        ctx: &RenderContext,
    ) -> Result<RenderNode> {
        let (component, default_props, renderer) = self.registry.resolve_renderer(field)?;
        let view = FieldView {
            value: get_path(ctx.values, &key).cloned().unwrap_or(Value::Null),
            errors: ctx.errors_for(&key),
            key,
            field,
            component,
            default_props,
            state,
        };
        let widget = renderer
            .render(&view, ctx)
            .with_context(|| format!("Renderer '{}' failed for field '{}'", view.component, view.key))?;
        Ok(RenderNode::Field { widget })
    }

    fn render_list(&self, field: &FieldDescriptor, key: &str, state: &FieldState, ctx: &RenderContext) -> Result<RenderNode> {
        let len = get_path(ctx.values, key).and_then(Value::as_array).map_or(0, Vec::len);
        let items = (0..len)
            .map(|index| {
                let item_key = format!("{}.{}", key, index);
                Ok(ListItemNode {
                    index,
                    children: self.render_fields(field.template(), Some(&item_key), ctx)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RenderNode::List {
            name: key.to_string(),
            label: field.label.clone(),
            items,
            can_add: !state.disabled && list::can_add(field, len),
            can_remove: !state.disabled && list::can_remove(field, len),
            disabled: state.disabled,
        })
    }
}
