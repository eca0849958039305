use serde::Serialize;

use ox_forms::{FieldType, FormSchema};

use crate::permissions::CrudAction;

pub const ACTIONS_COLUMN: &str = "actions";

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TableColumn {
    pub key: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RowAction {
    pub action: CrudAction,
    pub label: String,
}

impl RowAction {
    pub fn new(action: CrudAction) -> Self {
        let label = match action {
            CrudAction::View => "View",
            CrudAction::Create => "Create",
            CrudAction::Edit => "Edit",
            CrudAction::Delete => "Delete",
        };
        Self {
            action,
            label: label.to_string(),
        }
    }
}

fn shown_in_table(field_type: FieldType) -> bool {
    !matches!(
        field_type,
        FieldType::List | FieldType::Password | FieldType::RichText | FieldType::Hidden
    )
}

/// Columns for every table-friendly leaf, followed by the actions column.
pub fn columns_from_schema(schema: &FormSchema) -> Vec<TableColumn> {
    let mut columns: Vec<TableColumn> = schema
        .fields()
        .into_iter()
        .filter(|f| !f.hidden && shown_in_table(f.field_type))
        .map(|f| TableColumn {
            key: f.name.clone(),
            title: f.label.clone(),
            field_type: Some(f.field_type),
        })
        .collect();
    columns.push(TableColumn {
        key: ACTIONS_COLUMN.to_string(),
        title: "Actions".to_string(),
        field_type: None,
    });
    columns
}
