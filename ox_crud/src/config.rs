use std::path::Path;

use serde::{Deserialize, Serialize};

use ox_forms::{load_from_path, FormError};

/// How create/edit/view are presented: an in-place editor or separate routes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrudMode {
    #[default]
    Modal,
    Route { base_path: String },
}

/// Toast texts. Keys mirror the message catalogue hosts usually provide.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CrudMessages {
    pub load_failed: String,
    pub create_success: String,
    pub update_success: String,
    pub save_failed: String,
    pub delete_success: String,
    pub delete_failed: String,
    pub permission_denied: String,
}

impl Default for CrudMessages {
    fn default() -> Self {
        Self {
            load_failed: "Failed to load data".to_string(),
            create_success: "Created successfully".to_string(),
            update_success: "Updated successfully".to_string(),
            save_failed: "Failed to save".to_string(),
            delete_success: "Deleted successfully".to_string(),
            delete_failed: "Failed to delete".to_string(),
            permission_denied: "You do not have permission to perform this action".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CrudConfig {
    pub default_page: u64,
    pub default_page_size: u64,
    pub page_param: String,
    pub page_size_param: String,
    /// Accepted as an alias of `page_size_param` when reading the URL.
    pub limit_param: String,
    /// Record key identifying a row.
    pub row_key: String,
    pub messages: CrudMessages,
    pub mode: CrudMode,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 5,
            page_param: "page".to_string(),
            page_size_param: "pageSize".to_string(),
            limit_param: "limit".to_string(),
            row_key: "id".to_string(),
            messages: CrudMessages::default(),
            mode: CrudMode::Modal,
        }
    }
}

impl CrudConfig {
    pub fn from_path(path: &Path) -> Result<Self, FormError> {
        load_from_path(path)
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        key == self.page_param || key == self.page_size_param || key == self.limit_param
    }
}
