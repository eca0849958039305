use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::query::Pagination;

/// One list request: the filters from the URL plus the page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub filters: Map<String, Value>,
    pub pagination: Pagination,
    /// Rows currently on display.
    pub current_list: Vec<Value>,
}

impl FetchRequest {
    /// Filters with the page embedded as `_pagination: {page, pageSize}`.
    pub fn to_filter_object(&self) -> Map<String, Value> {
        let mut object = self.filters.clone();
        object.insert(
            "_pagination".to_string(),
            serde_json::json!({ "page": self.pagination.page, "pageSize": self.pagination.page_size }),
        );
        object
    }
}

/// Data callbacks of a CRUD table.
#[async_trait]
pub trait CrudProvider: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<Value>;

    async fn create(&self, _record: Map<String, Value>) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("create is not supported"))
    }

    async fn update(&self, _record: Map<String, Value>) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("update is not supported"))
    }

    async fn delete(&self, _record: &Value) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("delete is not supported"))
    }

    fn view(&self, _record: &Value) {}
}

/// Route changes for `CrudMode::Route`.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str, params: &Map<String, Value>);
}
