//! Normalization of the list shapes a fetch may return.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CrudError;
use crate::query::Pagination;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: u64,
    pub items_per_page: u64,
    pub current_page: u64,
}

impl PageMeta {
    pub fn total_pages(&self) -> u64 {
        if self.items_per_page == 0 {
            return 0;
        }
        self.total_items.div_ceil(self.items_per_page)
    }
}

/// Meta as servers send it; every key optional, camelCase or snake_case.
#[derive(Deserialize, Default)]
struct RawMeta {
    #[serde(alias = "totalItems", alias = "total", alias = "totalCount")]
    total_items: Option<u64>,
    #[serde(alias = "itemsPerPage", alias = "pageSize", alias = "page_size", alias = "perPage")]
    items_per_page: Option<u64>,
    #[serde(alias = "currentPage", alias = "page")]
    current_page: Option<u64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NormalizedResponse {
    pub list: Vec<Value>,
    pub meta: PageMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

/// Accepts `{data: {list, meta, links}}`, `{list, meta, links}` or a bare
/// array. Missing meta keys are filled from the request.
pub fn normalize_response(raw: Value, request: &Pagination) -> Result<NormalizedResponse, CrudError> {
    match raw {
        Value::Array(list) => Ok(NormalizedResponse {
            meta: synthesize(&RawMeta::default(), list.len(), request),
            list,
            links: None,
        }),
        Value::Object(mut body) => {
            if let Some(data) = body.remove("data") {
                return match data {
                    Value::Object(_) => normalize_response(data, request),
                    Value::Array(list) => Ok(NormalizedResponse {
                        meta: read_meta(body.get("meta"), list.len(), request),
                        list,
                        links: body.remove("links"),
                    }),
                    other => Err(CrudError::UnexpectedResponse(format!("'data' is {}", kind(&other)))),
                };
            }
            match body.remove("list") {
                Some(Value::Array(list)) => Ok(NormalizedResponse {
                    meta: read_meta(body.get("meta"), list.len(), request),
                    list,
                    links: body.remove("links"),
                }),
                Some(other) => Err(CrudError::UnexpectedResponse(format!("'list' is {}", kind(&other)))),
                None => Err(CrudError::UnexpectedResponse("object without 'list' or 'data'".to_string())),
            }
        }
        other => Err(CrudError::UnexpectedResponse(kind(&other).to_string())),
    }
}

fn read_meta(meta: Option<&Value>, len: usize, request: &Pagination) -> PageMeta {
    let raw = match meta {
        Some(value) => RawMeta::deserialize(value).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed pagination meta: {}", e);
            RawMeta::default()
        }),
        None => RawMeta::default(),
    };
    synthesize(&raw, len, request)
}

fn synthesize(raw: &RawMeta, len: usize, request: &Pagination) -> PageMeta {
    let items_per_page = raw.items_per_page.unwrap_or(request.page_size);
    let current_page = raw.current_page.unwrap_or(request.page).max(1);
    let total_items = raw.total_items.unwrap_or_else(|| {
        (current_page - 1)
            .saturating_mul(items_per_page)
            .saturating_add(len as u64)
    });
    PageMeta {
        total_items,
        items_per_page,
        current_page,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const REQUEST: Pagination = Pagination { page: 2, page_size: 10 };

    #[test]
    fn test_nested_data_shape() {
        let raw = json!({
            "data": {
                "list": [{"id": 11}],
                "meta": {"totalItems": 45, "itemsPerPage": 10, "currentPage": 2},
                "links": {"next": "/items?page=3"}
            }
        });
        let normalized = normalize_response(raw, &REQUEST).unwrap();
        assert_eq!(normalized.list.len(), 1);
        assert_eq!(normalized.meta.total_pages(), 5);
        assert_eq!(normalized.links, Some(json!({"next": "/items?page=3"})));
    }

    #[test]
    fn test_flat_shape_with_aliases() {
        let raw = json!({"list": [1, 2], "meta": {"total": 12, "page_size": 5, "page": 3}});
        let meta = normalize_response(raw, &REQUEST).unwrap().meta;
        assert_eq!(
            meta,
            PageMeta {
                total_items: 12,
                items_per_page: 5,
                current_page: 3
            }
        );
    }

    #[test]
    fn test_bare_array_synthesizes_meta() {
        let normalized = normalize_response(json!([{"id": 1}, {"id": 2}]), &REQUEST).unwrap();
        assert_eq!(
            normalized.meta,
            PageMeta {
                total_items: 12,
                items_per_page: 10,
                current_page: 2
            }
        );
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(normalize_response(json!("nope"), &REQUEST).is_err());
        assert!(normalize_response(json!({"items": []}), &REQUEST).is_err());
        assert!(normalize_response(json!({"list": {}}), &REQUEST).is_err());
    }

    #[test]
    fn test_huge_page_without_meta_saturates() {
        let query = crate::query::parse_query(
            "page=9223372036854775807&pageSize=5",
            &crate::config::CrudConfig::default(),
        );
        let request = match query.pagination {
            crate::query::PaginationParse::Valid(p) => p,
            other => panic!("expected valid pagination, got {:?}", other),
        };
        let meta = normalize_response(json!([{"id": 1}]), &request).unwrap().meta;
        assert_eq!(meta.current_page, 9223372036854775807);
        assert_eq!(meta.total_items, u64::MAX);
        assert!(meta.total_pages() > 0);

        let huge_size = Pagination { page: u64::MAX, page_size: u64::MAX };
        let meta = normalize_response(json!({"list": [], "meta": {}}), &huge_size).unwrap().meta;
        assert_eq!(meta.total_items, u64::MAX);
    }
}
