//! URL query codec for table filters and pagination.

use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded;

use ox_type_converter::{parse_lenient, to_i64};

use crate::config::CrudConfig;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    pub fn defaults(config: &CrudConfig) -> Self {
        Self {
            page: config.default_page.max(1),
            page_size: config.default_page_size.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationParse {
    Valid(Pagination),
    /// `page` or the page size is absent.
    Missing,
    /// Present but not a positive integer.
    Malformed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub filters: Map<String, Value>,
    pub pagination: PaginationParse,
}

/// Text form of a filter value. Strings stay raw unless they would read back
/// as something else, in which case they are JSON-quoted.
pub fn encode_filter_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed) if parsed != *value => Some(Value::String(s.clone()).to_string()),
            _ => Some(s.clone()),
        },
        other => Some(other.to_string()),
    }
}

pub fn decode_filter_value(raw: &str) -> Value {
    parse_lenient(raw)
}

/// Build a query string (without `?`): pagination first, then filters.
/// Filter keys are written sorted; reserved keys inside `filters` are ignored.
pub fn build_query(filters: &Map<String, Value>, pagination: Option<Pagination>, config: &CrudConfig) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(p) = pagination {
        serializer.append_pair(&config.page_param, &p.page.to_string());
        serializer.append_pair(&config.page_size_param, &p.page_size.to_string());
    }
    let mut keys: Vec<&String> = filters.keys().collect();
    keys.sort();
    for key in keys {
        let value = &filters[key];
        if config.is_reserved(key) {
            continue;
        }
        if let Some(encoded) = encode_filter_value(value) {
            serializer.append_pair(key, &encoded);
        }
    }
    serializer.finish()
}

pub fn parse_query(query: &str, config: &CrudConfig) -> ParsedQuery {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut filters = Map::new();
    let mut page = None;
    let mut page_size = None;
    let mut limit = None;

    for (key, raw) in form_urlencoded::parse(query.as_bytes()).into_owned() {
        if key == config.page_param {
            page = Some(raw);
        } else if key == config.page_size_param {
            page_size = Some(raw);
        } else if key == config.limit_param {
            limit = Some(raw);
        } else {
            filters.insert(key, decode_filter_value(&raw));
        }
    }

    let pagination = match (page, page_size.or(limit)) {
        (Some(page), Some(size)) => match (positive(&page), positive(&size)) {
            (Some(page), Some(page_size)) => PaginationParse::Valid(Pagination { page, page_size }),
            _ => PaginationParse::Malformed,
        },
        _ => PaginationParse::Missing,
    };
    ParsedQuery { filters, pagination }
}

fn positive(raw: &str) -> Option<u64> {
    to_i64(&Value::String(raw.to_string()))
        .filter(|n| *n >= 1)
        .map(|n| n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_round_trip_preserves_filter_values() {
        let config = CrudConfig::default();
        let original = filters(json!({
            "status": "active",
            "code": "123",
            "flag": "true",
            "quoted": "\"x\"",
            "count": 3,
            "enabled": false,
            "tags": ["a", "b"],
            "range": {"from": 1, "to": 9},
            "spaced": "a b&c=d"
        }));
        let query = build_query(&original, Some(Pagination { page: 2, page_size: 10 }), &config);
        let parsed = parse_query(&query, &config);
        assert_eq!(parsed.filters, original);
        assert_eq!(
            parsed.pagination,
            PaginationParse::Valid(Pagination { page: 2, page_size: 10 })
        );
    }

    #[test]
    fn test_plain_strings_stay_readable() {
        let config = CrudConfig::default();
        let query = build_query(&filters(json!({"status": "active", "n": "7"})), None, &config);
        assert_eq!(query, "n=%227%22&status=active");
    }

    #[test]
    fn test_pagination_parsing() {
        let config = CrudConfig::default();
        assert_eq!(parse_query("status=x", &config).pagination, PaginationParse::Missing);
        assert_eq!(parse_query("page=1", &config).pagination, PaginationParse::Missing);
        assert_eq!(parse_query("page=abc&pageSize=5", &config).pagination, PaginationParse::Malformed);
        assert_eq!(parse_query("page=0&pageSize=5", &config).pagination, PaginationParse::Malformed);
        assert_eq!(
            parse_query("?page=3&limit=20", &config).pagination,
            PaginationParse::Valid(Pagination { page: 3, page_size: 20 })
        );
    }

    #[test]
    fn test_reserved_keys_never_become_filters() {
        let config = CrudConfig::default();
        let query = build_query(&filters(json!({"page": 9, "q": "x"})), None, &config);
        assert_eq!(query, "q=x");
        assert!(!parse_query("page=1&pageSize=5&limit=5", &config).filters.contains_key("limit"));
    }
}
