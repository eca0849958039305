//! Bounded operations on list field values.

use serde_json::Value;

use crate::error::FormError;
use crate::schema::FieldDescriptor;

fn bounds(list: &FieldDescriptor) -> (usize, Option<usize>) {
    list.list.as_ref().map(|c| (c.min.unwrap_or(0), c.max)).unwrap_or((0, None))
}

fn check_index(list: &FieldDescriptor, items: &[Value], index: usize) -> Result<(), FormError> {
    if index >= items.len() {
        return Err(FormError::ListIndex {
            name: list.name.clone(),
            index,
        });
    }
    Ok(())
}

fn check_can_grow(list: &FieldDescriptor, items: &[Value]) -> Result<(), FormError> {
    match bounds(list).1 {
        Some(max) if items.len() >= max => Err(FormError::ListBounds {
            name: list.name.clone(),
            message: format!("at most {} item(s) allowed", max),
        }),
        _ => Ok(()),
    }
}

pub fn can_add(list: &FieldDescriptor, len: usize) -> bool {
    bounds(list).1.map_or(true, |max| len < max)
}

pub fn can_remove(list: &FieldDescriptor, len: usize) -> bool {
    len > bounds(list).0
}

pub fn add_item(list: &FieldDescriptor, items: &mut Vec<Value>, item: Value) -> Result<usize, FormError> {
    check_can_grow(list, items)?;
    items.push(item);
    Ok(items.len() - 1)
}

pub fn remove_item(list: &FieldDescriptor, items: &mut Vec<Value>, index: usize) -> Result<Value, FormError> {
    check_index(list, items, index)?;
    if !can_remove(list, items.len()) {
        return Err(FormError::ListBounds {
            name: list.name.clone(),
            message: format!("at least {} item(s) required", bounds(list).0),
        });
    }
    Ok(items.remove(index))
}

pub fn move_item(list: &FieldDescriptor, items: &mut Vec<Value>, from: usize, to: usize) -> Result<(), FormError> {
    check_index(list, items, from)?;
    check_index(list, items, to)?;
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Copies the item at `index` directly after it.
pub fn duplicate_item(list: &FieldDescriptor, items: &mut Vec<Value>, index: usize) -> Result<usize, FormError> {
    check_index(list, items, index)?;
    check_can_grow(list, items)?;
    let copy = items[index].clone();
    items.insert(index + 1, copy);
    Ok(index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, ListConfig};
    use serde_json::json;

    fn list(min: Option<usize>, max: Option<usize>) -> FieldDescriptor {
        let mut field = FieldDescriptor::new("lines", FieldType::List);
        field.list = Some(ListConfig {
            fields: vec![],
            min,
            max,
        });
        field
    }

    #[test]
    fn test_add_respects_max() {
        let field = list(None, Some(2));
        let mut items = vec![json!(1)];
        assert_eq!(add_item(&field, &mut items, json!(2)).unwrap(), 1);
        assert!(matches!(add_item(&field, &mut items, json!(3)), Err(FormError::ListBounds { .. })));
        assert!(!can_add(&field, items.len()));
    }

    #[test]
    fn test_remove_respects_min() {
        let field = list(Some(1), None);
        let mut items = vec![json!("a"), json!("b")];
        assert_eq!(remove_item(&field, &mut items, 0).unwrap(), json!("a"));
        assert!(matches!(remove_item(&field, &mut items, 0), Err(FormError::ListBounds { .. })));
        assert!(matches!(remove_item(&field, &mut items, 5), Err(FormError::ListIndex { index: 5, .. })));
    }

    #[test]
    fn test_move_and_duplicate() {
        let field = list(None, None);
        let mut items = vec![json!("a"), json!("b"), json!("c")];
        move_item(&field, &mut items, 0, 2).unwrap();
        assert_eq!(items, vec![json!("b"), json!("c"), json!("a")]);
        assert_eq!(duplicate_item(&field, &mut items, 1).unwrap(), 2);
        assert_eq!(items, vec![json!("b"), json!("c"), json!("c"), json!("a")]);
        assert!(move_item(&field, &mut items, 0, 9).is_err());
    }
}
