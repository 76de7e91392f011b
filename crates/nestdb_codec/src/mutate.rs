//! Nested value mutator.
//!
//! Pure functions that read, write and delete inside one in-memory value
//! tree. A segment addresses a sequence element only when the value at
//! that position is an `Array` and the segment parses as an index;
//! otherwise it is a mapping key.
//!
//! Writes create missing intermediate containers as `Map`s. Sequences are
//! never created here; they come from the push family of operations.

use crate::value::Value;

/// Reads the value at `path` inside `root`.
///
/// Returns `None` as soon as an intermediate container is missing or a
/// scalar sits where a container was expected. An empty path returns
/// `root` itself.
pub fn read_at<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = match current {
            Value::Map(entries) => entries.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable counterpart of [`read_at`].
pub fn read_at_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path {
        current = match current {
            Value::Map(entries) => entries.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at `path` inside `root`, creating intermediate mappings.
///
/// An empty path replaces `root` entirely. A scalar found where a
/// container is needed is replaced by a fresh `Map`, as is an `Array`
/// addressed with a non-index segment. An index equal to a sequence's
/// length appends; a larger index leaves the sequence untouched and
/// returns `false`.
pub fn write_at(root: &mut Value, path: &[String], value: Value) -> bool {
    let Some((head, rest)) = path.split_first() else {
        *root = value;
        return true;
    };

    if let Value::Array(items) = root {
        if let Ok(index) = head.parse::<usize>() {
            if index > items.len() {
                return false;
            }
            if index == items.len() {
                items.push(if rest.is_empty() {
                    Value::Null
                } else {
                    Value::empty_map()
                });
            }
            return write_at(&mut items[index], rest, value);
        }
    }

    if !matches!(root, Value::Map(_)) {
        *root = Value::empty_map();
    }
    let Value::Map(entries) = root else {
        return false;
    };

    if rest.is_empty() {
        entries.insert(head.clone(), value);
        true
    } else {
        let child = entries
            .entry(head.clone())
            .or_insert_with(Value::empty_map);
        write_at(child, rest, value)
    }
}

/// Removes the leaf named by the last segment of `path` from its parent.
///
/// Returns the removed value, or `None` when the path does not resolve.
/// Sibling entries are left as they were; removing a sequence element
/// shifts the elements after it. An empty path is a whole-record delete
/// and is not handled here.
pub fn delete_at(root: &mut Value, path: &[String]) -> Option<Value> {
    let (leaf, parent_path) = path.split_last()?;
    match read_at_mut(root, parent_path)? {
        Value::Map(entries) => entries.remove(leaf),
        Value::Array(items) => {
            let index = leaf.parse::<usize>().ok()?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn read_nested_mapping() {
        let value = Value::from(json!({"b": {"c": 5}}));
        assert_eq!(read_at(&value, &path("b.c")), Some(&Value::from(5)));
        assert_eq!(
            read_at(&value, &path("b")),
            Some(&Value::from(json!({"c": 5})))
        );
        assert_eq!(read_at(&value, &[]), Some(&value));
    }

    #[test]
    fn read_absent_when_intermediate_missing_or_scalar() {
        let value = Value::from(json!({"b": {"c": 5}}));
        assert_eq!(read_at(&value, &path("x.c")), None);
        assert_eq!(read_at(&value, &path("b.c.d")), None);
    }

    #[test]
    fn read_sequence_by_index() {
        let value = Value::from(json!({"list": [{"name": "a"}, {"name": "b"}]}));
        assert_eq!(
            read_at(&value, &path("list.1.name")),
            Some(&Value::from("b"))
        );
        assert_eq!(read_at(&value, &path("list.2")), None);
        assert_eq!(read_at(&value, &path("list.name")), None);
    }

    #[test]
    fn write_creates_intermediate_mappings() {
        let mut value = Value::empty_map();
        assert!(write_at(&mut value, &path("y.z"), Value::from(1)));
        assert_eq!(value, Value::from(json!({"y": {"z": 1}})));
    }

    #[test]
    fn write_preserves_siblings() {
        let mut value = Value::from(json!({"a": {"keep": true}}));
        write_at(&mut value, &path("a.new"), Value::from("x"));
        assert_eq!(value, Value::from(json!({"a": {"keep": true, "new": "x"}})));
    }

    #[test]
    fn write_replaces_scalar_with_mapping() {
        let mut value = Value::from(json!({"a": 5}));
        write_at(&mut value, &path("a.b"), Value::from(1));
        assert_eq!(value, Value::from(json!({"a": {"b": 1}})));

        let mut scalar_root = Value::from(7);
        write_at(&mut scalar_root, &path("k"), Value::from(1));
        assert_eq!(scalar_root, Value::from(json!({"k": 1})));
    }

    #[test]
    fn write_empty_path_replaces_root() {
        let mut value = Value::from(json!({"a": 1}));
        write_at(&mut value, &[], Value::from("whole"));
        assert_eq!(value, Value::from("whole"));
    }

    #[test]
    fn write_into_sequence_by_index() {
        let mut value = Value::from(json!({"list": [1, 2]}));
        assert!(write_at(&mut value, &path("list.0"), Value::from(9)));
        assert!(write_at(&mut value, &path("list.2"), Value::from(3)));
        assert!(!write_at(&mut value, &path("list.7"), Value::from(0)));
        assert_eq!(value, Value::from(json!({"list": [9, 2, 3]})));
    }

    #[test]
    fn write_never_creates_sequences() {
        let mut value = Value::empty_map();
        write_at(&mut value, &path("list.0"), Value::from("x"));
        assert_eq!(value, Value::from(json!({"list": {"0": "x"}})));
    }

    #[test]
    fn delete_removes_only_the_leaf() {
        let mut value = Value::from(json!({"b": {"c": 1, "d": 2}}));
        assert_eq!(delete_at(&mut value, &path("b.c")), Some(Value::from(1)));
        assert_eq!(value, Value::from(json!({"b": {"d": 2}})));
    }

    #[test]
    fn delete_leaves_empty_parent_in_place() {
        let mut value = Value::from(json!({"b": {"c": 1}}));
        delete_at(&mut value, &path("b.c"));
        assert_eq!(value, Value::from(json!({"b": {}})));
    }

    #[test]
    fn delete_missing_path_is_noop() {
        let mut value = Value::from(json!({"b": {"c": 1}}));
        assert_eq!(delete_at(&mut value, &path("x.y")), None);
        assert_eq!(delete_at(&mut value, &path("b.c.d")), None);
        assert_eq!(delete_at(&mut value, &[]), None);
        assert_eq!(value, Value::from(json!({"b": {"c": 1}})));
    }

    #[test]
    fn delete_sequence_element() {
        let mut value = Value::from(json!({"list": ["a", "b", "c"]}));
        assert_eq!(delete_at(&mut value, &path("list.1")), Some(Value::from("b")));
        assert_eq!(delete_at(&mut value, &path("list.5")), None);
        assert_eq!(value, Value::from(json!({"list": ["a", "c"]})));
    }
}
