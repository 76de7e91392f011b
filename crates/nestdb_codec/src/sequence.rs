//! Sequence helpers behind the push family of operations.
//!
//! Priorities are one-based: priority `1` is the first element.

use crate::value::Value;

/// Converts a one-based priority to a zero-based index.
///
/// Returns `None` for priority `0`.
pub fn priority_index(priority: usize) -> Option<usize> {
    priority.checked_sub(1)
}

/// Appends `item` to the current value.
///
/// An absent or non-sequence current value starts a fresh sequence.
pub fn appended(current: Option<Value>, item: Value) -> Vec<Value> {
    let mut items = match current {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    items.push(item);
    items
}

/// Removes the first element deep-equal to `item`.
///
/// Returns true if an element was removed.
pub fn remove_first(items: &mut Vec<Value>, item: &Value) -> bool {
    match items.iter().position(|existing| existing == item) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

/// Replaces the element at a one-based priority.
///
/// Out-of-range priorities leave the sequence unchanged and return false.
pub fn replace_at(items: &mut [Value], priority: usize, item: Value) -> bool {
    match priority_index(priority).and_then(|index| items.get_mut(index)) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

/// Removes the element at a one-based priority.
///
/// Out-of-range priorities leave the sequence unchanged and return false.
pub fn remove_at(items: &mut Vec<Value>, priority: usize) -> bool {
    match priority_index(priority) {
        Some(index) if index < items.len() => {
            items.remove(index);
            true
        }
        _ => false,
    }
}
