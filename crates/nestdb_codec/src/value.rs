//! Dynamic value type stored under every root key.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A structurally nestable data value.
///
/// Every record held by a backend is a `Value`, and every `Map` or `Array`
/// may hold further values addressed by dot-path segments.
///
/// Numbers are IEEE-754 doubles. Integral numbers within the exactly
/// representable range are written as JSON integers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Mapping from string keys to values (keys are kept sorted).
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Creates an empty mapping.
    #[must_use]
    pub fn empty_map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Creates a mapping from key/value pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns a short name for the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "object",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as a number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Coerces this value to a finite number.
    ///
    /// Numbers are returned as-is; text is accepted when it parses as a
    /// finite float (surrounding whitespace ignored). Everything else is
    /// not numeric.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a sequence, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a mutable sequence, if it is one.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a mapping, if it is one.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get this value as a mutable mapping, if it is one.
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Returns true for `Map` and `Array`.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Array(_))
    }

    /// Returns true for a `Map` with no keys or an `Array` with no elements.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Value::Map(m) => m.is_empty(),
            Value::Array(a) => a.is_empty(),
            _ => false,
        }
    }

    /// Truthiness as used by existence checks.
    ///
    /// `Null`, `false`, `0`, `NaN` and the empty string are falsy; every
    /// container is truthy, even an empty one.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Array(_) | Value::Map(_) => true,
        }
    }

    /// Returns true for values that carry no data: `Null`, the empty
    /// string and empty containers.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::Array(_) | Value::Map(_) => self.is_empty_container(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }

    /// Returns true if every number in the value is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite(),
            Value::Array(items) => items.iter().all(Value::is_finite),
            Value::Map(entries) => entries.values().all(Value::is_finite),
            Value::Null | Value::Bool(_) | Value::Text(_) => true,
        }
    }
}

impl Serialize for Value {
    #[allow(clippy::cast_possible_truncation)]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(items) => items.serialize(serializer),
            Value::Map(entries) => entries.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_keys_are_sorted() {
        let map = Value::map([("z", 1), ("a", 2), ("m", 3)]);
        let keys: Vec<&String> = map.as_map().unwrap().keys().collect();
        assert_eq!(keys, ["a", "m", "z"]);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::empty_map().is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("").is_blank());
        assert!(Value::empty_map().is_blank());
        assert!(Value::Array(vec![]).is_blank());
        assert!(!Value::Number(0.0).is_blank());
        assert!(!Value::Bool(false).is_blank());
        assert!(!Value::from(vec![1]).is_blank());
    }

    #[test]
    fn finiteness_is_checked_throughout() {
        assert!(Value::from(json!({"a": [1, 2.5], "b": "x"})).is_finite());
        assert!(!Value::Number(f64::NAN).is_finite());
        assert!(!Value::map([("a", Value::from(vec![f64::INFINITY]))]).is_finite());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::Number(2.5).to_number(), Some(2.5));
        assert_eq!(Value::from(" 12 ").to_number(), Some(12.0));
        assert_eq!(Value::from("twelve").to_number(), None);
        assert_eq!(Value::from("inf").to_number(), None);
        assert_eq!(Value::Bool(true).to_number(), None);
        assert_eq!(Value::Null.to_number(), None);
    }

    #[test]
    fn integral_numbers_display_as_integers() {
        assert_eq!(Value::from(5).to_string(), "5");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(-3.0).to_string(), "-3");
    }

    #[test]
    fn display_is_compact_json() {
        let value = Value::map([
            ("name", Value::from("Alice")),
            ("tags", Value::from(vec!["a", "b"])),
        ]);
        assert_eq!(value.to_string(), r#"{"name":"Alice","tags":["a","b"]}"#);
    }

    #[test]
    fn deserializes_every_variant() {
        let value: Value =
            serde_json::from_str(r#"{"a":null,"b":true,"c":3,"d":"x","e":[1.5],"f":{}}"#)
                .unwrap();
        assert_eq!(value.get("a"), Some(&Value::Null));
        assert_eq!(value.get("b"), Some(&Value::Bool(true)));
        assert_eq!(value.get("c"), Some(&Value::Number(3.0)));
        assert_eq!(value.get("d"), Some(&Value::from("x")));
        assert_eq!(value.get("e"), Some(&Value::from(vec![1.5])));
        assert_eq!(value.get("f"), Some(&Value::empty_map()));
    }

    #[test]
    fn from_serde_json() {
        let value = Value::from(json!({"a": {"b": [1, "two", null]}}));
        let expected = Value::map([(
            "a",
            Value::map([(
                "b",
                Value::Array(vec![Value::from(1), Value::from("two"), Value::Null]),
            )]),
        )]);
        assert_eq!(value, expected);
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Number(42.0));
        assert_eq!(Value::from(42i32), Value::Number(42.0));
        assert_eq!(Value::from(42u32), Value::Number(42.0));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
        assert_eq!(Value::from(()), Value::Null);
    }
}
