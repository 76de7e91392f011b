//! JSON text encoding.

use crate::error::{CodecError, CodecResult};
use serde::Serialize;

/// Encodes a value (or any serializable map of values) as compact JSON.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    serde_json::to_string(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encodes as indented, human-readable JSON.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if serialization fails.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use std::collections::BTreeMap;

    #[test]
    fn compact_output() {
        let value = Value::map([("a", Value::from(vec![1, 2]))]);
        assert_eq!(to_json(&value).unwrap(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn pretty_output_is_multiline() {
        let mut records = BTreeMap::new();
        records.insert("k".to_string(), Value::from("v"));
        let text = to_json_pretty(&records).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains(r#""k": "v""#));
    }
}
