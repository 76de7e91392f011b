//! JSON text decoding.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use std::collections::BTreeMap;

/// Decodes a JSON document into a [`Value`].
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] on malformed JSON.
pub fn from_json(text: &str) -> CodecResult<Value> {
    serde_json::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Decodes a JSON object of root key to value.
///
/// Empty or whitespace-only input is an empty map, so a freshly created
/// store file needs no seeding.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] on malformed JSON or when the
/// document is not an object.
pub fn from_json_records(text: &str) -> CodecResult<BTreeMap<String, Value>> {
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    match from_json(text)? {
        Value::Map(records) => Ok(records),
        other => Err(CodecError::decoding_failed(format!(
            "expected a JSON object of records, found {}",
            other.type_name()
        ))),
    }
}

/// Parses user input as JSON, falling back to plain text.
///
/// `42` becomes a number and `{"a":1}` a map, while `hello` (not valid
/// JSON) becomes the string `"hello"`.
pub fn parse_lenient(input: &str) -> Value {
    from_json(input).unwrap_or_else(|_| Value::Text(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_records() {
        let records = from_json_records(r#"{"a":1,"b":{"c":[true]}}"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records["a"], Value::from(1));
    }

    #[test]
    fn blank_input_is_empty_records() {
        assert!(from_json_records("").unwrap().is_empty());
        assert!(from_json_records("  \n").unwrap().is_empty());
    }

    #[test]
    fn non_object_records_rejected() {
        assert!(matches!(
            from_json_records("[1,2]"),
            Err(CodecError::DecodingFailed { .. })
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(from_json("{").is_err());
    }

    #[test]
    fn lenient_parsing() {
        assert_eq!(parse_lenient("42"), Value::from(42));
        assert_eq!(parse_lenient("true"), Value::Bool(true));
        assert_eq!(parse_lenient("hello"), Value::from("hello"));
        assert_eq!(parse_lenient(r#""quoted""#), Value::from("quoted"));
        assert_eq!(parse_lenient(r#"{"a":1}"#), Value::map([("a", 1)]));
    }
}
