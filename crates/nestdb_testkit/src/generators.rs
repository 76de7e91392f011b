//! Property-based test generators using proptest.
//!
//! Provides strategies for generating keys and values that every backend
//! can store and read back exactly.

use nestdb_codec::Value;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for one path segment (never contains the separator).
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,7}").expect("Invalid regex")
}

/// Strategy for a root key.
pub fn root_key_strategy() -> impl Strategy<Value = String> {
    segment_strategy()
}

/// Strategy for a dot-delimited key with one to `max_depth` segments.
pub fn key_strategy(max_depth: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..=max_depth.max(1))
        .prop_map(|segments| segments.join("."))
}

/// Strategy for numbers that survive text and SQL round trips exactly.
pub fn number_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1_000_000i32..1_000_000).prop_map(f64::from),
        (-4_000i32..4_000).prop_map(|n| f64::from(n) / 4.0),
    ]
}

/// Strategy for scalar values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        number_strategy().prop_map(Value::Number),
        prop::string::string_regex("[a-zA-Z0-9 _-]{0,12}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
    ]
}

/// Strategy for arbitrary nested values up to three levels deep.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(segment_strategy(), inner, 0..4)
                .prop_map(|entries: BTreeMap<String, Value>| Value::Map(entries)),
        ]
    })
}

/// Strategy for values that are never blank.
pub fn non_blank_value_strategy() -> impl Strategy<Value = Value> {
    value_strategy().prop_filter("value must not be blank", |value| !value.is_blank())
}

/// A store operation for randomized sequences.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Write a value.
    Set {
        /// Target key.
        key: String,
        /// Value to write.
        value: Value,
    },
    /// Delete a value.
    Delete {
        /// Target key.
        key: String,
    },
    /// Append to a sequence.
    Push {
        /// Target key.
        key: String,
        /// Item to append.
        item: Value,
    },
    /// Read a value.
    Get {
        /// Target key.
        key: String,
    },
}

impl StoreOperation {
    /// The key the operation targets.
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. }
            | Self::Delete { key }
            | Self::Push { key, .. }
            | Self::Get { key } => key,
        }
    }
}

/// Strategy for store operations over a small key space.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    let key = || {
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..4)
            .prop_map(|segments| segments.join("."))
    };
    prop_oneof![
        3 => (key(), value_strategy()).prop_map(|(key, value)| StoreOperation::Set { key, value }),
        2 => key().prop_map(|key| StoreOperation::Delete { key }),
        1 => (key(), scalar_strategy()).prop_map(|(key, item)| StoreOperation::Push { key, item }),
        2 => key().prop_map(|key| StoreOperation::Get { key }),
    ]
}

/// Strategy for a sequence of store operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestdb_codec::KeyPath;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_keys_parse(key in key_strategy(4)) {
            let path = KeyPath::parse(&key).unwrap();
            prop_assert!(path.len() <= 4);
        }

        #[test]
        fn generated_values_survive_json(value in value_strategy()) {
            let text = nestdb_codec::to_json(&value).unwrap();
            prop_assert_eq!(nestdb_codec::from_json(&text).unwrap(), value);
        }

        #[test]
        fn non_blank_values_are_not_blank(value in non_blank_value_strategy()) {
            prop_assert!(!value.is_blank());
        }
    }
}
