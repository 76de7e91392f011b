//! Cross-crate integration test helpers.
//!
//! [`ModelHarness`] drives a real store and a plain in-memory model with
//! the same operations, then checks that both hold the same records.

use crate::fixtures::TestStore;
use crate::generators::StoreOperation;
use nestdb_codec::{delete_at, read_at, sequence, write_at, KeyPath, Value};
use nestdb_core::BackendKind;
use std::collections::BTreeMap;

/// A test harness comparing a store against a reference model.
///
/// The model applies nested writes and deletes with the same path rules
/// and inline cascade cleanup as the store.
#[derive(Debug)]
pub struct ModelHarness {
    /// The store under test.
    pub store: TestStore,
    model: BTreeMap<String, Value>,
}

impl ModelHarness {
    /// Creates a harness over a fresh store of `kind`.
    pub async fn new(kind: BackendKind) -> Self {
        Self {
            store: TestStore::of_kind(kind).await,
            model: BTreeMap::new(),
        }
    }

    /// Applies `op` to both the store and the model.
    ///
    /// For reads, asserts the store returns what the model holds.
    pub async fn apply(&mut self, op: &StoreOperation) {
        let path = KeyPath::parse(op.key()).expect("Generated key must parse");
        match op {
            StoreOperation::Set { key, value } => {
                self.store
                    .set(key, value.clone())
                    .await
                    .expect("Failed to set");
                let record = self
                    .model
                    .entry(path.root().to_string())
                    .or_insert_with(Value::empty_map);
                write_at(record, path.nested(), value.clone());
            }
            StoreOperation::Push { key, item } => {
                self.store
                    .push(key, item.clone())
                    .await
                    .expect("Failed to push");
                let record = self
                    .model
                    .entry(path.root().to_string())
                    .or_insert_with(Value::empty_map);
                let items =
                    sequence::appended(read_at(record, path.nested()).cloned(), item.clone());
                write_at(record, path.nested(), Value::Array(items));
            }
            StoreOperation::Delete { key } => {
                self.store.delete(key).await.expect("Failed to delete");
                self.model_delete(&path);
            }
            StoreOperation::Get { key } => {
                let actual = self.store.get(key).await.expect("Failed to get");
                assert_eq!(actual, self.model_get(&path), "get({key:?}) mismatch");
            }
        }
    }

    /// Asserts the store holds exactly the model's records.
    pub async fn verify(&self) {
        let actual = self.store.all().await.expect("Failed to list records");
        assert_eq!(actual, self.model, "store diverged from model");
    }

    fn model_get(&self, path: &KeyPath) -> Option<Value> {
        let record = self.model.get(path.root())?;
        read_at(record, path.nested()).cloned()
    }

    fn model_delete(&mut self, path: &KeyPath) {
        let mut next = self.model_remove(path);
        while let Some(parent) = next {
            let empty = self
                .model_get(&parent)
                .is_some_and(|value| value.is_empty_container());
            next = if empty { self.model_remove(&parent) } else { None };
        }
    }

    fn model_remove(&mut self, path: &KeyPath) -> Option<KeyPath> {
        if !path.is_nested() {
            self.model.remove(path.root());
            return None;
        }
        let record = self.model.get_mut(path.root())?;
        delete_at(record, path.nested())?;
        path.parent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_tracks_nested_cascade() {
        let mut harness = ModelHarness::new(BackendKind::Document).await;
        for op in [
            StoreOperation::Set {
                key: "a.b.c".to_string(),
                value: Value::from(1),
            },
            StoreOperation::Push {
                key: "a.list".to_string(),
                item: Value::from("x"),
            },
            StoreOperation::Delete {
                key: "a.b.c".to_string(),
            },
            StoreOperation::Get {
                key: "a.b".to_string(),
            },
        ] {
            harness.apply(&op).await;
        }
        harness.verify().await;
    }
}
