//! In-process document collection backend.

use crate::backend::{Backend, BackendKind};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use nestdb_codec::Value;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
struct Document {
    value: Value,
    /// Revision assigned on the last write.
    revision: u64,
}

#[derive(Debug, Default)]
struct Collection {
    documents: BTreeMap<String, Document>,
    next_revision: u64,
}

impl Collection {
    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }
}

/// A document-oriented backend.
///
/// Each root key maps to one document holding an arbitrary nested
/// [`Value`]. Every write stamps the document with a fresh, monotonically
/// increasing revision.
///
/// Data lives only as long as the backend; use
/// [`FileBackend`](crate::FileBackend) for persistence.
///
/// # Example
///
/// ```
/// use nestdb_storage::{Backend, DocumentBackend};
/// use nestdb_codec::Value;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let backend = DocumentBackend::new();
/// backend.set("guild", Value::map([("prefix", "!")])).await.unwrap();
/// assert!(backend.has("guild").await.unwrap());
/// # });
/// ```
#[derive(Debug)]
pub struct DocumentBackend {
    name: String,
    collection: RwLock<Option<Collection>>,
}

impl DocumentBackend {
    /// Default collection name.
    pub const DEFAULT_NAME: &'static str = "nestdb";

    /// Creates an empty collection with the default name.
    #[must_use]
    pub fn new() -> Self {
        Self::named(Self::DEFAULT_NAME)
    }

    /// Creates an empty collection with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: RwLock::new(Some(Collection::default())),
        }
    }

    /// Creates a collection pre-populated with records.
    #[must_use]
    pub fn with_records(records: BTreeMap<String, Value>) -> Self {
        let mut collection = Collection::default();
        for (key, value) in records {
            let revision = collection.bump();
            collection.documents.insert(key, Document { value, revision });
        }
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            collection: RwLock::new(Some(collection)),
        }
    }

    /// The collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the revision of a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after disconnect.
    pub fn revision(&self, key: &str) -> StorageResult<Option<u64>> {
        let guard = self.collection.read();
        let collection = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(collection.documents.get(key).map(|doc| doc.revision))
    }

    /// Number of documents stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after disconnect.
    pub fn len(&self) -> StorageResult<usize> {
        let guard = self.collection.read();
        Ok(guard.as_ref().ok_or(StorageError::Closed)?.documents.len())
    }

    /// Returns true if no documents are stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after disconnect.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for DocumentBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for DocumentBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let guard = self.collection.read();
        let collection = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(collection.documents.get(key).map(|doc| doc.value.clone()))
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<Value> {
        let mut guard = self.collection.write();
        let collection = guard.as_mut().ok_or(StorageError::Closed)?;
        let revision = collection.bump();
        collection.documents.insert(
            key.to_string(),
            Document {
                value: value.clone(),
                revision,
            },
        );
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut guard = self.collection.write();
        let collection = guard.as_mut().ok_or(StorageError::Closed)?;
        collection.documents.remove(key);
        Ok(())
    }

    async fn all(&self) -> StorageResult<BTreeMap<String, Value>> {
        let guard = self.collection.read();
        let collection = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(collection
            .documents
            .iter()
            .map(|(key, doc)| (key.clone(), doc.value.clone()))
            .collect())
    }

    async fn delete_all(&self) -> StorageResult<()> {
        let mut guard = self.collection.write();
        let collection = guard.as_mut().ok_or(StorageError::Closed)?;
        collection.documents.clear();
        Ok(())
    }

    async fn disconnect(&self) -> StorageResult<()> {
        if self.collection.write().take().is_some() {
            debug!(collection = %self.name, "document collection disconnected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let backend = DocumentBackend::new();
        let stored = backend.set("a", Value::from(1)).await.unwrap();
        assert_eq!(stored, Value::from(1));
        assert_eq!(backend.get("a").await.unwrap(), Some(Value::from(1)));
        assert_eq!(backend.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn revisions_increase_on_every_write() {
        let backend = DocumentBackend::new();
        backend.set("a", Value::from(1)).await.unwrap();
        let first = backend.revision("a").unwrap().unwrap();
        backend.set("a", Value::from(2)).await.unwrap();
        let second = backend.revision("a").unwrap().unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = DocumentBackend::new();
        backend.set("a", Value::from(1)).await.unwrap();
        backend.delete("a").await.unwrap();
        backend.delete("a").await.unwrap();
        assert!(backend.is_empty().unwrap());
    }

    #[tokio::test]
    async fn has_requires_truthy_value() {
        let backend = DocumentBackend::new();
        backend.set("zero", Value::from(0)).await.unwrap();
        backend.set("empty", Value::from("")).await.unwrap();
        backend.set("one", Value::from(1)).await.unwrap();
        backend.set("map", Value::empty_map()).await.unwrap();
        assert!(!backend.has("zero").await.unwrap());
        assert!(!backend.has("empty").await.unwrap());
        assert!(!backend.has("missing").await.unwrap());
        assert!(backend.has("one").await.unwrap());
        assert!(backend.has("map").await.unwrap());
    }

    #[tokio::test]
    async fn add_and_subtract_follow_counter_rules() {
        let backend = DocumentBackend::new();
        assert_eq!(backend.add("c", 5.0).await.unwrap(), 5.0);
        assert_eq!(backend.add("c", 2.5).await.unwrap(), 7.5);
        assert_eq!(backend.subtract("c", 2.5).await.unwrap(), 5.0);
        assert_eq!(backend.subtract("c", 10.0).await.unwrap(), 0.0);
        assert_eq!(backend.get("c").await.unwrap(), None);
        assert_eq!(backend.subtract("never", 1.0).await.unwrap(), 0.0);
        assert_eq!(backend.get("never").await.unwrap(), None);
    }

    #[tokio::test]
    async fn push_family() {
        let backend = DocumentBackend::new();
        backend.push("l", Value::from("a")).await.unwrap();
        backend.push("l", Value::from("b")).await.unwrap();
        let items = backend.push("l", Value::from("a")).await.unwrap();
        assert_eq!(items.len(), 3);

        let after = backend.unpush("l", &Value::from("a")).await.unwrap();
        assert_eq!(after, Some(Value::from(vec!["b", "a"])));

        let replaced = backend
            .set_by_priority("l", Value::from("z"), 2)
            .await
            .unwrap();
        assert_eq!(replaced, Some(vec![Value::from("b"), Value::from("z")]));

        let removed = backend.del_by_priority("l", 1).await.unwrap();
        assert_eq!(removed, Some(vec![Value::from("z")]));

        let unchanged = backend.del_by_priority("l", 9).await.unwrap();
        assert_eq!(unchanged, Some(vec![Value::from("z")]));
        assert_eq!(backend.del_by_priority("missing", 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn push_onto_scalar_starts_fresh() {
        let backend = DocumentBackend::new();
        backend.set("l", Value::from(3)).await.unwrap();
        let items = backend.push("l", Value::from("x")).await.unwrap();
        assert_eq!(items, vec![Value::from("x")]);
    }

    #[tokio::test]
    async fn all_and_delete_all() {
        let backend = DocumentBackend::with_records(BTreeMap::from([
            ("a".to_string(), Value::from(1)),
            ("b".to_string(), Value::from("two")),
        ]));
        assert_eq!(backend.all().await.unwrap().len(), 2);
        backend.delete_all().await.unwrap();
        assert!(backend.all().await.unwrap().is_empty());
    }

    #[test]
    fn collection_name() {
        assert_eq!(DocumentBackend::new().name(), "nestdb");
        assert_eq!(DocumentBackend::named("guilds").name(), "guilds");
    }

    #[tokio::test]
    async fn operations_fail_after_disconnect() {
        let backend = DocumentBackend::new();
        backend.disconnect().await.unwrap();
        backend.disconnect().await.unwrap();
        assert!(matches!(backend.get("a").await, Err(StorageError::Closed)));
        assert!(matches!(
            backend.set("a", Value::Null).await,
            Err(StorageError::Closed)
        ));
    }
}
