//! Backend adapter contract.

use crate::error::StorageResult;
use async_trait::async_trait;
use nestdb_codec::{sequence, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Which storage medium a backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Arbitrary nested values per root key.
    Document,
    /// One row per root key in a SQL table.
    Relational,
    /// A serialized map of root keys in a file.
    File,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Document => "document",
            BackendKind::Relational => "relational",
            BackendKind::File => "file",
        })
    }
}

/// A storage medium for NestDB records.
///
/// Backends are **root-key stores**. They only ever see a root key and a
/// whole replacement value; dot-path handling belongs to the store facade.
///
/// The read-modify-write operations (`add`, `push`, ...) have default
/// implementations in terms of [`get`](Backend::get),
/// [`set`](Backend::set) and [`delete`](Backend::delete). These defaults
/// are not atomic: a backend that can do better may override them.
///
/// # Invariants
///
/// - A root key maps to at most one record
/// - `delete` is idempotent and succeeds for absent keys
/// - `disconnect` is idempotent; other operations fail with
///   [`StorageError::Closed`](crate::StorageError::Closed) afterwards
///
/// # Implementors
///
/// - [`super::DocumentBackend`] - In-process document collection
/// - [`super::RelationalBackend`] - SQLite table
/// - [`super::FileBackend`] - JSON file on disk
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// The storage medium, for diagnostics.
    fn kind(&self) -> BackendKind;

    /// Whether `subtract` deletes a record whose result drops to zero or
    /// below. The store facade applies the same rule to nested counters.
    fn removes_depleted_counters(&self) -> bool {
        true
    }

    /// Returns the stored value, or `None` if no record exists.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Upserts the record and returns the stored value.
    async fn set(&self, key: &str, value: Value) -> StorageResult<Value>;

    /// Removes the record if present.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Returns every record as root key to value.
    async fn all(&self) -> StorageResult<BTreeMap<String, Value>>;

    /// Removes every record in this backend's scope.
    async fn delete_all(&self) -> StorageResult<()>;

    /// Releases backend resources.
    async fn disconnect(&self) -> StorageResult<()>;

    /// True iff a record with a truthy value exists.
    async fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key).await?.is_some_and(|value| value.is_truthy()))
    }

    /// Adds `amount` to the current numeric value (0 when absent or not
    /// numeric) and stores the result.
    async fn add(&self, key: &str, amount: f64) -> StorageResult<f64> {
        let current = self
            .get(key)
            .await?
            .and_then(|value| value.to_number())
            .unwrap_or(0.0);
        let next = current + amount;
        self.set(key, Value::Number(next)).await?;
        Ok(next)
    }

    /// Subtracts `amount` from the current numeric value.
    ///
    /// When the result is zero or below the record is deleted and `0` is
    /// returned. An absent or non-numeric record is left alone and `0` is
    /// returned.
    async fn subtract(&self, key: &str, amount: f64) -> StorageResult<f64> {
        let Some(current) = self.get(key).await?.and_then(|value| value.to_number()) else {
            return Ok(0.0);
        };
        let next = current - amount;
        if next <= 0.0 {
            self.delete(key).await?;
            Ok(0.0)
        } else {
            self.set(key, Value::Number(next)).await?;
            Ok(next)
        }
    }

    /// Appends `item`, starting a fresh sequence when the record is absent
    /// or not a sequence. Returns the stored sequence.
    async fn push(&self, key: &str, item: Value) -> StorageResult<Vec<Value>> {
        let items = sequence::appended(self.get(key).await?, item);
        self.set(key, Value::Array(items.clone())).await?;
        Ok(items)
    }

    /// Removes the first element deep-equal to `item`.
    ///
    /// Returns the record's value afterwards. A record that is absent, not
    /// a sequence, or has no matching element is left unchanged.
    async fn unpush(&self, key: &str, item: &Value) -> StorageResult<Option<Value>> {
        match self.get(key).await? {
            Some(Value::Array(mut items)) => {
                if sequence::remove_first(&mut items, item) {
                    Ok(Some(self.set(key, Value::Array(items)).await?))
                } else {
                    Ok(Some(Value::Array(items)))
                }
            }
            other => Ok(other),
        }
    }

    /// Replaces the element at the one-based `priority`.
    ///
    /// Returns `None` when the record is absent, empty or not a sequence.
    async fn set_by_priority(
        &self,
        key: &str,
        item: Value,
        priority: usize,
    ) -> StorageResult<Option<Vec<Value>>> {
        match self.get(key).await? {
            Some(Value::Array(mut items)) if !items.is_empty() => {
                if sequence::replace_at(&mut items, priority, item) {
                    self.set(key, Value::Array(items.clone())).await?;
                }
                Ok(Some(items))
            }
            _ => Ok(None),
        }
    }

    /// Removes the element at the one-based `priority`.
    ///
    /// Returns `None` when the record is absent, empty or not a sequence.
    async fn del_by_priority(
        &self,
        key: &str,
        priority: usize,
    ) -> StorageResult<Option<Vec<Value>>> {
        match self.get(key).await? {
            Some(Value::Array(mut items)) if !items.is_empty() => {
                if sequence::remove_at(&mut items, priority) {
                    self.set(key, Value::Array(items.clone())).await?;
                }
                Ok(Some(items))
            }
            _ => Ok(None),
        }
    }
}
