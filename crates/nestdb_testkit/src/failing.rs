//! Failure injection.
//!
//! [`FailingBackend`] wraps a real backend and fails reads or writes on
//! demand, for exercising the store's fail-open reads and fail-loud
//! writes.

use async_trait::async_trait;
use nestdb_codec::Value;
use nestdb_storage::{Backend, BackendKind, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A backend whose reads and writes can be switched to fail.
#[derive(Debug)]
pub struct FailingBackend {
    inner: Arc<dyn Backend>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingBackend {
    /// Wraps `inner`; nothing fails until switched on.
    pub fn new(inner: Arc<dyn Backend>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes `get` and `all` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `set`, `delete` and `delete_all` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> StorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Io(io::Error::other("injected failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for FailingBackend {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    fn removes_depleted_counters(&self) -> bool {
        self.inner.removes_depleted_counters()
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Self::check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<Value> {
        Self::check(&self.fail_writes)?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(key).await
    }

    async fn all(&self) -> StorageResult<BTreeMap<String, Value>> {
        Self::check(&self.fail_reads)?;
        self.inner.all().await
    }

    async fn delete_all(&self) -> StorageResult<()> {
        Self::check(&self.fail_writes)?;
        self.inner.delete_all().await
    }

    async fn disconnect(&self) -> StorageResult<()> {
        self.inner.disconnect().await
    }

    // Keeps the wrapped backend's counter rule.
    async fn subtract(&self, key: &str, amount: f64) -> StorageResult<f64> {
        Self::check(&self.fail_reads)?;
        Self::check(&self.fail_writes)?;
        self.inner.subtract(key, amount).await
    }
}
