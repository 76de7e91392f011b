//! The store facade.

use crate::cleanup::{self, CleanupQueue, CleanupTask};
use crate::config::{BackendConfig, CleanupMode, Config};
use crate::error::{StoreError, StoreResult};
use crate::locks::{RecordLocks, RecordState};
use crate::messages::Message;
use crate::release::{check_release, CURRENT_VERSION};
use nestdb_codec::{delete_at, read_at, read_at_mut, sequence, write_at, KeyPath, Value};
use nestdb_storage::{Backend, BackendKind, DocumentBackend, FileBackend, RelationalBackend};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A path-addressed key-value store over one backend.
///
/// Every key is a dot-delimited path. The first segment names the record a
/// backend physically stores; the rest addresses inside that record's
/// value. Nested writes create missing intermediate mappings, and nested
/// deletes clean up ancestors they leave empty (see
/// [`CleanupMode`]).
///
/// # Consistency
///
/// Mutations of the same record through one `Store` are serialized, so
/// concurrent nested writes are not lost. Writers in other stores or
/// processes sharing the backend are not coordinated with and may
/// overwrite each other's nested changes.
///
/// # Failure semantics
///
/// Argument errors are raised before any backend call. Backend failures
/// surface from write operations as [`StoreError::BackendUnavailable`];
/// read operations (`get`, `fetch`, `has`, `all`) log them and report
/// absence instead.
///
/// # Example
///
/// ```rust
/// use nestdb_core::{CleanupMode, Config, Store};
/// use nestdb_codec::Value;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// # rt.block_on(async {
/// let store = Store::open(Config::new().cleanup(CleanupMode::Immediate)).await.unwrap();
///
/// store.set("guild.settings.prefix", "!").await.unwrap();
/// assert_eq!(
///     store.get("guild").await.unwrap(),
///     Some(Value::map([("settings", Value::map([("prefix", "!")]))]))
/// );
///
/// store.delete("guild.settings.prefix").await.unwrap();
/// assert_eq!(store.get("guild").await.unwrap(), None);
///
/// store.close().await.unwrap();
/// # });
/// ```
#[derive(Debug)]
pub struct Store {
    inner: Arc<StoreInner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Shared state of a store, reachable from the cleanup worker.
#[derive(Debug)]
pub(crate) struct StoreInner {
    backend: Arc<dyn Backend>,
    config: Config,
    locks: RecordLocks,
    cleanup: Option<CleanupQueue>,
    closed: AtomicBool,
}

impl Store {
    /// Opens the backend named by `config.backend`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if the backend cannot be
    /// opened (file locked, unreadable data, bad table name, ...).
    pub async fn open(config: Config) -> StoreResult<Self> {
        let backend: Arc<dyn Backend> = match &config.backend {
            BackendConfig::Document => Arc::new(DocumentBackend::named(config.table.clone())),
            BackendConfig::Relational { path: Some(path) } => {
                Arc::new(RelationalBackend::open(path, &config.table)?)
            }
            BackendConfig::Relational { path: None } => {
                Arc::new(RelationalBackend::open_in_memory(&config.table)?)
            }
            BackendConfig::File { folder, file } => Arc::new(
                FileBackend::open_with_create_dirs(&FileBackend::path_in(folder, file))?
                    .readable(config.readable),
            ),
        };
        Ok(Self::with_backend(backend, config).await)
    }

    /// Wraps an already opened backend.
    ///
    /// `config.backend` is ignored; every other option applies.
    pub async fn with_backend(backend: Arc<dyn Backend>, config: Config) -> Self {
        let (cleanup, receiver) = match config.cleanup {
            CleanupMode::Deferred(delay) => {
                let (queue, receiver) = CleanupQueue::new(delay);
                (Some(queue), Some(receiver))
            }
            CleanupMode::Immediate => (None, None),
        };

        let language = config.language;
        let feed = config
            .check_for_updates
            .then(|| config.release_feed.clone())
            .flatten();

        let inner = Arc::new(StoreInner {
            backend,
            config,
            locks: RecordLocks::new(),
            cleanup,
            closed: AtomicBool::new(false),
        });
        let worker =
            receiver.map(|receiver| cleanup::spawn_worker(Arc::downgrade(&inner), receiver));

        info!(
            "{}",
            Message::Connected {
                backend: &inner.backend.kind().to_string()
            }
            .render(language)
        );

        if let Some(feed) = feed {
            tokio::spawn(async move {
                check_release(feed.as_ref(), CURRENT_VERSION, language).await;
            });
        }

        Self {
            inner,
            worker: Mutex::new(worker),
        }
    }

    /// The configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    /// The kind of the underlying backend.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.inner.backend.kind()
    }

    /// Returns true once [`close`](Store::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Reads the value at `key`.
    ///
    /// Returns `None` when nothing is stored there or the backend fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for a malformed key and
    /// [`StoreError::Closed`] after close.
    pub async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let path = self.inner.parse(key)?;
        Ok(self.inner.read(&path).await)
    }

    /// Reads the value at `key`, or `default` when absent.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Store::get).
    pub async fn fetch(&self, key: &str, default: impl Into<Value>) -> StoreResult<Value> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.into()))
    }

    /// Returns true if a truthy value is stored at `key`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Store::get).
    pub async fn has(&self, key: &str) -> StoreResult<bool> {
        let path = self.inner.parse(key)?;
        if path.is_nested() {
            return Ok(self
                .inner
                .read(&path)
                .await
                .is_some_and(|value| value.is_truthy()));
        }
        match self.inner.backend.has(path.root()).await {
            Ok(found) => Ok(found),
            Err(err) => {
                warn!(key, error = %err, "existence check failed; reporting absent");
                Ok(false)
            }
        }
    }

    /// Writes `value` at `key` and returns it.
    ///
    /// Missing intermediate mappings are created; a scalar in the way is
    /// replaced by a mapping.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidKey`] for a malformed key, or a sequence
    ///   index more than one past the end
    /// - [`StoreError::InvalidNumber`] if the value holds a NaN or
    ///   infinite number
    /// - [`StoreError::BlankData`] for a blank value under the
    ///   no-blank-data policy
    /// - [`StoreError::BackendUnavailable`] if the backend fails
    pub async fn set(&self, key: &str, value: impl Into<Value>) -> StoreResult<Value> {
        let path = self.inner.parse(key)?;
        let value = value.into();
        check_finite(&path, &value)?;
        self.inner.reject_blank(&path, &value)?;

        let mut state = self.inner.locks.lock(path.root()).await;
        state.wrote(path.nested());
        if !path.is_nested() {
            return Ok(self.inner.backend.set(path.root(), value).await?);
        }

        let mut record = self.inner.load(path.root()).await?;
        write_nested(&mut record, &path, value.clone())?;
        self.inner.backend.set(path.root(), record).await?;
        debug!(key, "nested value written");
        Ok(value)
    }

    /// Removes the value at `key`.
    ///
    /// For a nested key only the leaf is removed. Ancestors left empty are
    /// removed too, inline or later depending on the [`CleanupMode`]; a
    /// record whose top-level mapping becomes empty is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if removing the leaf
    /// fails. Cleanup failures are only logged.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.inner.parse(key)?;
        let mut state = self.inner.locks.lock(path.root()).await;
        self.inner.delete_locked(&path, &mut state).await
    }

    /// Adds `amount` to the number at `key` (0 when absent or not numeric).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidNumber`] for a non-finite amount, plus
    /// the errors of [`set`](Store::set).
    pub async fn add(&self, key: &str, amount: f64) -> StoreResult<f64> {
        check_amount(amount)?;
        let path = self.inner.parse(key)?;
        let mut state = self.inner.locks.lock(path.root()).await;
        state.wrote(path.nested());
        if !path.is_nested() {
            return Ok(self.inner.backend.add(path.root(), amount).await?);
        }

        let mut record = self.inner.load(path.root()).await?;
        let current = read_at(&record, path.nested())
            .and_then(Value::to_number)
            .unwrap_or(0.0);
        let next = current + amount;
        write_nested(&mut record, &path, Value::Number(next))?;
        self.inner.backend.set(path.root(), record).await?;
        Ok(next)
    }

    /// Subtracts `amount` from the number at `key`.
    ///
    /// Follows the backend's counter rule: on backends that remove
    /// depleted counters a result of zero or below deletes the value and
    /// returns `0`, and an absent value is left alone; otherwise the raw
    /// result is stored.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Store::add).
    pub async fn subtract(&self, key: &str, amount: f64) -> StoreResult<f64> {
        check_amount(amount)?;
        let path = self.inner.parse(key)?;
        let mut state = self.inner.locks.lock(path.root()).await;
        if !path.is_nested() {
            state.wrote(path.nested());
            return Ok(self.inner.backend.subtract(path.root(), amount).await?);
        }

        let removes = self.inner.backend.removes_depleted_counters();
        let mut record = self.inner.load(path.root()).await?;
        let current = match read_at(&record, path.nested()).and_then(Value::to_number) {
            Some(current) => current,
            None if removes => return Ok(0.0),
            None => 0.0,
        };

        let next = current - amount;
        if removes && next <= 0.0 {
            self.inner.delete_locked(&path, &mut state).await?;
            return Ok(0.0);
        }

        state.wrote(path.nested());
        write_nested(&mut record, &path, Value::Number(next))?;
        self.inner.backend.set(path.root(), record).await?;
        Ok(next)
    }

    /// Appends `item` to the sequence at `key` and returns the sequence.
    ///
    /// An absent or non-sequence value is replaced by a fresh sequence.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Store::set).
    pub async fn push(&self, key: &str, item: impl Into<Value>) -> StoreResult<Vec<Value>> {
        let path = self.inner.parse(key)?;
        let item = item.into();
        check_finite(&path, &item)?;
        self.inner.reject_blank(&path, &item)?;

        let mut state = self.inner.locks.lock(path.root()).await;
        state.wrote(path.nested());
        if !path.is_nested() {
            return Ok(self.inner.backend.push(path.root(), item).await?);
        }

        let mut record = self.inner.load(path.root()).await?;
        let items = sequence::appended(read_at(&record, path.nested()).cloned(), item);
        write_nested(&mut record, &path, Value::Array(items.clone()))?;
        self.inner.backend.set(path.root(), record).await?;
        Ok(items)
    }

    /// Removes the first element deep-equal to `item` from the sequence
    /// at `key`.
    ///
    /// Returns the value at `key` afterwards; it is unchanged when nothing
    /// matched or the value is not a sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for a malformed key and
    /// [`StoreError::BackendUnavailable`] if the backend fails.
    pub async fn unpush(&self, key: &str, item: impl Into<Value>) -> StoreResult<Option<Value>> {
        let path = self.inner.parse(key)?;
        let item = item.into();
        let mut state = self.inner.locks.lock(path.root()).await;
        if !path.is_nested() {
            state.wrote(path.nested());
            return Ok(self.inner.backend.unpush(path.root(), &item).await?);
        }

        let Some(mut record) = self.inner.backend.get(path.root()).await? else {
            return Ok(None);
        };
        let (changed, after) = match read_at_mut(&mut record, path.nested()) {
            Some(Value::Array(items)) => {
                let changed = sequence::remove_first(items, &item);
                (changed, Some(Value::Array(items.clone())))
            }
            other => (false, other.cloned()),
        };
        if changed {
            state.wrote(path.nested());
            self.inner.backend.set(path.root(), record).await?;
        }
        Ok(after)
    }

    /// Replaces the element at the one-based `priority` of the sequence at
    /// `key` and returns the sequence.
    ///
    /// Returns `None` when the value is absent, empty or not a sequence.
    /// An out-of-range priority leaves the sequence unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidNumber`] for priority `0` or an item
    /// holding a non-finite number, plus the errors of
    /// [`unpush`](Store::unpush).
    pub async fn set_by_priority(
        &self,
        key: &str,
        item: impl Into<Value>,
        priority: usize,
    ) -> StoreResult<Option<Vec<Value>>> {
        check_priority(priority)?;
        let path = self.inner.parse(key)?;
        let item = item.into();
        check_finite(&path, &item)?;
        let mut state = self.inner.locks.lock(path.root()).await;
        if !path.is_nested() {
            state.wrote(path.nested());
            return Ok(self
                .inner
                .backend
                .set_by_priority(path.root(), item, priority)
                .await?);
        }

        self.inner
            .edit_nested_sequence(&path, &mut state, |items| {
                sequence::replace_at(items, priority, item)
            })
            .await
    }

    /// Removes the element at the one-based `priority` of the sequence at
    /// `key` and returns the sequence.
    ///
    /// Same absence and range rules as
    /// [`set_by_priority`](Store::set_by_priority).
    ///
    /// # Errors
    ///
    /// Same as [`set_by_priority`](Store::set_by_priority).
    pub async fn del_by_priority(
        &self,
        key: &str,
        priority: usize,
    ) -> StoreResult<Option<Vec<Value>>> {
        check_priority(priority)?;
        let path = self.inner.parse(key)?;
        let mut state = self.inner.locks.lock(path.root()).await;
        if !path.is_nested() {
            state.wrote(path.nested());
            return Ok(self
                .inner
                .backend
                .del_by_priority(path.root(), priority)
                .await?);
        }

        self.inner
            .edit_nested_sequence(&path, &mut state, |items| {
                sequence::remove_at(items, priority)
            })
            .await
    }

    /// Returns every record as root key to value.
    ///
    /// A failing backend yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] after close.
    pub async fn all(&self) -> StoreResult<BTreeMap<String, Value>> {
        self.inner.ensure_open()?;
        match self.inner.backend.all().await {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!(error = %err, "listing records failed; reporting none");
                Ok(BTreeMap::new())
            }
        }
    }

    /// Removes every record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if the backend fails.
    pub async fn delete_all(&self) -> StoreResult<()> {
        self.inner.ensure_open()?;
        self.inner.backend.delete_all().await?;
        info!(backend = %self.kind(), "all records deleted");
        Ok(())
    }

    /// Copies every record of `source` into this store, replacing records
    /// with the same root key. Returns the number of records copied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if reading `source` or
    /// writing this store fails; records copied before the failure stay.
    pub async fn import_from(&self, source: &dyn Backend) -> StoreResult<usize> {
        self.inner.ensure_open()?;
        let records = source.all().await?;
        let count = records.len();
        for (root, value) in records {
            let mut state = self.inner.locks.lock(&root).await;
            state.wrote(&[]);
            self.inner.backend.set(&root, value).await?;
        }
        info!(
            from = %source.kind(),
            to = %self.kind(),
            records = count,
            "records imported"
        );
        Ok(count)
    }

    /// Cancels pending cleanup checks and disconnects the backend.
    ///
    /// Calling `close` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if the backend fails to
    /// disconnect cleanly.
    pub async fn close(&self) -> StoreResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.abort();
        }
        self.inner.backend.disconnect().await?;
        info!("{}", Message::Disconnected.render(self.inner.config.language));
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.abort();
        }
    }
}

impl StoreInner {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn parse(&self, key: &str) -> StoreResult<KeyPath> {
        self.ensure_open()?;
        Ok(KeyPath::parse(key)?)
    }

    fn reject_blank(&self, path: &KeyPath, value: &Value) -> StoreResult<()> {
        if self.config.no_blank_data && value.is_blank() {
            Err(StoreError::blank_data(path.to_string()))
        } else {
            Ok(())
        }
    }

    /// Fail-open read.
    async fn read(&self, path: &KeyPath) -> Option<Value> {
        match self.backend.get(path.root()).await {
            Ok(record) => record.and_then(|record| read_at(&record, path.nested()).cloned()),
            Err(err) => {
                warn!(key = %path, error = %err, "read failed; reporting absent");
                None
            }
        }
    }

    /// Loads a record for a nested write; absent records start as an
    /// empty mapping.
    async fn load(&self, root: &str) -> StoreResult<Value> {
        Ok(self
            .backend
            .get(root)
            .await?
            .unwrap_or_else(Value::empty_map))
    }

    /// Removes the value at `path` and returns the parent to check.
    ///
    /// Nothing is returned for a root-level delete or when the path did
    /// not resolve.
    async fn remove(
        &self,
        path: &KeyPath,
        state: &mut RecordState,
    ) -> StoreResult<Option<KeyPath>> {
        state.wrote(path.nested());
        if !path.is_nested() {
            self.backend.delete(path.root()).await?;
            debug!(key = %path, "record deleted");
            return Ok(None);
        }

        let Some(mut record) = self.backend.get(path.root()).await? else {
            return Ok(None);
        };
        if delete_at(&mut record, path.nested()).is_none() {
            return Ok(None);
        }
        self.backend.set(path.root(), record).await?;
        debug!(key = %path, "nested value deleted");
        Ok(path.parent())
    }

    /// Removes `parent` if it is an empty container.
    ///
    /// Returns the next ancestor to check.
    async fn check_parent(
        &self,
        parent: &KeyPath,
        state: &mut RecordState,
    ) -> StoreResult<Option<KeyPath>> {
        let record = self.backend.get(parent.root()).await?;
        let empty = record
            .as_ref()
            .and_then(|record| read_at(record, parent.nested()))
            .is_some_and(Value::is_empty_container);
        if !empty {
            return Ok(None);
        }
        debug!(key = %parent, "removing emptied container");
        self.remove(parent, state).await
    }

    /// Delete procedure shared by `delete` and depleting `subtract`.
    async fn delete_locked(&self, path: &KeyPath, state: &mut RecordState) -> StoreResult<()> {
        let Some(parent) = self.remove(path, state).await? else {
            return Ok(());
        };

        match &self.cleanup {
            Some(queue) => {
                let token = state.expect_check(parent.nested());
                queue.schedule(parent, token);
            }
            None => {
                let mut next = Some(parent);
                while let Some(parent) = next {
                    next = match self.check_parent(&parent, state).await {
                        Ok(next) => next,
                        Err(err) => {
                            error!(key = %parent, error = %err, "cascade cleanup failed");
                            None
                        }
                    };
                }
            }
        }
        Ok(())
    }

    /// Runs one queued ancestor check.
    pub(crate) async fn run_cleanup(&self, task: CleanupTask) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let mut state = self.locks.lock(task.parent.root()).await;
        if !state.take_check(task.parent.nested(), task.token) {
            debug!(key = %task.parent, "container rewritten since delete; cleanup skipped");
            return;
        }
        match self.check_parent(&task.parent, &mut state).await {
            Ok(Some(next)) => {
                if let Some(queue) = &self.cleanup {
                    let token = state.expect_check(next.nested());
                    queue.schedule(next, token);
                }
            }
            Ok(None) => {}
            Err(err) => {
                error!(key = %task.parent, error = %err, "cascade cleanup failed");
            }
        }
    }

    /// Applies `edit` to a non-empty nested sequence and stores the record
    /// if `edit` reports a change.
    async fn edit_nested_sequence(
        &self,
        path: &KeyPath,
        state: &mut RecordState,
        edit: impl FnOnce(&mut Vec<Value>) -> bool,
    ) -> StoreResult<Option<Vec<Value>>> {
        let Some(mut record) = self.backend.get(path.root()).await? else {
            return Ok(None);
        };
        let outcome = match read_at_mut(&mut record, path.nested()) {
            Some(Value::Array(items)) if !items.is_empty() => {
                let changed = edit(items);
                Some((changed, items.clone()))
            }
            _ => None,
        };
        match outcome {
            Some((changed, items)) => {
                if changed {
                    state.wrote(path.nested());
                    self.backend.set(path.root(), record).await?;
                }
                Ok(Some(items))
            }
            None => Ok(None),
        }
    }
}

fn write_nested(record: &mut Value, path: &KeyPath, value: Value) -> StoreResult<()> {
    if write_at(record, path.nested(), value) {
        Ok(())
    } else {
        Err(StoreError::invalid_key(
            path.to_string(),
            "sequence index is past the end",
        ))
    }
}

fn check_amount(amount: f64) -> StoreResult<()> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(StoreError::invalid_number(format!(
            "amount must be finite, got {amount}"
        )))
    }
}

fn check_finite(path: &KeyPath, value: &Value) -> StoreResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StoreError::invalid_number(format!(
            "numbers stored at {path} must be finite"
        )))
    }
}

fn check_priority(priority: usize) -> StoreResult<()> {
    if priority == 0 {
        Err(StoreError::invalid_number("priority starts at 1"))
    } else {
        Ok(())
    }
}
