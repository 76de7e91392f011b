//! File-based backend for persistent storage.

use crate::backend::{Backend, BackendKind};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use fs2::FileExt;
use nestdb_codec::{from_json_records, to_json, to_json_pretty, Value};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const EXTENSION: &str = "json";

/// A file-based backend.
///
/// All records live in one JSON object, keyed by root key, stored at
/// `<folder>/<name>.json`. The whole map is loaded on open and rewritten
/// after every mutation using the write-then-rename pattern:
///
/// 1. Write to `<name>.json.tmp`
/// 2. Sync the temporary file to disk
/// 3. Rename it over the data file
///
/// An advisory lock on `<name>.json.lock` keeps a second process from
/// opening the same file.
///
/// # Example
///
/// ```no_run
/// use nestdb_storage::FileBackend;
/// use std::path::Path;
///
/// let path = FileBackend::path_in(Path::new("nestdb"), "nestdb");
/// let backend = FileBackend::open_with_create_dirs(&path).unwrap().readable(true);
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    records: RwLock<Option<BTreeMap<String, Value>>>,
    readable: bool,
    lock_file: Mutex<Option<File>>,
}

impl FileBackend {
    /// Returns the data file path for a folder and file name.
    #[must_use]
    pub fn path_in(folder: &Path, name: &str) -> PathBuf {
        folder.join(format!("{name}.{EXTENSION}"))
    }

    /// Opens or creates the data file at `path`.
    ///
    /// # Errors
    ///
    /// - Another process holds the lock (returns [`StorageError::Locked`])
    /// - The existing file is not a JSON object (returns a codec error)
    /// - An I/O error occurs
    pub fn open(path: &Path) -> StorageResult<Self> {
        let lock_path = sibling(path, "lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked { path: lock_path });
        }

        let records = match fs::read_to_string(path) {
            Ok(text) => from_json_records(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), records = records.len(), "file backend opened");

        Ok(Self {
            path: path.to_path_buf(),
            records: RwLock::new(Some(records)),
            readable: false,
            lock_file: Mutex::new(Some(lock_file)),
        })
    }

    /// Opens or creates the data file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Writes indented, multi-line JSON instead of a compact single line.
    #[must_use]
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// Returns the path to the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &BTreeMap<String, Value>) -> StorageResult<()> {
        let text = if self.readable {
            to_json_pretty(records)?
        } else {
            to_json(records)?
        };

        let temp_path = sibling(&self.path, "tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Applies `f` to a copy of the records, persists it, then swaps it in.
    ///
    /// The in-memory records change only once the file has been written.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Value>) -> T,
    ) -> StorageResult<T> {
        let mut guard = self.records.write();
        let records = guard.as_mut().ok_or(StorageError::Closed)?;
        let mut next = records.clone();
        let out = f(&mut next);
        self.persist(&next)?;
        *records = next;
        Ok(out)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[async_trait]
impl Backend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let guard = self.records.read();
        let records = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(records.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<Value> {
        self.mutate(|records| {
            records.insert(key.to_string(), value.clone());
        })?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.mutate(|records| {
            records.remove(key);
        })
    }

    async fn all(&self) -> StorageResult<BTreeMap<String, Value>> {
        let guard = self.records.read();
        Ok(guard.as_ref().ok_or(StorageError::Closed)?.clone())
    }

    async fn delete_all(&self) -> StorageResult<()> {
        self.mutate(BTreeMap::clear)
    }

    async fn disconnect(&self) -> StorageResult<()> {
        self.records.write().take();
        if let Some(lock_file) = self.lock_file.lock().take() {
            lock_file.unlock()?;
            debug!(path = %self.path.display(), "file backend disconnected");
        }
        Ok(())
    }
}
