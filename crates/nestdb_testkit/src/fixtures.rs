//! Test fixtures and store helpers.
//!
//! Provides convenience functions for opening test stores over each
//! backend and for common test scenarios.

use nestdb_core::{BackendConfig, BackendKind, CleanupMode, Config, Store};
use std::path::PathBuf;
use tempfile::TempDir;

/// Configuration used by every fixture: inline cleanup, no release check.
pub fn test_config() -> Config {
    Config::new()
        .cleanup(CleanupMode::Immediate)
        .check_for_updates(false)
}

/// A test store with automatic cleanup.
#[derive(Debug)]
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Opens a store with `config`, placing any files in a fresh temp dir.
    ///
    /// File and relational backends named in `config` are redirected into
    /// the temp dir.
    pub async fn open(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let backend = match &config.backend {
            BackendConfig::Document => BackendConfig::Document,
            BackendConfig::Relational { path: None } => BackendConfig::Relational { path: None },
            BackendConfig::Relational { path: Some(_) } => BackendConfig::Relational {
                path: Some(temp_dir.path().join("store.sqlite")),
            },
            BackendConfig::File { file, .. } => BackendConfig::File {
                folder: temp_dir.path().to_path_buf(),
                file: file.clone(),
            },
        };
        let store = Store::open(config.backend(backend))
            .await
            .expect("Failed to open test store");
        Self {
            store,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates a document-backed test store.
    pub async fn document() -> Self {
        Self::open(test_config()).await
    }

    /// Creates a test store over an in-memory SQLite table.
    pub async fn relational() -> Self {
        Self::open(test_config().backend(BackendConfig::Relational { path: None })).await
    }

    /// Creates a test store over a SQLite file.
    pub async fn relational_file() -> Self {
        Self::open(test_config().backend(BackendConfig::Relational {
            path: Some(PathBuf::from("store.sqlite")),
        }))
        .await
    }

    /// Creates a file-backed test store.
    pub async fn file() -> Self {
        Self::open(test_config().backend(BackendConfig::default_file())).await
    }

    /// Creates a test store of the given kind.
    pub async fn of_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Document => Self::document().await,
            BackendKind::Relational => Self::relational().await,
            BackendKind::File => Self::file().await,
        }
    }

    /// The temp dir holding the store's files.
    pub fn dir(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().to_path_buf())
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Every backend kind, for tests that run against all of them.
pub const ALL_KINDS: [BackendKind; 3] = [
    BackendKind::Document,
    BackendKind::Relational,
    BackendKind::File,
];

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use nestdb_core::Value;

    /// Creates a document store holding `count` records `record_<i>`,
    /// each `{ "index": i, "tags": ["t<i>"] }`.
    pub async fn populated_store(count: u32) -> TestStore {
        let test_store = TestStore::document().await;
        for i in 0..count {
            test_store
                .set(
                    &format!("record_{i}"),
                    Value::map([
                        ("index", Value::from(i)),
                        ("tags", Value::from(vec![format!("t{i}")])),
                    ]),
                )
                .await
                .expect("Failed to set record");
        }
        test_store
    }

    /// Creates a store of `kind` holding a typical nested guild record.
    pub async fn guild_store(kind: BackendKind) -> TestStore {
        let test_store = TestStore::of_kind(kind).await;
        for (key, value) in [
            ("guild.settings.prefix", Value::from("!")),
            ("guild.settings.locale", Value::from("en")),
            ("guild.stats.members", Value::from(12)),
        ] {
            test_store
                .set(key, value)
                .await
                .expect("Failed to set guild field");
        }
        test_store
            .push("guild.roles", "admin")
            .await
            .expect("Failed to push role");
        test_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_each_kind_opens() {
        for kind in ALL_KINDS {
            let test_store = TestStore::of_kind(kind).await;
            assert_eq!(test_store.kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_file_store_lives_in_temp_dir() {
        let test_store = TestStore::file().await;
        test_store.set("a", 1).await.unwrap();
        let dir = test_store.dir().unwrap();
        assert!(dir.join("nestdb.json").exists());
    }

    #[tokio::test]
    async fn test_relational_file_store() {
        let test_store = TestStore::relational_file().await;
        test_store.set("a", 1).await.unwrap();
        assert!(test_store.dir().unwrap().join("store.sqlite").exists());
    }

    #[tokio::test]
    async fn test_populated_scenario() {
        let test_store = scenarios::populated_store(10).await;
        assert_eq!(test_store.all().await.unwrap().len(), 10);
    }
}
