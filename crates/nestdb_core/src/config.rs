//! Store configuration.

use crate::messages::Language;
use crate::release::ReleaseFeed;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default table, collection and file name.
pub const DEFAULT_TABLE: &str = "nestdb";

/// Default folder of the file backend.
pub const DEFAULT_FOLDER: &str = "nestdb";

/// Which backend [`Store::open`](crate::Store::open) creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// In-process document collection.
    Document,
    /// SQLite table; `None` opens a private in-memory database.
    Relational {
        /// Database file.
        path: Option<PathBuf>,
    },
    /// JSON file at `<folder>/<file>.json`.
    File {
        /// Directory holding the data file.
        folder: PathBuf,
        /// File name without extension.
        file: String,
    },
}

impl BackendConfig {
    /// File backend in the default folder with the default file name.
    #[must_use]
    pub fn default_file() -> Self {
        Self::File {
            folder: PathBuf::from(DEFAULT_FOLDER),
            file: DEFAULT_TABLE.to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Document
    }
}

/// When emptied ancestors of a nested delete are cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Check ancestors inline before `delete` returns.
    Immediate,
    /// Queue each ancestor check to run after the delay.
    ///
    /// A queued check is dropped if the record is written again first.
    Deferred(Duration),
}

impl Default for CleanupMode {
    fn default() -> Self {
        CleanupMode::Deferred(Duration::from_millis(500))
    }
}

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend to open.
    pub backend: BackendConfig,

    /// Table name (relational) or collection name (document).
    pub table: String,

    /// Pretty-print the file backend's JSON.
    pub readable: bool,

    /// Reject blank values in `set` and `push`.
    pub no_blank_data: bool,

    /// Language of user-facing messages.
    pub language: Language,

    /// Compare the running version against the release feed on open.
    pub check_for_updates: bool,

    /// Cascade cleanup timing.
    pub cleanup: CleanupMode,

    /// Source of the latest published version.
    pub release_feed: Option<Arc<dyn ReleaseFeed>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            table: DEFAULT_TABLE.to_string(),
            readable: false,
            no_blank_data: false,
            language: Language::En,
            check_for_updates: true,
            cleanup: CleanupMode::default(),
            release_feed: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend.
    #[must_use]
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the table or collection name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets whether the file backend writes pretty-printed JSON.
    #[must_use]
    pub const fn readable(mut self, value: bool) -> Self {
        self.readable = value;
        self
    }

    /// Sets whether blank values are rejected.
    #[must_use]
    pub const fn no_blank_data(mut self, value: bool) -> Self {
        self.no_blank_data = value;
        self
    }

    /// Sets the message language.
    #[must_use]
    pub const fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Sets the message language from a code; unknown codes mean English.
    #[must_use]
    pub fn language_code(self, code: &str) -> Self {
        self.language(Language::from_code(code))
    }

    /// Sets whether to check for a newer release on open.
    #[must_use]
    pub const fn check_for_updates(mut self, value: bool) -> Self {
        self.check_for_updates = value;
        self
    }

    /// Sets the cascade cleanup mode.
    #[must_use]
    pub const fn cleanup(mut self, mode: CleanupMode) -> Self {
        self.cleanup = mode;
        self
    }

    /// Sets the release feed consulted by the update check.
    #[must_use]
    pub fn release_feed(mut self, feed: Arc<dyn ReleaseFeed>) -> Self {
        self.release_feed = Some(feed);
        self
    }
}
