//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The SQLite driver reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] nestdb_codec::CodecError),

    /// Another process holds the store's lock file.
    #[error("store is locked by another process: {path}")]
    Locked {
        /// Path of the lock file.
        path: PathBuf,
    },

    /// The table name is not a plain SQL identifier.
    #[error("invalid table name: {name:?}")]
    InvalidTable {
        /// The rejected name.
        name: String,
    },

    /// The stored data is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The backend has been disconnected.
    #[error("backend is disconnected")]
    Closed,
}
