//! # NestDB Core
//!
//! Path-addressed key-value store over interchangeable backends.
//!
//! This crate provides:
//! - [`Store`], the session handle every operation goes through
//! - [`Config`] with backend selection and the store's policies
//! - Cascading cleanup of containers emptied by nested deletes
//! - Record-level serialization of mutations within one store
//! - An English/Turkish message catalog and an optional release check
//!
//! ## Keys
//!
//! A key such as `"guild.settings.prefix"` names the record `guild` and
//! the path `settings.prefix` inside it. Backends only ever see whole
//! records; the store reads, mutates and writes them back.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cleanup;
mod config;
mod error;
mod locks;
mod messages;
mod release;
mod store;

pub use config::{BackendConfig, CleanupMode, Config, DEFAULT_FOLDER, DEFAULT_TABLE};
pub use error::{StoreError, StoreResult};
pub use messages::{Language, Message};
pub use release::{check_release, FeedError, PinnedRelease, ReleaseFeed, CURRENT_VERSION};
pub use store::Store;

// Re-export the layers below for convenience.
pub use nestdb_codec::{KeyPath, Value};
pub use nestdb_storage::{
    Backend, BackendKind, DocumentBackend, FileBackend, RelationalBackend, StorageError,
};
