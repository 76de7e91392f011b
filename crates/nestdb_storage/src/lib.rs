//! # NestDB Storage
//!
//! Backend contract and implementations for NestDB.
//!
//! Backends are **root-key stores**: each record is addressed by a single
//! root key and holds one [`Value`](nestdb_codec::Value). Nested paths,
//! cascading cleanup and validation belong to the store facade in
//! `nestdb_core`.
//!
//! ## Design Principles
//!
//! - Every backend honours the same operation contract ([`Backend`])
//! - Read-modify-write operations have shared default implementations
//! - Must be `Send + Sync`; operations are `async`
//! - Backend-specific counter rules are reported through
//!   [`Backend::removes_depleted_counters`]
//!
//! ## Available Backends
//!
//! - [`DocumentBackend`] - In-process document collection
//! - [`RelationalBackend`] - SQLite table with one row per root key
//! - [`FileBackend`] - JSON file with atomic rewrites
//!
//! ## Example
//!
//! ```rust
//! use nestdb_codec::Value;
//! use nestdb_storage::{Backend, DocumentBackend};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let backend = DocumentBackend::new();
//! backend.push("queue", Value::from("job-1")).await.unwrap();
//! let queue = backend.push("queue", Value::from("job-2")).await.unwrap();
//! assert_eq!(queue.len(), 2);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod document;
mod error;
mod file;
mod relational;

pub use backend::{Backend, BackendKind};
pub use document::DocumentBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use relational::RelationalBackend;
