//! # NestDB Testkit
//!
//! Test utilities for NestDB.
//!
//! This crate provides:
//! - Test fixtures opening a store over each backend
//! - Property-based test generators using proptest
//! - A failure-injecting backend wrapper
//! - A model harness checking a store against a reference model
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nestdb_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn every_backend() {
//!     for kind in ALL_KINDS {
//!         let store = TestStore::of_kind(kind).await;
//!         // ... test operations
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod failing;
pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::failing::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use failing::*;
pub use fixtures::*;
pub use generators::*;
pub use integration::*;
