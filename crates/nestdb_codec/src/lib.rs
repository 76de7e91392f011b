//! # NestDB Codec
//!
//! Value model and path handling for NestDB.
//!
//! This crate provides:
//! - [`Value`], the tagged union every record stores
//! - [`KeyPath`], which splits a dot-delimited key into a root key and a
//!   nested path
//! - The nested value mutator ([`read_at`], [`write_at`], [`delete_at`])
//! - Sequence helpers for the push family of operations
//! - JSON text encoding used by the file and relational backends
//!
//! Everything here is pure and synchronous; backends and the store
//! facade build on top of it.
//!
//! ## Usage
//!
//! ```
//! use nestdb_codec::{read_at, write_at, KeyPath, Value};
//!
//! let path = KeyPath::parse("a.b.c").unwrap();
//! assert_eq!(path.root(), "a");
//!
//! let mut record = Value::empty_map();
//! write_at(&mut record, path.nested(), Value::from(5));
//! assert_eq!(read_at(&record, path.nested()), Some(&Value::from(5)));
//! assert_eq!(record.to_string(), r#"{"b":{"c":5}}"#);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod mutate;
mod path;
pub mod sequence;
mod value;

pub use decoder::{from_json, from_json_records, parse_lenient};
pub use encoder::{to_json, to_json_pretty};
pub use error::{CodecError, CodecResult};
pub use mutate::{delete_at, read_at, read_at_mut, write_at};
pub use path::{KeyPath, SEPARATOR};
pub use value::Value;
