//! Error types for the NestDB store.

use crate::messages::{Language, Message};
use nestdb_codec::CodecError;
use nestdb_storage::StorageError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Soft not-found is never an error: reads return `None` or `false`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is empty or has an empty segment.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A numeric argument is not usable.
    #[error("invalid number: {message}")]
    InvalidNumber {
        /// Description of the problem.
        message: String,
    },

    /// A blank value was written while the no-blank-data policy is on.
    #[error("blank value rejected for key {key:?}")]
    BlankData {
        /// The key being written.
        key: String,
    },

    /// The backend failed.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] StorageError),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid number error.
    pub fn invalid_number(message: impl Into<String>) -> Self {
        Self::InvalidNumber {
            message: message.into(),
        }
    }

    /// Creates a blank data error.
    pub fn blank_data(key: impl Into<String>) -> Self {
        Self::BlankData { key: key.into() }
    }

    /// Returns true for argument errors raised before any backend call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. } | Self::InvalidNumber { .. } | Self::BlankData { .. }
        )
    }

    /// Renders the error for end users in the given language.
    pub fn localized(&self, language: Language) -> String {
        match self {
            Self::InvalidKey { key, .. } => Message::BlankName { key }.render(language),
            Self::InvalidNumber { message } => {
                Message::BlankNumber { detail: message }.render(language)
            }
            Self::BlankData { key } => Message::BlankData { key }.render(language),
            Self::BackendUnavailable(err) => Message::BackendFailed {
                detail: &err.to_string(),
            }
            .render(language),
            Self::Closed => Message::Closed.render(language),
        }
    }
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidKey { key, reason } => Self::InvalidKey { key, reason },
            other => Self::BackendUnavailable(StorageError::Codec(other)),
        }
    }
}
