//! CLI command implementations.

pub mod migrate;
pub mod records;

use crate::StoreKind;
use nestdb_core::{BackendConfig, CleanupMode, Config, Language, Store, StoreError, DEFAULT_FOLDER};
use std::path::PathBuf;
use thiserror::Error;

/// Database file used by a relational store when no path is given.
pub const DEFAULT_DATABASE: &str = "nestdb.sqlite";

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The output could not be rendered.
    #[error("failed to render output: {0}")]
    Render(#[from] nestdb_codec::CodecError),
}

impl CliError {
    /// Renders the error in `language`.
    pub fn localized(&self, language: Language) -> String {
        match self {
            Self::Store(err) => err.localized(language),
            Self::Render(err) => err.to_string(),
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Which store a command runs against.
#[derive(Debug, Clone)]
pub struct Target {
    /// Backend kind.
    pub kind: StoreKind,
    /// Folder (file store) or database file (relational store).
    pub path: Option<PathBuf>,
    /// Table name, also the file name of a file store.
    pub table: String,
    /// Pretty-print the file store.
    pub readable: bool,
    /// Message language.
    pub language: Language,
}

impl Target {
    /// Builds the store configuration for this target.
    ///
    /// Cleanup runs inline since the process exits right after the command.
    pub fn config(&self) -> Config {
        let backend = match self.kind {
            StoreKind::File => BackendConfig::File {
                folder: self
                    .path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FOLDER)),
                file: self.table.clone(),
            },
            StoreKind::Relational => BackendConfig::Relational {
                path: Some(
                    self.path
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
                ),
            },
        };
        Config::new()
            .backend(backend)
            .table(self.table.clone())
            .readable(self.readable)
            .language(self.language)
            .cleanup(CleanupMode::Immediate)
            .check_for_updates(false)
    }

    /// Opens the store.
    pub async fn open(&self) -> CliResult<Store> {
        Ok(Store::open(self.config()).await?)
    }
}
