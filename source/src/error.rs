//! Error types for configuration and source loading.
//!
//! Everything here is a setup failure: a missing root directory or an
//! unreadable configuration file aborts the stage before any writes.
//! Per-file parse problems are not errors at this level; they are recorded
//! in a [`DefinitionSet`](crate::DefinitionSet) and the run continues.

use std::path::PathBuf;

use sprite_catalog_core::VocabularyError;
use thiserror::Error;

/// Errors that can occur while loading configuration or walking sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A configured root directory does not exist.
    #[error("directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// The configured vocabulary is unusable.
    #[error("invalid vocabulary: {}", join_errors(.0))]
    InvalidVocabulary(Vec<VocabularyError>),

    /// Any other configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn join_errors(errors: &[VocabularyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`SourceError`].
pub type Result<T> = std::result::Result<T, SourceError>;
