//! Error types for catalog store operations.
//!
//! Distinguishes row-level failures, which the writer logs and skips, from
//! everything else, which aborts the current transaction.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during catalog store operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Migration lifecycle operation failure.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// A reference row the writer depends on is missing (e.g. an asset whose
    /// layer keyword was never seeded).
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// The sheet-type pattern used for file linking could not be built.
    #[error("pattern error: {0}")]
    PatternError(#[from] regex::Error),
}

impl SqliteError {
    /// Returns `true` for failures confined to a single row.
    ///
    /// Constraint violations that `INSERT OR IGNORE` does not absorb (foreign
    /// keys) and unresolved references leave the transaction usable.
    /// Anything else, such as an I/O error or a full disk, does not.
    pub fn is_row_level(&self) -> bool {
        match self {
            SqliteError::DatabaseError(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == ErrorCode::ConstraintViolation
            }
            SqliteError::UnresolvedReference(_) => true,
            _ => false,
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
