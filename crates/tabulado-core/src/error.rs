//! Error types for tabulado-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabulado-core
#[derive(Debug, Error)]
pub enum Error {
    /// File extension not in the supported set
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Column not found by name
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column length does not match the table's row count
    #[error("Column '{column}' has {actual} cells, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Duplicate column name
    #[error("Column name already exists: {0}")]
    DuplicateColumnName(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
