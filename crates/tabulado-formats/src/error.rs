use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, Error)]
pub enum FormatError {
    /// A file did not match the structure its extension promised.
    #[error("{format} decode error: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("the file contains no tabular data")]
    Empty,

    #[error("object {0:?} not found in the file")]
    ObjectNotFound(String),

    #[error(transparent)]
    Core(#[from] tabulado_core::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Shorthand for a [`FormatError::Decode`] with a formatted message.
    pub fn decode(format: &'static str, message: impl Into<String>) -> Self {
        FormatError::Decode {
            format,
            message: message.into(),
        }
    }
}
