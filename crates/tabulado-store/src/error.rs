use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] tabulado_formats::FormatError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
