use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tabulado_core::Error),

    #[error(transparent)]
    Format(#[from] tabulado_formats::FormatError),

    #[error(transparent)]
    Store(#[from] tabulado_store::StoreError),
}
