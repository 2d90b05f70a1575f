//! Dataset persistence for tabulado.
//!
//! Processed tables are saved as timestamped Parquet files under a data
//! directory, and a JSON pointer (`dataset_activo.json`) records which
//! save is the active one so other tools can pick it up without
//! scanning the directory.

mod error;
mod slug;
mod store;

pub use error::{Result, StoreError};
pub use slug::safe_slug;
pub use store::{DatasetPointer, DatasetStore, SaveReceipt};
