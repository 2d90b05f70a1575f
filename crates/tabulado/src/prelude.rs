//! Convenient single import for the common workflow.
//!
//! ```
//! use tabulado::prelude::*;
//!
//! let upload = Upload::new("datos.csv", &b"Nombre;Valor\nAna;1\nLuis;2"[..]);
//! let outcome = read_upload(&upload, &ReadOptions::default()).unwrap();
//! let table = process(&outcome.table, &ProcessOptions::default());
//! assert_eq!(table.n_rows(), 2);
//! ```

pub use crate::cache::UploadCache;
pub use crate::error::{Error, Result};
pub use crate::pipeline::{process, ProcessOptions};
pub use crate::upload::{read_upload, ReadOptions, ReadOutcome, Upload};
pub use tabulado_core::{
    clean, coerce, infer_numeric, parse_date, promote_header, CellValue, Column, ColumnType,
    DataFormat, Table, TypeMap,
};
pub use tabulado_formats::RObjects;
pub use tabulado_store::{DatasetPointer, DatasetStore, SaveReceipt};
