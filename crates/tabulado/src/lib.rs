//! Tabular ingestion and type normalization.
//!
//! An upload (CSV/TSV/TXT, JSON, Parquet, Feather, Stata, SPSS, SAS or
//! R) is decoded into a [`Table`], cleaned, optionally run through
//! numeric inference, coerced per-column on request and persisted as
//! Parquet with an active-dataset pointer. The member crates do the
//! work; this crate ties them together and adds the session pieces:
//! upload dispatch and the R-object cache.
//!
//! ```
//! use tabulado::prelude::*;
//!
//! let upload = Upload::new("ventas.csv", &b"Nombre;Valor\nAna;1.500,25\nLuis;2.000,00"[..]);
//! let outcome = read_upload(&upload, &ReadOptions::default()).unwrap();
//! let table = process(&outcome.table, &ProcessOptions::default());
//! let table = coerce(&table, "Valor", ColumnType::Numeric);
//! assert_eq!(table.cell(0, "Valor"), Some(&CellValue::Number(1500.25)));
//! ```

mod cache;
mod error;
mod pipeline;
pub mod prelude;
mod upload;

pub use cache::UploadCache;
pub use error::{Error, Result};
pub use pipeline::{process, ProcessOptions};
pub use upload::{read_upload, ReadOptions, ReadOutcome, Upload};

pub use tabulado_core as core;
pub use tabulado_formats as formats;
pub use tabulado_store as store;
pub use tabulado_text as text;
