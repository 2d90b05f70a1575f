//! # tabulado-core
//!
//! Core data structures for the tabulado ingestion engine.
//!
//! This crate provides the fundamental types used throughout tabulado:
//! - [`CellValue`] - tagged cell values (null, text, number, date)
//! - [`Table`] and [`Column`] - the in-memory raw table
//! - [`clean`] and [`make_unique`] - blank removal and label normalization
//! - [`infer_numeric`] - threshold-based text-to-numeric promotion
//! - [`coerce`] and [`TypeMap`] - explicit per-column type declarations
//! - [`DataFormat`] - extension-based format detection
//!
//! ## Example
//!
//! ```rust
//! use tabulado_core::{clean, coerce, Column, ColumnType, Table};
//!
//! let raw = Table::from_columns(vec![
//!     Column::new("Valor", vec!["1.500,25".into(), "2.000,00".into()]),
//! ]).unwrap();
//!
//! let table = clean(&raw, true);
//! let typed = coerce(&table, "Valor", ColumnType::Numeric);
//! assert_eq!(typed.cell(0, "Valor").unwrap().as_number(), Some(1500.25));
//! ```

pub mod clean;
pub mod coerce;
pub mod columns;
pub mod dates;
pub mod error;
pub mod format;
pub mod infer;
pub mod table;
pub mod types;
pub mod value;

// Re-exports for convenience
pub use clean::{clean, promote_header};
pub use coerce::{coerce, parse_latin_number};
pub use columns::make_unique;
pub use dates::parse_date;
pub use error::{Error, Result};
pub use format::DataFormat;
pub use infer::{infer_numeric, DEFAULT_THRESHOLD, MAX_THRESHOLD, MIN_THRESHOLD};
pub use table::{Column, Table};
pub use types::{ColumnType, TypeMap};
pub use value::CellValue;
