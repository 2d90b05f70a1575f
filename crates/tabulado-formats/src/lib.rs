//! Structured and binary format decoders for tabulado.
//!
//! Everything here turns raw uploaded bytes into a
//! [`tabulado_core::Table`]: JSON documents, Parquet, Feather (Arrow
//! IPC), Stata `.dta`, SPSS `.sav`, SAS `.sas7bdat` and R
//! `.rds`/`.rda` files. The statistical formats are decoded natively;
//! Parquet and Feather ride on the `arrow`/`parquet` crates through a
//! shared `Table` <-> `RecordBatch` conversion.

mod arrow_convert;
mod binary;
mod error;
mod feather;
mod json;
mod parquet_io;
mod rdata;
mod sas;
mod spss;
mod stata;

pub use arrow_convert::{batch_to_table, batches_to_table, table_to_batch};
pub use error::{FormatError, Result};
pub use feather::read_feather;
pub use json::read_json;
pub use parquet_io::{read_parquet, write_parquet};
pub use rdata::{read_rdata, read_rds, RObjects};
pub use sas::read_sas;
pub use spss::read_spss;
pub use stata::read_stata;
