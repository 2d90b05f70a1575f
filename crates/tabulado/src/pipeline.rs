//! The standard processing pass applied to every decoded upload.

use tabulado_core::{clean, infer_numeric, promote_header, Table, DEFAULT_THRESHOLD};

/// How to turn a raw decoded table into a working dataset.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Drop all-null rows and columns.
    pub drop_blank: bool,
    /// Promote the first data row to column names before cleaning.
    pub header_row: bool,
    /// Auto-promote mostly-numeric text columns.
    pub infer: bool,
    pub threshold: f64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            drop_blank: true,
            header_row: false,
            infer: true,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Clean and normalize a freshly decoded table.
pub fn process(table: &Table, options: &ProcessOptions) -> Table {
    let table = if options.header_row {
        promote_header(table)
    } else {
        table.clone()
    };
    let table = clean(&table, options.drop_blank);
    if options.infer {
        infer_numeric(&table, options.threshold)
    } else {
        table
    }
}
