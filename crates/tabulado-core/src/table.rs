//! The in-memory table model

use crate::error::{Error, Result};
use crate::value::CellValue;

/// A named, ordered column of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<CellValue>,
}

impl Column {
    /// Create a column from a name and its cells
    pub fn new<S: Into<String>>(name: S, cells: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the column
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Cell values, in row order
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the column has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if every cell is null
    pub fn is_all_null(&self) -> bool {
        self.cells.iter().all(CellValue::is_null)
    }

    /// Number of non-null cells
    pub fn non_null_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_null()).count()
    }

    /// Check if every non-null cell is text.
    ///
    /// This is the precondition for auto-numeric inference; an all-null
    /// column does not qualify.
    pub fn is_textual(&self) -> bool {
        let mut seen = false;
        for cell in &self.cells {
            match cell {
                CellValue::Null => {}
                CellValue::Text(_) => seen = true,
                _ => return false,
            }
        }
        seen
    }
}

/// An ordered sequence of named columns of equal length.
///
/// A `Table` is never mutated in place by the processing pipeline: cleaning,
/// inference and coercion all return a new table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, validating that lengths agree
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for col in &columns {
                if col.len() != expected {
                    return Err(Error::ColumnLengthMismatch {
                        column: col.name().to_string(),
                        expected,
                        actual: col.len(),
                    });
                }
            }
        }
        Ok(Self { columns })
    }

    /// Build a table from column names and row-major cell data.
    ///
    /// Rows shorter than the name list are padded with nulls; rows longer
    /// than it have their extra cells dropped. Ragged text files therefore
    /// always yield a rectangular table.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let n_cols = names.len();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|n| Column::new(n, Vec::with_capacity(rows.len())))
            .collect();
        for mut row in rows {
            row.resize(n_cols, CellValue::Null);
            for (col, cell) in columns.iter_mut().zip(row) {
                col.cells.push(cell);
            }
        }
        Self { columns }
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no columns or no rows
    pub fn is_empty(&self) -> bool {
        self.n_cols() == 0 || self.n_rows() == 0
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Look up a column's position by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Get a single cell by row index and column name
    pub fn cell(&self, row: usize, name: &str) -> Option<&CellValue> {
        self.column(name).and_then(|c| c.cells().get(row))
    }

    /// One row of cells, in column order
    pub fn row(&self, idx: usize) -> Option<Vec<&CellValue>> {
        if idx >= self.n_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[idx]).collect())
    }

    /// Append a column; its length must match the current row count
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        self.insert_column(self.columns.len(), column)
    }

    /// Insert a column at a position; its length must match the row count
    pub fn insert_column(&mut self, idx: usize, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(Error::ColumnLengthMismatch {
                column: column.name().to_string(),
                expected: self.n_rows(),
                actual: column.len(),
            });
        }
        if self.column(column.name()).is_some() {
            return Err(Error::DuplicateColumnName(column.name().to_string()));
        }
        self.columns.insert(idx, column);
        Ok(())
    }

    /// Return a copy of the table with one column's cells replaced.
    ///
    /// An unknown column name returns the table unchanged; per-column
    /// operations never fail the table as a whole.
    pub fn with_column_cells(&self, name: &str, cells: Vec<CellValue>) -> Self {
        let mut out = self.clone();
        if let Some(idx) = out.column_index(name) {
            if cells.len() == out.n_rows() {
                out.columns[idx].cells = cells;
            }
        }
        out
    }

    /// Return a copy of the table with all column names replaced, in order
    pub fn with_column_names(&self, names: Vec<String>) -> Self {
        let mut out = self.clone();
        for (col, name) in out.columns.iter_mut().zip(names) {
            col.set_name(name);
        }
        out
    }

    /// Keep only the rows selected by the mask (true keeps the row)
    pub(crate) fn filter_rows(&self, keep: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let cells = c
                    .cells
                    .iter()
                    .zip(keep)
                    .filter(|(_, k)| **k)
                    .map(|(cell, _)| cell.clone())
                    .collect();
                Column::new(c.name.clone(), cells)
            })
            .collect();
        Self { columns }
    }

    /// Keep only the columns selected by the mask (true keeps the column)
    pub(crate) fn filter_columns(&self, keep: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .zip(keep)
            .filter(|(_, k)| **k)
            .map(|(c, _)| c.clone())
            .collect();
        Self { columns }
    }
}
