//! Conversion between [`Table`] and Arrow record batches.
//!
//! Outbound, every column becomes one of three Arrow types: `Float64`
//! for all-numeric columns, `Date32` for all-date columns, and `Utf8`
//! for everything else (mixed columns are stringified). Inbound accepts
//! the much wider range of types found in Parquet and Feather files in
//! the wild and folds them into the same three cell kinds.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, LargeStringArray, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::NaiveDate;
use tabulado_core::{CellValue, Column, Table};

use crate::error::Result;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

/// Convert a table into a single record batch.
pub fn table_to_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.n_cols());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.n_cols());
    for column in table.columns() {
        let (data_type, array) = column_to_array(column);
        fields.push(Field::new(column.name(), data_type, true));
        arrays.push(array);
    }
    let schema = Arc::new(Schema::new(fields));
    let options = RecordBatchOptions::new().with_row_count(Some(table.n_rows()));
    Ok(RecordBatch::try_new_with_options(schema, arrays, &options)?)
}

fn column_to_array(column: &Column) -> (DataType, ArrayRef) {
    let cells = column.cells();
    let non_null = cells.iter().filter(|c| !c.is_null());
    if column.non_null_count() > 0 {
        if non_null.clone().all(|c| matches!(c, CellValue::Number(_))) {
            let values: Float64Array = cells.iter().map(CellValue::as_number).collect();
            return (DataType::Float64, Arc::new(values));
        }
        if non_null.clone().all(|c| matches!(c, CellValue::Date(_))) {
            let values: Date32Array = cells
                .iter()
                .map(|c| {
                    c.as_date()
                        .map(|d| (d - epoch()).num_days() as i32)
                })
                .collect();
            return (DataType::Date32, Arc::new(values));
        }
    }
    let values: StringArray = cells
        .iter()
        .map(|c| match c {
            CellValue::Null => None,
            other => Some(other.to_string()),
        })
        .collect();
    (DataType::Utf8, Arc::new(values))
}

/// Convert a record batch into table columns, appending to `table`.
pub fn batch_to_table(batch: &RecordBatch) -> Result<Table> {
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
        columns.push(Column::new(field.name().as_str(), array_to_cells(array)?));
    }
    Ok(Table::from_columns(columns)?)
}

/// Convert several batches (one file's worth) into a single table.
pub fn batches_to_table(batches: &[RecordBatch]) -> Result<Table> {
    match batches {
        [] => Ok(Table::new()),
        [first, rest @ ..] => {
            let schema = first.schema();
            let merged = arrow::compute::concat_batches(&schema, std::iter::once(first).chain(rest))?;
            batch_to_table(&merged)
        }
    }
}

macro_rules! numeric_cells {
    ($array:expr, $ty:ty) => {{
        let typed = $array.as_any().downcast_ref::<$ty>().unwrap();
        (0..typed.len())
            .map(|i| {
                if typed.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Number(typed.value(i) as f64)
                }
            })
            .collect()
    }};
}

fn array_to_cells(array: &ArrayRef) -> Result<Vec<CellValue>> {
    let cells: Vec<CellValue> = match array.data_type() {
        DataType::Int8 => numeric_cells!(array, Int8Array),
        DataType::Int16 => numeric_cells!(array, Int16Array),
        DataType::Int32 => numeric_cells!(array, Int32Array),
        DataType::Int64 => numeric_cells!(array, Int64Array),
        DataType::UInt8 => numeric_cells!(array, UInt8Array),
        DataType::UInt16 => numeric_cells!(array, UInt16Array),
        DataType::UInt32 => numeric_cells!(array, UInt32Array),
        DataType::UInt64 => numeric_cells!(array, UInt64Array),
        DataType::Float32 => numeric_cells!(array, Float32Array),
        DataType::Float64 => numeric_cells!(array, Float64Array),
        DataType::Boolean => {
            let typed = array.as_any().downcast_ref::<BooleanArray>().unwrap();
            (0..typed.len())
                .map(|i| {
                    if typed.is_null(i) {
                        CellValue::Null
                    } else {
                        CellValue::Number(if typed.value(i) { 1.0 } else { 0.0 })
                    }
                })
                .collect()
        }
        DataType::Utf8 => string_cells(array.as_any().downcast_ref::<StringArray>().unwrap()),
        DataType::LargeUtf8 => {
            string_cells(array.as_any().downcast_ref::<LargeStringArray>().unwrap())
        }
        DataType::Date32 => {
            let typed = array.as_any().downcast_ref::<Date32Array>().unwrap();
            (0..typed.len())
                .map(|i| {
                    if typed.is_null(i) {
                        CellValue::Null
                    } else {
                        date_from_days(typed.value(i) as i64)
                    }
                })
                .collect()
        }
        DataType::Date64 => {
            let typed = array.as_any().downcast_ref::<Date64Array>().unwrap();
            (0..typed.len())
                .map(|i| {
                    if typed.is_null(i) {
                        CellValue::Null
                    } else {
                        date_from_days(typed.value(i) / 86_400_000)
                    }
                })
                .collect()
        }
        DataType::Timestamp(unit, _) => timestamp_cells(array, unit)?,
        // Anything exotic (decimals, lists, structs) falls back to the
        // textual rendering Arrow itself uses.
        _ => {
            let options = FormatOptions::default();
            let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
            (0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        Ok(CellValue::Null)
                    } else {
                        Ok(CellValue::Text(formatter.value(i).try_to_string()?))
                    }
                })
                .collect::<Result<Vec<_>>>()?
        }
    };
    Ok(cells)
}

fn string_cells<A>(typed: &A) -> Vec<CellValue>
where
    A: Array,
    for<'a> &'a A: IntoIterator<Item = Option<&'a str>>,
{
    typed
        .into_iter()
        .map(|v| match v {
            None => CellValue::Null,
            Some(s) if s.trim().is_empty() => CellValue::Null,
            Some(s) => CellValue::Text(s.to_string()),
        })
        .collect()
}

fn timestamp_cells(array: &ArrayRef, unit: &TimeUnit) -> Result<Vec<CellValue>> {
    let seconds: Vec<Option<i64>> = match unit {
        TimeUnit::Second => {
            let typed = array
                .as_any()
                .downcast_ref::<TimestampSecondArray>()
                .unwrap();
            (0..typed.len())
                .map(|i| (!typed.is_null(i)).then(|| typed.value(i)))
                .collect()
        }
        TimeUnit::Millisecond => {
            let typed = array
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .unwrap();
            (0..typed.len())
                .map(|i| (!typed.is_null(i)).then(|| typed.value(i) / 1_000))
                .collect()
        }
        TimeUnit::Microsecond => {
            let typed = array
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .unwrap();
            (0..typed.len())
                .map(|i| (!typed.is_null(i)).then(|| typed.value(i) / 1_000_000))
                .collect()
        }
        TimeUnit::Nanosecond => {
            let typed = array
                .as_any()
                .downcast_ref::<TimestampNanosecondArray>()
                .unwrap();
            (0..typed.len())
                .map(|i| (!typed.is_null(i)).then(|| typed.value(i) / 1_000_000_000))
                .collect()
        }
    };
    Ok(seconds
        .into_iter()
        .map(|s| match s {
            None => CellValue::Null,
            Some(secs) => date_from_days(secs.div_euclid(86_400)),
        })
        .collect())
}

fn date_from_days(days: i64) -> CellValue {
    epoch()
        .checked_add_signed(chrono::Duration::days(days))
        .map(CellValue::Date)
        .unwrap_or(CellValue::Null)
}
