//! Parquet read and write on top of the Arrow bridge.

use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use tabulado_core::Table;

use crate::arrow_convert::{batches_to_table, table_to_batch};
use crate::error::Result;

pub fn read_parquet(raw: &[u8]) -> Result<Table> {
    let data = Bytes::copy_from_slice(raw);
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    batches_to_table(&batches)
}

/// Write a table as a single-row-group Parquet file.
pub fn write_parquet<W: std::io::Write + Send>(table: &Table, writer: W) -> Result<()> {
    let batch = table_to_batch(table)?;
    let mut writer = ArrowWriter::try_new(writer, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
