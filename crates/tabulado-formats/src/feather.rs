//! Feather (Arrow IPC file) reading.

use std::io::Cursor;

use arrow::ipc::reader::FileReader;
use tabulado_core::Table;

use crate::arrow_convert::batches_to_table;
use crate::error::Result;

pub fn read_feather(raw: &[u8]) -> Result<Table> {
    let reader = FileReader::try_new(Cursor::new(raw), None)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    batches_to_table(&batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow_convert::table_to_batch;
    use arrow::ipc::writer::FileWriter;
    use pretty_assertions::assert_eq;
    use tabulado_core::{CellValue, Column};

    #[test]
    fn reads_an_ipc_file() {
        let table = Table::from_columns(vec![Column::new(
            "x",
            vec![CellValue::Number(1.0), CellValue::Number(2.0)],
        )])
        .unwrap();
        let batch = table_to_batch(&table).unwrap();
        let mut buf = Vec::new();
        {
            let mut writer = FileWriter::try_new(&mut buf, &batch.schema()).unwrap();
            writer.write(&batch).unwrap();
            writer.finish().unwrap();
        }
        let back = read_feather(&buf).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(read_feather(b"FEA1").is_err());
    }
}
