//! Table cleaning: blank row/column removal and label normalization

use crate::columns::make_unique;
use crate::table::Table;
use crate::value::CellValue;

/// Clean a freshly decoded table.
///
/// With `drop_blank`, rows that are entirely null are removed first, then
/// columns that are entirely null (evaluated on the row-filtered table).
/// Column labels are always rewritten through [`make_unique`], whether or
/// not blanks were dropped. Applying `clean` twice is a no-op.
pub fn clean(table: &Table, drop_blank: bool) -> Table {
    let mut out = table.clone();

    if drop_blank {
        let keep_rows: Vec<bool> = (0..out.n_rows())
            .map(|i| {
                out.columns()
                    .iter()
                    .any(|c| !c.cells()[i].is_null())
            })
            .collect();
        out = out.filter_rows(&keep_rows);

        let keep_cols: Vec<bool> = out.columns().iter().map(|c| !c.is_all_null()).collect();
        out = out.filter_columns(&keep_cols);
    }

    let names: Vec<String> = out
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    out.with_column_names(make_unique(&names))
}

/// Use the first data row as the column labels and drop it.
///
/// Matches the "first row is the header" option for sources that arrive
/// with generic labels. Tables with fewer than two rows are returned
/// unchanged.
pub fn promote_header(table: &Table) -> Table {
    if table.n_rows() < 2 {
        return table.clone();
    }

    let raw_names: Vec<String> = table
        .columns()
        .iter()
        .map(|c| match &c.cells()[0] {
            CellValue::Null => String::new(),
            other => other.to_string(),
        })
        .collect();

    let keep_rows: Vec<bool> = (0..table.n_rows()).map(|i| i != 0).collect();
    table
        .filter_rows(&keep_rows)
        .with_column_names(make_unique(&raw_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use pretty_assertions::assert_eq;

    fn dirty() -> Table {
        Table::from_columns(vec![
            Column::new("a", vec![1.0.into(), CellValue::Null, 3.0.into()]),
            Column::new("", vec!["x".into(), CellValue::Null, CellValue::Null]),
            Column::new(
                "vacia",
                vec![CellValue::Null, CellValue::Null, CellValue::Null],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_clean_drops_blank_rows_and_columns() {
        let t = clean(&dirty(), true);
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.column_names(), vec!["a", "col_2"]);
    }

    #[test]
    fn test_clean_without_drop_only_renames() {
        let t = clean(&dirty(), false);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.n_cols(), 3);
        assert_eq!(t.column_names(), vec!["a", "col_2", "vacia"]);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean(&dirty(), true);
        let twice = clean(&once, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_promote_header() {
        let t = Table::from_columns(vec![
            Column::new("col_1", vec!["Nombre".into(), "Ana".into()]),
            Column::new("col_2", vec!["Valor".into(), "1".into()]),
        ])
        .unwrap();
        let promoted = promote_header(&t);
        assert_eq!(promoted.column_names(), vec!["Nombre", "Valor"]);
        assert_eq!(promoted.n_rows(), 1);
        assert_eq!(promoted.cell(0, "Nombre"), Some(&CellValue::text("Ana")));
    }

    #[test]
    fn test_promote_header_needs_two_rows() {
        let t = Table::from_columns(vec![Column::new("col_1", vec!["solo".into()])]).unwrap();
        assert_eq!(promote_header(&t), t);
    }
}
