//! Explicit per-column type coercion

use crate::dates;
use crate::table::Table;
use crate::types::ColumnType;
use crate::value::CellValue;

/// Currency glyphs stripped before the Latin numeric parse
const CURRENCY_GLYPHS: &[char] = &['$', '€', '£', '¥'];

/// Coerce one column to a declared type, returning a new table.
///
/// Unknown column names return the table unchanged. Per-cell failures
/// become null; a single bad cell never aborts the column. Cells already
/// in the target representation pass through untouched, so re-applying a
/// coercion is idempotent.
pub fn coerce(table: &Table, column: &str, ty: ColumnType) -> Table {
    let Some(col) = table.column(column) else {
        return table.clone();
    };

    let cells: Vec<CellValue> = col
        .cells()
        .iter()
        .map(|cell| match ty {
            ColumnType::Text => coerce_text(cell),
            ColumnType::Numeric => coerce_numeric(cell, false),
            ColumnType::Currency => coerce_numeric(cell, true),
            ColumnType::Date => coerce_date(cell),
        })
        .collect();

    table.with_column_cells(column, cells)
}

fn coerce_text(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

fn coerce_numeric(cell: &CellValue, strip_currency: bool) -> CellValue {
    match cell {
        CellValue::Null => CellValue::Null,
        CellValue::Number(n) => CellValue::Number(*n),
        other => {
            let mut s = other.to_string();
            if strip_currency {
                s.retain(|c| !CURRENCY_GLYPHS.contains(&c));
            }
            parse_latin_number(&s)
                .map(CellValue::Number)
                .unwrap_or(CellValue::Null)
        }
    }
}

fn coerce_date(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Null => CellValue::Null,
        CellValue::Date(d) => CellValue::Date(*d),
        other => dates::parse_date(&other.to_string())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
    }
}

/// Parse text under the Latin/European convention: `.` is a thousands
/// separator, `,` is the decimal separator. Ordinary and non-breaking
/// spaces are removed first.
pub fn parse_latin_number(raw: &str) -> Option<f64> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}'))
        .collect();
    if compact.is_empty() {
        return None;
    }
    let normalized = compact.replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn one_col(vals: Vec<CellValue>) -> Table {
        Table::from_columns(vec![Column::new("v", vals)]).unwrap()
    }

    #[test]
    fn test_latin_number_parse() {
        assert_eq!(parse_latin_number("1.234.567,89"), Some(1234567.89));
        assert_eq!(parse_latin_number("1234"), Some(1234.0));
        assert_eq!(parse_latin_number("  2.000,00 "), Some(2000.0));
        assert_eq!(parse_latin_number("1\u{a0}500,25"), Some(1500.25));
        assert_eq!(parse_latin_number("abc"), None);
        assert_eq!(parse_latin_number(""), None);
    }

    #[test]
    fn test_numeric_coercion() {
        let t = one_col(vec![
            "1.234.567,89".into(),
            "1234".into(),
            "abc".into(),
            CellValue::Null,
        ]);
        let out = coerce(&t, "v", ColumnType::Numeric);
        let cells = out.column("v").unwrap().cells();
        assert_eq!(cells[0], CellValue::Number(1234567.89));
        assert_eq!(cells[1], CellValue::Number(1234.0));
        assert_eq!(cells[2], CellValue::Null);
        assert_eq!(cells[3], CellValue::Null);
    }

    #[test]
    fn test_numeric_coercion_idempotent() {
        let t = one_col(vec!["1.500,25".into(), "2.000,00".into()]);
        let once = coerce(&t, "v", ColumnType::Numeric);
        let twice = coerce(&once, "v", ColumnType::Numeric);
        assert_eq!(once, twice);
        assert_eq!(once.cell(0, "v"), Some(&CellValue::Number(1500.25)));
    }

    #[test]
    fn test_currency_coercion() {
        let t = one_col(vec!["$1.234,50".into(), "€ 99,90".into(), "£12".into()]);
        let out = coerce(&t, "v", ColumnType::Currency);
        let cells = out.column("v").unwrap().cells();
        assert_eq!(cells[0], CellValue::Number(1234.50));
        assert_eq!(cells[1], CellValue::Number(99.90));
        assert_eq!(cells[2], CellValue::Number(12.0));
    }

    #[test]
    fn test_date_coercion() {
        let t = one_col(vec![
            "11-ene-2002".into(),
            "2002-01-11".into(),
            "31/02/2020".into(),
        ]);
        let out = coerce(&t, "v", ColumnType::Date);
        let cells = out.column("v").unwrap().cells();
        let expected = NaiveDate::from_ymd_opt(2002, 1, 11).unwrap();
        assert_eq!(cells[0], CellValue::Date(expected));
        assert_eq!(cells[1], CellValue::Date(expected));
        assert_eq!(cells[2], CellValue::Null);
    }

    #[test]
    fn test_date_coercion_from_compact_number() {
        let t = one_col(vec![CellValue::Number(20020111.0)]);
        let out = coerce(&t, "v", ColumnType::Date);
        assert_eq!(
            out.cell(0, "v"),
            Some(&CellValue::Date(
                NaiveDate::from_ymd_opt(2002, 1, 11).unwrap()
            ))
        );
    }

    #[test]
    fn test_text_coercion() {
        let t = one_col(vec![CellValue::Number(2000.0), CellValue::Null]);
        let out = coerce(&t, "v", ColumnType::Text);
        assert_eq!(out.cell(0, "v"), Some(&CellValue::text("2000")));
        assert_eq!(out.cell(1, "v"), Some(&CellValue::Null));
    }

    #[test]
    fn test_unknown_column_is_noop() {
        let t = one_col(vec!["1".into()]);
        assert_eq!(coerce(&t, "missing", ColumnType::Numeric), t);
    }
}
