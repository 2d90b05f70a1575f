//! Automatic text-to-numeric column promotion

use crate::table::Table;
use crate::value::CellValue;

/// Default promotion threshold
pub const DEFAULT_THRESHOLD: f64 = 0.70;

/// Lowest threshold the caller may request
pub const MIN_THRESHOLD: f64 = 0.40;

/// Highest threshold the caller may request
pub const MAX_THRESHOLD: f64 = 0.95;

/// Promote text columns to numeric when enough cells parse.
///
/// A column qualifies when every non-null cell is text. Each cell is parsed
/// as a plain decimal number (locale-neutral: `.` decimal point, no grouping
/// assumed); if the fraction of successfully parsed cells over the non-null
/// cells reaches `threshold`, the column is replaced with the parsed numbers
/// and unparsable cells become null. All-null columns are never promoted.
///
/// Locale-aware interpretation (Latin `1.234,56`) is deliberately left to
/// the explicit per-column coercion: automatic promotion only trusts
/// unambiguous plain-decimal text.
pub fn infer_numeric(table: &Table, threshold: f64) -> Table {
    let threshold = threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD);
    let mut out = table.clone();

    for col in table.columns() {
        if !col.is_textual() {
            continue;
        }

        let mut non_null = 0usize;
        let mut parsed = 0usize;
        let cells: Vec<CellValue> = col
            .cells()
            .iter()
            .map(|cell| match cell {
                CellValue::Null => CellValue::Null,
                CellValue::Text(s) => {
                    non_null += 1;
                    match s.trim().parse::<f64>() {
                        Ok(n) => {
                            parsed += 1;
                            CellValue::Number(n)
                        }
                        Err(_) => CellValue::Null,
                    }
                }
                other => other.clone(),
            })
            .collect();

        if non_null > 0 && parsed as f64 / non_null as f64 >= threshold {
            out = out.with_column_cells(col.name(), cells);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use pretty_assertions::assert_eq;

    fn text_col(name: &str, vals: &[&str]) -> Column {
        Column::new(name, vals.iter().map(|v| CellValue::text(*v)).collect())
    }

    #[test]
    fn test_promotes_above_threshold() {
        let t = Table::from_columns(vec![text_col("v", &["1", "2", "x", "4"])]).unwrap();
        let out = infer_numeric(&t, 0.70);
        let cells = out.column("v").unwrap().cells();
        assert_eq!(cells[0], CellValue::Number(1.0));
        assert_eq!(cells[2], CellValue::Null);
        assert_eq!(cells[3], CellValue::Number(4.0));
    }

    #[test]
    fn test_below_threshold_left_as_text() {
        let t = Table::from_columns(vec![text_col("v", &["1", "2", "x", "4"])]).unwrap();
        let out = infer_numeric(&t, 0.80);
        assert_eq!(out, t);
    }

    #[test]
    fn test_nulls_excluded_from_denominator() {
        let t = Table::from_columns(vec![Column::new(
            "v",
            vec![
                CellValue::text("1"),
                CellValue::text("2"),
                CellValue::Null,
                CellValue::Null,
            ],
        )])
        .unwrap();
        // 2/2 parse; nulls do not drag the fraction down.
        let out = infer_numeric(&t, 0.95);
        assert_eq!(out.cell(0, "v"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_all_null_never_promoted() {
        let t = Table::from_columns(vec![Column::new(
            "v",
            vec![CellValue::Null, CellValue::Null],
        )])
        .unwrap();
        assert_eq!(infer_numeric(&t, 0.40), t);
    }

    #[test]
    fn test_numeric_column_untouched() {
        let t = Table::from_columns(vec![Column::new("v", vec![1.0.into(), 2.0.into()])]).unwrap();
        assert_eq!(infer_numeric(&t, 0.70), t);
    }

    #[test]
    fn test_threshold_clamped() {
        let t = Table::from_columns(vec![text_col("v", &["1", "x"])]).unwrap();
        // 0.5 parse rate; a runaway threshold of 0.0 clamps to 0.40.
        let out = infer_numeric(&t, 0.0);
        assert_eq!(out.cell(0, "v"), Some(&CellValue::Number(1.0)));
    }
}
