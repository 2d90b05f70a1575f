//! Delimited-text reader: decode bytes, pick a delimiter, build a raw table.

use tabulado_core::{CellValue, Table};

use crate::encoding;
use crate::options::TextReadOptions;
use crate::sniff::{auto_pick, sniff_delimiter, CANDIDATES};

/// A decoded text upload: the raw table plus how it was decoded.
///
/// The table here is untouched input: the first line becomes the column
/// names verbatim and blank fields become [`CellValue::Null`]. Cleaning
/// and type inference are separate, later steps.
#[derive(Debug, Clone)]
pub struct TextTable {
    pub table: Table,
    /// Delimiter actually used, `None` only for empty input.
    pub delimiter: Option<u8>,
    /// Name of the encoding that decoded the bytes.
    pub encoding: &'static str,
    pub warnings: Vec<String>,
}

/// Read a delimited-text upload. This never fails: undecodable or
/// unparseable content degrades to an empty or one-column table with a
/// warning attached, so callers can always show the user something.
pub fn read(raw: &[u8], options: &TextReadOptions) -> TextTable {
    let (text, encoding) = encoding::decode(raw);
    let mut warnings = Vec::new();

    if text.lines().all(|l| l.trim().is_empty()) {
        warnings.push("the file contains no rows".to_string());
        return TextTable {
            table: Table::new(),
            delimiter: None,
            encoding,
            warnings,
        };
    }

    let sniffed = options.delimiter.or_else(|| sniff_delimiter(&text));
    let mut delimiter = sniffed.unwrap_or_else(|| auto_pick(&text));
    let mut rows = match parse_with(&text, delimiter) {
        Ok(rows) => rows,
        Err(err) => {
            log::warn!("parse with {:?} failed: {err}", delimiter as char);
            warnings.push(format!(
                "could not parse with delimiter {:?}, retried with an automatic pick",
                delimiter as char
            ));
            delimiter = auto_pick(&text);
            // If even the automatic pick splits inconsistently, keep the
            // ragged rows rather than losing the data.
            parse_with(&text, delimiter).unwrap_or_else(|_| parse_lenient(&text, delimiter))
        }
    };

    // Degenerate single-column result: the real delimiter may just not be
    // in the candidate sample scoring. Probe the first data row for the
    // alternates and retry with the most promising one.
    if !rows.is_empty() && rows.iter().all(|r| r.len() <= 1) {
        if let Some((alt, alt_rows)) = recover_one_column(&text, &rows, delimiter, sniffed) {
            delimiter = alt;
            rows = alt_rows;
        }
    }

    if rows.iter().all(|r| r.len() <= 1) {
        warnings.push(
            "only one column detected; the delimiter may not have been recognized".to_string(),
        );
    }

    let mut iter = rows.into_iter();
    let names = iter.next().unwrap_or_default();
    let data = iter
        .map(|row| row.into_iter().map(field_to_cell).collect())
        .collect();
    TextTable {
        table: Table::from_rows(names, data),
        delimiter: Some(delimiter),
        encoding,
        warnings,
    }
}

fn field_to_cell(field: String) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(field)
    }
}

/// A data row split into more fields than the header row: the telltale of
/// a delimiter that matches the data but not the whole file.
#[derive(Debug, thiserror::Error)]
#[error("line {line} has {found} fields, the header row has {expected}")]
struct RaggedRows {
    line: usize,
    expected: usize,
    found: usize,
}

fn parse_with(text: &str, delimiter: u8) -> Result<Vec<Vec<String>>, RaggedRows> {
    let rows = parse_lenient(text, delimiter);
    if let Some(expected) = rows.first().map(Vec::len) {
        for (idx, row) in rows.iter().enumerate().skip(1) {
            if row.len() > expected {
                return Err(RaggedRows {
                    line: idx + 1,
                    expected,
                    found: row.len(),
                });
            }
        }
    }
    Ok(rows)
}

fn parse_lenient(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    reader
        .records()
        .filter_map(|record| record.ok())
        .map(|record| record.iter().map(str::to_string).collect())
        .collect()
}

/// Try the remaining candidate delimiters against a table that parsed to a
/// single column, ranked by how often each appears in the first data row.
fn recover_one_column(
    text: &str,
    rows: &[Vec<String>],
    used: u8,
    sniffed: Option<u8>,
) -> Option<(u8, Vec<Vec<String>>)> {
    let probe = rows
        .get(1)
        .or_else(|| rows.first())
        .and_then(|r| r.first())
        .map(String::as_str)
        .unwrap_or("");
    let mut alts: Vec<(u8, usize)> = CANDIDATES
        .iter()
        .copied()
        .filter(|&c| c != used)
        .map(|c| (c, probe.bytes().filter(|&b| b == c).count()))
        .collect();
    alts.sort_by(|a, b| b.1.cmp(&a.1));

    for (alt, count) in alts {
        let worth_trying =
            count >= 1 || (sniffed.is_none() && text.bytes().any(|b| b == alt));
        if !worth_trying {
            continue;
        }
        if let Ok(alt_rows) = parse_with(text, alt) {
            if alt_rows.iter().any(|r| r.len() > 1) {
                log::debug!("recovered delimiter {:?} from one-column parse", alt as char);
                return Some((alt, alt_rows));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(table: &Table, row: usize, name: &str) -> CellValue {
        table.cell(row, name).cloned().unwrap()
    }

    #[test]
    fn semicolon_file_parses_to_two_by_three() {
        let out = read(b"a;b;c\n1;2;3\n4;5;6", &TextReadOptions::new());
        assert_eq!(out.delimiter, Some(b';'));
        assert_eq!(out.table.n_rows(), 2);
        assert_eq!(out.table.n_cols(), 3);
        assert_eq!(out.table.column_names(), vec!["a", "b", "c"]);
        assert_eq!(cell(&out.table, 0, "a"), CellValue::Text("1".into()));
        assert_eq!(cell(&out.table, 1, "c"), CellValue::Text("6".into()));
    }

    #[test]
    fn comma_file_parses_identically() {
        let out = read(b"a,b,c\n1,2,3\n4,5,6", &TextReadOptions::new());
        assert_eq!(out.delimiter, Some(b','));
        assert_eq!(out.table.n_rows(), 2);
        assert_eq!(out.table.n_cols(), 3);
    }

    #[test]
    fn blank_fields_become_null() {
        let out = read(b"a;b\n1;\n;2", &TextReadOptions::new());
        assert_eq!(cell(&out.table, 0, "b"), CellValue::Null);
        assert_eq!(cell(&out.table, 1, "a"), CellValue::Null);
    }

    #[test]
    fn forced_delimiter_overrides_sniffing() {
        // The commas would otherwise win the sniff.
        let out = read(
            b"a|b,x\n1|2,y\n3|4,z",
            &TextReadOptions::new().with_delimiter(b'|'),
        );
        assert_eq!(out.delimiter, Some(b'|'));
        assert_eq!(out.table.n_cols(), 2);
        assert_eq!(cell(&out.table, 0, "b,x"), CellValue::Text("2,y".into()));
    }

    #[test]
    fn empty_input_yields_empty_table_with_warning() {
        let out = read(b"", &TextReadOptions::new());
        assert!(out.table.is_empty());
        assert_eq!(out.delimiter, None);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn single_column_file_carries_a_warning() {
        let out = read(b"nombre\nAna\nLuis", &TextReadOptions::new());
        assert_eq!(out.table.n_cols(), 1);
        assert_eq!(out.table.n_rows(), 2);
        assert!(out.warnings.iter().any(|w| w.contains("one column")));
    }

    #[test]
    fn inconsistent_split_retries_with_the_automatic_pick() {
        // Forcing `;` leaves the header whole but splits the second line
        // into more fields than it, so the parse is rejected and retried
        // with the most frequent candidate.
        let out = read(
            b"a,b\n1;x,2\n3,4",
            &TextReadOptions::new().with_delimiter(b';'),
        );
        assert_eq!(out.delimiter, Some(b','));
        assert!(out.warnings.iter().any(|w| w.contains("automatic pick")));
        assert_eq!(out.table.column_names(), vec!["a", "b"]);
        assert_eq!(out.table.n_rows(), 2);
        assert_eq!(cell(&out.table, 0, "a"), CellValue::Text("1;x".into()));
    }

    #[test]
    fn one_column_recovery_finds_the_real_delimiter() {
        // A wrongly forced delimiter collapses everything to one column;
        // the probe row still contains the real one.
        let out = read(
            b"a;b\n1;2\n3;4",
            &TextReadOptions::new().with_delimiter(b','),
        );
        assert_eq!(out.delimiter, Some(b';'));
        assert_eq!(out.table.n_cols(), 2);
    }

    #[test]
    fn windows_1252_content_is_decoded() {
        // "Regi\u{f3}n;A\u{f1}o\n1;2" encoded as Windows-1252.
        let raw: &[u8] = &[
            0x52, 0x65, 0x67, 0x69, 0xF3, 0x6E, 0x3B, 0x41, 0xF1, 0x6F, 0x0A, 0x31, 0x3B, 0x32,
        ];
        let out = read(raw, &TextReadOptions::new());
        assert_eq!(out.encoding, "windows-1252");
        assert_eq!(out.table.column_names(), vec!["Región", "Año"]);
    }

    #[test]
    fn bom_prefixed_file_reports_utf8_sig() {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        raw.extend_from_slice(b"a;b\n1;2");
        let out = read(&raw, &TextReadOptions::new());
        assert_eq!(out.encoding, "utf-8-sig");
        assert_eq!(out.table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn quoted_fields_keep_the_delimiter_inside() {
        let out = read(b"a;b\n\"x;y\";2", &TextReadOptions::new());
        assert_eq!(cell(&out.table, 0, "a"), CellValue::Text("x;y".into()));
    }
}
