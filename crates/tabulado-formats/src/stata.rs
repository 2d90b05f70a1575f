//! Native Stata `.dta` reader for the modern tagged releases (117 and
//! 118, i.e. Stata 13 and newer).
//!
//! The file is a sequence of XML-like tagged sections; the `<map>`
//! section carries absolute offsets to every other section, so after the
//! header we jump straight to the pieces we need: variable types,
//! variable names, display formats and the data block.

use chrono::NaiveDate;
use tabulado_core::{CellValue, Column, Table};

use crate::binary::{fixed_string, Cursor};
use crate::error::{FormatError, Result};

const FORMAT: &str = "stata";

// Type codes from the dta specification.
const TYPE_STRL: u16 = 32768;
const TYPE_DOUBLE: u16 = 65526;
const TYPE_FLOAT: u16 = 65527;
const TYPE_LONG: u16 = 65528;
const TYPE_INT: u16 = 65529;
const TYPE_BYTE: u16 = 65530;
const MAX_STR_WIDTH: u16 = 2045;

// Values at or above these are missing-value sentinels.
const MISSING_BYTE: i8 = 101;
const MISSING_INT: i16 = 32741;
const MISSING_LONG: i32 = 2_147_483_621;
const MISSING_FLOAT: f32 = 1.701e38;
const MISSING_DOUBLE: f64 = 8.988e307;

fn stata_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1960, 1, 1).unwrap()
}

pub fn read_stata(raw: &[u8]) -> Result<Table> {
    let mut c = Cursor::new(FORMAT, raw);
    c.expect(b"<stata_dta>")?;
    c.expect(b"<header>")?;
    c.expect(b"<release>")?;
    let release: u32 = std::str::from_utf8(c.bytes(3)?)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| FormatError::decode(FORMAT, "unreadable release field"))?;
    if release != 117 && release != 118 {
        return Err(FormatError::decode(
            FORMAT,
            format!("release {release} is not supported (expected 117 or 118)"),
        ));
    }
    c.expect(b"</release>")?;
    c.expect(b"<byteorder>")?;
    match c.bytes(3)? {
        b"LSF" => c.big_endian = false,
        b"MSF" => c.big_endian = true,
        other => {
            return Err(FormatError::decode(
                FORMAT,
                format!("unknown byte order {:?}", String::from_utf8_lossy(other)),
            ))
        }
    }
    c.expect(b"</byteorder>")?;
    c.expect(b"<K>")?;
    let n_vars = c.u16()? as usize;
    c.expect(b"</K>")?;
    c.expect(b"<N>")?;
    let n_obs = if release == 117 {
        c.u32()? as usize
    } else {
        c.u64()? as usize
    };
    c.expect(b"</N>")?;

    // Skip label and timestamp, then land on the map.
    c.expect(b"<label>")?;
    let label_len = if release == 117 {
        c.u8()? as usize
    } else {
        c.u16()? as usize
    };
    c.skip(label_len)?;
    c.expect(b"</label>")?;
    c.expect(b"<timestamp>")?;
    let ts_len = c.u8()? as usize;
    c.skip(ts_len)?;
    c.expect(b"</timestamp>")?;
    c.expect(b"</header>")?;
    c.expect(b"<map>")?;
    let mut map = [0u64; 14];
    for slot in &mut map {
        *slot = c.u64()?;
    }

    // Section offsets we need: 2 = variable_types, 3 = varnames,
    // 5 = formats, 9 = data.
    c.seek(map[2] as usize)?;
    c.expect(b"<variable_types>")?;
    let mut types = Vec::with_capacity(n_vars);
    for _ in 0..n_vars {
        types.push(c.u16()?);
    }

    let name_width = if release == 117 { 33 } else { 129 };
    c.seek(map[3] as usize)?;
    c.expect(b"<varnames>")?;
    let mut names = Vec::with_capacity(n_vars);
    for _ in 0..n_vars {
        names.push(fixed_string(c.bytes(name_width)?));
    }

    let format_width = if release == 117 { 49 } else { 57 };
    c.seek(map[5] as usize)?;
    c.expect(b"<formats>")?;
    let mut is_date = Vec::with_capacity(n_vars);
    for _ in 0..n_vars {
        let fmt = fixed_string(c.bytes(format_width)?);
        is_date.push(fmt.starts_with("%td") || fmt.starts_with("%d"));
    }

    c.seek(map[9] as usize)?;
    c.expect(b"<data>")?;
    let mut cells: Vec<Vec<CellValue>> = vec![Vec::with_capacity(n_obs); n_vars];
    let mut warned_strl = false;
    for _ in 0..n_obs {
        for (var, &ty) in types.iter().enumerate() {
            let cell = match ty {
                TYPE_BYTE => {
                    let v = c.i8()?;
                    numeric_cell(v >= MISSING_BYTE, v as f64, is_date[var])
                }
                TYPE_INT => {
                    let v = c.i16()?;
                    numeric_cell(v >= MISSING_INT, v as f64, is_date[var])
                }
                TYPE_LONG => {
                    let v = c.i32()?;
                    numeric_cell(v >= MISSING_LONG, v as f64, is_date[var])
                }
                TYPE_FLOAT => {
                    let v = c.f32()?;
                    numeric_cell(v.is_nan() || v >= MISSING_FLOAT, v as f64, is_date[var])
                }
                TYPE_DOUBLE => {
                    let v = c.f64()?;
                    numeric_cell(v.is_nan() || v >= MISSING_DOUBLE, v, is_date[var])
                }
                TYPE_STRL => {
                    // Long strings live in a separate section keyed by the
                    // (v, o) pair read here; not decoded.
                    c.skip(8)?;
                    if !warned_strl {
                        log::warn!("strL variable {:?} not decoded, cells set to null", names[var]);
                        warned_strl = true;
                    }
                    CellValue::Null
                }
                width if width >= 1 && width <= MAX_STR_WIDTH => {
                    let s = fixed_string(c.bytes(width as usize)?);
                    if s.trim().is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::Text(s)
                    }
                }
                other => {
                    return Err(FormatError::decode(
                        FORMAT,
                        format!("unknown variable type code {other}"),
                    ))
                }
            };
            cells[var].push(cell);
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| Column::new(name, cells))
        .collect();
    Ok(Table::from_columns(columns)?)
}

fn numeric_cell(missing: bool, value: f64, date: bool) -> CellValue {
    if missing {
        CellValue::Null
    } else if date {
        stata_epoch()
            .checked_add_signed(chrono::Duration::days(value as i64))
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null)
    } else {
        CellValue::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct DtaBuilder {
        buf: Vec<u8>,
        map: [u64; 14],
        map_pos: usize,
    }

    impl DtaBuilder {
        fn new(n_vars: u16, n_obs: u32) -> Self {
            let mut buf = Vec::new();
            buf.extend_from_slice(b"<stata_dta><header><release>117</release>");
            buf.extend_from_slice(b"<byteorder>LSF</byteorder>");
            buf.extend_from_slice(b"<K>");
            buf.extend_from_slice(&n_vars.to_le_bytes());
            buf.extend_from_slice(b"</K><N>");
            buf.extend_from_slice(&n_obs.to_le_bytes());
            buf.extend_from_slice(b"</N><label>");
            buf.push(0); // empty label
            buf.extend_from_slice(b"</label><timestamp>");
            buf.push(0);
            buf.extend_from_slice(b"</timestamp></header><map>");
            let map_pos = buf.len();
            buf.extend_from_slice(&[0u8; 14 * 8]);
            buf.extend_from_slice(b"</map>");
            Self {
                buf,
                map: [0; 14],
                map_pos,
            }
        }

        fn section(&mut self, slot: usize, tag: &str, body: &[u8]) {
            self.map[slot] = self.buf.len() as u64;
            self.buf.extend_from_slice(format!("<{tag}>").as_bytes());
            self.buf.extend_from_slice(body);
            self.buf.extend_from_slice(format!("</{tag}>").as_bytes());
        }

        fn finish(mut self) -> Vec<u8> {
            self.map[12] = self.buf.len() as u64;
            self.buf.extend_from_slice(b"</stata_dta>");
            self.map[13] = self.buf.len() as u64;
            for (i, v) in self.map.iter().enumerate() {
                self.buf[self.map_pos + i * 8..self.map_pos + (i + 1) * 8]
                    .copy_from_slice(&v.to_le_bytes());
            }
            self.buf
        }
    }

    fn padded(name: &str, width: usize) -> Vec<u8> {
        let mut out = name.as_bytes().to_vec();
        out.resize(width, 0);
        out
    }

    fn sample_dta() -> Vec<u8> {
        let mut b = DtaBuilder::new(3, 2);

        // double "valor", str4 "nombre", long %td "fecha"
        let mut types = Vec::new();
        types.extend_from_slice(&TYPE_DOUBLE.to_le_bytes());
        types.extend_from_slice(&4u16.to_le_bytes());
        types.extend_from_slice(&TYPE_LONG.to_le_bytes());
        b.section(2, "variable_types", &types);

        let mut names = Vec::new();
        names.extend(padded("valor", 33));
        names.extend(padded("nombre", 33));
        names.extend(padded("fecha", 33));
        b.section(3, "varnames", &names);

        let mut formats = Vec::new();
        formats.extend(padded("%10.2f", 49));
        formats.extend(padded("%4s", 49));
        formats.extend(padded("%td", 49));
        b.section(5, "formats", &formats);

        let mut data = Vec::new();
        // row 0: 1500.25, "Ana", 1960-01-11 (day 10)
        data.extend_from_slice(&1500.25f64.to_le_bytes());
        data.extend(padded("Ana", 4));
        data.extend_from_slice(&10i32.to_le_bytes());
        // row 1: missing double, "Luis", missing long
        data.extend_from_slice(&f64::from_bits(0x7fe0_0000_0000_0000).to_le_bytes());
        data.extend(padded("Luis", 4));
        data.extend_from_slice(&MISSING_LONG.to_le_bytes());
        b.section(9, "data", &data);

        b.finish()
    }

    #[test]
    fn reads_numbers_strings_and_dates() {
        let table = read_stata(&sample_dta()).unwrap();
        assert_eq!(table.column_names(), vec!["valor", "nombre", "fecha"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.cell(0, "valor"), Some(&CellValue::Number(1500.25)));
        assert_eq!(table.cell(0, "nombre"), Some(&CellValue::Text("Ana".into())));
        assert_eq!(
            table.cell(0, "fecha"),
            Some(&CellValue::Date(NaiveDate::from_ymd_opt(1960, 1, 11).unwrap()))
        );
    }

    #[test]
    fn missing_sentinels_become_null() {
        let table = read_stata(&sample_dta()).unwrap();
        assert_eq!(table.cell(1, "valor"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "fecha"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "nombre"), Some(&CellValue::Text("Luis".into())));
    }

    #[test]
    fn old_releases_are_rejected() {
        // Release 115 files start with a bare version byte, not tags.
        assert!(read_stata(&[0x73, 0x02, 0x01, 0x00]).is_err());
    }

    #[test]
    fn truncated_file_is_an_error() {
        let bytes = sample_dta();
        assert!(read_stata(&bytes[..bytes.len() / 2]).is_err());
    }
}
