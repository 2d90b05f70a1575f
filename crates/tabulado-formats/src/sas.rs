//! Native SAS `.sas7bdat` reader for uncompressed files.
//!
//! The file is a header followed by fixed-size pages. Metadata lives in
//! signed subheaders scattered across meta and mix pages: row size,
//! column count, a shared text pool, column-name pointers into that pool
//! and per-column attributes (offset within a row, byte width, type).
//! Data rows are fixed-width records packed into mix and data pages.
//! Both the 32-bit and 64-bit layouts are handled; compressed files are
//! rejected.

use tabulado_core::{CellValue, Column, Table};

use crate::binary::{fixed_string, Cursor};
use crate::error::{FormatError, Result};

const FORMAT: &str = "sas";

const MAGIC: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC2, 0xEA, 0x81,
    0x60, 0xB3, 0x14, 0x11, 0xCF, 0xBD, 0x92, 0x08, 0x00, 0x09, 0xC7, 0x31, 0x8C, 0x18, 0x1F,
    0x10, 0x11,
];

// Subheader signatures, folded to their low 32 bits.
const SIG_ROW_SIZE: u32 = 0xF7F7_F7F7;
const SIG_COLUMN_SIZE: u32 = 0xF6F6_F6F6;
const SIG_COLUMN_TEXT: u32 = 0xFFFF_FFFD;
const SIG_COLUMN_NAME: u32 = 0xFFFF_FFFF;
const SIG_COLUMN_ATTRS: u32 = 0xFFFF_FFFC;

const PAGE_TYPE_DATA: [u16; 2] = [256, 384];
const PAGE_TYPE_MIX: [u16; 2] = [512, 640];

const COMPRESSION_RLE: u8 = 4;

const COL_TYPE_NUMERIC: u8 = 1;
const COL_TYPE_CHAR: u8 = 2;

struct ColumnMeta {
    name: String,
    data_offset: usize,
    width: usize,
    kind: u8,
}

struct RowRegion {
    start: usize,
    /// Exact row count for data pages, free-space capacity for mix pages.
    exact: Option<usize>,
    page_end: usize,
}

pub fn read_sas(raw: &[u8]) -> Result<Table> {
    if raw.len() < 300 || raw[..32] != MAGIC {
        return Err(FormatError::decode(FORMAT, "not a sas7bdat file"));
    }
    let u64_layout = raw[32] == 0x33;
    let pad = if raw[35] == 0x33 { 4 } else { 0 };
    let big_endian = raw[37] != 0x01;
    let int_len = if u64_layout { 8 } else { 4 };
    let bit_offset = if u64_layout { 32 } else { 16 };
    let pointer_len = if u64_layout { 24 } else { 12 };

    let mut c = Cursor::new(FORMAT, raw);
    c.big_endian = big_endian;
    c.seek(196 + pad)?;
    let header_length = c.u32()? as usize;
    let page_size = c.u32()? as usize;
    let page_count = if u64_layout {
        c.u64()? as usize
    } else {
        c.u32()? as usize
    };

    // Pass 1: collect subheader slices and row regions across all pages.
    let mut subheaders: Vec<(u32, usize, usize)> = Vec::new(); // (sig, abs offset, length)
    let mut regions: Vec<RowRegion> = Vec::new();
    for page in 0..page_count {
        let page_start = header_length + page * page_size;
        if page_start + page_size > raw.len() {
            return Err(FormatError::decode(FORMAT, "truncated page"));
        }
        c.seek(page_start + bit_offset)?;
        let page_type = c.u16()?;
        let block_count = c.u16()?;
        let subheader_count = c.u16()?;
        c.skip(2)?;

        for i in 0..subheader_count as usize {
            c.seek(page_start + bit_offset + 8 + i * pointer_len)?;
            let (offset, length) = if u64_layout {
                (c.u64()? as usize, c.u64()? as usize)
            } else {
                (c.u32()? as usize, c.u32()? as usize)
            };
            let compression = c.u8()?;
            if compression == COMPRESSION_RLE {
                return Err(FormatError::decode(
                    FORMAT,
                    "compressed sas7bdat files are not supported",
                ));
            }
            if length == 0 {
                continue;
            }
            let abs = page_start + offset;
            let mut sig_cursor = Cursor::new(FORMAT, raw);
            sig_cursor.big_endian = big_endian;
            sig_cursor.seek(abs)?;
            let sig = sig_cursor.u32()?;
            subheaders.push((sig, abs, length));
        }

        let is_data = PAGE_TYPE_DATA.contains(&page_type);
        let is_mix = PAGE_TYPE_MIX.contains(&page_type);
        if is_data || is_mix {
            let raw_start = page_start
                + bit_offset
                + 8
                + if is_mix {
                    subheader_count as usize * pointer_len
                } else {
                    0
                };
            let start = (raw_start + 7) & !7;
            regions.push(RowRegion {
                start,
                exact: is_data.then_some(block_count as usize),
                page_end: page_start + page_size,
            });
        }
    }

    // Pass 2: assemble metadata.
    let (rs_abs, _) = find_subheader(&subheaders, SIG_ROW_SIZE)?;
    let mut rs = cursor_at(raw, rs_abs + 5 * int_len, big_endian)?;
    let row_length = read_word(&mut rs, u64_layout)?;
    let row_count = read_word(&mut rs, u64_layout)?;

    let (cs_abs, _) = find_subheader(&subheaders, SIG_COLUMN_SIZE)?;
    let mut cs = cursor_at(raw, cs_abs + int_len, big_endian)?;
    let n_cols = read_word(&mut cs, u64_layout)?;

    let text_pools: Vec<&[u8]> = subheaders
        .iter()
        .filter(|(sig, _, _)| *sig == SIG_COLUMN_TEXT)
        .map(|&(_, abs, _)| {
            let mut t = cursor_at(raw, abs + int_len, big_endian)?;
            let size = t.u16()? as usize;
            t.seek(abs + int_len)?;
            t.bytes(size)
        })
        .collect::<Result<_>>()?;

    let mut names: Vec<String> = Vec::with_capacity(n_cols);
    for &(sig, abs, length) in &subheaders {
        if sig != SIG_COLUMN_NAME {
            continue;
        }
        let count = length.saturating_sub(2 * int_len + 12) / 8;
        for i in 0..count {
            let mut p = cursor_at(raw, abs + int_len + 8 * (i + 1), big_endian)?;
            let pool_idx = p.u16()? as usize;
            let name_offset = p.u16()? as usize;
            let name_length = p.u16()? as usize;
            let pool = text_pools.get(pool_idx).ok_or_else(|| {
                FormatError::decode(FORMAT, "column name references a missing text pool")
            })?;
            let slice = pool
                .get(name_offset..name_offset + name_length)
                .ok_or_else(|| FormatError::decode(FORMAT, "column name offset out of range"))?;
            names.push(fixed_string(slice).trim_end().to_string());
        }
    }

    let mut attrs: Vec<(usize, usize, u8)> = Vec::with_capacity(n_cols);
    for &(sig, abs, length) in &subheaders {
        if sig != SIG_COLUMN_ATTRS {
            continue;
        }
        let count = length.saturating_sub(2 * int_len + 12) / (int_len + 8);
        for i in 0..count {
            let base = abs + int_len + 8 + i * (int_len + 8);
            let mut p = cursor_at(raw, base, big_endian)?;
            let data_offset = read_word(&mut p, u64_layout)?;
            let width = p.u32()? as usize;
            p.skip(2)?;
            let kind = p.u8()?;
            attrs.push((data_offset, width, kind));
        }
    }

    if names.len() != n_cols || attrs.len() != n_cols {
        return Err(FormatError::decode(
            FORMAT,
            format!(
                "metadata mismatch: {} columns, {} names, {} attribute entries",
                n_cols,
                names.len(),
                attrs.len()
            ),
        ));
    }
    let columns: Vec<ColumnMeta> = names
        .into_iter()
        .zip(attrs)
        .map(|(name, (data_offset, width, kind))| ColumnMeta {
            name,
            data_offset,
            width,
            kind,
        })
        .collect();

    // Pass 3: unpack rows.
    if row_length == 0 {
        return Err(FormatError::decode(FORMAT, "row length is zero"));
    }
    let mut cells: Vec<Vec<CellValue>> = columns.iter().map(|_| Vec::new()).collect();
    let mut remaining = row_count;
    for region in &regions {
        let capacity = region.page_end.saturating_sub(region.start) / row_length;
        let here = region.exact.unwrap_or(capacity).min(capacity).min(remaining);
        for r in 0..here {
            let row = &raw[region.start + r * row_length..region.start + (r + 1) * row_length];
            for (i, col) in columns.iter().enumerate() {
                let bytes = row
                    .get(col.data_offset..col.data_offset + col.width)
                    .ok_or_else(|| FormatError::decode(FORMAT, "column extends past the row"))?;
                cells[i].push(decode_cell(bytes, col.kind, big_endian)?);
            }
        }
        remaining -= here;
    }
    if remaining > 0 {
        return Err(FormatError::decode(
            FORMAT,
            format!("{remaining} of {row_count} rows missing from the data pages"),
        ));
    }

    let out = columns
        .into_iter()
        .zip(cells)
        .map(|(meta, cells)| Column::new(meta.name, cells))
        .collect();
    Ok(Table::from_columns(out)?)
}

fn find_subheader(subheaders: &[(u32, usize, usize)], sig: u32) -> Result<(usize, usize)> {
    subheaders
        .iter()
        .find(|(s, _, _)| *s == sig)
        .map(|&(_, abs, len)| (abs, len))
        .ok_or_else(|| {
            FormatError::decode(FORMAT, format!("required subheader {sig:#010x} not found"))
        })
}

fn cursor_at(raw: &[u8], abs: usize, big_endian: bool) -> Result<Cursor<'_>> {
    let mut c = Cursor::new(FORMAT, raw);
    c.big_endian = big_endian;
    c.seek(abs)?;
    Ok(c)
}

fn read_word(c: &mut Cursor<'_>, u64_layout: bool) -> Result<usize> {
    Ok(if u64_layout {
        c.u64()? as usize
    } else {
        c.u32()? as usize
    })
}

/// Numeric columns narrower than 8 bytes store the high-order bytes of
/// the double; the low-order bytes are implicitly zero.
fn decode_cell(bytes: &[u8], kind: u8, big_endian: bool) -> Result<CellValue> {
    match kind {
        COL_TYPE_NUMERIC => {
            if bytes.len() > 8 || bytes.len() < 2 {
                return Err(FormatError::decode(FORMAT, "bad numeric column width"));
            }
            let mut full = [0u8; 8];
            if big_endian {
                full[..bytes.len()].copy_from_slice(bytes);
                let v = f64::from_be_bytes(full);
                Ok(if v.is_nan() { CellValue::Null } else { CellValue::Number(v) })
            } else {
                full[8 - bytes.len()..].copy_from_slice(bytes);
                let v = f64::from_le_bytes(full);
                Ok(if v.is_nan() { CellValue::Null } else { CellValue::Number(v) })
            }
        }
        COL_TYPE_CHAR => {
            let text = fixed_string(bytes);
            let text = text.trim_end();
            Ok(if text.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(text.to_string())
            })
        }
        other => Err(FormatError::decode(
            FORMAT,
            format!("unknown column type {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER_LEN: usize = 1024;
    const PAGE_SIZE: usize = 2048;

    fn put_u16(buf: &mut [u8], at: usize, v: u16) {
        buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn put_u32(buf: &mut [u8], at: usize, v: u32) {
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    /// One mix page holding the metadata subheaders and two data rows:
    /// numeric "valor" (offset 0, width 8) and char "nombre" (offset 8,
    /// width 4), row length 12.
    fn sample_sas() -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN + PAGE_SIZE];
        buf[..32].copy_from_slice(&MAGIC);
        buf[32] = 0x22; // 32-bit layout
        buf[35] = 0x22;
        buf[37] = 0x01; // little-endian
        put_u32(&mut buf, 196, HEADER_LEN as u32);
        put_u32(&mut buf, 200, PAGE_SIZE as u32);
        put_u32(&mut buf, 204, 1);

        let p = HEADER_LEN; // page start
        put_u16(&mut buf, p + 16, 512); // mix page
        put_u16(&mut buf, p + 18, 2); // block count
        put_u16(&mut buf, p + 20, 5); // subheader count

        // Rows live right after the five 12-byte pointers, 8-aligned.
        let rows_at = {
            let raw = 16 + 8 + 5 * 12;
            (raw + 7) & !7
        };
        buf[p + rows_at..p + rows_at + 8].copy_from_slice(&1500.25f64.to_le_bytes());
        buf[p + rows_at + 8..p + rows_at + 12].copy_from_slice(b"Ana ");
        buf[p + rows_at + 12..p + rows_at + 20].copy_from_slice(&f64::NAN.to_le_bytes());
        buf[p + rows_at + 20..p + rows_at + 24].copy_from_slice(b"Luis");

        // Subheaders packed at the end of the page.
        let mut at = rows_at + 32;
        let mut pointers: Vec<(usize, usize)> = Vec::new();

        // row size: row_length at +20, row_count at +24
        let rs = at;
        put_u32(&mut buf, p + rs, SIG_ROW_SIZE);
        put_u32(&mut buf, p + rs + 20, 12);
        put_u32(&mut buf, p + rs + 24, 2);
        pointers.push((rs, 64));
        at += 64;

        // column size: count at +4
        let cs = at;
        put_u32(&mut buf, p + cs, SIG_COLUMN_SIZE);
        put_u32(&mut buf, p + cs + 4, 2);
        pointers.push((cs, 12));
        at += 12;

        // text pool: size u16, names "valor" at 4, "nombre" at 9
        let tx = at;
        put_u32(&mut buf, p + tx, SIG_COLUMN_TEXT);
        put_u16(&mut buf, p + tx + 4, 16);
        buf[p + tx + 8..p + tx + 13].copy_from_slice(b"valor");
        buf[p + tx + 13..p + tx + 19].copy_from_slice(b"nombre");
        pointers.push((tx, 24));
        at += 24;

        // column names: pointers at +12 and +20 (pool idx, offset, length)
        let cn = at;
        put_u32(&mut buf, p + cn, SIG_COLUMN_NAME);
        put_u16(&mut buf, p + cn + 12, 0);
        put_u16(&mut buf, p + cn + 14, 4);
        put_u16(&mut buf, p + cn + 16, 5);
        put_u16(&mut buf, p + cn + 20, 0);
        put_u16(&mut buf, p + cn + 22, 9);
        put_u16(&mut buf, p + cn + 24, 6);
        pointers.push((cn, 36)); // (36 - 20) / 8 = 2 entries
        at += 36;

        // column attributes: entries at +12 and +24
        let ca = at;
        put_u32(&mut buf, p + ca, SIG_COLUMN_ATTRS);
        put_u32(&mut buf, p + ca + 12, 0); // valor: row offset 0
        put_u32(&mut buf, p + ca + 16, 8); // width 8
        buf[p + ca + 22] = COL_TYPE_NUMERIC;
        put_u32(&mut buf, p + ca + 24, 8); // nombre: row offset 8
        put_u32(&mut buf, p + ca + 28, 4); // width 4
        buf[p + ca + 34] = COL_TYPE_CHAR;
        pointers.push((ca, 44)); // (44 - 20) / 12 = 2 entries

        for (i, (offset, length)) in pointers.into_iter().enumerate() {
            let ptr = p + 16 + 8 + i * 12;
            put_u32(&mut buf, ptr, offset as u32);
            put_u32(&mut buf, ptr + 4, length as u32);
            buf[ptr + 8] = 0; // uncompressed
        }
        buf
    }

    #[test]
    fn reads_numeric_and_char_columns() {
        let table = read_sas(&sample_sas()).unwrap();
        assert_eq!(table.column_names(), vec!["valor", "nombre"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.cell(0, "valor"), Some(&CellValue::Number(1500.25)));
        assert_eq!(table.cell(0, "nombre"), Some(&CellValue::Text("Ana".into())));
        assert_eq!(table.cell(1, "valor"), Some(&CellValue::Null));
        assert_eq!(table.cell(1, "nombre"), Some(&CellValue::Text("Luis".into())));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = sample_sas();
        bytes[12] = 0;
        assert!(read_sas(&bytes).is_err());
    }

    #[test]
    fn compressed_pointer_is_rejected() {
        let mut bytes = sample_sas();
        // Flag the first subheader pointer as RLE-compressed.
        let ptr = HEADER_LEN + 16 + 8;
        bytes[ptr + 8] = COMPRESSION_RLE;
        let err = read_sas(&bytes).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn truncated_file_is_an_error() {
        let bytes = sample_sas();
        assert!(read_sas(&bytes[..HEADER_LEN + 100]).is_err());
    }
}
