//! Native reader for R serialization: `.rds` single objects and
//! `.rda`/`.RData` workspaces.
//!
//! Handles the XDR (big-endian) wire format, serialization versions 2
//! and 3, with an optional gzip wrapper. Only `data.frame` objects
//! convert to tables; a workspace may carry several named objects and
//! all convertible ones are returned in file order.

use std::io::Read;

use flate2::read::GzDecoder;
use tabulado_core::{CellValue, Column, Table};

use crate::binary::Cursor;
use crate::error::{FormatError, Result};

const FORMAT: &str = "r";

// SEXP type codes from Rinternals.h.
const SYMSXP: i32 = 1;
const LISTSXP: i32 = 2;
const CHARSXP: i32 = 9;
const LGLSXP: i32 = 10;
const INTSXP: i32 = 13;
const REALSXP: i32 = 14;
const STRSXP: i32 = 16;
const VECSXP: i32 = 19;
const NILVALUE_SXP: i32 = 254;
const REFSXP: i32 = 255;

const HAS_ATTR: i32 = 0x200;
const HAS_TAG: i32 = 0x400;

const NA_INT: i32 = i32::MIN;

/// The named objects of one R file, in file order.
#[derive(Debug, Clone, Default)]
pub struct RObjects {
    pub entries: Vec<(String, Table)>,
}

impl RObjects {
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn first(&self) -> Option<(&str, &Table)> {
        self.entries.first().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single serialized `.rds` object; must be a data.frame.
pub fn read_rds(raw: &[u8]) -> Result<Table> {
    let data = decompress(raw)?;
    let mut parser = Parser::new(&data)?;
    let value = parser.item()?;
    to_table(&value)
}

/// An `.rda`/`.RData` workspace: every data.frame in it, by name.
pub fn read_rdata(raw: &[u8]) -> Result<RObjects> {
    let data = decompress(raw)?;
    if data.len() < 5 || (&data[..5] != b"RDX2\n" && &data[..5] != b"RDX3\n") {
        return Err(FormatError::decode(FORMAT, "missing RDX2/RDX3 workspace magic"));
    }
    let mut parser = Parser::new(&data[5..])?;
    let bindings = parser.item()?;
    let RValue::Pairlist(entries) = bindings else {
        return Err(FormatError::decode(FORMAT, "workspace is not a pairlist"));
    };
    let mut out = RObjects::default();
    for (name, value) in entries {
        match to_table(&value) {
            Ok(table) => out.entries.push((name, table)),
            Err(err) => log::warn!("skipping object {name:?}: {err}"),
        }
    }
    if out.is_empty() {
        return Err(FormatError::decode(FORMAT, "no data.frame objects in the file"));
    }
    Ok(out)
}

fn decompress(raw: &[u8]) -> Result<Vec<u8>> {
    match raw {
        [0x1F, 0x8B, ..] => {
            let mut out = Vec::new();
            GzDecoder::new(raw).read_to_end(&mut out)?;
            Ok(out)
        }
        [b'B', b'Z', b'h', ..] | [0xFD, b'7', b'z', b'X', b'Z', ..] => Err(FormatError::decode(
            FORMAT,
            "bzip2/xz compressed R files are not supported, re-save with gzip",
        )),
        _ => Ok(raw.to_vec()),
    }
}

#[derive(Debug, Clone)]
enum RValue {
    Null,
    Char(Option<String>),
    Symbol(String),
    Real(Vec<Option<f64>>),
    Int(Vec<Option<i32>>),
    Logical(Vec<Option<bool>>),
    Strings(Vec<Option<String>>),
    List(Vec<RValue>, Vec<(String, RValue)>),
    Pairlist(Vec<(String, RValue)>),
}

impl RValue {
    fn attr<'a>(attrs: &'a [(String, RValue)], name: &str) -> Option<&'a RValue> {
        attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

struct Parser<'a> {
    c: Cursor<'a>,
    refs: Vec<String>,
}

impl<'a> Parser<'a> {
    /// Consume the serialization header: format marker and versions.
    fn new(data: &'a [u8]) -> Result<Self> {
        let mut c = Cursor::new(FORMAT, data);
        c.big_endian = true;
        match c.bytes(2)? {
            b"X\n" => {}
            b"A\n" | b"B\n" => {
                return Err(FormatError::decode(
                    FORMAT,
                    "only XDR serialization is supported",
                ))
            }
            _ => return Err(FormatError::decode(FORMAT, "missing serialization header")),
        }
        let version = c.i32()?;
        c.skip(8)?; // writer and minimum reader versions
        if version == 3 {
            let len = c.i32()?;
            if len < 0 {
                return Err(FormatError::decode(FORMAT, "bad encoding-name length"));
            }
            c.skip(len as usize)?; // native encoding name
        } else if version != 2 {
            return Err(FormatError::decode(
                FORMAT,
                format!("serialization version {version} is not supported"),
            ));
        }
        Ok(Self { c, refs: Vec::new() })
    }

    fn item(&mut self) -> Result<RValue> {
        let flags = self.c.i32()?;
        let sexp_type = flags & 0xFF;
        match sexp_type {
            NILVALUE_SXP => Ok(RValue::Null),
            REFSXP => {
                let mut idx = (flags >> 8) as usize;
                if idx == 0 {
                    idx = self.c.i32()? as usize;
                }
                let name = self
                    .refs
                    .get(idx.wrapping_sub(1))
                    .cloned()
                    .ok_or_else(|| FormatError::decode(FORMAT, "dangling reference"))?;
                Ok(RValue::Symbol(name))
            }
            SYMSXP => {
                let RValue::Char(Some(name)) = self.item()? else {
                    return Err(FormatError::decode(FORMAT, "symbol without a printname"));
                };
                self.refs.push(name.clone());
                Ok(RValue::Symbol(name))
            }
            CHARSXP => {
                let len = self.c.i32()?;
                if len < 0 {
                    return Ok(RValue::Char(None)); // NA_character_
                }
                let bytes = self.c.bytes(len as usize)?;
                Ok(RValue::Char(Some(
                    String::from_utf8_lossy(bytes).into_owned(),
                )))
            }
            LISTSXP => {
                // Pairlist node order on the wire: attributes, tag, car,
                // then the cdr as the next item.
                let mut entries = Vec::new();
                let mut node_flags = flags;
                loop {
                    if node_flags & HAS_ATTR != 0 {
                        self.item()?; // pairlist attributes, unused
                    }
                    let tag = if node_flags & HAS_TAG != 0 {
                        match self.item()? {
                            RValue::Symbol(name) => name,
                            _ => String::new(),
                        }
                    } else {
                        String::new()
                    };
                    let car = self.item()?;
                    entries.push((tag, car));

                    let next = self.c.i32()?;
                    if next & 0xFF == NILVALUE_SXP {
                        break;
                    }
                    if next & 0xFF != LISTSXP {
                        return Err(FormatError::decode(FORMAT, "malformed pairlist tail"));
                    }
                    node_flags = next;
                }
                Ok(RValue::Pairlist(entries))
            }
            LGLSXP => {
                let n = self.length()?;
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    let v = self.c.i32()?;
                    values.push(if v == NA_INT { None } else { Some(v != 0) });
                }
                self.finish_vector(flags, RValue::Logical(values))
            }
            INTSXP => {
                let n = self.length()?;
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    let v = self.c.i32()?;
                    values.push(if v == NA_INT { None } else { Some(v) });
                }
                self.finish_vector(flags, RValue::Int(values))
            }
            REALSXP => {
                let n = self.length()?;
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    let v = self.c.f64()?;
                    // NA_real_ is a tagged NaN; fold all NaNs to missing.
                    values.push(if v.is_nan() { None } else { Some(v) });
                }
                self.finish_vector(flags, RValue::Real(values))
            }
            STRSXP => {
                let n = self.length()?;
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    match self.item()? {
                        RValue::Char(v) => values.push(v),
                        _ => return Err(FormatError::decode(FORMAT, "non-character in STRSXP")),
                    }
                }
                self.finish_vector(flags, RValue::Strings(values))
            }
            VECSXP => {
                let n = self.length()?;
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(self.item()?);
                }
                let attrs = self.vector_attrs(flags)?;
                Ok(RValue::List(items, attrs))
            }
            other => Err(FormatError::decode(
                FORMAT,
                format!("unsupported R object type {other}"),
            )),
        }
    }

    fn length(&mut self) -> Result<usize> {
        let n = self.c.i32()?;
        if n < 0 {
            return Err(FormatError::decode(FORMAT, "long vectors are not supported"));
        }
        Ok(n as usize)
    }

    /// Vector attributes follow the data; wrap simple vectors that carry
    /// them (factors) back into a list so the attrs survive.
    fn finish_vector(&mut self, flags: i32, value: RValue) -> Result<RValue> {
        let attrs = self.vector_attrs(flags)?;
        if attrs.is_empty() {
            Ok(value)
        } else {
            Ok(RValue::List(vec![value], attrs))
        }
    }

    fn vector_attrs(&mut self, flags: i32) -> Result<Vec<(String, RValue)>> {
        if flags & HAS_ATTR == 0 {
            return Ok(Vec::new());
        }
        match self.item()? {
            RValue::Pairlist(entries) => Ok(entries),
            RValue::Null => Ok(Vec::new()),
            _ => Err(FormatError::decode(FORMAT, "attributes are not a pairlist")),
        }
    }
}

fn class_contains(attrs: &[(String, RValue)], class: &str) -> bool {
    matches!(
        RValue::attr(attrs, "class"),
        Some(RValue::Strings(classes))
            if classes.iter().any(|c| c.as_deref() == Some(class))
    )
}

/// Convert a parsed `data.frame` into a table.
fn to_table(value: &RValue) -> Result<Table> {
    let RValue::List(items, attrs) = value else {
        return Err(FormatError::decode(FORMAT, "object is not a data.frame"));
    };
    if !class_contains(attrs, "data.frame") {
        return Err(FormatError::decode(FORMAT, "object is not a data.frame"));
    }
    let Some(RValue::Strings(names)) = RValue::attr(attrs, "names") else {
        return Err(FormatError::decode(FORMAT, "data.frame has no names attribute"));
    };
    if names.len() != items.len() {
        return Err(FormatError::decode(FORMAT, "names/column count mismatch"));
    }
    let columns = names
        .iter()
        .zip(items)
        .enumerate()
        .map(|(i, (name, item))| {
            let name = name.clone().unwrap_or_else(|| format!("col_{}", i + 1));
            Ok(Column::new(name, column_cells(item)?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::from_columns(columns)?)
}

fn column_cells(value: &RValue) -> Result<Vec<CellValue>> {
    match value {
        RValue::Real(values) => Ok(values
            .iter()
            .map(|v| v.map(CellValue::Number).unwrap_or(CellValue::Null))
            .collect()),
        RValue::Int(values) => Ok(values
            .iter()
            .map(|v| v.map(|n| CellValue::Number(n as f64)).unwrap_or(CellValue::Null))
            .collect()),
        RValue::Logical(values) => Ok(values
            .iter()
            .map(|v| match v {
                None => CellValue::Null,
                Some(true) => CellValue::Number(1.0),
                Some(false) => CellValue::Number(0.0),
            })
            .collect()),
        RValue::Strings(values) => Ok(values
            .iter()
            .map(|v| match v {
                Some(s) if !s.trim().is_empty() => CellValue::Text(s.clone()),
                _ => CellValue::Null,
            })
            .collect()),
        // A factor: integer codes wrapped with levels/class attributes.
        RValue::List(items, attrs) if class_contains(attrs, "factor") => {
            let [RValue::Int(codes)] = items.as_slice() else {
                return Err(FormatError::decode(FORMAT, "malformed factor column"));
            };
            let Some(RValue::Strings(levels)) = RValue::attr(attrs, "levels") else {
                return Err(FormatError::decode(FORMAT, "factor without levels"));
            };
            Ok(codes
                .iter()
                .map(|code| {
                    code.filter(|&k| k >= 1)
                        .and_then(|k| levels.get((k - 1) as usize))
                        .and_then(|l| l.clone())
                        .map(CellValue::Text)
                        .unwrap_or(CellValue::Null)
                })
                .collect())
        }
        _ => Err(FormatError::decode(FORMAT, "unsupported column type")),
    }
}
