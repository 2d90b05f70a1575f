//! Native SPSS `.sav` reader.
//!
//! Covers the `$FL2` container with numeric and short-string variables,
//! both uncompressed and bytecode-compressed data sections. Values are
//! stored as 8-byte units; a string variable of width `w` spans
//! `ceil(w / 8)` units, declared as one real variable record followed by
//! continuation records with type -1.

use tabulado_core::{CellValue, Column, Table};

use crate::binary::{fixed_string, Cursor};
use crate::error::{FormatError, Result};

const FORMAT: &str = "spss";

const COMPRESSION_NONE: i32 = 0;
const COMPRESSION_BYTECODE: i32 = 1;

/// System-missing numeric cells hold the lowest representable double.
const SYSMISS_CEILING: f64 = -1.79e308;

struct Variable {
    name: String,
    /// 0 for numeric, otherwise the declared string width in bytes.
    width: i32,
    units: usize,
}

pub fn read_spss(raw: &[u8]) -> Result<Table> {
    let mut c = Cursor::new(FORMAT, raw);
    c.expect(b"$FL2")?;
    c.skip(60)?; // product string
    let layout_probe = c.u32()?;
    // The layout code is always 2 or 3; anything else means the file was
    // written on the other endianness.
    if layout_probe != 2 && layout_probe != 3 {
        let swapped = layout_probe.swap_bytes();
        if swapped != 2 && swapped != 3 {
            return Err(FormatError::decode(FORMAT, "bad layout code"));
        }
        c.big_endian = true;
    }
    c.skip(4)?; // nominal case size
    let compression = c.i32()?;
    if compression != COMPRESSION_NONE && compression != COMPRESSION_BYTECODE {
        return Err(FormatError::decode(
            FORMAT,
            format!("compression scheme {compression} is not supported"),
        ));
    }
    c.skip(4)?; // weight index
    let n_cases = c.i32()?;
    let bias = c.f64()?;
    c.skip(9 + 8 + 64 + 3)?; // creation date/time, file label, padding

    let variables = read_dictionary(&mut c)?;
    let big_endian = c.big_endian;
    let mut units = UnitReader::new(c, compression == COMPRESSION_BYTECODE, bias);

    let mut cells: Vec<Vec<CellValue>> = variables.iter().map(|_| Vec::new()).collect();
    let mut case = 0usize;
    'cases: loop {
        if n_cases >= 0 && case >= n_cases as usize {
            break;
        }
        for (i, var) in variables.iter().enumerate() {
            let cell = if var.width == 0 {
                match units.next_numeric()? {
                    None if i == 0 => break 'cases,
                    None => return Err(FormatError::decode(FORMAT, "truncated case data")),
                    Some(None) => CellValue::Null,
                    Some(Some(bits)) => {
                        let v = if big_endian {
                            f64::from_be_bytes(bits)
                        } else {
                            f64::from_le_bytes(bits)
                        };
                        if v.is_nan() || v <= SYSMISS_CEILING {
                            CellValue::Null
                        } else {
                            CellValue::Number(v)
                        }
                    }
                }
            } else {
                let mut raw = Vec::with_capacity(var.units * 8);
                for u in 0..var.units {
                    match units.next_string()? {
                        None if i == 0 && u == 0 => break 'cases,
                        None => return Err(FormatError::decode(FORMAT, "truncated case data")),
                        Some(bits) => raw.extend_from_slice(&bits),
                    }
                }
                raw.truncate(var.width as usize);
                let text = fixed_string(&raw);
                let text = text.trim_end();
                if text.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::Text(text.to_string())
                }
            };
            cells[i].push(cell);
        }
        case += 1;
    }

    let columns = variables
        .into_iter()
        .zip(cells)
        .map(|(var, cells)| Column::new(var.name, cells))
        .collect();
    Ok(Table::from_columns(columns)?)
}

/// Read dictionary records up to and including the type-999 terminator.
fn read_dictionary(c: &mut Cursor<'_>) -> Result<Vec<Variable>> {
    let mut variables: Vec<Variable> = Vec::new();
    loop {
        match c.i32()? {
            2 => {
                let var_type = c.i32()?;
                let has_label = c.i32()?;
                let n_missing = c.i32()?;
                c.skip(8)?; // print and write formats
                let name = fixed_string(c.bytes(8)?).trim_end().to_string();
                if has_label != 0 {
                    let len = c.i32()? as usize;
                    c.skip(len.div_ceil(4) * 4)?;
                }
                c.skip(n_missing.unsigned_abs() as usize * 8)?;
                if var_type >= 0 {
                    let units = if var_type == 0 {
                        1
                    } else {
                        (var_type as usize).div_ceil(8)
                    };
                    variables.push(Variable {
                        name,
                        width: var_type,
                        units,
                    });
                }
                // var_type == -1 is a continuation of the previous string
                // variable and carries no data of its own.
            }
            3 => {
                // Value labels: count pairs of (8-byte value, padded label).
                let count = c.i32()?;
                for _ in 0..count {
                    c.skip(8)?;
                    let len = c.u8()? as usize;
                    c.skip((len + 1).div_ceil(8) * 8 - 1)?;
                }
            }
            4 => {
                let count = c.i32()?;
                c.skip(count as usize * 4)?;
            }
            6 => {
                let lines = c.i32()?;
                c.skip(lines as usize * 80)?;
            }
            7 => {
                c.skip(4)?; // subtype
                let size = c.i32()? as usize;
                let count = c.i32()? as usize;
                c.skip(size.saturating_mul(count))?;
            }
            999 => {
                c.skip(4)?; // filler
                return Ok(variables);
            }
            other => {
                return Err(FormatError::decode(
                    FORMAT,
                    format!("unknown dictionary record type {other}"),
                ))
            }
        }
    }
}

/// Yields 8-byte data units, transparently undoing bytecode compression.
struct UnitReader<'a> {
    cursor: Cursor<'a>,
    compressed: bool,
    bias: f64,
    big_endian: bool,
    codes: [u8; 8],
    code_pos: usize,
    finished: bool,
}

impl<'a> UnitReader<'a> {
    fn new(cursor: Cursor<'a>, compressed: bool, bias: f64) -> Self {
        let big_endian = cursor.big_endian;
        Self {
            cursor,
            compressed,
            bias,
            big_endian,
            codes: [0; 8],
            code_pos: 8,
            finished: false,
        }
    }

    fn raw_unit(&mut self) -> Result<Option<[u8; 8]>> {
        match self.cursor.bytes(8) {
            Ok(b) => Ok(Some(b.try_into().unwrap())),
            Err(_) => Ok(None),
        }
    }

    fn next_code(&mut self) -> Result<Option<u8>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if self.code_pos < 8 {
                let code = self.codes[self.code_pos];
                self.code_pos += 1;
                if code == 0 {
                    continue; // padding
                }
                if code == 252 {
                    self.finished = true;
                    return Ok(None);
                }
                return Ok(Some(code));
            }
            match self.raw_unit()? {
                None => {
                    self.finished = true;
                    return Ok(None);
                }
                Some(block) => {
                    self.codes = block;
                    self.code_pos = 0;
                }
            }
        }
    }

    /// Next numeric unit: `None` at end of data, `Some(None)` for a
    /// compressed system-missing marker, `Some(Some(bytes))` otherwise.
    fn next_numeric(&mut self) -> Result<Option<Option<[u8; 8]>>> {
        if !self.compressed {
            return Ok(self.raw_unit()?.map(Some));
        }
        match self.next_code()? {
            None => Ok(None),
            Some(253) => match self.raw_unit()? {
                None => Err(FormatError::decode(FORMAT, "missing literal after code 253")),
                Some(bits) => Ok(Some(Some(bits))),
            },
            Some(255) => Ok(Some(None)),
            Some(254) => Ok(Some(Some(*b"        "))),
            Some(code) => {
                let v = code as f64 - self.bias;
                let bits = if self.big_endian {
                    v.to_be_bytes()
                } else {
                    v.to_le_bytes()
                };
                Ok(Some(Some(bits)))
            }
        }
    }

    fn next_string(&mut self) -> Result<Option<[u8; 8]>> {
        if !self.compressed {
            return self.raw_unit();
        }
        match self.next_code()? {
            None => Ok(None),
            Some(253) => match self.raw_unit()? {
                None => Err(FormatError::decode(FORMAT, "missing literal after code 253")),
                Some(bits) => Ok(Some(bits)),
            },
            Some(254) => Ok(Some(*b"        ")),
            Some(255) => Ok(Some(*b"        ")),
            Some(_) => Ok(Some(*b"        ")),
        }
    }
}
