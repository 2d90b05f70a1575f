//! Small byte-cursor shared by the binary statistical-format readers.

use crate::error::{FormatError, Result};

/// Sequential reader over a byte slice with a configurable byte order.
pub(crate) struct Cursor<'a> {
    format: &'static str,
    data: &'a [u8],
    pos: usize,
    pub big_endian: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(format: &'static str, data: &'a [u8]) -> Self {
        Self {
            format,
            data,
            pos: 0,
            big_endian: false,
        }
    }

    fn short(&self, what: &str) -> FormatError {
        FormatError::decode(self.format, format!("unexpected end of file reading {what}"))
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(FormatError::decode(
                self.format,
                format!("offset {pos} is past the end of the file"),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.seek(self.pos.saturating_add(n))
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| self.short("bytes"))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Consume `tag` or fail, used for the tagged sections of newer
    /// formats.
    pub fn expect(&mut self, tag: &[u8]) -> Result<()> {
        let got = self.bytes(tag.len())?;
        if got != tag {
            return Err(FormatError::decode(
                self.format,
                format!(
                    "expected {:?}, found {:?}",
                    String::from_utf8_lossy(tag),
                    String::from_utf8_lossy(got)
                ),
            ));
        }
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b: [u8; 2] = self.bytes(2)?.try_into().unwrap();
        Ok(if self.big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        })
    }

    pub fn i16(&mut self) -> Result<i16> {
        Ok(self.u16()? as i16)
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b: [u8; 4] = self.bytes(4)?.try_into().unwrap();
        Ok(if self.big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }

    pub fn u64(&mut self) -> Result<u64> {
        let b: [u8; 8] = self.bytes(8)?.try_into().unwrap();
        Ok(if self.big_endian {
            u64::from_be_bytes(b)
        } else {
            u64::from_le_bytes(b)
        })
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.u32()?))
    }

    pub fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.u64()?))
    }
}

/// Decode a fixed-width, NUL-padded string field: UTF-8 when valid,
/// Windows-1252 otherwise (older files from Spanish-locale tools).
pub(crate) fn fixed_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let raw = &raw[..end];
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => encoding_rs::WINDOWS_1252.decode(raw).0.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_and_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut c = Cursor::new("test", &data);
        assert_eq!(c.u16().unwrap(), 0x0201);
        c.seek(0).unwrap();
        c.big_endian = true;
        assert_eq!(c.u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn running_off_the_end_is_an_error() {
        let mut c = Cursor::new("test", &[0x00]);
        assert!(c.u32().is_err());
    }

    #[test]
    fn fixed_strings_stop_at_the_first_nul() {
        assert_eq!(fixed_string(b"abc\0\0\0"), "abc");
        assert_eq!(fixed_string(b"abc"), "abc");
        // 0xF1 is windows-1252
        assert_eq!(fixed_string(&[0x61, 0xF1, 0x6F, 0x00]), "a\u{f1}o");
    }
}
