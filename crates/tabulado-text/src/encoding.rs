//! Byte-to-text decoding with a fixed fallback chain.
//!
//! Uploaded delimited files arrive with no declared encoding. The chain
//! tried here is, in order: UTF-8 with a BOM, strict UTF-8, Windows-1252,
//! and finally lossy UTF-8 so decoding itself never fails.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode raw bytes into text, returning the decoded string and the name
/// of the encoding that succeeded.
///
/// Windows-1252 stands in for Latin-1 as well: the two differ only in
/// 0x80-0x9F, which decode here as punctuation instead of C1 controls.
pub fn decode(raw: &[u8]) -> (Cow<'_, str>, &'static str) {
    if let Some(stripped) = raw.strip_prefix(UTF8_BOM) {
        return match std::str::from_utf8(stripped) {
            Ok(s) => (Cow::Borrowed(s), "utf-8-sig"),
            Err(_) => (String::from_utf8_lossy(stripped), "utf-8 (lossy)"),
        };
    }
    if let Ok(s) = std::str::from_utf8(raw) {
        return (Cow::Borrowed(s), "utf-8");
    }
    if let Some(s) = WINDOWS_1252.decode_without_bom_handling_and_without_replacement(raw) {
        return (s, "windows-1252");
    }
    (String::from_utf8_lossy(raw), "utf-8 (lossy)")
}
