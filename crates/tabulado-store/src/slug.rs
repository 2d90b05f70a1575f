use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").unwrap());

/// Filesystem-safe slug from an uploaded file name: the extension is
/// dropped, whitespace runs collapse to `_` and anything outside
/// `[a-zA-Z0-9_-]` is removed. An empty result falls back to `"datos"`.
pub fn safe_slug(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    let collapsed = WHITESPACE.replace_all(stem.trim(), "_");
    let cleaned = DISALLOWED.replace_all(&collapsed, "");
    if cleaned.is_empty() {
        "datos".to_string()
    } else {
        cleaned.into_owned()
    }
}
