//! Multi-format date parsing with Spanish month support.
//!
//! The parser is an explicit ordered list of strategies: Spanish month
//! substitution, a flexible split-based parse with day-before-month
//! precedence, then a fixed list of strptime-style formats. The first
//! strategy that yields a valid calendar date wins; anything else is a null
//! date, never an error.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Spanish month names and 3-4 letter abbreviations, mapped to month numbers
const SPANISH_MONTHS: &[(&str, u32)] = &[
    ("enero", 1),
    ("ene", 1),
    ("febrero", 2),
    ("feb", 2),
    ("marzo", 3),
    ("mar", 3),
    ("abril", 4),
    ("abr", 4),
    ("mayo", 5),
    ("may", 5),
    ("junio", 6),
    ("jun", 6),
    ("julio", 7),
    ("jul", 7),
    ("agosto", 8),
    ("ago", 8),
    ("septiembre", 9),
    ("sept", 9),
    ("sep", 9),
    ("octubre", 10),
    ("oct", 10),
    ("noviembre", 11),
    ("nov", 11),
    ("diciembre", 12),
    ("dic", 12),
];

static MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = SPANISH_MONTHS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b({})\b", alternation)).expect("month regex")
});

/// Explicit formats tried after the flexible parse, in order
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d-%m-%y",
    "%d/%m/%y",
    "%d.%m.%y",
    "%m-%d-%Y",
    "%m/%d/%Y",
    "%d %m %Y",
    "%d %m %y",
    "%Y%m%d",
];

/// Datetime shapes accepted by the flexible step; the time part is dropped
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Replace whole-word Spanish month names with two-digit month numbers
fn substitute_spanish_months(s: &str) -> String {
    MONTH_RE
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let month = SPANISH_MONTHS
                .iter()
                .find(|(n, _)| *n == name)
                .map_or(0, |(_, m)| *m);
            format!("{:02}", month)
        })
        .into_owned()
}

/// Expand a two-digit year the way strptime's `%y` does
fn expand_year(y: i32) -> i32 {
    if y < 100 {
        if y <= 68 {
            y + 2000
        } else {
            y + 1900
        }
    } else {
        y
    }
}

/// Flexible parse of three separated numeric fields with day-first
/// precedence: `11-01-02`, `2002/1/11`, `11.1.2002` and friends.
fn parse_flexible(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s
        .split(|c: char| matches!(c, '-' | '/' | '.' | ' '))
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }
    let nums: Vec<i64> = parts
        .iter()
        .map(|p| p.parse::<i64>().ok())
        .collect::<Option<_>>()?;

    let (year, month, day) = if parts[0].len() >= 4 || nums[0] > 31 {
        // Year leads: Y-M-D
        (nums[0] as i32, nums[1] as u32, nums[2] as u32)
    } else {
        // Day leads by default
        (expand_year(nums[2] as i32), nums[1] as u32, nums[0] as u32)
    };

    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        // Month-day swap as a last resort (e.g. 01-25-2002)
        if month > 12 && day <= 12 {
            NaiveDate::from_ymd_opt(year, day, month)
        } else {
            None
        }
    })
}

/// Parse one cell's text as a date.
///
/// Returns `None` for anything that does not resolve to a valid calendar
/// date; invalid dates such as `31/02/2020` are never silently wrapped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    let normalized = substitute_spanish_months(&normalized);

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(dt.date());
        }
    }

    if let Some(d) = parse_flexible(&normalized) {
        return Some(d);
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&normalized, fmt) {
            return Some(d);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_spanish_month_abbreviation() {
        assert_eq!(parse_date("11-ene-2002"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("11-ENE-2002"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("3 sept 2021"), Some(ymd(2021, 9, 3)));
        assert_eq!(parse_date("15 de marzo"), None); // no year
    }

    #[test]
    fn test_spanish_full_month_name() {
        assert_eq!(parse_date("11-enero-2002"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("1/diciembre/1999"), Some(ymd(1999, 12, 1)));
    }

    #[test]
    fn test_iso_and_slash_formats() {
        assert_eq!(parse_date("2002-01-11"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("2002/01/11"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("11/01/2002"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("11.01.2002"), Some(ymd(2002, 1, 11)));
    }

    #[test]
    fn test_day_first_precedence() {
        // Ambiguous day/month resolves day-first.
        assert_eq!(parse_date("03/04/2020"), Some(ymd(2020, 4, 3)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_date("11-01-02"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("11-01-99"), Some(ymd(1999, 1, 11)));
    }

    #[test]
    fn test_us_order_when_day_first_invalid() {
        assert_eq!(parse_date("01-25-2002"), Some(ymd(2002, 1, 25)));
    }

    #[test]
    fn test_compact_and_spaced() {
        assert_eq!(parse_date("20020111"), Some(ymd(2002, 1, 11)));
        assert_eq!(parse_date("11 01 2002"), Some(ymd(2002, 1, 11)));
    }

    #[test]
    fn test_datetime_truncated() {
        assert_eq!(parse_date("2002-01-11 14:30:00"), Some(ymd(2002, 1, 11)));
    }

    #[test]
    fn test_invalid_calendar_date() {
        assert_eq!(parse_date("31/02/2020"), None);
        assert_eq!(parse_date("no es fecha"), None);
        assert_eq!(parse_date(""), None);
    }
}
