//! Cell value types

use std::fmt;

use chrono::NaiveDate;

/// Represents a single cell value before a column type is declared.
///
/// A raw table freshly produced by a decoder may mix variants within one
/// column; coercion is the stage at which a column's tag becomes uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing value. Also the "not a time" sentinel after a failed date
    /// coercion.
    Null,

    /// Free-form text
    Text(String),

    /// Numeric value (all numbers stored as f64)
    Number(f64),

    /// Calendar date
    Date(NaiveDate),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Check if the cell is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a string slice
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as a date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Get the variant name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Text(_) => "text",
            CellValue::Number(_) => "number",
            CellValue::Date(_) => "date",
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                // Integral values render without a fraction part
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}
