//! Upload format detection.
//!
//! Detection is by file extension only; content sniffing happens inside the
//! text-table decoder (for the delimiter), never for format choice.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Comma-separated text (`.csv`)
    Csv,
    /// Tab-separated text (`.tsv`)
    Tsv,
    /// Delimited text with unknown delimiter (`.txt`)
    Txt,
    /// JSON document or JSON Lines (`.json`)
    Json,
    /// Apache Parquet (`.parquet`)
    Parquet,
    /// Feather / Arrow IPC file (`.feather`)
    Feather,
    /// Stata dataset (`.dta`)
    Stata,
    /// SPSS system file (`.sav`)
    Spss,
    /// SAS dataset (`.sas7bdat`)
    Sas,
    /// R serialized object(s) (`.rds`, `.rda`, `.RData`)
    RData,
}

impl DataFormat {
    /// Detect the format from a filename's extension.
    ///
    /// Matching is case-insensitive. Unknown or missing extensions are an
    /// [`Error::UnsupportedFormat`] naming what was rejected.
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(DataFormat::Csv),
            "tsv" => Ok(DataFormat::Tsv),
            "txt" => Ok(DataFormat::Txt),
            "json" => Ok(DataFormat::Json),
            "parquet" => Ok(DataFormat::Parquet),
            "feather" => Ok(DataFormat::Feather),
            "dta" => Ok(DataFormat::Stata),
            "sav" => Ok(DataFormat::Spss),
            "sas7bdat" => Ok(DataFormat::Sas),
            "rds" | "rda" | "rdata" => Ok(DataFormat::RData),
            "" => Err(Error::UnsupportedFormat(format!("(no extension: {name})"))),
            other => Err(Error::UnsupportedFormat(format!(".{other}"))),
        }
    }

    /// True for the delimited-text family handled by the text decoder
    pub fn is_delimited_text(&self) -> bool {
        matches!(self, DataFormat::Csv | DataFormat::Tsv | DataFormat::Txt)
    }

    /// Short lowercase tag for logs and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Tsv => "tsv",
            DataFormat::Txt => "txt",
            DataFormat::Json => "json",
            DataFormat::Parquet => "parquet",
            DataFormat::Feather => "feather",
            DataFormat::Stata => "stata",
            DataFormat::Spss => "spss",
            DataFormat::Sas => "sas",
            DataFormat::RData => "r",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
