//! In-memory uploads and format dispatch.

use bytes::Bytes;
use tabulado_core::{DataFormat, Table};
use tabulado_formats::{
    read_feather, read_json, read_parquet, read_rdata, read_rds, read_sas, read_spss, read_stata,
    FormatError, RObjects,
};
use tabulado_text::{read as read_text, TextReadOptions};

use crate::error::Result;

/// One uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Session identity of this upload; two uploads with the same name
    /// and size are treated as the same file.
    pub fn signature(&self) -> String {
        format!("{}:{}", self.name, self.bytes.len())
    }

    pub fn format(&self) -> Result<DataFormat> {
        Ok(DataFormat::from_name(&self.name)?)
    }
}

/// Options forwarded from the caller into the decoders.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Force a text delimiter instead of sniffing.
    pub delimiter: Option<u8>,
    /// For R workspaces with several objects, which one to materialize.
    pub r_object: Option<String>,
}

/// What came out of decoding one upload.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub table: Table,
    pub format: DataFormat,
    pub delimiter: Option<u8>,
    pub encoding: Option<&'static str>,
    pub warnings: Vec<String>,
    /// Objects found in an R file, in file order.
    pub r_objects: Vec<String>,
    pub r_selected: Option<String>,
}

impl ReadOutcome {
    fn plain(table: Table, format: DataFormat) -> Self {
        Self {
            table,
            format,
            delimiter: None,
            encoding: None,
            warnings: Vec::new(),
            r_objects: Vec::new(),
            r_selected: None,
        }
    }
}

/// Decode an upload according to its file extension.
pub fn read_upload(upload: &Upload, options: &ReadOptions) -> Result<ReadOutcome> {
    let format = upload.format()?;
    let raw = upload.bytes.as_ref();
    match format {
        DataFormat::Csv | DataFormat::Tsv | DataFormat::Txt => {
            let delimiter = options
                .delimiter
                .or((format == DataFormat::Tsv).then_some(b'\t'));
            let text_options = TextReadOptions { delimiter };
            let out = read_text(raw, &text_options);
            Ok(ReadOutcome {
                table: out.table,
                format,
                delimiter: out.delimiter,
                encoding: Some(out.encoding),
                warnings: out.warnings,
                r_objects: Vec::new(),
                r_selected: None,
            })
        }
        DataFormat::Json => Ok(ReadOutcome::plain(read_json(raw)?, format)),
        DataFormat::Parquet => Ok(ReadOutcome::plain(read_parquet(raw)?, format)),
        DataFormat::Feather => Ok(ReadOutcome::plain(read_feather(raw)?, format)),
        DataFormat::Stata => Ok(ReadOutcome::plain(read_stata(raw)?, format)),
        DataFormat::Spss => Ok(ReadOutcome::plain(read_spss(raw)?, format)),
        DataFormat::Sas => Ok(ReadOutcome::plain(read_sas(raw)?, format)),
        DataFormat::RData => {
            let objects = decode_r(upload)?;
            select_r(&objects, options.r_object.as_deref(), format)
        }
    }
}

/// Decode an R upload into its named objects. A single `.rds` object is
/// named after the file stem so both shapes look alike downstream.
pub(crate) fn decode_r(upload: &Upload) -> Result<RObjects> {
    let lower = upload.name.to_lowercase();
    if lower.ends_with(".rds") {
        let table = read_rds(upload.bytes.as_ref())?;
        let stem = upload
            .name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&upload.name);
        Ok(RObjects {
            entries: vec![(stem.to_string(), table)],
        })
    } else {
        Ok(read_rdata(upload.bytes.as_ref())?)
    }
}

pub(crate) fn select_r(
    objects: &RObjects,
    wanted: Option<&str>,
    format: DataFormat,
) -> Result<ReadOutcome> {
    let (name, table) = match wanted {
        Some(name) => (
            name.to_string(),
            objects
                .get(name)
                .ok_or_else(|| FormatError::ObjectNotFound(name.to_string()))?
                .clone(),
        ),
        None => {
            let (name, table) = objects
                .first()
                .ok_or_else(|| FormatError::Empty)?;
            (name.to_string(), table.clone())
        }
    };
    Ok(ReadOutcome {
        table,
        format,
        delimiter: None,
        encoding: None,
        warnings: Vec::new(),
        r_objects: objects.names().iter().map(|n| n.to_string()).collect(),
        r_selected: Some(name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabulado_core::CellValue;

    #[test]
    fn signature_combines_name_and_size() {
        let upload = Upload::new("ventas.csv", &b"a;b\n1;2"[..]);
        assert_eq!(upload.signature(), "ventas.csv:7");
    }

    #[test]
    fn csv_uploads_are_sniffed() {
        let upload = Upload::new("ventas.csv", &b"a;b\n1;2\n3;4"[..]);
        let out = read_upload(&upload, &ReadOptions::default()).unwrap();
        assert_eq!(out.format, DataFormat::Csv);
        assert_eq!(out.delimiter, Some(b';'));
        assert_eq!(out.table.n_cols(), 2);
    }

    #[test]
    fn tsv_defaults_to_tab() {
        let upload = Upload::new("datos.tsv", &b"a\tb\n1\t2"[..]);
        let out = read_upload(&upload, &ReadOptions::default()).unwrap();
        assert_eq!(out.delimiter, Some(b'\t'));
    }

    #[test]
    fn json_uploads_dispatch_to_the_json_reader() {
        let upload = Upload::new("datos.json", &br#"[{"a": 1}]"#[..]);
        let out = read_upload(&upload, &ReadOptions::default()).unwrap();
        assert_eq!(out.table.cell(0, "a"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn unknown_extension_is_an_unsupported_format() {
        let upload = Upload::new("imagen.png", &b"\x89PNG"[..]);
        let err = read_upload(&upload, &ReadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported format"));
    }
}
