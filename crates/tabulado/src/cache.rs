//! Session cache for decoded R uploads.
//!
//! Re-selecting an object from an `.rda` workspace must not re-parse the
//! bytes, so the decoded objects of the most recent R upload are kept
//! keyed by the upload signature. A different upload evicts the entry.

use tabulado_core::DataFormat;
use tabulado_formats::RObjects;

use crate::error::Result;
use crate::upload::{decode_r, read_upload, select_r, ReadOptions, ReadOutcome, Upload};

#[derive(Debug, Default)]
pub struct UploadCache {
    entry: Option<(String, RObjects)>,
}

impl UploadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`read_upload`], but R decodes go through the cache.
    pub fn read(&mut self, upload: &Upload, options: &ReadOptions) -> Result<ReadOutcome> {
        if upload.format()? != DataFormat::RData {
            return read_upload(upload, options);
        }
        let objects = self.objects(upload)?;
        select_r(objects, options.r_object.as_deref(), DataFormat::RData)
    }

    /// Materialize one object by name (or the first) from a cached R
    /// upload, decoding only on the first call per signature.
    pub fn select(&mut self, upload: &Upload, name: Option<&str>) -> Result<ReadOutcome> {
        let objects = self.objects(upload)?;
        select_r(objects, name, DataFormat::RData)
    }

    fn objects(&mut self, upload: &Upload) -> Result<&RObjects> {
        let signature = upload.signature();
        let hit = matches!(&self.entry, Some((key, _)) if *key == signature);
        if !hit {
            log::debug!("decoding R upload {signature}");
            let decoded = decode_r(upload)?;
            let (_, objects) = self.entry.insert((signature, decoded));
            return Ok(objects);
        }
        match &self.entry {
            Some((_, objects)) => Ok(objects),
            None => Err(tabulado_formats::FormatError::Empty.into()),
        }
    }
}
