//! Saving tables as timestamped Parquet files plus the pointer record
//! other tools use to find the most recent one.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tabulado_core::Table;
use tabulado_formats::{read_parquet, write_parquet};

use crate::error::Result;
use crate::slug::safe_slug;

const POINTER_FILE: &str = "dataset_activo.json";

/// The pointer record: which dataset is current and where it lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPointer {
    pub last_file: String,
    pub last_path: PathBuf,
    pub original_name: String,
    pub saved_at: String,
    pub format: String,
    pub rows: usize,
    pub cols: usize,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct SaveReceipt {
    pub path: PathBuf,
    pub filename: String,
    pub pointer_path: PathBuf,
}

/// A directory of saved datasets. Every save writes a new Parquet file
/// named after the upload and the wall clock, then rewrites the pointer;
/// the pointer always names the latest save.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    data_dir: PathBuf,
}

impl DatasetStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn pointer_path(&self) -> PathBuf {
        self.data_dir.join(POINTER_FILE)
    }

    pub fn save(
        &self,
        table: &Table,
        original_name: &str,
        meta: serde_json::Value,
    ) -> Result<SaveReceipt> {
        fs::create_dir_all(&self.data_dir)?;
        let now = Local::now();
        let filename = format!(
            "dataset_{}_{}.parquet",
            safe_slug(original_name),
            now.format("%Y%m%d_%H%M%S")
        );
        let path = self.data_dir.join(&filename);
        write_parquet(table, File::create(&path)?)?;

        let pointer = DatasetPointer {
            last_file: filename.clone(),
            last_path: path.clone(),
            original_name: original_name.to_string(),
            saved_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            format: "parquet".to_string(),
            rows: table.n_rows(),
            cols: table.n_cols(),
            meta,
        };
        let pointer_path = self.pointer_path();
        fs::write(&pointer_path, serde_json::to_string_pretty(&pointer)?)?;
        log::info!("saved dataset {filename} ({} x {})", pointer.rows, pointer.cols);

        Ok(SaveReceipt {
            path,
            filename,
            pointer_path,
        })
    }

    /// The current pointer record, if a valid one exists.
    pub fn pointer(&self) -> Option<DatasetPointer> {
        let path = self.pointer_path();
        if !path.exists() {
            return None;
        }
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("could not read {}: {err}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(pointer) => Some(pointer),
            Err(err) => {
                log::warn!("malformed pointer {}: {err}", path.display());
                None
            }
        }
    }

    /// Load the dataset the pointer names. Any failure (no pointer, file
    /// moved, unreadable Parquet) means "no active dataset", never an
    /// error, so a fresh start is always possible.
    pub fn load_active(&self) -> Option<Table> {
        let pointer = self.pointer()?;
        let raw = match fs::read(&pointer.last_path) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!(
                    "active dataset {} is gone: {err}",
                    pointer.last_path.display()
                );
                return None;
            }
        };
        match read_parquet(&raw) {
            Ok(table) => Some(table),
            Err(err) => {
                log::warn!(
                    "active dataset {} is unreadable: {err}",
                    pointer.last_path.display()
                );
                None
            }
        }
    }
}
