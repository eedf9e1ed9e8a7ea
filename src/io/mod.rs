//! Reading registry snapshots and writing reconciliation outputs
//!
//! The core never touches the filesystem. Everything here works on paths and
//! reports failures through `anyhow`, leaving `ReconcileError` to input
//! validation.

pub mod json;
pub mod parquet;
pub mod report;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::RawRow;

pub use report::{
    DuplicateRow, DuplicateTables, MappingRow, PushBatchRow, load_previous_mapping,
    write_duplicate_outputs, write_match_outputs, write_push_batches,
};

/// On-disk table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Parquet,
    Json,
}

impl TableFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Ok(Self::Parquet),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => bail!(
                "Cannot determine table format of {}, expected .parquet or .json",
                path.display()
            ),
        }
    }

    /// File extension written for this format
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Json => "json",
        }
    }
}

/// Read a registry snapshot, choosing the reader by file extension
pub fn read_rows(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    match TableFormat::from_path(path)? {
        TableFormat::Parquet => parquet::read_parquet_rows(path),
        TableFormat::Json => json::read_json_rows(path),
    }
}

/// Write output rows in the requested format
pub fn write_rows<T>(path: &Path, rows: &[T], format: TableFormat) -> anyhow::Result<()>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    match format {
        TableFormat::Parquet => parquet::write_parquet(path, rows),
        TableFormat::Json => json::write_json(path, rows),
    }
}
