//! Durable CSV files in the data directory.
//!
//! The post log is append-only. Every other file is rewritten as a whole
//! through a temp file and rename, so readers never observe a partial table.

mod analytics;
mod links;
mod posts;
mod tables;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use analytics::AnalyticsFile;
pub use links::write_links;
pub use posts::PostLog;
pub use tables::{AggregateTable, ForumTable, TagRow, VideoTable};

use crate::error::StoreError;

/// Read every row of a headed CSV file. A missing file has no rows.
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if a row does not match `T`.
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            return match e.kind() {
                csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    Ok(Vec::new())
                }
                _ => Err(StoreError::csv(path, e)),
            }
        }
    };
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| StoreError::corrupt(path, e))
}

/// Atomically replace `path` with a headed CSV of `rows`.
pub(crate) fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(|e| StoreError::csv(path, e))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| StoreError::io(path, e.into_error()))?;
    tagpulse_core::atomic_write(path, &body).map_err(|e| StoreError::io(path, e))
}
