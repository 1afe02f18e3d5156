use std::path::{Path, PathBuf};

use tagpulse_core::AnalyticsRecord;

use super::{read_rows, write_rows};
use crate::error::StoreError;

/// The derived metrics file (`analytics.csv`), always replaced as a whole.
#[derive(Debug, Clone)]
pub struct AnalyticsFile {
    path: PathBuf,
}

impl AnalyticsFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if a row is unparseable.
    pub fn load(&self) -> Result<Vec<AnalyticsRecord>, StoreError> {
        read_rows(&self.path)
    }

    /// Replace the file with `records`; prior contents are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on serialization or I/O failure.
    pub fn replace(&self, records: &[AnalyticsRecord]) -> Result<(), StoreError> {
        write_rows(&self.path, records)
    }
}
