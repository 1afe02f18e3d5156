use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tagpulse_core::{ForumAggregate, VideoAggregate};

use super::{read_rows, write_rows};
use crate::error::StoreError;

/// A row keyed by its tag.
pub trait TagRow {
    fn tag(&self) -> &str;
}

impl TagRow for ForumAggregate {
    fn tag(&self) -> &str {
        &self.tag
    }
}

impl TagRow for VideoAggregate {
    fn tag(&self) -> &str {
        &self.tag
    }
}

/// A one-row-per-tag CSV table held in memory in file order.
#[derive(Debug, Clone)]
pub struct AggregateTable<T> {
    path: PathBuf,
    rows: IndexMap<String, T>,
}

pub type ForumTable = AggregateTable<ForumAggregate>;
pub type VideoTable = AggregateTable<VideoAggregate>;

impl<T> AggregateTable<T>
where
    T: TagRow + Serialize + DeserializeOwned,
{
    /// Load the table; a missing file is an empty table. If the file holds
    /// several rows for one tag, the last one wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if a row is unparseable.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rows = read_rows::<T>(&path)?
            .into_iter()
            .map(|row| (row.tag().to_string(), row))
            .collect();
        Ok(Self { path, rows })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.rows.contains_key(tag)
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&T> {
        self.rows.get(tag)
    }

    /// Insert or replace the row for its tag, keeping the original position
    /// of a replaced row.
    pub fn upsert(&mut self, row: T) {
        self.rows.insert(row.tag().to_string(), row);
    }

    pub fn rows(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Atomically rewrite the table file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on serialization or I/O failure.
    pub fn save(&self) -> Result<(), StoreError> {
        let rows: Vec<&T> = self.rows.values().collect();
        write_rows(&self.path, &rows)
    }
}
