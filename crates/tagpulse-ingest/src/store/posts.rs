use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tagpulse_core::Post;

use super::read_rows;
use crate::error::StoreError;

/// The append-only post log (`posts.csv`).
#[derive(Debug, Clone)]
pub struct PostLog {
    path: PathBuf,
}

impl PostLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every recorded post, in append order. A missing log is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if any row is unparseable.
    pub fn load(&self) -> Result<Vec<Post>, StoreError> {
        read_rows(&self.path)
    }

    /// Append posts, writing the header only when the log is new or empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the log cannot be opened or written.
    pub fn append(&self, posts: &[Post]) -> Result<(), StoreError> {
        if posts.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        for post in posts {
            writer
                .serialize(post)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}
