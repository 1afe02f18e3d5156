use std::path::{Path, PathBuf};

use crate::error::QueueError;
use crate::file::{load_array, store_array, FileLock, Loaded};
use crate::task::TaskResult;

/// Append-only JSON log of task outcomes.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one result under the result-log lock.
    ///
    /// A log that no longer parses is renamed to
    /// `<name>.corrupt-<unix-ts>-<suffix>` and a new log is started with this result.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on lock or I/O failure.
    pub fn append(&self, result: &TaskResult) -> Result<(), QueueError> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut results = match load_array::<TaskResult>(&self.path)? {
            Loaded::Missing => Vec::new(),
            Loaded::Parsed(results) => results,
            Loaded::Corrupt(e) => {
                let aside = self.quarantine()?;
                tracing::warn!(
                    error = %e,
                    moved_to = %aside.display(),
                    "result log unreadable; moved aside"
                );
                Vec::new()
            }
        };
        results.push(result.clone());
        store_array(&self.path, &results)
    }

    /// All recorded results, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Corrupt`] if the log is not a JSON array.
    pub fn load(&self) -> Result<Vec<TaskResult>, QueueError> {
        match load_array::<TaskResult>(&self.path)? {
            Loaded::Missing => Ok(Vec::new()),
            Loaded::Parsed(results) => Ok(results),
            Loaded::Corrupt(source) => Err(QueueError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    /// The `limit` most recent results, oldest first.
    ///
    /// # Errors
    ///
    /// See [`ResultLog::load`].
    pub fn recent(&self, limit: usize) -> Result<Vec<TaskResult>, QueueError> {
        let mut results = self.load()?;
        let skip = results.len().saturating_sub(limit);
        results.drain(..skip);
        Ok(results)
    }

    fn quarantine(&self) -> Result<PathBuf, QueueError> {
        let mut name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        name.push(format!(
            ".corrupt-{}-{}",
            chrono::Utc::now().timestamp(),
            &suffix[..8]
        ));
        let aside = self.path.with_file_name(name);
        std::fs::rename(&self.path, &aside).map_err(|e| QueueError::io(&self.path, e))?;
        Ok(aside)
    }
}
