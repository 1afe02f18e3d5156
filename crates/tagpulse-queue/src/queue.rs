use std::path::{Path, PathBuf};

use crate::error::QueueError;
use crate::file::{load_array, remove_if_exists, store_array, FileLock, Loaded};
use crate::task::{new_task_id, QueueEntry};

/// Result of one locked dequeue attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued {
    /// The queue file does not exist.
    Absent,
    /// The queue file was unreadable as a JSON array and has been deleted.
    Corrupt,
    /// The queue file held an empty array and has been deleted.
    Drained,
    /// The head entry; the remainder is already persisted.
    Entry(QueueEntry),
}

/// Handle to the durable FIFO queue file.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    path: PathBuf,
}

impl TaskQueue {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a command under a fresh task id, logging instead of returning
    /// failures.
    ///
    /// Producers run inside request-style handlers where a queue failure must
    /// not abort the caller; use [`TaskQueue::try_enqueue`] to observe errors.
    pub fn enqueue(&self, command: &str) {
        self.enqueue_with_id(&new_task_id(), command);
    }

    /// Append `{task_id, command}`, logging instead of returning failures.
    pub fn enqueue_with_id(&self, task_id: &str, command: &str) {
        if let Err(e) = self.try_enqueue_with_id(task_id, command) {
            tracing::error!(
                error = %e,
                path = %self.path.display(),
                task_id,
                command,
                "failed to enqueue task"
            );
        }
    }

    /// Append a command under a fresh task id and return the id.
    ///
    /// # Errors
    ///
    /// See [`TaskQueue::try_enqueue_with_id`].
    pub fn try_enqueue(&self, command: &str) -> Result<String, QueueError> {
        let task_id = new_task_id();
        self.try_enqueue_with_id(&task_id, command)?;
        Ok(task_id)
    }

    /// Append `{task_id, command}` to the queue under the queue lock.
    ///
    /// A missing or corrupt queue file is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the lock cannot be taken or the file cannot
    /// be rewritten.
    pub fn try_enqueue_with_id(&self, task_id: &str, command: &str) -> Result<(), QueueError> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut entries = match load_array::<QueueEntry>(&self.path)? {
            Loaded::Missing => Vec::new(),
            Loaded::Parsed(entries) => entries,
            Loaded::Corrupt(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "queue file unreadable; starting a fresh queue"
                );
                Vec::new()
            }
        };
        entries.push(QueueEntry::new(task_id, command));
        store_array(&self.path, &entries)?;
        tracing::debug!(task_id, command, "task enqueued");
        Ok(())
    }

    /// Remove the head entry under the queue lock.
    ///
    /// The remainder is written back before this returns, so an entry handed
    /// out here is never handed out again even if the caller crashes while
    /// running it.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on lock or I/O failure.
    pub fn dequeue(&self) -> Result<Dequeued, QueueError> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut entries = match load_array::<QueueEntry>(&self.path)? {
            Loaded::Missing => return Ok(Dequeued::Absent),
            Loaded::Corrupt(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "deleting corrupt queue file"
                );
                remove_if_exists(&self.path)?;
                return Ok(Dequeued::Corrupt);
            }
            Loaded::Parsed(entries) => entries,
        };
        if entries.is_empty() {
            remove_if_exists(&self.path)?;
            return Ok(Dequeued::Drained);
        }
        let head = entries.remove(0);
        store_array(&self.path, &entries)?;
        Ok(Dequeued::Entry(head))
    }

    /// Snapshot of pending entries without modifying the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Corrupt`] if the file is not a JSON array.
    pub fn pending(&self) -> Result<Vec<QueueEntry>, QueueError> {
        let _lock = FileLock::acquire(&self.path)?;
        match load_array::<QueueEntry>(&self.path)? {
            Loaded::Missing => Ok(Vec::new()),
            Loaded::Parsed(entries) => Ok(entries),
            Loaded::Corrupt(source) => Err(QueueError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}
