//! Locking and whole-array JSON persistence for the queue and result files.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::QueueError;

/// Exclusive advisory lock on `<target>.lock`, released on drop.
///
/// The lock lives on a sidecar file rather than the target itself because the
/// target is replaced by rename (and sometimes deleted) while the lock is held.
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    pub(crate) fn acquire(target: &Path) -> Result<Self, QueueError> {
        let path = lock_path(target);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| QueueError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| QueueError::io(&path, e))?;
        file.lock().map_err(|e| QueueError::io(&path, e))?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(error = %e, "failed to release file lock");
        }
    }
}

fn lock_path(target: &Path) -> PathBuf {
    let mut name: OsString = target
        .file_name()
        .map_or_else(|| OsString::from("queue"), ToOwned::to_owned);
    name.push(".lock");
    target.with_file_name(name)
}

/// Result of reading a JSON-array file.
pub(crate) enum Loaded<T> {
    Missing,
    Parsed(Vec<T>),
    Corrupt(serde_json::Error),
}

pub(crate) fn load_array<T: DeserializeOwned>(path: &Path) -> Result<Loaded<T>, QueueError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Loaded::Missing),
        Err(e) => return Err(QueueError::io(path, e)),
    };
    match serde_json::from_slice::<Vec<T>>(&bytes) {
        Ok(items) => Ok(Loaded::Parsed(items)),
        Err(e) => Ok(Loaded::Corrupt(e)),
    }
}

pub(crate) fn store_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), QueueError> {
    let mut body = serde_json::to_vec_pretty(items).map_err(|source| QueueError::Serialize {
        path: path.display().to_string(),
        source,
    })?;
    body.push(b'\n');
    tagpulse_core::atomic_write(path, &body).map_err(|e| QueueError::io(path, e))
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<(), QueueError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(QueueError::io(path, e)),
    }
}
