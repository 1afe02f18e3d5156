//! Whole-file replacement helpers shared by every durable file in the workspace.

use std::io::Write;
use std::path::Path;

/// Replace `path` with `contents` so readers only ever see the old or the new file.
///
/// Writes to a temp file in the destination directory (same filesystem, so the
/// final rename is atomic), flushes it to disk, then renames it over `path`.
/// The parent directory is created if missing.
///
/// # Errors
///
/// Returns any I/O error from creating, writing, syncing, or renaming the temp file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
