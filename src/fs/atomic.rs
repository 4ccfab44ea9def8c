//! Atomic file writes.
//!
//! All writes follow the same pattern:
//! 1. Write content to `.{filename}.tmp` in the target's directory
//! 2. Sync the temp file to disk
//! 3. Rename it over the target
//!
//! Source and destination must be on the same filesystem for the rename to be
//! atomic. On crash, a `.{filename}.tmp` file may remain.

use crate::error::{PromptBatchError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Create `dir` and all of its parents if missing.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| {
        PromptBatchError::Persistence(format!(
            "failed to create directory '{}': {}",
            dir.display(),
            e
        ))
    })
}

/// Atomically write bytes to a file, creating parent directories as needed.
///
/// ```no_run
/// use promptbatch::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("output/summary.md"), b"# Summary\n")?;
/// # Ok::<(), promptbatch::error::PromptBatchError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        ensure_dir(parent)?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        PromptBatchError::Persistence(format!(
            "failed to atomically replace '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PromptBatchError::Persistence(format!("invalid file path '{}'", target.display()))
        })?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        PromptBatchError::Persistence(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let written = file.write_all(content).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(path);
        return Err(PromptBatchError::Persistence(format!(
            "failed to write temporary file '{}': {}",
            path.display(),
            e
        )));
    }

    Ok(())
}
