//! The native `clear-temp` action.

use crate::error::PipelineError;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Fail unless `dir` is an existing directory.
///
/// Checked before the run lock is taken, since taking it creates `dir`.
pub fn ensure_exists(dir: &Path) -> Result<(), PipelineError> {
    if dir.is_dir() {
        return Ok(());
    }
    Err(PipelineError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("temp directory not found at {}", dir.display()),
    )))
}

/// Truncate every regular file directly inside `dir`.
///
/// `.gitignore` (any case) and the paths in `keep` are left alone;
/// subdirectories are not entered. Returns the truncated files, sorted.
pub fn clear(dir: &Path, keep: &[&Path]) -> Result<Vec<PathBuf>, PipelineError> {
    ensure_exists(dir)?;
    let mut cleared = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(".gitignore") {
            continue;
        }
        if keep.contains(&path.as_path()) {
            continue;
        }
        OpenOptions::new().write(true).truncate(true).open(&path)?;
        tracing::debug!(path = %path.display(), "cleared");
        cleared.push(path);
    }
    cleared.sort();
    Ok(cleared)
}
