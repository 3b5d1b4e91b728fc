//! Append-only diagnostic log for one workflow run.
//!
//! Truncated when the run starts, then only ever appended to by the running
//! process. Single writer, so no locking beyond the run lock.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create (or truncate) the log at `path`, creating parent directories.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append text verbatim.
    pub fn append(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.flush()
    }

    /// Append raw process output verbatim.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    /// Append a single line, adding the newline.
    pub fn line(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        self.append(&format!("{}\n", text.as_ref()))
    }

    /// Append a banner separating one step's output from the next.
    pub fn section(&mut self, title: impl AsRef<str>) -> io::Result<()> {
        let rule = "=".repeat(20);
        self.append(&format!(
            "\n{rule}\n {} \n{rule}\n",
            title.as_ref().to_uppercase()
        ))
    }
}
