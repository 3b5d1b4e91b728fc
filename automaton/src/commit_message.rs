//! Commit message resolution.
//!
//! An explicit `--message` wins verbatim. Otherwise the message comes from an
//! operator-edited file where blank lines and `#` lines are ignored. A missing
//! file is created from [`TEMPLATE`] and the run fails, so the first `full` run
//! on a fresh checkout always stops here until the operator writes a message.

use crate::error::PipelineError;
use std::fs;
use std::path::Path;

/// Written to a missing message file. Contains no message lines.
pub const TEMPLATE: &str = "\
# Write the commit message for the next `full` run below.
# Lines starting with '#' and blank lines are ignored.
# Every remaining line is kept, so multi-line messages work.
# Save the file and run the workflow again.
";

pub fn resolve(explicit: Option<&str>, path: &Path) -> Result<String, PipelineError> {
    if let Some(message) = explicit.filter(|m| !m.is_empty()) {
        return Ok(message.to_string());
    }

    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, TEMPLATE)?;
        tracing::info!(path = %path.display(), "created commit message template");
    }

    let message = filter(&fs::read_to_string(path)?);
    if message.is_empty() {
        return Err(PipelineError::EmptyCommitMessage {
            path: path.to_path_buf(),
        });
    }
    Ok(message)
}

/// Drop blank and comment lines, trim the rest and join them with `\n`.
pub fn filter(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}
