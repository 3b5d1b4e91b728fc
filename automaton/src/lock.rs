//! One workflow run per installation.
//!
//! An advisory exclusive `flock` on `<temp>/.automaton.lock`, held until the
//! [`RunLock`] is dropped. The run log and the credential record are only
//! written while it is held.

use crate::error::PipelineError;
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub struct RunLock {
    path: PathBuf,
    _lock: Flock<File>,
}

impl RunLock {
    /// Take the lock without waiting; a held lock is [`PipelineError::RunInProgress`].
    pub fn acquire(path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                tracing::debug!(path = %path.display(), "run lock acquired");
                Ok(Self {
                    path: path.to_path_buf(),
                    _lock: lock,
                })
            }
            Err((_, Errno::EWOULDBLOCK)) => Err(PipelineError::RunInProgress {
                path: path.to_path_buf(),
            }),
            Err((_, errno)) => Err(PipelineError::Io(errno.into())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for RunLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLock").field("path", &self.path).finish()
    }
}
