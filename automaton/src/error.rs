//! Failure taxonomy for workflow runs.
//!
//! Every variant is fail-stop: the pipeline never skips or retries a step
//! that produced one of these.

use automaton_auth::AuthError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which part of the stage/commit/push sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitSubStep {
    Stage,
    Commit,
    Push,
}

impl fmt::Display for GitSubStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitSubStep::Stage => write!(f, "stage"),
            GitSubStep::Commit => write!(f, "commit"),
            GitSubStep::Push => write!(f, "push"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("action '{action}' failed ({})\n{tail}", describe_code(*code))]
    ActionFailure {
        action: String,
        code: Option<i32>,
        tail: String,
    },

    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    #[error(
        "no commit message found in {}: add a message (lines starting with '#' are ignored) and run again",
        path.display()
    )]
    EmptyCommitMessage { path: PathBuf },

    #[error("git {step} failed: {detail}")]
    GitStepFailure { step: GitSubStep, detail: String },

    #[error(transparent)]
    Credential(#[from] AuthError),

    #[error("another run holds the lock at {}", path.display())]
    RunInProgress { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

impl PipelineError {
    /// Process exit code for this failure.
    ///
    /// Usage errors (unknown action) exit like clap does; everything else is
    /// a plain failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::UnknownAction { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_failure_display_includes_tail() {
        let err = PipelineError::ActionFailure {
            action: "leetcode".to_string(),
            code: Some(3),
            tail: "Traceback: boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("action 'leetcode' failed (exit code 3)"));
        assert!(msg.contains("Traceback: boom"));
    }

    #[test]
    fn action_failure_display_without_code() {
        let err = PipelineError::ActionFailure {
            action: "youtube".to_string(),
            code: None,
            tail: String::new(),
        };
        assert!(err.to_string().contains("no exit code"));
    }

    #[test]
    fn git_failure_names_sub_step() {
        let err = PipelineError::GitStepFailure {
            step: GitSubStep::Push,
            detail: "exit code 128".to_string(),
        };
        assert_eq!(err.to_string(), "git push failed: exit code 128");
    }

    #[test]
    fn exit_codes() {
        let unknown = PipelineError::UnknownAction {
            name: "nope".to_string(),
        };
        assert_eq!(unknown.exit_code(), 2);
        let empty = PipelineError::EmptyCommitMessage {
            path: PathBuf::from("commit_message.txt"),
        };
        assert_eq!(empty.exit_code(), 1);
    }

    #[test]
    fn credential_errors_pass_through() {
        let err: PipelineError = AuthError::RefreshRejected("HTTP 400".to_string()).into();
        assert!(err.to_string().starts_with("refresh token rejected"));
    }
}
