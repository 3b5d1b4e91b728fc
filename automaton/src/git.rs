//! Stage, commit, push.
//!
//! Each sub-step runs only if the previous one exited zero. Nothing is rolled
//! back: a commit followed by a failed push leaves the local repository one
//! commit ahead, and re-running the push is the recovery path.

use crate::command_runner::{CommandOptions, CommandRunner};
use crate::error::{GitSubStep, PipelineError};
use crate::invoker::tail_lines;
use crate::output::Output;
use crate::run_log::RunLog;
use std::path::PathBuf;
use std::sync::Arc;

const STDERR_TAIL_LINES: usize = 5;

pub struct GitStep {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl GitStep {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    pub fn commit_and_push(&self, message: &str, log: &mut RunLog) -> Result<(), PipelineError> {
        log.section("git")?;
        self.run(GitSubStep::Stage, &["add", "."], log)?;
        Output::step(format!("Committing with message:\n{message}"));
        self.run(GitSubStep::Commit, &["commit", "-m", message], log)?;
        self.run(GitSubStep::Push, &["push"], log)?;
        Ok(())
    }

    fn run(&self, step: GitSubStep, args: &[&str], log: &mut RunLog) -> Result<(), PipelineError> {
        tracing::debug!(%step, ?args, "git");
        let output = self
            .runner
            .run_output("git", args, &CommandOptions::with_cwd(&self.root))
            .map_err(|e| {
                tracing::debug!("git could not start: {e:#}");
                PipelineError::GitStepFailure {
                    step,
                    detail: "'git' could not be started; install git and make sure it is on PATH"
                        .to_string(),
                }
            })?;

        log.append_bytes(&output.stdout)?;
        log.append_bytes(&output.stderr)?;

        if output.status.success() {
            Output::step(format!("git {step}"));
            return Ok(());
        }

        let mut detail = match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "no exit code".to_string(),
        };
        let stderr = tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES);
        if !stderr.is_empty() {
            detail.push('\n');
            detail.push_str(&stderr);
        }
        Err(PipelineError::GitStepFailure { step, detail })
    }
}
