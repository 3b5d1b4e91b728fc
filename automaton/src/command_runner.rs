//! Abstraction over external command execution for testability.
//!
//! Every subprocess the orchestrator starts (external actions, their
//! dependency setup, git) goes through the [`CommandRunner`] trait.
//!
//! # Production Usage
//!
//! [`RealCommandRunner`] delegates to [`std::process::Command`].
//!
//! # Testing Usage
//!
//! `testing::MockCommandRunner` records all calls and returns canned exit
//! codes, so pipeline ordering can be asserted without spawning anything.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Command, Output};

/// Trait for abstracting external command execution.
///
/// Stored as `Arc<dyn CommandRunner>` by the action invoker and the git step.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture stdout, stderr and exit status.
    ///
    /// Blocks until the child exits; there is no timeout.
    fn run_output(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<Output>;
}

/// Options for command execution.
#[derive(Debug, Default, Clone)]
pub struct CommandOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Additional environment variables, applied to the child only.
    pub env: Vec<(String, String)>,
}

impl CommandOptions {
    /// Create options with a working directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Default::default()
        }
    }

    /// Add an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Production implementation that delegates to [`std::process::Command`].
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run_output(&self, program: &str, args: &[&str], options: &CommandOptions) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &options.env {
            cmd.env(k, v);
        }
        cmd.output()
            .with_context(|| format!("Failed to run '{program}'"))
    }
}

/// Test utilities for command mocking.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use std::sync::Mutex;

    /// One recorded invocation.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub program: String,
        pub args: Vec<String>,
        pub options: CommandOptions,
    }

    impl RecordedCall {
        /// `program arg1 arg2 ...` for compact assertions.
        pub fn command_line(&self) -> String {
            std::iter::once(self.program.as_str())
                .chain(self.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        }
    }

    /// Canned behavior for a matched command.
    #[derive(Debug, Clone)]
    enum Canned {
        Exit { code: i32, stdout: String, stderr: String },
        SpawnError,
    }

    /// Records calls; every command succeeds unless told otherwise.
    ///
    /// Responses are keyed by any argument (or the program name), so
    /// `fail("leetcode", 1)` fails whichever call mentions `leetcode`.
    #[derive(Default)]
    pub struct MockCommandRunner {
        calls: Mutex<Vec<RecordedCall>>,
        canned: Mutex<HashMap<String, Canned>>,
    }

    impl MockCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail(self, word: &str, code: i32) -> Self {
            self.respond(word, code, "", &format!("{word} exploded\n"))
        }

        pub fn respond(self, word: &str, code: i32, stdout: &str, stderr: &str) -> Self {
            self.canned.lock().unwrap().insert(
                word.to_string(),
                Canned::Exit {
                    code,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
            );
            self
        }

        /// Make any call mentioning `word` fail to spawn at all.
        pub fn missing(self, word: &str) -> Self {
            self.canned
                .lock()
                .unwrap()
                .insert(word.to_string(), Canned::SpawnError);
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn command_lines(&self) -> Vec<String> {
            self.calls().iter().map(RecordedCall::command_line).collect()
        }
    }

    impl CommandRunner for MockCommandRunner {
        fn run_output(
            &self,
            program: &str,
            args: &[&str],
            options: &CommandOptions,
        ) -> Result<Output> {
            self.calls.lock().unwrap().push(RecordedCall {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                options: options.clone(),
            });
            let canned = self.canned.lock().unwrap();
            let hit = std::iter::once(program)
                .chain(args.iter().copied())
                .find_map(|word| canned.get(word).cloned());
            match hit {
                Some(Canned::SpawnError) => anyhow::bail!("Failed to run '{program}'"),
                Some(Canned::Exit {
                    code,
                    stdout,
                    stderr,
                }) => Ok(Output {
                    status: ExitStatus::from_raw(code << 8),
                    stdout: stdout.into_bytes(),
                    stderr: stderr.into_bytes(),
                }),
                None => Ok(Output {
                    status: ExitStatus::from_raw(0),
                    stdout: format!("{program} ok\n").into_bytes(),
                    stderr: Vec::new(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockCommandRunner;
    use super::*;

    #[test]
    fn test_command_options_default() {
        let opts = CommandOptions::default();
        assert!(opts.cwd.is_none());
        assert!(opts.env.is_empty());
    }

    #[test]
    fn test_command_options_with_cwd_and_env() {
        let opts = CommandOptions::with_cwd("/tmp").env("KEY", "value");
        assert_eq!(opts.cwd.as_ref().unwrap().to_str().unwrap(), "/tmp");
        assert_eq!(opts.env, vec![("KEY".to_string(), "value".to_string())]);
    }

    #[test]
    fn test_real_runner_output() {
        let runner = RealCommandRunner;
        let output = runner
            .run_output("echo", &["hello"], &CommandOptions::default())
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn test_real_runner_env_reaches_child_only() {
        let runner = RealCommandRunner;
        let output = runner
            .run_output(
                "sh",
                &["-c", "printf %s \"$AUTOMATON_RUNNER_PROBE\""],
                &CommandOptions::default().env("AUTOMATON_RUNNER_PROBE", "seen"),
            )
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "seen");
        assert!(std::env::var("AUTOMATON_RUNNER_PROBE").is_err());
    }

    #[test]
    fn test_real_runner_missing_program_is_error() {
        let runner = RealCommandRunner;
        let result = runner.run_output(
            "automaton-definitely-not-installed",
            &[],
            &CommandOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mock_runner_canned_failure() {
        let runner = MockCommandRunner::new().fail("leetcode", 4);
        let ok = runner
            .run_output("python", &["main.py", "codeforces"], &CommandOptions::default())
            .unwrap();
        let failed = runner
            .run_output("python", &["main.py", "leetcode"], &CommandOptions::default())
            .unwrap();
        assert!(ok.status.success());
        assert_eq!(failed.status.code(), Some(4));
        assert_eq!(
            runner.command_lines(),
            vec!["python main.py codeforces", "python main.py leetcode"]
        );
    }
}
