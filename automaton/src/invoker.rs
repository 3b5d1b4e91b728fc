//! Runs one external action as an isolated subprocess.
//!
//! The action command line comes from `actions.command`; the action name is
//! appended, followed by the destination-document identifier for the
//! `sync-gdoc-*` family. Output goes verbatim into the run log.
//!
//! Whether the child is driven by the orchestrator travels on the
//! [`Invocation`] and reaches the child as `AUTOMATON_CALLER`. Nothing is
//! written to this process's own environment.

use crate::action::ActionName;
use crate::command_runner::{CommandOptions, CommandRunner};
use crate::error::PipelineError;
use crate::output::Output;
use crate::run_log::RunLog;
use automaton_auth::CredentialProvider;
use std::cell::Cell;
use std::path::PathBuf;
use std::sync::Arc;

/// Child environment variable naming who started the action.
pub const CALLER_ENV: &str = "AUTOMATON_CALLER";
/// Child environment variable carrying the cloud access token.
pub const ACCESS_TOKEN_ENV: &str = "AUTOMATON_ACCESS_TOKEN";
/// Lines of captured output kept in an [`PipelineError::ActionFailure`].
pub const FAILURE_TAIL_LINES: usize = 20;

/// Who is driving an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// Started by a workflow run.
    Orchestrator,
    /// Started directly; the child sees no caller signal.
    Standalone,
}

impl Caller {
    fn env_value(&self) -> Option<&'static str> {
        match self {
            Caller::Orchestrator => Some("orchestrator"),
            Caller::Standalone => None,
        }
    }
}

/// One request to run an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub action: ActionName,
    pub document_id: Option<String>,
    pub caller: Caller,
}

impl Invocation {
    pub fn orchestrated(action: ActionName) -> Self {
        Self {
            action,
            document_id: None,
            caller: Caller::Orchestrator,
        }
    }

    pub fn with_document_id(mut self, document_id: Option<String>) -> Self {
        self.document_id = document_id;
        self
    }

    fn args(&self) -> Vec<&str> {
        let mut args = vec![self.action.as_str()];
        if self.action.accepts_document_id() {
            if let Some(id) = self.document_id.as_deref().filter(|id| !id.is_empty()) {
                args.push(id);
            }
        }
        args
    }
}

/// A successful action run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: ActionName,
    pub output: String,
}

pub struct ActionInvoker {
    runner: Arc<dyn CommandRunner>,
    command: Vec<String>,
    setup: Option<Vec<String>>,
    cwd: PathBuf,
    credentials: Option<Arc<dyn CredentialProvider>>,
    setup_done: Cell<bool>,
}

impl ActionInvoker {
    /// `command` is the program and leading arguments; it must not be empty.
    pub fn new(runner: Arc<dyn CommandRunner>, command: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            command,
            setup: None,
            cwd: cwd.into(),
            credentials: None,
            setup_done: Cell::new(false),
        }
    }

    pub fn with_setup(mut self, setup: Option<Vec<String>>) -> Self {
        self.setup = setup.filter(|words| !words.is_empty());
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Run `invocation` to completion, single attempt.
    pub fn invoke(
        &self,
        invocation: &Invocation,
        log: &mut RunLog,
    ) -> Result<ActionOutcome, PipelineError> {
        let action = invocation.action;
        self.ensure_setup(log)?;

        let mut options = CommandOptions::with_cwd(&self.cwd);
        if let Some(value) = invocation.caller.env_value() {
            options = options.env(CALLER_ENV, value);
        }
        if action.touches_cloud() {
            match &self.credentials {
                Some(credentials) => {
                    let token = credentials.access_token()?;
                    options = options.env(ACCESS_TOKEN_ENV, token);
                }
                None => tracing::warn!(%action, "no credential provider; running without a token"),
            }
        }

        let Some((program, leading)) = self.command.split_first() else {
            return Err(PipelineError::ActionFailure {
                action: action.to_string(),
                code: None,
                tail: "actions.command is not configured".to_string(),
            });
        };
        let mut args: Vec<&str> = leading.iter().map(String::as_str).collect();
        args.extend(invocation.args());

        tracing::debug!(%action, program, ?args, "invoking action");
        log.section(action.as_str())?;

        let spinner = Output::spinner(format!("{action}: {}", action.description()));
        let output = match self.runner.run_output(program, &args, &options) {
            Ok(output) => output,
            Err(e) => {
                spinner.finish_error(format!("{action}: could not start"));
                let detail = format!("{e:#}");
                log.line(&detail)?;
                return Err(PipelineError::ActionFailure {
                    action: action.to_string(),
                    code: None,
                    tail: detail,
                });
            }
        };

        log.append_bytes(&output.stdout)?;
        log.append_bytes(&output.stderr)?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            spinner.finish_success(action.as_str());
            Ok(ActionOutcome {
                action,
                output: combined,
            })
        } else {
            spinner.finish_error(format!("{action} failed"));
            tracing::debug!(%action, code = ?output.status.code(), "action failed");
            Err(PipelineError::ActionFailure {
                action: action.to_string(),
                code: output.status.code(),
                tail: tail_lines(&combined, FAILURE_TAIL_LINES),
            })
        }
    }

    /// Install action dependencies once per invoker. Failures only warn.
    fn ensure_setup(&self, log: &mut RunLog) -> Result<(), PipelineError> {
        if self.setup_done.replace(true) {
            return Ok(());
        }
        let Some((program, args)) = self.setup.as_ref().and_then(|w| w.split_first()) else {
            return Ok(());
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        log.section("setup")?;
        match self
            .runner
            .run_output(program, &args, &CommandOptions::with_cwd(&self.cwd))
        {
            Ok(output) => {
                log.append_bytes(&output.stdout)?;
                log.append_bytes(&output.stderr)?;
                if !output.status.success() {
                    tracing::warn!(code = ?output.status.code(), "dependency setup failed");
                }
            }
            Err(e) => {
                tracing::warn!("dependency setup could not start: {e:#}");
                log.line(format!("{e:#}"))?;
            }
        }
        Ok(())
    }
}

/// Last `n` lines of `text`, joined with newlines.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::testing::MockCommandRunner;
    use automaton_auth::AuthError;
    use serial_test::serial;
    use std::path::Path;
    use tempfile::TempDir;

    struct FixedToken(&'static str);

    impl CredentialProvider for FixedToken {
        fn access_token(&self) -> Result<String, AuthError> {
            Ok(self.0.to_string())
        }
    }

    struct Pending;

    impl CredentialProvider for Pending {
        fn access_token(&self) -> Result<String, AuthError> {
            Err(AuthError::PendingAuthorization {
                url: "https://example.test/auth".to_string(),
                url_file: PathBuf::from("Temp/google_auth_url.txt"),
                code_file: PathBuf::from("Temp/google_auth_code.txt"),
            })
        }
    }

    fn command() -> Vec<String> {
        vec!["python".to_string(), "main.py".to_string()]
    }

    fn log_in(dir: &Path) -> RunLog {
        RunLog::create(&dir.join("automation.log")).unwrap()
    }

    #[test]
    fn success_appends_output_and_signals_caller() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new().respond("leetcode", 0, "solved 12\n", "warn\n"));
        let invoker = ActionInvoker::new(runner.clone(), command(), temp.path());

        let outcome = invoker
            .invoke(&Invocation::orchestrated(ActionName::LeetCode), &mut log)
            .unwrap();

        assert_eq!(outcome.output, "solved 12\nwarn\n");
        let calls = runner.calls();
        assert_eq!(calls[0].command_line(), "python main.py leetcode");
        assert!(calls[0]
            .options
            .env
            .contains(&(CALLER_ENV.to_string(), "orchestrator".to_string())));
        assert_eq!(calls[0].options.cwd.as_deref(), Some(temp.path()));
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("solved 12\nwarn\n"));
    }

    #[test]
    fn standalone_caller_sets_no_signal() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new());
        let invoker = ActionInvoker::new(runner.clone(), command(), temp.path());
        let invocation = Invocation {
            caller: Caller::Standalone,
            ..Invocation::orchestrated(ActionName::YouTube)
        };

        invoker.invoke(&invocation, &mut log).unwrap();
        assert!(runner.calls()[0].options.env.is_empty());
    }

    #[test]
    fn failure_carries_code_and_tail() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let noisy: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        let runner = Arc::new(MockCommandRunner::new().respond("codeforces", 3, &noisy, ""));
        let invoker = ActionInvoker::new(runner, command(), temp.path());

        let err = invoker
            .invoke(&Invocation::orchestrated(ActionName::Codeforces), &mut log)
            .unwrap_err();

        match err {
            PipelineError::ActionFailure { action, code, tail } => {
                assert_eq!(action, "codeforces");
                assert_eq!(code, Some(3));
                assert_eq!(tail.lines().count(), FAILURE_TAIL_LINES);
                assert!(tail.starts_with("line 11"));
                assert!(tail.ends_with("line 30"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("line 1\n"));
    }

    #[test]
    fn spawn_error_is_action_failure_without_code() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new().missing("python"));
        let invoker = ActionInvoker::new(runner, command(), temp.path());

        let err = invoker
            .invoke(&Invocation::orchestrated(ActionName::SteamStats), &mut log)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ActionFailure { code: None, .. }));
    }

    #[test]
    fn document_id_only_forwarded_to_gdoc_actions() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new());
        let invoker = ActionInvoker::new(runner.clone(), command(), temp.path())
            .with_credentials(Arc::new(FixedToken("tok")));
        let id = Some("1AbCdEf".to_string());

        invoker
            .invoke(
                &Invocation::orchestrated(ActionName::SyncGdocSteam).with_document_id(id.clone()),
                &mut log,
            )
            .unwrap();
        invoker
            .invoke(
                &Invocation::orchestrated(ActionName::SyncLocal).with_document_id(id),
                &mut log,
            )
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec!["python main.py sync-gdoc-steam 1AbCdEf", "python main.py sync-local"]
        );
    }

    #[test]
    fn cloud_action_gets_token_in_child_env() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new());
        let invoker = ActionInvoker::new(runner.clone(), command(), temp.path())
            .with_credentials(Arc::new(FixedToken("ya29.token")));

        invoker
            .invoke(&Invocation::orchestrated(ActionName::SyncCloud), &mut log)
            .unwrap();
        invoker
            .invoke(&Invocation::orchestrated(ActionName::SyncLocal), &mut log)
            .unwrap();

        let calls = runner.calls();
        let token = (ACCESS_TOKEN_ENV.to_string(), "ya29.token".to_string());
        assert!(calls[0].options.env.contains(&token));
        assert!(!calls[1].options.env.contains(&token));
    }

    #[test]
    fn pending_authorization_stops_before_spawning() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new());
        let invoker = ActionInvoker::new(runner.clone(), command(), temp.path())
            .with_credentials(Arc::new(Pending));

        let err = invoker
            .invoke(&Invocation::orchestrated(ActionName::SyncCloud), &mut log)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Credential(AuthError::PendingAuthorization { .. })
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn setup_runs_once_and_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new().fail("pip", 1));
        let setup = shlex::split("python -m pip install -r requirements.txt");
        let invoker = ActionInvoker::new(runner.clone(), command(), temp.path()).with_setup(setup);

        invoker
            .invoke(&Invocation::orchestrated(ActionName::ChessCom), &mut log)
            .unwrap();
        invoker
            .invoke(&Invocation::orchestrated(ActionName::YouTube), &mut log)
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "python -m pip install -r requirements.txt",
                "python main.py chess-com",
                "python main.py youtube",
            ]
        );
    }

    #[test]
    #[serial]
    fn caller_signal_never_lands_in_own_environment() {
        let temp = TempDir::new().unwrap();
        let mut log = log_in(temp.path());
        let runner = Arc::new(MockCommandRunner::new().fail("leetcode", 1));
        let invoker = ActionInvoker::new(runner, command(), temp.path());

        invoker
            .invoke(&Invocation::orchestrated(ActionName::Codeforces), &mut log)
            .unwrap();
        assert!(std::env::var_os(CALLER_ENV).is_none());

        invoker
            .invoke(&Invocation::orchestrated(ActionName::LeetCode), &mut log)
            .unwrap_err();
        assert!(std::env::var_os(CALLER_ENV).is_none());
    }

    #[test]
    fn tail_lines_handles_short_input() {
        assert_eq!(tail_lines("a\nb\n", 20), "a\nb");
        assert_eq!(tail_lines("", 20), "");
        assert_eq!(tail_lines("a\nb\nc", 2), "b\nc");
    }
}
