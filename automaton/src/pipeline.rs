//! Workflow execution.
//!
//! A requested name resolves to a [`Workflow`], which expands into an ordered
//! list of [`Step`]s. The executor walks them under a run lock, writing one run
//! log, and stops at the first failure:
//!
//! ```text
//! Idle -> Running(0) -> ... -> Running(n-1) -> Succeeded
//!                  \-> Failed { step, cause }
//! ```
//!
//! Resolution happens before the lock or the log are touched, so an unknown
//! name leaves the filesystem exactly as it was.

use crate::action::{ActionKind, ActionName};
use crate::commit_message;
use crate::config::Layout;
use crate::error::PipelineError;
use crate::git::GitStep;
use crate::invoker::{ActionInvoker, Invocation};
use crate::lock::RunLock;
use crate::output::Output;
use crate::run_log::RunLog;
use crate::temp;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Profile generation and linting; everything here must succeed before
/// anything is committed or published.
pub const PRE_COMMIT: [ActionName; 6] = [
    ActionName::Codeforces,
    ActionName::LeetCode,
    ActionName::SteamStats,
    ActionName::YouTube,
    ActionName::ChessCom,
    ActionName::MarkdownLint,
];

/// Publishing, after the commit.
pub const POST_PUSH: [ActionName; 2] = [ActionName::SyncCloud, ActionName::SyncLocal];

/// What a requested name expands into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Full,
    FullWithoutGit,
    Single(ActionName),
}

impl Workflow {
    /// Resolve a requested name; unknown names fail without side effects.
    pub fn resolve(name: &str) -> Result<Self, PipelineError> {
        match name {
            "full" => Ok(Workflow::Full),
            "full-without-git" => Ok(Workflow::FullWithoutGit),
            other => other
                .parse::<ActionName>()
                .map(Workflow::Single)
                .map_err(|name| PipelineError::UnknownAction { name }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Workflow::Full => "full",
            Workflow::FullWithoutGit => "full-without-git",
            Workflow::Single(action) => action.as_str(),
        }
    }

    pub fn steps(&self) -> Vec<Step> {
        let pre = PRE_COMMIT.iter().copied().map(Step::Action);
        let post = POST_PUSH.iter().copied().map(Step::Action);
        match self {
            Workflow::Full => pre
                .chain([Step::ResolveCommitMessage, Step::CommitAndPush])
                .chain(post)
                .collect(),
            Workflow::FullWithoutGit => pre.chain(post).collect(),
            Workflow::Single(ActionName::GitCommit) => {
                vec![Step::ResolveCommitMessage, Step::CommitAndPush]
            }
            Workflow::Single(ActionName::ClearTemp) => vec![Step::ClearTemp],
            Workflow::Single(ActionName::Help) => vec![Step::Help],
            Workflow::Single(action) => vec![Step::Action(*action)],
        }
    }
}

/// One unit of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An external action through the invoker.
    Action(ActionName),
    ResolveCommitMessage,
    CommitAndPush,
    ClearTemp,
    Help,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Action(action) => write!(f, "{action}"),
            Step::ResolveCommitMessage => write!(f, "commit-message"),
            Step::CommitAndPush => write!(f, "git-commit"),
            Step::ClearTemp => write!(f, "clear-temp"),
            Step::Help => write!(f, "help"),
        }
    }
}

#[derive(Debug)]
pub enum RunStatus {
    Idle,
    Running(usize),
    Succeeded,
    Failed { step: usize, cause: PipelineError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Report of one execution.
#[derive(Debug)]
pub struct WorkflowRun {
    pub action_name: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepResult>,
    pub status: RunStatus,
    /// `None` for runs that never open a log (`help`).
    pub log_path: Option<PathBuf>,
}

impl WorkflowRun {
    fn new(workflow: Workflow) -> Self {
        Self {
            action_name: workflow.name().to_string(),
            started_at: Utc::now(),
            steps: Vec::new(),
            status: RunStatus::Idle,
            log_path: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, RunStatus::Succeeded)
    }

    /// The failing step and its error, if the run failed.
    pub fn failure(&self) -> Option<(Step, &PipelineError)> {
        match &self.status {
            RunStatus::Failed { step, cause } => self.steps.get(*step).map(|r| (r.step, cause)),
            _ => None,
        }
    }

    /// Consume the report, yielding the failure cause if there was one.
    pub fn into_result(self) -> Result<(), PipelineError> {
        match self.status {
            RunStatus::Failed { cause, .. } => Err(cause),
            _ => Ok(()),
        }
    }
}

/// Per-run inputs from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub message: Option<String>,
    pub document_id: Option<String>,
}

pub struct PipelineExecutor {
    invoker: ActionInvoker,
    git: GitStep,
    layout: Layout,
}

impl PipelineExecutor {
    pub fn new(invoker: ActionInvoker, git: GitStep, layout: Layout) -> Self {
        Self {
            invoker,
            git,
            layout,
        }
    }

    /// Execute the workflow named `name`.
    ///
    /// `Err` means nothing ran (unknown name, lock held, log unwritable);
    /// step failures are reported on the returned [`WorkflowRun`].
    pub fn run(&self, name: &str, options: &RunOptions) -> Result<WorkflowRun, PipelineError> {
        let workflow = Workflow::resolve(name)?;
        let steps = workflow.steps();
        let mut run = WorkflowRun::new(workflow);

        if steps == [Step::Help] {
            print_catalogue();
            run.steps.push(StepResult {
                step: Step::Help,
                outcome: StepOutcome::Succeeded,
            });
            run.status = RunStatus::Succeeded;
            return Ok(run);
        }

        if steps.contains(&Step::ClearTemp) {
            temp::ensure_exists(&self.layout.temp_dir)?;
        }
        let _lock = RunLock::acquire(&self.layout.lock_file)?;
        let mut log = RunLog::create(&self.layout.run_log)?;
        run.log_path = Some(log.path().to_path_buf());
        log.line(format!(
            "automaton: '{}' started at {}",
            run.action_name,
            run.started_at.to_rfc3339()
        ))?;

        Output::header(format!("Workflow: {}", run.action_name));
        tracing::info!(workflow = %run.action_name, steps = steps.len(), "run started");

        let mut message: Option<String> = None;
        for (index, step) in steps.iter().copied().enumerate() {
            run.status = RunStatus::Running(index);
            Output::step(format!("[{}/{}] {step}", index + 1, steps.len()));

            match self.execute(step, options, &mut message, &mut log) {
                Ok(()) => run.steps.push(StepResult {
                    step,
                    outcome: StepOutcome::Succeeded,
                }),
                Err(cause) => {
                    tracing::warn!(%step, index, "step failed: {cause}");
                    log.line(format!("FAILED at step {} ({step}): {cause}", index + 1))?;
                    run.steps.push(StepResult {
                        step,
                        outcome: StepOutcome::Failed,
                    });
                    run.status = RunStatus::Failed { step: index, cause };
                    return Ok(run);
                }
            }
        }

        log.line(format!("automaton: '{}' succeeded", run.action_name))?;
        tracing::info!(workflow = %run.action_name, "run succeeded");
        run.status = RunStatus::Succeeded;
        Ok(run)
    }

    fn execute(
        &self,
        step: Step,
        options: &RunOptions,
        message: &mut Option<String>,
        log: &mut RunLog,
    ) -> Result<(), PipelineError> {
        match step {
            Step::Action(action) => {
                debug_assert_eq!(action.kind(), ActionKind::External);
                let invocation =
                    Invocation::orchestrated(action).with_document_id(options.document_id.clone());
                self.invoker.invoke(&invocation, log).map(|_| ())
            }
            Step::ResolveCommitMessage => {
                log.section("commit message")?;
                let resolved = commit_message::resolve(
                    options.message.as_deref(),
                    &self.layout.commit_message_file,
                )?;
                log.line(&resolved)?;
                *message = Some(resolved);
                Ok(())
            }
            Step::CommitAndPush => {
                let text = match message.take() {
                    Some(text) => text,
                    None => commit_message::resolve(
                        options.message.as_deref(),
                        &self.layout.commit_message_file,
                    )?,
                };
                self.git.commit_and_push(&text, log)
            }
            Step::ClearTemp => {
                log.section("clear-temp")?;
                let keep = [self.layout.run_log.as_path(), self.layout.lock_file.as_path()];
                for path in temp::clear(&self.layout.temp_dir, &keep)? {
                    Output::info(format!("Cleared {}", path.display()));
                    log.line(format!("cleared {}", path.display()))?;
                }
                Ok(())
            }
            Step::Help => {
                print_catalogue();
                Ok(())
            }
        }
    }
}

/// Print the workflows and every action with its description.
pub fn print_catalogue() {
    Output::header("Workflows");
    Output::kv(
        Workflow::Full.name(),
        "Generate profiles, commit and push, then sync",
    );
    Output::kv(
        Workflow::FullWithoutGit.name(),
        "Generate profiles, then sync (default)",
    );
    Output::header("Actions");
    for action in ActionName::ALL {
        Output::kv(action.as_str(), action.description());
    }
}
