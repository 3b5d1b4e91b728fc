//! automaton - collect profile activity and republish it
//!
//! Sequences a fixed set of external actions (profile generators, a markdown
//! linter, cloud and local sync jobs) and a git commit/push under fail-stop
//! semantics: the first failing step ends the run.
//!
//! # Workflows
//!
//! - `full-without-git` (default): generate every profile, then sync
//! - `full`: generate, commit and push, then sync
//! - any single action name: run just that action
//!
//! Cloud-touching actions get an access token from [`automaton_auth`] first.

pub mod action;
pub mod cli;
pub mod command_runner;
pub mod commit_message;
pub mod config;
pub mod error;
pub mod git;
pub mod invoker;
pub mod lock;
pub mod output;
pub mod pipeline;
pub mod run_log;
pub mod temp;

pub use action::ActionName;
pub use cli::Cli;
pub use error::PipelineError;
pub use pipeline::{PipelineExecutor, RunOptions, Workflow, WorkflowRun};
