//! CLI argument definitions for automaton.
//!
//! Separated from `main.rs` so the integration tests and the library can
//! share the same defaults.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::RunOptions;

/// Workflow run when no action is given.
pub const DEFAULT_ACTION: &str = "full-without-git";
/// Config file looked up in the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Parser)]
#[command(name = "automaton")]
#[command(about = "Automaton - collect profile activity and republish it, fail-stop")]
#[command(version)]
pub struct Cli {
    /// Workflow (`full`, `full-without-git`) or single action to run
    ///
    /// Run `automaton help` for the list of actions.
    #[arg(default_value = DEFAULT_ACTION)]
    pub action: String,

    /// Commit message, used by `full` and `git-commit` instead of the message file
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Destination document identifier for the `sync-gdoc-*` actions
    #[arg(long = "doc-id")]
    pub doc_id: Option<String>,

    /// Configuration document [default: <root>/config.yaml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Repository root [default: current directory]
    #[arg(long)]
    pub root: Option<PathBuf>,
}

impl Cli {
    pub fn root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().context("Failed to get current directory"),
        }
    }

    pub fn config_path(&self, root: &std::path::Path) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE))
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            message: self.message.clone(),
            document_id: self.doc_id.clone(),
        }
    }
}
