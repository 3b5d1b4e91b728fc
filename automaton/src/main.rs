use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use automaton::action::ActionName;
use automaton::command_runner::{CommandRunner, RealCommandRunner};
use automaton::config::{Config, Layout};
use automaton::git::GitStep;
use automaton::invoker::ActionInvoker;
use automaton::output::Output;
use automaton::pipeline::{self, PipelineExecutor, RunStatus};
use automaton::{Cli, PipelineError, Workflow};
use automaton_auth::{AuthError, CredentialManager};

fn main() -> ExitCode {
    // Initialize tracing with RUST_LOG env filter
    // e.g., RUST_LOG=automaton=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            Output::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let workflow = match Workflow::resolve(&cli.action) {
        Ok(workflow) => workflow,
        Err(e) => return Ok(report(&e, None)),
    };
    if workflow == Workflow::Single(ActionName::Help) {
        pipeline::print_catalogue();
        return Ok(ExitCode::SUCCESS);
    }
    warn_unused_options(cli, workflow);

    let root = cli.root()?;
    let config = Config::load(&cli.config_path(&root))?;
    let layout = Layout::from_config(&config, &root)?;
    tracing::debug!(?layout, "layout resolved");

    let runner: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
    let credentials = CredentialManager::from_env(config.scopes(), layout.credential_paths());
    let invoker = ActionInvoker::new(
        runner.clone(),
        config.command("actions.command").unwrap_or_default(),
        &root,
    )
    .with_setup(config.command("actions.setup"))
    .with_credentials(Arc::new(credentials));
    let git = GitStep::new(runner, &root);
    let executor = PipelineExecutor::new(invoker, git, layout);

    let run = match executor.run(&cli.action, &cli.run_options()) {
        Ok(run) => run,
        Err(e) => return Ok(report(&e, None)),
    };

    if let RunStatus::Failed { step, cause } = &run.status {
        Output::error(format!(
            "Workflow '{}' failed at step {}",
            run.action_name,
            step + 1
        ));
        return Ok(report(cause, run.log_path.as_deref()));
    }
    Output::success(format!("Workflow '{}' completed", run.action_name));
    Ok(ExitCode::SUCCESS)
}

/// Print `err` with whatever the operator needs to do next.
fn report(err: &PipelineError, log: Option<&std::path::Path>) -> ExitCode {
    Output::error(err.to_string());
    match err {
        PipelineError::UnknownAction { .. } => pipeline::print_catalogue(),
        PipelineError::Credential(AuthError::PendingAuthorization {
            url,
            url_file,
            code_file,
        }) => {
            Output::hint(format!("Open this URL in a browser: {url}"));
            Output::hint(format!("(also saved to {})", url_file.display()));
            Output::hint(format!(
                "Paste the authorization code into {} and run again",
                code_file.display()
            ));
        }
        PipelineError::Credential(AuthError::MissingClientIdentity(var)) => {
            Output::hint(format!("Set {var} in the environment and run again"));
        }
        PipelineError::Credential(AuthError::CorruptRecord { path, .. }) => {
            Output::hint(format!("Delete {} and run again to re-authorize", path.display()));
        }
        PipelineError::Credential(auth) if auth.needs_operator() => {
            Output::hint("Run again once the credential issue above is resolved");
        }
        PipelineError::EmptyCommitMessage { path } => {
            Output::hint(format!("Edit {} or pass --message", path.display()));
        }
        PipelineError::RunInProgress { .. } => {
            Output::hint("Wait for the other run to finish");
        }
        _ => {}
    }
    if let Some(log) = log {
        Output::hint(format!("Full output in {}", log.display()));
    }
    ExitCode::from(err.exit_code() as u8)
}

fn warn_unused_options(cli: &Cli, workflow: Workflow) {
    let takes_message = matches!(
        workflow,
        Workflow::Full | Workflow::Single(ActionName::GitCommit)
    );
    if cli.message.is_some() && !takes_message {
        Output::warning(format!("--message is ignored by '{}'", workflow.name()));
    }
    let takes_doc_id = matches!(workflow, Workflow::Single(action) if action.accepts_document_id());
    if cli.doc_id.is_some() && !takes_doc_id {
        Output::warning(format!("--doc-id is ignored by '{}'", workflow.name()));
    }
}
