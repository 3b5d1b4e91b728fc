//! Output helpers for consistent CLI output.
//!
//! Status lines use colored prefixes in the cargo style; a spinner runs while
//! an external action blocks the pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use automaton::output::Output;
//!
//! Output::header("Workflow: full");
//! let spinner = Output::spinner("codeforces");
//! // ... wait for the action ...
//! spinner.finish_success("codeforces");
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::borrow::Cow;
use std::time::Duration;

/// Standard output helper for consistent CLI formatting.
pub struct Output;

impl Output {
    /// Print a success message with a green checkmark.
    ///
    /// Example: `✓ Workflow 'full' completed`
    pub fn success(msg: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), msg.as_ref());
    }

    /// Print an error message with a red X to stderr.
    ///
    /// Example: `✗ Workflow 'full' failed at step 3`
    pub fn error(msg: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), msg.as_ref().red());
    }

    /// Print a warning message with a yellow warning symbol.
    pub fn warning(msg: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow(), msg.as_ref());
    }

    /// Print an info/status message with a cyan arrow.
    pub fn info(msg: impl AsRef<str>) {
        println!("{} {}", "→".cyan(), msg.as_ref().dimmed());
    }

    /// Print a step message (for multi-step operations).
    ///
    /// Example: `• [2/10] leetcode`
    pub fn step(msg: impl AsRef<str>) {
        println!("  {} {}", "•".cyan(), msg.as_ref());
    }

    /// Print a header/section title.
    pub fn header(msg: impl AsRef<str>) {
        println!("\n{}\n", msg.as_ref().bold().cyan());
    }

    /// Print a key-value pair with alignment.
    ///
    /// Example: `  sync-local:        Copy the shared directory...`
    pub fn kv(key: impl AsRef<str>, value: impl AsRef<str>) {
        println!(
            "  {:<28} {}",
            format!("{}:", key.as_ref()).cyan(),
            value.as_ref()
        );
    }

    /// Print a hint/suggestion message (indented with arrow) to stderr.
    ///
    /// Example: `  → Open the URL in Temp/google_auth_url.txt`
    pub fn hint(msg: impl AsRef<str>) {
        eprintln!("  {} {}", "→".cyan(), msg.as_ref());
    }

    /// Create a spinner for long-running operations.
    ///
    /// The spinner draws to stderr and stays hidden when that isn't a terminal.
    pub fn spinner(msg: impl Into<Cow<'static, str>>) -> Spinner {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(80));
        Spinner(pb)
    }
}

/// A spinner for long-running operations.
///
/// Created via `Output::spinner()`.
pub struct Spinner(ProgressBar);

impl Spinner {
    /// Finish with a success message.
    pub fn finish_success(self, msg: impl AsRef<str>) {
        self.0
            .finish_with_message(format!("{} {}", "✓".green().bold(), msg.as_ref()));
    }

    /// Finish with an error message.
    pub fn finish_error(self, msg: impl AsRef<str>) {
        self.0
            .finish_with_message(format!("{} {}", "✗".red().bold(), msg.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_methods_dont_panic() {
        Output::success("test");
        Output::error("test");
        Output::warning("test");
        Output::info("test");
        Output::step("test");
        Output::header("test");
        Output::hint("test");
        Output::kv("key", "value");
    }

    #[test]
    fn test_spinner_lifecycle() {
        Output::spinner("Testing...").finish_success("Done");
        Output::spinner("Testing...").finish_error("Failed");
    }
}
