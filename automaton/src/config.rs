//! Configuration document and the concrete paths derived from it.
//!
//! The document is hierarchical YAML consumed only through dotted-path lookup
//! ([`Config::resolve`]). Lookups never fail: a missing key is an empty string,
//! and a bad path shows up later as a missing file or command.
//!
//! ```yaml
//! paths:
//!   temp: Temp
//!   commit_message: commit_message.txt
//!   run_log: automation.log
//!   token_file: token.json
//! auth:
//!   url_file: google_auth_url.txt
//!   code_file: google_auth_code.txt
//! cloud:
//!   scopes: https://www.googleapis.com/auth/documents https://www.googleapis.com/auth/drive
//! actions:
//!   command: python scripts/main.py
//!   setup: python -m pip install -q -r requirements.txt
//! ```

use anyhow::{Context, Result};
use automaton_auth::CredentialPaths;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Name of the run lock inside the temp directory.
pub const LOCK_FILE_NAME: &str = ".automaton.lock";

/// Parsed configuration document.
#[derive(Debug, Clone, Default)]
pub struct Config {
    document: Value,
}

impl Config {
    /// Load the document from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Parse the document from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(content)?;
        Ok(Self { document })
    }

    /// Look up a dotted key path such as `paths.temp`.
    ///
    /// Missing intermediate keys behave like empty mappings; a path ending on
    /// anything other than a string yields `""`.
    pub fn resolve(&self, dotted: &str) -> String {
        let mut node = &self.document;
        for key in dotted.split('.') {
            match node.get(key) {
                Some(child) => node = child,
                None => return String::new(),
            }
        }
        node.as_str().map(str::to_string).unwrap_or_default()
    }

    /// OAuth scopes from `cloud.scopes` (whitespace separated).
    pub fn scopes(&self) -> Vec<String> {
        self.resolve("cloud.scopes")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// A shell-words command line from `key`, or `None` when unset.
    pub fn command(&self, key: &str) -> Option<Vec<String>> {
        let raw = self.resolve(key);
        if raw.trim().is_empty() {
            return None;
        }
        match shlex::split(&raw) {
            Some(words) if !words.is_empty() => Some(words),
            _ => {
                tracing::warn!(key, raw = %raw, "could not split command line");
                None
            }
        }
    }
}

/// Concrete filesystem locations for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Repository root; git commands and actions run here.
    pub root: PathBuf,
    pub temp_dir: PathBuf,
    pub commit_message_file: PathBuf,
    pub run_log: PathBuf,
    pub lock_file: PathBuf,
    pub token_file: PathBuf,
    pub auth_url_file: PathBuf,
    pub auth_code_file: PathBuf,
}

impl Layout {
    /// Build the layout, refusing a document that leaves any path key empty.
    ///
    /// An empty `paths.temp` would make the repository root the temp
    /// directory, and `clear-temp` would then truncate everything in it.
    pub fn from_config(config: &Config, root: &Path) -> Result<Self> {
        let temp_dir = root.join(required(config, "paths.temp")?);
        Ok(Self {
            root: root.to_path_buf(),
            commit_message_file: temp_dir.join(required(config, "paths.commit_message")?),
            run_log: temp_dir.join(required(config, "paths.run_log")?),
            lock_file: temp_dir.join(LOCK_FILE_NAME),
            token_file: root.join(required(config, "paths.token_file")?),
            auth_url_file: temp_dir.join(required(config, "auth.url_file")?),
            auth_code_file: temp_dir.join(required(config, "auth.code_file")?),
            temp_dir,
        })
    }

    pub fn credential_paths(&self) -> CredentialPaths {
        CredentialPaths {
            token_file: self.token_file.clone(),
            url_file: self.auth_url_file.clone(),
            code_file: self.auth_code_file.clone(),
        }
    }
}

fn required(config: &Config, key: &str) -> Result<String> {
    let value = config.resolve(key);
    if value.trim().is_empty() {
        anyhow::bail!("Config key '{key}' is missing or empty");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
paths:
  temp: Temp
  commit_message: commit_message.txt
  run_log: automation.log
  token_file: token.json
  depth: 3
auth:
  url_file: google_auth_url.txt
  code_file: google_auth_code.txt
cloud:
  scopes: "scope.a  scope.b"
actions:
  command: python "scripts/main.py"
"#;

    fn sample() -> Config {
        Config::parse(SAMPLE).unwrap()
    }

    #[test]
    fn resolve_walks_nested_keys() {
        assert_eq!(sample().resolve("paths.temp"), "Temp");
        assert_eq!(sample().resolve("auth.code_file"), "google_auth_code.txt");
    }

    #[test]
    fn resolve_missing_intermediate_is_empty() {
        assert_eq!(sample().resolve("nothing.here.at_all"), "");
        assert_eq!(sample().resolve("paths.temp.deeper"), "");
    }

    #[test]
    fn resolve_non_string_leaf_is_empty() {
        assert_eq!(sample().resolve("paths.depth"), "");
        assert_eq!(sample().resolve("paths"), "");
    }

    #[test]
    fn resolve_on_empty_document_is_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.resolve("paths.temp"), "");
    }

    #[test]
    fn scopes_split_on_whitespace() {
        assert_eq!(sample().scopes(), vec!["scope.a", "scope.b"]);
    }

    #[test]
    fn command_splits_shell_words() {
        assert_eq!(
            sample().command("actions.command"),
            Some(vec!["python".to_string(), "scripts/main.py".to_string()])
        );
        assert_eq!(sample().command("actions.setup"), None);
    }

    #[test]
    fn layout_places_transient_files_in_temp() {
        let layout = Layout::from_config(&sample(), Path::new("/repo")).unwrap();
        assert_eq!(layout.temp_dir, PathBuf::from("/repo/Temp"));
        assert_eq!(
            layout.commit_message_file,
            PathBuf::from("/repo/Temp/commit_message.txt")
        );
        assert_eq!(layout.run_log, PathBuf::from("/repo/Temp/automation.log"));
        assert_eq!(layout.lock_file, PathBuf::from("/repo/Temp/.automaton.lock"));
        assert_eq!(layout.token_file, PathBuf::from("/repo/token.json"));
        assert_eq!(
            layout.credential_paths().url_file,
            PathBuf::from("/repo/Temp/google_auth_url.txt")
        );
    }

    #[test]
    fn layout_rejects_missing_path_keys() {
        let config = Config::parse("paths:\n  run_log: automation.log\n").unwrap();
        let err = Layout::from_config(&config, Path::new("/repo")).unwrap_err();
        assert!(err.to_string().contains("paths.temp"));

        for key in ["commit_message", "token_file", "run_log"] {
            let trimmed: String = SAMPLE
                .lines()
                .filter(|line| !line.trim_start().starts_with(&format!("{key}:")))
                .map(|line| format!("{line}\n"))
                .collect();
            let config = Config::parse(&trimmed).unwrap();
            let err = Layout::from_config(&config, Path::new("/repo")).unwrap_err();
            assert!(err.to_string().contains(&format!("paths.{key}")));
        }
    }

    #[test]
    fn layout_rejects_blank_temp() {
        let config = Config::parse(&SAMPLE.replace("temp: Temp", "temp: \"  \"")).unwrap();
        assert!(Layout::from_config(&config, Path::new("/repo")).is_err());
    }

    #[test]
    fn load_reports_path_on_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/config.yaml"));
    }
}
