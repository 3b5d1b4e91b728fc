//! Durable token record for the cloud destination.
//!
//! One record per installation, stored as JSON at the configured token path.
//! Written with write-to-temp + rename so a crash never leaves half a record.

use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Persisted authorization state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    pub expiry: DateTime<Utc>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl CredentialRecord {
    /// True when the access token expires within `margin` of `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expiry - margin <= now
    }

    /// Load the record, returning `None` when the file doesn't exist.
    ///
    /// A file that is not a valid record is reported with its path rather
    /// than treated as missing.
    pub fn load(path: &Path) -> Result<Option<Self>, AuthError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| AuthError::CorruptRecord {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Atomically replace the record on disk.
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Remove the record. A missing file is not an error.
    pub fn delete(path: &Path) -> Result<(), AuthError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
