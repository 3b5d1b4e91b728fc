//! Credential lifecycle state machine.
//!
//! ```text
//! NoRecord ──(first cloud use)──▶ PendingAuthorization ──(code file)──▶ Authorized(expiry)
//!     ▲                                                                      │
//!     └──────────────────────(refresh token rejected)───────────────────────┘
//! ```
//!
//! The filesystem is the only store. The URL file and the code file carry the
//! human-in-the-loop exchange, so the manager works on hosts where nothing can
//! listen for an OAuth redirect. Every call is a single poll: no waiting, no
//! retry loop.

use crate::client::{ClientIdentity, MissingVar};
use crate::error::AuthError;
use crate::http::{HttpTokenEndpoint, TokenEndpoint, TokenFailure, TokenResponse};
use crate::record::CredentialRecord;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::PathBuf;

/// Tokens are refreshed this long before they actually expire.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Where the manager keeps its state.
#[derive(Debug, Clone)]
pub struct CredentialPaths {
    /// Durable token record (JSON).
    pub token_file: PathBuf,
    /// Authorization URL written for the operator.
    pub url_file: PathBuf,
    /// One-time authorization code pasted by the operator.
    pub code_file: PathBuf,
}

/// Observable state of the credential lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    NoRecord,
    PendingAuthorization,
    Authorized { expiry: DateTime<Utc> },
}

/// Anything that can hand out a currently valid access token.
pub trait CredentialProvider {
    fn access_token(&self) -> Result<String, AuthError>;
}

pub struct CredentialManager<E = HttpTokenEndpoint> {
    identity: Result<ClientIdentity, MissingVar>,
    paths: CredentialPaths,
    endpoint: E,
}

impl CredentialManager<HttpTokenEndpoint> {
    /// Manager using the real token endpoint and `GOOGLE_*` client identity.
    ///
    /// A missing identity only fails the calls that need it: an authorized,
    /// unexpired record is still usable without any environment.
    pub fn from_env(scopes: Vec<String>, paths: CredentialPaths) -> Self {
        Self::new(ClientIdentity::from_env(scopes), paths, HttpTokenEndpoint)
    }
}

impl<E: TokenEndpoint> CredentialManager<E> {
    pub fn new(
        identity: Result<ClientIdentity, MissingVar>,
        paths: CredentialPaths,
        endpoint: E,
    ) -> Self {
        Self {
            identity,
            paths,
            endpoint,
        }
    }

    fn identity(&self) -> Result<&ClientIdentity, AuthError> {
        self.identity.as_ref().map_err(|missing| (*missing).into())
    }

    /// Current lifecycle state, read from disk.
    pub fn state(&self) -> Result<CredentialState, AuthError> {
        if let Some(record) = CredentialRecord::load(&self.paths.token_file)? {
            return Ok(CredentialState::Authorized {
                expiry: record.expiry,
            });
        }
        if self.paths.url_file.exists() {
            return Ok(CredentialState::PendingAuthorization);
        }
        Ok(CredentialState::NoRecord)
    }

    /// Advance the state machine by one poll as of `now`.
    pub fn access_token_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let margin = Duration::seconds(REFRESH_MARGIN_SECS);
        match CredentialRecord::load(&self.paths.token_file)? {
            Some(record) if !record.needs_refresh(now, margin) => {
                tracing::debug!(expiry = %record.expiry, "using stored access token");
                Ok(record.access_token)
            }
            Some(record) => self.refresh(record, now),
            None => match self.read_code()? {
                Some(code) => self.exchange(&code, now),
                None => self.request_authorization(),
            },
        }
    }

    fn refresh(&self, record: CredentialRecord, now: DateTime<Utc>) -> Result<String, AuthError> {
        tracing::info!(expiry = %record.expiry, "access token expired or near expiry, refreshing");
        let identity = self.identity()?;
        match self.endpoint.refresh(identity, &record.refresh_token) {
            Ok(response) => {
                let refreshed = record_from_response(response, Some(&record), now);
                refreshed.save(&self.paths.token_file)?;
                Ok(refreshed.access_token)
            }
            Err(TokenFailure::Rejected(reason)) => {
                tracing::warn!(%reason, "refresh token rejected, resetting credentials");
                CredentialRecord::delete(&self.paths.token_file)?;
                Err(AuthError::RefreshRejected(reason))
            }
            Err(TokenFailure::Transport(reason)) => Err(AuthError::Http(reason)),
        }
    }

    fn exchange(&self, code: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        tracing::info!("exchanging one-time authorization code");
        let identity = self.identity()?;
        match self.endpoint.exchange_code(identity, code) {
            Ok(response) if response.refresh_token.as_deref().map_or(true, str::is_empty) => {
                tracing::warn!("token response carried no refresh token, discarding code");
                remove_if_exists(&self.paths.code_file)?;
                Err(AuthError::CodeRejected(
                    "token response carried no refresh token".into(),
                ))
            }
            Ok(response) => {
                let mut record = record_from_response(response, None, now);
                if record.scopes.is_empty() {
                    record.scopes = identity.scopes.clone();
                }
                record.save(&self.paths.token_file)?;
                remove_if_exists(&self.paths.code_file)?;
                remove_if_exists(&self.paths.url_file)?;
                Ok(record.access_token)
            }
            Err(TokenFailure::Rejected(reason)) => {
                remove_if_exists(&self.paths.code_file)?;
                Err(AuthError::CodeRejected(reason))
            }
            Err(TokenFailure::Transport(reason)) => Err(AuthError::Http(reason)),
        }
    }

    fn request_authorization(&self) -> Result<String, AuthError> {
        let url = self.identity()?.authorization_url();
        if let Some(parent) = self.paths.url_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.paths.url_file, format!("{url}\n"))?;
        tracing::info!(url_file = %self.paths.url_file.display(), "authorization URL written");
        Err(AuthError::PendingAuthorization {
            url,
            url_file: self.paths.url_file.clone(),
            code_file: self.paths.code_file.clone(),
        })
    }

    fn read_code(&self) -> Result<Option<String>, AuthError> {
        match fs::read_to_string(&self.paths.code_file) {
            Ok(content) => {
                let code = content.trim();
                Ok((!code.is_empty()).then(|| code.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl<E: TokenEndpoint> CredentialProvider for CredentialManager<E> {
    fn access_token(&self) -> Result<String, AuthError> {
        self.access_token_at(Utc::now())
    }
}

fn record_from_response(
    response: TokenResponse,
    previous: Option<&CredentialRecord>,
    now: DateTime<Utc>,
) -> CredentialRecord {
    let lifetime = response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    let scopes = match response.scope {
        Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
        None => previous.map(|p| p.scopes.clone()).unwrap_or_default(),
    };
    CredentialRecord {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous.map(|p| p.refresh_token.clone()))
            .unwrap_or_default(),
        expiry: now + Duration::seconds(lifetime),
        token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
        scopes,
        updated_at: now,
    }
}

fn remove_if_exists(path: &std::path::Path) -> Result<(), AuthError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
