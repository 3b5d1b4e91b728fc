//! Token endpoint access.
//!
//! [`TokenEndpoint`] is the seam between the credential state machine and the
//! network: [`HttpTokenEndpoint`] talks to the real OAuth token URI with
//! `ureq`, tests substitute a scripted implementation.

use crate::client::ClientIdentity;
use serde::Deserialize;

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Why a token request did not produce tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenFailure {
    /// The endpoint refused the grant (revoked refresh token, used code).
    Rejected(String),
    /// The request never got a usable answer.
    Transport(String),
}

pub trait TokenEndpoint {
    /// Trade a one-time authorization code for a token pair.
    fn exchange_code(
        &self,
        identity: &ClientIdentity,
        code: &str,
    ) -> Result<TokenResponse, TokenFailure>;

    /// Obtain a fresh access token from a refresh token.
    fn refresh(
        &self,
        identity: &ClientIdentity,
        refresh_token: &str,
    ) -> Result<TokenResponse, TokenFailure>;
}

/// Production endpoint posting form-encoded grants to `identity.token_uri`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTokenEndpoint;

impl HttpTokenEndpoint {
    fn post(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, TokenFailure> {
        let grant = form
            .iter()
            .find(|(k, _)| *k == "grant_type")
            .map(|(_, v)| *v)
            .unwrap_or("unknown");
        tracing::debug!(token_uri, grant, "token request");
        let mut response = match ureq::post(token_uri).send_form(form.iter().copied()) {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) if code == 400 || code == 401 => {
                return Err(TokenFailure::Rejected(format!("HTTP {code}")));
            }
            Err(e) => return Err(TokenFailure::Transport(e.to_string())),
        };
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TokenFailure::Transport(e.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| TokenFailure::Transport(format!("bad token response: {e}")))
    }
}

impl TokenEndpoint for HttpTokenEndpoint {
    fn exchange_code(
        &self,
        identity: &ClientIdentity,
        code: &str,
    ) -> Result<TokenResponse, TokenFailure> {
        self.post(
            &identity.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", identity.client_id.as_str()),
                ("client_secret", identity.client_secret.as_str()),
                ("redirect_uri", identity.redirect_uri.as_str()),
            ],
        )
    }

    fn refresh(
        &self,
        identity: &ClientIdentity,
        refresh_token: &str,
    ) -> Result<TokenResponse, TokenFailure> {
        self.post(
            &identity.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", identity.client_id.as_str()),
                ("client_secret", identity.client_secret.as_str()),
            ],
        )
    }
}
