//! OAuth client identity, supplied externally and never written by this crate.

use crate::error::AuthError;

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// A required `GOOGLE_*` variable that was unset or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingVar(pub &'static str);

impl From<MissingVar> for AuthError {
    fn from(missing: MissingVar) -> Self {
        AuthError::MissingClientIdentity(missing.0)
    }
}

/// Installed-application client registration for the cloud destination.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub project_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl ClientIdentity {
    /// Read the identity from `GOOGLE_*` environment variables.
    ///
    /// Client id, secret and project id are required; the endpoints fall back
    /// to Google's defaults. Only the first entry of `GOOGLE_REDIRECT_URIS` is
    /// used.
    pub fn from_env(scopes: Vec<String>) -> Result<Self, MissingVar> {
        Self::from_lookup(scopes, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        scopes: Vec<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, MissingVar> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(MissingVar(key));

        let redirect_uri = get("GOOGLE_REDIRECT_URIS")
            .and_then(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .find(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

        Ok(Self {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            project_id: required("GOOGLE_PROJECT_ID")?,
            auth_uri: get("GOOGLE_AUTH_URI").unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: get("GOOGLE_TOKEN_URI").unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            redirect_uri,
            scopes,
        })
    }

    /// URL the operator opens to grant consent.
    ///
    /// Requests offline access with a forced consent prompt so the exchange
    /// always yields a refresh token.
    pub fn authorization_url(&self) -> String {
        let scope = self.scopes.join(" ");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.auth_uri, query.join("&"))
    }
}

#[cfg(test)]
pub(crate) fn test_identity() -> ClientIdentity {
    ClientIdentity {
        project_id: "the-automaton".to_string(),
        client_id: "client-123".to_string(),
        client_secret: "secret".to_string(),
        auth_uri: DEFAULT_AUTH_URI.to_string(),
        token_uri: DEFAULT_TOKEN_URI.to_string(),
        redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
        scopes: vec!["https://www.googleapis.com/auth/documents".to_string()],
    }
}
