use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(
        "cloud authorization pending: open the URL in {} in a browser, then paste the returned code into {}",
        url_file.display(),
        code_file.display()
    )]
    PendingAuthorization {
        url: String,
        url_file: PathBuf,
        code_file: PathBuf,
    },
    #[error("refresh token rejected ({0}); credential record removed, authorization restarts on the next run")]
    RefreshRejected(String),
    #[error("authorization code rejected ({0}); request a new code and paste it into the code file")]
    CodeRejected(String),
    #[error("missing client identity: environment variable {0} is not set")]
    MissingClientIdentity(&'static str),
    #[error(
        "credential record {} is unreadable ({reason}); delete it to restart authorization",
        path.display()
    )]
    CorruptRecord { path: PathBuf, reason: String },
    #[error("http error: {0}")]
    Http(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Whether the operator has to act before the next run can succeed.
    pub fn needs_operator(&self) -> bool {
        matches!(
            self,
            AuthError::PendingAuthorization { .. }
                | AuthError::RefreshRejected(_)
                | AuthError::CodeRejected(_)
                | AuthError::MissingClientIdentity(_)
                | AuthError::CorruptRecord { .. }
        )
    }
}
