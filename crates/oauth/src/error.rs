use serde_json::Value;

/// Failures while obtaining or refreshing credentials.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// No usable refresh token; the user must authorize the application again.
    #[error("authentication required, please authorize the application")]
    AuthenticationRequired,

    /// The authorization server answered with a non-success status.
    #[error("authorization server returned {status}: {body}")]
    Upstream { status: u16, body: Value },

    #[error("authorization server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("invalid oauth configuration: {0}")]
    InvalidConfig(String),
}

impl OAuthError {
    /// The server rejected the grant itself (`400 invalid_grant`), meaning the
    /// refresh token or authorization code is no longer usable.
    pub fn is_invalid_grant(&self) -> bool {
        match self {
            Self::Upstream { status, body } => {
                *status == 400 && body.get("error").and_then(Value::as_str) == Some("invalid_grant")
            },
            _ => false,
        }
    }
}
