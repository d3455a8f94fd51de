use {rolemap_oauth::OAuthError, serde_json::Value};

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// The caller must send the user through the authorization flow again.
    #[error("authentication required, please authorize the application")]
    AuthRequired,

    #[error("{path} not found")]
    NotFound { path: String },

    #[error("HubSpot returned {status}: {body}")]
    Upstream { status: u16, body: Value },

    #[error("HubSpot request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid HubSpot response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    OAuth(OAuthError),
}

impl From<OAuthError> for CrmError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::AuthenticationRequired => Self::AuthRequired,
            OAuthError::Upstream { status, body } => Self::Upstream { status, body },
            OAuthError::Http(e) => Self::Http(e),
            other => Self::OAuth(other),
        }
    }
}

impl CrmError {
    /// HTTP status that best describes the failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthRequired => 401,
            Self::NotFound { .. } => 404,
            Self::Upstream { status, .. } => *status,
            Self::Http(_) => 502,
            Self::Decode(_) | Self::OAuth(_) => 500,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }

    /// Upstream payload worth echoing back for diagnostics.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Upstream { body, .. } => Some(body),
            _ => None,
        }
    }
}
