use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    rolemap_crm::CrmError,
    rolemap_oauth::OAuthError,
    serde_json::{Value, json},
    tracing::error,
};

const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please authorize the application.";

/// Error returned by API handlers.
///
/// `AuthRequired` becomes a `401` carrying `authRequired: true` so the
/// frontend can restart the consent flow; everything else is a `500` with
/// the upstream payload echoed in `details`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required")]
    AuthRequired,

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<Value>,
    },
}

impl ApiError {
    /// Replace the message of an internal error, keeping the original as
    /// `details` when the upstream sent none.
    pub fn context(self, message: &str) -> Self {
        match self {
            Self::AuthRequired => Self::AuthRequired,
            Self::Internal {
                message: original,
                details,
            } => Self::Internal {
                message: message.to_string(),
                details: details.or(Some(Value::String(original))),
            },
        }
    }
}

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        if err.is_auth_required() {
            return Self::AuthRequired;
        }
        Self::Internal {
            message: err.to_string(),
            details: err.details().cloned(),
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        CrmError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::AuthRequired => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "error": AUTH_REQUIRED_MESSAGE,
                    "authRequired": true,
                })),
            )
                .into_response(),
            Self::Internal { message, details } => {
                error!(error = %message, "request failed");
                let mut body = json!({ "success": false, "error": message });
                if let Some(details) = details {
                    body["details"] = details;
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, axum::body::to_bytes};

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn auth_required_is_401_with_flag() {
        let (status, body) = render(CrmError::AuthRequired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["authRequired"], true);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn upstream_failure_is_500_with_details() {
        let err: ApiError = CrmError::Upstream {
            status: 429,
            body: json!({"category": "RATE_LIMITS"}),
        }
        .into();
        let (status, body) = render(err.context("Failed to fetch contacts from HubSpot")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch contacts from HubSpot");
        assert_eq!(body["details"]["category"], "RATE_LIMITS");
        assert!(body.get("authRequired").is_none());
    }

    #[tokio::test]
    async fn context_keeps_original_message_as_details() {
        let err: ApiError = CrmError::NotFound {
            path: "/crm/v3/objects/contacts/1".into(),
        }
        .into();
        let (_, body) = render(err.context("Failed")).await;
        assert_eq!(body["details"], "/crm/v3/objects/contacts/1 not found");
    }

    #[test]
    fn oauth_authentication_required_maps_through() {
        let err: ApiError = OAuthError::AuthenticationRequired.into();
        assert!(matches!(err, ApiError::AuthRequired));
    }
}
