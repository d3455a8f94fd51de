//! OAuth-facing routes: consent URL, status, and the authorization callback.

use std::sync::Arc;

use {
    axum::{
        Json,
        extract::{Query, State},
        response::Redirect,
    },
    rolemap_oauth::AuthStatus,
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::{info, warn},
    url::Url,
};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// Set by the authorization server when the user denies access.
    pub error: Option<String>,
}

pub async fn auth_url_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let url = state.tokens.authorization_url()?;
    Ok(Json(json!({ "authUrl": url })))
}

pub async fn auth_status_handler(State(state): State<Arc<AppState>>) -> Json<AuthStatus> {
    Json(state.tokens.status())
}

pub async fn oauth_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let outcome = match (params.code.as_deref(), params.error.as_deref()) {
        (_, Some(error)) => {
            warn!(error, "authorization denied");
            "error"
        },
        (None, None) => {
            warn!("oauth callback without code");
            "error"
        },
        (Some(code), None) => match state.tokens.complete_authorization(code).await {
            Ok(()) => {
                info!("oauth callback completed");
                "success"
            },
            Err(e) => {
                warn!(error = %e, "oauth callback failed");
                "error"
            },
        },
    };
    Redirect::to(&frontend_redirect(&state.frontend_origin, outcome))
}

/// `origin` with `auth=<outcome>` appended to its query.
pub fn frontend_redirect(origin: &str, outcome: &str) -> String {
    match Url::parse(origin) {
        Ok(url) if url.path() == "/" && url.query().is_none() => {
            // Keep the bare-origin form the frontend checks for.
            format!("{}?auth={outcome}", origin.trim_end_matches('/'))
        },
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("auth", outcome);
            url.into()
        },
        Err(_) => format!("{origin}?auth={outcome}"),
    }
}
