use std::{sync::Arc, time::Duration};

use {
    reqwest::{Method, header::CONTENT_TYPE},
    rolemap_oauth::TokenManager,
    secrecy::ExposeSecret,
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::error::CrmError;

/// Authenticated client for the HubSpot CRM API.
///
/// Every call obtains a token from the [`TokenManager`] first, so an expired
/// access token is refreshed transparently.
#[derive(Debug, Clone)]
pub struct HubSpotClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    timeout: Option<Duration>,
}

impl HubSpotClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenManager>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Perform one call against `base_url + path` with a bearer token and
    /// return the parsed JSON body (`null` for an empty body).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, CrmError> {
        let token = self.tokens.ensure_access_token().await?;

        debug!(%method, path, "hubspot request");
        let mut req = self
            .http
            .request(method.clone(), format!("{}{path}", self.base_url))
            .bearer_auth(token.expose_secret())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(%method, path, "hubspot resource not found");
            return Err(CrmError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
            warn!(%method, path, status = status.as_u16(), body = %body, "hubspot request failed");
            return Err(CrmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get(&self, path: &str) -> Result<Value, CrmError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, CrmError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, CrmError> {
        self.request(Method::PATCH, path, Some(body)).await
    }
}
