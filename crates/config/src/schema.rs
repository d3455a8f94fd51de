//! Config schema types (server, oauth, crm).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, Serializer},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RolemapConfig {
    pub server: ServerConfig,
    pub oauth: OAuthSection,
    pub crm: CrmConfig,
}

/// HTTP listener and the public addresses the OAuth flow redirects through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,

    /// Externally reachable base URL of this backend, used to build the
    /// OAuth redirect URI.
    pub public_url: String,

    /// Path the authorization server redirects back to.
    pub callback_path: String,

    /// Origin of the map frontend; the OAuth callback redirects here.
    pub frontend_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
            public_url: "http://localhost:5000".into(),
            callback_path: "/oauth-callback".into(),
            frontend_origin: "http://localhost:3000".into(),
        }
    }
}

impl ServerConfig {
    /// Full redirect URI registered with the authorization server.
    pub fn redirect_uri(&self) -> String {
        let base = self.public_url.trim_end_matches('/');
        if self.callback_path.starts_with('/') {
            format!("{base}{}", self.callback_path)
        } else {
            format!("{base}/{}", self.callback_path)
        }
    }
}

/// HubSpot OAuth app settings, plus an optional seeded credential set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSection {
    pub client_id: String,

    #[serde(serialize_with = "redact_option_secret")]
    pub client_secret: Option<Secret<String>>,

    /// Base of the consent page (`{auth_base_url}/oauth/authorize`).
    pub auth_base_url: String,

    /// Token endpoint for the authorization-code and refresh grants.
    pub token_url: String,

    pub scopes: Vec<String>,

    /// Access token to start with. Ignored unless `expires_at` is also set.
    #[serde(serialize_with = "redact_option_secret")]
    pub access_token: Option<Secret<String>>,

    /// Refresh token to start with, skipping the browser consent step.
    #[serde(serialize_with = "redact_option_secret")]
    pub refresh_token: Option<Secret<String>>,

    /// Expiry of `access_token`, Unix epoch milliseconds.
    pub expires_at: Option<u64>,
}

impl Default for OAuthSection {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            auth_base_url: "https://app.hubspot.com".into(),
            token_url: "https://api.hubapi.com/oauth/v1/token".into(),
            scopes: vec![
                "crm.objects.contacts.read".into(),
                "crm.objects.contacts.write".into(),
            ],
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }
}

impl OAuthSection {
    /// Both halves of the client credentials are configured.
    pub fn has_client_credentials(&self) -> bool {
        !self.client_id.trim().is_empty()
            && self
                .client_secret
                .as_ref()
                .is_some_and(|s| !s.expose_secret().trim().is_empty())
    }
}

/// Third-party API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    pub api_base_url: String,

    /// Per-request timeout for CRM calls. `None` keeps the HTTP client default.
    pub timeout_secs: Option<u64>,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.hubapi.com".into(),
            timeout_secs: None,
        }
    }
}

fn redact_option_secret<S: Serializer>(
    value: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_some("[REDACTED]"),
        None => serializer.serialize_none(),
    }
}
