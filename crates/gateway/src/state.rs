use std::{sync::Arc, time::Duration};

use {
    anyhow::bail,
    rolemap_config::RolemapConfig,
    rolemap_crm::HubSpotClient,
    rolemap_oauth::{
        CredentialSet, MemoryTokenStore, OAuthConfig, OAuthFlow, TokenManager, TokenStore,
    },
    secrecy::Secret,
    tracing::debug,
};

use crate::server::FIXED_ROUTES;

/// Shared runtime state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    /// Credential lifecycle for the single connected portal.
    pub tokens: Arc<TokenManager>,
    /// Authenticated CRM client sharing `tokens`.
    pub crm: HubSpotClient,
    /// Where the OAuth callback sends the browser afterwards.
    pub frontend_origin: String,
    /// Route the authorization server redirects back to.
    pub callback_path: String,
    pub version: String,
}

impl AppState {
    /// Build state with an in-memory store seeded from `config`.
    pub fn from_config(config: &RolemapConfig) -> anyhow::Result<Arc<Self>> {
        let oauth = &config.oauth;
        let seeded = CredentialSet::seeded(
            oauth.access_token.clone(),
            oauth.refresh_token.clone(),
            oauth.expires_at,
        );
        if seeded.has_refresh_token() {
            debug!("starting with configured refresh token");
        }
        Self::with_store(config, Arc::new(MemoryTokenStore::with_credentials(seeded)))
    }

    /// Build state around an existing token store.
    pub fn with_store(
        config: &RolemapConfig,
        store: Arc<dyn TokenStore>,
    ) -> anyhow::Result<Arc<Self>> {
        let callback_path = callback_path(&config.server.callback_path)?;
        let flow = OAuthFlow::new(oauth_config(config));
        let tokens = Arc::new(TokenManager::new(store, flow));
        let crm = HubSpotClient::new(config.crm.api_base_url.as_str(), Arc::clone(&tokens))
            .with_timeout(config.crm.timeout_secs.map(Duration::from_secs));

        Ok(Arc::new(Self {
            tokens,
            crm,
            frontend_origin: config.server.frontend_origin.clone(),
            callback_path,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }))
    }
}

/// Normalize the configured callback route and make sure it can be mounted.
fn callback_path(raw: &str) -> anyhow::Result<String> {
    let path = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    };
    if path.contains(['{', '}', '*']) {
        bail!("server.callback_path {path:?} must be a literal path");
    }
    if FIXED_ROUTES.contains(&path.as_str()) {
        bail!("server.callback_path {path:?} collides with a built-in route");
    }
    Ok(path)
}

/// Translate the config file's oauth section into the flow's settings.
pub fn oauth_config(config: &RolemapConfig) -> OAuthConfig {
    let oauth = &config.oauth;
    OAuthConfig {
        client_id: oauth.client_id.clone(),
        client_secret: oauth
            .client_secret
            .clone()
            .unwrap_or_else(|| Secret::new(String::new())),
        auth_url: format!("{}/oauth/authorize", oauth.auth_base_url.trim_end_matches('/')),
        token_url: oauth.token_url.clone(),
        redirect_uri: config.server.redirect_uri(),
        scopes: oauth.scopes.clone(),
    }
}
