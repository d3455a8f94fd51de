use std::time::{SystemTime, UNIX_EPOCH};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Current time as Unix epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Client registration and endpoints for one authorization server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Consent page, e.g. `https://app.hubspot.com/oauth/authorize`.
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

/// The credential set held by a [`TokenStore`](crate::TokenStore).
///
/// `expires_at` is Unix epoch milliseconds and belongs to `access_token`.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    pub access_token: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
    pub expires_at: Option<u64>,
}

/// Where a credential set sits in the token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No refresh token; the user has to go through the consent flow.
    Unauthorized,
    /// Access token present and not yet expired.
    Fresh,
    /// Refresh token present, access token missing or expired.
    Stale,
}

impl CredentialSet {
    /// Build a set from a seeded access/refresh pair.
    ///
    /// An access token without an expiry cannot be trusted and is dropped.
    pub fn seeded(
        access_token: Option<Secret<String>>,
        refresh_token: Option<Secret<String>>,
        expires_at: Option<u64>,
    ) -> Self {
        let access_token = access_token.filter(|_| expires_at.is_some());
        Self {
            expires_at: access_token.as_ref().and(expires_at),
            access_token,
            refresh_token,
        }
    }

    /// The stored access token, if it is still valid at `now_ms`.
    pub fn fresh_access_token(&self, now_ms: u64) -> Option<&Secret<String>> {
        let token = self.access_token.as_ref()?;
        let expires_at = self.expires_at?;
        (now_ms < expires_at && !token.expose_secret().is_empty()).then_some(token)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub fn state(&self, now_ms: u64) -> AuthState {
        if self.fresh_access_token(now_ms).is_some() {
            AuthState::Fresh
        } else if self.has_refresh_token() {
            AuthState::Stale
        } else {
            AuthState::Unauthorized
        }
    }

    /// Apply a token endpoint response received at `now_ms`.
    ///
    /// The previous refresh token is retained when the response omits one.
    pub fn apply(&mut self, response: TokenResponse, now_ms: u64) {
        self.access_token = Some(Secret::new(response.access_token));
        if let Some(refresh) = response.refresh_token.filter(|r| !r.is_empty()) {
            self.refresh_token = Some(Secret::new(refresh));
        }
        self.expires_at = Some(now_ms.saturating_add(response.expires_in.saturating_mul(1000)));
    }
}

/// Successful token endpoint payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of `access_token` in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Public view of the credential set, safe to hand to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub expires_at: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Secret<String> {
        Secret::new(s.to_string())
    }

    #[test]
    fn fresh_token_requires_future_expiry() {
        let set = CredentialSet {
            access_token: Some(secret("at")),
            refresh_token: Some(secret("rt")),
            expires_at: Some(1_000),
        };
        assert!(set.fresh_access_token(999).is_some());
        assert!(set.fresh_access_token(1_000).is_none());
        assert_eq!(set.state(999), AuthState::Fresh);
        assert_eq!(set.state(5_000), AuthState::Stale);
    }

    #[test]
    fn empty_set_is_unauthorized() {
        let set = CredentialSet::default();
        assert_eq!(set.state(0), AuthState::Unauthorized);
        assert!(!set.has_refresh_token());
    }

    #[test]
    fn seeded_access_token_without_expiry_is_dropped() {
        let set = CredentialSet::seeded(Some(secret("at")), Some(secret("rt")), None);
        assert!(set.access_token.is_none());
        assert!(set.expires_at.is_none());
        assert_eq!(set.state(0), AuthState::Stale);

        let set = CredentialSet::seeded(None, None, Some(42));
        assert!(set.expires_at.is_none());
    }

    #[test]
    fn apply_retains_refresh_token_when_omitted() {
        let mut set = CredentialSet {
            access_token: None,
            refresh_token: Some(secret("old-rt")),
            expires_at: None,
        };
        set.apply(
            TokenResponse {
                access_token: "new-at".into(),
                refresh_token: None,
                expires_in: 1800,
                token_type: Some("bearer".into()),
            },
            10_000,
        );
        assert_eq!(
            set.access_token.as_ref().map(|s| s.expose_secret().as_str()),
            Some("new-at")
        );
        assert_eq!(
            set.refresh_token.as_ref().map(|s| s.expose_secret().as_str()),
            Some("old-rt")
        );
        assert_eq!(set.expires_at, Some(10_000 + 1_800_000));
    }

    #[test]
    fn token_response_parses_hubspot_payload() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"token_type":"bearer","refresh_token":"rt","access_token":"at","expires_in":1800}"#,
        )
        .unwrap();
        assert_eq!(resp.access_token, "at");
        assert_eq!(resp.refresh_token.as_deref(), Some("rt"));
        assert_eq!(resp.expires_in, 1800);
    }
}
