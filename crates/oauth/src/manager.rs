use std::sync::Arc;

use {
    secrecy::{ExposeSecret, Secret},
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

use crate::{
    error::OAuthError,
    flow::OAuthFlow,
    storage::TokenStore,
    types::{AuthStatus, CredentialSet, now_ms},
};

/// Keeps a valid access token available on top of a [`TokenStore`].
///
/// Refreshes are serialized: callers that find the token stale queue on one
/// lock and re-check the store once they hold it, so a burst of requests
/// results in a single call to the token endpoint.
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    flow: OAuthFlow,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("flow", &self.flow)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, flow: OAuthFlow) -> Self {
        Self {
            store,
            flow,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// A refresh token is held, so API calls can proceed without the user.
    pub fn is_authenticated(&self) -> bool {
        self.store.read().has_refresh_token()
    }

    pub fn status(&self) -> AuthStatus {
        let set = self.store.read();
        AuthStatus {
            authenticated: set.has_refresh_token(),
            expires_at: set.expires_at,
        }
    }

    pub fn authorization_url(&self) -> Result<String, OAuthError> {
        self.flow.authorization_url()
    }

    /// Exchange the code from the OAuth callback and store the new credentials.
    pub async fn complete_authorization(&self, code: &str) -> Result<(), OAuthError> {
        let issued_at = now_ms();
        let response = self.flow.exchange(code).await?;
        if response.refresh_token.is_none() {
            warn!("token endpoint issued no refresh token for authorization code");
        }

        let _guard = self.refresh_lock.lock().await;
        let mut set = CredentialSet::default();
        set.apply(response, issued_at);
        self.store.write(set);
        info!("authorization completed");
        Ok(())
    }

    /// Return a valid access token, refreshing it at most once if needed.
    pub async fn ensure_access_token(&self) -> Result<Secret<String>, OAuthError> {
        if let Some(token) = self.store.read().fresh_access_token(now_ms()) {
            return Ok(token.clone());
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        let mut set = self.store.read();
        let now = now_ms();
        if let Some(token) = set.fresh_access_token(now) {
            debug!("access token refreshed by concurrent request");
            return Ok(token.clone());
        }

        let Some(refresh_token) = set.refresh_token.clone() else {
            debug!("no refresh token stored");
            return Err(OAuthError::AuthenticationRequired);
        };

        match self.flow.refresh(refresh_token.expose_secret()).await {
            Ok(response) => {
                set.apply(response, now);
                let token = set
                    .access_token
                    .clone()
                    .ok_or_else(|| OAuthError::InvalidResponse("missing access_token".into()))?;
                self.store.write(set);
                info!("access token refreshed");
                Ok(token)
            },
            Err(e) if e.is_invalid_grant() => {
                warn!("refresh token rejected, clearing credentials");
                self.store.clear();
                Err(OAuthError::AuthenticationRequired)
            },
            Err(e) => {
                warn!(error = %e, "token refresh failed, keeping credentials");
                Err(e)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{MemoryTokenStore, types::OAuthConfig},
        mockito::{Matcher, Server, ServerGuard},
    };

    const HOUR_MS: u64 = 3_600_000;

    fn manager(server: &ServerGuard, set: CredentialSet) -> (Arc<MemoryTokenStore>, TokenManager) {
        manager_at(&server.url(), set)
    }

    fn manager_at(base_url: &str, set: CredentialSet) -> (Arc<MemoryTokenStore>, TokenManager) {
        let store = Arc::new(MemoryTokenStore::with_credentials(set));
        let flow = OAuthFlow::new(OAuthConfig {
            client_id: "client-1".into(),
            client_secret: Secret::new("secret-1".into()),
            auth_url: format!("{base_url}/oauth/authorize"),
            token_url: format!("{base_url}/oauth/v1/token"),
            redirect_uri: "http://localhost:5000/oauth-callback".into(),
            scopes: vec!["crm.objects.contacts.read".into()],
        });
        let manager = TokenManager::new(store.clone(), flow);
        (store, manager)
    }

    fn creds(
        access: Option<&str>,
        refresh: Option<&str>,
        expires_at: Option<u64>,
    ) -> CredentialSet {
        CredentialSet {
            access_token: access.map(|s| Secret::new(s.to_string())),
            refresh_token: refresh.map(|s| Secret::new(s.to_string())),
            expires_at,
        }
    }

    fn exposed(secret: &Option<Secret<String>>) -> Option<&str> {
        secret.as_ref().map(|s| s.expose_secret().as_str())
    }

    #[tokio::test]
    async fn fresh_token_is_returned_without_network_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v1/token")
            .expect(0)
            .create_async()
            .await;

        let (store, manager) = manager(
            &server,
            creds(Some("cached"), Some("rt"), Some(now_ms() + HOUR_MS)),
        );
        let token = manager.ensure_access_token().await.unwrap();

        mock.assert_async().await;
        assert_eq!(token.expose_secret(), "cached");
        assert_eq!(exposed(&store.read().access_token), Some("cached"));
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v1/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "rt-1".into()),
                Matcher::UrlEncoded("client_id".into(), "client-1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-2","refresh_token":"rt-2","expires_in":1800}"#)
            .expect(1)
            .create_async()
            .await;

        let (store, manager) = manager(&server, creds(Some("at-1"), Some("rt-1"), Some(1)));
        let before = now_ms();
        let token = manager.ensure_access_token().await.unwrap();

        mock.assert_async().await;
        assert_eq!(token.expose_secret(), "at-2");
        let set = store.read();
        assert_eq!(exposed(&set.access_token), Some("at-2"));
        assert_eq!(exposed(&set.refresh_token), Some("rt-2"));
        let expires_at = set.expires_at.unwrap();
        assert!(expires_at >= before + 1_800_000);
        assert!(expires_at <= now_ms() + 1_800_000);
    }

    #[tokio::test]
    async fn absent_access_token_refreshes_and_keeps_refresh_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v1/token")
            .with_status(200)
            .with_body(r#"{"access_token":"at-new","expires_in":60}"#)
            .expect(1)
            .create_async()
            .await;

        let (store, manager) = manager(&server, creds(None, Some("rt-keep"), None));
        manager.ensure_access_token().await.unwrap();

        mock.assert_async().await;
        assert_eq!(exposed(&store.read().refresh_token), Some("rt-keep"));
    }

    #[tokio::test]
    async fn missing_refresh_token_requires_authentication() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v1/token")
            .expect(0)
            .create_async()
            .await;

        let (_store, manager) = manager(&server, CredentialSet::default());
        let err = manager.ensure_access_token().await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, OAuthError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn invalid_grant_clears_credentials() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v1/token")
            .with_status(400)
            .with_body(r#"{"status":"BAD_REFRESH_TOKEN","message":"missing or unknown refresh token","error":"invalid_grant"}"#)
            .expect(1)
            .create_async()
            .await;

        let (store, manager) = manager(&server, creds(Some("old"), Some("revoked"), Some(1)));
        let err = manager.ensure_access_token().await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, OAuthError::AuthenticationRequired));
        let set = store.read();
        assert!(set.access_token.is_none());
        assert!(set.refresh_token.is_none());
        assert!(set.expires_at.is_none());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn other_refresh_failures_propagate_and_keep_credentials() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/v1/token")
            .with_status(500)
            .with_body(r#"{"message":"internal"}"#)
            .create_async()
            .await;

        let (store, manager) = manager(&server, creds(None, Some("rt"), None));
        let err = manager.ensure_access_token().await.unwrap_err();

        assert!(matches!(err, OAuthError::Upstream { status: 500, .. }));
        assert_eq!(exposed(&store.read().refresh_token), Some("rt"));
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_keeps_credentials() {
        // Bind then drop to get a port nothing listens on.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let (store, manager) =
            manager_at(&format!("http://{addr}"), creds(None, Some("rt"), None));
        let err = manager.ensure_access_token().await.unwrap_err();

        assert!(matches!(err, OAuthError::Http(_)));
        assert!(!err.is_invalid_grant());
        assert_eq!(exposed(&store.read().refresh_token), Some("rt"));
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v1/token")
            .with_status(200)
            .with_body(r#"{"access_token":"shared","expires_in":1800}"#)
            .expect(1)
            .create_async()
            .await;

        let (_store, manager) = manager(&server, creds(None, Some("rt"), None));
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.ensure_access_token().await })
            })
            .collect();
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.expose_secret(), "shared");
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn complete_authorization_populates_store() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/v1/token")
            .match_body(Matcher::UrlEncoded("code".into(), "abc".into()))
            .with_status(200)
            .with_body(r#"{"access_token":"at","refresh_token":"rt","expires_in":1800}"#)
            .create_async()
            .await;

        let (store, manager) = manager(&server, CredentialSet::default());
        assert!(!manager.status().authenticated);

        manager.complete_authorization("abc").await.unwrap();

        let status = manager.status();
        assert!(status.authenticated);
        assert_eq!(status.expires_at, store.read().expires_at);
        assert_eq!(exposed(&store.read().refresh_token), Some("rt"));
    }
}
