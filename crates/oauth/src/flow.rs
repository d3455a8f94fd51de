//! Authorization-code flow against the token endpoint: consent URL,
//! code exchange and refresh grant.

use {
    secrecy::ExposeSecret,
    serde_json::Value,
    tracing::{debug, warn},
    url::Url,
};

use crate::{
    error::OAuthError,
    types::{OAuthConfig, TokenResponse},
};

#[derive(Debug, Clone)]
pub struct OAuthFlow {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl OAuthFlow {
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: OAuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Consent page URL the user is sent to.
    pub fn authorization_url(&self) -> Result<String, OAuthError> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| OAuthError::InvalidConfig(format!("auth_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "));
        Ok(url.into())
    }

    /// Exchange an authorization code for a token set.
    pub async fn exchange(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        debug!("exchanging authorization code");
        let secret = self.config.client_secret.expose_secret();
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code.trim()),
        ])
        .await
    }

    /// Obtain a new access token with a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, OAuthError> {
        debug!("refreshing access token");
        let secret = self.config.client_secret.expose_secret();
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", secret.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, OAuthError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
            warn!(status = status.as_u16(), body = %body, "token endpoint rejected request");
            return Err(OAuthError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;
        if token.access_token.trim().is_empty() {
            return Err(OAuthError::InvalidResponse("missing access_token".into()));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        mockito::{Matcher, Server},
        secrecy::Secret,
    };

    fn config(token_url: String) -> OAuthConfig {
        OAuthConfig {
            client_id: "client-1".into(),
            client_secret: Secret::new("secret-1".into()),
            auth_url: "https://app.hubspot.com/oauth/authorize".into(),
            token_url,
            redirect_uri: "http://localhost:5000/oauth-callback".into(),
            scopes: vec![
                "crm.objects.contacts.read".into(),
                "crm.objects.contacts.write".into(),
            ],
        }
    }

    #[test]
    fn authorization_url_carries_client_and_redirect() {
        let flow = OAuthFlow::new(config("http://unused".into()));
        let url = Url::parse(&flow.authorization_url().unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("app.hubspot.com"));
        assert_eq!(url.path(), "/oauth/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client-1".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:5000/oauth-callback".into()
        )));
        assert!(pairs.contains(&(
            "scope".into(),
            "crm.objects.contacts.read crm.objects.contacts.write".into()
        )));
    }

    #[test]
    fn authorization_url_rejects_bad_base() {
        let mut cfg = config("http://unused".into());
        cfg.auth_url = "not a url".into();
        let err = OAuthFlow::new(cfg).authorization_url().unwrap_err();
        assert!(matches!(err, OAuthError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn exchange_posts_authorization_code_grant() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/v1/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "the-code".into()),
                Matcher::UrlEncoded("client_secret".into(), "secret-1".into()),
                Matcher::UrlEncoded(
                    "redirect_uri".into(),
                    "http://localhost:5000/oauth-callback".into(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at","refresh_token":"rt","expires_in":1800}"#)
            .expect(1)
            .create_async()
            .await;

        let flow = OAuthFlow::new(config(format!("{}/oauth/v1/token", server.url())));
        let token = flow.exchange("the-code").await.unwrap();

        mock.assert_async().await;
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
    }

    #[tokio::test]
    async fn error_status_keeps_upstream_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/v1/token")
            .with_status(400)
            .with_body(r#"{"status":"BAD_REFRESH_TOKEN","error":"invalid_grant"}"#)
            .create_async()
            .await;

        let flow = OAuthFlow::new(config(format!("{}/oauth/v1/token", server.url())));
        let err = flow.refresh("stale").await.unwrap_err();

        assert!(err.is_invalid_grant());
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_as_text() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/v1/token")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let flow = OAuthFlow::new(config(format!("{}/oauth/v1/token", server.url())));
        match flow.refresh("rt").await.unwrap_err() {
            OAuthError::Upstream { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, Value::String("bad gateway".into()));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_access_token_is_invalid() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/v1/token")
            .with_status(200)
            .with_body(r#"{"access_token":"","expires_in":60}"#)
            .create_async()
            .await;

        let flow = OAuthFlow::new(config(format!("{}/oauth/v1/token", server.url())));
        assert!(matches!(
            flow.refresh("rt").await.unwrap_err(),
            OAuthError::InvalidResponse(_)
        ));
    }
}
