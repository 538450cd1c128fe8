//! OAuth2 authorization-code flow against the Google endpoints.

use crate::config::{AUTH_URL, GoogleConfig, TOKEN_URL};
use crate::error::{GoogleError, GoogleResult};
use crate::params::AuthParams;
use crate::types::TokenResponse;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use ras_identity_core::OAuthToken;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// The slice of an OAuth2 client the provider depends on.
#[async_trait]
pub trait OAuth2Flow: Send + Sync {
    /// Builds the URL the user is redirected to, carrying `state` and every extra parameter.
    fn authorization_url(&self, state: &str, params: &AuthParams) -> GoogleResult<String>;

    /// Trades an authorization code for a token set.
    async fn exchange_code(&self, code: &str) -> GoogleResult<OAuthToken>;

    /// Mints a new access token from a refresh token.
    async fn refresh(&self, refresh_token: &str) -> GoogleResult<OAuthToken>;
}

/// [`OAuth2Flow`] talking to the token endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpOAuth2Client {
    http_client: Client,
    config: GoogleConfig,
    auth_url: String,
    token_url: String,
}

impl HttpOAuth2Client {
    pub fn new(config: GoogleConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config,
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> GoogleResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleError::TokenRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GoogleError::InvalidTokenResponse(e.to_string()))
    }
}

fn into_token(response: TokenResponse) -> OAuthToken {
    let expiry = response
        .expires_in
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl));

    OAuthToken {
        access_token: response.access_token,
        token_type: response.token_type,
        refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
        expiry,
        id_token: response.id_token.filter(|t| !t.is_empty()),
    }
}

#[async_trait]
impl OAuth2Flow for HttpOAuth2Client {
    fn authorization_url(&self, state: &str, params: &AuthParams) -> GoogleResult<String> {
        let mut url = Url::parse(&self.auth_url)?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", &self.config.redirect_url);
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("state", state);

            for (key, value) in params.iter() {
                query.append_pair(key, value);
            }
        }

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> GoogleResult<OAuthToken> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .await?;

        info!("Successfully exchanged code for tokens");
        Ok(into_token(response))
    }

    async fn refresh(&self, refresh_token: &str) -> GoogleResult<OAuthToken> {
        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .await?;

        let mut token = into_token(response);
        if token.refresh_token.is_none() {
            debug!("Token endpoint omitted refresh token, keeping the existing one");
            token.refresh_token = Some(refresh_token.to_string());
        }

        info!("Successfully refreshed access token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> GoogleConfig {
        GoogleConfig::new(
            "test_client_id",
            "test_secret",
            "http://localhost:3000/callback",
        )
        .with_scopes(["openid", "email"])
    }

    #[test]
    fn test_authorization_url_generation() {
        let client = HttpOAuth2Client::new(test_config(), Client::new());
        let mut params = AuthParams::new();
        params.push("access_type", "offline");

        let auth_url = client.authorization_url("xyz", &params).unwrap();

        let url = Url::parse(&auth_url).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(url.path(), "/o/oauth2/auth");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let expected = [
            ("response_type", "code"),
            ("client_id", "test_client_id"),
            ("redirect_uri", "http://localhost:3000/callback"),
            ("scope", "openid email"),
            ("state", "xyz"),
            ("access_type", "offline"),
        ];
        let expected: Vec<(String, String)> = expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(pairs, expected);
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth_code"))
            .and(body_string_contains("client_secret=test_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "mock_access_token",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "mock_refresh_token",
                "id_token": "mock_id_token"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpOAuth2Client::new(test_config(), Client::new()).with_endpoints(
            format!("{}/auth", mock_server.uri()),
            format!("{}/token", mock_server.uri()),
        );

        let token = client.exchange_code("auth_code").await.unwrap();
        assert_eq!(token.access_token, "mock_access_token");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.refresh_token.as_deref(), Some("mock_refresh_token"));
        assert_eq!(token.id_token.as_deref(), Some("mock_id_token"));

        let expiry = token.expiry.unwrap();
        assert!(expiry > Utc::now() + Duration::minutes(59));
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_omitted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old_refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new_access_token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpOAuth2Client::new(test_config(), Client::new()).with_endpoints(
            format!("{}/auth", mock_server.uri()),
            format!("{}/token", mock_server.uri()),
        );

        let token = client.refresh("old_refresh").await.unwrap();
        assert_eq!(token.access_token, "new_access_token");
        assert_eq!(token.refresh_token.as_deref(), Some("old_refresh"));
    }

    #[tokio::test]
    async fn test_token_request_error_cases() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = HttpOAuth2Client::new(test_config(), Client::new()).with_endpoints(
            format!("{}/auth", mock_server.uri()),
            format!("{}/token", mock_server.uri()),
        );

        match client.refresh("revoked").await {
            Err(GoogleError::TokenRequestFailed { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("Expected TokenRequestFailed, got {other:?}"),
        }

        let result = client.exchange_code("code").await;
        assert!(matches!(result, Err(GoogleError::InvalidTokenResponse(_))));
    }
}
