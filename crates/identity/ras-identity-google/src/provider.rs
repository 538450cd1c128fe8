//! Google login provider.

use crate::config::GoogleConfig;
use crate::error::{GoogleError, GoogleResult};
use crate::flow::{HttpOAuth2Client, OAuth2Flow};
use crate::params::AuthParams;
use crate::session::GoogleSession;
use crate::userinfo::UserInfoFetcher;
use async_trait::async_trait;
use ras_identity_core::{
    IdentityError, IdentityProvider, IdentityResult, OAuthProvider, OAuthToken, OAuthUser,
    VerifiedIdentity,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Authentication payload accepted by [`IdentityProvider::verify`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GoogleAuthPayload {
    /// Complete the flow with the code from the callback
    Callback { code: String },
    /// Look up the user behind an already authorized session
    Session { session: GoogleSession },
}

/// OAuth2 login provider for Google accounts
#[derive(Clone)]
pub struct GoogleProvider {
    config: GoogleConfig,
    provider_name: String,
    auth_params: AuthParams,
    http_flow: Arc<HttpOAuth2Client>,
    custom_flow: Option<Arc<dyn OAuth2Flow>>,
    fetcher: UserInfoFetcher,
}

impl GoogleProvider {
    /// Creates a provider named `google`. With no scopes only `email` is requested.
    pub fn new<I, S>(
        client_key: impl Into<String>,
        secret: impl Into<String>,
        callback_url: impl Into<String>,
        scopes: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_config(GoogleConfig::new(client_key, secret, callback_url).with_scopes(scopes))
    }

    /// Creates a provider from a loaded configuration. An empty scope list
    /// falls back to `email`, as with [`GoogleConfig::with_scopes`].
    pub fn from_config(mut config: GoogleConfig) -> Self {
        let scopes = std::mem::take(&mut config.scopes);
        let config = config.with_scopes(scopes);
        let http_client = Client::new();

        // Ask for offline access so Google issues a refresh token.
        let mut auth_params = AuthParams::new();
        auth_params.push("access_type", "offline");

        Self {
            http_flow: Arc::new(HttpOAuth2Client::new(config.clone(), http_client.clone())),
            custom_flow: None,
            fetcher: UserInfoFetcher::new(http_client),
            config,
            provider_name: "google".to_string(),
            auth_params,
        }
    }

    /// Routes every request through `http_client`.
    ///
    /// A flow installed with [`GoogleProvider::with_flow`] stays in place.
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_flow = Arc::new(HttpOAuth2Client::new(
            self.config.clone(),
            http_client.clone(),
        ));
        self.fetcher = UserInfoFetcher::new(http_client);
        self
    }

    /// Replaces the component that builds authorization URLs and talks to the token endpoint.
    pub fn with_flow(mut self, flow: Arc<dyn OAuth2Flow>) -> Self {
        self.custom_flow = Some(flow);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_endpoints(mut self, base_url: &str) -> Self {
        let http_client = Client::new();
        self.http_flow = Arc::new(
            HttpOAuth2Client::new(self.config.clone(), http_client.clone()).with_endpoints(
                format!("{}/o/oauth2/auth", base_url),
                format!("{}/o/oauth2/token", base_url),
            ),
        );
        self.fetcher = UserInfoFetcher::new(http_client).with_endpoints(
            format!("{}/oauth2/v2/userinfo", base_url),
            format!("{}/oauth2/v3/tokeninfo", base_url),
        );
        self
    }

    pub(crate) fn flow(&self) -> &dyn OAuth2Flow {
        match &self.custom_flow {
            Some(flow) => &**flow,
            None => &*self.http_flow,
        }
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Extra parameters added to every authorization URL, in order.
    pub fn auth_params(&self) -> &AuthParams {
        &self.auth_params
    }

    /// Sets the `prompt` parameter, space-joining multiple values.
    ///
    /// Pass `select_account` to make the user pick an account every time.
    /// See <https://developers.google.com/identity/protocols/OpenIDConnect#authenticationuriparameters>
    pub fn set_prompt<I, S>(&mut self, prompts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prompts: Vec<String> = prompts
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        if prompts.is_empty() {
            return;
        }
        self.auth_params.push("prompt", prompts.join(" "));
    }

    /// Sets the `hd` parameter, restricting sign-in to one hosted domain.
    pub fn set_hosted_domain(&mut self, hosted_domain: &str) {
        if hosted_domain.is_empty() {
            return;
        }
        self.auth_params.push("hd", hosted_domain);
    }

    /// Sets the `login_hint` parameter to preselect an account.
    pub fn set_login_hint(&mut self, login_hint: &str) {
        if login_hint.is_empty() {
            return;
        }
        self.auth_params.push("login_hint", login_hint);
    }

    /// Sets the `access_type` parameter. Only `offline` yields a refresh token.
    pub fn set_access_type(&mut self, access_type: &str) {
        if access_type.is_empty() {
            return;
        }
        self.auth_params.push("access_type", access_type);
    }

    /// Parses a session previously produced by [`GoogleSession::marshal`].
    pub fn unmarshal_session(&self, data: &str) -> GoogleResult<GoogleSession> {
        Ok(serde_json::from_str(data)?)
    }

    fn map_user_to_identity(&self, user: OAuthUser) -> VerifiedIdentity {
        let mut metadata = user.raw_data;
        if !user.avatar_url.is_empty() {
            metadata.insert(
                "picture".to_string(),
                serde_json::Value::String(user.avatar_url),
            );
        }

        VerifiedIdentity {
            provider_id: self.provider_name.clone(),
            subject: user.user_id,
            email: Some(user.email).filter(|e| !e.is_empty()),
            display_name: Some(user.name).filter(|n| !n.is_empty()),
            metadata: if metadata.is_empty() {
                None
            } else {
                Some(serde_json::Value::Object(metadata))
            },
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    type Session = GoogleSession;
    type Error = GoogleError;

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn set_name(&mut self, name: String) {
        self.provider_name = name;
    }

    fn begin_auth(&self, state: &str) -> GoogleResult<GoogleSession> {
        let url = self.flow().authorization_url(state, &self.auth_params)?;
        Ok(GoogleSession::new(url))
    }

    async fn fetch_user(&self, session: &GoogleSession) -> GoogleResult<OAuthUser> {
        self.fetcher.fetch(&self.provider_name, session).await
    }

    async fn fetch_user_with_token(&self, _token: &str) -> GoogleResult<OAuthUser> {
        Err(GoogleError::NotImplemented)
    }

    fn refresh_token_available(&self) -> bool {
        true
    }

    async fn refresh_token(&self, refresh_token: &str) -> GoogleResult<OAuthToken> {
        self.flow().refresh(refresh_token).await
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn provider_id(&self) -> &str {
        &self.provider_name
    }

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<VerifiedIdentity> {
        let payload: GoogleAuthPayload =
            serde_json::from_value(auth_payload).map_err(|_| IdentityError::InvalidPayload)?;

        let session = match payload {
            GoogleAuthPayload::Callback { code } => {
                let mut session = GoogleSession::default();
                session.authorize(self, &code).await?;
                session
            }
            GoogleAuthPayload::Session { session } => session,
        };

        let user = self.fetch_user(&session).await?;

        info!(
            "Successfully verified identity for provider: {}",
            self.provider_name
        );

        Ok(self.map_user_to_identity(user))
    }
}
