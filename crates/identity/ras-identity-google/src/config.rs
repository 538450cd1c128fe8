//! Google OAuth2 configuration types.

use crate::error::{GoogleError, GoogleResult};
use serde::{Deserialize, Serialize};

pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";
pub const PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const TOKEN_INFO_URL: &str = "https://www.googleapis.com/oauth2/v3/tokeninfo";

/// Scope requested when the caller asks for none.
pub const DEFAULT_SCOPE: &str = "email";

/// Client credentials and scopes for the Google provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_scopes() -> Vec<String> {
    vec![DEFAULT_SCOPE.to_string()]
}

impl GoogleConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            scopes: default_scopes(),
        }
    }

    /// Replaces the scope list. An empty list keeps the default `email` scope.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes: Vec<String> = scopes.into_iter().map(Into::into).collect();
        self.scopes = if scopes.is_empty() {
            default_scopes()
        } else {
            scopes
        };
        self
    }

    /// Loads the configuration from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`,
    /// `GOOGLE_REDIRECT_URL` and the optional `GOOGLE_SCOPES`.
    pub fn from_env() -> GoogleResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GoogleResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| GoogleError::ConfigError(format!("{} is not set", key)))
        };

        let config = Self::new(
            required("GOOGLE_CLIENT_ID")?,
            required("GOOGLE_CLIENT_SECRET")?,
            required("GOOGLE_REDIRECT_URL")?,
        );

        let scopes = lookup("GOOGLE_SCOPES").unwrap_or_default();
        Ok(config.with_scopes(
            scopes
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty()),
        ))
    }
}
