//! Core identity provider traits and types.
//!
//! Two seams live here. [`IdentityProvider`] is what the session service
//! calls to turn an opaque auth payload into a [`VerifiedIdentity`].
//! [`OAuthProvider`] is the contract every OAuth2 login provider implements:
//! begin the authorization flow, fetch the user behind a session, and renew
//! tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Unsupported authentication method")]
    UnsupportedMethod,

    #[error("Invalid authentication payload")]
    InvalidPayload,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub provider_id: String,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<VerifiedIdentity>;
}

/// User record normalized across OAuth2 providers.
///
/// Fields the upstream does not supply are left empty. `raw_data` keeps the
/// decoded provider response untouched for callers that need fields beyond
/// the common set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthUser {
    pub provider: String,
    pub user_id: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub email: String,
    pub avatar_url: String,
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub raw_data: serde_json::Map<String, serde_json::Value>,
}

/// Token set issued by an OAuth2 token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
    pub id_token: Option<String>,
}

impl OAuthToken {
    /// A token without an expiry never expires.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| Utc::now() > expiry)
    }
}

/// An OAuth2 authorization-code login provider.
///
/// Each provider brings its own session type, so a session produced by one
/// provider can never be handed to another.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    type Session: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name used to look the provider up later.
    fn name(&self) -> &str;

    /// Renames the provider, for when several instances of one provider are configured.
    fn set_name(&mut self, name: String);

    /// Starts the flow: builds the authorization URL for `state` and wraps it in a session.
    fn begin_auth(&self, state: &str) -> Result<Self::Session, Self::Error>;

    async fn fetch_user(&self, session: &Self::Session) -> Result<OAuthUser, Self::Error>;

    async fn fetch_user_with_token(&self, token: &str) -> Result<OAuthUser, Self::Error>;

    fn refresh_token_available(&self) -> bool;

    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthToken, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = OAuthToken {
            access_token: "abc".to_string(),
            ..Default::default()
        };
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expiry() {
        let mut token = OAuthToken {
            access_token: "abc".to_string(),
            expiry: Some(Utc::now() - Duration::minutes(1)),
            ..Default::default()
        };
        assert!(token.is_expired());

        token.expiry = Some(Utc::now() + Duration::hours(1));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_user_serialization_keeps_raw_data() {
        let mut user = OAuthUser {
            provider: "google".to_string(),
            user_id: "42".to_string(),
            ..Default::default()
        };
        user.raw_data
            .insert("hd".to_string(), serde_json::Value::String("example.com".to_string()));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["raw_data"]["hd"], "example.com");

        let back: OAuthUser = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
