//! Google wire types.

use serde::{Deserialize, Serialize};

/// OAuth2 token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// Profile returned by the `oauth2/v2/userinfo` endpoint for an access token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub link: String,
    pub picture: String,
}

/// Claims returned by the `oauth2/v3/tokeninfo` endpoint for an ID token.
///
/// `email_verified`, `iss`, `aud`, `iat` and `exp` are decoded but never
/// checked. Google sends the verification and timestamp claims as strings on
/// this endpoint while a decoded JWT carries them as bools and numbers, and
/// a JWT `aud` may be an array, so they are kept as raw JSON values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdTokenClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub picture: String,
    pub email_verified: Option<serde_json::Value>,
    pub iss: Option<String>,
    pub aud: Option<serde_json::Value>,
    pub iat: Option<serde_json::Value>,
    pub exp: Option<serde_json::Value>,
}
