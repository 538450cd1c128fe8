//! Per-login session state for the Google provider.

use crate::error::{GoogleError, GoogleResult};
use crate::provider::GoogleProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State carried between the redirect to Google and the user lookup.
///
/// The JSON field names match the session format other framework
/// implementations persist, so stored sessions stay interchangeable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleSession {
    #[serde(rename = "AuthURL", default)]
    pub auth_url: String,
    #[serde(rename = "AccessToken", default)]
    pub access_token: String,
    #[serde(rename = "RefreshToken", default)]
    pub refresh_token: String,
    #[serde(rename = "ExpiresAt", default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "IDToken", default)]
    pub id_token: String,
}

impl GoogleSession {
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            ..Default::default()
        }
    }

    /// The URL to send the user to.
    pub fn get_auth_url(&self) -> GoogleResult<&str> {
        if self.auth_url.is_empty() {
            return Err(GoogleError::MissingAuthUrl);
        }
        Ok(&self.auth_url)
    }

    /// Exchanges the callback `code` for tokens and stores them on the session.
    ///
    /// Returns the new access token.
    pub async fn authorize(&mut self, provider: &GoogleProvider, code: &str) -> GoogleResult<String> {
        let token = provider.flow().exchange_code(code).await?;

        if token.access_token.is_empty() || token.is_expired() {
            return Err(GoogleError::InvalidTokenResponse(
                "Invalid token received from provider".to_string(),
            ));
        }

        self.access_token = token.access_token;
        self.refresh_token = token.refresh_token.unwrap_or_default();
        self.expires_at = token.expiry;
        self.id_token = token.id_token.unwrap_or_default();

        Ok(self.access_token.clone())
    }

    pub fn marshal(&self) -> GoogleResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_auth_url() {
        let session = GoogleSession::default();
        assert!(matches!(
            session.get_auth_url(),
            Err(GoogleError::MissingAuthUrl)
        ));

        let session = GoogleSession::new("https://accounts.google.com/o/oauth2/auth?state=x");
        assert_eq!(
            session.get_auth_url().unwrap(),
            "https://accounts.google.com/o/oauth2/auth?state=x"
        );
    }

    #[test]
    fn test_marshal_uses_framework_field_names() {
        let session = GoogleSession {
            auth_url: "https://example.com/auth".to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
            id_token: "id".to_string(),
        };

        let json: serde_json::Value = serde_json::from_str(&session.marshal().unwrap()).unwrap();
        assert_eq!(json["AuthURL"], "https://example.com/auth");
        assert_eq!(json["AccessToken"], "access");
        assert_eq!(json["RefreshToken"], "refresh");
        assert_eq!(json["IDToken"], "id");
    }

    #[test]
    fn test_unmarshal_foreign_session() {
        let json = r#"{
            "AuthURL": "https://accounts.google.com/o/oauth2/auth",
            "AccessToken": "ya29.a0",
            "RefreshToken": "",
            "ExpiresAt": "2030-01-01T00:00:00Z",
            "IDToken": ""
        }"#;

        let session: GoogleSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "ya29.a0");
        assert!(session.refresh_token.is_empty());
        assert_eq!(
            session.expires_at.unwrap().to_rfc3339(),
            "2030-01-01T00:00:00+00:00"
        );
    }
}
