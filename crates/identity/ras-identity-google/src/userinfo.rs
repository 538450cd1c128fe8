//! User lookup against the Google profile and token-info endpoints.

use crate::config::{PROFILE_URL, TOKEN_INFO_URL};
use crate::error::{GoogleError, GoogleResult};
use crate::session::GoogleSession;
use crate::types::{GoogleUser, IdTokenClaims};
use ras_identity_core::OAuthUser;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;
use url::Url;

/// Which schema the response body is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    AccessToken,
    IdToken,
}

#[derive(Debug, Clone)]
pub(crate) struct UserInfoFetcher {
    http_client: Client,
    profile_url: String,
    token_info_url: String,
}

impl UserInfoFetcher {
    pub(crate) fn new(http_client: Client) -> Self {
        Self {
            http_client,
            profile_url: PROFILE_URL.to_string(),
            token_info_url: TOKEN_INFO_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_endpoints(
        mut self,
        profile_url: impl Into<String>,
        token_info_url: impl Into<String>,
    ) -> Self {
        self.profile_url = profile_url.into();
        self.token_info_url = token_info_url.into();
        self
    }

    /// Looks up the user behind `session`.
    ///
    /// An ID token equal to the access token means the caller only holds an
    /// ID token; it goes to the token-info endpoint. If that endpoint answers
    /// 400 the access token is tried against the profile endpoint instead.
    pub(crate) async fn fetch(
        &self,
        provider_name: &str,
        session: &GoogleSession,
    ) -> GoogleResult<OAuthUser> {
        let user = OAuthUser {
            provider: provider_name.to_string(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            id_token: session.id_token.clone(),
            expires_at: session.expires_at,
            ..Default::default()
        };

        if user.access_token.is_empty() && user.id_token.is_empty() {
            return Err(GoogleError::MissingCredentials {
                provider: provider_name.to_string(),
            });
        }

        let (response, lookup) =
            if !session.id_token.is_empty() && session.id_token == session.access_token {
                debug!("Fetching {} user via token info", provider_name);
                let response = self
                    .get(&self.token_info_url, "id_token", &session.id_token)
                    .await?;

                if response.status() == StatusCode::BAD_REQUEST && !session.access_token.is_empty()
                {
                    debug!("Token info rejected the ID token, retrying with the profile endpoint");
                    drop(response);
                    let response = self
                        .get(&self.profile_url, "access_token", &session.access_token)
                        .await?;
                    (response, Lookup::AccessToken)
                } else {
                    (response, Lookup::IdToken)
                }
            } else {
                debug!("Fetching {} user via profile endpoint", provider_name);
                let response = self
                    .get(&self.profile_url, "access_token", &session.access_token)
                    .await?;
                (response, Lookup::AccessToken)
            };

        if response.status() != StatusCode::OK {
            return Err(GoogleError::UnexpectedStatus {
                provider: provider_name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        normalize(user, lookup, &body)
    }

    async fn get(&self, endpoint: &str, param: &str, token: &str) -> GoogleResult<Response> {
        let url = Url::parse_with_params(endpoint, [(param, token)])?;
        Ok(self.http_client.get(url).send().await?)
    }
}

fn normalize(mut user: OAuthUser, lookup: Lookup, body: &[u8]) -> GoogleResult<OAuthUser> {
    user.raw_data = serde_json::from_slice(body)?;

    match lookup {
        Lookup::IdToken => {
            let claims: IdTokenClaims = serde_json::from_slice(body)?;
            user.user_id = claims.sub;
            user.email = claims.email;
            user.name = claims.name;
            user.first_name = claims.given_name;
            user.last_name = claims.family_name;
            user.avatar_url = claims.picture;
        }
        Lookup::AccessToken => {
            let profile: GoogleUser = serde_json::from_slice(body)?;
            user.user_id = profile.id;
            user.email = profile.email;
            user.nick_name = profile.name.clone();
            user.name = profile.name;
            user.first_name = profile.given_name;
            user.last_name = profile.family_name;
            user.avatar_url = profile.picture;
        }
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_user() -> OAuthUser {
        OAuthUser {
            provider: "google".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_profile_copies_name_into_nickname() {
        let body = br#"{
            "id": "1",
            "email": "jane@example.com",
            "name": "Jane Doe",
            "given_name": "Jane",
            "family_name": "Doe",
            "link": "https://plus.google.com/1",
            "picture": "https://example.com/jane.png",
            "hd": "example.com"
        }"#;

        let user = normalize(base_user(), Lookup::AccessToken, body).unwrap();
        assert_eq!(user.user_id, "1");
        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.nick_name, "Jane Doe");
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.last_name, "Doe");
        assert_eq!(user.avatar_url, "https://example.com/jane.png");
        assert_eq!(user.raw_data["hd"], "example.com");
    }

    #[test]
    fn test_normalize_claims_leaves_nickname_empty() {
        let body = br#"{
            "sub": "110169484474386276334",
            "email": "jane@example.com",
            "name": "Jane Doe",
            "picture": "https://example.com/jane.png",
            "aud": "client.apps.googleusercontent.com"
        }"#;

        let user = normalize(base_user(), Lookup::IdToken, body).unwrap();
        assert_eq!(user.user_id, "110169484474386276334");
        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.nick_name, "");
        assert_eq!(user.raw_data["aud"], "client.apps.googleusercontent.com");
    }

    #[test]
    fn test_normalize_rejects_malformed_bodies() {
        assert!(matches!(
            normalize(base_user(), Lookup::AccessToken, b"not json"),
            Err(GoogleError::SerializationError(_))
        ));
        assert!(matches!(
            normalize(base_user(), Lookup::IdToken, b"[1, 2]"),
            Err(GoogleError::SerializationError(_))
        ));
        assert!(matches!(
            normalize(base_user(), Lookup::AccessToken, br#"{"id": 7}"#),
            Err(GoogleError::SerializationError(_))
        ));
    }
}
