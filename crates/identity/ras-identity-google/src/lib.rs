//! Google OAuth2 login provider.
//!
//! Implements the authorization-code flow against Google: building the
//! authorization URL, exchanging the callback code, looking up the user with
//! either an access token or an OpenID Connect ID token, and refreshing
//! tokens. The provider plugs into the stack through the
//! [`OAuthProvider`] and [`IdentityProvider`] traits from ras-identity-core.
//!
//! ID tokens are sent to Google's token-info endpoint as-is; their signature
//! and claims (`iss`, `aud`, `exp`) are not checked locally.

mod config;
mod error;
mod flow;
mod params;
mod provider;
mod session;
mod types;
mod userinfo;


pub use config::{AUTH_URL, GoogleConfig, PROFILE_URL, TOKEN_INFO_URL, TOKEN_URL};
pub use error::{GoogleError, GoogleResult};
pub use flow::{HttpOAuth2Client, OAuth2Flow};
pub use params::AuthParams;
pub use provider::{GoogleAuthPayload, GoogleProvider};
pub use session::GoogleSession;
pub use types::{GoogleUser, IdTokenClaims, TokenResponse};

// Re-export common types for convenience
pub use ras_identity_core::{
    IdentityProvider, OAuthProvider, OAuthToken, OAuthUser, VerifiedIdentity,
};
