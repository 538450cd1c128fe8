//! Google provider error types.

use ras_identity_core::IdentityError;
use thiserror::Error;

pub type GoogleResult<T> = Result<T, GoogleError>;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("{provider} cannot get user information without accessToken AND idToken")]
    MissingCredentials { provider: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{provider} responded with a {status} trying to fetch user information")]
    UnexpectedStatus { provider: String, status: u16 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("not implemented")]
    NotImplemented,

    #[error("Token request failed with status {status}: {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("an AuthURL has not been set")]
    MissingAuthUrl,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<GoogleError> for IdentityError {
    fn from(err: GoogleError) -> Self {
        match err {
            GoogleError::MissingCredentials { .. } => IdentityError::InvalidCredentials,
            GoogleError::NotImplemented => IdentityError::UnsupportedMethod,
            GoogleError::SerializationError(e) => IdentityError::SerializationError(e),
            other => IdentityError::ProviderError(other.to_string()),
        }
    }
}
