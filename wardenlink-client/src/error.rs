//! Client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the server or working with
/// the session's key hierarchy.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("API request failed: {0}")]
    Api(String),

    /// An item or collection references an organization the session has
    /// no key for. Never falls back to the user key.
    #[error("unknown organization: {0}")]
    UnknownOrganization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] wardenlink_crypto::CryptoError),
}
