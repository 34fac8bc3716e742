//! Crypto error types.

use thiserror::Error;

use crate::enc_string::EncScheme;
use crate::kdf::KdfType;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in key derivation, encryption and decryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The encrypted-value text could not be parsed: unknown scheme id,
    /// malformed base64, or wrong part count for the scheme.
    #[error("malformed encrypted value")]
    InvalidEncString,

    /// An encrypted value is missing a part its scheme requires
    /// (e.g. serializing an authenticated scheme without a MAC).
    #[error("encrypted value for scheme {0:?} is missing a required part")]
    MissingPart(EncScheme),

    /// The account is configured with a KDF this client does not implement.
    #[error("unsupported KDF type {0:?}")]
    UnsupportedKdf(KdfType),

    /// A decrypt was attempted with a scheme the given key cannot handle.
    #[error("unsupported scheme {0:?} for this key")]
    UnsupportedScheme(EncScheme),

    /// Raw key material had an invalid length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// MAC verification failed. The ciphertext was tampered with or the
    /// wrong key was used; the plaintext is never returned.
    #[error("MAC verification failed")]
    MacMismatch,

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("key generation error: {0}")]
    KeyGeneration(String),
}
