//! Password-based key derivation and key stretching.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;

/// Default iteration count servers hand out for new PBKDF2 accounts.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// KDF algorithm selector, as reported by the prelogin endpoint.
///
/// Only PBKDF2 is implemented; an Argon2id account is a fatal
/// [`CryptoError::UnsupportedKdf`], never a silent fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum KdfType {
    Pbkdf2 = 0,
    Argon2id = 1,
}

impl TryFrom<u8> for KdfType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pbkdf2),
            1 => Ok(Self::Argon2id),
            other => Err(format!("unknown KDF type {other}")),
        }
    }
}

impl From<KdfType> for u8 {
    fn from(value: KdfType) -> Self {
        value as u8
    }
}

/// Account KDF configuration fetched during prelogin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfConfig {
    pub kdf: KdfType,
    #[serde(rename = "kdfIterations")]
    pub iterations: u32,
    #[serde(rename = "kdfMemory", default)]
    pub memory: Option<u32>,
    #[serde(rename = "kdfParallelism", default)]
    pub parallelism: Option<u32>,
}

impl KdfConfig {
    pub fn pbkdf2(iterations: u32) -> Self {
        Self {
            kdf: KdfType::Pbkdf2,
            iterations,
            memory: None,
            parallelism: None,
        }
    }
}

/// Derives the 32-byte master key from the account credentials:
/// PBKDF2-HMAC-SHA256 over the password with the email as salt.
///
/// The master key never leaves the client.
pub fn master_key(email: &str, password: &str, config: &KdfConfig) -> CryptoResult<[u8; 32]> {
    if config.kdf != KdfType::Pbkdf2 {
        return Err(CryptoError::UnsupportedKdf(config.kdf));
    }

    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        email.as_bytes(),
        config.iterations,
        &mut key,
    );
    Ok(key)
}

/// Derives the password verifier: one further PBKDF2 round over the
/// master key with the password as salt.
///
/// The same construction serves two roles: base64-encoded it is the
/// credential sent to the server ([`server_password_hash`]); kept raw and
/// local it lets a session re-verify the password without a round-trip.
pub fn password_hash(email: &str, password: &str, config: &KdfConfig) -> CryptoResult<[u8; 32]> {
    let master = master_key(email, password, config)?;
    let mut hash = [0u8; 32];
    pbkdf2_hmac::<Sha256>(&master, password.as_bytes(), 1, &mut hash);
    Ok(hash)
}

/// The server-facing credential: [`password_hash`], base64-encoded.
pub fn server_password_hash(
    email: &str,
    password: &str,
    config: &KdfConfig,
) -> CryptoResult<String> {
    Ok(STANDARD.encode(password_hash(email, password, config)?))
}

/// Stretches 32 bytes of master-key material into a 64-byte
/// encryption+authentication key.
///
/// Each sub-key is `HMAC-SHA256(material, info || 0x01)` with info "enc"
/// and "mac" respectively. The result unwraps the user key.
pub fn stretch_key(material: &[u8; 32]) -> SymmetricKey {
    SymmetricKey::from_parts(expand_key(material, "enc"), expand_key(material, "mac"))
}

fn expand_key(material: &[u8], info: &str) -> Vec<u8> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(material).expect("HMAC accepts any key length");
    mac.update(info.as_bytes());
    mac.update(&[1]);
    mac.finalize().into_bytes().to_vec()
}
