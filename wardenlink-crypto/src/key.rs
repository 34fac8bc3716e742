//! Symmetric key material.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Size of freshly generated user/organization key material.
pub const KEY_MATERIAL_SIZE: usize = 64;

/// A symmetric vault key: an AES encryption sub-key plus an optional
/// HMAC authentication sub-key.
///
/// Constructed from raw key material: 32 bytes yield an encryption-only
/// key (unauthenticated AES-CBC family), 64 bytes split into a 32-byte
/// encryption sub-key and a 32-byte authentication sub-key (the
/// AES-CBC + HMAC family). Key material is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    enc_key: Vec<u8>,
    mac_key: Option<Vec<u8>>,
}

impl SymmetricKey {
    /// Builds a key from raw material. Lengths other than 32 or 64 bytes
    /// are rejected.
    pub fn from_bytes(material: &[u8]) -> CryptoResult<Self> {
        match material.len() {
            32 => Ok(Self {
                enc_key: material.to_vec(),
                mac_key: None,
            }),
            64 => Ok(Self {
                enc_key: material[..32].to_vec(),
                mac_key: Some(material[32..].to_vec()),
            }),
            actual => Err(CryptoError::InvalidKeyLength {
                expected: 64,
                actual,
            }),
        }
    }

    /// Builds a key directly from its two sub-keys.
    pub(crate) fn from_parts(enc_key: Vec<u8>, mac_key: Vec<u8>) -> Self {
        Self {
            enc_key,
            mac_key: Some(mac_key),
        }
    }

    pub fn enc_key(&self) -> &[u8] {
        &self.enc_key
    }

    pub fn mac_key(&self) -> Option<&[u8]> {
        self.mac_key.as_deref()
    }

    /// Re-concatenates the raw material, for wrapping this key under
    /// another key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.enc_key.clone();
        if let Some(mac) = &self.mac_key {
            out.extend_from_slice(mac);
        }
        out
    }
}

// Key material must never end up in logs.
impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("enc_key", &"<redacted>")
            .field("mac_key", &self.mac_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Generates 64 bytes of fresh key material for a new user or
/// organization key: two concatenated 32-byte AES keys from the OS
/// secure random source.
pub fn generate_key_material() -> [u8; KEY_MATERIAL_SIZE] {
    let mut material = [0u8; KEY_MATERIAL_SIZE];
    OsRng.fill_bytes(&mut material);
    material
}
