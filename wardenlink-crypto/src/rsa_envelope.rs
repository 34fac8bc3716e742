//! RSA-OAEP key envelopes.
//!
//! Organization keys are shared by wrapping the raw symmetric material
//! with each member's RSA public key. Keys are 2048-bit; the public half
//! travels as SubjectPublicKeyInfo DER, the private half as PKCS#8 DER
//! (itself stored AES-encrypted under the owning symmetric key).

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

use crate::enc_string::{EncScheme, EncString};
use crate::error::{CryptoError, CryptoResult};

/// RSA modulus size for generated key pairs.
pub const RSA_KEY_BITS: usize = 2048;

/// OAEP digest selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RsaDigest {
    Sha1,
    Sha256,
}

/// A generated RSA key pair in standard binary encodings.
#[derive(Clone)]
pub struct RsaKeyPair {
    /// SubjectPublicKeyInfo DER.
    pub public_der: Vec<u8>,
    /// PKCS#8 DER.
    pub private_der: Vec<u8>,
}

/// Generates a fresh 2048-bit RSA key pair.
pub fn generate_rsa_keypair() -> CryptoResult<RsaKeyPair> {
    let private = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);

    let private_der = private
        .to_pkcs8_der()
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?
        .as_bytes()
        .to_vec();
    let public_der = public
        .to_public_key_der()
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?
        .into_vec();

    Ok(RsaKeyPair {
        public_der,
        private_der,
    })
}

/// Wraps `data` (key material) with a recipient's public key.
pub fn encrypt_rsa(public_der: &[u8], data: &[u8], digest: RsaDigest) -> CryptoResult<EncString> {
    let public = RsaPublicKey::from_public_key_der(public_der)
        .map_err(|e| CryptoError::Encryption(format!("invalid public key: {e}")))?;

    let (scheme, ciphertext) = match digest {
        RsaDigest::Sha256 => (
            EncScheme::Rsa2048OaepSha256,
            public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), data),
        ),
        RsaDigest::Sha1 => (
            EncScheme::Rsa2048OaepSha1,
            public.encrypt(&mut OsRng, Oaep::new::<Sha1>(), data),
        ),
    };

    Ok(EncString {
        scheme,
        data: ciphertext.map_err(|e| CryptoError::Encryption(e.to_string()))?,
        iv: None,
        mac: None,
    })
}

/// Unwraps an RSA envelope with the recipient's private key, selecting
/// the OAEP digest from the parsed scheme.
pub fn decrypt_rsa(private_der: &[u8], value: &EncString) -> CryptoResult<Vec<u8>> {
    let private = RsaPrivateKey::from_pkcs8_der(private_der)
        .map_err(|e| CryptoError::Decryption(format!("invalid private key: {e}")))?;

    let decrypted = match value.scheme {
        EncScheme::Rsa2048OaepSha256 | EncScheme::Rsa2048OaepSha256HmacSha256 => {
            private.decrypt(Oaep::new::<Sha256>(), &value.data)
        }
        EncScheme::Rsa2048OaepSha1 | EncScheme::Rsa2048OaepSha1HmacSha256 => {
            private.decrypt(Oaep::new::<Sha1>(), &value.data)
        }
        other => return Err(CryptoError::UnsupportedScheme(other)),
    };

    decrypted.map_err(|_| CryptoError::Decryption("envelope open failed (wrong key or tampered data)".into()))
}
