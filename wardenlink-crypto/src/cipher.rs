//! Authenticated symmetric encryption: AES-CBC with PKCS7 padding and
//! HMAC-SHA256 over iv-then-ciphertext.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::enc_string::{EncScheme, EncString};
use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;

/// AES-CBC initialization vector size.
pub const IV_SIZE: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Encrypts with a fresh random IV.
///
/// With `with_mac`, the key must carry an authentication sub-key and the
/// result is scheme 1 or 2 by encryption sub-key size; without, only
/// 32-byte encryption keys are valid and the result is scheme 0. Every
/// persisted vault field uses `with_mac = true`.
pub fn encrypt_aes(key: &SymmetricKey, plaintext: &[u8], with_mac: bool) -> CryptoResult<EncString> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    encrypt_aes_with_iv(key, plaintext, with_mac, iv)
}

/// Encrypts with a caller-supplied IV. Prefer [`encrypt_aes`]; this exists
/// for deterministic construction in tests and interop checks.
pub fn encrypt_aes_with_iv(
    key: &SymmetricKey,
    plaintext: &[u8],
    with_mac: bool,
    iv: [u8; IV_SIZE],
) -> CryptoResult<EncString> {
    let ciphertext = match key.enc_key().len() {
        16 => Aes128CbcEnc::new_from_slices(key.enc_key(), &iv)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => Aes256CbcEnc::new_from_slices(key.enc_key(), &iv)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        n => {
            return Err(CryptoError::Encryption(format!(
                "unsupported AES key length {n}"
            )))
        }
    };

    if with_mac {
        let mac_key = key.mac_key().ok_or_else(|| {
            CryptoError::Encryption("MAC requested but key has no authentication sub-key".into())
        })?;
        let scheme = match key.enc_key().len() {
            16 => EncScheme::AesCbc128HmacSha256,
            _ => EncScheme::AesCbc256HmacSha256,
        };
        let mac = mac_iv_then_ciphertext(mac_key, &iv, &ciphertext)?;
        Ok(EncString {
            scheme,
            data: ciphertext,
            iv: Some(iv.to_vec()),
            mac: Some(mac),
        })
    } else {
        if key.enc_key().len() != 32 {
            return Err(CryptoError::Encryption(
                "unauthenticated encryption requires a 32-byte key".into(),
            ));
        }
        Ok(EncString {
            scheme: EncScheme::AesCbc256,
            data: ciphertext,
            iv: Some(iv.to_vec()),
            mac: None,
        })
    }
}

/// Decrypts a symmetric scheme (0/1/2).
///
/// For the authenticated schemes the MAC is verified in constant time
/// *before* the ciphertext is touched; a mismatch is
/// [`CryptoError::MacMismatch`] and no plaintext is produced.
pub fn decrypt_aes(key: &SymmetricKey, value: &EncString) -> CryptoResult<Vec<u8>> {
    let iv = value
        .iv
        .as_deref()
        .ok_or_else(|| CryptoError::Decryption("missing IV".into()))?;

    match value.scheme {
        EncScheme::AesCbc256 => {}
        EncScheme::AesCbc128HmacSha256 | EncScheme::AesCbc256HmacSha256 => {
            let mac_key = key.mac_key().ok_or_else(|| {
                CryptoError::Decryption("key has no authentication sub-key".into())
            })?;
            let mac = value
                .mac
                .as_deref()
                .ok_or_else(|| CryptoError::Decryption("missing MAC".into()))?;
            verify_mac(mac_key, iv, &value.data, mac)?;
        }
        other => return Err(CryptoError::UnsupportedScheme(other)),
    }

    let plaintext = match key.enc_key().len() {
        16 => Aes128CbcDec::new_from_slices(key.enc_key(), iv)
            .map_err(|e| CryptoError::Decryption(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(&value.data),
        32 => Aes256CbcDec::new_from_slices(key.enc_key(), iv)
            .map_err(|e| CryptoError::Decryption(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(&value.data),
        n => {
            return Err(CryptoError::Decryption(format!(
                "unsupported AES key length {n}"
            )))
        }
    };

    plaintext.map_err(|_| CryptoError::Decryption("invalid padding".into()))
}

fn mac_iv_then_ciphertext(mac_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn verify_mac(mac_key: &[u8], iv: &[u8], ciphertext: &[u8], expected: &[u8]) -> CryptoResult<()> {
    let mut mac =
        HmacSha256::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac.update(iv);
    mac.update(ciphertext);
    mac.verify_slice(expected).map_err(|_| CryptoError::MacMismatch)
}
