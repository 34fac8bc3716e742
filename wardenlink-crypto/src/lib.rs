//! Key hierarchy and wire codec for the wardenlink vault client.
//!
//! Provides the client-side cryptography for a zero-knowledge vault:
//! - PBKDF2 key derivation from the master password
//! - HMAC-based key stretching into encryption/authentication sub-keys
//! - AES-CBC + HMAC-SHA256 authenticated encryption for vault content
//! - RSA-OAEP envelopes for sharing symmetric keys between members
//!
//! # Architecture
//!
//! The key hierarchy is derived entirely on the client:
//!
//! 1. **Master key**: PBKDF2 over (password, salt = email). Never stored
//!    and never transmitted.
//!
//! 2. **Stretched key**: the master key expanded into a 64-byte
//!    encryption+authentication key. Unwraps the user key.
//!
//! 3. **User key**: random 64-byte key protecting the personal vault,
//!    stored server-side only in encrypted form.
//!
//! 4. **Organization keys**: random 64-byte keys shared among members,
//!    each copy wrapped with a member's RSA public key.
//!
//! The server only ever sees ciphertext in the `scheme.part|part|part`
//! wire format implemented by [`EncString`].

mod cipher;
mod enc_string;
mod error;
mod kdf;
mod key;
mod rsa_envelope;

pub use cipher::{decrypt_aes, encrypt_aes, encrypt_aes_with_iv, IV_SIZE};
pub use enc_string::{EncScheme, EncString};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{
    master_key, password_hash, server_password_hash, stretch_key, KdfConfig, KdfType,
    DEFAULT_PBKDF2_ITERATIONS,
};
pub use key::{generate_key_material, SymmetricKey, KEY_MATERIAL_SIZE};
pub use rsa_envelope::{
    decrypt_rsa, encrypt_rsa, generate_rsa_keypair, RsaDigest, RsaKeyPair, RSA_KEY_BITS,
};
