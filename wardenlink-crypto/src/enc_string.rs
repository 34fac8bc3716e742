//! Wire codec for encrypted values.
//!
//! Every encrypted field and key envelope travels as a string of the form
//! `<scheme>.<part>|<part>|<part>`, each part base64-encoded. The leading
//! integer selects the scheme and fixes the number and meaning of parts:
//!
//! | id | scheme                          | parts            |
//! |----|---------------------------------|------------------|
//! | 0  | AES-CBC-256                     | iv, data         |
//! | 1  | AES-CBC-128 + HMAC-SHA256       | iv, data, mac    |
//! | 2  | AES-CBC-256 + HMAC-SHA256       | iv, data, mac    |
//! | 3  | RSA-OAEP-SHA256                 | data             |
//! | 4  | RSA-OAEP-SHA1                   | data             |
//! | 5  | RSA-OAEP-SHA256 + HMAC-SHA256   | data, mac        |
//! | 6  | RSA-OAEP-SHA1 + HMAC-SHA256     | data, mac        |
//!
//! The encoded string is the one persisted/transmitted artifact of this
//! crate and must stay byte-for-byte compatible with the table above.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Encryption scheme identifier carried in the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncScheme {
    AesCbc256 = 0,
    AesCbc128HmacSha256 = 1,
    AesCbc256HmacSha256 = 2,
    Rsa2048OaepSha256 = 3,
    Rsa2048OaepSha1 = 4,
    Rsa2048OaepSha256HmacSha256 = 5,
    Rsa2048OaepSha1HmacSha256 = 6,
}

impl EncScheme {
    /// Numeric wire identifier.
    pub fn id(self) -> u8 {
        self as u8
    }

    fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::AesCbc256),
            1 => Some(Self::AesCbc128HmacSha256),
            2 => Some(Self::AesCbc256HmacSha256),
            3 => Some(Self::Rsa2048OaepSha256),
            4 => Some(Self::Rsa2048OaepSha1),
            5 => Some(Self::Rsa2048OaepSha256HmacSha256),
            6 => Some(Self::Rsa2048OaepSha1HmacSha256),
            _ => None,
        }
    }

    /// Whether this scheme carries an IV part.
    pub fn has_iv(self) -> bool {
        matches!(
            self,
            Self::AesCbc256 | Self::AesCbc128HmacSha256 | Self::AesCbc256HmacSha256
        )
    }

    /// Whether this scheme carries a MAC part.
    pub fn has_mac(self) -> bool {
        matches!(
            self,
            Self::AesCbc128HmacSha256
                | Self::AesCbc256HmacSha256
                | Self::Rsa2048OaepSha256HmacSha256
                | Self::Rsa2048OaepSha1HmacSha256
        )
    }
}

/// A parsed encrypted value.
///
/// `iv` and `mac` are `Some` exactly when the scheme declares them; a part
/// absent for the scheme is `None`, never zero-length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncString {
    pub scheme: EncScheme,
    pub data: Vec<u8>,
    pub iv: Option<Vec<u8>>,
    pub mac: Option<Vec<u8>>,
}

impl EncString {
    /// Parses the wire format, returning `None` on blank input or any
    /// malformed text. Use this in non-fatal validation contexts where
    /// "no value" is an acceptable outcome.
    pub fn try_parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let (id, rest) = text.split_once('.')?;
        let scheme = EncScheme::from_id(id.parse().ok()?)?;
        let parts: Vec<&str> = rest.split('|').collect();

        let (iv, data, mac) = match scheme {
            EncScheme::AesCbc256 => match parts[..] {
                [iv, data] => (Some(iv), data, None),
                _ => return None,
            },
            EncScheme::AesCbc128HmacSha256 | EncScheme::AesCbc256HmacSha256 => match parts[..] {
                [iv, data, mac] => (Some(iv), data, Some(mac)),
                _ => return None,
            },
            EncScheme::Rsa2048OaepSha256 | EncScheme::Rsa2048OaepSha1 => match parts[..] {
                [data] => (None, data, None),
                _ => return None,
            },
            EncScheme::Rsa2048OaepSha256HmacSha256 | EncScheme::Rsa2048OaepSha1HmacSha256 => {
                match parts[..] {
                    [data, mac] => (None, data, Some(mac)),
                    _ => return None,
                }
            }
        };

        Some(Self {
            scheme,
            data: decode_part(data)?,
            iv: match iv {
                Some(part) => Some(decode_part(part)?),
                None => None,
            },
            mac: match mac {
                Some(part) => Some(decode_part(part)?),
                None => None,
            },
        })
    }

    /// Parses the wire format, failing with [`CryptoError::InvalidEncString`]
    /// on any malformed input.
    pub fn parse(text: &str) -> CryptoResult<Self> {
        Self::try_parse(text).ok_or(CryptoError::InvalidEncString)
    }

    /// Serializes back to the wire format.
    ///
    /// A value missing a part its scheme requires cannot be represented on
    /// the wire; that is a programmer error surfaced as
    /// [`CryptoError::MissingPart`].
    pub fn encode(&self) -> CryptoResult<String> {
        let missing = || CryptoError::MissingPart(self.scheme);
        let mut out = format!("{}.", self.scheme.id());

        if self.scheme.has_iv() {
            let iv = self.iv.as_ref().ok_or_else(missing)?;
            out.push_str(&STANDARD.encode(iv));
            out.push('|');
        }
        out.push_str(&STANDARD.encode(&self.data));
        if self.scheme.has_mac() {
            let mac = self.mac.as_ref().ok_or_else(missing)?;
            out.push('|');
            out.push_str(&STANDARD.encode(mac));
        }

        Ok(out)
    }
}

fn decode_part(part: &str) -> Option<Vec<u8>> {
    if part.is_empty() {
        return None;
    }
    STANDARD.decode(part).ok()
}

impl FromStr for EncString {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EncScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
