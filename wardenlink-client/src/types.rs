//! Typed API payloads.
//!
//! These records mirror the server's JSON shapes. Every secret-bearing
//! field (`key`, `name`, `notes`, credential fields, ...) holds the
//! encrypted-value wire string, never plaintext; the cascade in
//! [`crate::vault`] is the only place they are decrypted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use wardenlink_crypto::{KdfConfig, KdfType};

/// Bearer token pair returned by the identity endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// The identity endpoint echoes the account KDF settings with
    /// PascalCase names, unlike every other endpoint.
    #[serde(rename = "Kdf", default)]
    pub kdf: Option<KdfType>,
    #[serde(rename = "KdfIterations", default)]
    pub kdf_iterations: Option<u32>,
    #[serde(rename = "Key", default)]
    pub key: Option<String>,
    #[serde(rename = "PrivateKey", default)]
    pub private_key: Option<String>,
}

/// The authenticated user's profile, including the encrypted key
/// envelopes the session builder unwraps.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    /// User key, AES-encrypted under the stretched master key.
    pub key: String,
    /// RSA private key (PKCS#8), AES-encrypted under the user key.
    pub private_key: Option<String>,
    #[serde(default)]
    pub organizations: Vec<OrganizationProfile>,
}

/// An organization membership as it appears in the profile.
///
/// Everything here is plaintext except `key`, the organization key
/// envelope wrapped with this user's RSA public key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationProfile {
    pub id: String,
    pub name: String,
    pub key: String,
    pub organization_user_id: String,
    #[serde(default)]
    pub status: MembershipStatus,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Membership lifecycle state of an organization user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum MembershipStatus {
    Revoked = -1,
    Invited = 0,
    Accepted = 1,
    Confirmed = 2,
}

impl Default for MembershipStatus {
    fn default() -> Self {
        Self::Confirmed
    }
}

impl TryFrom<i8> for MembershipStatus {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Revoked),
            0 => Ok(Self::Invited),
            1 => Ok(Self::Accepted),
            2 => Ok(Self::Confirmed),
            other => Err(format!("unknown membership status {other}")),
        }
    }
}

impl From<MembershipStatus> for i8 {
    fn from(value: MembershipStatus) -> Self {
        value as i8
    }
}

/// A folder record; `name` stays encrypted until resolved by the cascade.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub revision_date: Option<DateTime<Utc>>,
}

/// Generic `{ "data": [...] }` list wrapper the API uses.
#[derive(Clone, Debug, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
}

/// Another user's RSA public key, for wrapping an organization key
/// during member confirmation.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublicKey {
    pub user_id: String,
    /// Base64 SubjectPublicKeyInfo DER.
    pub public_key: String,
}

/// Vault entry type discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CipherType {
    Login = 1,
    SecureNote = 2,
    Card = 3,
    Identity = 4,
    SshKey = 5,
}

impl TryFrom<u8> for CipherType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Login),
            2 => Ok(Self::SecureNote),
            3 => Ok(Self::Card),
            4 => Ok(Self::Identity),
            5 => Ok(Self::SshKey),
            other => Err(format!("unknown cipher type {other}")),
        }
    }
}

impl From<CipherType> for u8 {
    fn from(value: CipherType) -> Self {
        value as u8
    }
}

/// A stored vault entry as returned by the server: the id/type/date
/// fields are plaintext, everything else is encrypted-value strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CipherType,
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revision_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collection_ids: Vec<String>,
    #[serde(default)]
    pub login: Option<CipherLogin>,
    #[serde(default)]
    pub card: Option<CipherCard>,
    #[serde(default)]
    pub secure_note: Option<CipherSecureNote>,
    #[serde(default)]
    pub ssh_key: Option<CipherSshKey>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherLogin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardholder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Secure notes carry only a numeric subtype on the wire; the content
/// lives in the item-level `notes` field.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CipherSecureNote {
    #[serde(rename = "type", default)]
    pub note_type: i32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherSshKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Request body for creating a vault entry; every encrypted field is
/// already an encrypted-value string when this is assembled.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub cipher: CipherRequest,
    pub collection_ids: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherRequest {
    #[serde(rename = "type")]
    pub kind: CipherType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<CipherLogin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_note: Option<CipherSecureNote>,
}

/// New organization request: the fresh organization key wrapped for the
/// creator, plus the organization's own RSA pair.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgRequest {
    pub name: String,
    pub billing_email: String,
    /// Organization key, RSA-wrapped with the creator's public key.
    pub key: String,
    pub keys: OrgKeys,
    /// Encrypted name of the default collection.
    pub collection_name: String,
    /// 0 is the free plan.
    pub plan_type: u8,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgKeys {
    /// Base64 SubjectPublicKeyInfo DER.
    pub public_key: String,
    /// PKCS#8 private key, AES-encrypted under the organization key.
    pub encrypted_private_key: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgResponse {
    pub id: String,
    pub name: String,
    pub billing_email: String,
}

/// Per-user membership entry in a collection grant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMembership {
    pub id: String,
    pub read_only: bool,
    pub hide_passwords: bool,
    pub manage: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    pub name: String,
    pub users: Vec<CollectionMembership>,
    pub groups: Vec<CollectionMembership>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgCollection {
    pub id: String,
    pub organization_id: String,
    pub name: String,
}

/// An organization member as listed by the members endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgMember {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: MembershipStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfirmMemberRequest {
    /// Organization key, RSA-wrapped with the confirmed member's
    /// public key.
    pub key: String,
}
