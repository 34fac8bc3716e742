//! The unwrapped key hierarchy for one authenticated login.
//!
//! A [`Session`] owns every key derived during login: the user key, the
//! user's RSA pair, and one symmetric key per organization membership.
//! It is a plain value — no ambient state — passed into each cascade
//! operation. When organization membership changes the maps are rebuilt
//! wholesale and swapped, never patched.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::types::{Folder, Profile};
use wardenlink_crypto::{
    decrypt_aes, decrypt_rsa, master_key, password_hash, stretch_key, EncString, KdfConfig,
    SymmetricKey,
};

/// One organization membership: the plaintext profile entry plus the
/// unwrapped organization key.
pub struct OrgContext {
    pub profile: crate::types::OrganizationProfile,
    pub key: SymmetricKey,
}

/// The session's key hierarchy and cached vault metadata.
pub struct Session {
    /// Root key of the personal vault.
    pub user_key: SymmetricKey,
    /// RSA private key (PKCS#8 DER) for unwrapping organization keys.
    pub private_key_der: Vec<u8>,
    /// RSA public key (SPKI DER) for wrapping keys to this user.
    pub public_key_der: Vec<u8>,
    /// Organization keys and metadata, keyed by organization id.
    pub orgs: HashMap<String, OrgContext>,
    /// Raw folder records, keyed by folder id; names decrypt lazily.
    pub folders: HashMap<String, Folder>,
    /// The plaintext profile fields (id, email, memberships).
    pub profile: Profile,
    /// KDF settings the account was derived with.
    pub kdf: KdfConfig,
    /// Local password verifier; never transmitted.
    local_hash: [u8; 32],
}

impl Session {
    /// Unwraps the key hierarchy from an authenticated profile:
    /// stretched key → user key → private key → organization keys.
    ///
    /// Any envelope that fails to unwrap fails the whole unlock; a
    /// session with a missing organization key would silently misroute
    /// decryption later.
    pub fn unlock(
        email: &str,
        password: &str,
        kdf: KdfConfig,
        profile: Profile,
        folders: Vec<Folder>,
        public_key_der: Vec<u8>,
    ) -> ClientResult<Self> {
        let master = master_key(email, password, &kdf)?;
        let stretched = stretch_key(&master);

        let user_key_material = decrypt_aes(&stretched, &EncString::parse(&profile.key)?)?;
        let user_key = SymmetricKey::from_bytes(&user_key_material)?;

        let encrypted_private = profile
            .private_key
            .as_deref()
            .ok_or_else(|| ClientError::Api("profile has no private key".to_string()))?;
        let private_key_der = decrypt_aes(&user_key, &EncString::parse(encrypted_private)?)?;

        let mut orgs = HashMap::new();
        for org in &profile.organizations {
            let material = decrypt_rsa(&private_key_der, &EncString::parse(&org.key)?)?;
            orgs.insert(
                org.id.clone(),
                OrgContext {
                    profile: org.clone(),
                    key: SymmetricKey::from_bytes(&material)?,
                },
            );
        }
        debug!(
            organizations = orgs.len(),
            folders = folders.len(),
            "session unlocked"
        );

        let local_hash = password_hash(email, password, &kdf)?;
        let folders = folders.into_iter().map(|f| (f.id.clone(), f)).collect();

        Ok(Self {
            user_key,
            private_key_der,
            public_key_der,
            orgs,
            folders,
            profile,
            kdf,
            local_hash,
        })
    }

    /// Resolves an organization context, failing on unknown ids.
    pub fn org(&self, org_id: &str) -> ClientResult<&OrgContext> {
        self.orgs
            .get(org_id)
            .ok_or_else(|| ClientError::UnknownOrganization(org_id.to_string()))
    }

    /// Selects the owning key for a record: the organization's key when
    /// an organization id is present, the user key otherwise. An
    /// unresolvable organization id is an error, never a user-key
    /// fallback.
    pub fn key_for(&self, org_id: Option<&str>) -> ClientResult<&SymmetricKey> {
        match org_id {
            Some(id) => Ok(&self.org(id)?.key),
            None => Ok(&self.user_key),
        }
    }

    /// Re-verifies the master password locally, without a server
    /// round-trip.
    pub fn verify_password(&self, email: &str, password: &str) -> bool {
        password_hash(email, password, &self.kdf)
            .map(|hash| hash == self.local_hash)
            .unwrap_or(false)
    }
}
