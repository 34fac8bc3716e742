//! The item decryption/encryption cascade and high-level vault
//! operations.
//!
//! Key selection is strict: a record that names an organization decrypts
//! with that organization's key or not at all; folder names always
//! decrypt with the user key (folders are a personal-vault concept).
//! Optional display fields degrade to `None` when unreadable, but a MAC
//! mismatch is always fatal — tampered ciphertext must never surface as
//! a quietly absent field.

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::types::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use wardenlink_crypto::{
    decrypt_aes, encrypt_aes, encrypt_rsa, generate_key_material, generate_rsa_keypair,
    server_password_hash, CryptoError, EncString, RsaDigest, SymmetricKey,
};

/// A fully decrypted vault entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedItem {
    pub id: String,
    pub kind: CipherType,
    pub deleted: bool,
    pub name: String,
    /// Display name of the owning organization, from cached profile
    /// metadata.
    pub org_name: Option<String>,
    pub folder_name: Option<String>,
    pub notes: Option<String>,
    pub payload: ItemPayload,
}

/// The type-specific payload; exactly one variant per item, selected by
/// the item's declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemPayload {
    Login(LoginData),
    SecureNote,
    Card(CardData),
    Identity,
    SshKey(SshKeyData),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginData {
    pub username: Option<String>,
    pub password: Option<String>,
    pub totp: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardData {
    pub brand: Option<String>,
    pub cardholder_name: Option<String>,
    pub number: Option<String>,
    pub exp_month: Option<String>,
    pub exp_year: Option<String>,
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SshKeyData {
    pub fingerprint: Option<String>,
    pub private_key: Option<String>,
    pub public_key: Option<String>,
}

/// A decrypted collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedCollection {
    pub id: String,
    pub org_id: String,
    pub name: String,
}

/// A folder with its name decrypted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedFolder {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedFolder {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedOrg {
    pub id: String,
    pub name: String,
    pub billing_email: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedCollection {
    pub id: String,
    pub org_id: String,
    pub name: String,
}

/// Common fields for creating a vault entry.
#[derive(Clone, Debug, Default)]
pub struct CreateItemArgs {
    pub name: String,
    pub folder_id: Option<String>,
    pub org_id: Option<String>,
    pub notes: Option<String>,
}

/// Login credentials for a new login entry.
#[derive(Clone, Debug, Default)]
pub struct LoginArgs {
    pub username: Option<String>,
    pub password: Option<String>,
    pub totp: Option<String>,
    pub uri: Option<String>,
}

/// An authenticated vault client: the API transport plus the unwrapped
/// session.
pub struct VaultClient {
    api: ApiClient,
    session: Session,
    email: String,
    password: Zeroizing<String>,
}

impl VaultClient {
    /// Logs in and builds the session: prelogin → credential exchange →
    /// profile fetch → key unwrap → folder fetch.
    pub async fn login(config: ClientConfig, email: &str, password: &str) -> ClientResult<Self> {
        let api = ApiClient::new(config);
        let kdf = api.prelogin(email).await?;
        let hash = server_password_hash(email, password, &kdf)?;
        api.connect_token(email, &hash).await?;

        let session = build_session(&api, email, password, kdf).await?;
        info!(email, "vault session established");

        Ok(Self {
            api,
            session,
            email: email.to_string(),
            password: Zeroizing::new(password.to_string()),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Rebuilds the session from a fresh profile fetch. Replaces the key
    /// and folder maps wholesale so organization membership changes can
    /// never leave a stale entry behind.
    pub async fn refresh_session(&mut self) -> ClientResult<()> {
        let kdf = self.session.kdf;
        self.session = build_session(&self.api, &self.email, &self.password, kdf).await?;
        debug!("session refreshed");
        Ok(())
    }

    // ── Reading the vault ──

    /// Decrypts a stored item field by field.
    pub fn decrypt_item(&self, item: &CipherItem) -> ClientResult<DecryptedItem> {
        decrypt_item(&self.session, item)
    }

    /// Fetches and decrypts every vault entry.
    pub async fn get_items(&self) -> ClientResult<Vec<DecryptedItem>> {
        let items = self.api.get_items().await?;
        items
            .iter()
            .map(|item| decrypt_item(&self.session, item))
            .collect()
    }

    /// Fetches and decrypts one vault entry.
    pub async fn get_item(&self, id: &str) -> ClientResult<DecryptedItem> {
        let item = self.api.get_item(id).await?;
        decrypt_item(&self.session, &item)
    }

    /// Finds an entry by type and plaintext name. There is no server-side
    /// search over ciphertext, so every candidate's name is decrypted and
    /// compared case-sensitively; the first match wins.
    pub async fn find_item(&self, kind: CipherType, name: &str) -> ClientResult<DecryptedItem> {
        let items = self.api.get_items().await?;
        for item in items.iter().filter(|i| i.kind == kind) {
            let key = self.session.key_for(item.organization_id.as_deref())?;
            let decrypted_name = decrypt_optional(key, item.name.as_deref())?;
            if decrypted_name.as_deref() == Some(name) {
                return decrypt_item(&self.session, item);
            }
        }
        Err(ClientError::NotFound(format!(
            "no {kind:?} item named {name:?}"
        )))
    }

    /// Fetches folders and decrypts their names. Folder names always use
    /// the user key.
    pub async fn get_folders(&self) -> ClientResult<Vec<DecryptedFolder>> {
        let folders = self.api.get_folders().await?;
        folders
            .into_iter()
            .map(|f| {
                Ok(DecryptedFolder {
                    name: decrypt_optional(&self.session.user_key, Some(&f.name))?
                        .unwrap_or_default(),
                    id: f.id,
                })
            })
            .collect()
    }

    /// Fetches and decrypts an organization's collections.
    pub async fn get_collections(&self, org_id: &str) -> ClientResult<Vec<DecryptedCollection>> {
        let org = self.session.org(org_id)?;
        let collections = self.api.get_collections(org_id).await?;

        collections
            .into_iter()
            .map(|c| {
                Ok(DecryptedCollection {
                    name: decrypt_optional(&org.key, Some(&c.name))?.unwrap_or_default(),
                    id: c.id,
                    org_id: c.organization_id,
                })
            })
            .collect()
    }

    /// Lists an organization's members (pending and confirmed).
    pub async fn get_org_members(&self, org_id: &str) -> ClientResult<Vec<OrgMember>> {
        self.session.org(org_id)?;
        self.api.get_org_members(org_id).await
    }

    // ── Creating content ──

    /// Creates a personal folder and returns it with its name decrypted.
    pub async fn create_folder(&mut self, name: &str) -> ClientResult<CreatedFolder> {
        let encrypted = encrypt_string(&self.session.user_key, name)?;
        let folder = self
            .api
            .create_folder(&CreateFolderRequest { name: encrypted })
            .await?;

        let decrypted =
            decrypt_optional(&self.session.user_key, Some(&folder.name))?.unwrap_or_default();
        let id = folder.id.clone();
        self.session.folders.insert(folder.id.clone(), folder);

        Ok(CreatedFolder {
            id,
            name: decrypted,
        })
    }

    /// Creates a login entry. Content is encrypted under the owning key:
    /// the organization's key when `args.org_id` is set, the user key
    /// otherwise.
    pub async fn create_login_item(
        &self,
        args: &CreateItemArgs,
        login: &LoginArgs,
        collection_ids: Vec<String>,
    ) -> ClientResult<DecryptedItem> {
        let key = self.session.key_for(args.org_id.as_deref())?;
        let cipher = CipherRequest {
            kind: CipherType::Login,
            name: encrypt_string(key, &args.name)?,
            notes: encrypt_opt(key, args.notes.as_deref())?,
            folder_id: args.folder_id.clone(),
            organization_id: args.org_id.clone(),
            login: Some(CipherLogin {
                username: encrypt_opt(key, login.username.as_deref())?,
                password: encrypt_opt(key, login.password.as_deref())?,
                totp: encrypt_opt(key, login.totp.as_deref())?,
                uri: encrypt_opt(key, login.uri.as_deref())?,
            }),
            secure_note: None,
        };

        let item = self
            .api
            .create_item(&CreateItemRequest {
                cipher,
                collection_ids,
            })
            .await?;
        decrypt_item(&self.session, &item)
    }

    /// Creates a secure-note entry; the content is the encrypted
    /// item-level notes field.
    pub async fn create_note_item(
        &self,
        args: &CreateItemArgs,
        collection_ids: Vec<String>,
    ) -> ClientResult<DecryptedItem> {
        let key = self.session.key_for(args.org_id.as_deref())?;
        let cipher = CipherRequest {
            kind: CipherType::SecureNote,
            name: encrypt_string(key, &args.name)?,
            notes: encrypt_opt(key, args.notes.as_deref())?,
            folder_id: args.folder_id.clone(),
            organization_id: args.org_id.clone(),
            login: None,
            secure_note: Some(CipherSecureNote::default()),
        };

        let item = self
            .api
            .create_item(&CreateItemRequest {
                cipher,
                collection_ids,
            })
            .await?;
        decrypt_item(&self.session, &item)
    }

    /// Creates an organization.
    ///
    /// Generates a fresh organization key, wraps it for this user with
    /// their public key, generates the organization's own RSA pair with
    /// its private half wrapped under the new organization key, then
    /// refetches the whole profile so the key map is rebuilt rather than
    /// patched.
    pub async fn create_organization(
        &mut self,
        name: &str,
        default_collection: Option<&str>,
    ) -> ClientResult<CreatedOrg> {
        let org_key = SymmetricKey::from_bytes(&generate_key_material())?;
        let wrapped_org_key = encrypt_rsa(
            &self.session.public_key_der,
            &org_key.to_bytes(),
            RsaDigest::Sha256,
        )?;

        let org_pair = generate_rsa_keypair()?;
        let wrapped_private = encrypt_aes(&org_key, &org_pair.private_der, true)?;

        let collection_name = match default_collection {
            Some(name) if !name.is_empty() => name,
            _ => "Default collection",
        };

        let req = CreateOrgRequest {
            name: name.to_string(),
            billing_email: self.session.profile.email.clone(),
            key: wrapped_org_key.encode()?,
            keys: OrgKeys {
                public_key: STANDARD.encode(&org_pair.public_der),
                encrypted_private_key: wrapped_private.encode()?,
            },
            collection_name: encrypt_string(&org_key, collection_name)?,
            plan_type: 0,
        };

        let created = self.api.create_organization(&req).await?;
        info!(org_id = %created.id, "organization created");

        // Membership changed: rebuild the session so the new key (and any
        // implicit memberships the server added) are present.
        self.refresh_session().await?;

        Ok(CreatedOrg {
            id: created.id,
            name: created.name,
            billing_email: created.billing_email,
        })
    }

    /// Creates a collection in an organization. The initial membership
    /// grants the creating user full management rights.
    pub async fn create_collection(
        &self,
        org_id: &str,
        name: &str,
    ) -> ClientResult<CreatedCollection> {
        let org = self.session.org(org_id)?;

        let owner = CollectionMembership {
            id: org.profile.organization_user_id.clone(),
            read_only: false,
            hide_passwords: false,
            manage: true,
        };
        let req = CreateCollectionRequest {
            name: encrypt_string(&org.key, name)?,
            users: vec![owner],
            groups: vec![],
        };

        let collection = self.api.create_collection(org_id, &req).await?;
        let decrypted = decrypt_optional(&org.key, Some(&collection.name))?.unwrap_or_default();

        Ok(CreatedCollection {
            id: collection.id,
            org_id: collection.organization_id,
            name: decrypted,
        })
    }

    /// Confirms a pending organization member: wraps the organization key
    /// with the member's public key and submits the envelope. This is the
    /// one operation that re-encrypts an existing key for a second
    /// recipient.
    pub async fn confirm_member(
        &self,
        org_id: &str,
        member_id: &str,
        user_id: &str,
    ) -> ClientResult<()> {
        let org = self.session.org(org_id)?;

        let member_key = self.api.get_public_key(user_id).await?;
        let public_der = STANDARD
            .decode(&member_key.public_key)
            .map_err(|e| ClientError::Api(format!("invalid public key encoding: {e}")))?;

        let envelope = encrypt_rsa(&public_der, &org.key.to_bytes(), RsaDigest::Sha256)?;
        self.api
            .confirm_member(
                org_id,
                member_id,
                &ConfirmMemberRequest {
                    key: envelope.encode()?,
                },
            )
            .await?;
        info!(org_id, member_id, "organization member confirmed");
        Ok(())
    }
}

/// Decrypts a stored item against a session, field by field.
///
/// The owning key is resolved once per the selection rule; each sub-field
/// then decrypts independently, absence yielding absence.
pub fn decrypt_item(session: &Session, item: &CipherItem) -> ClientResult<DecryptedItem> {
    let key = session.key_for(item.organization_id.as_deref())?;

    let name = decrypt_optional(key, item.name.as_deref())?.unwrap_or_default();
    let notes = decrypt_optional(key, item.notes.as_deref())?;

    let folder_name = match &item.folder_id {
        Some(folder_id) => match session.folders.get(folder_id) {
            // Folders belong to the personal vault: always the user key.
            Some(folder) => decrypt_optional(&session.user_key, Some(&folder.name))?,
            None => None,
        },
        None => None,
    };

    let org_name = item
        .organization_id
        .as_deref()
        .and_then(|id| session.orgs.get(id))
        .map(|org| org.profile.name.clone());

    let payload = match item.kind {
        CipherType::Login => {
            let login = item.login.clone().unwrap_or_default();
            ItemPayload::Login(LoginData {
                username: decrypt_optional(key, login.username.as_deref())?,
                password: decrypt_optional(key, login.password.as_deref())?,
                totp: decrypt_optional(key, login.totp.as_deref())?,
            })
        }
        CipherType::SecureNote => ItemPayload::SecureNote,
        CipherType::Card => {
            let card = item.card.clone().unwrap_or_default();
            ItemPayload::Card(CardData {
                brand: decrypt_optional(key, card.brand.as_deref())?,
                cardholder_name: decrypt_optional(key, card.cardholder_name.as_deref())?,
                number: decrypt_optional(key, card.number.as_deref())?,
                exp_month: decrypt_optional(key, card.exp_month.as_deref())?,
                exp_year: decrypt_optional(key, card.exp_year.as_deref())?,
                code: decrypt_optional(key, card.code.as_deref())?,
            })
        }
        CipherType::Identity => ItemPayload::Identity,
        CipherType::SshKey => {
            let ssh = item.ssh_key.clone().unwrap_or_default();
            ItemPayload::SshKey(SshKeyData {
                fingerprint: decrypt_optional(key, ssh.key_fingerprint.as_deref())?,
                private_key: decrypt_optional(key, ssh.private_key.as_deref())?,
                public_key: decrypt_optional(key, ssh.public_key.as_deref())?,
            })
        }
    };

    Ok(DecryptedItem {
        id: item.id.clone(),
        kind: item.kind,
        deleted: item.deleted_date.is_some(),
        name,
        org_name,
        folder_name,
        notes,
        payload,
    })
}

async fn build_session(
    api: &ApiClient,
    email: &str,
    password: &str,
    kdf: wardenlink_crypto::KdfConfig,
) -> ClientResult<Session> {
    let profile = api.get_profile().await?;
    let public_key = api.get_public_key(&profile.id).await?;
    let public_key_der = STANDARD
        .decode(&public_key.public_key)
        .map_err(|e| ClientError::Api(format!("invalid public key encoding: {e}")))?;
    let folders = api.get_folders().await?;

    Session::unlock(email, password, kdf, profile, folders, public_key_der)
}

/// Encrypts a plaintext string for persistence; the MAC is always
/// requested for persisted fields.
fn encrypt_string(key: &SymmetricKey, text: &str) -> ClientResult<String> {
    Ok(encrypt_aes(key, text.as_bytes(), true)?.encode()?)
}

fn encrypt_opt(key: &SymmetricKey, text: Option<&str>) -> ClientResult<Option<String>> {
    text.map(|t| encrypt_string(key, t)).transpose()
}

/// Best-effort decryption for optional display fields: absent or
/// unparsable ciphertext yields `None` so a listing can still surface the
/// rest of the record. A MAC mismatch is never downgraded — tampering
/// must fail the operation.
fn decrypt_optional(key: &SymmetricKey, text: Option<&str>) -> ClientResult<Option<String>> {
    let Some(text) = text else {
        return Ok(None);
    };
    let Some(parsed) = EncString::try_parse(text) else {
        return Ok(None);
    };
    match decrypt_aes(key, &parsed) {
        Ok(plaintext) => Ok(String::from_utf8(plaintext).ok()),
        Err(CryptoError::MacMismatch) => Err(CryptoError::MacMismatch.into()),
        Err(other) => {
            debug!("optional field failed to decrypt: {other}");
            Ok(None)
        }
    }
}
