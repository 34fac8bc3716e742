//! Shared fixtures: a synthetic account whose key envelopes were built
//! with the same primitives the session builder unwraps them with.
#![allow(dead_code)]

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use wardenlink_client::types::{Folder, MembershipStatus, OrganizationProfile, Profile};
use wardenlink_client::Session;
use wardenlink_crypto::{
    encrypt_aes, encrypt_rsa, generate_key_material, generate_rsa_keypair, master_key,
    stretch_key, KdfConfig, RsaDigest, RsaKeyPair, SymmetricKey,
};

pub const EMAIL: &str = "tester@example.com";
pub const PASSWORD: &str = "tester-password";

/// Fast KDF settings for tests that are not about iteration counts.
pub fn test_kdf() -> KdfConfig {
    KdfConfig::pbkdf2(5_000)
}

/// One RSA pair per test binary; keygen dominates test time otherwise.
pub fn user_pair() -> &'static RsaKeyPair {
    static PAIR: OnceLock<RsaKeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate_rsa_keypair().expect("rsa keygen"))
}

pub struct TestAccount {
    pub kdf: KdfConfig,
    pub user_key_material: [u8; 64],
    pub user_key: SymmetricKey,
    pub org_key_material: Option<[u8; 64]>,
    pub org_key: Option<SymmetricKey>,
    pub profile: Profile,
    pub public_key_b64: String,
}

impl TestAccount {
    pub fn new(kdf: KdfConfig) -> Self {
        Self::build(kdf, false)
    }

    pub fn with_org(kdf: KdfConfig) -> Self {
        Self::build(kdf, true)
    }

    fn build(kdf: KdfConfig, with_org: bool) -> Self {
        let pair = user_pair();

        let user_key_material = generate_key_material();
        let user_key = SymmetricKey::from_bytes(&user_key_material).unwrap();

        let master = master_key(EMAIL, PASSWORD, &kdf).unwrap();
        let stretched = stretch_key(&master);
        let encrypted_user_key = encrypt_aes(&stretched, &user_key_material, true)
            .unwrap()
            .encode()
            .unwrap();
        let encrypted_private_key = encrypt_aes(&user_key, &pair.private_der, true)
            .unwrap()
            .encode()
            .unwrap();

        let (organizations, org_key_material, org_key) = if with_org {
            let material = generate_key_material();
            let key = SymmetricKey::from_bytes(&material).unwrap();
            let wrapped = encrypt_rsa(&pair.public_der, &material, RsaDigest::Sha256)
                .unwrap()
                .encode()
                .unwrap();
            let org = OrganizationProfile {
                id: "org-1".to_string(),
                name: "Acme".to_string(),
                key: wrapped,
                organization_user_id: "member-1".to_string(),
                status: MembershipStatus::Confirmed,
                enabled: true,
            };
            (vec![org], Some(material), Some(key))
        } else {
            (vec![], None, None)
        };

        let profile = Profile {
            id: "user-1".to_string(),
            name: Some("Tester".to_string()),
            email: EMAIL.to_string(),
            key: encrypted_user_key,
            private_key: Some(encrypted_private_key),
            organizations,
        };

        Self {
            kdf,
            user_key_material,
            user_key,
            org_key_material,
            org_key,
            profile,
            public_key_b64: STANDARD.encode(&pair.public_der),
        }
    }

    /// Runs the pure unwrap pipeline against this account.
    pub fn unlock(&self, folders: Vec<Folder>) -> wardenlink_client::ClientResult<Session> {
        Session::unlock(
            EMAIL,
            PASSWORD,
            self.kdf,
            self.profile.clone(),
            folders,
            user_pair().public_der.clone(),
        )
    }

    /// Encrypts a string under the user key, as the server would store it.
    pub fn encrypt_with_user_key(&self, text: &str) -> String {
        encrypt_aes(&self.user_key, text.as_bytes(), true)
            .unwrap()
            .encode()
            .unwrap()
    }

    pub fn encrypt_with_org_key(&self, text: &str) -> String {
        encrypt_aes(self.org_key.as_ref().unwrap(), text.as_bytes(), true)
            .unwrap()
            .encode()
            .unwrap()
    }
}

/// Mounts the endpoints the login flow touches.
pub async fn mount_login(server: &MockServer, account: &TestAccount, folders: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/identity/accounts/prelogin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::to_value(account.kdf).unwrap()),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/identity/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "scope": "api offline_access"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/accounts/profile"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::to_value(&account.profile).unwrap()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/user-1/public-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userId": "user-1",
            "publicKey": account.public_key_b64,
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": folders })),
        )
        .mount(server)
        .await;
}

/// Echoes the posted folder back with a server-assigned id.
pub struct EchoFolder;

impl Respond for EchoFolder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "folder-1",
            "name": body["name"],
            "revisionDate": null,
        }))
    }
}

/// Echoes the posted cipher back as the stored item.
pub struct EchoCipher;

impl Respond for EchoCipher {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let cipher = &body["cipher"];
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "item-1",
            "type": cipher["type"],
            "name": cipher["name"],
            "notes": cipher.get("notes").cloned().unwrap_or(serde_json::Value::Null),
            "folderId": cipher.get("folderId").cloned().unwrap_or(serde_json::Value::Null),
            "organizationId": cipher
                .get("organizationId")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            "login": cipher.get("login").cloned().unwrap_or(serde_json::Value::Null),
            "secureNote": cipher
                .get("secureNote")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            "collectionIds": body
                .get("collectionIds")
                .cloned()
                .unwrap_or_else(|| serde_json::json!([])),
        }))
    }
}
