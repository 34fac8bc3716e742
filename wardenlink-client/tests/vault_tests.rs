mod support;

use pretty_assertions::assert_eq;
use support::{mount_login, EchoCipher, EchoFolder, TestAccount, EMAIL, PASSWORD};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wardenlink_client::types::{CipherItem, CipherType};
use wardenlink_client::{
    decrypt_item, ClientConfig, ClientError, CreateItemArgs, ItemPayload, LoginArgs, VaultClient,
};
use wardenlink_crypto::{decrypt_aes, EncString};

async fn login(server: &MockServer) -> (TestAccount, VaultClient) {
    let account = TestAccount::with_org(support::test_kdf());
    mount_login(server, &account, serde_json::json!([])).await;
    let client = VaultClient::login(ClientConfig::new(server.uri()), EMAIL, PASSWORD)
        .await
        .unwrap();
    (account, client)
}

#[tokio::test]
async fn login_builds_session() {
    let server = MockServer::start().await;
    let (account, client) = login(&server).await;

    let session = client.session();
    assert_eq!(session.user_key.to_bytes(), account.user_key_material);
    assert!(session.orgs.contains_key("org-1"));
}

#[tokio::test]
async fn login_rejects_unknown_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/accounts/prelogin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = VaultClient::login(ClientConfig::new(server.uri()), EMAIL, PASSWORD).await;
    assert!(matches!(result, Err(ClientError::Auth(_))));
}

#[tokio::test]
async fn created_folder_roundtrips() {
    let server = MockServer::start().await;
    let (_account, mut client) = login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/folders"))
        .respond_with(EchoFolder)
        .mount(&server)
        .await;

    let folder = client.create_folder("Work").await.unwrap();
    assert_eq!(folder.name, "Work");

    // The session's folder map picks the new folder up immediately.
    assert!(client.session().folders.contains_key(&folder.id));
}

#[tokio::test]
async fn fetched_folders_decrypt() {
    let server = MockServer::start().await;
    let account = TestAccount::new(support::test_kdf());
    let folders = serde_json::json!([{
        "id": "folder-1",
        "name": account.encrypt_with_user_key("Work"),
        "revisionDate": null,
    }]);
    mount_login(&server, &account, folders).await;

    let client = VaultClient::login(ClientConfig::new(server.uri()), EMAIL, PASSWORD)
        .await
        .unwrap();

    let folders = client.get_folders().await.unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, "Work");
}

#[tokio::test]
async fn created_login_item_uses_user_key() {
    let server = MockServer::start().await;
    let (account, client) = login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/ciphers/create"))
        .respond_with(EchoCipher)
        .mount(&server)
        .await;

    let item = client
        .create_login_item(
            &CreateItemArgs {
                name: "example.com".to_string(),
                ..Default::default()
            },
            &LoginArgs {
                username: Some("alice".to_string()),
                password: Some("s3cret".to_string()),
                ..Default::default()
            },
            vec![],
        )
        .await
        .unwrap();

    assert_eq!(item.name, "example.com");
    let ItemPayload::Login(login) = &item.payload else {
        panic!("expected a login payload");
    };
    assert_eq!(login.username.as_deref(), Some("alice"));
    assert_eq!(login.password.as_deref(), Some("s3cret"));

    // The posted name must decrypt with the user key and with no other.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests.last().unwrap().body).unwrap();
    let name = EncString::parse(body["cipher"]["name"].as_str().unwrap()).unwrap();
    assert_eq!(
        decrypt_aes(&account.user_key, &name).unwrap(),
        b"example.com"
    );
    assert!(decrypt_aes(account.org_key.as_ref().unwrap(), &name).is_err());
}

#[tokio::test]
async fn created_org_item_uses_org_key() {
    let server = MockServer::start().await;
    let (account, client) = login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/ciphers/create"))
        .respond_with(EchoCipher)
        .mount(&server)
        .await;

    let item = client
        .create_note_item(
            &CreateItemArgs {
                name: "Shared note".to_string(),
                org_id: Some("org-1".to_string()),
                notes: Some("for the whole org".to_string()),
                ..Default::default()
            },
            vec![],
        )
        .await
        .unwrap();

    assert_eq!(item.name, "Shared note");
    assert_eq!(item.notes.as_deref(), Some("for the whole org"));
    assert_eq!(item.org_name.as_deref(), Some("Acme"));
    assert_eq!(item.payload, ItemPayload::SecureNote);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests.last().unwrap().body).unwrap();
    let name = EncString::parse(body["cipher"]["name"].as_str().unwrap()).unwrap();
    assert_eq!(
        decrypt_aes(account.org_key.as_ref().unwrap(), &name).unwrap(),
        b"Shared note"
    );
    assert!(decrypt_aes(&account.user_key, &name).is_err());
}

#[tokio::test]
async fn create_item_with_unknown_org_fails_before_any_request() {
    let server = MockServer::start().await;
    let (_account, client) = login(&server).await;

    let result = client
        .create_note_item(
            &CreateItemArgs {
                name: "orphan".to_string(),
                org_id: Some("org-missing".to_string()),
                ..Default::default()
            },
            vec![],
        )
        .await;

    assert!(matches!(result, Err(ClientError::UnknownOrganization(_))));
}

#[tokio::test]
async fn find_item_compares_decrypted_names() {
    let server = MockServer::start().await;
    let account = TestAccount::new(support::test_kdf());
    mount_login(&server, &account, serde_json::json!([])).await;

    let items = serde_json::json!({ "data": [
        {
            "id": "item-1",
            "type": 1,
            "name": account.encrypt_with_user_key("GitHub"),
            "login": { "username": account.encrypt_with_user_key("alice") },
        },
        {
            "id": "item-2",
            "type": 1,
            "name": account.encrypt_with_user_key("GitLab"),
            "login": { "username": account.encrypt_with_user_key("bob") },
        },
    ]});
    Mock::given(method("GET"))
        .and(path("/api/ciphers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(&server)
        .await;

    let client = VaultClient::login(ClientConfig::new(server.uri()), EMAIL, PASSWORD)
        .await
        .unwrap();

    let item = client.find_item(CipherType::Login, "GitLab").await.unwrap();
    assert_eq!(item.id, "item-2");
    let ItemPayload::Login(login) = &item.payload else {
        panic!("expected a login payload");
    };
    assert_eq!(login.username.as_deref(), Some("bob"));

    // Case-sensitive: "gitlab" is not "GitLab".
    assert!(matches!(
        client.find_item(CipherType::Login, "gitlab").await,
        Err(ClientError::NotFound(_))
    ));
}

#[tokio::test]
async fn org_items_resolve_org_name_and_folder_with_user_key() {
    let server = MockServer::start().await;
    let account = TestAccount::with_org(support::test_kdf());
    let folders = serde_json::json!([{
        "id": "folder-1",
        "name": account.encrypt_with_user_key("Clients"),
        "revisionDate": null,
    }]);
    mount_login(&server, &account, folders).await;

    let client = VaultClient::login(ClientConfig::new(server.uri()), EMAIL, PASSWORD)
        .await
        .unwrap();

    let item = CipherItem {
        id: "item-1".to_string(),
        kind: CipherType::Card,
        name: Some(account.encrypt_with_org_key("Company card")),
        notes: None,
        // Folder names decrypt with the user key even on org items.
        folder_id: Some("folder-1".to_string()),
        organization_id: Some("org-1".to_string()),
        deleted_date: None,
        revision_date: None,
        collection_ids: vec![],
        login: None,
        card: Some(wardenlink_client::types::CipherCard {
            number: Some(account.encrypt_with_org_key("4111111111111111")),
            ..Default::default()
        }),
        secure_note: None,
        ssh_key: None,
    };

    let decrypted = decrypt_item(client.session(), &item).unwrap();
    assert_eq!(decrypted.name, "Company card");
    assert_eq!(decrypted.org_name.as_deref(), Some("Acme"));
    assert_eq!(decrypted.folder_name.as_deref(), Some("Clients"));
    let ItemPayload::Card(card) = &decrypted.payload else {
        panic!("expected a card payload");
    };
    assert_eq!(card.number.as_deref(), Some("4111111111111111"));
    assert_eq!(card.brand, None);
}

#[tokio::test]
async fn tampered_field_is_a_hard_failure() {
    let server = MockServer::start().await;
    let (account, client) = login(&server).await;

    let mut encrypted = EncString::parse(&account.encrypt_with_user_key("target")).unwrap();
    encrypted.data[0] ^= 0x01;

    let item = CipherItem {
        id: "item-1".to_string(),
        kind: CipherType::SecureNote,
        name: Some(encrypted.encode().unwrap()),
        notes: None,
        folder_id: None,
        organization_id: None,
        deleted_date: None,
        revision_date: None,
        collection_ids: vec![],
        login: None,
        card: None,
        secure_note: None,
        ssh_key: None,
    };

    // Tampering is never downgraded to an absent field.
    assert!(matches!(
        decrypt_item(client.session(), &item),
        Err(ClientError::Crypto(
            wardenlink_crypto::CryptoError::MacMismatch
        ))
    ));
}

#[tokio::test]
async fn malformed_optional_field_degrades_to_absent() {
    let server = MockServer::start().await;
    let (account, client) = login(&server).await;

    let item = CipherItem {
        id: "item-1".to_string(),
        kind: CipherType::Login,
        name: Some(account.encrypt_with_user_key("Valid name")),
        notes: Some("not an encrypted value".to_string()),
        folder_id: None,
        organization_id: None,
        deleted_date: None,
        revision_date: None,
        collection_ids: vec![],
        login: None,
        card: None,
        secure_note: None,
        ssh_key: None,
    };

    let decrypted = decrypt_item(client.session(), &item).unwrap();
    assert_eq!(decrypted.name, "Valid name");
    assert_eq!(decrypted.notes, None);
}

#[tokio::test]
async fn collections_decrypt_with_org_key() {
    let server = MockServer::start().await;
    let (account, client) = login(&server).await;

    let collections = serde_json::json!({ "data": [{
        "id": "col-1",
        "organizationId": "org-1",
        "name": account.encrypt_with_org_key("Engineering"),
    }]});
    Mock::given(method("GET"))
        .and(path("/api/organizations/org-1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collections))
        .mount(&server)
        .await;

    let collections = client.get_collections("org-1").await.unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].name, "Engineering");

    assert!(matches!(
        client.get_collections("org-missing").await,
        Err(ClientError::UnknownOrganization(_))
    ));
}

#[tokio::test]
async fn confirm_member_wraps_org_key_for_recipient() {
    let server = MockServer::start().await;
    let (account, client) = login(&server).await;

    // The candidate member has their own key pair; reuse the fixture pair
    // as theirs so the test can unwrap what the client submits.
    Mock::given(method("GET"))
        .and(path("/api/users/user-2/public-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userId": "user-2",
            "publicKey": account.public_key_b64,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/organizations/org-1/users/member-2/confirm"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client
        .confirm_member("org-1", "member-2", "user-2")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let confirm = requests
        .iter()
        .find(|r| r.url.path().ends_with("/confirm"))
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&confirm.body).unwrap();
    let envelope = EncString::parse(body["key"].as_str().unwrap()).unwrap();

    let unwrapped = wardenlink_crypto::decrypt_rsa(
        &support::user_pair().private_der,
        &envelope,
    )
    .unwrap();
    assert_eq!(unwrapped, account.org_key_material.unwrap());
}
