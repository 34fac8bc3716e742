//! HTTP client for the identity and vault API endpoints.
//!
//! Handles the password-grant token exchange, bearer authentication,
//! token refresh on 401, and the typed endpoint bindings the session
//! builder and cascade consume. No plaintext secrets pass through here:
//! every secret-bearing field is already an encrypted-value string.

use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::*;

/// State shared across API client clones.
struct AuthState {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// HTTP client for a Bitwarden-compatible server.
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    auth: Arc<RwLock<AuthState>>,
    /// Serializes refresh operations; concurrent 401s would otherwise all
    /// spend the same refresh token and the later calls would fail.
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            config,
            auth: Arc::new(RwLock::new(AuthState {
                access_token: None,
                refresh_token: None,
            })),
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.access_token.is_some()
    }

    pub async fn logout(&self) {
        let mut auth = self.auth.write().await;
        auth.access_token = None;
        auth.refresh_token = None;
    }

    // ── Identity ──

    /// Fetches the account's KDF configuration. Fails with
    /// [`ClientError::Auth`] if the account does not exist.
    pub async fn prelogin(&self, email: &str) -> ClientResult<KdfConfig> {
        let url = format!("{}/identity/accounts/prelogin", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Auth(format!("prelogin failed: {e}")))?;

        Ok(resp.json().await?)
    }

    /// Exchanges the derived credential hash for a bearer token.
    pub async fn connect_token(
        &self,
        email: &str,
        password_hash: &str,
    ) -> ClientResult<TokenResponse> {
        let url = format!("{}/identity/connect/token", self.config.base_url);
        let device = &self.config.device;
        let device_type = device.device_type.to_string();
        let form = [
            ("grant_type", "password"),
            ("scope", "api offline_access"),
            ("client_id", "web"),
            ("username", email),
            ("password", password_hash),
            ("deviceType", device_type.as_str()),
            ("deviceName", device.name.as_str()),
            ("deviceIdentifier", device.identifier.as_str()),
        ];

        let resp: TokenResponse = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Auth(format!("credential exchange rejected: {e}")))?
            .json()
            .await?;

        let mut auth = self.auth.write().await;
        auth.access_token = Some(resp.access_token.clone());
        auth.refresh_token = resp.refresh_token.clone();

        Ok(resp)
    }

    async fn refresh_access_token(&self) -> ClientResult<String> {
        let _guard = self.refresh_lock.lock().await;

        let refresh_token = {
            let auth = self.auth.read().await;
            auth.refresh_token.clone().ok_or(ClientError::AuthRequired)?
        };

        let url = format!("{}/identity/connect/token", self.config.base_url);
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", "web"),
            ("refresh_token", refresh_token.as_str()),
        ];

        let resp = self.client.post(&url).form(&form).send().await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::BAD_REQUEST
        {
            // Refresh token expired or revoked — the session is over.
            self.logout().await;
            return Err(ClientError::Auth(
                "token refresh failed: re-authentication required".to_string(),
            ));
        }

        let resp: TokenResponse = resp
            .error_for_status()
            .map_err(|e| ClientError::Auth(format!("token refresh failed: {e}")))?
            .json()
            .await?;

        let mut auth = self.auth.write().await;
        auth.access_token = Some(resp.access_token.clone());
        if resp.refresh_token.is_some() {
            auth.refresh_token = resp.refresh_token;
        }

        Ok(resp.access_token)
    }

    // ── Request plumbing ──

    async fn get_token(&self) -> ClientResult<String> {
        self.auth
            .read()
            .await
            .access_token
            .clone()
            .ok_or(ClientError::AuthRequired)
    }

    /// Authenticated GET, retrying once on 401.
    async fn auth_get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = format!("{}{}", self.config.base_url, path);
        let token = self.get_token().await?;

        let mut resp = self.client.get(&url).bearer_auth(&token).send().await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!("401 on GET {path}, refreshing token");
            let new_token = self.refresh_access_token().await?;
            resp = self.client.get(&url).bearer_auth(&new_token).send().await?;
        }

        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(resp.json().await?)
    }

    /// Authenticated POST, retrying once on 401.
    async fn auth_post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.config.base_url, path);
        let token = self.get_token().await?;

        let mut resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!("401 on POST {path}, refreshing token");
            let new_token = self.refresh_access_token().await?;
            resp = self
                .client
                .post(&url)
                .bearer_auth(&new_token)
                .json(body)
                .send()
                .await?;
        }

        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(resp.json().await?)
    }

    /// Like `auth_post`, for endpoints that reply with an empty body.
    async fn auth_post_unit(&self, path: &str, body: &impl Serialize) -> ClientResult<()> {
        let url = format!("{}{}", self.config.base_url, path);
        let token = self.get_token().await?;

        let mut resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!("401 on POST {path}, refreshing token");
            let new_token = self.refresh_access_token().await?;
            resp = self
                .client
                .post(&url)
                .bearer_auth(&new_token)
                .json(body)
                .send()
                .await?;
        }

        resp.error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(())
    }

    // ── Accounts ──

    pub async fn get_profile(&self) -> ClientResult<Profile> {
        self.auth_get("/api/accounts/profile").await
    }

    pub async fn get_public_key(&self, user_id: &str) -> ClientResult<UserPublicKey> {
        self.auth_get(&format!("/api/users/{user_id}/public-key"))
            .await
    }

    // ── Folders ──

    pub async fn get_folders(&self) -> ClientResult<Vec<Folder>> {
        let list: ListResponse<Folder> = self.auth_get("/api/folders").await?;
        Ok(list.data)
    }

    pub async fn create_folder(&self, req: &CreateFolderRequest) -> ClientResult<Folder> {
        self.auth_post("/api/folders", req).await
    }

    // ── Ciphers ──

    pub async fn get_items(&self) -> ClientResult<Vec<CipherItem>> {
        let list: ListResponse<CipherItem> = self.auth_get("/api/ciphers").await?;
        Ok(list.data)
    }

    pub async fn get_item(&self, id: &str) -> ClientResult<CipherItem> {
        self.auth_get(&format!("/api/ciphers/{id}")).await
    }

    pub async fn create_item(&self, req: &CreateItemRequest) -> ClientResult<CipherItem> {
        self.auth_post("/api/ciphers/create", req).await
    }

    // ── Organizations ──

    pub async fn create_organization(
        &self,
        req: &CreateOrgRequest,
    ) -> ClientResult<CreateOrgResponse> {
        self.auth_post("/api/organizations", req).await
    }

    pub async fn get_collections(&self, org_id: &str) -> ClientResult<Vec<OrgCollection>> {
        let list: ListResponse<OrgCollection> = self
            .auth_get(&format!("/api/organizations/{org_id}/collections"))
            .await?;
        Ok(list.data)
    }

    pub async fn create_collection(
        &self,
        org_id: &str,
        req: &CreateCollectionRequest,
    ) -> ClientResult<OrgCollection> {
        self.auth_post(&format!("/api/organizations/{org_id}/collections"), req)
            .await
    }

    pub async fn get_org_members(&self, org_id: &str) -> ClientResult<Vec<OrgMember>> {
        let list: ListResponse<OrgMember> = self
            .auth_get(&format!("/api/organizations/{org_id}/users"))
            .await?;
        Ok(list.data)
    }

    pub async fn confirm_member(
        &self,
        org_id: &str,
        member_id: &str,
        req: &ConfirmMemberRequest,
    ) -> ClientResult<()> {
        self.auth_post_unit(
            &format!("/api/organizations/{org_id}/users/{member_id}/confirm"),
            req,
        )
        .await
    }
}
