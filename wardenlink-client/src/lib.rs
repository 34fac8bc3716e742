//! Vault client for Bitwarden-compatible servers.
//!
//! Builds an authenticated session from (email, master password) entirely
//! on the client, then decrypts/encrypts vault items, folders and
//! organization data field by field. The server only ever sees ciphertext.
//!
//! # Architecture
//!
//! - **`api`**: HTTP client for the identity and vault API endpoints
//! - **`types`**: typed request/response payloads (ciphertext-bearing)
//! - **`session`**: the unwrapped key hierarchy for one login
//! - **`vault`**: the per-field decrypt/encrypt cascade and high-level
//!   vault operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use wardenlink_client::{ClientConfig, VaultClient};
//!
//! let config = ClientConfig::new("https://vault.example.com");
//! let mut client = VaultClient::login(config, "user@example.com", "master password").await?;
//!
//! for item in client.get_items().await? {
//!     println!("{}", item.name);
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod vault;

pub use api::ApiClient;
pub use config::{ClientConfig, DeviceInfo};
pub use error::{ClientError, ClientResult};
pub use session::{OrgContext, Session};
pub use vault::{
    decrypt_item, CardData, CreateItemArgs, CreatedCollection, CreatedFolder, CreatedOrg,
    DecryptedCollection, DecryptedFolder, DecryptedItem, ItemPayload, LoginArgs, LoginData,
    SshKeyData, VaultClient,
};
