//! Client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a vault client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the server (e.g., "https://vault.example.com").
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Device metadata sent during authentication. Free-form client
    /// identification, not security-relevant.
    pub device: DeviceInfo,
}

/// Device metadata for the token exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub identifier: String,
    /// Numeric client-type discriminator the identity endpoint expects;
    /// 21 is the SDK client type.
    pub device_type: u8,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            name: "wardenlink".to_string(),
            identifier: uuid::Uuid::new_v4().to_string(),
            device_type: 21,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: 30,
            device: DeviceInfo::default(),
        }
    }
}
