//! Delivery adapter configuration.

use serde::{Deserialize, Serialize};

/// Endpoints for the external delivery relays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// SMS relay; the channel is disabled when absent.
    #[serde(default)]
    pub sms: Option<RelayConfig>,
    /// Email relay; the channel is disabled when absent.
    #[serde(default)]
    pub email: Option<RelayConfig>,
    /// Push bus settings.
    #[serde(default)]
    pub push: PushConfig,
}

/// An HTTP relay endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay URL receiving `POST` requests.
    pub url: String,
    /// Bearer token for the relay.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sender address or number.
    pub sender: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Backend used for push fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushBackend {
    /// In-process broadcast channels.
    #[default]
    Memory,
    /// Redis `PUBLISH`.
    Redis,
}

/// Push bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Which bus implementation to use.
    #[serde(default)]
    pub backend: PushBackend,
    /// Redis URL for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Per-channel buffer for the memory backend.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            backend: PushBackend::Memory,
            redis_url: None,
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_buffer_size() -> usize {
    256
}
