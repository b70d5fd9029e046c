//! Identity resolver configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identity lookups and their cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Maximum cached user profiles.
    #[serde(default = "default_capacity")]
    pub cache_capacity: u64,
    /// Profile cache time-to-live in seconds.
    #[serde(default = "default_ttl")]
    pub cache_ttl_seconds: u64,
    /// JSON file with user profiles loaded into the in-memory directory.
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl IdentityConfig {
    /// Cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_capacity(),
            cache_ttl_seconds: default_ttl(),
            seed_file: None,
        }
    }
}

fn default_capacity() -> u64 {
    10_000
}

fn default_ttl() -> u64 {
    300
}
