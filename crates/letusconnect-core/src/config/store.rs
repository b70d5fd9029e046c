//! Document store access configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadlines and retry policy for document store calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Deadline applied to every store call, in seconds.
    #[serde(default = "default_deadline")]
    pub deadline_seconds: u64,
    /// Maximum attempts for a transaction under contention.
    #[serde(default = "default_max_attempts")]
    pub transaction_max_attempts: u32,
    /// Base backoff between transaction attempts; attempt `n` waits `n` times this.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

impl StoreConfig {
    /// Store call deadline as a [`Duration`].
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_seconds)
    }

    /// Retry base delay as a [`Duration`].
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: default_deadline(),
            transaction_max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

fn default_deadline() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    100
}
