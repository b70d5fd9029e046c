//! Notification scheduler configuration.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Notification scheduler worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler is enabled.
    #[serde(default = "super::default_true")]
    pub enabled: bool,
    /// Interval in seconds between ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
    /// Maximum notifications examined per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// How long a dispatch lease is held before another instance may take over.
    #[serde(default = "default_lease")]
    pub lease_seconds: u64,
    /// Attempts before a retryable failure becomes `failed`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Upper bound for delivering one notification to all of its recipients.
    /// Must stay below `lease_seconds`.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_seconds: u64,
    /// Delay added to `scheduled_at` per attempt after a retryable failure.
    #[serde(default)]
    pub retry_backoff_seconds: u64,
    /// Lease holder identifier; a random one is generated when absent.
    #[serde(default)]
    pub worker_id: Option<String>,
}

impl SchedulerConfig {
    /// Tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    /// Dispatch timeout as a [`Duration`].
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_seconds)
    }

    /// Lease length as a signed delta.
    pub fn lease(&self) -> TimeDelta {
        super::seconds_delta(self.lease_seconds)
    }

    /// How far a retry after `attempts` failures is pushed back.
    pub fn retry_backoff(&self, attempts: u32) -> TimeDelta {
        super::seconds_delta(self.retry_backoff_seconds.saturating_mul(u64::from(attempts)))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_seconds: default_tick_interval(),
            batch_size: default_batch_size(),
            lease_seconds: default_lease(),
            max_attempts: default_max_attempts(),
            dispatch_timeout_seconds: default_dispatch_timeout(),
            retry_backoff_seconds: 0,
            worker_id: None,
        }
    }
}

fn default_tick_interval() -> u64 {
    60
}

fn default_batch_size() -> u32 {
    100
}

fn default_lease() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_dispatch_timeout() -> u64 {
    30
}
