//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section is optional and falls back to its defaults, so
//! an empty configuration is a valid one.

pub mod connections;
pub mod delivery;
pub mod identity;
pub mod logging;
pub mod notifications;
pub mod scheduler;
pub mod store;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

pub use self::connections::ConnectionsConfig;
pub use self::delivery::{DeliveryConfig, PushBackend, PushConfig, RelayConfig};
pub use self::identity::IdentityConfig;
pub use self::logging::LoggingConfig;
pub use self::notifications::{DispatchMode, NotificationsConfig};
pub use self::scheduler::SchedulerConfig;
pub use self::store::StoreConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document store access settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Connection graph policy.
    #[serde(default)]
    pub connections: ConnectionsConfig,
    /// Notification reader and dispatcher settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Notification scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Delivery adapter endpoints.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Identity resolver settings.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `LETUSCONNECT_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LETUSCONNECT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot honour.
    pub fn validate(&self) -> Result<(), AppError> {
        let bounded = [
            ("connections.rerequest_cooldown_seconds", self.connections.rerequest_cooldown_seconds),
            ("scheduler.lease_seconds", self.scheduler.lease_seconds),
            ("scheduler.dispatch_timeout_seconds", self.scheduler.dispatch_timeout_seconds),
            ("scheduler.retry_backoff_seconds", self.scheduler.retry_backoff_seconds),
        ];
        for (key, value) in bounded {
            if value > MAX_CONFIG_SECONDS {
                return Err(AppError::configuration(format!(
                    "{key} = {value} exceeds the maximum of {MAX_CONFIG_SECONDS}"
                )));
            }
        }
        if self.scheduler.dispatch_timeout_seconds >= self.scheduler.lease_seconds {
            return Err(AppError::configuration(format!(
                "scheduler.dispatch_timeout_seconds ({}) must be below scheduler.lease_seconds ({})",
                self.scheduler.dispatch_timeout_seconds, self.scheduler.lease_seconds
            )));
        }
        Ok(())
    }
}

/// Upper bound for any second-valued setting: ten years.
pub const MAX_CONFIG_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Seconds as a signed delta, clamped to [`MAX_CONFIG_SECONDS`].
pub(crate) fn seconds_delta(secs: u64) -> TimeDelta {
    i64::try_from(secs.min(MAX_CONFIG_SECONDS))
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

fn default_true() -> bool {
    true
}
