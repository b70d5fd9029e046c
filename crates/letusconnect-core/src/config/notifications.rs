//! Notification reader and dispatcher configuration.

use serde::{Deserialize, Serialize};

/// How the event dispatcher hands composed notifications to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Compose and persist on a background task.
    #[default]
    Background,
    /// Compose and persist before returning to the caller.
    Inline,
}

/// Notification reader and dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Page size used when the caller does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Upper bound for a requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Dispatcher execution mode.
    #[serde(default)]
    pub dispatch_mode: DispatchMode,
    /// Number of entries returned in `recent_activity` of the stats view.
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: u32,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            dispatch_mode: DispatchMode::default(),
            recent_activity_limit: default_recent_activity_limit(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_recent_activity_limit() -> u32 {
    5
}
