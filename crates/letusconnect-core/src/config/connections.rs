//! Connection graph policy configuration.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Policy knobs for the connection graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    /// Seconds after a rejection during which the sender may not re-request.
    /// Zero permits an immediate re-request.
    #[serde(default)]
    pub rerequest_cooldown_seconds: u64,
    /// Whether the requester is notified when a request is rejected.
    #[serde(default)]
    pub notify_on_reject: bool,
    /// Maximum length of the free-text message attached to a request.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: u64,
}

impl ConnectionsConfig {
    /// Re-request cooldown, `None` when re-requests are allowed at once.
    pub fn rerequest_cooldown(&self) -> Option<TimeDelta> {
        match self.rerequest_cooldown_seconds {
            0 => None,
            secs => Some(super::seconds_delta(secs)),
        }
    }
}

impl Default for ConnectionsConfig {
    fn default() -> Self {
        Self {
            rerequest_cooldown_seconds: 0,
            notify_on_reject: false,
            max_message_length: default_max_message_length(),
        }
    }
}

fn default_max_message_length() -> u64 {
    500
}
