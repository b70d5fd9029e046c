//! User-lifecycle domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::Uid;

/// Events related to user accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UserEvent {
    /// A new user joined the platform.
    Registered {
        /// The new user's id.
        uid: Uid,
        /// The new user's display name.
        display_name: String,
    },
}

impl UserEvent {
    /// Notification type tag for the event.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "new_user",
        }
    }
}
