//! Project-collaboration domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::Uid;

/// Events related to project join requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProjectEvent {
    /// A user asked to join a project.
    JoinRequested {
        /// Project id.
        project_id: String,
        /// Project title.
        project_title: String,
        /// Project owner, who gets notified.
        owner: Uid,
        /// The requesting user.
        requester: Uid,
        /// The requesting user's display name.
        requester_name: String,
        /// Free-text message.
        message: String,
    },
    /// The owner accepted a join request.
    JoinAccepted {
        /// Project id.
        project_id: String,
        /// Project title.
        project_title: String,
        /// Project owner.
        owner: Uid,
        /// The owner's display name.
        owner_name: String,
        /// The accepted user, who gets notified.
        requester: Uid,
    },
}

impl ProjectEvent {
    /// Notification type tag for the event.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::JoinRequested { .. } => "project_join_request",
            Self::JoinAccepted { .. } => "project_join_accepted",
        }
    }
}
