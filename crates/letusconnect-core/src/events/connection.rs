//! Connection-graph domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::Uid;

/// Events emitted after a connection-graph transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConnectionEvent {
    /// A connection request was sent.
    RequestSent {
        /// The requester.
        from: Uid,
        /// The requester's display name.
        from_name: String,
        /// The addressee.
        to: Uid,
        /// Free-text message attached to the request.
        message: String,
    },
    /// A connection request was accepted.
    RequestAccepted {
        /// The original requester, who gets notified.
        from: Uid,
        /// The user who accepted.
        to: Uid,
        /// The accepting user's display name.
        to_name: String,
    },
    /// A connection request was rejected.
    RequestRejected {
        /// The original requester.
        from: Uid,
        /// The user who rejected.
        to: Uid,
        /// The rejecting user's display name.
        to_name: String,
    },
}

impl ConnectionEvent {
    /// Notification type tag for the event.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::RequestSent { .. } => "connection_request",
            Self::RequestAccepted { .. } => "connection_accepted",
            Self::RequestRejected { .. } => "connection_rejected",
        }
    }
}
