//! Pending and sent connection requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use letusconnect_core::types::id::Uid;

use super::status::{RequestStatus, SentRequestStatus};

/// An inbound request held on the addressee's document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    /// The requester.
    pub from_uid: Uid,
    /// The requester's display name at send time.
    pub from_name: String,
    /// The addressee (owner of the document holding this entry).
    pub to_uid: Uid,
    /// When the request was sent.
    pub sent_at: DateTime<Utc>,
    /// Free-text message.
    #[serde(default)]
    pub message: String,
    /// Request status.
    pub status: RequestStatus,
}

/// The sender-side mirror of a request, kept after terminal outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentRequest {
    /// The addressee.
    pub to_uid: Uid,
    /// When the request was sent.
    pub sent_at: DateTime<Utc>,
    /// Free-text message.
    #[serde(default)]
    pub message: String,
    /// Request status.
    pub status: SentRequestStatus,
    /// When the request was accepted.
    #[serde(default)]
    pub accepted: Option<DateTime<Utc>>,
    /// When the request reached any terminal status.
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

impl SentRequest {
    /// Whether this mirror matches the inbound entry on the peer's document.
    pub fn mirrors(&self, inbound: &ConnectionRequest) -> bool {
        self.to_uid == inbound.to_uid
            && self.sent_at == inbound.sent_at
            && self.message == inbound.message
    }

    /// Move to a terminal status.
    pub fn resolve(&mut self, status: SentRequestStatus, at: DateTime<Utc>) {
        self.status = status;
        self.responded_at = Some(at);
        if status == SentRequestStatus::Accepted {
            self.accepted = Some(at);
        }
    }
}
