//! Per-user connection document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use letusconnect_core::types::id::Uid;

use super::request::{ConnectionRequest, SentRequest};
use super::status::{ConnectionStatus, PeerState, SentRequestStatus};

/// Collection holding one [`UserConnections`] document per user.
pub const USER_CONNECTIONS_COLLECTION: &str = "user_connections";

/// A link from the document owner to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// The peer.
    pub target_uid: Uid,
    /// The peer's display name when the link was made.
    pub target_name: String,
    /// When the originating request was sent.
    pub sent_at: DateTime<Utc>,
    /// When the request was accepted; `None` for blocked entries.
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
    /// Link status.
    pub status: ConnectionStatus,
}

impl Connection {
    /// Whether this is an accepted, active link.
    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active
    }
}

/// All connection state owned by one user.
///
/// The document id equals the owner's uid, so the document for a uid can
/// be read inside a transaction without a secondary lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConnections {
    /// Document id.
    pub id: String,
    /// Owner.
    pub uid: Uid,
    /// Links keyed by peer uid.
    #[serde(default)]
    pub connections: BTreeMap<Uid, Connection>,
    /// Inbound requests keyed by sender uid.
    #[serde(default)]
    pub pending_requests: BTreeMap<Uid, ConnectionRequest>,
    /// Outbound requests keyed by addressee uid.
    #[serde(default)]
    pub sent_requests: BTreeMap<Uid, SentRequest>,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl UserConnections {
    /// An empty document for `uid`.
    pub fn empty(uid: Uid, now: DateTime<Utc>) -> Self {
        Self {
            id: uid.as_str().to_string(),
            uid,
            connections: BTreeMap::new(),
            pending_requests: BTreeMap::new(),
            sent_requests: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The active link to `peer`, if any.
    pub fn active_connection(&self, peer: &Uid) -> Option<&Connection> {
        self.connections.get(peer).filter(|c| c.is_active())
    }

    /// Whether the owner has an active link to `peer`.
    pub fn is_connected_to(&self, peer: &Uid) -> bool {
        self.active_connection(peer).is_some()
    }

    /// Whether the owner blocked `peer`.
    pub fn has_blocked(&self, peer: &Uid) -> bool {
        self.connections
            .get(peer)
            .is_some_and(|c| c.status == ConnectionStatus::Blocked)
    }

    /// Uids of all active connections.
    pub fn active_peers(&self) -> impl Iterator<Item = &Uid> {
        self.connections
            .iter()
            .filter(|(_, c)| c.is_active())
            .map(|(uid, _)| uid)
    }

    /// Number of active connections.
    pub fn active_count(&self) -> usize {
        self.active_peers().count()
    }

    /// How the owner relates to `peer`.
    pub fn peer_state(&self, peer: &Uid) -> PeerState {
        if let Some(conn) = self.connections.get(peer) {
            return match conn.status {
                ConnectionStatus::Active => PeerState::Connected,
                ConnectionStatus::Blocked => PeerState::Blocked,
            };
        }
        if self.pending_requests.contains_key(peer) {
            return PeerState::PendingIncoming;
        }
        if self
            .sent_requests
            .get(peer)
            .is_some_and(|s| s.status == SentRequestStatus::Pending)
        {
            return PeerState::PendingOutgoing;
        }
        PeerState::None
    }

    /// Record a write at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
