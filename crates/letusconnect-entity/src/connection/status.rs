//! Connection and request status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an entry in a user's `connections` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Accepted, bidirectional link.
    Active,
    /// The owner blocked the peer.
    Blocked,
}

/// Status of an inbound pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting a decision.
    Pending,
    /// Declined by the addressee.
    Rejected,
}

/// Status of the sender-side mirror of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentRequestStatus {
    /// Awaiting a decision.
    Pending,
    /// The addressee accepted.
    Accepted,
    /// The addressee declined.
    Rejected,
    /// The sender took the request back.
    Withdrawn,
}

impl SentRequestStatus {
    /// Whether the request reached a final outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for SentRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a user relates to a peer, as seen from the user's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerState {
    /// No relationship.
    None,
    /// Active connection.
    Connected,
    /// The user sent a request that is still pending.
    PendingOutgoing,
    /// The peer sent a request that is still pending.
    PendingIncoming,
    /// The user blocked the peer.
    Blocked,
}
