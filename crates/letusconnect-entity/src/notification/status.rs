//! Notification status and its transition graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery status of a notification.
///
/// Transitions follow a DAG: `pending` leads to `sending` (lease held by a
/// scheduler), `sent`, `failed` or `cancelled`; `sending` returns to
/// `pending` only for a retry; `sent` leads to `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Waiting for its scheduled instant.
    Pending,
    /// Claimed by a scheduler instance.
    Sending,
    /// Handed to the delivery adapter.
    Sent,
    /// Read by its single recipient.
    Read,
    /// Delivery gave up.
    Failed,
    /// Cancelled before dispatch.
    Cancelled,
}

impl NotificationStatus {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        matches!(
            (self, next),
            (Pending, Sending | Sent | Failed | Cancelled)
                | (Sending, Pending | Sent | Failed | Cancelled)
                | (Sent, Read)
        )
    }

    /// Whether `sent_at` must be set in this status.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Sent | Self::Read)
    }

    /// Whether no further scheduler work is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Read | Self::Failed | Self::Cancelled)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Read => "read",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
