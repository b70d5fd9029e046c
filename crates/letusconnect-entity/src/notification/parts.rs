//! Value objects embedded in a notification document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entity the notification refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    /// Entity id.
    pub id: String,
    /// Entity type, e.g. `user`, `project`, `conversation`.
    #[serde(rename = "type")]
    pub entity_type: String,
}

impl RelatedEntity {
    /// Create a related-entity reference.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// A call to action rendered with the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    /// Button label.
    pub label: String,
    /// Target URL.
    pub url: String,
    /// Whether this is the primary action.
    #[serde(default)]
    pub is_primary: bool,
}

impl NotificationAction {
    /// The primary action.
    pub fn primary(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            is_primary: true,
        }
    }

    /// A secondary action.
    pub fn secondary(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            is_primary: false,
        }
    }
}

/// A time-bounded dispatch claim held by one scheduler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    /// Scheduler instance holding the claim.
    pub holder: String,
    /// When the claim lapses.
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    /// Whether the claim still holds at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
