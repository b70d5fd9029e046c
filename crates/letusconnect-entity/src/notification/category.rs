//! Notification classification enumerations.

use serde::{Deserialize, Serialize};

/// Category of a notification for filtering and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Connection requests and acceptances.
    Connection,
    /// Direct and group messages.
    Message,
    /// Project collaboration.
    Project,
    /// Community announcements such as new members.
    Community,
    /// Direct SMS and email sends.
    Direct,
    /// System-level notifications.
    System,
}

impl NotificationCategory {
    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Message => "message",
            Self::Project => "project",
            Self::Community => "community",
            Self::Direct => "direct",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification priority levels.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Background information.
    Low,
    /// Standard events.
    #[default]
    Normal,
    /// Important events.
    High,
}

impl NotificationPriority {
    /// Return the priority as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// Channel a notification is delivered through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    /// Pub/sub push to connected clients.
    #[default]
    Push,
    /// Email relay.
    Email,
    /// SMS relay.
    Sms,
}

impl DeliveryChannel {
    /// Return the channel as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl std::fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who caused a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    /// A platform user.
    User,
    /// The platform itself.
    #[default]
    System,
}
