//! Domain events emitted by LetUsConnect operations.
//!
//! Events are produced after a state change commits and consumed by the
//! notification composer. They carry ids plus the display names resolved
//! at emission time, so composition needs no further profile lookups.

pub mod connection;
pub mod direct;
pub mod message;
pub mod project;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{EventId, Uid};

pub use connection::ConnectionEvent;
pub use direct::DirectEvent;
pub use message::MessageEvent;
pub use project::ProjectEvent;
pub use user::UserEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID, also the correlation id for logs.
    pub id: EventId,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who caused the event (if applicable).
    pub actor_id: Option<Uid>,
    /// Whether the actor asked to be among the recipients.
    #[serde(default)]
    pub include_actor: bool,
    /// Deliver no earlier than this instant; immediately when `None`.
    #[serde(default)]
    pub deliver_at: Option<DateTime<Utc>>,
    /// Drop the resulting notification if it is still undelivered at this instant.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A connection-graph event.
    Connection(ConnectionEvent),
    /// A user-lifecycle event.
    User(UserEvent),
    /// A messaging event.
    Message(MessageEvent),
    /// A project-collaboration event.
    Project(ProjectEvent),
    /// A direct SMS or email send.
    Direct(DirectEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<Uid>, timestamp: DateTime<Utc>, payload: EventPayload) -> Self {
        Self {
            id: EventId::generate(),
            timestamp,
            actor_id,
            include_actor: false,
            deliver_at: None,
            expires_at: None,
            payload,
        }
    }

    /// Ask for the actor to be included among the recipients.
    pub fn with_actor_included(mut self) -> Self {
        self.include_actor = true;
        self
    }

    /// Schedule delivery for a later instant.
    pub fn deliver_at(mut self, at: DateTime<Utc>) -> Self {
        self.deliver_at = Some(at);
        self
    }

    /// Give the resulting notification an expiry.
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// The notification type tag this event produces.
    pub fn type_tag(&self) -> &'static str {
        match &self.payload {
            EventPayload::Connection(e) => e.type_tag(),
            EventPayload::User(e) => e.type_tag(),
            EventPayload::Message(_) => "message",
            EventPayload::Project(e) => e.type_tag(),
            EventPayload::Direct(e) => e.type_tag(),
        }
    }
}
