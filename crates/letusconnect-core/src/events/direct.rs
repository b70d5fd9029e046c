//! Direct SMS and email sends.

use serde::{Deserialize, Serialize};

use crate::types::id::Uid;

/// A message addressed to an explicit phone number or email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DirectEvent {
    /// Send an SMS.
    Sms {
        /// Owning user, if the number belongs to a known account.
        uid: Option<Uid>,
        /// Destination phone number.
        to: String,
        /// Message body.
        body: String,
    },
    /// Send an email.
    Email {
        /// Owning user, if the address belongs to a known account.
        uid: Option<Uid>,
        /// Destination address.
        to: String,
        /// Subject line.
        subject: String,
        /// HTML body.
        html_body: String,
    },
}

impl DirectEvent {
    /// Notification type tag for the event.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Sms { .. } => "sms",
            Self::Email { .. } => "email",
        }
    }
}
