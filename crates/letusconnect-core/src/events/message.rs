//! Messaging domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::Uid;

/// Events related to direct and group messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageEvent {
    /// A message was posted to a conversation.
    Posted {
        /// The sender.
        sender: Uid,
        /// The sender's display name.
        sender_name: String,
        /// Direct chat or group chat id.
        conversation_id: String,
        /// Group name; `None` for direct chats.
        group_name: Option<String>,
        /// All participants, sender included.
        participants: Vec<Uid>,
        /// Message text.
        text: String,
    },
}
