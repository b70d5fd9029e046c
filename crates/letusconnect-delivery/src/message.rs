//! Per-recipient payloads handed to delivery adapters.

use serde::Serialize;
use serde_json::{Value, json};

use letusconnect_core::types::id::NotificationId;
use letusconnect_entity::notification::{DeliveryChannel, Notification};

/// One delivery of a notification to one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Source notification; recipients use it as the dedup key.
    pub notification_id: NotificationId,
    /// Channel the adapter serves.
    pub channel: DeliveryChannel,
    /// Phone number, email address, or pub/sub channel name.
    pub recipient: String,
    /// Notification type tag, used as the push event name.
    pub event: String,
    /// Email subject / push title.
    pub subject: String,
    /// SMS text / email HTML / push body.
    pub body: String,
    /// Structured payload for push clients.
    pub payload: Value,
}

impl OutboundMessage {
    /// Build the message delivering `notification` to `recipient`.
    pub fn for_recipient(notification: &Notification, recipient: impl Into<String>) -> Self {
        Self {
            notification_id: notification.id.clone(),
            channel: notification.delivery_channel,
            recipient: recipient.into(),
            event: notification.notification_type.clone(),
            subject: notification.title.clone(),
            body: notification.content.clone(),
            payload: json!({
                "id": notification.id,
                "type": notification.notification_type,
                "category": notification.category,
                "priority": notification.priority,
                "title": notification.title,
                "content": notification.content,
                "actorId": notification.actor_id,
                "actorName": notification.actor_name,
                "relatedEntities": notification.related_entities,
                "actions": notification.actions,
                "metadata": notification.metadata,
                "createdAt": notification.created_at,
            }),
        }
    }
}

/// Pub/sub channel carrying pushes for one user.
pub fn user_channel(uid: &str) -> String {
    format!("user:{uid}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use letusconnect_core::types::id::Uid;
    use letusconnect_entity::notification::{NotificationBuilder, NotificationCategory};

    #[test]
    fn test_payload_carries_notification_fields() {
        let n = NotificationBuilder::new("connection_request", NotificationCategory::Connection)
            .title("New connection request")
            .content("Ana wants to connect")
            .actor(Uid::from("u1"), "Ana")
            .targets([Uid::from("u2")])
            .build(Utc::now());
        let msg = OutboundMessage::for_recipient(&n, user_channel("u2"));

        assert_eq!(msg.recipient, "user:u2");
        assert_eq!(msg.event, "connection_request");
        assert_eq!(msg.payload["id"], n.id.as_str());
        assert_eq!(msg.payload["actorName"], "Ana");
        assert_eq!(msg.payload["category"], "connection");
    }
}
