//! Fluent construction of new notifications.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use letusconnect_core::types::id::{NotificationId, Uid};

use super::category::{ActorType, DeliveryChannel, NotificationCategory, NotificationPriority};
use super::model::Notification;
use super::parts::{NotificationAction, RelatedEntity};
use super::status::NotificationStatus;

/// Builds a `pending` [`Notification`] with consistent recipient maps.
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    notification_type: String,
    category: NotificationCategory,
    priority: NotificationPriority,
    title: String,
    content: String,
    actor_id: Option<Uid>,
    actor_name: Option<String>,
    include_actor: bool,
    targets: Vec<Uid>,
    metadata: serde_json::Map<String, serde_json::Value>,
    related_entities: Vec<RelatedEntity>,
    actions: Vec<NotificationAction>,
    delivery_channel: DeliveryChannel,
    recipient: Option<String>,
    scheduled_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl NotificationBuilder {
    /// Start a notification of the given type and category.
    pub fn new(notification_type: impl Into<String>, category: NotificationCategory) -> Self {
        Self {
            notification_type: notification_type.into(),
            category,
            priority: NotificationPriority::Normal,
            title: String::new(),
            content: String::new(),
            actor_id: None,
            actor_name: None,
            include_actor: false,
            targets: Vec::new(),
            metadata: serde_json::Map::new(),
            related_entities: Vec::new(),
            actions: Vec::new(),
            delivery_channel: DeliveryChannel::Push,
            recipient: None,
            scheduled_at: None,
            expires_at: None,
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the body text.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the acting user.
    pub fn actor(mut self, uid: Uid, name: impl Into<String>) -> Self {
        self.actor_id = Some(uid);
        self.actor_name = Some(name.into());
        self
    }

    /// Keep the actor among the recipients (marked read) instead of removing it.
    pub fn include_actor(mut self, include: bool) -> Self {
        self.include_actor = include;
        self
    }

    /// Add recipients. Duplicates are dropped at build time.
    pub fn targets(mut self, uids: impl IntoIterator<Item = Uid>) -> Self {
        self.targets.extend(uids);
        self
    }

    /// Insert a metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add a related entity.
    pub fn related(mut self, id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.related_entities.push(RelatedEntity::new(id, entity_type));
        self
    }

    /// Add a call to action.
    pub fn action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Deliver through `channel`, optionally to an explicit address.
    pub fn channel(mut self, channel: DeliveryChannel, recipient: Option<String>) -> Self {
        self.delivery_channel = channel;
        self.recipient = recipient;
        self
    }

    /// Earliest dispatch instant; defaults to the build time.
    pub fn scheduled_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.scheduled_at = at;
        self
    }

    /// Expiry instant.
    pub fn expires_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = at;
        self
    }

    /// Recipients after de-duplication and actor handling, in input order.
    pub fn resolved_targets(&self) -> Vec<Uid> {
        let mut seen = BTreeSet::new();
        self.targets
            .iter()
            .filter(|uid| self.include_actor || self.actor_id.as_ref() != Some(*uid))
            .filter(|uid| seen.insert((*uid).clone()))
            .cloned()
            .collect()
    }

    /// Finish the notification.
    pub fn build(self, now: DateTime<Utc>) -> Notification {
        let targeted_users = self.resolved_targets();
        let read_status: BTreeMap<Uid, bool> = targeted_users
            .iter()
            .map(|uid| {
                let is_actor = self.actor_id.as_ref() == Some(uid);
                (uid.clone(), is_actor)
            })
            .collect();
        let user_id = match targeted_users.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        let actor_type = if self.actor_id.is_some() {
            ActorType::User
        } else {
            ActorType::System
        };

        Notification {
            id: NotificationId::generate(),
            user_id,
            actor_id: self.actor_id,
            actor_name: self.actor_name,
            actor_type,
            notification_type: self.notification_type,
            category: self.category,
            priority: self.priority,
            status: NotificationStatus::Pending,
            title: self.title,
            content: self.content,
            metadata: self.metadata,
            related_entities: self.related_entities,
            actions: self.actions,
            targeted_users,
            read_status,
            is_archived: BTreeMap::new(),
            delivery_channel: self.delivery_channel,
            recipient: self.recipient,
            scheduled_at: Some(self.scheduled_at.unwrap_or(now)),
            sent_at: None,
            read_at: None,
            expires_at: self.expires_at,
            attempts: 0,
            lease: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uids(ids: &[&str]) -> Vec<Uid> {
        ids.iter().map(|s| Uid::from(*s)).collect()
    }

    #[test]
    fn test_targets_deduplicated_and_read_status_consistent() {
        let n = NotificationBuilder::new("message", NotificationCategory::Message)
            .targets(uids(&["b", "c", "b"]))
            .build(Utc::now());
        assert_eq!(n.targeted_users, uids(&["b", "c"]));
        assert_eq!(n.read_status.len(), 2);
        assert!(n.read_status.values().all(|read| !read));
        assert!(n.user_id.is_none());
    }

    #[test]
    fn test_actor_excluded_by_default() {
        let n = NotificationBuilder::new("message", NotificationCategory::Message)
            .actor(Uid::from("a"), "Alice")
            .targets(uids(&["a", "b"]))
            .build(Utc::now());
        assert_eq!(n.targeted_users, uids(&["b"]));
        assert_eq!(n.user_id, Some(Uid::from("b")));
        assert_eq!(n.actor_type, ActorType::User);
    }

    #[test]
    fn test_included_actor_starts_read() {
        let n = NotificationBuilder::new("message", NotificationCategory::Message)
            .actor(Uid::from("a"), "Alice")
            .include_actor(true)
            .targets(uids(&["a", "b"]))
            .build(Utc::now());
        assert_eq!(n.read_status.get(&Uid::from("a")), Some(&true));
        assert_eq!(n.read_status.get(&Uid::from("b")), Some(&false));
    }

    #[test]
    fn test_scheduled_at_defaults_to_now() {
        let now = Utc::now();
        let n = NotificationBuilder::new("new_user", NotificationCategory::Community).build(now);
        assert_eq!(n.scheduled_at, Some(now));
        assert_eq!(n.status, NotificationStatus::Pending);
        assert_eq!(n.actor_type, ActorType::System);
    }
}
