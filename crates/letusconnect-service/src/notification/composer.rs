//! Turns domain events into notification documents.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use letusconnect_core::events::{
    ConnectionEvent, DirectEvent, DomainEvent, EventPayload, MessageEvent, ProjectEvent, UserEvent,
};
use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::Uid;
use letusconnect_entity::notification::{
    DeliveryChannel, Notification, NotificationAction, NotificationBuilder, NotificationCategory,
    NotificationPriority,
};

use crate::identity::IdentityResolver;

/// Builds one notification per event. Recipient fan-out happens at
/// dispatch time, so even a platform-wide broadcast is a single document.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    identity: Arc<dyn IdentityResolver>,
}

impl NotificationComposer {
    /// Create a composer resolving broadcast audiences through `identity`.
    pub fn new(identity: Arc<dyn IdentityResolver>) -> Self {
        Self { identity }
    }

    /// Compose the notification for `event`, stamped at `now`.
    pub async fn compose(&self, event: &DomainEvent, now: DateTime<Utc>) -> AppResult<Notification> {
        let builder = match &event.payload {
            EventPayload::Connection(e) => connection(e),
            EventPayload::User(e) => self.user(e).await?,
            EventPayload::Message(e) => message(e),
            EventPayload::Project(e) => project(e),
            EventPayload::Direct(e) => direct(e),
        };
        Ok(builder
            .meta("eventId", event.id.as_str())
            .include_actor(event.include_actor)
            .scheduled_at(event.deliver_at)
            .expires_at(event.expires_at)
            .build(now))
    }

    async fn user(&self, event: &UserEvent) -> AppResult<NotificationBuilder> {
        let UserEvent::Registered { uid, display_name } = event;
        let everyone = self.identity.list_uids().await?;
        Ok(
            NotificationBuilder::new(event.type_tag(), NotificationCategory::Community)
                .priority(NotificationPriority::Low)
                .title("New member")
                .content(format!("{display_name} just joined LetUsConnect"))
                .actor(uid.clone(), display_name.as_str())
                .targets(everyone)
                .related(uid.as_str(), "user")
                .action(NotificationAction::primary("Say hello", format!("/users/{uid}"))),
        )
    }
}

fn or_default(text: &str, fallback: impl FnOnce() -> String) -> String {
    if text.trim().is_empty() {
        fallback()
    } else {
        text.to_string()
    }
}

fn connection(event: &ConnectionEvent) -> NotificationBuilder {
    let builder = NotificationBuilder::new(event.type_tag(), NotificationCategory::Connection);
    match event {
        ConnectionEvent::RequestSent {
            from,
            from_name,
            to,
            message,
        } => builder
            .title("New connection request")
            .content(or_default(message, || {
                format!("{from_name} wants to connect with you")
            }))
            .actor(from.clone(), from_name.as_str())
            .targets([to.clone()])
            .meta("message", message.as_str())
            .related(from.as_str(), "user")
            .action(NotificationAction::primary(
                "Accept",
                format!("/connections/requests/{from}/accept"),
            ))
            .action(NotificationAction::secondary(
                "Decline",
                format!("/connections/requests/{from}/reject"),
            )),
        ConnectionEvent::RequestAccepted { from, to, to_name } => builder
            .title("Connection accepted")
            .content(format!("{to_name} accepted your connection request"))
            .actor(to.clone(), to_name.as_str())
            .targets([from.clone()])
            .related(to.as_str(), "user")
            .action(NotificationAction::primary("View profile", format!("/users/{to}"))),
        ConnectionEvent::RequestRejected { from, to, to_name } => builder
            .priority(NotificationPriority::Low)
            .title("Connection request declined")
            .content(format!("{to_name} declined your connection request"))
            .actor(to.clone(), to_name.as_str())
            .targets([from.clone()])
            .related(to.as_str(), "user"),
    }
}

fn message(event: &MessageEvent) -> NotificationBuilder {
    let MessageEvent::Posted {
        sender,
        sender_name,
        conversation_id,
        group_name,
        participants,
        text,
    } = event;
    let (title, kind) = match group_name {
        Some(group) => (format!("New message in {group}"), "group_chat"),
        None => (format!("New message from {sender_name}"), "direct_chat"),
    };
    NotificationBuilder::new("message", NotificationCategory::Message)
        .title(title)
        .content(or_default(text, || format!("{sender_name} sent you a message")))
        .actor(sender.clone(), sender_name.as_str())
        .targets(participants.iter().cloned())
        .related(conversation_id.as_str(), kind)
        .action(NotificationAction::primary(
            "Open conversation",
            format!("/messages/{conversation_id}"),
        ))
}

fn project(event: &ProjectEvent) -> NotificationBuilder {
    let builder = NotificationBuilder::new(event.type_tag(), NotificationCategory::Project);
    match event {
        ProjectEvent::JoinRequested {
            project_id,
            project_title,
            owner,
            requester,
            requester_name,
            message,
        } => builder
            .priority(NotificationPriority::High)
            .title("Project join request")
            .content(or_default(message, || {
                format!("{requester_name} wants to join {project_title}")
            }))
            .actor(requester.clone(), requester_name.as_str())
            .targets([owner.clone()])
            .meta("projectTitle", project_title.as_str())
            .related(project_id.as_str(), "project")
            .related(requester.as_str(), "user")
            .action(NotificationAction::primary(
                "Accept",
                format!("/projects/{project_id}/requests/{requester}/accept"),
            ))
            .action(NotificationAction::secondary(
                "Decline",
                format!("/projects/{project_id}/requests/{requester}/reject"),
            )),
        ProjectEvent::JoinAccepted {
            project_id,
            project_title,
            owner,
            owner_name,
            requester,
        } => builder
            .title("Join request accepted")
            .content(format!(
                "{owner_name} accepted your request to join {project_title}"
            ))
            .actor(owner.clone(), owner_name.as_str())
            .targets([requester.clone()])
            .meta("projectTitle", project_title.as_str())
            .related(project_id.as_str(), "project")
            .action(NotificationAction::primary(
                "Open project",
                format!("/projects/{project_id}"),
            )),
    }
}

fn direct(event: &DirectEvent) -> NotificationBuilder {
    let builder = NotificationBuilder::new(event.type_tag(), NotificationCategory::Direct);
    let owner = |uid: &Option<Uid>| uid.iter().cloned().collect::<Vec<_>>();
    match event {
        DirectEvent::Sms { uid, to, body } => builder
            .title("Text message")
            .content(or_default(body, || "You have a new update on LetUsConnect".to_string()))
            .targets(owner(uid))
            .channel(DeliveryChannel::Sms, Some(to.clone())),
        DirectEvent::Email {
            uid,
            to,
            subject,
            html_body,
        } => builder
            .title(or_default(subject, || "A message from LetUsConnect".to_string()))
            .content(html_body.as_str())
            .targets(owner(uid))
            .channel(DeliveryChannel::Email, Some(to.clone())),
    }
}
