//! Event dispatcher.

use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, error};

use letusconnect_core::config::DispatchMode;
use letusconnect_core::events::DomainEvent;
use letusconnect_core::result::AppResult;
use letusconnect_core::traits::Clock;
use letusconnect_entity::notification::Notification;
use letusconnect_store::NotificationRepository;

use crate::notification::NotificationComposer;

/// Composes and persists notifications for committed domain events.
///
/// Failures are logged with the event id as correlation id and never
/// reach the operation that emitted the event.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    composer: Arc<NotificationComposer>,
    repo: Arc<NotificationRepository>,
    clock: Arc<dyn Clock>,
    mode: DispatchMode,
    tracker: TaskTracker,
}

impl EventDispatcher {
    /// Creates a dispatcher running in `mode`.
    pub fn new(
        composer: Arc<NotificationComposer>,
        repo: Arc<NotificationRepository>,
        clock: Arc<dyn Clock>,
        mode: DispatchMode,
    ) -> Self {
        Self {
            composer,
            repo,
            clock,
            mode,
            tracker: TaskTracker::new(),
        }
    }

    /// Hands `event` off for composition.
    ///
    /// In [`DispatchMode::Inline`] the notification is stored before this
    /// returns; otherwise the work runs on a tracked background task.
    pub async fn dispatch(&self, event: DomainEvent) {
        match self.mode {
            DispatchMode::Inline => self.run(event).await,
            DispatchMode::Background => {
                let this = self.clone();
                self.tracker.spawn(async move { this.run(event).await });
            }
        }
    }

    async fn run(&self, event: DomainEvent) {
        match self.persist(&event).await {
            Ok(notification) => debug!(
                correlation_id = %event.id,
                notification_id = %notification.id,
                notification_type = %notification.notification_type,
                recipients = notification.targeted_users.len(),
                "Queued notification"
            ),
            Err(e) => error!(
                correlation_id = %event.id,
                event_type = event.type_tag(),
                error = %e,
                "Failed to queue notification"
            ),
        }
    }

    async fn persist(&self, event: &DomainEvent) -> AppResult<Notification> {
        let notification = self.composer.compose(event, self.clock.now()).await?;
        self.repo.create(&notification).await?;
        Ok(notification)
    }

    /// Number of background compositions still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting background work and waits for what is in flight.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use letusconnect_core::config::StoreConfig;
    use letusconnect_core::events::{ConnectionEvent, EventPayload};
    use letusconnect_core::traits::SystemClock;
    use letusconnect_core::types::filter::FilterField;
    use letusconnect_core::types::id::Uid;
    use letusconnect_store::{MemoryDocumentStore, StoreHandle};

    use super::*;
    use crate::identity::{IdentityResolver, StaticIdentityDirectory};

    fn dispatcher(mode: DispatchMode) -> (EventDispatcher, Arc<NotificationRepository>) {
        let store = StoreHandle::new(Arc::new(MemoryDocumentStore::new()), &StoreConfig::default());
        let repo = Arc::new(NotificationRepository::new(store));
        let identity: Arc<dyn IdentityResolver> = Arc::new(StaticIdentityDirectory::new());
        let composer = Arc::new(NotificationComposer::new(identity));
        let dispatcher = EventDispatcher::new(composer, repo.clone(), Arc::new(SystemClock), mode);
        (dispatcher, repo)
    }

    fn accepted() -> DomainEvent {
        DomainEvent::new(
            Some(Uid::from("u2")),
            chrono::Utc::now(),
            EventPayload::Connection(ConnectionEvent::RequestAccepted {
                from: Uid::from("u1"),
                to: Uid::from("u2"),
                to_name: "Bo".into(),
            }),
        )
    }

    async fn stored_for(repo: &NotificationRepository, uid: &str) -> u64 {
        repo.count(&[FilterField::array_contains("targetedUsers", uid)])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_inline_dispatch_stores_before_returning() {
        let (dispatcher, repo) = dispatcher(DispatchMode::Inline);
        dispatcher.dispatch(accepted()).await;
        assert_eq!(stored_for(&repo, "u1").await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_background_work() {
        let (dispatcher, repo) = dispatcher(DispatchMode::Background);
        dispatcher.dispatch(accepted()).await;
        dispatcher.dispatch(accepted()).await;
        dispatcher.shutdown().await;
        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(stored_for(&repo, "u1").await, 2);
    }
}
