//! Shared test helpers for integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use letusconnect_core::config::{
    ConnectionsConfig, DispatchMode, NotificationsConfig, SchedulerConfig, StoreConfig,
};
use letusconnect_core::traits::{Clock, ManualClock};
use letusconnect_core::types::filter::FilterField;
use letusconnect_core::types::id::{NotificationId, Uid};
use letusconnect_delivery::{DeliveryAdapter, DeliveryError, DeliveryRegistry, OutboundMessage};
use letusconnect_entity::notification::{DeliveryChannel, Notification, NotificationBuilder, NotificationCategory};
use letusconnect_entity::user::UserProfile;
use letusconnect_service::{
    ConnectionGraphService, EventDispatcher, IdentityResolver, NotificationComposer,
    NotificationService, StaticIdentityDirectory,
};
use letusconnect_store::{
    ConnectionRepository, MemoryDocumentStore, NotificationRepository, StoreHandle,
};
use letusconnect_worker::NotificationScheduler;

/// SMS adapter that replays scripted results, then succeeds.
#[derive(Debug, Default)]
pub struct ScriptedSms {
    script: Mutex<VecDeque<DeliveryError>>,
    calls: Mutex<Vec<OutboundMessage>>,
}

impl ScriptedSms {
    /// Fail the next calls with `errors`, in order.
    pub fn fail_with(&self, errors: impl IntoIterator<Item = DeliveryError>) {
        self.script.lock().unwrap().extend(errors);
    }

    /// Every message the adapter was asked to deliver.
    pub fn calls(&self) -> Vec<OutboundMessage> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryAdapter for ScriptedSms {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Sms
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        self.calls.lock().unwrap().push(message.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Test application context
pub struct TestApp {
    /// Connection graph under test
    pub connections: ConnectionGraphService,
    /// Reader API under test
    pub notifications: NotificationService,
    /// Direct access to connection documents
    pub connection_repo: Arc<ConnectionRepository>,
    /// Direct access to notification documents
    pub notification_repo: Arc<NotificationRepository>,
    /// Scheduler wired to the scripted SMS adapter
    pub scheduler: NotificationScheduler,
    /// The only clock every component reads
    pub clock: Arc<ManualClock>,
    /// Scripted SMS adapter
    pub sms: Arc<ScriptedSms>,
}

impl TestApp {
    /// Create a new test application with users u1, u2 and u3.
    pub async fn new() -> Self {
        let store = StoreHandle::new(Arc::new(MemoryDocumentStore::new()), &StoreConfig::default());
        let connection_repo = Arc::new(ConnectionRepository::new(store.clone()));
        let notification_repo = Arc::new(NotificationRepository::new(store));
        let clock = Arc::new(ManualClock::new(t0()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let identity: Arc<dyn IdentityResolver> = Arc::new(StaticIdentityDirectory::from_profiles(
            [("u1", "Ana"), ("u2", "Bo"), ("u3", "Cy")].map(|(uid, name)| UserProfile {
                uid: Uid::from(uid),
                username: uid.to_string(),
                email: Some(format!("{uid}@example.com")),
                display_name: Some(name.to_string()),
                phone: Some("+15550000001".to_string()),
            }),
        ));

        let dispatcher = Arc::new(EventDispatcher::new(
            Arc::new(NotificationComposer::new(identity.clone())),
            notification_repo.clone(),
            dyn_clock.clone(),
            DispatchMode::Inline,
        ));
        let connections = ConnectionGraphService::new(
            connection_repo.clone(),
            identity.clone(),
            dispatcher,
            dyn_clock.clone(),
            ConnectionsConfig::default(),
        );
        let notifications = NotificationService::new(
            notification_repo.clone(),
            dyn_clock.clone(),
            NotificationsConfig::default(),
        );

        let sms = Arc::new(ScriptedSms::default());
        let registry = Arc::new(DeliveryRegistry::new().with(sms.clone()));
        let scheduler = NotificationScheduler::new(
            notification_repo.clone(),
            registry,
            identity,
            dyn_clock,
            SchedulerConfig {
                worker_id: Some("it-worker".to_string()),
                ..SchedulerConfig::default()
            },
        );

        Self {
            connections,
            notifications,
            connection_repo,
            notification_repo,
            scheduler,
            clock,
            sms,
        }
    }

    /// Move the shared clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }

    /// Notifications addressed to `uid` with type `notification_type`.
    pub async fn notifications_of(&self, uid: &str, notification_type: &str) -> Vec<Notification> {
        self.notification_repo
            .all_for_user(&Uid::from(uid), &[FilterField::eq("type", notification_type)])
            .await
            .unwrap()
    }

    /// Store an SMS to `+15550000001` scheduled `offset_seconds` from now.
    pub async fn queue_sms(&self, offset_seconds: i64) -> NotificationId {
        let now = self.clock.now();
        let n = NotificationBuilder::new("sms", NotificationCategory::Direct)
            .content("hello")
            .channel(DeliveryChannel::Sms, Some("+15550000001".to_string()))
            .scheduled_at(Some(now + Duration::seconds(offset_seconds)))
            .build(now);
        self.notification_repo.create(&n).await.unwrap();
        n.id
    }

    /// Store a notification targeting `targets`.
    pub async fn seed_for(&self, targets: &[&str]) -> NotificationId {
        self.advance(1);
        let n = NotificationBuilder::new("message", NotificationCategory::Message)
            .title("New message")
            .targets(targets.iter().map(|t| Uid::from(*t)))
            .build(self.clock.now());
        self.notification_repo.create(&n).await.unwrap();
        n.id
    }
}

/// Fixed start instant for every test.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Shorthand for a uid.
pub fn uid(value: &str) -> Uid {
    Uid::from(value)
}
