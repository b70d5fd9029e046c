//! Notification scheduler: the periodic tick that drains the outbox.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time;
use uuid::Uuid;

use letusconnect_core::ErrorKind;
use letusconnect_core::config::SchedulerConfig;
use letusconnect_core::result::AppResult;
use letusconnect_core::traits::Clock;
use letusconnect_core::types::id::NotificationId;
use letusconnect_delivery::DeliveryRegistry;
use letusconnect_entity::notification::{Lease, Notification, NotificationStatus};
use letusconnect_service::IdentityResolver;
use letusconnect_store::NotificationRepository;

use crate::fanout::{self, FanoutOutcome};
use crate::lease::{LeaseKeeper, saturating_after};
use crate::report::TickReport;

/// Where one notification ended up after this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Sent,
    Retried,
    Failed,
    Cancelled,
    Skipped,
}

/// Polls for due notifications and delivers them.
///
/// Several instances may run against the same store: each notification is
/// claimed with a lease by conditional update and only the holder
/// dispatches it. A lease that lapsed may be claimed again.
#[derive(Debug)]
pub struct NotificationScheduler {
    /// Notification repository
    repo: Arc<NotificationRepository>,
    /// Adapters per delivery channel
    registry: Arc<DeliveryRegistry>,
    /// Address lookups for fan-out
    identity: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    /// Scheduler configuration
    config: SchedulerConfig,
    /// Lease holder name of this instance
    worker_id: String,
}

impl NotificationScheduler {
    /// Create a new scheduler. Without a configured `worker_id` a random one is used.
    pub fn new(
        repo: Arc<NotificationRepository>,
        registry: Arc<DeliveryRegistry>,
        identity: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        let worker_id = config
            .worker_id
            .clone()
            .unwrap_or_else(|| format!("scheduler-{}", Uuid::new_v4()));
        Self {
            repo,
            registry,
            identity,
            clock,
            config,
            worker_id,
        }
    }

    /// Lease holder name of this instance.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Run ticks until the cancel signal flips to `true` or its sender is dropped.
    ///
    /// A tick that already started always runs to completion.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        if !self.config.enabled {
            tracing::info!(worker_id = %self.worker_id, "Notification scheduler disabled");
            return;
        }
        tracing::info!(
            worker_id = %self.worker_id,
            tick_interval_seconds = self.config.tick_interval_seconds,
            batch_size = self.config.batch_size,
            "Notification scheduler started"
        );

        let interval = self.config.tick_interval();
        loop {
            if *cancel.borrow() {
                break;
            }
            self.tick_logged().await;

            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(interval) => {}
            }
        }

        tracing::info!(worker_id = %self.worker_id, "Notification scheduler stopped");
    }

    async fn tick_logged(&self) {
        match self.tick().await {
            Ok(report) if report.is_idle() => {
                tracing::debug!(worker_id = %self.worker_id, "Scheduler tick found nothing due");
            }
            Ok(report) => tracing::info!(
                worker_id = %self.worker_id,
                due = report.due,
                claimed = report.claimed,
                sent = report.sent,
                retried = report.retried,
                failed = report.failed,
                cancelled = report.cancelled,
                skipped = report.skipped,
                "Scheduler tick finished"
            ),
            Err(e) => tracing::error!(worker_id = %self.worker_id, error = %e, "Scheduler tick failed"),
        }
    }

    /// Process every notification that is due now, plus those stuck in
    /// `sending` whose lease lapsed. Notifications are handled one at a time.
    pub async fn tick(&self) -> AppResult<TickReport> {
        let now = self.clock.now();
        let limit = self.config.batch_size as usize;

        let mut batch = self.repo.find_due(now, limit).await?;
        batch.extend(self.repo.find_lapsed_leases(now, limit).await?);
        let mut seen = HashSet::new();
        batch.retain(|n| seen.insert(n.id.clone()));

        let mut report = TickReport {
            due: batch.len(),
            ..TickReport::default()
        };
        for notification in batch {
            let settled = self.process(&notification.id).await;
            if settled != Settled::Skipped {
                report.claimed += 1;
            }
            match settled {
                Settled::Sent => report.sent += 1,
                Settled::Retried => report.retried += 1,
                Settled::Failed => report.failed += 1,
                Settled::Cancelled => report.cancelled += 1,
                Settled::Skipped => report.skipped += 1,
            }
        }
        Ok(report)
    }

    async fn process(&self, id: &NotificationId) -> Settled {
        let claimed = match self.acquire_lease(id).await {
            Ok(Some(notification)) => notification,
            Ok(None) => return Settled::Skipped,
            Err(e) => {
                tracing::warn!(notification_id = %id, error = %e, "Could not lease notification");
                return Settled::Skipped;
            }
        };

        let now = self.clock.now();
        if claimed.is_expired(now) {
            return self
                .settle(id, "scheduler.expire", Settled::Cancelled, |n| {
                    n.transition(NotificationStatus::Cancelled, now)
                })
                .await;
        }

        let keeper = LeaseKeeper::new(
            &self.repo,
            id,
            &self.worker_id,
            self.clock.as_ref(),
            self.config.lease(),
        );
        let summary = fanout::deliver(
            &claimed,
            &self.registry,
            self.identity.as_ref(),
            Some(&keeper),
            self.config.dispatch_timeout(),
        )
        .await;
        let outcome = summary.outcome();
        let now = self.clock.now();
        tracing::debug!(
            notification_id = %id,
            attempt = claimed.attempts + 1,
            delivered = summary.delivered,
            skipped = summary.skipped,
            outcome = ?outcome,
            "Dispatched notification"
        );

        match outcome {
            FanoutOutcome::Delivered => {
                self.settle(id, "scheduler.sent", Settled::Sent, |n| {
                    n.attempts += 1;
                    n.last_error = None;
                    n.transition(NotificationStatus::Sent, now)
                })
                .await
            }
            FanoutOutcome::Retry(reason) => {
                let exhausted = claimed.attempts + 1 >= self.config.max_attempts;
                let (op, settled) = if exhausted {
                    ("scheduler.exhausted", Settled::Failed)
                } else {
                    ("scheduler.retry", Settled::Retried)
                };
                tracing::warn!(
                    notification_id = %id,
                    attempt = claimed.attempts + 1,
                    max_attempts = self.config.max_attempts,
                    exhausted,
                    error = %reason,
                    "Delivery failed, retryable"
                );
                let backoff = self.config.retry_backoff(claimed.attempts + 1);
                self.settle(id, op, settled, |n| {
                    n.attempts += 1;
                    n.last_error = Some(reason.clone());
                    if exhausted {
                        return n.transition(NotificationStatus::Failed, now);
                    }
                    n.transition(NotificationStatus::Pending, now)?;
                    n.scheduled_at = Some(saturating_after(now, backoff));
                    Ok(())
                })
                .await
            }
            FanoutOutcome::Failed(reason) => {
                tracing::error!(
                    notification_id = %id,
                    attempt = claimed.attempts + 1,
                    error = %reason,
                    "Delivery failed permanently"
                );
                self.settle(id, "scheduler.failed", Settled::Failed, |n| {
                    n.attempts += 1;
                    n.last_error = Some(reason.clone());
                    n.transition(NotificationStatus::Failed, now)
                })
                .await
            }
        }
    }

    /// Claim `id` for this instance: `pending` and due, or `sending` with a
    /// lapsed lease, becomes `sending` with a fresh lease. `None` when the
    /// notification is no longer claimable.
    async fn acquire_lease(&self, id: &NotificationId) -> AppResult<Option<Notification>> {
        let now = self.clock.now();
        let lease = Lease {
            holder: self.worker_id.clone(),
            expires_at: saturating_after(now, self.config.lease()),
        };
        let result = self
            .repo
            .update("scheduler.acquire_lease", id, |n| {
                let reclaim = n.status == NotificationStatus::Sending && !n.is_leased(now);
                if !n.is_due(now) && !reclaim {
                    return Ok(None);
                }
                if !reclaim {
                    n.transition(NotificationStatus::Sending, now)?;
                }
                n.lease = Some(lease.clone());
                n.updated_at = now;
                Ok(Some(n.clone()))
            })
            .await;
        match result {
            Err(e) if matches!(e.kind, ErrorKind::NotFound | ErrorKind::Conflict) => Ok(None),
            other => other,
        }
    }

    /// Apply the final transition, but only while this instance still holds the lease.
    async fn settle<F>(&self, id: &NotificationId, operation: &str, settled: Settled, apply: F) -> Settled
    where
        F: Fn(&mut Notification) -> AppResult<()> + Send + Sync,
    {
        let holder = self.worker_id.as_str();
        let result = self
            .repo
            .update(operation, id, |n| {
                let ours = n.status == NotificationStatus::Sending
                    && n.lease.as_ref().is_some_and(|l| l.holder == holder);
                if !ours {
                    return Ok(false);
                }
                apply(n)?;
                Ok(true)
            })
            .await;
        match result {
            Ok(true) => settled,
            Ok(false) => {
                tracing::warn!(notification_id = %id, "Lease lost before settling notification");
                Settled::Skipped
            }
            Err(e) => {
                tracing::error!(notification_id = %id, error = %e, "Failed to settle notification");
                Settled::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;

    use letusconnect_core::config::StoreConfig;
    use letusconnect_core::traits::ManualClock;
    use letusconnect_core::types::id::Uid;
    use letusconnect_delivery::{DeliveryAdapter, DeliveryError, OutboundMessage};
    use letusconnect_entity::notification::{
        DeliveryChannel, NotificationBuilder, NotificationCategory,
    };
    use letusconnect_service::StaticIdentityDirectory;
    use letusconnect_store::{MemoryDocumentStore, StoreHandle};

    use super::*;

    /// Replays scripted results, then succeeds.
    #[derive(Debug, Default)]
    struct ScriptedSms {
        script: Mutex<VecDeque<Result<(), DeliveryError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSms {
        fn failing(results: impl IntoIterator<Item = DeliveryError>) -> Self {
            Self {
                script: Mutex::new(results.into_iter().map(Err).collect()),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DeliveryAdapter for ScriptedSms {
        fn channel(&self) -> DeliveryChannel {
            DeliveryChannel::Sms
        }

        async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
            self.calls.lock().unwrap().push(message.recipient.clone());
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    struct Fixture {
        scheduler: NotificationScheduler,
        repo: Arc<NotificationRepository>,
        clock: Arc<ManualClock>,
        sms: Arc<ScriptedSms>,
    }

    fn fixture(sms: ScriptedSms, config: SchedulerConfig) -> Fixture {
        let store = StoreHandle::new(Arc::new(MemoryDocumentStore::new()), &StoreConfig::default());
        let repo = Arc::new(NotificationRepository::new(store));
        let clock = Arc::new(ManualClock::default());
        let sms = Arc::new(sms);
        let registry = Arc::new(DeliveryRegistry::new().with(sms.clone()));
        let scheduler = NotificationScheduler::new(
            repo.clone(),
            registry,
            Arc::new(StaticIdentityDirectory::new()),
            clock.clone(),
            SchedulerConfig {
                worker_id: Some("w1".into()),
                ..config
            },
        );
        Fixture {
            scheduler,
            repo,
            clock,
            sms,
        }
    }

    impl Fixture {
        async fn queue_sms(&self, scheduled_in: Duration) -> NotificationId {
            let now = self.clock.now();
            let n = NotificationBuilder::new("sms", NotificationCategory::Direct)
                .content("hello")
                .channel(DeliveryChannel::Sms, Some("+15550000001".into()))
                .scheduled_at(Some(now + scheduled_in))
                .build(now);
            self.repo.create(&n).await.unwrap();
            n.id
        }

        async fn get(&self, id: &NotificationId) -> Notification {
            self.repo.get(id).await.unwrap()
        }
    }

    #[tokio::test]
    async fn test_due_notification_is_sent_once() {
        let f = fixture(ScriptedSms::default(), SchedulerConfig::default());
        let id = f.queue_sms(Duration::seconds(-1)).await;

        let report = f.scheduler.tick().await.unwrap();
        assert_eq!(report.sent, 1);
        let n = f.get(&id).await;
        assert_eq!(n.status, NotificationStatus::Sent);
        assert_eq!(n.sent_at, Some(f.clock.now()));
        assert_eq!(n.attempts, 1);
        assert!(n.lease.is_none());

        assert!(f.scheduler.tick().await.unwrap().is_idle());
        assert_eq!(f.sms.calls(), 1);
    }

    #[tokio::test]
    async fn test_future_notification_waits() {
        let f = fixture(ScriptedSms::default(), SchedulerConfig::default());
        let id = f.queue_sms(Duration::minutes(10)).await;

        assert!(f.scheduler.tick().await.unwrap().is_idle());
        assert_eq!(f.get(&id).await.status, NotificationStatus::Pending);

        f.clock.advance(Duration::minutes(10));
        assert_eq!(f.scheduler.tick().await.unwrap().sent, 1);
    }

    #[tokio::test]
    async fn test_retryable_failures_exhaust_into_failed() {
        let sms = ScriptedSms::failing((0..3).map(|_| DeliveryError::Retryable("503".into())));
        let f = fixture(sms, SchedulerConfig::default());
        let id = f.queue_sms(Duration::zero()).await;

        for attempt in 1..=2 {
            assert_eq!(f.scheduler.tick().await.unwrap().retried, 1);
            let n = f.get(&id).await;
            assert_eq!(n.status, NotificationStatus::Pending);
            assert_eq!(n.attempts, attempt);
            assert_eq!(n.last_error.as_deref(), Some("503"));
        }
        assert_eq!(f.scheduler.tick().await.unwrap().failed, 1);
        assert_eq!(f.get(&id).await.status, NotificationStatus::Failed);
        assert_eq!(f.get(&id).await.attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_backoff_moves_schedule() {
        let sms = ScriptedSms::failing([DeliveryError::Retryable("timeout".into())]);
        let f = fixture(
            sms,
            SchedulerConfig {
                retry_backoff_seconds: 30,
                ..SchedulerConfig::default()
            },
        );
        let id = f.queue_sms(Duration::zero()).await;

        f.scheduler.tick().await.unwrap();
        assert_eq!(f.get(&id).await.scheduled_at, Some(f.clock.now() + Duration::seconds(30)));
        assert!(f.scheduler.tick().await.unwrap().is_idle());

        f.clock.advance(Duration::seconds(30));
        assert_eq!(f.scheduler.tick().await.unwrap().sent, 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_fails_immediately() {
        let sms = ScriptedSms::failing([DeliveryError::Permanent("invalid number".into())]);
        let f = fixture(sms, SchedulerConfig::default());
        let id = f.queue_sms(Duration::zero()).await;

        assert_eq!(f.scheduler.tick().await.unwrap().failed, 1);
        let n = f.get(&id).await;
        assert_eq!(n.status, NotificationStatus::Failed);
        assert_eq!(n.last_error.as_deref(), Some("invalid number"));
        assert!(n.sent_at.is_none());
    }

    #[tokio::test]
    async fn test_expired_notification_is_cancelled_without_dispatch() {
        let f = fixture(ScriptedSms::default(), SchedulerConfig::default());
        let now = f.clock.now();
        let n = NotificationBuilder::new("sms", NotificationCategory::Direct)
            .channel(DeliveryChannel::Sms, Some("+15550000001".into()))
            .scheduled_at(Some(now - Duration::minutes(5)))
            .expires_at(Some(now - Duration::minutes(1)))
            .build(now);
        f.repo.create(&n).await.unwrap();

        assert_eq!(f.scheduler.tick().await.unwrap().cancelled, 1);
        assert_eq!(f.get(&n.id).await.status, NotificationStatus::Cancelled);
        assert_eq!(f.sms.calls(), 0);
    }

    #[tokio::test]
    async fn test_live_lease_is_respected_and_lapsed_lease_reclaimed() {
        let f = fixture(ScriptedSms::default(), SchedulerConfig::default());
        let id = f.queue_sms(Duration::zero()).await;
        let now = f.clock.now();
        f.repo
            .update("test.lease", &id, |n| {
                n.transition(NotificationStatus::Sending, now)?;
                n.lease = Some(Lease {
                    holder: "w2".into(),
                    expires_at: now + Duration::seconds(120),
                });
                Ok(())
            })
            .await
            .unwrap();

        assert!(f.scheduler.tick().await.unwrap().is_idle());
        assert_eq!(f.sms.calls(), 0);

        f.clock.advance(Duration::seconds(121));
        assert_eq!(f.scheduler.tick().await.unwrap().sent, 1);
        assert_eq!(f.get(&id).await.status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn test_push_fans_out_to_each_target() {
        let f = fixture(ScriptedSms::default(), SchedulerConfig::default());
        let bus = Arc::new(letusconnect_delivery::MemoryPubSub::new(16));
        let mut rx = bus.subscribe("user:u2");
        let registry = Arc::new(
            DeliveryRegistry::new().with(Arc::new(letusconnect_delivery::push::PushAdapter::new(bus))),
        );
        let scheduler = NotificationScheduler::new(
            f.repo.clone(),
            registry,
            Arc::new(StaticIdentityDirectory::new()),
            f.clock.clone(),
            SchedulerConfig::default(),
        );
        let n = NotificationBuilder::new("message", NotificationCategory::Message)
            .title("New message")
            .targets([Uid::from("u2"), Uid::from("u3")])
            .build(f.clock.now());
        f.repo.create(&n).await.unwrap();

        assert_eq!(scheduler.tick().await.unwrap().sent, 1);
        let pushed = rx.recv().await.unwrap();
        assert_eq!(pushed.event, "message");
        assert_eq!(pushed.payload["id"], n.id.as_str());
    }

    /// Push adapter where every delivery moves the shared clock forward.
    #[derive(Debug)]
    struct SlowPush {
        clock: Arc<ManualClock>,
        step: Duration,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeliveryAdapter for SlowPush {
        fn channel(&self) -> DeliveryChannel {
            DeliveryChannel::Push
        }

        async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
            self.clock.advance(self.step);
            tokio::task::yield_now().await;
            self.calls.lock().unwrap().push(message.recipient.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_fan_out_keeps_its_lease() {
        let f = fixture(ScriptedSms::default(), SchedulerConfig::default());
        let push = Arc::new(SlowPush {
            clock: f.clock.clone(),
            step: Duration::seconds(25),
            calls: Mutex::default(),
        });
        let worker = |worker_id: &str| {
            NotificationScheduler::new(
                f.repo.clone(),
                Arc::new(DeliveryRegistry::new().with(push.clone())),
                Arc::new(StaticIdentityDirectory::new()),
                f.clock.clone(),
                SchedulerConfig {
                    worker_id: Some(worker_id.into()),
                    ..SchedulerConfig::default()
                },
            )
        };
        let (first, second) = (worker("w1"), worker("w2"));
        let start = f.clock.now();
        let n = NotificationBuilder::new("message", NotificationCategory::Message)
            .title("Weekly digest")
            .targets((1..=8).map(|i| Uid::from(format!("u{i}"))))
            .build(start);
        f.repo.create(&n).await.unwrap();

        // The second worker wakes once the original lease would have lapsed.
        let (first_report, second_report) = tokio::join!(first.tick(), async {
            while f.clock.now() < start + Duration::seconds(130) {
                tokio::task::yield_now().await;
            }
            second.tick().await
        });

        assert!(second_report.unwrap().is_idle());
        assert_eq!(first_report.unwrap().sent, 1);
        let mut calls = push.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 8);
        calls.sort();
        calls.dedup();
        assert_eq!(calls.len(), 8);
        let sent = f.get(&n.id).await;
        assert_eq!(sent.status, NotificationStatus::Sent);
        assert!(sent.lease.is_none());
    }

    #[tokio::test]
    async fn test_huge_backoff_does_not_overflow() {
        let sms = ScriptedSms::failing([DeliveryError::Retryable("busy".into())]);
        let f = fixture(
            sms,
            SchedulerConfig {
                retry_backoff_seconds: u64::MAX,
                ..SchedulerConfig::default()
            },
        );
        let id = f.queue_sms(Duration::zero()).await;

        assert_eq!(f.scheduler.tick().await.unwrap().retried, 1);
        let n = f.get(&id).await;
        assert_eq!(n.status, NotificationStatus::Pending);
        assert!(n.scheduled_at.unwrap() > f.clock.now() + Duration::days(365));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let f = fixture(ScriptedSms::default(), SchedulerConfig::default());
        f.queue_sms(Duration::zero()).await;
        let (tx, rx) = watch::channel(false);

        let scheduler = Arc::new(f.scheduler);
        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run(rx).await }
        });
        while f.sms.calls() == 0 {
            tokio::task::yield_now().await;
        }
        tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(f.sms.calls(), 1);
    }
}
