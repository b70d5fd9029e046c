//! Scheduler scenarios: dispatch of due SMS and retry on transient failure.

use std::sync::Arc;

use letusconnect_core::config::DispatchMode;
use letusconnect_core::events::{DirectEvent, DomainEvent, EventPayload};
use letusconnect_core::traits::Clock;
use letusconnect_delivery::DeliveryError;
use letusconnect_entity::notification::NotificationStatus;
use letusconnect_service::{EventDispatcher, NotificationComposer, StaticIdentityDirectory};

use crate::helpers::{TestApp, uid};

#[tokio::test]
async fn test_due_sms_is_dispatched_once() {
    let app = TestApp::new().await;
    let id = app.queue_sms(-1).await;

    app.scheduler.tick().await.unwrap();
    let n = app.notification_repo.get(&id).await.unwrap();
    assert_eq!(n.status, NotificationStatus::Sent);
    assert_eq!(n.sent_at, Some(app.clock.now()));
    assert!(n.sent_at >= n.scheduled_at);

    let calls = app.sms.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipient, "+15550000001");
    assert_eq!(calls[0].body, "hello");

    app.advance(60);
    app.scheduler.tick().await.unwrap();
    assert_eq!(app.sms.calls().len(), 1);
}

#[tokio::test]
async fn test_retryable_failures_then_success() {
    let app = TestApp::new().await;
    let id = app.queue_sms(-1).await;
    app.sms.fail_with([
        DeliveryError::Retryable("relay returned 503".into()),
        DeliveryError::Retryable("relay returned 503".into()),
    ]);

    for expected_attempts in 1..=2 {
        app.scheduler.tick().await.unwrap();
        let n = app.notification_repo.get(&id).await.unwrap();
        assert_eq!(n.status, NotificationStatus::Pending);
        assert_eq!(n.attempts, expected_attempts);
        assert!(n.sent_at.is_none());
        app.advance(60);
    }

    app.scheduler.tick().await.unwrap();
    let n = app.notification_repo.get(&id).await.unwrap();
    assert_eq!(n.status, NotificationStatus::Sent);
    assert_eq!(n.attempts, 3);
    assert!(n.sent_at.is_some());
    assert!(n.last_error.is_none());
    assert_eq!(app.sms.calls().len(), 3);
}

#[tokio::test]
async fn test_sms_event_flows_through_outbox() {
    let app = TestApp::new().await;
    let dispatcher = EventDispatcher::new(
        Arc::new(NotificationComposer::new(Arc::new(StaticIdentityDirectory::new()))),
        app.notification_repo.clone(),
        app.clock.clone(),
        DispatchMode::Inline,
    );
    let event = DomainEvent::new(
        None,
        app.clock.now(),
        EventPayload::Direct(DirectEvent::Sms {
            uid: Some(uid("u1")),
            to: "+15550000002".into(),
            body: "Your code is 1234".into(),
        }),
    )
    .deliver_at(app.clock.now() + chrono::Duration::minutes(5));
    dispatcher.dispatch(event).await;

    app.scheduler.tick().await.unwrap();
    assert!(app.sms.calls().is_empty());

    app.advance(300);
    app.scheduler.tick().await.unwrap();
    let calls = app.sms.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipient, "+15550000002");
    assert_eq!(calls[0].body, "Your code is 1234");
}
