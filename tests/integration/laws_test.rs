//! Round-trip and idempotence laws.

use letusconnect_core::ErrorKind;
use letusconnect_entity::notification::NotificationStatus;

use crate::helpers::{TestApp, uid};

#[tokio::test]
async fn test_accept_then_remove_leaves_no_state() {
    let app = TestApp::new().await;
    let (u1, u2) = (uid("u1"), uid("u2"));

    app.connections.send_request(&u1, &u2, "hi").await.unwrap();
    app.connections.accept_request(&u1, &u2).await.unwrap();
    app.connections.remove_connection(&u1, &u2).await.unwrap();

    for doc in [
        app.connection_repo.find(&u1).await.unwrap().unwrap(),
        app.connection_repo.find(&u2).await.unwrap().unwrap(),
    ] {
        assert!(doc.connections.is_empty(), "{doc:?}");
        assert!(doc.pending_requests.is_empty(), "{doc:?}");
        assert!(doc.sent_requests.is_empty(), "{doc:?}");
    }
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let app = TestApp::new().await;
    let (u1, u2) = (uid("u1"), uid("u2"));
    app.connections.remove_connection(&u1, &u2).await.unwrap();
    app.connections.remove_connection(&u2, &u1).await.unwrap();
}

#[tokio::test]
async fn test_cancel_is_idempotent_and_guarded() {
    let app = TestApp::new().await;
    let pending = app.queue_sms(600).await;
    app.notifications.cancel(&pending).await.unwrap();
    let once = app.notification_repo.get(&pending).await.unwrap();
    app.notifications.cancel(&pending).await.unwrap();
    assert_eq!(app.notification_repo.get(&pending).await.unwrap(), once);
    assert_eq!(once.status, NotificationStatus::Cancelled);

    let sent = app.queue_sms(-1).await;
    app.scheduler.tick().await.unwrap();
    let before = app.notification_repo.get(&sent).await.unwrap();
    let err = app.notifications.cancel(&sent).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotCancellable);
    assert_eq!(app.notification_repo.get(&sent).await.unwrap(), before);
}

#[tokio::test]
async fn test_read_status_keys_match_recipients() {
    let app = TestApp::new().await;
    let (u1, u2, u3) = (uid("u1"), uid("u2"), uid("u3"));
    app.connections.send_request(&u1, &u2, "").await.unwrap();
    app.connections.send_request(&u3, &u2, "").await.unwrap();
    app.connections.accept_request(&u1, &u2).await.unwrap();

    let all = app.notification_repo.all_for_user(&u1, &[]).await.unwrap();
    let all = all
        .into_iter()
        .chain(app.notification_repo.all_for_user(&u2, &[]).await.unwrap());
    for n in all {
        let keys: Vec<_> = n.read_status.keys().cloned().collect();
        let mut targets = n.targeted_users.clone();
        targets.sort();
        assert_eq!(keys, targets);
    }
}
