//! Reader API scenarios: read bits, unread counts, pagination.

use letusconnect_core::ErrorKind;
use letusconnect_core::types::pagination::CursorRequest;
use letusconnect_service::ListFilter;

use crate::helpers::{TestApp, uid};

#[tokio::test]
async fn test_unread_count_and_read_bits() {
    let app = TestApp::new().await;
    let n1 = app.seed_for(&["u1", "u2"]).await;
    let n2 = app.seed_for(&["u1", "u2"]).await;
    app.seed_for(&["u1", "u2"]).await;
    let (u1, u2, u3) = (uid("u1"), uid("u2"), uid("u3"));

    assert!(app.notifications.mark_read(&n1, &u1).await.unwrap());
    let after_first = app.notification_repo.get(&n1).await.unwrap();
    assert!(!app.notifications.mark_read(&n1, &u1).await.unwrap());
    assert_eq!(app.notification_repo.get(&n1).await.unwrap(), after_first);

    let err = app.notifications.mark_read(&n2, &u3).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotTargeted);

    assert_eq!(app.notifications.unread_count(&u1).await.unwrap(), 2);
    assert_eq!(app.notifications.unread_count(&u2).await.unwrap(), 3);
    assert_eq!(app.notifications.unread_count(&u3).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cursor_pages_are_stable_against_inserts() {
    let app = TestApp::new().await;
    let u1 = uid("u1");
    let mut older = Vec::new();
    for _ in 0..4 {
        older.push(app.seed_for(&["u1"]).await);
    }

    let first = app
        .notifications
        .list(&u1, &CursorRequest::first(2), &ListFilter::default())
        .await
        .unwrap();
    assert_eq!(first.items[0].id, older[3]);
    assert!(first.has_more());

    app.seed_for(&["u1"]).await;

    let second = app
        .notifications
        .list(&u1, &CursorRequest::new(Some(2), first.next_cursor.clone()), &ListFilter::default())
        .await
        .unwrap();
    let ids: Vec<_> = second.items.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids, vec![older[1].clone(), older[0].clone()]);
    assert!(!second.has_more());
}

#[tokio::test]
async fn test_limit_is_clamped() {
    let app = TestApp::new().await;
    let u1 = uid("u1");
    for _ in 0..3 {
        app.seed_for(&["u1"]).await;
    }
    let page = app
        .notifications
        .list(&u1, &CursorRequest::first(10_000), &ListFilter::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
}
