//! Connection graph scenarios: request/accept, reject, concurrent decisions.

use letusconnect_core::ErrorKind;
use letusconnect_core::traits::Clock;
use letusconnect_entity::connection::{ConnectionStatus, SentRequestStatus};

use crate::helpers::{TestApp, uid};

#[tokio::test]
async fn test_request_accept_round_trip() {
    let app = TestApp::new().await;
    let (u1, u2) = (uid("u1"), uid("u2"));

    app.connections.send_request(&u1, &u2, "hi").await.unwrap();
    app.advance(30);
    let t2 = app.clock.now();
    app.connections.accept_request(&u1, &u2).await.unwrap();

    let a = app.connections.get_connections(&u1).await.unwrap();
    let b = app.connections.get_connections(&u2).await.unwrap();
    assert_eq!(a.connections.len(), 1);
    assert_eq!(a.connections[&u2].status, ConnectionStatus::Active);
    assert_eq!(a.connections[&u2].accepted_at, Some(t2));
    assert_eq!(b.connections[&u1].status, ConnectionStatus::Active);
    assert_eq!(b.connections[&u1].accepted_at, Some(t2));
    assert!(a.pending_requests.is_empty());
    assert!(b.pending_requests.is_empty());
    assert_eq!(a.sent_requests[&u2].status, SentRequestStatus::Accepted);

    let request = app.notifications_of("u2", "connection_request").await;
    assert_eq!(request.len(), 1);
    assert_eq!(request[0].targeted_users, vec![u2.clone()]);
    assert_eq!(request[0].content, "hi");
    let accepted = app.notifications_of("u1", "connection_accepted").await;
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].targeted_users, vec![u1.clone()]);
    assert_eq!(accepted[0].actor_name.as_deref(), Some("Bo"));
}

#[tokio::test]
async fn test_reject() {
    let app = TestApp::new().await;
    let (u1, u2) = (uid("u1"), uid("u2"));

    app.connections.send_request(&u1, &u2, "").await.unwrap();
    app.connections.reject_request(&u1, &u2).await.unwrap();

    let a = app.connections.get_connections(&u1).await.unwrap();
    let b = app.connections.get_connections(&u2).await.unwrap();
    assert!(!b.pending_requests.contains_key(&u1));
    assert_eq!(a.sent_requests[&u2].status, SentRequestStatus::Rejected);
    assert!(a.connections.is_empty() && b.connections.is_empty());
    assert!(app.notifications_of("u1", "connection_accepted").await.is_empty());

    let request = app.notifications_of("u2", "connection_request").await;
    assert_eq!(request[0].content, "Ana wants to connect with you");
}

#[tokio::test]
async fn test_concurrent_accept_and_reject_have_one_winner() {
    let app = TestApp::new().await;
    let (u1, u2) = (uid("u1"), uid("u2"));
    app.connections.send_request(&u1, &u2, "x").await.unwrap();

    let (accepted, rejected) = tokio::join!(
        app.connections.accept_request(&u1, &u2),
        app.connections.reject_request(&u1, &u2),
    );

    let a = app.connections.get_connections(&u1).await.unwrap();
    let b = app.connections.get_connections(&u2).await.unwrap();
    match (accepted, rejected) {
        (Ok(()), Err(loser)) => {
            assert_eq!(loser.kind, ErrorKind::Conflict);
            assert!(a.is_connected_to(&u2) && b.is_connected_to(&u1));
            assert_eq!(a.sent_requests[&u2].status, SentRequestStatus::Accepted);
        }
        (Err(loser), Ok(())) => {
            assert_eq!(loser.kind, ErrorKind::Conflict);
            assert!(a.connections.is_empty() && b.connections.is_empty());
            assert_eq!(a.sent_requests[&u2].status, SentRequestStatus::Rejected);
        }
        other => panic!("expected exactly one winner, got {other:?}"),
    }
    assert!(b.pending_requests.is_empty());
}

#[tokio::test]
async fn test_accepting_request_not_addressed_to_caller_is_unauthorized() {
    let app = TestApp::new().await;
    let (u1, u2) = (uid("u1"), uid("u2"));
    app.connections.send_request(&u1, &u2, "").await.unwrap();

    let err = app.connections.accept_request(&u2, &u1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_symmetry_holds_across_mixed_operations() {
    let app = TestApp::new().await;
    let users = [uid("u1"), uid("u2"), uid("u3")];
    let (u1, u2, u3) = (&users[0], &users[1], &users[2]);

    app.connections.send_request(u1, u2, "").await.unwrap();
    app.connections.send_request(u3, u1, "").await.unwrap();
    app.connections.accept_request(u1, u2).await.unwrap();
    app.connections.block_user(u1, u3).await.unwrap();
    app.connections.send_request(u2, u3, "").await.unwrap();
    app.connections.accept_request(u2, u3).await.unwrap();
    app.connections.remove_connection(u2, u1).await.unwrap();

    for a in &users {
        let doc_a = app.connections.get_connections(a).await.unwrap();
        for b in users.iter().filter(|b| *b != a) {
            let doc_b = app.connections.get_connections(b).await.unwrap();
            assert_eq!(doc_a.is_connected_to(b), doc_b.is_connected_to(a));
            assert!(!(doc_a.pending_requests.contains_key(b) && doc_a.connections.contains_key(b)));
        }
    }
    assert_eq!(app.connections.mutual_connections(u1, u3).await.unwrap(), Vec::new());
    assert_eq!(app.connections.list_connections(u3).await.unwrap().len(), 1);
}
