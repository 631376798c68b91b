mod common;

use chat_server::models::{
    ConnectionStatus, ListConnections, ListPendingRequests, PendingDirection,
};
use chat_server::ChatError;
use chrono::{Duration, Utc};
use common::Harness;

fn pending(direction: PendingDirection) -> ListPendingRequests {
    ListPendingRequests {
        direction,
        limit: 50,
        offset: 0,
    }
}

#[tokio::test]
async fn test_request_accept_and_list() {
    let h = Harness::new().await;
    h.users(&["alice", "bob"]).await;

    let request = h.connections.send_request("alice", "bob").await.unwrap();
    assert_eq!(request.status, ConnectionStatus::Pending);
    assert!(request.expires_at.unwrap() > Utc::now() + Duration::days(89));

    let received = h
        .connections
        .list_pending("bob", &pending(PendingDirection::Received))
        .await
        .unwrap();
    assert_eq!(received.total, 1);
    assert_eq!(received.connections[0].user.id, "alice");

    let sent = h
        .connections
        .list_pending("alice", &pending(PendingDirection::Sent))
        .await
        .unwrap();
    assert_eq!(sent.connections[0].user.id, "bob");

    let accepted = h.connections.accept("bob", &request.id).await.unwrap();
    assert_eq!(accepted.status, ConnectionStatus::Accepted);
    assert!(accepted.responded_at.is_some());

    for (user, other) in [("alice", "bob"), ("bob", "alice")] {
        let page = h
            .connections
            .list_connections(user, &ListConnections::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(!page.has_more);
        assert_eq!(page.connections[0].user.id, other);
    }
    assert!(h.store.has_accepted_connection("bob", "alice").await.unwrap());
}

#[tokio::test]
async fn test_request_preconditions() {
    let h = Harness::new().await;
    h.users(&["alice", "bob"]).await;

    assert!(matches!(
        h.connections.send_request("alice", "alice").await,
        Err(ChatError::SelfConnection)
    ));
    assert!(matches!(
        h.connections.send_request("alice", "nobody").await,
        Err(ChatError::NotFound(_))
    ));

    let request = h.connections.send_request("alice", "bob").await.unwrap();
    assert!(matches!(
        h.connections.send_request("bob", "alice").await,
        Err(ChatError::PendingRequest)
    ));

    h.connections.accept("bob", &request.id).await.unwrap();
    assert!(matches!(
        h.connections.send_request("alice", "bob").await,
        Err(ChatError::AlreadyConnected)
    ));
}

#[tokio::test]
async fn test_only_addressee_may_respond() {
    let h = Harness::new().await;
    h.users(&["alice", "bob", "carol"]).await;
    let request = h.connections.send_request("alice", "bob").await.unwrap();

    assert!(matches!(
        h.connections.accept("alice", &request.id).await,
        Err(ChatError::Forbidden)
    ));
    assert!(matches!(
        h.connections.reject("carol", &request.id).await,
        Err(ChatError::Forbidden)
    ));
    assert!(matches!(
        h.connections.accept("bob", "missing").await,
        Err(ChatError::NotFound(_))
    ));

    h.connections.accept("bob", &request.id).await.unwrap();
    assert!(matches!(
        h.connections.reject("bob", &request.id).await,
        Err(ChatError::InvalidStatus)
    ));
}

#[tokio::test]
async fn test_rejection_starts_cooldown() {
    let h = Harness::new().await;
    h.users(&["alice", "bob"]).await;
    let request = h.connections.send_request("alice", "bob").await.unwrap();
    h.connections.reject("bob", &request.id).await.unwrap();

    assert!(matches!(
        h.connections.send_request("alice", "bob").await,
        Err(ChatError::CooldownPeriod)
    ));

    // Pretend the rejection happened long ago.
    let mut rejected = h.store.get_connection(&request.id).await.unwrap().unwrap();
    rejected.responded_at = Some(Utc::now() - Duration::days(31));
    h.store.update_connection(&rejected).await.unwrap();

    let renewed = h.connections.send_request("bob", "alice").await.unwrap();
    assert_eq!(renewed.id, request.id);
    assert_eq!(renewed.user_id, "bob");
    assert_eq!(renewed.status, ConnectionStatus::Pending);
    assert_eq!(h.count("connection").await, 1);
}

#[tokio::test]
async fn test_remove_connection() {
    let h = Harness::new().await;
    h.users(&["alice", "bob", "carol"]).await;
    let request = h.connections.send_request("alice", "bob").await.unwrap();

    assert!(matches!(
        h.connections.remove("alice", &request.id).await,
        Err(ChatError::InvalidStatus)
    ));
    h.connections.accept("bob", &request.id).await.unwrap();
    assert!(matches!(
        h.connections.remove("carol", &request.id).await,
        Err(ChatError::Forbidden)
    ));

    h.connections.remove("bob", &request.id).await.unwrap();
    assert!(!h.store.has_accepted_connection("alice", "bob").await.unwrap());
    assert!(matches!(
        h.connections.remove("bob", &request.id).await,
        Err(ChatError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_expire_old_requests() {
    let h = Harness::new().await;
    h.users(&["alice", "bob", "carol"]).await;
    let stale = h.connections.send_request("alice", "bob").await.unwrap();
    h.connections.send_request("alice", "carol").await.unwrap();

    let mut row = h.store.get_connection(&stale.id).await.unwrap().unwrap();
    row.expires_at = Some(Utc::now() - Duration::days(1));
    h.store.update_connection(&row).await.unwrap();

    assert_eq!(h.connections.expire_old_requests().await.unwrap(), 1);
    let row = h.store.get_connection(&stale.id).await.unwrap().unwrap();
    assert_eq!(row.status, ConnectionStatus::Rejected);
    assert_eq!(h.connections.expire_old_requests().await.unwrap(), 0);

    // An expired request does not block a new one.
    let again = h.connections.send_request("alice", "bob").await.unwrap();
    assert_eq!(again.status, ConnectionStatus::Pending);
}

#[tokio::test]
async fn test_connection_pagination() {
    let h = Harness::new().await;
    h.users(&["alice", "bob", "carol", "dave"]).await;
    for other in ["bob", "carol", "dave"] {
        h.connect(other, "alice").await;
    }

    let first = h
        .connections
        .list_connections("alice", &ListConnections { limit: 2, offset: 0 })
        .await
        .unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.connections.len(), 2);
    assert!(first.has_more);

    let rest = h
        .connections
        .list_connections("alice", &ListConnections { limit: 2, offset: 2 })
        .await
        .unwrap();
    assert_eq!(rest.connections.len(), 1);
    assert!(!rest.has_more);
}
