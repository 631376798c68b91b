mod common;

use async_trait::async_trait;
use chat_server::models::{GetOrCreateConversation, PresenceStatus, SendMessage};
use chat_server::{ChatError, PresenceService};
use common::Harness;
use realtime::{MemoryPublisher, Publisher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records like `MemoryPublisher`, but the first publish is held back.
struct SlowFirstPublisher {
    inner: MemoryPublisher,
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl Publisher for SlowFirstPublisher {
    async fn publish(&self, channel: &str, data: serde_json::Value) -> realtime::Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.publish(channel, data).await
    }
}

#[tokio::test]
async fn test_status_is_broadcast_to_connections() {
    let h = Harness::new().await;
    h.users(&["alice", "bob", "carol", "dave"]).await;
    h.connect("alice", "bob").await;
    h.connect("carol", "alice").await;

    let presence = h
        .presence
        .update_status("alice", PresenceStatus::Online)
        .await
        .unwrap();
    assert_eq!(presence.status, PresenceStatus::Online);

    let mut channels = h.publisher.channels();
    channels.sort();
    assert_eq!(channels, vec!["chat:bob".to_string(), "chat:carol".to_string()]);
    let event = &h.publisher.on_channel("chat:bob")[0];
    assert_eq!(event["type"], "presence");
    assert_eq!(event["userId"], "alice");
    assert_eq!(event["status"], "online");
    assert!(event["lastSeenAt"].is_string());
}

#[tokio::test]
async fn test_last_seen_moves_only_when_going_offline() {
    let h = Harness::new().await;
    h.user("alice").await;

    let first = h
        .presence
        .update_status("alice", PresenceStatus::Online)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let away = h
        .presence
        .update_status("alice", PresenceStatus::Away)
        .await
        .unwrap();
    assert_eq!(away.last_seen_at, first.last_seen_at);
    assert!(away.updated_at > first.updated_at);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let offline = h
        .presence
        .update_status("alice", PresenceStatus::Offline)
        .await
        .unwrap();
    assert!(offline.last_seen_at > first.last_seen_at);
}

#[tokio::test]
async fn test_connections_status_lists_only_connections() {
    let h = Harness::new().await;
    h.users(&["alice", "bob", "carol"]).await;
    h.connect("bob", "alice").await;

    for user in ["bob", "carol"] {
        h.presence
            .update_status(user, PresenceStatus::Online)
            .await
            .unwrap();
    }

    let statuses = h.presence.get_connections_status("alice").await.unwrap();
    assert_eq!(statuses.statuses.len(), 1);
    assert_eq!(statuses.statuses[0].user_id, "bob");
}

#[tokio::test]
async fn test_typing_requires_participant() {
    let h = Harness::new().await;
    h.users(&["alice", "bob"]).await;

    let err = h
        .presence
        .broadcast_typing("alice", "nowhere", true)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotParticipant));
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn test_typing_clears_automatically() {
    let mut h = Harness::new().await;
    h.presence = PresenceService::new(h.store.clone(), h.publisher.clone())
        .with_typing_timeout(Duration::from_millis(50));
    h.users(&["alice", "bob"]).await;
    h.connect("alice", "bob").await;
    let conversation = h
        .chat
        .get_or_create_conversation(
            "alice",
            &GetOrCreateConversation {
                user_id: "bob".into(),
            },
        )
        .await
        .unwrap()
        .conversation
        .id;
    let channel = format!("conversation:{}", conversation);

    h.presence
        .broadcast_typing("alice", &conversation, true)
        .await
        .unwrap();
    assert_eq!(h.presence.pending_typing_timers(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let events = h.publisher.on_channel(&channel);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["isTyping"], true);
    assert_eq!(events[1]["isTyping"], false);
    assert_eq!(h.presence.pending_typing_timers(), 0);

    // An explicit stop cancels the pending clear.
    h.publisher.clear();
    h.presence
        .broadcast_typing("alice", &conversation, true)
        .await
        .unwrap();
    h.presence
        .broadcast_typing("alice", &conversation, false)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.publisher.on_channel(&channel).len(), 2);
    assert_eq!(h.presence.pending_typing_timers(), 0);

    // Shutdown drops timers without publishing.
    h.publisher.clear();
    h.presence
        .broadcast_typing("alice", &conversation, true)
        .await
        .unwrap();
    h.presence.shutdown();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.publisher.on_channel(&channel).len(), 1);

    // Typing does not touch the message log.
    h.chat
        .send_message("bob", &SendMessage::text(&conversation, "ok"))
        .await
        .unwrap();
    assert_eq!(h.count("message").await, 1);
}

#[tokio::test]
async fn test_overlapping_typing_calls_leave_one_timer() {
    let h = Harness::new().await;
    h.users(&["alice", "bob"]).await;
    h.connect("alice", "bob").await;
    let conversation = h
        .chat
        .get_or_create_conversation(
            "alice",
            &GetOrCreateConversation {
                user_id: "bob".into(),
            },
        )
        .await
        .unwrap()
        .conversation
        .id;

    let publisher = Arc::new(SlowFirstPublisher {
        inner: MemoryPublisher::new(),
        calls: AtomicUsize::new(0),
        delay: Duration::from_millis(50),
    });
    let presence = PresenceService::new(h.store.clone(), publisher.clone())
        .with_typing_timeout(Duration::from_millis(200));

    // The second call registers its timer while the first is still publishing.
    let (first, second) = tokio::join!(
        presence.broadcast_typing("alice", &conversation, true),
        presence.broadcast_typing("alice", &conversation, true),
    );
    first.unwrap();
    second.unwrap();
    assert_eq!(presence.pending_typing_timers(), 1);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let events = publisher
        .inner
        .on_channel(&format!("conversation:{}", conversation));
    let stops = events.iter().filter(|e| e["isTyping"] == false).count();
    assert_eq!(events.len(), 3);
    assert_eq!(stops, 1);
    assert_eq!(presence.pending_typing_timers(), 0);
}
