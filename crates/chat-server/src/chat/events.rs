//! Events pushed to the broker and the best-effort publishing around them.

use crate::models::{MessageWithSender, PresenceStatus};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use realtime::Publisher;
use serde::Serialize;
use tracing::warn;

/// Payloads published on `conversation:<id>` and `chat:<userId>` channels.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    NewMessage {
        #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        message: MessageWithSender,
    },
    Typing {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
    Presence {
        #[serde(rename = "userId")]
        user_id: String,
        status: PresenceStatus,
        #[serde(rename = "lastSeenAt")]
        last_seen_at: DateTime<Utc>,
    },
}

/// Publish one event. A broker failure is logged and otherwise ignored; the
/// store stays the source of truth.
pub async fn publish_event(publisher: &dyn Publisher, channel: &str, event: &ChatEvent) -> bool {
    let data = match serde_json::to_value(event) {
        Ok(data) => data,
        Err(e) => {
            warn!("[Realtime] Failed to encode event for {}: {}", channel, e);
            return false;
        }
    };
    match publisher.publish(channel, data).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "[Realtime] Publish to {} failed (retryable: {}): {}",
                channel,
                e.is_retryable(),
                e
            );
            false
        }
    }
}

/// Publish the same event to every channel concurrently and wait for all of
/// them. Returns how many publishes succeeded.
pub async fn fan_out<I>(publisher: &dyn Publisher, channels: I, event: &ChatEvent) -> usize
where
    I: IntoIterator<Item = String>,
{
    let channels: Vec<String> = channels.into_iter().collect();
    let results = join_all(
        channels
            .iter()
            .map(|channel| publish_event(publisher, channel, event)),
    )
    .await;
    results.into_iter().filter(|ok| *ok).count()
}
