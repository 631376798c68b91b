//! Presence Module
//!
//! Online/away/offline status and typing indicators. Status is stored;
//! typing is only ever broadcast.

use crate::chat::events::{fan_out, publish_event, ChatEvent};
use crate::core::error::{ChatError, Result};
use crate::models::{now, PresenceStatus, Success, UserPresence};
use crate::store::ChatStore;
use parking_lot::Mutex;
use realtime::{conversation_channel, user_channel, Publisher};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A typing indicator is cleared automatically after this long.
pub const TYPING_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatuses {
    pub statuses: Vec<UserPresence>,
}

struct TypingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Keyed by `(user_id, conversation_id)`.
type TypingTimers = Arc<Mutex<HashMap<(String, String), TypingTimer>>>;

pub struct PresenceService {
    store: ChatStore,
    publisher: Arc<dyn Publisher>,
    typing_timeout: Duration,
    timers: TypingTimers,
    generation: Mutex<u64>,
}

impl PresenceService {
    pub fn new(store: ChatStore, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            store,
            publisher,
            typing_timeout: TYPING_TIMEOUT,
            timers: Arc::new(Mutex::new(HashMap::new())),
            generation: Mutex::new(0),
        }
    }

    pub fn with_typing_timeout(mut self, timeout: Duration) -> Self {
        self.typing_timeout = timeout;
        self
    }

    /// Store the user's status and tell everyone they are connected with.
    pub async fn update_status(
        &self,
        user_id: &str,
        status: PresenceStatus,
    ) -> Result<UserPresence> {
        let at = now();
        let presence = self.store.upsert_presence(user_id, status, &at).await?;

        let peers = self.store.accepted_peer_ids(user_id).await?;
        let event = ChatEvent::Presence {
            user_id: user_id.to_string(),
            status,
            last_seen_at: at,
        };
        let delivered = fan_out(
            self.publisher.as_ref(),
            peers.iter().map(|peer| user_channel(peer)),
            &event,
        )
        .await;

        info!(
            "[Presence] {} is {:?} ({}/{} connections notified)",
            user_id,
            status,
            delivered,
            peers.len()
        );
        Ok(presence)
    }

    /// Presence of every accepted connection that has reported a status.
    pub async fn get_connections_status(&self, user_id: &str) -> Result<ConnectionStatuses> {
        let statuses = self.store.presence_of_connections(user_id).await?;
        Ok(ConnectionStatuses { statuses })
    }

    /// Broadcast a typing indicator. A `true` indicator is followed by an
    /// automatic `false` unless another call for the same user and
    /// conversation arrives first.
    pub async fn broadcast_typing(
        &self,
        user_id: &str,
        conversation_id: &str,
        is_typing: bool,
    ) -> Result<Success> {
        if self
            .store
            .get_participant(conversation_id, user_id)
            .await?
            .is_none()
        {
            return Err(ChatError::NotParticipant);
        }

        let key = (user_id.to_string(), conversation_id.to_string());
        if let Some(previous) = self.timers.lock().remove(&key) {
            previous.handle.abort();
        }

        let channel = conversation_channel(conversation_id);
        publish_event(
            self.publisher.as_ref(),
            &channel,
            &ChatEvent::Typing {
                user_id: user_id.to_string(),
                is_typing,
            },
        )
        .await;

        if is_typing {
            let generation = {
                let mut counter = self.generation.lock();
                *counter += 1;
                *counter
            };

            let publisher = self.publisher.clone();
            let shared_timers = self.timers.clone();
            let timeout = self.typing_timeout;
            let user_id = user_id.to_string();
            let timer_key = key.clone();

            // Hold the lock until the timer is registered, so the timer
            // cannot run its cleanup before it is in the map.
            let mut timers = self.timers.lock();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                publish_event(
                    publisher.as_ref(),
                    &channel,
                    &ChatEvent::Typing {
                        user_id,
                        is_typing: false,
                    },
                )
                .await;

                let mut timers = shared_timers.lock();
                if timers.get(&timer_key).map(|t| t.generation) == Some(generation) {
                    timers.remove(&timer_key);
                }
            });

            // An overlapping call may have registered its own timer while this
            // one was publishing; only the newest survives.
            if let Some(stale) = timers.insert(key, TypingTimer { generation, handle }) {
                stale.handle.abort();
            }
        }

        Ok(Success::OK)
    }

    /// Number of typing indicators waiting to be cleared.
    pub fn pending_typing_timers(&self) -> usize {
        self.timers.lock().len()
    }

    /// Cancel every pending typing timer.
    pub fn shutdown(&self) {
        let mut timers = self.timers.lock();
        let count = timers.len();
        for (_, timer) in timers.drain() {
            timer.handle.abort();
        }
        debug!("[Presence] Cancelled {} typing timers", count);
    }
}

impl Drop for PresenceService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
