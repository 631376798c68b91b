#![allow(dead_code)]

use chat_server::models::PublicUser;
use chat_server::{ChatService, ChatStore, ConnectionManager, PresenceService};
use realtime::{MemoryPublisher, Publisher};
use std::sync::Arc;
use tempfile::TempDir;

/// Services over a throwaway database with a recording broker.
pub struct Harness {
    pub dir: TempDir,
    pub store: ChatStore,
    pub publisher: Arc<MemoryPublisher>,
    pub chat: ChatService,
    pub connections: ConnectionManager,
    pub presence: PresenceService,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("chat.sqlite").display());
        let store = ChatStore::connect(&url).await.unwrap();
        let publisher = Arc::new(MemoryPublisher::new());
        let shared: Arc<dyn Publisher> = publisher.clone();

        Self {
            chat: ChatService::new(store.clone(), shared.clone()),
            connections: ConnectionManager::new(store.clone()),
            presence: PresenceService::new(store.clone(), shared),
            dir,
            store,
            publisher,
        }
    }

    pub async fn user(&self, id: &str) {
        let mut name = id.to_string();
        name[..1].make_ascii_uppercase();
        self.store
            .upsert_user(&PublicUser::new(id, name))
            .await
            .unwrap();
    }

    pub async fn users(&self, ids: &[&str]) {
        for id in ids {
            self.user(id).await;
        }
    }

    /// Request from `a`, accepted by `b`. Returns the connection id.
    pub async fn connect(&self, a: &str, b: &str) -> String {
        let request = self.connections.send_request(a, b).await.unwrap();
        self.connections.accept(b, &request.id).await.unwrap();
        request.id
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.store.pool())
            .await
            .unwrap();
        count
    }
}
