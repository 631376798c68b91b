//! Connections Module
//!
//! Request, accept, reject and remove the social links that gate direct chat.
//! One row represents a link in both directions; `user_id` is whoever asked.

use crate::core::error::{ChatError, Result};
use crate::models::{
    now, Connection, ConnectionPage, ConnectionStatus, ListConnections, ListPendingRequests,
    Success,
};
use crate::store::ChatStore;
use chrono::Duration;
use tracing::info;
use uuid::Uuid;

/// How long a rejected requester waits before asking again.
pub const COOLDOWN_DAYS: i64 = 30;
/// Pending requests lapse after this long.
pub const REQUEST_EXPIRY_DAYS: i64 = 90;

pub struct ConnectionManager {
    store: ChatStore,
}

impl ConnectionManager {
    pub fn new(store: ChatStore) -> Self {
        Self { store }
    }

    /// Send a connection request from `user_id` to `other_id`.
    pub async fn send_request(&self, user_id: &str, other_id: &str) -> Result<Connection> {
        if user_id == other_id {
            return Err(ChatError::SelfConnection);
        }
        if self.store.get_public_user(other_id).await?.is_none() {
            return Err(ChatError::NotFound("User"));
        }

        let at = now();
        let existing = self.store.find_connection_between(user_id, other_id).await?;

        if let Some(mut existing) = existing {
            match existing.status {
                ConnectionStatus::Accepted => return Err(ChatError::AlreadyConnected),
                ConnectionStatus::Pending => return Err(ChatError::PendingRequest),
                ConnectionStatus::Blocked => return Err(ChatError::Forbidden),
                ConnectionStatus::Rejected => {
                    if let Some(responded_at) = existing.responded_at {
                        if at < responded_at + Duration::days(COOLDOWN_DAYS) {
                            return Err(ChatError::CooldownPeriod);
                        }
                    }
                }
            }

            // Reuse the rejected row, now pointing from the new requester.
            existing.user_id = user_id.to_string();
            existing.connected_user_id = other_id.to_string();
            existing.status = ConnectionStatus::Pending;
            existing.requested_at = at;
            existing.responded_at = None;
            existing.expires_at = Some(at + Duration::days(REQUEST_EXPIRY_DAYS));
            existing.updated_at = at;
            self.store.update_connection(&existing).await?;

            info!("[Connections] Request renewed: {} -> {}", user_id, other_id);
            return Ok(existing);
        }

        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            connected_user_id: other_id.to_string(),
            status: ConnectionStatus::Pending,
            requested_at: at,
            responded_at: None,
            expires_at: Some(at + Duration::days(REQUEST_EXPIRY_DAYS)),
            created_at: at,
            updated_at: at,
        };
        self.store.insert_connection(&connection).await?;

        info!("[Connections] Request sent: {} -> {}", user_id, other_id);
        Ok(connection)
    }

    /// Pending request addressed to `user_id`, or the matching error.
    async fn pending_for_addressee(&self, user_id: &str, connection_id: &str) -> Result<Connection> {
        let connection = self
            .store
            .get_connection(connection_id)
            .await?
            .ok_or(ChatError::NotFound("Connection"))?;

        if connection.connected_user_id != user_id {
            return Err(ChatError::Forbidden);
        }
        if connection.status != ConnectionStatus::Pending {
            return Err(ChatError::InvalidStatus);
        }
        Ok(connection)
    }

    pub async fn accept(&self, user_id: &str, connection_id: &str) -> Result<Connection> {
        let mut connection = self.pending_for_addressee(user_id, connection_id).await?;

        let at = now();
        connection.status = ConnectionStatus::Accepted;
        connection.responded_at = Some(at);
        connection.updated_at = at;
        self.store.update_connection(&connection).await?;

        info!(
            "[Connections] {} accepted request from {}",
            user_id, connection.user_id
        );
        Ok(connection)
    }

    pub async fn reject(&self, user_id: &str, connection_id: &str) -> Result<Success> {
        let mut connection = self.pending_for_addressee(user_id, connection_id).await?;

        let at = now();
        connection.status = ConnectionStatus::Rejected;
        connection.responded_at = Some(at);
        connection.updated_at = at;
        self.store.update_connection(&connection).await?;

        info!(
            "[Connections] {} rejected request from {}",
            user_id, connection.user_id
        );
        Ok(Success::OK)
    }

    /// Delete an accepted connection. Existing conversations are kept but can
    /// no longer be written to.
    pub async fn remove(&self, user_id: &str, connection_id: &str) -> Result<Success> {
        let connection = self
            .store
            .get_connection(connection_id)
            .await?
            .ok_or(ChatError::NotFound("Connection"))?;

        if !connection.involves(user_id) {
            return Err(ChatError::Forbidden);
        }
        if connection.status != ConnectionStatus::Accepted {
            return Err(ChatError::InvalidStatus);
        }

        self.store.delete_connection(connection_id).await?;

        info!(
            "[Connections] {} removed connection with {}",
            user_id,
            connection.other_side(user_id)
        );
        Ok(Success::OK)
    }

    pub async fn list_connections(
        &self,
        user_id: &str,
        input: &ListConnections,
    ) -> Result<ConnectionPage> {
        let (connections, total) = self
            .store
            .list_accepted_connections(user_id, input.limit, input.offset)
            .await?;
        let has_more = input.offset + (connections.len() as i64) < total;
        Ok(ConnectionPage {
            connections,
            total,
            has_more,
        })
    }

    pub async fn list_pending(
        &self,
        user_id: &str,
        input: &ListPendingRequests,
    ) -> Result<ConnectionPage> {
        let (connections, total) = self
            .store
            .list_pending_connections(user_id, input.direction, input.limit, input.offset)
            .await?;
        let has_more = input.offset + (connections.len() as i64) < total;
        Ok(ConnectionPage {
            connections,
            total,
            has_more,
        })
    }

    /// Reject every pending request past its expiry. Returns how many lapsed.
    pub async fn expire_old_requests(&self) -> Result<u64> {
        let expired = self.store.expire_pending_connections(&now()).await?;
        if expired > 0 {
            info!("[Connections] Expired {} pending requests", expired);
        }
        Ok(expired)
    }
}
