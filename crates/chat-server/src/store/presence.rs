use super::ChatStore;
use crate::models::{ts, PresenceStatus, UserPresence};
use chrono::{DateTime, Utc};

impl ChatStore {
    /// Record a status change. `last_seen_at` is set on first insert and
    /// afterwards only moves when the user goes offline.
    pub async fn upsert_presence(
        &self,
        user_id: &str,
        status: PresenceStatus,
        at: &DateTime<Utc>,
    ) -> Result<UserPresence, sqlx::Error> {
        sqlx::query_as::<_, UserPresence>(
            r#"
            INSERT INTO user_presence (user_id, status, last_seen_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                status = excluded.status,
                last_seen_at = CASE
                    WHEN excluded.status = 'offline' THEN excluded.last_seen_at
                    ELSE user_presence.last_seen_at
                END,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(ts(at))
        .bind(ts(at))
        .fetch_one(&self.pool)
        .await
    }

    /// Presence rows of everyone the user has an accepted connection with.
    pub async fn presence_of_connections(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserPresence>, sqlx::Error> {
        sqlx::query_as::<_, UserPresence>(
            r#"
            SELECT up.* FROM user_presence up
            JOIN connection c
              ON c.status = 'accepted'
             AND ((c.user_id = ? AND c.connected_user_id = up.user_id)
               OR (c.connected_user_id = ? AND c.user_id = up.user_id))
            ORDER BY up.user_id
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
