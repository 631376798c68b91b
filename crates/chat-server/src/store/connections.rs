use super::rows::{optional_user_from_row, user_columns};
use super::ChatStore;
use crate::models::{
    ts, Connection, ConnectionStatus, ConnectionWithUser, PendingDirection,
};
use chrono::{DateTime, Utc};

impl ChatStore {
    pub async fn get_connection(&self, id: &str) -> Result<Option<Connection>, sqlx::Error> {
        sqlx::query_as::<_, Connection>("SELECT * FROM connection WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Most recent connection row between two users, in either direction and
    /// any status.
    pub async fn find_connection_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<Connection>, sqlx::Error> {
        sqlx::query_as::<_, Connection>(
            r#"
            SELECT * FROM connection
            WHERE (user_id = ? AND connected_user_id = ?)
               OR (user_id = ? AND connected_user_id = ?)
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_optional(&self.pool)
        .await
    }

    /// Whether an accepted connection links the two users, either direction.
    pub async fn has_accepted_connection(&self, a: &str, b: &str) -> Result<bool, sqlx::Error> {
        let found: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT id FROM connection
            WHERE ((user_id = ? AND connected_user_id = ?)
                OR (user_id = ? AND connected_user_id = ?))
              AND status = 'accepted'
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn insert_connection(&self, connection: &Connection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO connection
                (id, user_id, connected_user_id, status, requested_at, responded_at, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&connection.id)
        .bind(&connection.user_id)
        .bind(&connection.connected_user_id)
        .bind(connection.status)
        .bind(ts(&connection.requested_at))
        .bind(connection.responded_at.as_ref().map(ts))
        .bind(connection.expires_at.as_ref().map(ts))
        .bind(ts(&connection.created_at))
        .bind(ts(&connection.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite the mutable fields of an existing row.
    pub async fn update_connection(&self, connection: &Connection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE connection
            SET user_id = ?, connected_user_id = ?, status = ?, requested_at = ?,
                responded_at = ?, expires_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&connection.user_id)
        .bind(&connection.connected_user_id)
        .bind(connection.status)
        .bind(ts(&connection.requested_at))
        .bind(connection.responded_at.as_ref().map(ts))
        .bind(connection.expires_at.as_ref().map(ts))
        .bind(ts(&connection.updated_at))
        .bind(&connection.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_connection(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM connection WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Accepted connections of `user_id`, newest first, with the other side's
    /// profile.
    pub async fn list_accepted_connections(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ConnectionWithUser>, i64), sqlx::Error> {
        let sql = format!(
            r#"
            SELECT c.*, {user}
            FROM connection c
            LEFT JOIN user u
              ON u.id = CASE WHEN c.user_id = ? THEN c.connected_user_id ELSE c.user_id END
            WHERE (c.user_id = ? OR c.connected_user_id = ?) AND c.status = 'accepted'
            ORDER BY c.updated_at DESC
            LIMIT ? OFFSET ?
            "#,
            user = user_columns("u", "o_"),
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(user_id)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let connections = collect_with_user(&rows)?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM connection
            WHERE (user_id = ? OR connected_user_id = ?) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((connections, total))
    }

    /// Pending requests addressed to (`Received`) or sent by (`Sent`) the user.
    pub async fn list_pending_connections(
        &self,
        user_id: &str,
        direction: PendingDirection,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ConnectionWithUser>, i64), sqlx::Error> {
        // The joined profile is always the counterpart.
        let (filter_col, other_col) = match direction {
            PendingDirection::Received => ("connected_user_id", "user_id"),
            PendingDirection::Sent => ("user_id", "connected_user_id"),
        };
        let sql = format!(
            r#"
            SELECT c.*, {user}
            FROM connection c
            LEFT JOIN user u ON u.id = c.{other_col}
            WHERE c.{filter_col} = ? AND c.status = 'pending'
            ORDER BY c.requested_at DESC
            LIMIT ? OFFSET ?
            "#,
            user = user_columns("u", "o_"),
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let connections = collect_with_user(&rows)?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM connection WHERE {filter_col} = ? AND status = 'pending'"
        );
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((connections, total))
    }

    /// Ids of everyone the user has an accepted connection with.
    pub async fn accepted_peer_ids(&self, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT CASE WHEN user_id = ? THEN connected_user_id ELSE user_id END
            FROM connection
            WHERE (user_id = ? OR connected_user_id = ?) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Reject every pending request whose expiry is before `at`.
    pub async fn expire_pending_connections(&self, at: &DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE connection
            SET status = ?, updated_at = ?
            WHERE status = 'pending' AND expires_at IS NOT NULL AND expires_at < ?
            "#,
        )
        .bind(ConnectionStatus::Rejected)
        .bind(ts(at))
        .bind(ts(at))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn collect_with_user(
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<ConnectionWithUser>, sqlx::Error> {
    use sqlx::FromRow;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let connection = Connection::from_row(row)?;
        // Rows whose counterpart profile is missing are skipped.
        if let Some(user) = optional_user_from_row(row, "o_")? {
            out.push(ConnectionWithUser { connection, user });
        }
    }
    Ok(out)
}
