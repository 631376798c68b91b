use super::rows::{
    conversation_columns, conversation_from_row, direct_pair, message_columns,
    optional_message_from_row, optional_user_from_row, user_columns,
};
use super::ChatStore;
use crate::models::{
    now, ts, Conversation, ConversationParticipant, ConversationSummary, ConversationType,
    ParticipantRole, ParticipantWithUser, EPOCH,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row};
use uuid::Uuid;

impl ChatStore {
    pub async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>("SELECT * FROM conversation WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// The direct conversation between `a` and `b`, whichever order they come in.
    pub async fn find_direct_conversation(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let (lo, hi) = direct_pair(a, b);
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversation WHERE direct_user_lo = ? AND direct_user_hi = ?",
        )
        .bind(lo)
        .bind(hi)
        .fetch_optional(&self.pool)
        .await
    }

    /// Create the direct conversation for the pair with both participants, or
    /// return the existing one. Racing callers converge on the same row.
    pub async fn create_direct_conversation(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Conversation, sqlx::Error> {
        let (lo, hi) = direct_pair(a, b);
        let at = ts(&now());
        let id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO conversation (id, type, direct_user_lo, direct_user_hi, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(direct_user_lo, direct_user_hi) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(ConversationType::Direct)
        .bind(lo)
        .bind(hi)
        .bind(&at)
        .bind(&at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 1 {
            for user_id in [a, b] {
                sqlx::query(
                    r#"
                    INSERT INTO conversation_participant (id, conversation_id, user_id, role, is_muted, joined_at)
                    VALUES (?, ?, ?, ?, 0, ?)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&id)
                .bind(user_id)
                .bind(ParticipantRole::Member)
                .bind(&at)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;

        self.find_direct_conversation(a, b)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_participant(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<ConversationParticipant>, sqlx::Error> {
        sqlx::query_as::<_, ConversationParticipant>(
            "SELECT * FROM conversation_participant WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_participants(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationParticipant>, sqlx::Error> {
        sqlx::query_as::<_, ConversationParticipant>(
            "SELECT * FROM conversation_participant WHERE conversation_id = ? ORDER BY joined_at",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Participants joined with their public profiles.
    pub async fn participants_with_users(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ParticipantWithUser>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT p.*, {user}
            FROM conversation_participant p
            JOIN user u ON u.id = p.user_id
            WHERE p.conversation_id = ?
            ORDER BY p.joined_at
            "#,
            user = user_columns("u", "u_"),
        );
        let rows = sqlx::query(&sql)
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let participant = ConversationParticipant::from_row(row)?;
            if let Some(user) = optional_user_from_row(row, "u_")? {
                out.push(ParticipantWithUser { participant, user });
            }
        }
        Ok(out)
    }

    /// The first participant of the conversation who is not `user_id`.
    pub async fn other_participant_id(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT user_id FROM conversation_participant
            WHERE conversation_id = ? AND user_id != ?
            ORDER BY joined_at
            LIMIT 1
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    pub async fn touch_last_message(
        &self,
        conversation_id: &str,
        at: &DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE conversation SET last_message_at = ?, updated_at = ? WHERE id = ?")
            .bind(ts(at))
            .bind(ts(&now()))
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_read(
        &self,
        conversation_id: &str,
        user_id: &str,
        at: &DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE conversation_participant SET last_read_at = ? WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(ts(at))
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_conversations(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversation_participant WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    /// One page of the user's conversations, most recently active first, each
    /// with its latest message, the user's unread count and (for direct
    /// conversations) the other participant. A single statement per page.
    ///
    /// Conversations without any message sort after all active ones, newest
    /// created first.
    pub async fn list_conversation_summaries(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationSummary>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {conversation}, {message}, {other},
                (SELECT COUNT(*) FROM message um
                  WHERE um.conversation_id = c.id
                    AND um.sender_id != p.user_id
                    AND um.created_at > COALESCE(p.last_read_at, ?)) AS unread_count
            FROM conversation_participant p
            JOIN conversation c ON c.id = p.conversation_id
            LEFT JOIN message lm ON lm.id = (
                SELECT id FROM message
                WHERE conversation_id = c.id
                ORDER BY created_at DESC, rowid DESC
                LIMIT 1
            )
            LEFT JOIN conversation_participant op
              ON op.conversation_id = c.id AND op.user_id != p.user_id AND c.type = ?
            LEFT JOIN user ou ON ou.id = op.user_id
            WHERE p.user_id = ?
            ORDER BY c.last_message_at IS NULL, c.last_message_at DESC, c.created_at DESC
            LIMIT ? OFFSET ?
            "#,
            conversation = conversation_columns("c", "c_"),
            message = message_columns("lm", "m_"),
            other = user_columns("ou", "o_"),
        );

        let rows = sqlx::query(&sql)
            .bind(EPOCH)
            .bind(ConversationType::Direct)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ConversationSummary {
                    conversation: conversation_from_row(row, "c_")?,
                    last_message: optional_message_from_row(row, "m_")?,
                    unread_count: row.try_get("unread_count")?,
                    other_participant: optional_user_from_row(row, "o_")?,
                })
            })
            .collect()
    }
}
