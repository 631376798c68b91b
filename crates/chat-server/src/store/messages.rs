use super::rows::{conversation_columns, conversation_from_row, user_columns, user_from_row};
use super::ChatStore;
use crate::models::{ts, Message, MessageSearchResult, MessageWithSender, EPOCH};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

impl ChatStore {
    pub async fn insert_message(&self, message: &Message) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO message
                (id, conversation_id, sender_id, content, content_folded, type, metadata,
                 reply_to_message_id, delivered_at, edited_at, is_edited, deleted_at,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.sender_id)
        .bind(&message.content)
        .bind(message.content.to_lowercase())
        .bind(message.kind)
        .bind(&message.metadata)
        .bind(&message.reply_to_message_id)
        .bind(message.delivered_at.as_ref().map(ts))
        .bind(message.edited_at.as_ref().map(ts))
        .bind(message.is_edited)
        .bind(message.deleted_at.as_ref().map(ts))
        .bind(ts(&message.created_at))
        .bind(ts(&message.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_message(&self, id: &str) -> Result<Option<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>("SELECT * FROM message WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Up to `limit` messages of a conversation created strictly before
    /// `before`, returned oldest first.
    pub async fn messages_page(
        &self,
        conversation_id: &str,
        limit: i64,
        before: Option<&DateTime<Utc>>,
    ) -> Result<Vec<MessageWithSender>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT m.*, {sender}
            FROM message m
            JOIN user s ON s.id = m.sender_id
            WHERE m.conversation_id = ?
              AND (? IS NULL OR m.created_at < ?)
            ORDER BY m.created_at DESC, m.rowid DESC
            LIMIT ?
            "#,
            sender = user_columns("s", "s_"),
        );
        let before = before.map(ts);
        let rows = sqlx::query(&sql)
            .bind(conversation_id)
            .bind(&before)
            .bind(&before)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut page = rows
            .iter()
            .map(|row| {
                Ok(MessageWithSender {
                    message: Message::from_row(row)?,
                    sender: user_from_row(row, "s_")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        page.reverse();
        Ok(page)
    }

    /// Messages from others newer than the user's read marker, summed over
    /// every conversation the user is in.
    pub async fn unread_total(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(m.id)
            FROM conversation_participant p
            JOIN message m
              ON m.conversation_id = p.conversation_id
             AND m.sender_id != p.user_id
             AND m.created_at > COALESCE(p.last_read_at, ?)
            WHERE p.user_id = ?
            "#,
        )
        .bind(EPOCH)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Messages whose content matches `%query%` in conversations the user
    /// participates in, newest first. Matching runs on the Unicode lower-cased
    /// copy of the content, so it ignores case beyond ASCII.
    pub async fn search_messages(
        &self,
        user_id: &str,
        query: &str,
        limit: i64,
    ) -> Result<Vec<MessageSearchResult>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT m.*, {sender}, {conversation}
            FROM message m
            JOIN conversation_participant p
              ON p.conversation_id = m.conversation_id AND p.user_id = ?
            JOIN user s ON s.id = m.sender_id
            JOIN conversation c ON c.id = m.conversation_id
            WHERE m.content_folded LIKE ?
            ORDER BY m.created_at DESC, m.rowid DESC
            LIMIT ?
            "#,
            sender = user_columns("s", "s_"),
            conversation = conversation_columns("c", "c_"),
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(format!("%{}%", query.to_lowercase()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let message = Message::from_row(row)?;
                Ok(MessageSearchResult {
                    matched_text: message.content.clone(),
                    sender: user_from_row(row, "s_")?,
                    conversation: conversation_from_row(row, "c_")?,
                    message,
                })
            })
            .collect()
    }
}
