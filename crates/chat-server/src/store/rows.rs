//! Column lists and row mapping for joined queries, where the same column
//! name appears in more than one table and has to be aliased.

use crate::models::{Conversation, Message, PublicUser};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// The unordered pair `{a, b}` as `(lower, higher)`. Stored in two columns so
/// ids are never joined into one string.
pub(crate) fn direct_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

const USER_FIELDS: &[&str] = &[
    "id",
    "name",
    "username",
    "display_username",
    "image",
    "bio",
    "is_verified",
];

const CONVERSATION_FIELDS: &[&str] = &[
    "id",
    "type",
    "name",
    "description",
    "avatar_url",
    "last_message_at",
    "created_at",
    "updated_at",
];

const MESSAGE_FIELDS: &[&str] = &[
    "id",
    "conversation_id",
    "sender_id",
    "content",
    "type",
    "metadata",
    "reply_to_message_id",
    "delivered_at",
    "edited_at",
    "is_edited",
    "deleted_at",
    "created_at",
    "updated_at",
];

fn aliased(fields: &[&str], table: &str, prefix: &str) -> String {
    fields
        .iter()
        .map(|f| format!("{table}.{f} AS {prefix}{f}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn user_columns(table: &str, prefix: &str) -> String {
    aliased(USER_FIELDS, table, prefix)
}

pub(super) fn conversation_columns(table: &str, prefix: &str) -> String {
    aliased(CONVERSATION_FIELDS, table, prefix)
}

pub(super) fn message_columns(table: &str, prefix: &str) -> String {
    aliased(MESSAGE_FIELDS, table, prefix)
}

pub(super) fn user_from_row(row: &SqliteRow, prefix: &str) -> Result<PublicUser, sqlx::Error> {
    let col = |name: &str| format!("{prefix}{name}");
    Ok(PublicUser {
        id: row.try_get(col("id").as_str())?,
        name: row.try_get(col("name").as_str())?,
        username: row.try_get(col("username").as_str())?,
        display_username: row.try_get(col("display_username").as_str())?,
        image: row.try_get(col("image").as_str())?,
        bio: row.try_get(col("bio").as_str())?,
        is_verified: row.try_get(col("is_verified").as_str())?,
    })
}

/// `None` when a LEFT JOIN found no user.
pub(super) fn optional_user_from_row(
    row: &SqliteRow,
    prefix: &str,
) -> Result<Option<PublicUser>, sqlx::Error> {
    let id: Option<String> = row.try_get(format!("{prefix}id").as_str())?;
    match id {
        Some(_) => user_from_row(row, prefix).map(Some),
        None => Ok(None),
    }
}

pub(super) fn conversation_from_row(
    row: &SqliteRow,
    prefix: &str,
) -> Result<Conversation, sqlx::Error> {
    let col = |name: &str| format!("{prefix}{name}");
    Ok(Conversation {
        id: row.try_get(col("id").as_str())?,
        kind: row.try_get(col("type").as_str())?,
        name: row.try_get(col("name").as_str())?,
        description: row.try_get(col("description").as_str())?,
        avatar_url: row.try_get(col("avatar_url").as_str())?,
        last_message_at: row.try_get(col("last_message_at").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
        updated_at: row.try_get(col("updated_at").as_str())?,
    })
}

pub(super) fn message_from_row(row: &SqliteRow, prefix: &str) -> Result<Message, sqlx::Error> {
    let col = |name: &str| format!("{prefix}{name}");
    Ok(Message {
        id: row.try_get(col("id").as_str())?,
        conversation_id: row.try_get(col("conversation_id").as_str())?,
        sender_id: row.try_get(col("sender_id").as_str())?,
        content: row.try_get(col("content").as_str())?,
        kind: row.try_get(col("type").as_str())?,
        metadata: row.try_get(col("metadata").as_str())?,
        reply_to_message_id: row.try_get(col("reply_to_message_id").as_str())?,
        delivered_at: row.try_get(col("delivered_at").as_str())?,
        edited_at: row.try_get(col("edited_at").as_str())?,
        is_edited: row.try_get(col("is_edited").as_str())?,
        deleted_at: row.try_get(col("deleted_at").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
        updated_at: row.try_get(col("updated_at").as_str())?,
    })
}

/// `None` when a LEFT JOIN found no message.
pub(super) fn optional_message_from_row(
    row: &SqliteRow,
    prefix: &str,
) -> Result<Option<Message>, sqlx::Error> {
    let id: Option<String> = row.try_get(format!("{prefix}id").as_str())?;
    match id {
        Some(_) => message_from_row(row, prefix).map(Some),
        None => Ok(None),
    }
}
