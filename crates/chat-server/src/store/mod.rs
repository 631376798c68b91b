//! Relational store
//!
//! SQLite via sqlx. Every service call re-reads from here; nothing is cached
//! in memory. Tables are created on startup.

mod connections;
mod conversations;
mod messages;
mod presence;
mod rows;
mod users;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Handle to the chat database. Cheap to clone.
#[derive(Clone)]
pub struct ChatStore {
    pool: SqlitePool,
}

impl ChatStore {
    /// Open (creating if missing) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", url))?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("[Store] Opened {}", url);
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn init_schema(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Schema statement failed: {}", statement))?;
        }
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS user (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        username TEXT,
        display_username TEXT,
        image TEXT,
        bio TEXT,
        is_verified INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS connection (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        connected_user_id TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        status TEXT NOT NULL DEFAULT 'pending',
        requested_at TEXT NOT NULL,
        responded_at TEXT,
        expires_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS connection_user_id_idx ON connection(user_id)",
    "CREATE INDEX IF NOT EXISTS connection_connected_user_id_idx ON connection(connected_user_id)",
    "CREATE INDEX IF NOT EXISTS connection_status_idx ON connection(status)",
    r#"
    CREATE TABLE IF NOT EXISTS conversation (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL DEFAULT 'direct',
        direct_user_lo TEXT,
        direct_user_hi TEXT,
        name TEXT,
        description TEXT,
        avatar_url TEXT,
        last_message_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS conversation_direct_pair_idx ON conversation(direct_user_lo, direct_user_hi)",
    r#"
    CREATE TABLE IF NOT EXISTS conversation_participant (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL REFERENCES conversation(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        role TEXT NOT NULL DEFAULT 'member',
        last_read_at TEXT,
        is_muted INTEGER NOT NULL DEFAULT 0,
        joined_at TEXT NOT NULL,
        left_at TEXT,
        UNIQUE(conversation_id, user_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS conversation_participant_user_id_idx ON conversation_participant(user_id)",
    "CREATE INDEX IF NOT EXISTS conversation_participant_conversation_id_idx ON conversation_participant(conversation_id)",
    r#"
    CREATE TABLE IF NOT EXISTS message (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL REFERENCES conversation(id) ON DELETE CASCADE,
        sender_id TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        content_folded TEXT NOT NULL,
        type TEXT NOT NULL DEFAULT 'text',
        metadata TEXT,
        reply_to_message_id TEXT REFERENCES message(id) ON DELETE SET NULL,
        delivered_at TEXT,
        edited_at TEXT,
        is_edited INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS message_conversation_id_idx ON message(conversation_id)",
    "CREATE INDEX IF NOT EXISTS message_sender_id_idx ON message(sender_id)",
    "CREATE INDEX IF NOT EXISTS message_created_at_idx ON message(created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS user_presence (
        user_id TEXT PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
        status TEXT NOT NULL DEFAULT 'offline',
        last_seen_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];
