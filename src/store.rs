//! Session persistence keyed by chat id.
//!
//! The store is the single source of truth for conversation state: read on
//! every incoming update, written on every mutation. Both implementations
//! give read-your-writes within one dispatch. The Postgres store keeps the
//! session as a JSON blob so the schema never chases the model.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::BotResult;
use crate::models::Session;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, chat_id: i64) -> BotResult<Option<Session>>;

    /// Replaces the stored session wholesale; `None` clears it.
    async fn set(&self, chat_id: i64, session: Option<Session>) -> BotResult<()>;
}

/// Process-local store, used in tests and when no database is configured.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, chat_id: i64) -> BotResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&chat_id).cloned())
    }

    async fn set(&self, chat_id: i64, session: Option<Session>) -> BotResult<()> {
        let mut sessions = self.sessions.write().await;
        match session {
            Some(session) => {
                sessions.insert(chat_id, session);
            }
            None => {
                sessions.remove(&chat_id);
            }
        }
        Ok(())
    }
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Initialize the sessions table.
pub async fn init_schema(pool: &PgPool) -> BotResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sessions (
            chat_id BIGINT PRIMARY KEY,
            data TEXT NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, chat_id: i64) -> BotResult<Option<Session>> {
        let row = sqlx::query("SELECT data FROM sessions WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let data: String = row.get("data");
                let session = serde_json::from_str(&data)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, chat_id: i64, session: Option<Session>) -> BotResult<()> {
        match session {
            Some(session) => {
                let data = serde_json::to_string(&session)?;
                debug!(chat_id, "Writing session");
                sqlx::query(
                    "INSERT INTO sessions (chat_id, data, updated_at)
                     VALUES ($1, $2, now())
                     ON CONFLICT (chat_id)
                     DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
                )
                .bind(chat_id)
                .bind(data)
                .execute(&self.pool)
                .await?;
            }
            None => {
                debug!(chat_id, "Clearing session");
                sqlx::query("DELETE FROM sessions WHERE chat_id = $1")
                    .bind(chat_id)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }
}
