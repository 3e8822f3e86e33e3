//! PostgreSQL store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{ChatStore, StoreError};
use crate::models::{StoredMessage, UserContext};
use crate::uuid::uuidv7;

/// Store backed by the `messages` and `user_contexts` tables.
#[derive(Debug, Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn record_message(&self, sender: &str, text: &str) -> Result<StoredMessage, StoreError> {
        let row = sqlx::query_as::<_, StoredMessage>(
            r#"
            INSERT INTO messages (id, sender, message)
            VALUES ($1, $2, $3)
            RETURNING id, sender, message AS text, created_at
            "#,
        )
        .bind(uuidv7())
        .bind(sender)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;
        debug!(id = %row.id, sender, "recorded message");
        Ok(row)
    }

    async fn history(&self, limit: Option<i64>) -> Result<Vec<StoredMessage>, StoreError> {
        // LIMIT NULL means no limit.
        let rows = sqlx::query_as::<_, StoredMessage>(
            r#"
            SELECT id, sender, text, created_at FROM (
                SELECT id, sender, message AS text, created_at
                FROM messages
                ORDER BY created_at DESC, id DESC
                LIMIT $1
            ) recent
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn load_context(&self, user_id: &str) -> Result<Option<UserContext>, StoreError> {
        let row = sqlx::query_as::<_, UserContext>(
            "SELECT user_id, context FROM user_contexts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn append_context(
        &self,
        user_id: &str,
        fragment: &str,
    ) -> Result<UserContext, StoreError> {
        let row = sqlx::query_as::<_, UserContext>(
            r#"
            INSERT INTO user_contexts (user_id, context)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET context = user_contexts.context || EXCLUDED.context,
                updated_at = now()
            RETURNING user_id, context
            "#,
        )
        .bind(user_id)
        .bind(fragment)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn replace_context(
        &self,
        user_id: &str,
        context: &str,
    ) -> Result<UserContext, StoreError> {
        let row = sqlx::query_as::<_, UserContext>(
            r#"
            INSERT INTO user_contexts (user_id, context)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET context = EXCLUDED.context,
                updated_at = now()
            RETURNING user_id, context
            "#,
        )
        .bind(user_id)
        .bind(context)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
