//! Persisted records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One logged chat turn. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: Uuid,
    pub sender: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Accumulated context for one user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: String,
    pub context: String,
}
