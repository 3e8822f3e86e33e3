//! Message log and context persistence.
//!
//! [`ChatStore`] is the seam between the chat flow and the database.
//! [`postgres::PgChatStore`] is the production backend;
//! [`memory::MemoryChatStore`] backs tests and the `--memory-store` mode.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{StoredMessage, UserContext};

pub use memory::MemoryChatStore;
pub use postgres::PgChatStore;

/// Errors returned by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence operations used by a chat turn.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Append a message to the log.
    async fn record_message(&self, sender: &str, text: &str) -> Result<StoredMessage, StoreError>;

    /// Logged messages, oldest first. With a limit, only the most recent
    /// `limit` messages are returned (still oldest first).
    async fn history(&self, limit: Option<i64>) -> Result<Vec<StoredMessage>, StoreError>;

    /// Current context for a user, if any turn has been recorded.
    async fn load_context(&self, user_id: &str) -> Result<Option<UserContext>, StoreError>;

    /// Append `fragment` to the user's context in one atomic update,
    /// creating the row if needed. Returns the updated context.
    async fn append_context(&self, user_id: &str, fragment: &str)
    -> Result<UserContext, StoreError>;

    /// Overwrite the user's context.
    ///
    /// A read-modify-write built on this loses concurrent updates (last
    /// write wins). The chat flow uses [`ChatStore::append_context`].
    async fn replace_context(&self, user_id: &str, context: &str)
    -> Result<UserContext, StoreError>;

    /// Whether the backend is reachable.
    async fn ping(&self) -> bool;
}

/// Format messages as `sender: text` lines.
pub fn render_history(messages: &[StoredMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::uuid::uuidv7;

    fn message(sender: &str, text: &str) -> StoredMessage {
        StoredMessage {
            id: uuidv7(),
            sender: sender.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn render_history_keeps_order() {
        let rendered = render_history(&[
            message("user", "hello"),
            message("Ostwald", "hi there"),
            message("user", "bye"),
        ]);
        assert_eq!(rendered, "user: hello\nOstwald: hi there\nuser: bye");
    }

    #[test]
    fn render_history_empty() {
        assert_eq!(render_history(&[]), "");
    }
}
