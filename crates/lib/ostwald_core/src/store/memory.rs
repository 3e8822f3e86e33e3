//! In-memory store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ChatStore, StoreError};
use crate::models::{StoredMessage, UserContext};
use crate::uuid::uuidv7;

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryChatStore {
    messages: RwLock<Vec<StoredMessage>>,
    contexts: RwLock<HashMap<String, String>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn record_message(&self, sender: &str, text: &str) -> Result<StoredMessage, StoreError> {
        let message = StoredMessage {
            id: uuidv7(),
            sender: sender.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn history(&self, limit: Option<i64>) -> Result<Vec<StoredMessage>, StoreError> {
        let messages = self.messages.read().await;
        let skip = match limit {
            Some(n) => messages.len().saturating_sub(n.max(0) as usize),
            None => 0,
        };
        Ok(messages[skip..].to_vec())
    }

    async fn load_context(&self, user_id: &str) -> Result<Option<UserContext>, StoreError> {
        Ok(self
            .contexts
            .read()
            .await
            .get(user_id)
            .map(|context| UserContext {
                user_id: user_id.to_string(),
                context: context.clone(),
            }))
    }

    async fn append_context(
        &self,
        user_id: &str,
        fragment: &str,
    ) -> Result<UserContext, StoreError> {
        let mut contexts = self.contexts.write().await;
        let context = contexts.entry(user_id.to_string()).or_default();
        context.push_str(fragment);
        Ok(UserContext {
            user_id: user_id.to_string(),
            context: context.clone(),
        })
    }

    async fn replace_context(
        &self,
        user_id: &str,
        context: &str,
    ) -> Result<UserContext, StoreError> {
        self.contexts
            .write()
            .await
            .insert(user_id.to_string(), context.to_string());
        Ok(UserContext {
            user_id: user_id.to_string(),
            context: context.to_string(),
        })
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn history_is_chronological() {
        let store = MemoryChatStore::new();
        store.record_message("user", "one").await.unwrap();
        store.record_message("Ostwald", "two").await.unwrap();
        store.record_message("user", "three").await.unwrap();

        let all = store.history(None).await.unwrap();
        let texts: Vec<&str> = all.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);

        let recent = store.history(Some(2)).await.unwrap();
        let texts: Vec<&str> = recent.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["two", "three"]);
    }

    #[tokio::test]
    async fn append_creates_then_grows() {
        let store = MemoryChatStore::new();
        assert!(store.load_context("u").await.unwrap().is_none());

        store.append_context("u", " hello").await.unwrap();
        let ctx = store.append_context("u", " world").await.unwrap();
        assert_eq!(ctx.context, " hello world");
        assert_eq!(
            store.load_context("u").await.unwrap().unwrap().context,
            " hello world"
        );
    }

    #[tokio::test]
    async fn concurrent_appends_are_both_kept() {
        let store = Arc::new(MemoryChatStore::new());
        let a = tokio::spawn({
            let store = store.clone();
            async move { store.append_context("u", " a").await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.append_context("u", " b").await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let ctx = store.load_context("u").await.unwrap().unwrap().context;
        assert!(ctx == " a b" || ctx == " b a", "unexpected context: {ctx}");
    }

    // Known race: two read-modify-write updates that both read before either
    // writes keep only the last write.
    #[tokio::test]
    async fn read_modify_write_loses_an_update() {
        let store = MemoryChatStore::new();
        store.replace_context("u", "base").await.unwrap();

        let first_read = store.load_context("u").await.unwrap().unwrap().context;
        let second_read = store.load_context("u").await.unwrap().unwrap().context;

        store
            .replace_context("u", &format!("{first_read} first"))
            .await
            .unwrap();
        store
            .replace_context("u", &format!("{second_read} second"))
            .await
            .unwrap();

        let ctx = store.load_context("u").await.unwrap().unwrap().context;
        assert_eq!(ctx, "base second");
        assert!(!ctx.contains("first"));
    }
}
