//! In-memory conversation store.
//!
//! Data lives in a HashMap behind an async RwLock and is lost when the
//! process exits. Used in tests and for `--ephemeral` runs.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ConversationStore;
use crate::core::message::{ConversationId, ConversationRecord, Message};

pub struct MemoryStore {
    records: Arc<RwLock<HashMap<ConversationId, ConversationRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create(&self, id: ConversationId, title: &str) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(id, ConversationRecord::new(id, title));
        tracing::debug!("[MemoryStore] Created conversation '{}' ('{}')", id, title);
        Ok(())
    }

    async fn load(&self, id: ConversationId) -> Result<Option<ConversationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<ConversationRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<ConversationRecord> = records.values().cloned().collect();
        all.sort_by_key(|record| record.id);
        tracing::debug!("[MemoryStore] Listed {} conversations", all.len());
        Ok(all)
    }

    async fn save_messages(&self, id: ConversationId, messages: &[Message]) -> Result<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) => {
                record.messages = messages.to_vec();
                tracing::debug!(
                    "[MemoryStore] Saved {} messages for conversation '{}'",
                    messages.len(),
                    id
                );
            }
            None => {
                tracing::debug!("[MemoryStore] Ignoring save for unknown conversation '{}'", id);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: ConversationId) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&id);
        tracing::debug!("[MemoryStore] Deleted conversation '{}'", id);
        Ok(())
    }

    async fn exists(&self, id: ConversationId) -> Result<bool> {
        let records = self.records.read().await;
        Ok(records.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_save_and_load_round_trip() {
        let store = MemoryStore::new();
        let id = ConversationId::new(1);
        let messages = vec![Message::user("Hello"), Message::assistant("Hi there")];

        store.create(id, "Hello").await.unwrap();
        store.save_messages(id, &messages).await.unwrap();

        let record = store.load(id).await.unwrap().unwrap();
        assert_eq!(record.title, "Hello");
        assert_eq!(record.messages, messages);
    }

    #[tokio::test]
    async fn load_unknown_conversation_is_none() {
        let store = MemoryStore::new();
        assert!(store.load(ConversationId::new(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_against_unknown_id_is_a_silent_noop() {
        let store = MemoryStore::new();
        let messages = vec![Message::user("orphan")];

        store
            .save_messages(ConversationId::new(7), &messages)
            .await
            .unwrap();

        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_all_orders_by_creation() {
        let store = MemoryStore::new();
        store.create(ConversationId::new(3), "third").await.unwrap();
        store.create(ConversationId::new(1), "first").await.unwrap();
        store.create(ConversationId::new(2), "second").await.unwrap();

        let all = store.load_all().await.unwrap();
        let titles: Vec<&str> = all.iter().map(|record| record.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let store = MemoryStore::new();
        let id = ConversationId::new(1);

        store.create(id, "temp").await.unwrap();
        assert!(store.exists(id).await.unwrap());

        store.delete(id).await.unwrap();
        assert!(!store.exists(id).await.unwrap());
    }
}
