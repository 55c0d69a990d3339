//! Ordered conversation summary list mediating between session and store.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::core::message::{ConversationId, ConversationSummary};
use crate::events::{Event, EventBus};
use crate::storage::ConversationStore;

/// The selector list shown to the user: `{id, title}` per conversation,
/// insertion-ordered with the newest last. Entries are never reordered or
/// retitled after creation.
pub struct ConversationDirectory {
    entries: RwLock<Vec<ConversationSummary>>,
    store: Arc<dyn ConversationStore>,
    bus: EventBus,
}

impl ConversationDirectory {
    pub fn new(store: Arc<dyn ConversationStore>, bus: EventBus) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            store,
            bus,
        }
    }

    /// Rebuild the summary list from persisted records. Called on startup;
    /// the bus only carries events from then on.
    pub async fn hydrate(&self) -> Result<()> {
        let records = self.store.load_all().await?;
        let mut entries = self.entries.write().await;
        *entries = records.iter().map(ConversationSummary::from).collect();
        tracing::debug!(
            "[ConversationDirectory] Hydrated {} conversations",
            entries.len()
        );
        Ok(())
    }

    /// Append the summary for a freshly created conversation and persist the
    /// new record.
    pub async fn handle_event(&self, event: Event) {
        if let Event::ConversationCreated { id, title } = event {
            self.entries.write().await.push(ConversationSummary {
                id,
                title: title.clone(),
            });
            if let Err(err) = self.store.create(id, &title).await {
                tracing::warn!(
                    "[ConversationDirectory] Failed to persist conversation '{}': {:#}",
                    id,
                    err
                );
            }
        }
    }

    /// Re-emit a selection for the session to consume. The directory never
    /// mutates the session directly. Unknown ids are a logged no-op.
    pub async fn select(&self, id: ConversationId) {
        let known = self.entries.read().await.iter().any(|entry| entry.id == id);
        if !known {
            tracing::warn!(
                "[ConversationDirectory] Ignoring select for unknown conversation '{}'",
                id
            );
            return;
        }
        self.bus.publish(Event::ConversationSelected { id });
    }

    pub async fn summaries(&self) -> Vec<ConversationSummary> {
        self.entries.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn directory_with_store() -> (ConversationDirectory, Arc<MemoryStore>, EventBus) {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new(16);
        let directory = ConversationDirectory::new(store.clone(), bus.clone());
        (directory, store, bus)
    }

    #[tokio::test]
    async fn created_event_appends_summary_and_persists_record() {
        let (directory, store, _bus) = directory_with_store();
        let id = ConversationId::new(1);

        directory
            .handle_event(Event::ConversationCreated {
                id,
                title: "Hello".to_string(),
            })
            .await;

        let summaries = directory.summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Hello");

        let record = store.load(id).await.unwrap().unwrap();
        assert_eq!(record.title, "Hello");
        assert!(record.messages.is_empty());
    }

    #[tokio::test]
    async fn summaries_keep_insertion_order_newest_last() {
        let (directory, _store, _bus) = directory_with_store();

        for (raw, title) in [(1, "first"), (2, "second"), (3, "third")] {
            directory
                .handle_event(Event::ConversationCreated {
                    id: ConversationId::new(raw),
                    title: title.to_string(),
                })
                .await;
        }

        let titles: Vec<String> = directory
            .summaries()
            .await
            .into_iter()
            .map(|summary| summary.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn hydrate_projects_summaries_from_the_store() {
        let (directory, store, _bus) = directory_with_store();
        store.create(ConversationId::new(2), "older").await.unwrap();
        store.create(ConversationId::new(5), "newer").await.unwrap();

        directory.hydrate().await.unwrap();

        let summaries = directory.summaries().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].title, "older");
        assert_eq!(summaries[1].title, "newer");
    }

    #[tokio::test]
    async fn select_reemits_for_known_conversations_only() {
        let (directory, _store, bus) = directory_with_store();
        let mut rx = bus.subscribe();
        let id = ConversationId::new(4);

        directory
            .handle_event(Event::ConversationCreated {
                id,
                title: "known".to_string(),
            })
            .await;

        directory.select(ConversationId::new(99)).await;
        directory.select(id).await;

        assert_eq!(rx.recv().await.unwrap(), Event::ConversationSelected { id });
        assert!(rx.try_recv().is_err());
    }
}
