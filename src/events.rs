//! Named event channel connecting session, directory and storage.
//!
//! The bus is an injected object, not a process global: components hold a
//! clone and never reference each other directly. Dispatch is fire-and-forget
//! over a tokio broadcast channel, so only receivers subscribed at publish
//! time see an event; late subscribers hydrate from the store instead.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::core::message::{ConversationId, Message};
use crate::directory::ConversationDirectory;
use crate::session::ChatSession;
use crate::storage::ConversationStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A session sent its first message and minted a conversation.
    ConversationCreated {
        id: ConversationId,
        title: String,
    },
    /// The user picked a conversation in the directory.
    ConversationSelected {
        id: ConversationId,
    },
    /// The user asked for a fresh, unstarted session.
    NewChatRequested,
    /// A session's message log changed; carries the full current log.
    LogChanged {
        id: ConversationId,
        messages: Vec<Message>,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish to everyone currently subscribed. Having no subscribers is
    /// not an error.
    pub fn publish(&self, event: Event) {
        tracing::trace!("[EventBus] {:?}", event);
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

/// Applies store-side effects of bus traffic on a single task so writes land
/// in event-arrival order: conversation creation goes through the directory,
/// every log change is persisted whole-record.
pub fn spawn_store_writer(
    bus: &EventBus,
    directory: Arc<ConversationDirectory>,
    store: Arc<dyn ConversationStore>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event @ Event::ConversationCreated { .. }) => {
                    directory.handle_event(event).await;
                }
                Ok(Event::LogChanged { id, messages }) => {
                    if let Err(err) = store.save_messages(id, &messages).await {
                        tracing::warn!(
                            "[StoreWriter] Failed to persist conversation '{}': {:#}",
                            id,
                            err
                        );
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Each LogChanged carries the full log, so the next one
                    // restores whatever a lag skipped.
                    tracing::warn!("[StoreWriter] Lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Feeds bus events into a session: new-chat resets and selections.
pub fn spawn_session_feed(bus: &EventBus, session: Arc<ChatSession>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => session.handle_event(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("[SessionFeed] Lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
