//! Conversation persistence abstraction.
//!
//! Backends hide behind a trait so the session and directory run against an
//! in-memory map in tests and a JSON file tree in production without API
//! changes. Persistence is best-effort whole-record replace; there is no
//! transactionality beyond that.

use anyhow::Result;
use async_trait::async_trait;

use crate::core::message::{ConversationId, ConversationRecord, Message};

pub mod filesystem;
pub mod memory;

pub use filesystem::FileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert an empty record for a newly created conversation.
    async fn create(&self, id: ConversationId, title: &str) -> Result<()>;

    /// Load the full record for a conversation, or `None` if unknown.
    async fn load(&self, id: ConversationId) -> Result<Option<ConversationRecord>>;

    /// Load every stored record, ordered by creation (id ascending).
    async fn load_all(&self) -> Result<Vec<ConversationRecord>>;

    /// Replace the message log of an existing conversation. Saving against
    /// an unknown id is a silent no-op.
    async fn save_messages(&self, id: ConversationId, messages: &[Message]) -> Result<()>;

    /// Remove a conversation record.
    async fn delete(&self, id: ConversationId) -> Result<()>;

    /// Check whether a conversation exists.
    async fn exists(&self, id: ConversationId) -> Result<bool> {
        Ok(self.load(id).await?.is_some())
    }
}
