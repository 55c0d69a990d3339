//! colloquy - conversation-state core for LLM chat clients
//!
//! Provides the pieces a chat frontend needs to keep a chat window, a
//! conversation list and persistent storage consistent: a [`ChatSession`]
//! owning the active message log and its single in-flight completion
//! request, a [`ConversationDirectory`] of selectable summaries, a pluggable
//! [`storage::ConversationStore`], and an [`EventBus`] connecting them
//! without direct references.

pub mod cli;
mod config;
pub mod core;
pub mod directory;
pub mod events;
pub mod session;
pub mod storage;
pub mod utils;

pub use crate::config::{LlmConfig, Settings};
pub use crate::core::completion::{CompletionClient, HttpCompletionClient};
pub use crate::core::error::{CompletionError, SessionError};
pub use crate::core::message::{
    derive_title, ConversationId, ConversationRecord, ConversationSummary, Message, MessageStatus,
    Sender,
};
pub use crate::directory::ConversationDirectory;
pub use crate::events::{Event, EventBus};
pub use crate::session::ChatSession;
pub use crate::storage::{ConversationStore, FileStore, MemoryStore};
