//! Core conversation data types shared by session, directory and storage.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Number of characters a derived title keeps before truncation.
pub const TITLE_MAX_CHARS: usize = 30;

/// Marker appended to truncated titles.
pub const TITLE_ELLIPSIS: &str = "...";

/// Stable identifier of a conversation: its creation time in Unix
/// milliseconds. Ordering by id is therefore creation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConversationId(pub u64);

impl ConversationId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Mint an id for a conversation created right now.
    pub fn mint() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Content is settled and never changes again.
    Final,
    /// Optimistic placeholder awaiting the real reply, replaced in place.
    Pending,
    /// The reply could not be fetched; text holds a fixed error notice.
    Error,
}

/// One entry in a conversation's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub status: MessageStatus,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            status: MessageStatus::Final,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            status: MessageStatus::Final,
        }
    }

    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            status: MessageStatus::Pending,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            status: MessageStatus::Error,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

/// The stored unit: everything known about one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
}

impl ConversationRecord {
    pub fn new(id: ConversationId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            messages: Vec::new(),
        }
    }
}

/// Directory entry: the projection of a record used for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
}

impl From<&ConversationRecord> for ConversationSummary {
    fn from(record: &ConversationRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
        }
    }
}

/// Derive a conversation title from its first user message: the text as-is
/// when short enough, otherwise the first [`TITLE_MAX_CHARS`] characters
/// followed by [`TITLE_ELLIPSIS`]. Counts characters, not bytes.
pub fn derive_title(text: &str) -> String {
    match text.char_indices().nth(TITLE_MAX_CHARS) {
        Some((boundary, _)) => format!("{}{}", &text[..boundary], TITLE_ELLIPSIS),
        None => text.to_string(),
    }
}
