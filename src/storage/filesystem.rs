//! File-backed conversation store.
//!
//! Each conversation is one pretty-printed JSON file named
//! `{base_path}/{id}.json` holding the full record. Saves replace the whole
//! file, matching the whole-record-replace persistence contract.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use super::ConversationStore;
use crate::core::message::{ConversationId, ConversationRecord, Message};

pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)
            .await
            .context("Failed to create conversation storage directory")?;

        Ok(Self { base_path })
    }

    fn record_path(&self, id: ConversationId) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    async fn write_record(&self, record: &ConversationRecord) -> Result<()> {
        let path = self.record_path(record.id);
        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize conversation record")?;

        fs::write(&path, json)
            .await
            .context(format!("Failed to write conversation file: {:?}", path))?;
        Ok(())
    }

    async fn read_record(&self, id: ConversationId) -> Result<Option<ConversationRecord>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .context(format!("Failed to read conversation file: {:?}", path))?;

        let record: ConversationRecord =
            serde_json::from_str(&json).context("Failed to deserialize conversation record")?;
        Ok(Some(record))
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn create(&self, id: ConversationId, title: &str) -> Result<()> {
        self.write_record(&ConversationRecord::new(id, title)).await?;
        tracing::debug!("[FileStore] Created conversation '{}' ('{}')", id, title);
        Ok(())
    }

    async fn load(&self, id: ConversationId) -> Result<Option<ConversationRecord>> {
        let record = self.read_record(id).await?;
        if record.is_none() {
            tracing::debug!("[FileStore] Conversation '{}' does not exist", id);
        }
        Ok(record)
    }

    async fn load_all(&self) -> Result<Vec<ConversationRecord>> {
        let mut all = Vec::new();
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .context("Failed to read conversation storage directory")?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let json = fs::read_to_string(&path)
                .await
                .context(format!("Failed to read conversation file: {:?}", path))?;

            match serde_json::from_str::<ConversationRecord>(&json) {
                Ok(record) => all.push(record),
                Err(err) => {
                    tracing::warn!("[FileStore] Skipping unreadable file {:?}: {}", path, err);
                }
            }
        }

        all.sort_by_key(|record| record.id);
        tracing::debug!("[FileStore] Listed {} conversations", all.len());
        Ok(all)
    }

    async fn save_messages(&self, id: ConversationId, messages: &[Message]) -> Result<()> {
        match self.read_record(id).await? {
            Some(mut record) => {
                record.messages = messages.to_vec();
                self.write_record(&record).await?;
                tracing::debug!(
                    "[FileStore] Saved {} messages for conversation '{}'",
                    messages.len(),
                    id
                );
            }
            None => {
                tracing::debug!("[FileStore] Ignoring save for unknown conversation '{}'", id);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: ConversationId) -> Result<()> {
        let path = self.record_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .context(format!("Failed to delete conversation file: {:?}", path))?;
            tracing::debug!("[FileStore] Deleted conversation '{}'", id);
        }
        Ok(())
    }

    async fn exists(&self, id: ConversationId) -> Result<bool> {
        Ok(self.record_path(id).exists())
    }
}
