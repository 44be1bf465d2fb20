//! TOML implementation of `MessageRepository`.
//!
//! One file per session under `base_dir`, holding that session's whole
//! message history. Appends and status updates go through the atomic
//! file's locked read-modify-write.

use crate::dto::{MessageHistoryV1, StoredMessageV1};
use crate::storage::AtomicTomlFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use voxcode_core::session::{MessageRepository, MessageStatus, SessionMessage};

pub struct TomlMessageRepository {
    base_dir: PathBuf,
}

impl TomlMessageRepository {
    /// Creates a repository rooted at `base_dir`, creating the directory
    /// if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).context("Failed to create messages directory")?;
        Ok(Self { base_dir })
    }

    fn file_for(&self, session_id: &str) -> AtomicTomlFile<MessageHistoryV1> {
        AtomicTomlFile::new(self.base_dir.join(format!("{}.toml", session_id)))
    }
}

#[async_trait]
impl MessageRepository for TomlMessageRepository {
    async fn append(&self, message: &SessionMessage) -> Result<()> {
        let dto = StoredMessageV1::from(message);
        self.file_for(&message.session_id)
            .update(MessageHistoryV1::empty(), |history| {
                history.messages.push(dto.clone());
                Ok(())
            })
            .context("Failed to append message")
    }

    async fn list_for_session(&self, session_id: &str) -> Result<Vec<SessionMessage>> {
        let history = self
            .file_for(session_id)
            .load()
            .context("Failed to load message history")?
            .unwrap_or_else(MessageHistoryV1::empty);

        let mut messages: Vec<SessionMessage> = history
            .messages
            .into_iter()
            .map(SessionMessage::from)
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(messages)
    }

    async fn update_status(
        &self,
        session_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<bool> {
        let mut updated = false;
        self.file_for(session_id)
            .update(MessageHistoryV1::empty(), |history| {
                if let Some(message) = history.messages.iter_mut().find(|m| m.id == message_id) {
                    message.status = status;
                    updated = true;
                }
                Ok(())
            })
            .context("Failed to update message status")?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use voxcode_core::session::MessageRole;

    #[tokio::test]
    async fn test_append_and_list_in_timestamp_order() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlMessageRepository::new(temp_dir.path()).unwrap();

        let first = SessionMessage::new("s-1", MessageRole::User, "first");
        let mut second = SessionMessage::new("s-1", MessageRole::Assistant, "second");
        second.timestamp = first.timestamp + chrono::Duration::seconds(5);

        // Append out of order; listing sorts by timestamp.
        repository.append(&second).await.unwrap();
        repository.append(&first).await.unwrap();

        let messages = repository.list_for_session("s-1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "first");
        assert_eq!(messages[1].text, "second");
    }

    #[tokio::test]
    async fn test_list_empty_session() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlMessageRepository::new(temp_dir.path()).unwrap();
        assert!(repository.list_for_session("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlMessageRepository::new(temp_dir.path()).unwrap();

        let message = SessionMessage::new("s-1", MessageRole::User, "hello");
        repository.append(&message).await.unwrap();

        let updated = repository
            .update_status("s-1", &message.id, MessageStatus::Confirmed)
            .await
            .unwrap();
        assert!(updated);

        let messages = repository.list_for_session("s-1").await.unwrap();
        assert_eq!(messages[0].status, MessageStatus::Confirmed);

        let missing = repository
            .update_status("s-1", "no-such-id", MessageStatus::Error)
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let repository = TomlMessageRepository::new(temp_dir.path()).unwrap();

        repository
            .append(&SessionMessage::new("a", MessageRole::User, "for a"))
            .await
            .unwrap();
        repository
            .append(&SessionMessage::new("b", MessageRole::User, "for b"))
            .await
            .unwrap();

        assert_eq!(repository.list_for_session("a").await.unwrap().len(), 1);
        assert_eq!(repository.list_for_session("b").await.unwrap().len(), 1);
    }
}
