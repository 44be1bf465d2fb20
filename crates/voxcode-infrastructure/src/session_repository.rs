//! TOML file-per-session implementation of `SessionRepository`.
//!
//! Directory layout:
//!
//! ```text
//! base_dir/
//! ├── <session-id-1>.toml
//! └── <session-id-2>.toml
//! ```

use crate::dto::CachedSessionV1;
use crate::storage::AtomicTomlFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use voxcode_core::session::{BackendSession, SessionRepository};

pub struct TomlSessionRepository {
    base_dir: PathBuf,
}

impl TomlSessionRepository {
    /// Creates a repository rooted at `base_dir`, creating the directory
    /// if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).context("Failed to create sessions directory")?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_for(&self, session_id: &str) -> AtomicTomlFile<CachedSessionV1> {
        AtomicTomlFile::new(self.base_dir.join(format!("{}.toml", session_id)))
    }
}

#[async_trait]
impl SessionRepository for TomlSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<BackendSession>> {
        let dto = self
            .file_for(session_id)
            .load()
            .context("Failed to load session")?;
        Ok(dto.map(BackendSession::from))
    }

    async fn find_by_ids(
        &self,
        session_ids: &[String],
    ) -> Result<HashMap<String, BackendSession>> {
        let mut found = HashMap::with_capacity(session_ids.len());
        for session_id in session_ids {
            if let Some(dto) = self
                .file_for(session_id)
                .load()
                .context("Failed to load session")?
            {
                found.insert(session_id.clone(), BackendSession::from(dto));
            }
        }
        Ok(found)
    }

    async fn save(&self, session: &BackendSession) -> Result<()> {
        self.file_for(&session.id)
            .save(&CachedSessionV1::from(session))
            .context("Failed to save session")
    }

    async fn save_all(&self, sessions: &[BackendSession]) -> Result<()> {
        for session in sessions {
            self.file_for(&session.id)
                .save(&CachedSessionV1::from(session))
                .with_context(|| format!("Failed to save session {}", session.id))?;
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<BackendSession>> {
        let mut sessions = Vec::new();
        let entries = fs::read_dir(&self.base_dir).context("Failed to read sessions directory")?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match AtomicTomlFile::<CachedSessionV1>::new(path.clone()).load() {
                Ok(Some(dto)) => sessions.push(BackendSession::from(dto)),
                Ok(None) => {}
                Err(e) => {
                    // A single unreadable file must not hide the rest of
                    // the cache.
                    tracing::warn!("Skipping unreadable session file {:?}: {}", path, e);
                }
            }
        }

        // Most recently modified first.
        sessions.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(sessions)
    }
}
