//! TOML file-per-record implementation of `OverrideRepository`.

use crate::dto::SessionOverrideV1;
use crate::storage::AtomicTomlFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use voxcode_core::session::{OverrideRepository, UserSessionOverride};

pub struct TomlOverrideRepository {
    base_dir: PathBuf,
}

impl TomlOverrideRepository {
    /// Creates a repository rooted at `base_dir`, creating the directory
    /// if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).context("Failed to create overrides directory")?;
        Ok(Self { base_dir })
    }

    fn file_for(&self, session_id: &str) -> AtomicTomlFile<SessionOverrideV1> {
        AtomicTomlFile::new(self.base_dir.join(format!("{}.toml", session_id)))
    }
}

#[async_trait]
impl OverrideRepository for TomlOverrideRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<UserSessionOverride>> {
        let dto = self
            .file_for(session_id)
            .load()
            .context("Failed to load override")?;
        Ok(dto.map(UserSessionOverride::from))
    }

    async fn save(&self, override_record: &UserSessionOverride) -> Result<()> {
        self.file_for(&override_record.id)
            .save(&SessionOverrideV1::from(override_record))
            .context("Failed to save override")
    }

    async fn list_all(&self) -> Result<Vec<UserSessionOverride>> {
        let mut records = Vec::new();
        let entries = fs::read_dir(&self.base_dir).context("Failed to read overrides directory")?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match AtomicTomlFile::<SessionOverrideV1>::new(path.clone()).load() {
                Ok(Some(dto)) => records.push(UserSessionOverride::from(dto)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping unreadable override file {:?}: {}", path, e);
                }
            }
        }
        Ok(records)
    }
}
