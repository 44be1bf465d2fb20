//! Server-push reconciliation.
//!
//! `SessionSyncManager` is the single writer that merges server-pushed
//! session snapshots into the entity store. It overwrites only the
//! backend-authoritative fields; user overrides and queue membership are
//! locally owned and survive every reconcile. Sessions missing from a
//! snapshot are never deleted, so a partial or paginated push cannot wipe
//! out non-returned sessions.

use crate::error::Result;
use crate::session::{BackendSession, SoftDeleteManager, StoreEvent};
use crate::store::EntityStore;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// A session entry as pushed by the backend.
///
/// Only `id` is required; absent optional fields leave the cached value
/// untouched, so additive server-side fields stay compatible.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSessionDto {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub working_directory: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub message_count: Option<u32>,
    pub unread_count: Option<u32>,
    pub preview: Option<String>,
}

impl ServerSessionDto {
    /// Checks the entry for the fields reconciliation requires.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("missing session id".to_string());
        }
        Ok(())
    }

    /// Parses a JSON array payload into DTOs.
    pub fn parse_batch(payload: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Result of one reconciliation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Sessions created or updated.
    pub upserted: usize,
    /// Malformed entries skipped.
    pub skipped: usize,
}

/// Reconciles inbound server session snapshots against the entity store.
pub struct SessionSyncManager {
    store: Arc<EntityStore>,
    deleter: SoftDeleteManager,
}

impl SessionSyncManager {
    pub fn new(store: Arc<EntityStore>) -> Self {
        let deleter = SoftDeleteManager::new(store.clone());
        Self { store, deleter }
    }

    /// Applies a server-pushed session snapshot.
    ///
    /// The whole batch runs under the store's write gate, so overlapping
    /// reconcile calls apply in arrival order as atomic units and can
    /// never interleave with local mutations field-by-field. Existing
    /// records are matched with one batch read (no per-session query).
    ///
    /// Per entry: backend-authoritative fields are overwritten, overrides
    /// and queue fields are never touched, and a previously local session
    /// is adopted (`is_locally_created` flipped to false) on its first
    /// reconcile. Malformed entries are skipped with a warning; the rest
    /// of the batch still applies.
    pub async fn reconcile(&self, incoming: Vec<ServerSessionDto>) -> Result<ReconcileOutcome> {
        let _gate = self.store.lock_writes().await;

        let mut valid = Vec::with_capacity(incoming.len());
        let mut skipped = 0;
        for dto in incoming {
            match dto.validate() {
                Ok(()) => valid.push(dto),
                Err(reason) => {
                    tracing::warn!("Skipping malformed session entry: {}", reason);
                    skipped += 1;
                }
            }
        }

        let ids: Vec<String> = valid.iter().map(|dto| dto.id.clone()).collect();
        let mut existing = self.store.session_repository().find_by_ids(&ids).await?;

        let mut updates: Vec<BackendSession> = Vec::with_capacity(valid.len());
        for dto in valid {
            let mut session = existing
                .remove(&dto.id)
                .unwrap_or_else(|| BackendSession::new(dto.id.clone(), ""));

            if let Some(name) = dto.name {
                session.backend_name = name;
            }
            if let Some(working_directory) = dto.working_directory {
                session.working_directory = working_directory;
            }
            if let Some(last_modified) = dto.last_modified {
                session.last_modified = last_modified;
            }
            if let Some(message_count) = dto.message_count {
                session.message_count = message_count;
            }
            if let Some(unread_count) = dto.unread_count {
                session.unread_count = unread_count;
            }
            if let Some(preview) = dto.preview {
                session.preview = preview;
            }
            // First server mention of a locally created session adopts it.
            session.is_locally_created = false;

            updates.push(session);
        }

        let upserted = updates.len();
        self.store.session_repository().save_all(&updates).await?;

        self.store
            .emit(StoreEvent::SessionsReconciled { upserted, skipped });
        Ok(ReconcileOutcome { upserted, skipped })
    }

    /// Handles an explicit "session removed" server event.
    ///
    /// Applied as a local soft delete: the history stays cached and the
    /// session remains restorable, consistent with hard deletion being
    /// outside this client's surface.
    pub async fn handle_session_removed(&self, session_id: &str) -> Result<()> {
        self.deleter.soft_delete_session(session_id).await
    }
}
