//! Soft delete and restore of sessions.
//!
//! A session's visibility is a reversible per-session state machine
//! (`Active` -> `Deleted` -> `Active`) layered over the backend record via
//! its `UserSessionOverride`. Deleting never destroys data; restoring
//! brings the session back with its custom name intact.

use super::event::StoreEvent;
use super::model::{BackendSession, UserSessionOverride};
use crate::error::Result;
use crate::store::EntityStore;
use std::sync::Arc;

/// Coordinates the soft-delete flag with priority queue membership.
pub struct SoftDeleteManager {
    store: Arc<EntityStore>,
}

impl SoftDeleteManager {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Soft-deletes a session.
    ///
    /// Ensures an override record exists (preserving any custom name),
    /// sets `is_user_deleted`, and removes the session from the priority
    /// queue as part of the same gated operation. Idempotent: repeated
    /// calls leave the same end state and never create duplicate override
    /// records. The advisory `SessionDeleted` event fires on every call.
    /// Silent no-op for an unknown session id.
    pub async fn soft_delete_session(&self, session_id: &str) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let Some(mut session) = self.store.session(session_id).await? else {
            return Ok(());
        };

        if session.is_in_priority_queue {
            session.clear_priority_queue_fields();
            self.store.session_repository().save(&session).await?;
            self.store.emit(StoreEvent::PriorityQueueChanged);
        }

        let mut override_record = self
            .store
            .override_repository()
            .find_by_id(session_id)
            .await?
            .unwrap_or_else(|| UserSessionOverride::new(session_id));
        if !override_record.is_user_deleted {
            override_record.is_user_deleted = true;
            self.store.override_repository().save(&override_record).await?;
        }

        self.store.emit(StoreEvent::SessionDeleted {
            session_id: session_id.to_string(),
        });
        Ok(())
    }

    /// Restores a soft-deleted session.
    ///
    /// Only flips the override flag; the session is not re-added to any
    /// queue. A session with no override record is already active, so this
    /// is a no-op for it.
    pub async fn restore_session(&self, session_id: &str) -> Result<()> {
        let _gate = self.store.lock_writes().await;

        let Some(mut override_record) = self
            .store
            .override_repository()
            .find_by_id(session_id)
            .await?
        else {
            return Ok(());
        };
        if !override_record.is_user_deleted {
            return Ok(());
        }

        override_record.is_user_deleted = false;
        self.store.override_repository().save(&override_record).await?;

        self.store.emit(StoreEvent::SessionRestored {
            session_id: session_id.to_string(),
        });
        Ok(())
    }

    /// Returns the sessions visible to listing UI: everything that is not
    /// soft-deleted.
    pub async fn fetch_active_sessions(&self) -> Result<Vec<BackendSession>> {
        self.store.active_sessions().await
    }
}
