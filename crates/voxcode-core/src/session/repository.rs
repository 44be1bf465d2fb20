//! Repository traits for the entity store.
//!
//! These traits define the persistence contract the core depends on,
//! decoupling it from the specific storage mechanism (TOML files, a
//! database, an in-memory mock in tests).

use super::message::{MessageStatus, SessionMessage};
use super::model::{BackendSession, UserSessionOverride};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// An abstract repository for cached backend sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<BackendSession>>;

    /// Finds all sessions matching the given IDs in one batch read.
    ///
    /// IDs without a stored session are simply absent from the returned
    /// map. Used by reconciliation to avoid an N+1 access pattern.
    async fn find_by_ids(&self, session_ids: &[String])
    -> Result<HashMap<String, BackendSession>>;

    /// Saves a session to storage, creating or overwriting it.
    async fn save(&self, session: &BackendSession) -> Result<()>;

    /// Saves a batch of sessions in a single pass.
    ///
    /// Used by renormalization and reconciliation, where the updates form
    /// one logical operation.
    async fn save_all(&self, sessions: &[BackendSession]) -> Result<()>;

    /// Lists all stored sessions.
    async fn list_all(&self) -> Result<Vec<BackendSession>>;
}

/// An abstract repository for local-only session override records.
#[async_trait]
pub trait OverrideRepository: Send + Sync {
    /// Finds an override by session ID.
    async fn find_by_id(&self, session_id: &str) -> Result<Option<UserSessionOverride>>;

    /// Saves an override record, creating or overwriting it.
    async fn save(&self, override_record: &UserSessionOverride) -> Result<()>;

    /// Lists all stored override records.
    async fn list_all(&self) -> Result<Vec<UserSessionOverride>>;
}

/// An abstract repository for session messages.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Appends a message to its session's history.
    async fn append(&self, message: &SessionMessage) -> Result<()>;

    /// Lists all messages for a session in timestamp-ascending order.
    async fn list_for_session(&self, session_id: &str) -> Result<Vec<SessionMessage>>;

    /// Updates the status of a single message.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the message existed and was updated, `Ok(false)` if it
    /// was not found.
    async fn update_status(
        &self,
        session_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<bool>;
}
