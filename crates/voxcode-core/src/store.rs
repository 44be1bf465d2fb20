//! Entity store facade.
//!
//! `EntityStore` owns the repository backends, the advisory event bus and
//! the single write gate that serializes every read-modify-write sequence
//! in the core. Local user mutations, queue operations, soft deletes and
//! server reconciliation all run under the same gate, so no two mutations
//! can interleave at the field level.

use crate::error::Result;
use crate::session::{
    BackendSession, MessageRepository, MessageRole, MessageStatus, OverrideRepository,
    SessionMessage, SessionRepository, StoreEvent, UserSessionOverride, resolve_display_name,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, broadcast};

/// Capacity of the advisory event channel. Slow subscribers lag, they do
/// not block mutations.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The locally persisted view of backend sessions, overrides and messages.
pub struct EntityStore {
    sessions: Arc<dyn SessionRepository>,
    overrides: Arc<dyn OverrideRepository>,
    messages: Arc<dyn MessageRepository>,
    events: broadcast::Sender<StoreEvent>,
    write_gate: Mutex<()>,
}

impl EntityStore {
    /// Creates a new entity store over the given repository backends.
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        overrides: Arc<dyn OverrideRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            sessions,
            overrides,
            messages,
            events,
            write_gate: Mutex::new(()),
        }
    }

    /// Subscribes to advisory store events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Returns a handle to the event bus, for services that publish their
    /// own advisory events (e.g. the selection registry).
    pub fn event_sender(&self) -> broadcast::Sender<StoreEvent> {
        self.events.clone()
    }

    /// Acquires the write gate.
    ///
    /// Every mutation in the core holds this guard for its whole
    /// read-modify-write sequence.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Publishes an advisory event. Send failures (no subscribers) are
    /// ignored.
    pub(crate) fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn session_repository(&self) -> &Arc<dyn SessionRepository> {
        &self.sessions
    }

    pub(crate) fn override_repository(&self) -> &Arc<dyn OverrideRepository> {
        &self.overrides
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Returns the session with the given id, if cached.
    pub async fn session(&self, session_id: &str) -> Result<Option<BackendSession>> {
        Ok(self.sessions.find_by_id(session_id).await?)
    }

    /// Returns all cached sessions, including soft-deleted ones.
    pub async fn all_sessions(&self) -> Result<Vec<BackendSession>> {
        Ok(self.sessions.list_all().await?)
    }

    /// Returns the override record for a session, if one exists.
    pub async fn override_for(&self, session_id: &str) -> Result<Option<UserSessionOverride>> {
        Ok(self.overrides.find_by_id(session_id).await?)
    }

    /// Returns all sessions that are not soft-deleted, most recently
    /// modified first.
    ///
    /// This is the canonical "visible sessions" view used by listing UI.
    pub async fn active_sessions(&self) -> Result<Vec<BackendSession>> {
        let overrides: HashMap<String, UserSessionOverride> = self
            .overrides
            .list_all()
            .await?
            .into_iter()
            .map(|o| (o.id.clone(), o))
            .collect();

        let mut sessions: Vec<BackendSession> = self
            .sessions
            .list_all()
            .await?
            .into_iter()
            .filter(|s| !overrides.get(&s.id).map(|o| o.is_user_deleted).unwrap_or(false))
            .collect();

        sessions.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(sessions)
    }

    /// Returns the priority queue in its strict total order:
    /// `(priority ascending, priority_order ascending, id ascending)`.
    pub async fn priority_queue(&self) -> Result<Vec<BackendSession>> {
        let mut queued: Vec<BackendSession> = self
            .sessions
            .list_all()
            .await?
            .into_iter()
            .filter(|s| s.is_in_priority_queue)
            .collect();

        queued.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.priority_order.total_cmp(&b.priority_order))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(queued)
    }

    /// Resolves the display name for a session.
    ///
    /// Returns `None` if the session is not cached.
    pub async fn display_name(&self, session_id: &str) -> Result<Option<String>> {
        let Some(session) = self.sessions.find_by_id(session_id).await? else {
            return Ok(None);
        };
        let override_record = self.overrides.find_by_id(session_id).await?;
        Ok(Some(resolve_display_name(&session, override_record.as_ref())))
    }

    /// Returns all messages for a session in timestamp-ascending order.
    pub async fn messages(&self, session_id: &str) -> Result<Vec<SessionMessage>> {
        Ok(self.messages.list_for_session(session_id).await?)
    }

    // ------------------------------------------------------------------
    // Local mutations
    // ------------------------------------------------------------------

    /// Creates a session locally, before the backend has confirmed it.
    ///
    /// The record carries `is_locally_created = true` until the first
    /// reconcile of its id adopts it.
    pub async fn create_local_session(&self, working_directory: &str) -> Result<BackendSession> {
        let _gate = self.lock_writes().await;

        let session = BackendSession::new_local(working_directory);
        self.sessions.save(&session).await?;
        self.emit(StoreEvent::SessionUpserted {
            session_id: session.id.clone(),
        });
        Ok(session)
    }

    /// Sets the user-chosen display name for a session.
    ///
    /// Creates the override record lazily; a blank name clears the custom
    /// name so resolution falls back to the backend name. Silent no-op if
    /// the session is not cached.
    pub async fn set_custom_name(&self, session_id: &str, name: &str) -> Result<()> {
        let _gate = self.lock_writes().await;

        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Ok(());
        }

        let mut override_record = self
            .overrides
            .find_by_id(session_id)
            .await?
            .unwrap_or_else(|| UserSessionOverride::new(session_id));

        let trimmed = name.trim();
        override_record.custom_name = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.overrides.save(&override_record).await?;

        self.emit(StoreEvent::SessionRenamed {
            session_id: session_id.to_string(),
        });
        Ok(())
    }

    /// Appends a locally originated message to a session.
    ///
    /// Returns `None` (without writing) if the session is not cached.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Option<SessionMessage>> {
        let _gate = self.lock_writes().await;

        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Ok(None);
        }

        let message = SessionMessage::new(session_id, role, text);
        self.messages.append(&message).await?;

        self.emit(StoreEvent::MessageAppended {
            session_id: session_id.to_string(),
            message_id: message.id.clone(),
        });
        Ok(Some(message))
    }

    /// Transitions the delivery status of a locally created message.
    ///
    /// Confirmed messages are immutable; attempting to change one is a
    /// silent no-op, as is a missing message.
    pub async fn update_message_status(
        &self,
        session_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<()> {
        let _gate = self.lock_writes().await;

        let existing = self.messages.list_for_session(session_id).await?;
        let Some(message) = existing.iter().find(|m| m.id == message_id) else {
            return Ok(());
        };
        if message.status == MessageStatus::Confirmed {
            return Ok(());
        }

        self.messages
            .update_status(session_id, message_id, status)
            .await?;
        Ok(())
    }
}
