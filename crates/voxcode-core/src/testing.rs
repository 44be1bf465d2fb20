//! In-memory repository fixtures shared by the core's unit tests.

use crate::session::{
    BackendSession, MessageRepository, MessageStatus, OverrideRepository, SessionMessage,
    SessionRepository, UserSessionOverride,
};
use crate::store::EntityStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory repositories backing an `EntityStore` under test.
///
/// `fail_writes` makes every subsequent write fail, for exercising the
/// persistence-failure propagation path.
pub(crate) struct MemoryRepositories {
    sessions: Mutex<HashMap<String, BackendSession>>,
    overrides: Mutex<HashMap<String, UserSessionOverride>>,
    messages: Mutex<HashMap<String, Vec<SessionMessage>>>,
    fail_writes: AtomicBool,
}

impl MemoryRepositories {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            overrides: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub(crate) async fn seed_session(&self, session: BackendSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    pub(crate) fn override_count(&self) -> usize {
        self.overrides.lock().unwrap().len()
    }

    pub(crate) fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(anyhow!("injected write failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionRepository for MemoryRepositories {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<BackendSession>> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn find_by_ids(
        &self,
        session_ids: &[String],
    ) -> Result<HashMap<String, BackendSession>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(session_ids
            .iter()
            .filter_map(|id| sessions.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }

    async fn save(&self, session: &BackendSession) -> Result<()> {
        self.check_writable()?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn save_all(&self, sessions: &[BackendSession]) -> Result<()> {
        self.check_writable()?;
        let mut stored = self.sessions.lock().unwrap();
        for session in sessions {
            stored.insert(session.id.clone(), session.clone());
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<BackendSession>> {
        Ok(self.sessions.lock().unwrap().values().cloned().collect())
    }
}

#[async_trait]
impl OverrideRepository for MemoryRepositories {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<UserSessionOverride>> {
        Ok(self.overrides.lock().unwrap().get(session_id).cloned())
    }

    async fn save(&self, override_record: &UserSessionOverride) -> Result<()> {
        self.check_writable()?;
        self.overrides
            .lock()
            .unwrap()
            .insert(override_record.id.clone(), override_record.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserSessionOverride>> {
        Ok(self.overrides.lock().unwrap().values().cloned().collect())
    }
}

#[async_trait]
impl MessageRepository for MemoryRepositories {
    async fn append(&self, message: &SessionMessage) -> Result<()> {
        self.check_writable()?;
        self.messages
            .lock()
            .unwrap()
            .entry(message.session_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn list_for_session(&self, session_id: &str) -> Result<Vec<SessionMessage>> {
        let mut messages = self
            .messages
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(messages)
    }

    async fn update_status(
        &self,
        session_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<bool> {
        self.check_writable()?;
        let mut messages = self.messages.lock().unwrap();
        if let Some(list) = messages.get_mut(session_id) {
            if let Some(message) = list.iter_mut().find(|m| m.id == message_id) {
                message.status = status;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Builds an `EntityStore` backed by fresh in-memory repositories.
pub(crate) fn memory_store() -> (Arc<EntityStore>, Arc<MemoryRepositories>) {
    let repos = Arc::new(MemoryRepositories::new());
    let store = Arc::new(EntityStore::new(
        repos.clone(),
        repos.clone(),
        repos.clone(),
    ));
    (store, repos)
}
