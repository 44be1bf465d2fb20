//! Selection / window registry.
//!
//! The host platform allows multiple top-level windows onto the same
//! store. The registry tracks which window owns which session so a
//! session is never presented as editable in two places: a conflicting
//! selection is refused and the owning window is asked to come to the
//! foreground instead (via an advisory `RaiseWindow` event, since the
//! actual windowing layer lives outside this crate).
//!
//! One registry instance exists per process, created at app start and
//! injected into the components that need it.

use crate::session::StoreEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

/// Identifies a top-level window by its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct RegistryState {
    /// session id -> owning window. Last writer wins.
    by_session: HashMap<String, WindowId>,
    /// The designated main window, if any.
    main_window: Option<WindowId>,
}

/// Tracks window ownership of sessions and mediates selection races.
pub struct SelectionRegistry {
    state: RwLock<RegistryState>,
    events: broadcast::Sender<StoreEvent>,
}

impl SelectionRegistry {
    /// Creates a registry publishing advisory events on the given bus.
    pub fn new(events: broadcast::Sender<StoreEvent>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            events,
        }
    }

    /// Associates a session with a window, replacing any prior
    /// association for that session id.
    pub async fn register_window(&self, window: WindowId, session_id: &str) {
        let mut state = self.state.write().await;
        state.by_session.insert(session_id.to_string(), window);
    }

    /// Removes the association for one session id.
    pub async fn unregister_session(&self, session_id: &str) {
        let mut state = self.state.write().await;
        state.by_session.remove(session_id);
    }

    /// Removes every association tied to a window. Called on window close.
    pub async fn unregister_all_for(&self, window: &WindowId) {
        let mut state = self.state.write().await;
        state.by_session.retain(|_, owner| owner != window);
    }

    /// Designates the main window, against which detachment is computed.
    pub async fn set_main_window(&self, window: WindowId) {
        let mut state = self.state.write().await;
        state.main_window = Some(window);
    }

    /// Attempts to select a session from a window.
    ///
    /// Returns true if the session is unregistered or already owned by the
    /// requesting window. If another window owns it, returns false and
    /// emits a `RaiseWindow` event so the UI brings that window forward
    /// instead of opening the session twice.
    pub async fn try_select_session(&self, session_id: &str, requesting: &WindowId) -> bool {
        let state = self.state.read().await;
        match state.by_session.get(session_id) {
            None => true,
            Some(owner) if owner == requesting => true,
            Some(owner) => {
                let _ = self.events.send(StoreEvent::RaiseWindow {
                    window: owner.clone(),
                });
                false
            }
        }
    }

    /// Whether a session is presented outside the designated main window.
    ///
    /// Derived on read from the current registrations and main-window
    /// pointer. With no main window designated, nothing counts as
    /// detached.
    pub async fn is_session_detached(&self, session_id: &str) -> bool {
        let state = self.state.read().await;
        match (&state.main_window, state.by_session.get(session_id)) {
            (Some(main), Some(owner)) => owner != main,
            _ => false,
        }
    }

    /// Returns the ids of all sessions in detached windows.
    pub async fn detached_sessions(&self) -> Vec<String> {
        let state = self.state.read().await;
        let Some(main) = &state.main_window else {
            return Vec::new();
        };
        state
            .by_session
            .iter()
            .filter(|(_, owner)| *owner != main)
            .map(|(session_id, _)| session_id.clone())
            .collect()
    }
}
