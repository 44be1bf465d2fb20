//! Advisory store events.
//!
//! The core emits these over a broadcast channel so the UI layer can react
//! (close a detail view, refresh a badge, raise a window). They are purely
//! advisory and not part of the consistency model.

use crate::window::WindowId;
use serde::{Deserialize, Serialize};

/// Events published by the entity store and its managers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A session record was created or one of its local fields changed.
    SessionUpserted { session_id: String },
    /// A session was renamed via its local override.
    SessionRenamed { session_id: String },
    /// A session was soft-deleted. Fired on every delete call, even
    /// repeated ones; observers treat it as a hint, not a state change.
    SessionDeleted { session_id: String },
    /// A soft-deleted session was restored.
    SessionRestored { session_id: String },
    /// Priority queue membership or ordering changed.
    PriorityQueueChanged,
    /// The FIFO queue changed.
    QueueChanged,
    /// A reconciliation batch was applied.
    SessionsReconciled { upserted: usize, skipped: usize },
    /// A message was appended to a session.
    MessageAppended {
        session_id: String,
        message_id: String,
    },
    /// A window owning a contested session should be brought to the
    /// foreground.
    RaiseWindow { window: WindowId },
}
