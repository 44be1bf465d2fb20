//! Session domain models.
//!
//! This module contains the locally cached representation of backend
//! sessions and the local-only override record layered on top of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default coarse priority band. Lower values are more urgent.
pub const DEFAULT_PRIORITY_BAND: i32 = 10;

/// Spacing between fractional-index order values on append and after
/// renormalization. Leaves room for many midpoint insertions before
/// renormalization is needed.
pub const ORDER_STEP: f64 = 1000.0;

/// Minimum gap between adjacent order values in a band. Below this,
/// further bisection loses float precision and the queue needs
/// renormalization.
pub const MIN_ORDER_GAP: f64 = 1e-6;

/// A backend session as cached locally.
///
/// The backend is authoritative for `backend_name`, `working_directory`,
/// `last_modified`, `message_count`, `unread_count` and `preview`; those
/// fields are overwritten on reconciliation. Queue membership fields are
/// locally owned and survive reconciliation untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSession {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Canonical name as reported by the backend. Empty string is a valid
    /// (unnamed) state.
    pub backend_name: String,
    /// Absolute path the session operates in; groups sessions by directory.
    pub working_directory: String,
    /// Last modification timestamp, used for recency ordering.
    pub last_modified: DateTime<Utc>,
    /// Number of messages in the session.
    pub message_count: u32,
    /// Number of unread messages.
    pub unread_count: u32,
    /// Short text snippet of the latest content.
    pub preview: String,
    /// True only for sessions created client-side before backend
    /// confirmation. Flipped to false on first reconcile.
    pub is_locally_created: bool,
    /// Simple FIFO queue membership.
    #[serde(default)]
    pub is_in_queue: bool,
    /// Position within the FIFO queue.
    #[serde(default)]
    pub queue_position: u32,
    /// Priority queue membership.
    #[serde(default)]
    pub is_in_priority_queue: bool,
    /// Coarse priority band (lower = more urgent).
    #[serde(default = "default_priority_band")]
    pub priority: i32,
    /// Fractional-index order within the band.
    #[serde(default)]
    pub priority_order: f64,
    /// When the session entered the priority queue. Cleared on removal.
    #[serde(default)]
    pub priority_queued_at: Option<DateTime<Utc>>,
}

fn default_priority_band() -> i32 {
    DEFAULT_PRIORITY_BAND
}

impl BackendSession {
    /// Creates a session record for a backend-reported id.
    pub fn new(id: impl Into<String>, working_directory: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            backend_name: String::new(),
            working_directory: working_directory.into(),
            last_modified: Utc::now(),
            message_count: 0,
            unread_count: 0,
            preview: String::new(),
            is_locally_created: false,
            is_in_queue: false,
            queue_position: 0,
            is_in_priority_queue: false,
            priority: DEFAULT_PRIORITY_BAND,
            priority_order: 0.0,
            priority_queued_at: None,
        }
    }

    /// Creates a session locally, before the backend has confirmed it.
    pub fn new_local(working_directory: impl Into<String>) -> Self {
        let mut session = Self::new(Uuid::new_v4().to_string(), working_directory);
        session.is_locally_created = true;
        session
    }

    /// Resets all priority queue fields to their defaults.
    ///
    /// Invariant: a session that is not in the priority queue always has
    /// `priority == DEFAULT_PRIORITY_BAND`, `priority_order == 0.0` and no
    /// `priority_queued_at` timestamp.
    pub fn clear_priority_queue_fields(&mut self) {
        self.is_in_priority_queue = false;
        self.priority = DEFAULT_PRIORITY_BAND;
        self.priority_order = 0.0;
        self.priority_queued_at = None;
    }
}

/// Local-only per-session override record.
///
/// Created lazily on the first local mutation (rename or soft delete) that
/// needs it and never deleted afterwards, so a custom name survives
/// delete/restore cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSessionOverride {
    /// Matches the `BackendSession` id (lookup join, not a foreign key object).
    pub id: String,
    /// User-chosen display name; overrides `backend_name` when non-blank.
    pub custom_name: Option<String>,
    /// When the override record was first created.
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag, independent of backend-side deletion.
    pub is_user_deleted: bool,
}

impl UserSessionOverride {
    /// Creates a fresh override record for a session id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            custom_name: None,
            created_at: Utc::now(),
            is_user_deleted: false,
        }
    }
}

/// Resolves the display name for a session.
///
/// Resolution order: non-blank `custom_name` from the override, then
/// non-blank `backend_name`, then the first 8 characters of the lowercased
/// session id.
pub fn resolve_display_name(
    session: &BackendSession,
    override_record: Option<&UserSessionOverride>,
) -> String {
    if let Some(name) = override_record.and_then(|o| o.custom_name.as_deref()) {
        if !name.trim().is_empty() {
            return name.to_string();
        }
    }
    if !session.backend_name.trim().is_empty() {
        return session.backend_name.clone();
    }
    session.id.to_lowercase().chars().take(8).collect()
}
