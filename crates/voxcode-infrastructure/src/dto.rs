//! DTOs for the persisted cache schema.
//!
//! These structs are what is actually written to and read from the TOML
//! files. They carry an explicit `schema_version` so a future schema
//! change can migrate old files; the domain models in `voxcode-core`
//! stay independent of the storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use voxcode_core::session::{
    BackendSession, DEFAULT_PRIORITY_BAND, MessageRole, MessageStatus, SessionMessage,
    UserSessionOverride,
};

/// Current schema version written by this build.
pub const SCHEMA_VERSION: &str = "1";

/// V1 of the cached session schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSessionV1 {
    /// The schema version of this data structure.
    pub schema_version: String,

    pub id: String,
    pub backend_name: String,
    pub working_directory: String,
    pub last_modified: DateTime<Utc>,
    pub message_count: u32,
    pub unread_count: u32,
    pub preview: String,
    pub is_locally_created: bool,
    #[serde(default)]
    pub is_in_queue: bool,
    #[serde(default)]
    pub queue_position: u32,
    #[serde(default)]
    pub is_in_priority_queue: bool,
    #[serde(default = "default_priority_band")]
    pub priority: i32,
    #[serde(default)]
    pub priority_order: f64,
    #[serde(default)]
    pub priority_queued_at: Option<DateTime<Utc>>,
}

fn default_priority_band() -> i32 {
    DEFAULT_PRIORITY_BAND
}

impl From<CachedSessionV1> for BackendSession {
    fn from(dto: CachedSessionV1) -> Self {
        BackendSession {
            id: dto.id,
            backend_name: dto.backend_name,
            working_directory: dto.working_directory,
            last_modified: dto.last_modified,
            message_count: dto.message_count,
            unread_count: dto.unread_count,
            preview: dto.preview,
            is_locally_created: dto.is_locally_created,
            is_in_queue: dto.is_in_queue,
            queue_position: dto.queue_position,
            is_in_priority_queue: dto.is_in_priority_queue,
            priority: dto.priority,
            priority_order: dto.priority_order,
            priority_queued_at: dto.priority_queued_at,
        }
    }
}

impl From<&BackendSession> for CachedSessionV1 {
    fn from(session: &BackendSession) -> Self {
        CachedSessionV1 {
            schema_version: SCHEMA_VERSION.to_string(),
            id: session.id.clone(),
            backend_name: session.backend_name.clone(),
            working_directory: session.working_directory.clone(),
            last_modified: session.last_modified,
            message_count: session.message_count,
            unread_count: session.unread_count,
            preview: session.preview.clone(),
            is_locally_created: session.is_locally_created,
            is_in_queue: session.is_in_queue,
            queue_position: session.queue_position,
            is_in_priority_queue: session.is_in_priority_queue,
            priority: session.priority,
            priority_order: session.priority_order,
            priority_queued_at: session.priority_queued_at,
        }
    }
}

/// V1 of the override record schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOverrideV1 {
    pub schema_version: String,

    pub id: String,
    pub custom_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_user_deleted: bool,
}

impl From<SessionOverrideV1> for UserSessionOverride {
    fn from(dto: SessionOverrideV1) -> Self {
        UserSessionOverride {
            id: dto.id,
            custom_name: dto.custom_name,
            created_at: dto.created_at,
            is_user_deleted: dto.is_user_deleted,
        }
    }
}

impl From<&UserSessionOverride> for SessionOverrideV1 {
    fn from(record: &UserSessionOverride) -> Self {
        SessionOverrideV1 {
            schema_version: SCHEMA_VERSION.to_string(),
            id: record.id.clone(),
            custom_name: record.custom_name.clone(),
            created_at: record.created_at,
            is_user_deleted: record.is_user_deleted,
        }
    }
}

/// V1 of a single stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessageV1 {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
}

/// V1 of a session's message history file.
///
/// TOML cannot serialize a top-level array, so the messages sit behind a
/// wrapper carrying the schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHistoryV1 {
    pub schema_version: String,
    #[serde(default)]
    pub messages: Vec<StoredMessageV1>,
}

impl MessageHistoryV1 {
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            messages: Vec::new(),
        }
    }
}

impl From<StoredMessageV1> for SessionMessage {
    fn from(dto: StoredMessageV1) -> Self {
        SessionMessage {
            id: dto.id,
            session_id: dto.session_id,
            role: dto.role,
            text: dto.text,
            timestamp: dto.timestamp,
            status: dto.status,
        }
    }
}

impl From<&SessionMessage> for StoredMessageV1 {
    fn from(message: &SessionMessage) -> Self {
        StoredMessageV1 {
            id: message.id.clone(),
            session_id: message.session_id.clone(),
            role: message.role,
            text: message.text.clone(),
            timestamp: message.timestamp,
            status: message.status,
        }
    }
}
