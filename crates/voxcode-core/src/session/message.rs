//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
}

/// Delivery status of a message.
///
/// Only locally created, not-yet-confirmed messages transition between
/// states; a `Confirmed` message is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Created locally, not yet handed to the transport.
    Pending,
    /// Handed to the transport, awaiting backend acknowledgment.
    Sending,
    /// Acknowledged by the backend.
    Confirmed,
    /// Delivery failed; may be retried.
    Error,
}

/// A single message belonging to a session.
///
/// Messages are append-only except for status transitions on locally
/// created messages, and are displayed in timestamp-ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    /// Unique message identifier (UUID format).
    pub id: String,
    /// Id of the owning `BackendSession`.
    pub session_id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub text: String,
    /// Timestamp when the message was created.
    pub timestamp: DateTime<Utc>,
    /// Delivery status.
    pub status: MessageStatus,
}

impl SessionMessage {
    /// Creates a new locally originated message in `Pending` state.
    pub fn new(session_id: impl Into<String>, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            status: MessageStatus::Pending,
        }
    }
}
