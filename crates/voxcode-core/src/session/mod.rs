//! Session domain module.
//!
//! Contains the cached session models, repository interfaces, advisory
//! events and the soft-delete state machine.
//!
//! # Module Structure
//!
//! - `model`: cached backend session + local override (`BackendSession`,
//!   `UserSessionOverride`, display-name resolution)
//! - `message`: conversation message types
//! - `repository`: persistence traits the core depends on
//! - `event`: advisory store events
//! - `soft_delete`: reversible delete/restore manager

mod event;
mod message;
mod model;
mod repository;
mod soft_delete;

// Re-export public API
pub use event::StoreEvent;
pub use message::{MessageRole, MessageStatus, SessionMessage};
pub use model::{
    BackendSession, DEFAULT_PRIORITY_BAND, MIN_ORDER_GAP, ORDER_STEP, UserSessionOverride,
    resolve_display_name,
};
pub use repository::{MessageRepository, OverrideRepository, SessionRepository};
pub use soft_delete::SoftDeleteManager;
