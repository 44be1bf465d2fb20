//! Voxcode client core.
//!
//! The data-consistency layer of the voxcode client: a locally persisted
//! cache of backend sessions kept consistent under concurrent local edits
//! and server pushes. The UI, transport and voice layers sit on top of
//! this crate and are out of its scope.
//!
//! Components:
//!
//! - [`store::EntityStore`]: repositories + event bus + the single write
//!   gate all mutations run under
//! - [`queue::PriorityQueueEngine`]: fractional-index priority queue
//!   ordering and renormalization
//! - [`session::SoftDeleteManager`]: reversible delete/restore
//! - [`sync::SessionSyncManager`]: server snapshot reconciliation
//! - [`window::SelectionRegistry`]: window ownership of sessions

pub mod error;
pub mod queue;
pub mod session;
pub mod store;
pub mod sync;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

// Re-export common error type
pub use error::VoxError;
