//! Error types for the voxcode client core.

use thiserror::Error;

/// A shared error type for the voxcode client core.
///
/// Not-found lookups and invalid requests are silent no-ops throughout
/// the core, so errors only surface from the persistence layer and from
/// wire payload parsing.
#[derive(Error, Debug, Clone)]
pub enum VoxError {
    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },
}

impl From<serde_json::Error> for VoxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (repository layer errors)
impl From<anyhow::Error> for VoxError {
    fn from(err: anyhow::Error) -> Self {
        Self::DataAccess(err.to_string())
    }
}

/// A type alias for `Result<T, VoxError>`.
pub type Result<T> = std::result::Result<T, VoxError>;
