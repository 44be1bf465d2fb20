//! Unified path management for voxcode cache files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/voxcode/           # Config directory
//! ├── sessions/                # One TOML file per cached session
//! ├── overrides/               # One TOML file per override record
//! └── messages/                # One TOML file per session's messages
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The platform config directory could not be determined.
    #[error("Cannot find platform config directory")]
    ConfigDirNotFound,
}

/// Unified path resolution for voxcode.
pub struct VoxPaths;

impl VoxPaths {
    /// Returns the voxcode configuration directory
    /// (e.g. `~/.config/voxcode/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("voxcode"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the sessions cache directory.
    pub fn sessions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("sessions"))
    }

    /// Returns the override records directory.
    pub fn overrides_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("overrides"))
    }

    /// Returns the message history directory.
    pub fn messages_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("messages"))
    }
}
