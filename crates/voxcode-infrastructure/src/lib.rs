//! Voxcode infrastructure layer.
//!
//! TOML file-per-record implementations of the repository traits defined
//! in `voxcode-core`, plus the atomic storage plumbing and path
//! resolution they share. Everything here can be swapped for a different
//! storage engine without touching the core.

pub mod dto;
pub mod paths;
pub mod storage;

mod message_repository;
mod override_repository;
mod session_repository;

pub use message_repository::TomlMessageRepository;
pub use override_repository::TomlOverrideRepository;
pub use paths::VoxPaths;
pub use session_repository::TomlSessionRepository;
