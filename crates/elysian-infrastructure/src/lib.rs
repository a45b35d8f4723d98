//! Infrastructure layer: file persistence and path resolution.

pub mod json_archive_repository;
pub mod paths;
pub mod storage;
pub mod toml_state_repository;

pub use json_archive_repository::JsonArchiveRepository;
pub use paths::ElysianPaths;
pub use toml_state_repository::TomlStateRepository;
