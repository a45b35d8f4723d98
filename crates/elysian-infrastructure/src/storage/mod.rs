//! File-backed document storage.

pub mod atomic;

pub use atomic::{JsonDocument, TomlDocument};
