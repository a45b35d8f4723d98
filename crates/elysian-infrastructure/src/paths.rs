//! Unified path management for gateway files.
//!
//! All gateway data lives under one platform config directory:
//!
//! ```text
//! ~/.config/elysian/           # Linux; platform-appropriate elsewhere
//! ├── config.toml              # Backend configuration
//! ├── state.toml               # Durable gateway state
//! └── ledger.json              # Archived conversation ledger
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for the gateway.
pub struct ElysianPaths;

impl ElysianPaths {
    /// Returns the gateway configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("elysian"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Path of the backend configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path of the durable state record.
    pub fn state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("state.toml"))
    }

    /// Path of the conversation ledger.
    pub fn ledger_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("ledger.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_config_dir() {
        let dir = ElysianPaths::config_dir().unwrap();
        assert!(ElysianPaths::config_file().unwrap().starts_with(&dir));
        assert!(ElysianPaths::state_file().unwrap().starts_with(&dir));
        assert!(ElysianPaths::ledger_file().unwrap().starts_with(&dir));
    }
}
