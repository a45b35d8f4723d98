//! Backend configuration.
//!
//! Loaded from `config.toml` under the gateway config directory:
//!
//! ```toml
//! [gemini]
//! api_key = "..."
//! model = "gemini-2.5-flash"
//! ```
//!
//! The `GEMINI_API_KEY` environment variable overrides the file.

use elysian_core::error::Result;
use elysian_infrastructure::ElysianPaths;
use elysian_infrastructure::storage::TomlDocument;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl InteractionConfig {
    /// Loads configuration from the default location; a missing file is
    /// an empty configuration, not an error.
    pub fn load() -> Result<Self> {
        match ElysianPaths::config_file() {
            Ok(path) => Self::load_from(path),
            Err(err) => {
                tracing::warn!(%err, "config directory unavailable");
                Ok(Self::default())
            }
        }
    }

    /// Loads configuration from an explicit path (used by tests).
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let document: TomlDocument<InteractionConfig> = TomlDocument::new(path);
        Ok(document.load()?.unwrap_or_default())
    }

    /// Resolves the Gemini API key: environment first, then the file.
    pub fn gemini_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                return Some(key);
            }
        }
        self.gemini.as_ref().map(|g| g.api_key.clone())
    }

    /// Resolves the configured model, if any.
    pub fn gemini_model(&self) -> Option<String> {
        self.gemini.as_ref().and_then(|g| g.model.clone())
    }
}
