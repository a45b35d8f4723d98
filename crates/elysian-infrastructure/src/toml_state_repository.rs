//! File-backed durable gateway state.
//!
//! Stores [`GatewayState`] as one small TOML document. The solidified
//! flag recorded here is the one piece of workflow state that survives
//! every reset.

use crate::paths::ElysianPaths;
use crate::storage::TomlDocument;
use async_trait::async_trait;
use elysian_core::error::{ElysianError, Result};
use elysian_core::state::{GatewayState, StateRepository};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// [`StateRepository`] over one TOML document.
pub struct TomlStateRepository {
    document: TomlDocument<GatewayState>,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl TomlStateRepository {
    /// Opens the state record at its default location.
    pub fn open_default() -> Result<Self> {
        let path = ElysianPaths::state_file()
            .map_err(|e| ElysianError::storage(e.to_string()))?;
        Ok(Self::at_path(path))
    }

    /// Opens a state record at an explicit path (used by tests).
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            document: TomlDocument::new(path),
            write_lock: Mutex::new(()),
        }
    }

    fn load_or_default(&self) -> Result<GatewayState> {
        Ok(self.document.load()?.unwrap_or_default())
    }
}

#[async_trait]
impl StateRepository for TomlStateRepository {
    async fn get_state(&self) -> Result<GatewayState> {
        self.load_or_default()
    }

    async fn save_state(&self, state: &GatewayState) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.document.save(state)
    }

    async fn is_solidified(&self, entity_id: &str) -> bool {
        match self.load_or_default() {
            Ok(state) => state.is_solidified(entity_id),
            Err(err) => {
                tracing::warn!(%err, "failed to read gateway state; assuming not solidified");
                false
            }
        }
    }

    async fn mark_solidified(&self, entity_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_default()?;
        state.mark_solidified(entity_id);
        self.document.save(&state)
    }

    async fn get_active_conversation(&self) -> Option<String> {
        self.load_or_default()
            .ok()
            .and_then(|state| state.active_conversation_id)
    }

    async fn set_active_conversation(&self, conversation_id: String) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_default()?;
        state.active_conversation_id = Some(conversation_id);
        self.document.save(&state)
    }

    async fn clear_active_conversation(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_default()?;
        state.active_conversation_id = None;
        self.document.save(&state)
    }
}
