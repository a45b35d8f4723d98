//! File-backed conversation ledger.
//!
//! Persists the whole archive as a single JSON array document, the
//! storage model the gateway has always used (one key, one array).

use crate::paths::ElysianPaths;
use crate::storage::JsonDocument;
use async_trait::async_trait;
use elysian_core::error::{ElysianError, Result};
use elysian_core::session::{ArchiveRepository, SavedConversation};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// [`ArchiveRepository`] over one JSON document.
pub struct JsonArchiveRepository {
    document: JsonDocument<Vec<SavedConversation>>,
    /// Serializes writers; the document itself makes each write atomic.
    write_lock: Mutex<()>,
}

impl JsonArchiveRepository {
    /// Opens the ledger at its default location.
    pub fn open_default() -> Result<Self> {
        let path = ElysianPaths::ledger_file()
            .map_err(|e| ElysianError::storage(e.to_string()))?;
        Ok(Self::at_path(path))
    }

    /// Opens a ledger at an explicit path (used by tests).
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            document: JsonDocument::new(path),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ArchiveRepository for JsonArchiveRepository {
    async fn load(&self) -> Result<Vec<SavedConversation>> {
        Ok(self.document.load()?.unwrap_or_default())
    }

    async fn save(&self, conversations: &[SavedConversation]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.document.save(&conversations.to_vec())
    }
}
