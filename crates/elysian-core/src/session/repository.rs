//! Archive repository trait.
//!
//! Defines the interface for ledger persistence, decoupling the domain
//! from the storage mechanism (a flat JSON document in production).

use super::archive::SavedConversation;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for the conversation ledger.
///
/// The whole ledger is read and written as one unit, mirroring the
/// single-document storage model the gateway persists into.
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Loads every archived conversation.
    ///
    /// Returns an empty list when nothing has been persisted yet.
    async fn load(&self) -> Result<Vec<SavedConversation>>;

    /// Persists the full ledger, replacing any previous contents.
    async fn save(&self, conversations: &[SavedConversation]) -> Result<()>;
}
