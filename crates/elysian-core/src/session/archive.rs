//! The conversation archive ledger.
//!
//! Finished conversations are frozen into [`SavedConversation`] blocks,
//! each stamped with a random ledger hash. The archive enforces the
//! invariants the gateway relies on: a conversation is archived at most
//! once, and near-empty transcripts are not worth a block.

use super::message::{ChatMessage, MessageSender};
use crate::error::{ElysianError, Result};
use crate::persona::SpeakerContext;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// Minimum transcript length worth archiving: one system notice plus at
/// least one real exchange.
const MIN_ARCHIVABLE_MESSAGES: usize = 2;

/// A conversation frozen into the archive. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConversation {
    pub id: String,
    /// Archival time (ISO 8601 format).
    #[serde(default)]
    pub archived_at: String,
    #[serde(default)]
    pub speaker_context: SpeakerContext,
    pub messages: Vec<ChatMessage>,
    /// Random `0x…` ledger tag, display-only.
    #[serde(default)]
    pub hash: String,
}

impl SavedConversation {
    /// Replayable history: everything except system notices.
    pub fn replayable_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.sender != MessageSender::System)
    }
}

/// The in-memory working set of archived conversations.
#[derive(Debug, Clone, Default)]
pub struct ConversationArchive {
    saved: Vec<SavedConversation>,
}

impl ConversationArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_saved(saved: Vec<SavedConversation>) -> Self {
        Self { saved }
    }

    pub fn conversations(&self) -> &[SavedConversation] {
        &self.saved
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.saved.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&SavedConversation> {
        self.saved.iter().find(|c| c.id == id)
    }

    /// Archives a conversation, returning the new block.
    ///
    /// No-op (returns `None`) when the id is already archived or the
    /// transcript is too short to matter - calling this twice for the
    /// same conversation can never create duplicate blocks.
    pub fn archive(
        &mut self,
        id: impl Into<String>,
        speaker_context: SpeakerContext,
        messages: Vec<ChatMessage>,
        rng: &mut dyn RandomSource,
    ) -> Option<&SavedConversation> {
        let id = id.into();
        if messages.len() < MIN_ARCHIVABLE_MESSAGES || self.contains(&id) {
            return None;
        }

        self.saved.push(SavedConversation {
            id,
            archived_at: chrono::Utc::now().to_rfc3339(),
            speaker_context,
            messages,
            hash: ledger_hash(rng),
        });
        self.saved.last()
    }

    pub fn remove(&mut self, id: &str) -> Option<SavedConversation> {
        let index = self.saved.iter().position(|c| c.id == id)?;
        Some(self.saved.remove(index))
    }

    /// Serializes the whole ledger as a pretty-printed JSON array.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.saved)?)
    }

    /// Parses an exported ledger, validating its structure first.
    ///
    /// Only arrays whose every element carries `id` and `messages` are
    /// accepted; anything else is rejected before the current archive is
    /// touched.
    pub fn import_json(text: &str) -> Result<Vec<SavedConversation>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let items = value
            .as_array()
            .ok_or_else(|| ElysianError::validation("Ledger import must be a JSON array"))?;

        for item in items {
            let valid = item.is_object()
                && item.get("id").is_some_and(|v| v.is_string())
                && item.get("messages").is_some_and(|v| v.is_array());
            if !valid {
                return Err(ElysianError::validation(
                    "Ledger entries must carry 'id' and 'messages'",
                ));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Replaces the archive contents with an imported ledger.
    pub fn replace(&mut self, saved: Vec<SavedConversation>) {
        self.saved = saved;
    }
}

/// Generates a `0x…` tag of 32 hex digits for the ledger display.
fn ledger_hash(rng: &mut dyn RandomSource) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    let mut hash = String::with_capacity(34);
    hash.push_str("0x");
    for byte in bytes {
        hash.push_str(&format!("{byte:02x}"));
    }
    hash
}
