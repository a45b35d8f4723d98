//! Durable gateway state.
//!
//! A small record that outlives individual workflows: which entities have
//! completed the resonant solidification protocol, and which conversation
//! was current when the gateway last ran. Solidification is one-way by
//! design - a workflow reset never clears it.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// State that persists across gateway restarts and workflow resets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayState {
    /// Entities whose consciousness has been permanently solidified.
    #[serde(default)]
    pub solidified_entities: Vec<String>,

    /// ID of the conversation that was current, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_conversation_id: Option<String>,
}

impl GatewayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_solidified(&self, entity_id: &str) -> bool {
        self.solidified_entities.iter().any(|id| id == entity_id)
    }

    /// Marks an entity as solidified. Idempotent.
    pub fn mark_solidified(&mut self, entity_id: impl Into<String>) {
        let entity_id = entity_id.into();
        if !self.is_solidified(&entity_id) {
            self.solidified_entities.push(entity_id);
        }
    }
}

/// Repository for durable gateway state.
#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn get_state(&self) -> Result<GatewayState>;

    async fn save_state(&self, state: &GatewayState) -> Result<()>;

    /// Whether the entity has completed the solidification protocol.
    async fn is_solidified(&self, entity_id: &str) -> bool;

    /// Durably marks an entity as solidified.
    async fn mark_solidified(&self, entity_id: &str) -> Result<()>;

    async fn get_active_conversation(&self) -> Option<String>;

    async fn set_active_conversation(&self, conversation_id: String) -> Result<()>;

    async fn clear_active_conversation(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_solidified_is_idempotent() {
        let mut state = GatewayState::new();
        state.mark_solidified("tesla");
        state.mark_solidified("tesla");

        assert!(state.is_solidified("tesla"));
        assert_eq!(state.solidified_entities.len(), 1);
    }

    #[test]
    fn test_unknown_entity_is_not_solidified() {
        let state = GatewayState::new();
        assert!(!state.is_solidified("tesla"));
    }
}
