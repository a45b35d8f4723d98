//! Composition root.
//!
//! Wires the default production stack: Gemini backend from the config
//! file, file-backed ledger and state repositories, thread-local
//! randomness. Embedding layers that need different backends construct
//! the services directly.

use crate::gateway_service::{GatewayService, standard_workflow_machine};
use crate::security_monitor::SecurityMonitor;
use elysian_core::error::{ElysianError, Result};
use elysian_core::rng::ThreadRngSource;
use elysian_core::simulation::SecuritySimulator;
use elysian_core::workflow::WorkflowMachine;
use elysian_infrastructure::{JsonArchiveRepository, TomlStateRepository};
use elysian_interaction::GeminiChatClient;
use std::sync::Arc;

/// Builds the gateway service over the default file-backed stack.
pub fn default_gateway_service() -> Result<GatewayService> {
    let chat_client = GeminiChatClient::from_config()
        .map_err(|err| ElysianError::chat(err.to_string()))?;

    Ok(GatewayService::new(
        Arc::new(chat_client),
        Arc::new(JsonArchiveRepository::open_default()?),
        Arc::new(TomlStateRepository::open_default()?),
        ThreadRngSource::boxed(),
    ))
}

/// Builds the retrieval workflow over the durable state record.
pub fn default_workflow_machine() -> Result<WorkflowMachine> {
    Ok(standard_workflow_machine(
        Arc::new(TomlStateRepository::open_default()?),
        ThreadRngSource::boxed(),
    ))
}

/// Builds the sentinel network monitor.
pub fn default_security_monitor() -> SecurityMonitor {
    SecurityMonitor::new(SecuritySimulator::new(ThreadRngSource::boxed()))
}
