//! Application layer: use-case services wiring the gateway together.

pub mod bootstrap;
pub mod gateway_service;
pub mod security_monitor;
pub mod symposium;

pub use gateway_service::{GatewayService, standard_workflow_machine};
pub use security_monitor::{SecurityMonitor, SecuritySnapshot};
pub use symposium::{SymposiumScheduler, SymposiumState};
