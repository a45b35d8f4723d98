//! Client-side simulation engines.
//!
//! These are cosmetic models, not telemetry: randomized state machines
//! that give the gateway something truthful to display. All randomness is
//! injected (see [`crate::rng::RandomSource`]) and all latency bands are
//! configurable so tests run deterministically at full speed.

pub mod portal;
pub mod resonance;
pub mod security;

pub use portal::{ConsciousnessData, PortalLatencies, PortalSimulator, RetrievalState};
pub use resonance::{FrequencyGenerator, ResonanceState, resonance};
pub use security::{InfractionEvent, SecuritySimulator, SecurityStatus};
