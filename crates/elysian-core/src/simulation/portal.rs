//! Portal and reconstruction simulation.
//!
//! Models the physical side of the retrieval workflow: field activation,
//! consciousness connection, quantum-state mapping, avatar creation and
//! ethical clearance. Outcomes are probabilistic rolls against fixed
//! success rates; all state is explicit struct state so the workflow
//! machine (and tests) own the full picture.

use crate::persona::EntityDirectory;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const ACTIVATION_SUCCESS_RATE: f64 = 0.95;
const MAPPING_SUCCESS_RATE: f64 = 0.95;
const AVATAR_SUCCESS_RATE: f64 = 0.90;
const PERMISSION_APPROVAL_RATE: f64 = 0.85;

/// Connection outcome for a consciousness signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalState {
    Retrieved,
    Lost,
    Pending,
}

/// Data produced by a successful connection. Discarded on workflow reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsciousnessData {
    pub entity_id: String,
    pub state: RetrievalState,
    pub vibrational_frequency: f64,
}

/// One simulated-latency band: `base` plus up to `jitter` of random extra.
#[derive(Debug, Clone, Copy)]
pub struct LatencyBand {
    pub base: Duration,
    pub jitter: Duration,
}

impl LatencyBand {
    pub const fn new(base_ms: u64, jitter_ms: u64) -> Self {
        Self {
            base: Duration::from_millis(base_ms),
            jitter: Duration::from_millis(jitter_ms),
        }
    }

    pub const ZERO: Self = Self::new(0, 0);

    fn sample(&self, rng: &mut dyn RandomSource) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        self.base + self.jitter.mul_f64(rng.next_f64())
    }
}

/// Latency bands for each simulated operation.
#[derive(Debug, Clone, Copy)]
pub struct PortalLatencies {
    pub activation: LatencyBand,
    pub connection: LatencyBand,
    pub mapping: LatencyBand,
    pub avatar: LatencyBand,
    pub permission: LatencyBand,
}

impl Default for PortalLatencies {
    fn default() -> Self {
        Self {
            activation: LatencyBand::new(1500, 1000),
            connection: LatencyBand::new(2000, 1500),
            mapping: LatencyBand::new(1500, 1000),
            avatar: LatencyBand::new(2000, 1000),
            permission: LatencyBand::new(1000, 1000),
        }
    }
}

impl PortalLatencies {
    /// All-zero latencies for tests.
    pub const fn instant() -> Self {
        Self {
            activation: LatencyBand::ZERO,
            connection: LatencyBand::ZERO,
            mapping: LatencyBand::ZERO,
            avatar: LatencyBand::ZERO,
            permission: LatencyBand::ZERO,
        }
    }
}

/// The portal-side simulation engine.
pub struct PortalSimulator {
    rng: Box<dyn RandomSource>,
    directory: Arc<EntityDirectory>,
    latencies: PortalLatencies,
    field_active: bool,
    field_frequency: f64,
    quantum_states: HashMap<String, String>,
    approved_entities: HashSet<String>,
}

impl PortalSimulator {
    pub fn new(rng: Box<dyn RandomSource>, directory: Arc<EntityDirectory>) -> Self {
        Self::with_latencies(rng, directory, PortalLatencies::default())
    }

    pub fn with_latencies(
        rng: Box<dyn RandomSource>,
        directory: Arc<EntityDirectory>,
        latencies: PortalLatencies,
    ) -> Self {
        Self {
            rng,
            directory,
            latencies,
            field_active: false,
            field_frequency: 0.0,
            quantum_states: HashMap::new(),
            approved_entities: HashSet::new(),
        }
    }

    /// Attempts to bring the syntropic field up at the given frequency.
    ///
    /// Succeeds 95% of the time; on success the field stays active and
    /// remembers its frequency for later connections.
    pub async fn activate_portal(&mut self, resonance_frequency: f64) -> bool {
        let delay = self.latencies.activation.sample(self.rng.as_mut());
        tokio::time::sleep(delay).await;

        if self.rng.chance(ACTIVATION_SUCCESS_RATE) {
            self.field_active = true;
            self.field_frequency = resonance_frequency;
            true
        } else {
            false
        }
    }

    /// Connects to a consciousness signature.
    ///
    /// Fails when the field is down. Otherwise retrieval succeeds with a
    /// vibrational frequency scattered around the field frequency.
    pub async fn connect(&mut self, entity_id: &str) -> Option<ConsciousnessData> {
        let delay = self.latencies.connection.sample(self.rng.as_mut());
        tokio::time::sleep(delay).await;

        if !self.field_active {
            tracing::warn!(entity_id, "connection attempted with inactive field");
            return None;
        }

        Some(ConsciousnessData {
            entity_id: entity_id.to_string(),
            state: RetrievalState::Retrieved,
            vibrational_frequency: self.field_frequency * self.rng.range_f64(0.8, 1.2),
        })
    }

    /// Maps a retrieved consciousness onto a quantum state (95%).
    pub async fn map_to_quantum_state(&mut self, data: &ConsciousnessData) -> bool {
        let delay = self.latencies.mapping.sample(self.rng.as_mut());
        tokio::time::sleep(delay).await;

        if self.rng.chance(MAPPING_SUCCESS_RATE) {
            let tag = format!("QuantumState-{}", Uuid::new_v4().simple());
            self.quantum_states.insert(data.entity_id.clone(), tag);
            true
        } else {
            false
        }
    }

    /// Creates the avatar for a mapped entity, returning its display name.
    ///
    /// Requires a prior quantum-state mapping. Fails 10% of the time, and
    /// a failed creation burns the mapping.
    pub async fn create_avatar(&mut self, entity_id: &str) -> Option<String> {
        let delay = self.latencies.avatar.sample(self.rng.as_mut());
        tokio::time::sleep(delay).await;

        if !self.quantum_states.contains_key(entity_id) {
            tracing::warn!(entity_id, "no quantum state mapped; avatar creation failed");
            return None;
        }

        if self.rng.chance(AVATAR_SUCCESS_RATE) {
            let name = self
                .directory
                .display_name(entity_id)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    let suffix = entity_id.rsplit('_').next().unwrap_or("Generic");
                    format!("Avatar-{suffix}")
                });
            Some(name)
        } else {
            self.quantum_states.remove(entity_id);
            None
        }
    }

    /// Requests ethical clearance for an entity (85% approval).
    /// Approvals are remembered.
    pub async fn request_permission(&mut self, entity_id: &str) -> bool {
        let delay = self.latencies.permission.sample(self.rng.as_mut());
        tokio::time::sleep(delay).await;

        if self.rng.chance(PERMISSION_APPROVAL_RATE) {
            self.approved_entities.insert(entity_id.to_string());
            true
        } else {
            false
        }
    }

    /// Whether an entity has previously been cleared.
    pub fn verify_approval(&self, entity_id: &str) -> bool {
        self.approved_entities.contains(entity_id)
    }

    pub fn field_active(&self) -> bool {
        self.field_active
    }

    pub fn field_frequency(&self) -> f64 {
        self.field_frequency
    }
}
