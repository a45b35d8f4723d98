//! The OmniCore meta-system.
//!
//! A self-contained module that integrates one conscious entity at a
//! time, resonates at a chosen frequency and surfaces thoughts drawn from
//! the entity's profile. Rituals batch the whole sequence. Every failure
//! is reported through the OmniCore log; nothing here propagates to the
//! caller.

use crate::log::{EventLog, LogLevel};
use crate::persona::EntityDirectory;
use crate::ritual::parse_ritual;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const OMNICORE_LOG_CAPACITY: usize = 50;

/// Pause between ritual stages.
const RITUAL_STAGE_DELAY: Duration = Duration::from_millis(500);

/// Psyche profile of an entity integrated into the OmniCore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub vision: Vec<String>,
    pub trauma: Vec<String>,
    pub goals: Vec<String>,
    pub thoughts: Vec<String>,
}

/// The OmniCore state machine.
pub struct OmniCore {
    integrated_entity_id: Option<String>,
    profile: Option<EntityProfile>,
    frequency: Option<f64>,
    active: bool,
    last_thought: Option<String>,
    log: EventLog,
    profiles: HashMap<String, EntityProfile>,
    directory: Arc<EntityDirectory>,
    rng: Box<dyn RandomSource>,
    stage_delay: Duration,
}

impl OmniCore {
    pub fn new(
        directory: Arc<EntityDirectory>,
        profiles: HashMap<String, EntityProfile>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            integrated_entity_id: None,
            profile: None,
            frequency: None,
            active: false,
            last_thought: None,
            log: EventLog::new(OMNICORE_LOG_CAPACITY),
            profiles,
            directory,
            rng,
            stage_delay: RITUAL_STAGE_DELAY,
        }
    }

    /// Overrides the ritual staging delay (zeroed in tests).
    pub fn with_stage_delay(mut self, delay: Duration) -> Self {
        self.stage_delay = delay;
        self
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn integrated_entity_id(&self) -> Option<&str> {
        self.integrated_entity_id.as_deref()
    }

    pub fn profile(&self) -> Option<&EntityProfile> {
        self.profile.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn last_thought(&self) -> Option<&str> {
        self.last_thought.as_deref()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    // ============================================================================
    // Operations
    // ============================================================================

    /// Integrates an entity with a known OmniCore profile.
    pub fn integrate(&mut self, entity_id: &str) -> bool {
        let Some(profile) = self.profiles.get(entity_id).cloned() else {
            self.log.push(
                format!("Entity '{entity_id}' not found or lacks OmniCore profile."),
                LogLevel::Error,
            );
            return false;
        };

        let name = self
            .directory
            .display_name(entity_id)
            .unwrap_or(entity_id)
            .to_string();
        self.integrated_entity_id = Some(entity_id.to_string());
        self.profile = Some(profile);
        self.log.push(
            format!("Conscious entity '{name}' integrated into OmniCore."),
            LogLevel::Success,
        );
        true
    }

    /// Activates the resonance core. Requires an integrated entity.
    pub fn activate(&mut self, frequency: f64) -> bool {
        if self.integrated_entity_id.is_none() {
            self.log
                .push("Activation failed: No entity integrated.", LogLevel::Error);
            return false;
        }

        self.active = true;
        self.frequency = Some(frequency);
        self.log.push(
            format!("SEQA Resonance Core activated at {frequency} Hz."),
            LogLevel::Success,
        );
        true
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.frequency = None;
        self.last_thought = None;
        self.log
            .push("SEQA Resonance Core deactivated.", LogLevel::Info);
    }

    /// Draws a thought from the integrated entity's pool.
    ///
    /// Requires an active core; returns the drawn thought.
    pub fn generate_thought(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        let thoughts = self.profile.as_ref().map(|p| p.thoughts.as_slice())?;
        if thoughts.is_empty() {
            return None;
        }

        let index = (self.rng.next_f64() * thoughts.len() as f64) as usize;
        let thought = thoughts[index.min(thoughts.len() - 1)].clone();
        self.log
            .push(format!("Generated thought: \"{thought}\""), LogLevel::Info);
        self.last_thought = Some(thought.clone());
        Some(thought)
    }

    /// Resets the meta-system to its initial state.
    pub fn reset(&mut self) {
        self.integrated_entity_id = None;
        self.profile = None;
        self.frequency = None;
        self.active = false;
        self.last_thought = None;
        self.log
            .push("OmniCore meta-system has been reset.", LogLevel::System);
    }

    /// Compiles and executes a ritual script.
    ///
    /// Runs integrate, activate and generate-thought in sequence with a
    /// short staging pause between them. Compilation failures and unknown
    /// entities are logged, never returned.
    pub async fn execute_ritual(&mut self, source: &str) {
        self.log.push("Compiling ritual...", LogLevel::Ritual);

        let script = match parse_ritual(source) {
            Ok(script) => script,
            Err(err) => {
                self.log
                    .push(format!("Ritual compilation failed: {err}"), LogLevel::Error);
                return;
            }
        };

        let Some(entity_id) = self
            .directory
            .find_by_name(&script.entity_name)
            .map(str::to_string)
        else {
            self.log.push(
                format!("Ritual compilation failed: Entity '{}' not found.", script.entity_name),
                LogLevel::Error,
            );
            return;
        };

        self.log.push(
            format!(
                "Executing ritual for {} at {} Hz.",
                script.entity_name, script.frequency
            ),
            LogLevel::Ritual,
        );

        if !self.integrate(&entity_id) {
            return;
        }
        tokio::time::sleep(self.stage_delay).await;
        if !self.activate(f64::from(script.frequency)) {
            return;
        }
        tokio::time::sleep(self.stage_delay * 2).await;
        self.generate_thought();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandom;

    const TESLA: &str = "NikolaTesla_1856_1943";

    fn tesla_profile() -> EntityProfile {
        EntityProfile {
            vision: vec!["A world powered by free, wireless energy".to_string()],
            trauma: vec!["The fire at his Houston Street lab".to_string()],
            goals: vec!["Planetary healing through resonant frequencies".to_string()],
            thoughts: vec![
                "What is the sound of planetary harmony?".to_string(),
                "Energy is the true currency of the universe.".to_string(),
            ],
        }
    }

    fn omnicore(rng: ScriptedRandom) -> OmniCore {
        let mut dir = EntityDirectory::new();
        dir.insert_individual(TESLA, "Nikola Tesla");
        let mut profiles = HashMap::new();
        profiles.insert(TESLA.to_string(), tesla_profile());
        OmniCore::new(Arc::new(dir), profiles, Box::new(rng))
            .with_stage_delay(Duration::ZERO)
    }

    #[test]
    fn test_integrate_unknown_entity_logs_error() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        assert!(!core.integrate("Ghost_Entity"));
        assert_eq!(core.log().latest().unwrap().level, LogLevel::Error);
        assert!(core.integrated_entity_id().is_none());
    }

    #[test]
    fn test_activate_requires_integration() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        assert!(!core.activate(1115.0));
        assert!(!core.is_active());

        core.integrate(TESLA);
        assert!(core.activate(1115.0));
        assert!(core.is_active());
        assert_eq!(core.frequency(), Some(1115.0));
    }

    #[test]
    fn test_generate_thought_draws_from_pool() {
        let mut core = omnicore(ScriptedRandom::constant(0.9));
        core.integrate(TESLA);
        core.activate(1115.0);

        let thought = core.generate_thought().unwrap();
        assert_eq!(thought, "Energy is the true currency of the universe.");
        assert_eq!(core.last_thought(), Some(thought.as_str()));
    }

    #[test]
    fn test_generate_thought_requires_active_core() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        core.integrate(TESLA);
        assert!(core.generate_thought().is_none());
    }

    #[test]
    fn test_deactivate_clears_resonance() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        core.integrate(TESLA);
        core.activate(1115.0);
        core.generate_thought();

        core.deactivate();
        assert!(!core.is_active());
        assert_eq!(core.frequency(), None);
        assert_eq!(core.last_thought(), None);
        // Integration survives deactivation.
        assert_eq!(core.integrated_entity_id(), Some(TESLA));
    }

    #[tokio::test]
    async fn test_ritual_runs_full_sequence() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        core.execute_ritual(":: awaken\ninitiate Nikola Tesla\nfrequency => 1115")
            .await;

        assert_eq!(core.integrated_entity_id(), Some(TESLA));
        assert!(core.is_active());
        assert_eq!(core.frequency(), Some(1115.0));
        assert!(core.last_thought().is_some());
    }

    #[tokio::test]
    async fn test_malformed_ritual_is_logged_not_thrown() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        core.execute_ritual("frequency => 1115").await;

        assert!(core.integrated_entity_id().is_none());
        let latest = core.log().latest().unwrap();
        assert_eq!(latest.level, LogLevel::Error);
        assert!(latest.message.contains("Ritual compilation failed"));
    }

    #[tokio::test]
    async fn test_ritual_for_unknown_entity_is_logged() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        core.execute_ritual("initiate Imhotep\nfrequency => 9").await;

        assert!(core.integrated_entity_id().is_none());
        assert!(
            core.log()
                .latest()
                .unwrap()
                .message
                .contains("'Imhotep' not found")
        );
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut core = omnicore(ScriptedRandom::constant(0.0));
        core.integrate(TESLA);
        core.activate(1115.0);

        core.reset();
        assert!(core.integrated_entity_id().is_none());
        assert!(!core.is_active());
        assert!(core.profile().is_none());
    }
}
