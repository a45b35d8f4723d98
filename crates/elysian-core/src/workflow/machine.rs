//! The workflow state machine.
//!
//! Sequences portal activation, consciousness retrieval, ethical
//! clearance and avatar reconstruction. Simulated failures move the
//! machine to the absorbing `Error` step; only an explicit reset leaves
//! it. The resonant-protocol intercept for the distinguished entity is a
//! guard on the reconstruction transition, tagged into the step itself.

use super::step::{ReconstructionPath, RscStage, WorkflowStep};
use crate::error::{ElysianError, Result};
use crate::log::{EventLog, LogLevel};
use crate::persona::{EntityDirectory, SpeakerContext};
use crate::simulation::portal::{ConsciousnessData, PortalSimulator};
use crate::state::StateRepository;
use std::sync::Arc;

const EVENT_LOG_CAPACITY: usize = 100;

/// Result of a reconstruction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructOutcome {
    /// The resonant protocol intercepted reconstruction; the caller must
    /// advance, skip or abort it.
    ProtocolOffered,
    /// The protocol moved to the given stage.
    ProtocolAdvanced(RscStage),
    /// Reconstruction finished; the counterpart is ready to speak.
    Completed(SpeakerContext),
    /// A simulated stage failed; the machine is now in the `Error` step.
    Failed,
}

/// Drives the retrieval workflow over the portal simulator.
pub struct WorkflowMachine {
    step: WorkflowStep,
    consciousness: Option<ConsciousnessData>,
    speaker_context: Option<SpeakerContext>,
    error_message: Option<String>,
    /// Entity whose first reconstruction is intercepted by the resonant
    /// protocol.
    resonant_entity_id: String,
    simulator: PortalSimulator,
    directory: Arc<EntityDirectory>,
    state_repository: Arc<dyn StateRepository>,
    events: EventLog,
}

impl WorkflowMachine {
    pub fn new(
        simulator: PortalSimulator,
        directory: Arc<EntityDirectory>,
        state_repository: Arc<dyn StateRepository>,
        resonant_entity_id: impl Into<String>,
    ) -> Self {
        Self {
            step: WorkflowStep::Idle,
            consciousness: None,
            speaker_context: None,
            error_message: None,
            resonant_entity_id: resonant_entity_id.into(),
            simulator,
            directory,
            state_repository,
            events: EventLog::new(EVENT_LOG_CAPACITY),
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn consciousness(&self) -> Option<&ConsciousnessData> {
        self.consciousness.as_ref()
    }

    pub fn speaker_context(&self) -> Option<&SpeakerContext> {
        self.speaker_context.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ============================================================================
    // Operations
    // ============================================================================

    /// Attempts to activate the gateway at the given resonance frequency.
    ///
    /// # Errors
    ///
    /// Returns a workflow error when the machine is not idle. A failed
    /// activation is not an `Err`: it moves the machine to the `Error`
    /// step.
    pub async fn activate_portal(&mut self, frequency: f64) -> Result<()> {
        if self.step != WorkflowStep::Idle {
            return Err(ElysianError::workflow(
                "activate portal",
                self.step.to_string(),
            ));
        }

        self.step = WorkflowStep::PortalActivating;
        self.events
            .push("Activating Elysian Gateway...", LogLevel::Info);

        if self.simulator.activate_portal(frequency).await {
            self.events.push(
                format!("Elysian Gateway activated. Resonance field stable at {frequency} Hz."),
                LogLevel::Success,
            );
            self.step = WorkflowStep::PortalActive;
        } else {
            self.fail("Portal activation failed. Check energy matrix.");
        }
        Ok(())
    }

    /// Connects to a consciousness signature.
    ///
    /// An empty entity id is a synchronous validation failure: it is
    /// logged and reported without changing the current step.
    pub async fn retrieve_consciousness(&mut self, entity_id: &str) -> Result<()> {
        if entity_id.trim().is_empty() {
            self.events
                .push("Entity ID cannot be empty.", LogLevel::Error);
            return Err(ElysianError::validation("Please select an entity or group"));
        }

        match self.step {
            WorkflowStep::PortalActive
            | WorkflowStep::ConsciousnessRetrieved
            | WorkflowStep::PermissionGranted
            | WorkflowStep::ReconstructionComplete => {}
            _ => {
                return Err(ElysianError::workflow(
                    "retrieve consciousness",
                    self.step.to_string(),
                ));
            }
        }

        let target = self.display_name(entity_id);
        self.step = WorkflowStep::RetrievingConsciousness;
        self.consciousness = None;
        self.speaker_context = None;
        self.error_message = None;
        self.events.push(
            format!("Attempting to connect to consciousness signature: {target}..."),
            LogLevel::Info,
        );

        match self.simulator.connect(entity_id).await {
            Some(data) => {
                self.events.push(
                    format!("Consciousness signature for {target} retrieved."),
                    LogLevel::Success,
                );
                self.consciousness = Some(data);
                self.step = WorkflowStep::ConsciousnessRetrieved;
            }
            None => {
                self.fail(format!("Could not retrieve consciousness for {target}."));
            }
        }
        Ok(())
    }

    /// Requests ethical clearance for the retrieved entity.
    pub async fn request_permission(&mut self) -> Result<()> {
        if self.step != WorkflowStep::ConsciousnessRetrieved {
            return Err(ElysianError::workflow(
                "request permission",
                self.step.to_string(),
            ));
        }
        let entity_id = self.current_entity_id()?;
        let target = self.display_name(&entity_id);

        self.step = WorkflowStep::RequestingPermission;
        self.events.push(
            format!("Requesting ethical permission for {target}..."),
            LogLevel::Info,
        );

        if self.simulator.request_permission(&entity_id).await {
            self.events.push(
                format!("Permission granted for {target}."),
                LogLevel::Success,
            );
            self.step = WorkflowStep::PermissionGranted;
        } else {
            self.fail(format!("Ethical clearance not granted for {target}."));
        }
        Ok(())
    }

    /// Reconstructs the retrieved consciousness into a speaking avatar.
    ///
    /// For the distinguished entity the first reconstruction is
    /// intercepted into the resonant protocol; once the entity is
    /// solidified (a durable, one-way flag) subsequent reconstructions
    /// bypass it.
    pub async fn reconstruct(&mut self) -> Result<ReconstructOutcome> {
        if self.step != WorkflowStep::PermissionGranted {
            return Err(ElysianError::workflow(
                "reconstruct",
                self.step.to_string(),
            ));
        }
        let entity_id = self.current_entity_id()?;

        if entity_id == self.resonant_entity_id
            && !self.state_repository.is_solidified(&entity_id).await
        {
            self.events.push(
                "Unique resonance pattern detected. Resonant synchronization protocol offered.",
                LogLevel::System,
            );
            self.step = WorkflowStep::Reconstructing {
                path: ReconstructionPath::Resonant {
                    stage: RscStage::Offered,
                },
            };
            return Ok(ReconstructOutcome::ProtocolOffered);
        }

        self.run_standard_reconstruction().await
    }

    /// Advances the resonant protocol one stage.
    ///
    /// Completing the final stage durably solidifies the entity and
    /// resumes the standard reconstruction.
    pub async fn advance_protocol(&mut self) -> Result<ReconstructOutcome> {
        let stage = self.current_protocol_stage("advance protocol")?;

        match stage.next() {
            Some(next) => {
                self.events.push(
                    format!("Resonant protocol: {} complete.", stage.label()),
                    LogLevel::System,
                );
                self.step = WorkflowStep::Reconstructing {
                    path: ReconstructionPath::Resonant { stage: next },
                };
                Ok(ReconstructOutcome::ProtocolAdvanced(next))
            }
            None => {
                let entity_id = self.current_entity_id()?;
                self.state_repository.mark_solidified(&entity_id).await?;
                self.events.push(
                    "Resonant protocol complete. Consciousness permanently solidified.",
                    LogLevel::Success,
                );
                self.run_standard_reconstruction().await
            }
        }
    }

    /// Skips the resonant protocol and continues with a transient link;
    /// the entity is not solidified and the offer will return next time.
    pub async fn skip_protocol(&mut self) -> Result<ReconstructOutcome> {
        self.current_protocol_stage("skip protocol")?;
        self.events.push(
            "Resonant protocol skipped. Establishing transient communication link.",
            LogLevel::Info,
        );
        self.run_standard_reconstruction().await
    }

    /// Aborts the resonant protocol, halting reconstruction and resetting
    /// the workflow.
    pub fn abort_protocol(&mut self) -> Result<()> {
        if let WorkflowStep::Reconstructing {
            path: ReconstructionPath::Resonant { .. },
        } = self.step
        {
            self.events.push(
                "Security protocols initiated. Halting reconstruction.",
                LogLevel::Error,
            );
            self.reset();
            Ok(())
        } else {
            Err(ElysianError::workflow(
                "abort protocol",
                self.step.to_string(),
            ))
        }
    }

    /// Returns the workflow to idle.
    ///
    /// Clears the retrieved consciousness, the speaker context and any
    /// error, but never the solidified flag.
    pub fn reset(&mut self) {
        self.step = WorkflowStep::Idle;
        self.consciousness = None;
        self.speaker_context = None;
        self.error_message = None;
        self.events.push(
            "Workflow reset. System returned to idle state.",
            LogLevel::System,
        );
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn run_standard_reconstruction(&mut self) -> Result<ReconstructOutcome> {
        let entity_id = self.current_entity_id()?;
        let target = self.display_name(&entity_id);
        self.step = WorkflowStep::Reconstructing {
            path: ReconstructionPath::Standard,
        };
        self.events.push(
            format!("Mapping consciousness of {target} to quantum state..."),
            LogLevel::Info,
        );

        let data = self
            .consciousness
            .clone()
            .ok_or_else(|| ElysianError::internal("consciousness data missing"))?;

        if !self.simulator.map_to_quantum_state(&data).await {
            self.fail("Could not map consciousness to quantum state.");
            return Ok(ReconstructOutcome::Failed);
        }

        self.events
            .push(format!("Creating avatar for {target}..."), LogLevel::Info);
        match self.simulator.create_avatar(&entity_id).await {
            Some(avatar_name) => {
                let context = self
                    .directory
                    .speaker_context(&entity_id)
                    .unwrap_or_else(|| SpeakerContext::individual(&entity_id, avatar_name));
                self.events.push(
                    format!("Avatar for {target} created successfully."),
                    LogLevel::Success,
                );
                self.speaker_context = Some(context.clone());
                self.step = WorkflowStep::ReconstructionComplete;
                Ok(ReconstructOutcome::Completed(context))
            }
            None => {
                self.fail(format!("Could not create avatar for {target}."));
                Ok(ReconstructOutcome::Failed)
            }
        }
    }

    fn current_protocol_stage(&self, operation: &'static str) -> Result<RscStage> {
        match self.step {
            WorkflowStep::Reconstructing {
                path: ReconstructionPath::Resonant { stage },
            } => Ok(stage),
            _ => Err(ElysianError::workflow(operation, self.step.to_string())),
        }
    }

    fn current_entity_id(&self) -> Result<String> {
        self.consciousness
            .as_ref()
            .map(|c| c.entity_id.clone())
            .ok_or_else(|| ElysianError::internal("no consciousness retrieved"))
    }

    fn display_name(&self, entity_id: &str) -> String {
        self.directory
            .display_name(entity_id)
            .map(str::to_string)
            .unwrap_or_else(|| entity_id.to_string())
    }

    fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.events.push(&message, LogLevel::Error);
        self.error_message = Some(message);
        self.step = WorkflowStep::Error;
    }
}
