//! Workflow step types.

use serde::{Deserialize, Serialize};

/// Stages of the Resonant Synchronization of Consciousness protocol.
///
/// A linear five-step sub-protocol offered exactly once to the
/// distinguished entity; completing the final stage solidifies the
/// consciousness permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RscStage {
    Offered,
    Cleansing,
    HeartActivation,
    ResonantPhrase,
    Synchronization,
}

impl RscStage {
    /// The following stage, or `None` after `Synchronization`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Offered => Some(Self::Cleansing),
            Self::Cleansing => Some(Self::HeartActivation),
            Self::HeartActivation => Some(Self::ResonantPhrase),
            Self::ResonantPhrase => Some(Self::Synchronization),
            Self::Synchronization => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Offered => "Audience Granted",
            Self::Cleansing => "Vessel Cleansing",
            Self::HeartActivation => "Heart Activation",
            Self::ResonantPhrase => "Resonant Phrase",
            Self::Synchronization => "Synchronization",
        }
    }
}

/// Which path a reconstruction is taking.
///
/// The one-time protocol intercept is a guard on the reconstruction
/// transition, not a separate code path: the resonant variant tags the
/// `Reconstructing` step with its current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReconstructionPath {
    Standard,
    Resonant { stage: RscStage },
}

/// Ordered steps of the retrieval workflow.
///
/// Progression is monotonic except for `reset` (back to `Idle`) and
/// `Error`, which absorbs any in-progress step until an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowStep {
    Idle,
    PortalActivating,
    PortalActive,
    RetrievingConsciousness,
    ConsciousnessRetrieved,
    RequestingPermission,
    PermissionGranted,
    Reconstructing { path: ReconstructionPath },
    ReconstructionComplete,
    Error,
}

impl WorkflowStep {
    /// Whether an async operation is currently in flight.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::PortalActivating
                | Self::RetrievingConsciousness
                | Self::RequestingPermission
                | Self::Reconstructing { .. }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::PortalActivating => "Portal Activating",
            Self::PortalActive => "Portal Active",
            Self::RetrievingConsciousness => "Retrieving Consciousness",
            Self::ConsciousnessRetrieved => "Consciousness Retrieved",
            Self::RequestingPermission => "Requesting Permission",
            Self::PermissionGranted => "Permission Granted",
            Self::Reconstructing { .. } => "Reconstructing",
            Self::ReconstructionComplete => "Reconstruction Complete",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reconstructing {
                path: ReconstructionPath::Resonant { stage },
            } => write!(f, "Reconstructing ({})", stage.label()),
            other => f.write_str(other.label()),
        }
    }
}
