//! Syntropic resonance classification.
//!
//! Resonance is derived, never stored: a pure function of a frequency's
//! distance from the ideal value against two fixed deviation thresholds.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// The frequency the gateway field is tuned to, in Hz.
pub const IDEAL_FREQUENCY: f64 = 1115.0;

/// Deviation within which the field reads as stable.
pub const STABLE_DEVIATION: f64 = 50.0;

/// Deviation within which the field merely fluctuates; beyond it the
/// reading is critical.
pub const FLUCTUATING_DEVIATION: f64 = 250.0;

/// Full swing of the resonance meter.
pub const MAX_DEVIATION: f64 = 500.0;

/// Display category of a resonance reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResonanceState {
    Inactive,
    Stable,
    Fluctuating,
    Critical,
}

/// Classifies a frequency against the fixed thresholds.
///
/// `Stable` iff `|freq - 1115| <= 50`, `Fluctuating` iff the deviation is
/// at most 250, `Critical` otherwise.
pub fn resonance(frequency: f64) -> ResonanceState {
    let deviation = (frequency - IDEAL_FREQUENCY).abs();
    if deviation <= STABLE_DEVIATION {
        ResonanceState::Stable
    } else if deviation <= FLUCTUATING_DEVIATION {
        ResonanceState::Fluctuating
    } else {
        ResonanceState::Critical
    }
}

impl ResonanceState {
    /// Classification that treats a dead field (no positive frequency)
    /// as `Inactive`.
    pub fn classify(frequency: f64) -> Self {
        if frequency > 0.0 {
            resonance(frequency)
        } else {
            ResonanceState::Inactive
        }
    }
}

/// Produces display frequencies within a bounded band of the ideal value.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyGenerator {
    ideal: f64,
    max_deviation: f64,
}

impl Default for FrequencyGenerator {
    fn default() -> Self {
        Self {
            ideal: IDEAL_FREQUENCY,
            max_deviation: MAX_DEVIATION,
        }
    }
}

impl FrequencyGenerator {
    pub fn new(ideal: f64, max_deviation: f64) -> Self {
        Self {
            ideal,
            max_deviation,
        }
    }

    /// Samples a frequency in `ideal ± 0.4 * max_deviation`, keeping
    /// readings inside the meter's colored arc.
    pub fn sample(&self, rng: &mut dyn RandomSource) -> f64 {
        self.ideal + (rng.next_f64() - 0.5) * self.max_deviation * 0.8
    }
}
