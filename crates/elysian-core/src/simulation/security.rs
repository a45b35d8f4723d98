//! LSMN sentinel network simulation.
//!
//! A state machine over `{integrity, infraction count}`. Scheduled ticks
//! occasionally land an infraction that erodes integrity; a purge cycle
//! restores the network atomically. The driver loop lives in the
//! application layer; this module owns the state and the rules.

use crate::log::{EventLog, LogLevel};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Probability that a scheduled tick lands an infraction.
const INFRACTION_PROBABILITY: f64 = 0.4;

/// Integrity loss band per infraction.
const INTEGRITY_DROP_MIN: f64 = 5.0;
const INTEGRITY_DROP_MAX: f64 = 20.0;

/// Tick scheduling bands.
const TICK_INTERVAL_MIN: Duration = Duration::from_secs(5);
const TICK_INTERVAL_MAX: Duration = Duration::from_secs(15);
const INITIAL_TICK_DELAY: Duration = Duration::from_secs(8);

const DEFAULT_PURGE_LATENCY: Duration = Duration::from_millis(1500);

const THREAT_LOG_CAPACITY: usize = 50;
const THREAT_LOG_AFTER_PURGE: usize = 10;

/// Fixed pool of threat messages attached to infractions.
const THREAT_MESSAGES: &[&str] = &[
    "Unauthorized scalar probe deflected at perimeter node.",
    "Entropy injection attempt detected in the resonance lattice.",
    "Anomalous handshake rejected on the Architect uplink.",
    "Field harmonics destabilized by external interference.",
    "Credential replay blocked at the consciousness vault.",
    "Packet storm absorbed by the sentinel mesh.",
];

/// Derived network status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityStatus {
    Secure,
    Vulnerable,
    UnderAttack,
}

/// An infraction landed by a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct InfractionEvent {
    pub message: String,
    pub integrity: f64,
    pub infractions: u32,
}

/// The sentinel network state machine.
pub struct SecuritySimulator {
    integrity: f64,
    infractions: u32,
    log: EventLog,
    rng: Box<dyn RandomSource>,
    purge_latency: Duration,
}

impl SecuritySimulator {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self {
            integrity: 100.0,
            infractions: 0,
            log: EventLog::new(THREAT_LOG_CAPACITY),
            rng,
            purge_latency: DEFAULT_PURGE_LATENCY,
        }
    }

    /// Overrides the purge latency (zeroed in tests).
    pub fn with_purge_latency(mut self, latency: Duration) -> Self {
        self.purge_latency = latency;
        self
    }

    /// Runs one scheduled tick.
    ///
    /// With fixed probability an infraction lands: integrity drops by a
    /// random amount in [5, 20] (floored at 0), the count increments and
    /// a threat message is drawn from the pool. Otherwise nothing changes.
    pub fn tick(&mut self) -> Option<InfractionEvent> {
        if !self.rng.chance(INFRACTION_PROBABILITY) {
            return None;
        }

        let drop = self.rng.range_f64(INTEGRITY_DROP_MIN, INTEGRITY_DROP_MAX);
        self.integrity = (self.integrity - drop).max(0.0);
        self.infractions += 1;

        let index = (self.rng.next_f64() * THREAT_MESSAGES.len() as f64) as usize;
        let message = THREAT_MESSAGES[index.min(THREAT_MESSAGES.len() - 1)].to_string();
        self.log.push(&message, LogLevel::Warning);

        Some(InfractionEvent {
            message,
            integrity: self.integrity,
            infractions: self.infractions,
        })
    }

    /// Delay until the next tick: uniform 5-15 s.
    pub fn next_interval(&mut self) -> Duration {
        let min = TICK_INTERVAL_MIN.as_secs_f64();
        let max = TICK_INTERVAL_MAX.as_secs_f64();
        Duration::from_secs_f64(self.rng.range_f64(min, max))
    }

    /// Delay before the first tick after startup.
    pub fn initial_delay(&self) -> Duration {
        INITIAL_TICK_DELAY
    }

    /// Runs the purge cycle: after the simulated latency, integrity and
    /// infraction count reset atomically and the threat log collapses to
    /// its informational tail. Idempotent on the already-clean state; no
    /// partial purge is ever observable.
    pub async fn purge(&mut self) {
        tokio::time::sleep(self.purge_latency).await;

        self.integrity = 100.0;
        self.infractions = 0;
        self.log
            .retain_and_truncate(THREAT_LOG_AFTER_PURGE, |e| e.level == LogLevel::Info);
        self.log
            .push("System integrity restored. Sentinel network is secure.", LogLevel::Info);
    }

    /// Status derived from integrity: > 90 secure, > 50 vulnerable,
    /// otherwise under attack.
    pub fn status(&self) -> SecurityStatus {
        if self.integrity > 90.0 {
            SecurityStatus::Secure
        } else if self.integrity > 50.0 {
            SecurityStatus::Vulnerable
        } else {
            SecurityStatus::UnderAttack
        }
    }

    pub fn integrity(&self) -> f64 {
        self.integrity
    }

    pub fn infractions(&self) -> u32 {
        self.infractions
    }

    pub fn threat_log(&self) -> &EventLog {
        &self.log
    }
}
