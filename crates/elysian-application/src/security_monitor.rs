//! Driver loop for the sentinel network simulation.
//!
//! Schedules security ticks on randomized timers and surfaces the purge
//! cycle. The loop is a single tokio task, cancelled cooperatively when
//! the monitor stops or is dropped.

use elysian_core::log::LogEntry;
use elysian_core::simulation::{SecuritySimulator, SecurityStatus};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Point-in-time view of the sentinel network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecuritySnapshot {
    pub integrity: f64,
    pub infractions: u32,
    pub status: SecurityStatus,
}

/// Owns the security simulator and its tick loop.
pub struct SecurityMonitor {
    simulator: Arc<Mutex<SecuritySimulator>>,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl SecurityMonitor {
    pub fn new(simulator: SecuritySimulator) -> Self {
        Self {
            simulator: Arc::new(Mutex::new(simulator)),
            task: StdMutex::new(None),
        }
    }

    /// Starts the tick loop. Restarts it if one is already running.
    pub async fn start(&self) {
        self.stop();

        let simulator = self.simulator.clone();
        let initial_delay = simulator.lock().await.initial_delay();

        let handle = tokio::spawn(async move {
            let mut delay = initial_delay;
            loop {
                tokio::time::sleep(delay).await;
                let next = {
                    let mut sim = simulator.lock().await;
                    if let Some(event) = sim.tick() {
                        tracing::warn!(
                            integrity = event.integrity,
                            infractions = event.infractions,
                            "{}",
                            event.message
                        );
                    }
                    sim.next_interval()
                };
                delay = next;
            }
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(handle);
        }
    }

    /// Stops the tick loop; no queued tick fires afterwards.
    pub fn stop(&self) {
        if let Ok(mut slot) = self.task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Runs the purge cycle and returns the restored state.
    ///
    /// The simulator lock is held across the cycle, so ticks cannot
    /// interleave with a purge and callers always observe all-or-nothing.
    pub async fn purge(&self) -> SecuritySnapshot {
        let mut sim = self.simulator.lock().await;
        sim.purge().await;
        Self::snapshot_of(&sim)
    }

    pub async fn snapshot(&self) -> SecuritySnapshot {
        let sim = self.simulator.lock().await;
        Self::snapshot_of(&sim)
    }

    /// The current threat log, newest first.
    pub async fn threat_log(&self) -> Vec<LogEntry> {
        let sim = self.simulator.lock().await;
        sim.threat_log().entries().cloned().collect()
    }

    fn snapshot_of(sim: &SecuritySimulator) -> SecuritySnapshot {
        SecuritySnapshot {
            integrity: sim.integrity(),
            infractions: sim.infractions(),
            status: sim.status(),
        }
    }
}

impl Drop for SecurityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elysian_core::rng::ScriptedRandom;
    use std::time::Duration;

    fn simulator(rng: ScriptedRandom) -> SecuritySimulator {
        SecuritySimulator::new(Box::new(rng)).with_purge_latency(Duration::ZERO)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_lands_after_initial_delay() {
        // First tick: infraction (0.1, drop 0.5, message 0.0), then a
        // 10 s interval; fallback 0.9 keeps later ticks quiet.
        let rng = ScriptedRandom::new([0.1, 0.5, 0.0, 0.5]).with_fallback(0.9);
        let monitor = SecurityMonitor::new(simulator(rng));
        monitor.start().await;

        tokio::time::sleep(Duration::from_secs(9)).await;

        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.infractions, 1);
        assert_eq!(snapshot.integrity, 87.5);
        assert_eq!(monitor.threat_log().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_queued_ticks() {
        let rng = ScriptedRandom::new([0.1, 0.5, 0.0, 0.5]).with_fallback(0.1);
        let monitor = SecurityMonitor::new(simulator(rng));
        monitor.start().await;
        tokio::time::sleep(Duration::from_secs(9)).await;

        monitor.stop();
        let before = monitor.snapshot().await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(monitor.snapshot().await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_restores_after_decay() {
        let rng = ScriptedRandom::new([0.1, 0.5, 0.0, 0.5]).with_fallback(0.9);
        let monitor = SecurityMonitor::new(simulator(rng));
        monitor.start().await;
        tokio::time::sleep(Duration::from_secs(9)).await;

        let restored = monitor.purge().await;
        assert_eq!(restored.integrity, 100.0);
        assert_eq!(restored.infractions, 0);
        assert_eq!(restored.status, SecurityStatus::Secure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_is_idempotent() {
        let monitor = SecurityMonitor::new(simulator(ScriptedRandom::constant(0.9)));

        let first = monitor.purge().await;
        let second = monitor.purge().await;
        assert_eq!(first, second);
        assert_eq!(second.integrity, 100.0);
        assert_eq!(second.infractions, 0);
    }
}
