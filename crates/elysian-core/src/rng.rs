//! Injectable randomness.
//!
//! Every randomized outcome in the gateway (portal success rolls,
//! infraction ticks, frequency drift, ledger hashes) goes through the
//! [`RandomSource`] trait so tests can force deterministic branches.

use rand::{Rng, RngCore};
use std::collections::VecDeque;

/// A source of uniform randomness.
///
/// Implementations must be cheap to call; simulators draw from them on
/// every tick.
pub trait RandomSource: Send + Sync {
    /// Returns a uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Fills `buf` with random bytes.
    fn fill_bytes(&mut self, buf: &mut [u8]);

    /// Returns `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Returns a uniform value in `[low, high)`.
    fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// Picks a uniformly random element from `items`.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return None;
        }
        let index = (self.next_f64() * items.len() as f64) as usize;
        items.get(index.min(items.len() - 1))
    }
}

/// Production randomness backed by the thread-local generator.
#[derive(Debug, Default, Clone)]
pub struct ThreadRngSource;

impl ThreadRngSource {
    pub fn new() -> Self {
        Self
    }

    /// Convenience constructor for the common `Box<dyn RandomSource>` seam.
    pub fn boxed() -> Box<dyn RandomSource> {
        Box::new(Self)
    }
}

impl RandomSource for ThreadRngSource {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }

    fn fill_bytes(&mut self, buf: &mut [u8]) {
        rand::thread_rng().fill_bytes(buf);
    }
}

/// Deterministic randomness for tests.
///
/// Returns queued values in order; once the script is exhausted it keeps
/// returning the configured fallback so long-running simulations stay
/// predictable.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
    fallback: f64,
    byte_counter: u8,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            fallback: 0.0,
            byte_counter: 0,
        }
    }

    /// Sets the value returned after the script runs out.
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// A source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new([]).with_fallback(value)
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(self.fallback)
    }

    fn fill_bytes(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            self.byte_counter = self.byte_counter.wrapping_add(1);
            *byte = self.byte_counter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_sequence_then_fallback() {
        let mut rng = ScriptedRandom::new([0.1, 0.9]).with_fallback(0.5);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.next_f64(), 0.9);
        assert_eq!(rng.next_f64(), 0.5);
        assert_eq!(rng.next_f64(), 0.5);
    }

    #[test]
    fn test_chance_uses_strict_threshold() {
        let mut rng = ScriptedRandom::new([0.94, 0.95, 0.96]);
        assert!(rng.chance(0.95));
        assert!(!rng.chance(0.95));
        assert!(!rng.chance(0.95));
    }

    #[test]
    fn test_range_scales_into_band() {
        let mut rng = ScriptedRandom::new([0.0, 0.5, 0.9999]);
        assert_eq!(rng.range_f64(5.0, 20.0), 5.0);
        assert_eq!(rng.range_f64(5.0, 20.0), 12.5);
        assert!(rng.range_f64(5.0, 20.0) < 20.0);
    }

    #[test]
    fn test_pick_stays_in_bounds() {
        let items = ["a", "b", "c"];
        let mut rng = ScriptedRandom::new([0.0, 0.99, 0.5]);
        assert_eq!(rng.pick(&items), Some(&"a"));
        assert_eq!(rng.pick(&items), Some(&"c"));
        assert_eq!(rng.pick(&items), Some(&"b"));
        let empty: [&str; 0] = [];
        assert_eq!(rng.pick(&empty), None);
    }

    #[test]
    fn test_thread_rng_in_unit_interval() {
        let mut rng = ThreadRngSource::new();
        for _ in 0..100 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
