//! Simulation time and seeded randomness.

use std::time::Duration;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Maximum time that can be advanced in a single operation (24 hours).
const MAX_TIME_ADVANCE: Duration = Duration::from_secs(86400);

/// Errors raised by clock manipulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("Cannot move simulation time backwards from {current:?} to {target:?}")]
    Backwards { current: Duration, target: Duration },

    #[error("Cannot advance simulation time by {requested:?} in one step")]
    AdvanceTooLarge { requested: Duration },
}

/// Simulation clock measured from time zero.
///
/// Time only moves forward and is independent of wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Creates a clock at simulation time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the elapsed simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Returns the time `step` from now without moving the clock.
    ///
    /// # Errors
    ///
    /// - `ClockError::AdvanceTooLarge` - Step exceeds 24 hours
    pub fn step_target(&self, step: Duration) -> Result<Duration, ClockError> {
        if step > MAX_TIME_ADVANCE {
            return Err(ClockError::AdvanceTooLarge { requested: step });
        }
        Ok(self.now + step)
    }

    /// Moves simulation time to `target`.
    ///
    /// # Errors
    ///
    /// - `ClockError::Backwards` - Target lies before the current time
    pub fn advance_to(&mut self, target: Duration) -> Result<(), ClockError> {
        if target < self.now {
            return Err(ClockError::Backwards {
                current: self.now,
                target,
            });
        }
        self.now = target;
        Ok(())
    }
}

/// Seeded random number generator for reproducible topologies.
///
/// Uses ChaCha8 so the same seed yields the same sequence on every
/// platform.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl DeterministicRng {
    /// Creates deterministic RNG from seed value.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates random number in range [0, 1).
    pub fn random_f64(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generates random number in range [min, max).
    pub fn random_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.rng.next_u64() % (max - min))
    }

    /// Generates random boolean with given probability.
    pub fn random_bool(&mut self, probability: f64) -> bool {
        self.random_f64() < probability
    }

    /// Selects random element from slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        let index = self.random_range(0, slice.len() as u64) as usize;
        slice.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let mut clock = DeterministicClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        let target = clock.step_target(Duration::from_millis(1200)).unwrap();
        clock.advance_to(target).unwrap();
        assert_eq!(clock.now(), Duration::from_millis(1200));
        clock.advance_to(Duration::from_secs(3)).unwrap();

        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_clock_rejects_backwards() {
        let mut clock = DeterministicClock::new();
        clock.advance_to(Duration::from_secs(2)).unwrap();

        let err = clock.advance_to(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ClockError::Backwards { .. }));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_clock_rejects_huge_advance() {
        let clock = DeterministicClock::new();
        let err = clock.step_target(Duration::from_secs(90_000)).unwrap_err();
        assert!(matches!(err, ClockError::AdvanceTooLarge { .. }));
        assert!(clock.step_target(Duration::from_secs(86_400)).is_ok());
    }

    #[test]
    fn test_rng_is_reproducible() {
        let mut first = DeterministicRng::from_seed(42);
        let mut second = DeterministicRng::from_seed(42);

        for _ in 0..16 {
            assert_eq!(first.random_range(0, 1000), second.random_range(0, 1000));
        }
        assert_eq!(first.seed(), 42);
    }

    #[test]
    fn test_rng_ranges() {
        let mut rng = DeterministicRng::from_seed(7);
        for _ in 0..100 {
            let value = rng.random_range(3, 9);
            assert!((3..9).contains(&value));
            let unit = rng.random_f64();
            assert!((0.0..1.0).contains(&unit));
        }
        assert_eq!(rng.random_range(5, 5), 5);
        assert!(rng.choose::<u8>(&[]).is_none());
    }
}
