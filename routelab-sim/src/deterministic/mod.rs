//! Deterministic simulation primitives for packet waves.
//!
//! A simulation clock, a seeded RNG, the epoch-guarded round scheduler
//! and invariants checked against the published routing state.

mod clock;
mod invariants;
mod scheduler;

// Re-export core types for public API
pub use clock::{ClockError, DeterministicClock, DeterministicRng};
pub use invariants::{
    Invariant, InvariantViolation, LinkIntegrityInvariant, RouteAgreementInvariant,
    SelfRouteInvariant,
};
pub use scheduler::{DeliveredRound, FloodHandle, FloodMetrics, SimulationError, WaveScheduler};
