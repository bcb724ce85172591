//! Routelab Sim - Flood scheduling and the simulator facade
//!
//! Packet waves are planned from the current adjacency view and played
//! through a deterministic discrete-event scheduler, so every flood,
//! cancellation and interleaving is reproducible in tests. The
//! `RoutingSimulator` owns one network and exposes the operations a UI
//! drives; `play_realtime` paces its floods against tokio timers.

pub mod deterministic;
pub mod flood;
pub mod realtime;
pub mod simulator;
pub mod topology_gen;

pub use deterministic::{
    ClockError, DeliveredRound, DeterministicClock, DeterministicRng, FloodHandle, FloodMetrics,
    Invariant, InvariantViolation, LinkIntegrityInvariant, RouteAgreementInvariant,
    SelfRouteInvariant, SimulationError, WaveScheduler,
};
pub use flood::{FloodKind, FloodPlan, HopEvent, plan_full_flood, plan_hello, plan_network_hello};
pub use realtime::play_realtime;
pub use simulator::RoutingSimulator;
pub use topology_gen::{TopologySpec, generate_topology};
