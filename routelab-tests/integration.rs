//! Integration tests for Routelab
//!
//! These tests drive the simulator facade end to end: topology edits,
//! routing recomputation under both protocols, flood scheduling,
//! undo/redo and persistence.

#[path = "integration/routing_scenarios.rs"]
mod routing_scenarios;

#[path = "integration/routing_properties.rs"]
mod routing_properties;

#[path = "integration/flood_scheduling.rs"]
mod flood_scheduling;

#[path = "integration/history_round_trip.rs"]
mod history_round_trip;

#[path = "integration/persistence_files.rs"]
mod persistence_files;
