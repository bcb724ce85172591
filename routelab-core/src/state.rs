//! Complete simulation state: the unit of undo/redo and import.

use crate::events::EventLog;
use crate::graph::Topology;
use crate::routing::{Protocol, RoutingState};

/// Topology, published routing output and event log of one network.
///
/// Cloning yields a fully independent deep copy.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    pub topology: Topology,
    pub routing: RoutingState,
    pub events: EventLog,
}

impl NetworkState {
    /// Creates the empty state for a protocol.
    pub fn empty(protocol: Protocol) -> Self {
        Self {
            topology: Topology::new(),
            routing: RoutingState::empty(protocol),
            events: EventLog::new(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.routing.protocol()
    }
}
