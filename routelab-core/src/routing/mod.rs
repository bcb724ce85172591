//! Routing engines and the routing state they publish.
//!
//! Both engines are pure functions of the topology: every graph change
//! rebuilds the full table set, which is then swapped in as one value.

mod distance_vector;
mod link_state;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use distance_vector::{DistanceVectorTables, compute_routing_tables};
pub use link_state::{
    LinkStateAdvertisement, LinkStateTables, PathRoute, PathTable, ShortestPathTree,
    update_link_states,
};

use crate::config::RoutingConfig;
use crate::graph::{NodeId, Topology};

/// Path cost. Sums of link weights.
pub type Cost = u64;

/// Sentinel cost for unreachable destinations in distance vectors.
pub const INFINITE_COST: Cost = Cost::MAX;

/// Next hop and total cost towards one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub next_hop: NodeId,
    pub cost: Cost,
}

/// Destination -> route for one router.
pub type RoutingTable = BTreeMap<NodeId, RouteEntry>;

/// Destination -> best known cost for one router.
pub type DistanceVector = BTreeMap<NodeId, Cost>;

/// Routing protocol simulated by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Bellman-Ford relaxation between neighboring routers
    DistanceVector,
    /// Dijkstra over the flooded full topology
    LinkState,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::DistanceVector => write!(f, "distance-vector"),
            Protocol::LinkState => write!(f, "link-state"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "distance-vector" | "dv" => Ok(Protocol::DistanceVector),
            "link-state" | "ls" => Ok(Protocol::LinkState),
            _ => Err(format!("Unknown routing protocol: {s}")),
        }
    }
}

/// Published routing output of the active engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingState {
    DistanceVector(DistanceVectorTables),
    LinkState(LinkStateTables),
}

impl RoutingState {
    /// Routing state of an empty network.
    pub fn empty(protocol: Protocol) -> Self {
        match protocol {
            Protocol::DistanceVector => RoutingState::DistanceVector(DistanceVectorTables::converged_empty()),
            Protocol::LinkState => RoutingState::LinkState(LinkStateTables::default()),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            RoutingState::DistanceVector(_) => Protocol::DistanceVector,
            RoutingState::LinkState(_) => Protocol::LinkState,
        }
    }

    /// Rebuilds the routing state for `topology` with the same protocol.
    ///
    /// Link-state sequence numbers continue from the current advertisements.
    pub fn recompute(&self, topology: &Topology, config: &RoutingConfig) -> Self {
        match self {
            RoutingState::DistanceVector(_) => RoutingState::DistanceVector(compute_routing_tables(
                topology,
                config.max_convergence_passes,
            )),
            RoutingState::LinkState(previous) => {
                RoutingState::LinkState(update_link_states(topology, &previous.advertisements))
            }
        }
    }

    /// Returns the route `source` uses towards `destination`.
    pub fn route(&self, source: &str, destination: &str) -> Option<RouteEntry> {
        match self {
            RoutingState::DistanceVector(tables) => {
                tables.routing_tables.get(source)?.get(destination).cloned()
            }
            RoutingState::LinkState(tables) => {
                let route = tables.routing_tables.get(source)?.get(destination)?;
                Some(RouteEntry {
                    next_hop: route.next_hop.clone(),
                    cost: route.cost,
                })
            }
        }
    }

    /// Returns the routers that own a routing table.
    pub fn sources(&self) -> Vec<&NodeId> {
        match self {
            RoutingState::DistanceVector(tables) => tables.routing_tables.keys().collect(),
            RoutingState::LinkState(tables) => tables.routing_tables.keys().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DeviceKind, Position};

    fn triangle() -> Topology {
        let mut topology = Topology::new();
        let ids: Vec<NodeId> = (0..3)
            .map(|_| topology.add_device(DeviceKind::Router, Position::default()))
            .collect();
        topology.add_or_update_link(&ids[0], &ids[1], 1);
        topology.add_or_update_link(&ids[1], &ids[2], 1);
        topology.add_or_update_link(&ids[0], &ids[2], 5);
        topology
    }

    #[test]
    fn test_protocol_parsing() {
        assert_eq!("dv".parse::<Protocol>().unwrap(), Protocol::DistanceVector);
        assert_eq!("Link-State".parse::<Protocol>().unwrap(), Protocol::LinkState);
        assert!("ospf".parse::<Protocol>().is_err());
        assert_eq!(Protocol::LinkState.to_string(), "link-state");
    }

    #[test]
    fn test_route_view_matches_across_protocols() {
        let topology = triangle();
        let config = RoutingConfig::default();

        let dv = RoutingState::empty(Protocol::DistanceVector).recompute(&topology, &config);
        let ls = RoutingState::empty(Protocol::LinkState).recompute(&topology, &config);

        let dv_route = dv.route("R1", "R3").unwrap();
        let ls_route = ls.route("R1", "R3").unwrap();
        assert_eq!(dv_route, ls_route);
        assert_eq!(dv_route.cost, 2);
        assert_eq!(dv_route.next_hop.as_str(), "R2");
        assert_eq!(dv.sources().len(), 3);
    }

    #[test]
    fn test_empty_state_protocol() {
        assert_eq!(
            RoutingState::empty(Protocol::LinkState).protocol(),
            Protocol::LinkState
        );
        assert!(RoutingState::empty(Protocol::DistanceVector).sources().is_empty());
    }
}
