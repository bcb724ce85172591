//! Invariant checking framework for routing state validation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use routelab_core::NetworkState;
use routelab_core::routing::{RoutingState, compute_routing_tables, update_link_states};

/// Violation of a routing invariant.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: String,
    /// Detailed description of the violation
    pub description: String,
    /// When the violation was detected
    pub timestamp: DateTime<Utc>,
}

impl InvariantViolation {
    pub fn new(invariant: &str, description: String) -> Self {
        Self {
            invariant: invariant.to_string(),
            description,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invariant '{}' violated at {}: {}",
            self.invariant,
            self.timestamp.format("%H:%M:%S"),
            self.description
        )
    }
}

/// Trait for checking invariants over the published network state.
pub trait Invariant: Send + Sync {
    /// Checks if invariant holds for current state.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the invariant condition is not met.
    fn check(&self, state: &NetworkState) -> Result<(), InvariantViolation>;

    /// Returns name of this invariant.
    fn name(&self) -> &str;
}

/// Every distance-vector router routes to itself at cost 0.
pub struct SelfRouteInvariant;

impl Invariant for SelfRouteInvariant {
    fn check(&self, state: &NetworkState) -> Result<(), InvariantViolation> {
        let RoutingState::DistanceVector(tables) = &state.routing else {
            return Ok(());
        };

        for (router, table) in &tables.routing_tables {
            match table.get(router) {
                Some(entry) if entry.cost == 0 && &entry.next_hop == router => {}
                other => {
                    return Err(InvariantViolation::new(
                        self.name(),
                        format!("Router {router} has self entry {other:?}"),
                    ));
                }
            }
            if tables.distance_vectors.get(router).and_then(|v| v.get(router)) != Some(&0) {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("Router {router} does not hold distance 0 to itself"),
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "SelfRoute"
    }
}

/// Links join two distinct known devices, at most once per pair.
pub struct LinkIntegrityInvariant;

impl Invariant for LinkIntegrityInvariant {
    fn check(&self, state: &NetworkState) -> Result<(), InvariantViolation> {
        let topology = &state.topology;
        for (index, link) in topology.links().iter().enumerate() {
            if link.weight == 0 {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("Link {}-{} has weight 0", link.from, link.to),
                ));
            }
            if link.from == link.to {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("Link on {} is a self-loop", link.from),
                ));
            }
            for endpoint in [&link.from, &link.to] {
                if !topology.contains(endpoint.as_str()) {
                    return Err(InvariantViolation::new(
                        self.name(),
                        format!("Link {}-{} references removed device {endpoint}", link.from, link.to),
                    ));
                }
            }
            if topology.links()[..index]
                .iter()
                .any(|earlier| earlier.connects(&link.from, &link.to))
            {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("Devices {} and {} are linked twice", link.from, link.to),
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "LinkIntegrity"
    }
}

/// On router-only graphs both engines agree on every path cost.
pub struct RouteAgreementInvariant;

impl Invariant for RouteAgreementInvariant {
    fn check(&self, state: &NetworkState) -> Result<(), InvariantViolation> {
        let topology = &state.topology;
        if topology.devices().iter().any(|d| !d.is_router()) {
            return Ok(());
        }

        let dv = compute_routing_tables(topology, None);
        let ls = update_link_states(topology, &BTreeMap::new());

        for (source, table) in &ls.routing_tables {
            for (destination, route) in table {
                let dv_cost = dv
                    .routing_tables
                    .get(source)
                    .and_then(|t| t.get(destination))
                    .map(|entry| entry.cost);
                if dv_cost != Some(route.cost) {
                    return Err(InvariantViolation::new(
                        self.name(),
                        format!(
                            "{source} -> {destination}: link state cost {} but distance vector {dv_cost:?}",
                            route.cost
                        ),
                    ));
                }
            }
        }

        for (source, table) in &dv.routing_tables {
            // Self entries exist only in distance-vector tables
            let extra = table
                .keys()
                .filter(|destination| *destination != source)
                .find(|destination| {
                    ls.routing_tables
                        .get(source)
                        .is_none_or(|t| !t.contains_key(*destination))
                });
            if let Some(destination) = extra {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("{source} -> {destination} known only to distance vector"),
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "RouteAgreement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routelab_core::{DeviceKind, NodeId, Position, Protocol, RoutelabConfig, RouteEntry};

    fn line_state(protocol: Protocol) -> NetworkState {
        let mut state = NetworkState::empty(protocol);
        let ids: Vec<NodeId> = (0..3)
            .map(|_| state.topology.add_device(DeviceKind::Router, Position::default()))
            .collect();
        state.topology.add_or_update_link(&ids[0], &ids[1], 1);
        state.topology.add_or_update_link(&ids[1], &ids[2], 4);
        state.routing = state
            .routing
            .recompute(&state.topology, &RoutelabConfig::default().routing);
        state
    }

    #[test]
    fn test_invariants_hold_on_valid_state() {
        let state = line_state(Protocol::DistanceVector);
        assert!(SelfRouteInvariant.check(&state).is_ok());
        assert!(LinkIntegrityInvariant.check(&state).is_ok());
        assert!(RouteAgreementInvariant.check(&state).is_ok());
    }

    #[test]
    fn test_self_route_violation() {
        let mut state = line_state(Protocol::DistanceVector);
        if let RoutingState::DistanceVector(tables) = &mut state.routing {
            let r1 = NodeId::new("R1");
            tables.routing_tables.get_mut(&r1).unwrap().insert(
                r1.clone(),
                RouteEntry {
                    next_hop: NodeId::new("R2"),
                    cost: 1,
                },
            );
        }

        let violation = SelfRouteInvariant.check(&state).unwrap_err();
        assert_eq!(violation.invariant, "SelfRoute");
        assert!(violation.to_string().contains("R1"));
    }

    #[test]
    fn test_self_route_ignores_link_state() {
        let state = line_state(Protocol::LinkState);
        assert!(SelfRouteInvariant.check(&state).is_ok());
    }

    #[test]
    fn test_route_agreement_skips_mixed_graphs() {
        let mut state = line_state(Protocol::LinkState);
        state
            .topology
            .add_device(DeviceKind::Switch, Position::default());
        assert!(RouteAgreementInvariant.check(&state).is_ok());
    }
}
