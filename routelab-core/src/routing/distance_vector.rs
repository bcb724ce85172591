//! Distance-vector routing: Bellman-Ford relaxation to a fixed point.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{Cost, DistanceVector, INFINITE_COST, RouteEntry, RoutingTable};
use crate::graph::{NodeId, Topology};

/// Converged distance-vector output for every router.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistanceVectorTables {
    /// Router -> destination -> next hop and cost
    pub routing_tables: BTreeMap<NodeId, RoutingTable>,
    /// Router -> destination -> cost, with `INFINITE_COST` for unreachable routers
    pub distance_vectors: BTreeMap<NodeId, DistanceVector>,
    /// Relaxation passes executed
    pub passes: usize,
    /// False when the pass cap stopped relaxation early
    pub converged: bool,
}

impl DistanceVectorTables {
    pub(crate) fn converged_empty() -> Self {
        Self {
            converged: true,
            ..Default::default()
        }
    }
}

/// Computes routing tables and distance vectors for every router.
///
/// Vectors are rebuilt from scratch: each router starts at `{self: 0,
/// other routers: infinity}` seeded with its direct links, then routers
/// push their vectors to router neighbors in lexical order until a full
/// pass changes nothing. Endpoints and switches linked to a router are
/// seeded as destinations but never relax, so they stay leaves.
///
/// `max_passes` defaults to the number of routers. Hitting the cap logs a
/// warning and still returns the best tables found.
pub fn compute_routing_tables(topology: &Topology, max_passes: Option<usize>) -> DistanceVectorTables {
    let routers = topology.router_ids();
    if routers.is_empty() {
        return DistanceVectorTables::converged_empty();
    }

    let mut distance_vectors: BTreeMap<NodeId, DistanceVector> = BTreeMap::new();
    let mut routing_tables: BTreeMap<NodeId, RoutingTable> = BTreeMap::new();
    let mut router_links: BTreeMap<NodeId, Vec<(NodeId, Cost)>> = BTreeMap::new();

    for router in &routers {
        let mut vector: DistanceVector = routers
            .iter()
            .map(|destination| (destination.clone(), INFINITE_COST))
            .collect();
        vector.insert(router.clone(), 0);

        let mut table = RoutingTable::new();
        table.insert(
            router.clone(),
            RouteEntry {
                next_hop: router.clone(),
                cost: 0,
            },
        );

        let mut links = Vec::new();
        for (neighbor, weight) in topology.neighbors_of(router) {
            let cost = Cost::from(weight);
            vector.insert(neighbor.clone(), cost);
            table.insert(
                neighbor.clone(),
                RouteEntry {
                    next_hop: neighbor.clone(),
                    cost,
                },
            );
            if topology.is_router(neighbor.as_str()) {
                links.push((neighbor.clone(), cost));
            }
        }

        distance_vectors.insert(router.clone(), vector);
        routing_tables.insert(router.clone(), table);
        router_links.insert(router.clone(), links);
    }

    let pass_cap = max_passes.unwrap_or(routers.len());
    let mut passes = 0;
    let mut converged = false;

    while passes < pass_cap {
        passes += 1;
        let mut changed = false;

        for router in &routers {
            let Some(advertised) = distance_vectors.get(router).cloned() else {
                continue;
            };
            let Some(links) = router_links.get(router) else {
                continue;
            };

            for (neighbor, weight) in links {
                let (Some(vector), Some(table)) = (
                    distance_vectors.get_mut(neighbor),
                    routing_tables.get_mut(neighbor),
                ) else {
                    continue;
                };

                for (destination, cost) in &advertised {
                    // A router's route to itself is pinned at cost 0
                    if destination == neighbor || *cost == INFINITE_COST {
                        continue;
                    }
                    let candidate = weight.saturating_add(*cost);
                    let current = vector.get(destination).copied().unwrap_or(INFINITE_COST);
                    if candidate < current {
                        vector.insert(destination.clone(), candidate);
                        table.insert(
                            destination.clone(),
                            RouteEntry {
                                next_hop: router.clone(),
                                cost: candidate,
                            },
                        );
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(
            "Distance vectors converged for {} routers after {} passes",
            routers.len(),
            passes
        );
    } else {
        warn!(
            "Distance vector relaxation stopped at pass cap {} before convergence; publishing best-effort tables",
            pass_cap
        );
    }

    DistanceVectorTables {
        routing_tables,
        distance_vectors,
        passes,
        converged,
    }
}
