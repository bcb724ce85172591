//! Link-state routing: per-router advertisements and Dijkstra shortest paths.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Cost, INFINITE_COST};
use crate::graph::{Adjacency, NodeId, Topology};

/// A router's advertisement of its direct neighbors (its LSP).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStateAdvertisement {
    pub node_id: NodeId,
    /// Neighbor -> link cost
    pub neighbors: BTreeMap<NodeId, u32>,
    /// Incremented every time the router re-originates after a change
    pub sequence_number: u64,
    /// When this version was originated
    pub timestamp: DateTime<Utc>,
}

/// Shortest-path route including the full hop sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRoute {
    pub destination: NodeId,
    pub next_hop: NodeId,
    pub cost: Cost,
    /// Source to destination, both inclusive
    pub path: Vec<NodeId>,
}

/// Destination -> path route for one router.
pub type PathTable = BTreeMap<NodeId, PathRoute>;

/// Link-state output for every router.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkStateTables {
    pub advertisements: BTreeMap<NodeId, LinkStateAdvertisement>,
    pub routing_tables: BTreeMap<NodeId, PathTable>,
}

/// Dijkstra result for a single source.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: NodeId,
    distances: HashMap<NodeId, Cost>,
    previous: HashMap<NodeId, NodeId>,
}

impl ShortestPathTree {
    /// Runs Dijkstra from `source` over every node of the graph.
    ///
    /// The unvisited node with the smallest distance is settled next; ties
    /// go to the node found first in adjacency order. The loop stops once
    /// every remaining node is unreachable.
    pub fn compute(adjacency: &Adjacency, source: &NodeId) -> Self {
        let mut distances: HashMap<NodeId, Cost> = adjacency
            .nodes()
            .iter()
            .map(|node| (node.clone(), INFINITE_COST))
            .collect();
        let mut previous = HashMap::new();

        if !adjacency.contains(source.as_str()) {
            return Self {
                source: source.clone(),
                distances: HashMap::new(),
                previous,
            };
        }
        distances.insert(source.clone(), 0);

        let mut unvisited: Vec<NodeId> = adjacency.nodes().to_vec();
        loop {
            let mut closest: Option<(usize, Cost)> = None;
            for (index, node) in unvisited.iter().enumerate() {
                let distance = distances.get(node).copied().unwrap_or(INFINITE_COST);
                if distance < closest.map_or(INFINITE_COST, |(_, best)| best) {
                    closest = Some((index, distance));
                }
            }
            let Some((index, settled)) = closest else {
                break;
            };
            let current = unvisited.remove(index);

            for neighbor in adjacency.neighbors(current.as_str()) {
                let candidate = settled.saturating_add(Cost::from(neighbor.weight));
                let known = distances.get(&neighbor.id).copied().unwrap_or(INFINITE_COST);
                if candidate < known {
                    distances.insert(neighbor.id.clone(), candidate);
                    previous.insert(neighbor.id.clone(), current.clone());
                }
            }
        }

        Self {
            source: source.clone(),
            distances,
            previous,
        }
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    /// Returns the shortest distance, or None when unreachable.
    pub fn distance(&self, destination: &str) -> Option<Cost> {
        self.distances
            .get(destination)
            .copied()
            .filter(|d| *d != INFINITE_COST)
    }

    /// Reconstructs the hop sequence from the source to `destination`.
    pub fn path_to(&self, destination: &NodeId) -> Option<Vec<NodeId>> {
        self.distance(destination.as_str())?;

        let mut path = vec![destination.clone()];
        let mut current = destination;
        while current != &self.source {
            current = self.previous.get(current)?;
            path.push(current.clone());
            if path.len() > self.distances.len() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    /// Builds the routing table: one entry per reachable destination other than the source.
    pub fn path_table(&self, adjacency: &Adjacency) -> PathTable {
        let mut table = PathTable::new();
        for destination in adjacency.nodes() {
            if destination == &self.source {
                continue;
            }
            let Some(path) = self.path_to(destination) else {
                continue;
            };
            let (Some(next_hop), Some(cost)) = (path.get(1), self.distance(destination.as_str()))
            else {
                continue;
            };
            table.insert(
                destination.clone(),
                PathRoute {
                    destination: destination.clone(),
                    next_hop: next_hop.clone(),
                    cost,
                    path: path.clone(),
                },
            );
        }
        table
    }
}

/// Re-originates router advertisements and recomputes every router's paths.
///
/// A router keeps its previous advertisement (sequence number and
/// timestamp) when its neighbor map is unchanged; otherwise it originates
/// a new one with the next sequence number. Routers that left the graph
/// are dropped.
pub fn update_link_states(
    topology: &Topology,
    previous: &BTreeMap<NodeId, LinkStateAdvertisement>,
) -> LinkStateTables {
    let adjacency = topology.adjacency();
    let now = Utc::now();
    let mut advertisements = BTreeMap::new();
    let mut routing_tables = BTreeMap::new();

    for router in topology.router_ids() {
        let neighbors: BTreeMap<NodeId, u32> = adjacency
            .neighbors(router.as_str())
            .iter()
            .map(|n| (n.id.clone(), n.weight))
            .collect();

        let advertisement = match previous.get(&router) {
            Some(prior) if prior.neighbors == neighbors => prior.clone(),
            prior => LinkStateAdvertisement {
                node_id: router.clone(),
                neighbors,
                sequence_number: prior.map_or(1, |p| p.sequence_number + 1),
                timestamp: now,
            },
        };
        advertisements.insert(router.clone(), advertisement);

        let tree = ShortestPathTree::compute(&adjacency, &router);
        routing_tables.insert(router, tree.path_table(&adjacency));
    }

    debug!(
        "Link states updated for {} routers over {} nodes",
        advertisements.len(),
        adjacency.len()
    );

    LinkStateTables {
        advertisements,
        routing_tables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DeviceKind, Position};

    fn ids(list: &[&str]) -> Vec<NodeId> {
        list.iter().map(|s| NodeId::new(*s)).collect()
    }

    #[test]
    fn test_path_through_switch() {
        let mut topology = Topology::new();
        let r1 = topology.add_device(DeviceKind::Router, Position::default());
        let s1 = topology.add_device(DeviceKind::Switch, Position::default());
        let r2 = topology.add_device(DeviceKind::Router, Position::default());
        topology.add_or_update_link(&r1, &s1, 2);
        topology.add_or_update_link(&s1, &r2, 3);

        let tables = update_link_states(&topology, &BTreeMap::new());

        let route = &tables.routing_tables["R1"]["R2"];
        assert_eq!(route.cost, 5);
        assert_eq!(route.next_hop, s1);
        assert_eq!(route.path, ids(&["R1", "S1", "R2"]));
        // Only routers advertise and own tables
        assert!(!tables.advertisements.contains_key("S1"));
        assert_eq!(tables.routing_tables.len(), 2);
    }

    #[test]
    fn test_unreachable_omitted_and_no_self_entry() {
        let mut topology = Topology::new();
        let r1 = topology.add_device(DeviceKind::Router, Position::default());
        let r2 = topology.add_device(DeviceKind::Router, Position::default());
        topology.add_device(DeviceKind::Router, Position::default());
        topology.add_or_update_link(&r1, &r2, 1);

        let tables = update_link_states(&topology, &BTreeMap::new());

        let table = &tables.routing_tables["R1"];
        assert!(table.contains_key("R2"));
        assert!(!table.contains_key("R3"));
        assert!(!table.contains_key("R1"));
        assert!(tables.routing_tables["R3"].is_empty());
    }

    #[test]
    fn test_dijkstra_prefers_cheaper_longer_path() {
        let mut topology = Topology::new();
        let nodes: Vec<NodeId> = (0..4)
            .map(|_| topology.add_device(DeviceKind::Router, Position::default()))
            .collect();
        topology.add_or_update_link(&nodes[0], &nodes[3], 10);
        topology.add_or_update_link(&nodes[0], &nodes[1], 2);
        topology.add_or_update_link(&nodes[1], &nodes[2], 2);
        topology.add_or_update_link(&nodes[2], &nodes[3], 2);

        let adjacency = topology.adjacency();
        let tree = ShortestPathTree::compute(&adjacency, &nodes[0]);

        assert_eq!(tree.distance("R4"), Some(6));
        assert_eq!(tree.path_to(&nodes[3]).unwrap(), ids(&["R1", "R2", "R3", "R4"]));
        assert_eq!(tree.path_to(&nodes[0]).unwrap(), ids(&["R1"]));
    }

    #[test]
    fn test_unknown_source_has_empty_tree() {
        let topology = Topology::new();
        let adjacency = topology.adjacency();
        let tree = ShortestPathTree::compute(&adjacency, &NodeId::new("R1"));

        assert_eq!(tree.distance("R1"), None);
        assert!(tree.path_table(&adjacency).is_empty());
    }

    #[test]
    fn test_sequence_numbers_follow_changes() {
        let mut topology = Topology::new();
        let r1 = topology.add_device(DeviceKind::Router, Position::default());
        let r2 = topology.add_device(DeviceKind::Router, Position::default());
        let r3 = topology.add_device(DeviceKind::Router, Position::default());
        topology.add_or_update_link(&r1, &r2, 1);

        let first = update_link_states(&topology, &BTreeMap::new());
        assert_eq!(first.advertisements["R1"].sequence_number, 1);
        assert_eq!(first.advertisements["R3"].sequence_number, 1);

        topology.add_or_update_link(&r2, &r3, 4);
        let second = update_link_states(&topology, &first.advertisements);

        // R1's neighborhood did not change
        assert_eq!(second.advertisements["R1"], first.advertisements["R1"]);
        assert_eq!(second.advertisements["R2"].sequence_number, 2);
        assert_eq!(second.advertisements["R3"].sequence_number, 2);
        assert_eq!(second.advertisements["R2"].neighbors["R3"], 4);

        topology.remove_device(&r3);
        let third = update_link_states(&topology, &second.advertisements);
        assert!(!third.advertisements.contains_key("R3"));
        assert_eq!(third.advertisements["R2"].sequence_number, 3);
    }
}
