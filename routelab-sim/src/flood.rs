//! Flood planning over a snapshot of the adjacency view.
//!
//! Planning is pure: it turns the current graph into rounds of hop
//! events. Timing and cancellation belong to the scheduler.

use std::collections::HashSet;
use std::fmt;

use routelab_core::{Adjacency, NodeId};

/// Kind of packet wave being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloodKind {
    /// One round from an origin to its direct neighbors
    Hello,
    /// Breadth-first flood of a router's link-state packet
    LinkState,
    /// Every node greets its neighbors, one round per node
    NetworkHello,
}

impl FloodKind {
    /// Returns string representation of flood kind for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodKind::Hello => "hello",
            FloodKind::LinkState => "link_state",
            FloodKind::NetworkHello => "network_hello",
        }
    }
}

impl fmt::Display for FloodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One packet crossing one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopEvent {
    pub from: NodeId,
    pub to: NodeId,
    /// Unique within a flood, counting from 0
    pub packet_id: u64,
    /// Round index within the flood
    pub round: usize,
}

/// Rounds of hop events produced for one flood.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodPlan {
    pub origin: Option<NodeId>,
    pub kind: FloodKind,
    pub rounds: Vec<Vec<HopEvent>>,
}

impl FloodPlan {
    fn empty(origin: Option<NodeId>, kind: FloodKind) -> Self {
        Self {
            origin,
            kind,
            rounds: Vec::new(),
        }
    }

    /// Total number of hop events across all rounds.
    pub fn event_count(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Iterates all hop events in delivery order.
    pub fn hops(&self) -> impl Iterator<Item = &HopEvent> {
        self.rounds.iter().flatten()
    }
}

/// Plans a breadth-first flood from `origin`.
///
/// Every frontier node forwards to each neighbor not yet visited; a node
/// is reached once, so the event count equals the reachable set minus
/// the origin. Unknown or isolated origins yield an empty plan.
pub fn plan_full_flood(adjacency: &Adjacency, origin: &NodeId) -> FloodPlan {
    let mut plan = FloodPlan::empty(Some(origin.clone()), FloodKind::LinkState);
    if !adjacency.contains(origin.as_str()) {
        return plan;
    }

    let mut visited: HashSet<&NodeId> = HashSet::from([origin]);
    let mut frontier: Vec<&NodeId> = vec![origin];
    let mut packet_id = 0;

    while !frontier.is_empty() {
        let round = plan.rounds.len();
        let mut next = Vec::new();
        let mut hops = Vec::new();

        for from in frontier {
            for neighbor in adjacency.neighbors(from.as_str()) {
                if visited.insert(&neighbor.id) {
                    next.push(&neighbor.id);
                    hops.push(HopEvent {
                        from: from.clone(),
                        to: neighbor.id.clone(),
                        packet_id,
                        round,
                    });
                    packet_id += 1;
                }
            }
        }

        if hops.is_empty() {
            break;
        }
        plan.rounds.push(hops);
        frontier = next;
    }

    plan
}

/// Plans a single hello round from `origin` to its direct neighbors.
pub fn plan_hello(adjacency: &Adjacency, origin: &NodeId) -> FloodPlan {
    let mut plan = FloodPlan::empty(Some(origin.clone()), FloodKind::Hello);

    let hops: Vec<HopEvent> = adjacency
        .neighbors(origin.as_str())
        .iter()
        .enumerate()
        .map(|(packet_id, neighbor)| HopEvent {
            from: origin.clone(),
            to: neighbor.id.clone(),
            packet_id: packet_id as u64,
            round: 0,
        })
        .collect();

    if !hops.is_empty() {
        plan.rounds.push(hops);
    }
    plan
}

/// Plans a network-wide hello exchange.
///
/// Nodes greet in device order, one round per node that still has an
/// unused link; each undirected link fires exactly once.
pub fn plan_network_hello(adjacency: &Adjacency) -> FloodPlan {
    let mut plan = FloodPlan::empty(None, FloodKind::NetworkHello);
    let mut greeted: HashSet<(&NodeId, &NodeId)> = HashSet::new();
    let mut packet_id = 0;

    for from in adjacency.nodes() {
        let round = plan.rounds.len();
        let mut hops = Vec::new();

        for neighbor in adjacency.neighbors(from.as_str()) {
            let pair = if from <= &neighbor.id {
                (from, &neighbor.id)
            } else {
                (&neighbor.id, from)
            };
            if greeted.insert(pair) {
                hops.push(HopEvent {
                    from: from.clone(),
                    to: neighbor.id.clone(),
                    packet_id,
                    round,
                });
                packet_id += 1;
            }
        }

        if !hops.is_empty() {
            plan.rounds.push(hops);
        }
    }

    plan
}
