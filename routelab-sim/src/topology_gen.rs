//! Seeded random topologies for scenarios, property tests and benches.

use routelab_core::{DeviceKind, NodeId, Position, Topology};

use crate::deterministic::DeterministicRng;

/// Shape of a generated topology.
#[derive(Debug, Clone)]
pub struct TopologySpec {
    pub routers: usize,
    pub endpoints: usize,
    pub switches: usize,
    /// Probability of adding each non-tree router pair as an extra link
    pub extra_link_probability: f64,
    /// Inclusive upper bound on link weights (lower bound is 1)
    pub max_weight: u32,
    /// Whether the router backbone forms a spanning tree
    pub connected: bool,
}

impl Default for TopologySpec {
    fn default() -> Self {
        Self {
            routers: 6,
            endpoints: 0,
            switches: 0,
            extra_link_probability: 0.3,
            max_weight: 10,
            connected: true,
        }
    }
}

impl TopologySpec {
    /// Router-only graph of the given size.
    pub fn routers_only(routers: usize) -> Self {
        Self {
            routers,
            ..Default::default()
        }
    }
}

/// Builds a reproducible random topology.
///
/// Routers form a random spanning tree (when `connected`) plus extra
/// links; endpoints and switches each attach to one random router.
pub fn generate_topology(spec: &TopologySpec, rng: &mut DeterministicRng) -> Topology {
    let mut topology = Topology::new();
    let mut routers = Vec::with_capacity(spec.routers);
    for _ in 0..spec.routers {
        routers.push(place(&mut topology, DeviceKind::Router, rng));
    }

    let max_weight = u64::from(spec.max_weight.max(1));
    let weight = |rng: &mut DeterministicRng| rng.random_range(1, max_weight + 1) as i64;

    if spec.connected {
        for index in 1..routers.len() {
            let parent = rng.random_range(0, index as u64) as usize;
            let w = weight(rng);
            topology.add_or_update_link(&routers[index], &routers[parent], w);
        }
    }

    for a in 0..routers.len() {
        for b in (a + 1)..routers.len() {
            if topology.link_between(&routers[a], &routers[b]).is_none()
                && rng.random_bool(spec.extra_link_probability)
            {
                let w = weight(rng);
                topology.add_or_update_link(&routers[a], &routers[b], w);
            }
        }
    }

    let leaves = [
        (DeviceKind::Endpoint, spec.endpoints),
        (DeviceKind::Switch, spec.switches),
    ];
    for (kind, count) in leaves {
        for _ in 0..count {
            let leaf = place(&mut topology, kind, rng);
            if let Some(router) = rng.choose(&routers) {
                let w = weight(rng);
                topology.add_or_update_link(&leaf, router, w);
            }
        }
    }

    topology
}

fn place(topology: &mut Topology, kind: DeviceKind, rng: &mut DeterministicRng) -> NodeId {
    let position = Position::new(
        rng.random_range(0, 800) as f64,
        rng.random_range(0, 600) as f64,
    );
    topology.add_device(kind, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_topology() {
        let spec = TopologySpec {
            endpoints: 2,
            switches: 1,
            ..Default::default()
        };

        let first = generate_topology(&spec, &mut DeterministicRng::from_seed(9));
        let second = generate_topology(&spec, &mut DeterministicRng::from_seed(9));

        assert_eq!(first, second);
        assert_eq!(first.devices().len(), 9);
    }

    #[test]
    fn test_connected_backbone() {
        let topology = generate_topology(
            &TopologySpec {
                extra_link_probability: 0.0,
                ..TopologySpec::routers_only(8)
            },
            &mut DeterministicRng::from_seed(3),
        );

        // Spanning tree only
        assert_eq!(topology.links().len(), 7);
        assert!(topology.links().iter().all(|l| (1..=10).contains(&l.weight)));
    }
}
