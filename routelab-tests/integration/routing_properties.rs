//! Property tests over randomly generated topologies.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use routelab_core::routing::{compute_routing_tables, update_link_states};
use routelab_core::{DeviceKind, NodeId, Position, Topology};
use routelab_sim::{DeterministicRng, TopologySpec, generate_topology, plan_full_flood, plan_hello};

fn reachable_from(topology: &Topology, origin: &NodeId) -> HashSet<NodeId> {
    let adjacency = topology.adjacency();
    let mut seen = HashSet::from([origin.clone()]);
    let mut stack = vec![origin.clone()];
    while let Some(node) = stack.pop() {
        for neighbor in adjacency.neighbors(node.as_str()) {
            if seen.insert(neighbor.id.clone()) {
                stack.push(neighbor.id.clone());
            }
        }
    }
    seen
}

prop_compose! {
    fn router_topology()(
        routers in 1usize..12,
        extra in 0.0f64..0.6,
        max_weight in 1u32..20,
        connected in any::<bool>(),
        seed in any::<u64>(),
    ) -> Topology {
        let spec = TopologySpec {
            routers,
            extra_link_probability: extra,
            max_weight,
            connected,
            ..Default::default()
        };
        generate_topology(&spec, &mut DeterministicRng::from_seed(seed))
    }
}

prop_compose! {
    fn mixed_topology()(
        routers in 1usize..8,
        endpoints in 0usize..5,
        switches in 0usize..4,
        seed in any::<u64>(),
    ) -> Topology {
        let spec = TopologySpec {
            routers,
            endpoints,
            switches,
            ..Default::default()
        };
        generate_topology(&spec, &mut DeterministicRng::from_seed(seed))
    }
}

proptest! {
    #[test]
    fn distance_vector_matches_link_state_costs(topology in router_topology()) {
        let dv = compute_routing_tables(&topology, None);
        let ls = update_link_states(&topology, &BTreeMap::new());

        prop_assert!(dv.converged);
        for source in topology.router_ids() {
            for destination in topology.router_ids() {
                if source == destination {
                    continue;
                }
                let dv_cost = dv.routing_tables[&source].get(&destination).map(|r| r.cost);
                let ls_cost = ls.routing_tables[&source].get(&destination).map(|r| r.cost);
                prop_assert_eq!(dv_cost, ls_cost, "{} -> {}", source, destination);
            }
        }
    }

    #[test]
    fn recomputation_is_idempotent(topology in mixed_topology()) {
        prop_assert_eq!(
            compute_routing_tables(&topology, None),
            compute_routing_tables(&topology, None)
        );

        let first = update_link_states(&topology, &BTreeMap::new());
        let second = update_link_states(&topology, &first.advertisements);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn self_route_is_zero(topology in mixed_topology()) {
        let dv = compute_routing_tables(&topology, None);
        for router in topology.router_ids() {
            let entry = &dv.routing_tables[&router][&router];
            prop_assert_eq!(&entry.next_hop, &router);
            prop_assert_eq!(entry.cost, 0);
        }
    }

    #[test]
    fn full_flood_reaches_every_reachable_node_once(topology in mixed_topology(), pick in any::<prop::sample::Index>()) {
        let ids: Vec<NodeId> = topology.devices().iter().map(|d| d.id.clone()).collect();
        let origin = pick.get(&ids).clone();
        let plan = plan_full_flood(&topology.adjacency(), &origin);

        let reachable = reachable_from(&topology, &origin);
        let targets: Vec<&NodeId> = plan.hops().map(|h| &h.to).collect();
        let unique: HashSet<&NodeId> = targets.iter().copied().collect();

        prop_assert_eq!(plan.event_count(), reachable.len() - 1);
        prop_assert_eq!(unique.len(), targets.len());
        prop_assert!(!unique.contains(&origin));
        prop_assert!(unique.iter().all(|id| reachable.contains(*id)));
    }

    #[test]
    fn hello_stays_local(topology in mixed_topology(), pick in any::<prop::sample::Index>()) {
        let ids: Vec<NodeId> = topology.devices().iter().map(|d| d.id.clone()).collect();
        let origin = pick.get(&ids).clone();
        let plan = plan_hello(&topology.adjacency(), &origin);

        prop_assert!(plan.rounds.len() <= 1);
        for hop in plan.hops() {
            prop_assert_eq!(&hop.from, &origin);
            prop_assert!(topology.link_between(&origin, &hop.to).is_some());
        }
        prop_assert_eq!(plan.event_count(), topology.neighbors_of(&origin).count());
    }
}

#[test]
fn test_endpoints_never_relay_distance_vector() {
    // Two router islands joined only through a PC
    let mut topology = Topology::new();
    let r1 = topology.add_device(DeviceKind::Router, Position::default());
    let r2 = topology.add_device(DeviceKind::Router, Position::default());
    let p1 = topology.add_device(DeviceKind::Endpoint, Position::default());
    topology.add_or_update_link(&r1, &p1, 1);
    topology.add_or_update_link(&p1, &r2, 1);

    let dv = compute_routing_tables(&topology, None);
    let ls = update_link_states(&topology, &BTreeMap::new());

    assert!(dv.routing_tables["R1"].get("R2").is_none());
    assert_eq!(ls.routing_tables["R1"]["R2"].path.len(), 3);
}
