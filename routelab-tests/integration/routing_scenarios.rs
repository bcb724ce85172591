//! End-to-end routing scenarios through the simulator facade.

use routelab_core::{DeviceKind, LinkOutcome, NodeId, Position, Protocol, RoutelabConfig};
use routelab_sim::{RouteAgreementInvariant, RoutingSimulator, SelfRouteInvariant};

fn simulator(protocol: Protocol) -> RoutingSimulator {
    RoutingSimulator::new(RoutelabConfig::for_testing().with_protocol(protocol)).unwrap()
}

fn routers(sim: &mut RoutingSimulator, count: usize) -> Vec<NodeId> {
    (0..count)
        .map(|i| sim.add_node(DeviceKind::Router, Position::new(100.0 * i as f64, 100.0)))
        .collect()
}

#[test]
fn test_line_scenario_both_protocols() {
    for protocol in [Protocol::DistanceVector, Protocol::LinkState] {
        let mut sim = simulator(protocol);
        let ids = routers(&mut sim, 3);
        sim.add_or_update_link(&ids[0], &ids[1], 1);
        sim.add_or_update_link(&ids[1], &ids[2], 1);

        let route = sim.route(&ids[0], &ids[2]).unwrap();
        assert_eq!(route.next_hop, ids[1], "{protocol}");
        assert_eq!(route.cost, 2, "{protocol}");

        // Re-weighting R2-R3 to 5 keeps the path but raises the cost
        assert_eq!(
            sim.add_or_update_link(&ids[1], &ids[2], 5),
            LinkOutcome::Updated { previous_weight: 1 }
        );
        let route = sim.route(&ids[0], &ids[2]).unwrap();
        assert_eq!(route.next_hop, ids[1], "{protocol}");
        assert_eq!(route.cost, 6, "{protocol}");

        assert!(sim.remove_node(&ids[1]));
        assert!(sim.route(&ids[0], &ids[2]).is_none(), "{protocol}");
        assert!(sim.topology().links().is_empty());
    }
}

#[test]
fn test_duplicate_link_updates_in_place() {
    let mut sim = simulator(Protocol::DistanceVector);
    let ids = routers(&mut sim, 2);

    assert_eq!(sim.add_or_update_link(&ids[0], &ids[1], 1), LinkOutcome::Created);
    assert_eq!(
        sim.add_or_update_link(&ids[1], &ids[0], 4),
        LinkOutcome::Updated { previous_weight: 1 }
    );

    assert_eq!(sim.topology().links().len(), 1);
    assert_eq!(sim.topology().links()[0].weight, 4);
    assert_eq!(sim.event_log().count_of("link_created"), 1);
}

#[test]
fn test_routes_through_switch_for_link_state_only() {
    let build = |protocol| {
        let mut sim = simulator(protocol);
        let r1 = sim.add_node(DeviceKind::Router, Position::default());
        let s1 = sim.add_node(DeviceKind::Switch, Position::default());
        let r2 = sim.add_node(DeviceKind::Router, Position::default());
        sim.add_or_update_link(&r1, &s1, 1);
        sim.add_or_update_link(&s1, &r2, 1);
        (sim, r1, s1, r2)
    };

    let (ls, r1, s1, r2) = build(Protocol::LinkState);
    let route = ls.route(&r1, &r2).unwrap();
    assert_eq!(route.next_hop, s1);
    assert_eq!(route.cost, 2);

    // Distance vector treats the switch as a leaf destination
    let (dv, r1, s1, r2) = build(Protocol::DistanceVector);
    assert!(dv.route(&r1, &r2).is_none());
    assert_eq!(dv.route(&r1, &s1).unwrap().cost, 1);
}

#[test]
fn test_link_state_sequence_numbers_track_changes() {
    let mut sim = simulator(Protocol::LinkState);
    let ids = routers(&mut sim, 3);
    sim.add_or_update_link(&ids[0], &ids[1], 1);

    let before = sim.link_states().unwrap()["R1"].sequence_number;
    sim.add_or_update_link(&ids[1], &ids[2], 1);
    let after = sim.link_states().unwrap();

    assert_eq!(after["R1"].sequence_number, before);
    assert!(after["R2"].sequence_number > 1);

    sim.remove_node(&ids[2]);
    assert!(!sim.link_states().unwrap().contains_key("R3"));
}

#[test]
fn test_invariants_hold_through_edits() {
    let mut sim = simulator(Protocol::DistanceVector);
    sim.add_invariant(Box::new(SelfRouteInvariant));
    sim.add_invariant(Box::new(RouteAgreementInvariant));

    let ids = routers(&mut sim, 5);
    sim.add_or_update_link(&ids[0], &ids[1], 2);
    sim.add_or_update_link(&ids[1], &ids[2], 3);
    sim.add_or_update_link(&ids[2], &ids[3], 1);
    sim.add_or_update_link(&ids[3], &ids[4], 7);
    sim.add_or_update_link(&ids[0], &ids[4], 4);
    sim.remove_link(&ids[2], &ids[3]);
    sim.remove_node(&ids[1]);

    assert!(sim.violations().is_empty(), "{:?}", sim.violations());
}

#[test]
fn test_event_log_renders_lines() {
    let mut sim = simulator(Protocol::DistanceVector);
    let r1 = sim.add_node(DeviceKind::Router, Position::new(40.0, 60.0));
    let p1 = sim.add_node(DeviceKind::Endpoint, Position::new(80.0, 60.0));
    sim.add_or_update_link(&r1, &p1, 1);

    let lines: Vec<String> = sim.event_log().iter().map(ToString::to_string).collect();

    assert!(lines[0].ends_with("Node R1 added at position (40, 60)"));
    assert!(lines[2].ends_with("Link created between R1 and P1"));
}
