//! Undo/redo restores deep-equal states.

use routelab_core::{DeviceKind, NetworkState, NodeId, Position, Protocol, RoutelabConfig};
use routelab_sim::RoutingSimulator;

fn simulator(protocol: Protocol) -> RoutingSimulator {
    RoutingSimulator::new(RoutelabConfig::for_testing().with_protocol(protocol)).unwrap()
}

/// Applies a mixed edit sequence, returning the state after each step.
fn edit_sequence(sim: &mut RoutingSimulator) -> Vec<NetworkState> {
    let mut states = vec![sim.state().clone()];
    let r1 = sim.add_node(DeviceKind::Router, Position::new(0.0, 0.0));
    states.push(sim.state().clone());
    let r2 = sim.add_node(DeviceKind::Router, Position::new(50.0, 0.0));
    states.push(sim.state().clone());
    let s1 = sim.add_node(DeviceKind::Switch, Position::new(25.0, 40.0));
    states.push(sim.state().clone());
    sim.add_or_update_link(&r1, &r2, 3);
    states.push(sim.state().clone());
    sim.add_or_update_link(&r2, &s1, 1);
    states.push(sim.state().clone());
    sim.add_or_update_link(&r1, &r2, 8);
    states.push(sim.state().clone());
    sim.remove_link(&r2, &s1);
    states.push(sim.state().clone());
    sim.remove_node(&r1);
    states.push(sim.state().clone());
    states
}

#[test]
fn test_undo_walks_back_through_every_state() {
    for protocol in [Protocol::DistanceVector, Protocol::LinkState] {
        let mut sim = simulator(protocol);
        let states = edit_sequence(&mut sim);

        for expected in states.iter().rev().skip(1) {
            assert!(sim.undo());
            assert_eq!(sim.state(), expected, "{protocol}");
        }
        assert!(!sim.can_undo());
        assert!(!sim.undo());

        for expected in states.iter().skip(1) {
            assert!(sim.redo());
            assert_eq!(sim.state(), expected, "{protocol}");
        }
        assert!(!sim.can_redo());
    }
}

#[test]
fn test_undo_then_new_action_discards_redo() {
    let mut sim = simulator(Protocol::DistanceVector);
    let states = edit_sequence(&mut sim);

    sim.undo();
    sim.undo();
    assert!(sim.can_redo());

    sim.add_node(DeviceKind::Endpoint, Position::default());

    assert!(!sim.can_redo());
    assert!(sim.undo());
    assert_eq!(sim.state(), &states[states.len() - 3]);
}

#[test]
fn test_undo_restores_counters() {
    let mut sim = simulator(Protocol::DistanceVector);
    sim.add_node(DeviceKind::Router, Position::default());
    sim.add_node(DeviceKind::Router, Position::default());

    sim.undo();
    // Counters come back with the snapshot, so the id is handed out again
    let id = sim.add_node(DeviceKind::Router, Position::default());
    assert_eq!(id, NodeId::new("R2"));
}

#[test]
fn test_history_limit_from_config() {
    let mut config = RoutelabConfig::for_testing();
    config.history.snapshot_limit = Some(3);
    let mut sim = RoutingSimulator::new(config).unwrap();

    for _ in 0..6 {
        sim.add_node(DeviceKind::Router, Position::default());
    }

    let mut undone = 0;
    while sim.undo() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(sim.topology().devices().len(), 3);
}
