//! Flood timing and cancellation through the simulator.

use std::time::Duration;

use routelab_core::{DeviceKind, NetworkEventKind, NodeId, Position, Protocol, RoutelabConfig};
use routelab_sim::{FloodKind, RoutingSimulator};

const DELAY: Duration = Duration::from_millis(1200);

fn ring(sim: &mut RoutingSimulator, count: usize) -> Vec<NodeId> {
    let ids: Vec<NodeId> = (0..count)
        .map(|_| sim.add_node(DeviceKind::Router, Position::default()))
        .collect();
    for index in 0..count {
        sim.add_or_update_link(&ids[index], &ids[(index + 1) % count], 1);
    }
    ids
}

fn simulator() -> RoutingSimulator {
    RoutingSimulator::new(RoutelabConfig::default().with_protocol(Protocol::LinkState)).unwrap()
}

#[test]
fn test_rounds_arrive_one_delay_apart() {
    let mut sim = simulator();
    let ids = ring(&mut sim, 6);

    let handle = sim.start_lsp_flood(&ids[0]).unwrap().unwrap();
    // Six-node ring: two neighbors, then two more, then the opposite node
    assert_eq!(handle.rounds, 3);
    assert_eq!(handle.events, 5);

    let mut due_times = Vec::new();
    while let Some(due) = sim.next_due() {
        let step = due - sim.now();
        for round in sim.advance(step).unwrap() {
            due_times.push(round.due);
        }
    }

    assert_eq!(due_times, vec![Duration::ZERO, DELAY, DELAY * 2]);
    assert_eq!(sim.event_log().count_of("packet_sent"), 5);
}

#[test]
fn test_packet_events_carry_flood_packet_ids() {
    let mut sim = simulator();
    let ids = ring(&mut sim, 4);
    sim.start_lsp_flood(&ids[0]).unwrap();
    sim.run_until_idle().unwrap();

    let packet_ids: Vec<u64> = sim
        .event_log()
        .iter()
        .filter_map(|event| match &event.kind {
            NetworkEventKind::PacketSent { packet_id, .. } => Some(*packet_id),
            _ => None,
        })
        .collect();

    assert_eq!(packet_ids, vec![0, 1, 2]);
}

#[test]
fn test_undo_mid_flood_drops_remaining_rounds() {
    let mut sim = simulator();
    let ids = ring(&mut sim, 6);
    sim.start_lsp_flood(&ids[0]).unwrap();
    sim.advance(Duration::ZERO).unwrap();

    assert!(sim.undo());

    assert!(sim.advance(DELAY * 5).unwrap().is_empty());
    assert_eq!(sim.flood_metrics().rounds_discarded, 2);
}

#[test]
fn test_concurrent_floods_interleave() {
    let mut sim = simulator();
    let ids = ring(&mut sim, 4);

    let hello = sim.start_hello_flood(&ids[2]).unwrap().unwrap();
    let lsp = sim.start_lsp_flood(&ids[0]).unwrap().unwrap();

    let delivered = sim.run_until_idle().unwrap();
    let order: Vec<(u64, FloodKind)> = delivered.iter().map(|r| (r.flood_id, r.kind)).collect();

    assert_eq!(
        order,
        vec![
            (hello.flood_id, FloodKind::Hello),
            (lsp.flood_id, FloodKind::LinkState),
            (lsp.flood_id, FloodKind::LinkState),
        ]
    );
}

#[test]
fn test_network_hello_covers_each_link() {
    let mut sim = simulator();
    ring(&mut sim, 5);
    sim.add_node(DeviceKind::Switch, Position::default());

    let handle = sim.start_network_hello().unwrap().unwrap();
    sim.run_until_idle().unwrap();

    assert_eq!(handle.events, 5);
    assert_eq!(sim.event_log().count_of("packet_sent"), 5);
    assert_eq!(sim.flood_metrics().floods_by_kind["network_hello"], 1);
}
