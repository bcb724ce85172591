//! Export/import through files and legacy documents.

use anyhow::Result;
use routelab_core::persistence::PersistedNetwork;
use routelab_core::{
    DeviceKind, ImportError, NetworkEventKind, NodeId, Position, Protocol, RoutelabConfig,
};
use routelab_sim::RoutingSimulator;
use tempfile::TempDir;

fn simulator(protocol: Protocol) -> RoutingSimulator {
    RoutingSimulator::new(RoutelabConfig::for_testing().with_protocol(protocol)).unwrap()
}

fn populated(protocol: Protocol) -> RoutingSimulator {
    let mut sim = simulator(protocol);
    let r1 = sim.add_node(DeviceKind::Router, Position::new(10.0, 10.0));
    let r2 = sim.add_node(DeviceKind::Router, Position::new(90.0, 10.0));
    let p1 = sim.add_node(DeviceKind::Endpoint, Position::new(90.0, 80.0));
    sim.add_or_update_link(&r1, &r2, 2);
    sim.add_or_update_link(&r2, &p1, 1);
    sim
}

#[test]
fn test_file_round_trip_rederives_routing() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("network.json");

    let original = populated(Protocol::LinkState);
    original.export_file(&path)?;

    let mut restored = simulator(Protocol::LinkState);
    restored.import_file(&path)?;

    assert_eq!(restored.topology(), original.topology());
    assert_eq!(restored.event_log(), original.event_log());
    let route = restored
        .route(&NodeId::new("R1"), &NodeId::new("P1"))
        .unwrap();
    assert_eq!(route.cost, 3);
    assert!(!restored.can_undo());
    Ok(())
}

#[test]
fn test_import_under_other_protocol() -> Result<()> {
    let json = populated(Protocol::LinkState).export_json()?;

    let mut sim = simulator(Protocol::DistanceVector);
    sim.import_json(&json)?;

    let vectors = sim.distance_vectors().unwrap();
    assert_eq!(vectors["R1"]["R2"], 2);
    assert_eq!(vectors["R1"]["P1"], 3);
    Ok(())
}

#[test]
fn test_persisted_routing_is_ignored() -> Result<()> {
    let json = r#"{
        "devices": [
            {"instanceId": "R1", "type": "router", "name": "ROUTER1", "position": {"x": 0, "y": 0}},
            {"instanceId": "R2", "type": "router", "name": "ROUTER2", "position": {"x": 10, "y": 0}}
        ],
        "links": [{"from": "R1", "to": "R2", "weight": 4}],
        "routingTables": {"R1": {"R2": {"nextHop": "R9", "cost": 99}}},
        "networkEvents": [],
        "routerCount": 2,
        "pcCount": 0,
        "switchCount": 0
    }"#;

    let mut sim = simulator(Protocol::DistanceVector);
    sim.import_json(json)?;

    let route = sim.route(&NodeId::new("R1"), &NodeId::new("R2")).unwrap();
    assert_eq!(route.next_hop, NodeId::new("R2"));
    assert_eq!(route.cost, 4);
    Ok(())
}

#[test]
fn test_exported_document_shape() -> Result<()> {
    let json = populated(Protocol::DistanceVector).export_json()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;

    assert_eq!(value["routerCount"], 2);
    assert_eq!(value["pcCount"], 1);
    assert_eq!(value["devices"][2]["type"], "pc");
    assert_eq!(value["links"][0]["weight"], 2);
    assert_eq!(value["networkEvents"][0]["type"], "node_added");
    assert_eq!(value["networkEvents"][0]["details"]["nodeId"], "R1");

    let document: PersistedNetwork = serde_json::from_str(&json)?;
    assert_eq!(document.devices.len(), 3);
    Ok(())
}

#[test]
fn test_invalid_document_leaves_simulator_untouched() {
    let mut sim = populated(Protocol::DistanceVector);
    let before = sim.state().clone();

    let err = sim
        .import_json(r#"{"devices": [{"id": "R1", "type": "router"}], "links": [{"from": "R1", "to": "S4", "weight": 1}]}"#)
        .unwrap_err();

    assert!(matches!(err, ImportError::UnknownLinkEndpoint { .. }));
    assert_eq!(sim.state(), &before);
}

/// Layout written by the browser build: catalog `id`/`type` next to
/// `instanceId`/`deviceType`, UI-only fields, and `fromNode`/`toNode`
/// event details.
const BROWSER_EXPORT: &str = r##"{
    "devices": [
        {
            "id": "router", "type": "router", "color": "#3b82f6",
            "instanceId": "R1", "deviceType": "router", "name": "Router 1",
            "position": {"x": 120, "y": 80},
            "interfaces": [{"id": "eth0", "name": "eth0", "ipAddress": "10.0.0.1", "subnetMask": "255.255.255.0"}]
        },
        {
            "id": "router", "type": "router", "color": "#3b82f6",
            "instanceId": "R2", "deviceType": "router", "name": "Router 2",
            "position": {"x": 320, "y": 80},
            "interfaces": []
        },
        {
            "id": "pc", "type": "pc", "color": "#22c55e",
            "instanceId": "P1", "deviceType": "pc", "name": "PC 1",
            "position": {"x": 320, "y": 260},
            "interfaces": [], "ipAddress": "10.0.0.10", "gateway": "10.0.0.1"
        }
    ],
    "links": [
        {"from": "R1", "to": "R2", "weight": 2},
        {"from": "R2", "to": "P1", "weight": 1}
    ],
    "routingTables": {"R1": {"R2": {"nextHop": "R2", "cost": 2}}},
    "networkEvents": [
        {"type": "node_added", "details": {"nodeId": "R1", "position": {"x": 100, "y": 80}},
         "id": "0f6c2a52-3f0b-4e55-8c39-6a1f1e2d9b10", "timestamp": "2024-05-01T10:00:00.000Z"},
        {"type": "node_moved", "details": {"nodeId": "R1", "position": {"x": 120, "y": 80}},
         "id": "5b0e87c4-6f0d-4b8a-9a34-0c2a9a3b7e21", "timestamp": "2024-05-01T10:00:02.000Z"},
        {"type": "link_created", "details": {"fromNode": "R1", "toNode": "R2"},
         "id": "9d2f1f0e-1b7c-4f43-8d6e-2f7d1a4c8e32", "timestamp": "2024-05-01T10:00:05.000Z"},
        {"type": "link_created", "details": {"fromNode": "R2", "toNode": "P1"}},
        {"type": "packet_sent", "details": {"fromNode": "R1", "toNode": "R2", "packetId": 0},
         "id": 1714557610000.731, "timestamp": "2024-05-01T10:00:10.000Z"}
    ],
    "routerCount": 2,
    "action": "link_add_R2_P1"
}"##;

#[test]
fn test_import_browser_export() -> Result<()> {
    let mut sim = simulator(Protocol::DistanceVector);
    sim.import_json(BROWSER_EXPORT)?;

    let topology = sim.topology();
    assert_eq!(topology.devices().len(), 3);
    assert_eq!(topology.device("P1").unwrap().kind, DeviceKind::Endpoint);
    assert_eq!(topology.device("R1").unwrap().name, "Router 1");

    let route = sim.route(&NodeId::new("R1"), &NodeId::new("P1")).unwrap();
    assert_eq!(route.next_hop, NodeId::new("R2"));
    assert_eq!(route.cost, 3);

    let log = sim.event_log();
    assert_eq!(log.len(), 5);
    assert_eq!(log.count_of("node_moved"), 1);
    assert_eq!(log.count_of("link_created"), 2);
    assert_eq!(
        log.events()[3].kind,
        NetworkEventKind::LinkCreated {
            from: NodeId::new("R2"),
            to: NodeId::new("P1"),
        }
    );
    assert_eq!(
        log.events()[4].kind,
        NetworkEventKind::PacketSent {
            from: NodeId::new("R1"),
            to: NodeId::new("R2"),
            packet_id: 0,
        }
    );

    // Counters pick up after the imported identifiers
    let next = sim.add_node(DeviceKind::Endpoint, Position::default());
    assert_eq!(next, NodeId::new("P2"));
    Ok(())
}

#[test]
fn test_browser_export_survives_round_trip() -> Result<()> {
    let mut first = simulator(Protocol::LinkState);
    first.import_json(BROWSER_EXPORT)?;
    let json = first.export_json()?;

    let mut second = simulator(Protocol::LinkState);
    second.import_json(&json)?;

    assert_eq!(second.topology(), first.topology());
    assert_eq!(second.event_log(), first.event_log());
    Ok(())
}
