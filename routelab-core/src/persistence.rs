//! Persisted JSON layout for saving and loading a network.
//!
//! Import validates the whole document before producing any state; the
//! caller swaps the result in only on success. Routing data is never
//! persisted and is re-derived after import.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RoutingConfig;
use crate::events::{EventLog, NetworkEvent};
use crate::graph::{Device, DeviceCounters, DeviceKind, Link, NodeId, Position, Topology};
use crate::routing::{Protocol, RoutingState};
use crate::state::NetworkState;

/// Errors raised while importing a persisted network.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Malformed network document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Device at index {index} has no identifier")]
    MissingDeviceId { index: usize },

    #[error("Device {id} has no type")]
    MissingDeviceKind { id: String },

    #[error("Device {id} appears more than once")]
    DuplicateDevice { id: String },

    #[error("Device identifier {id} does not match type {kind}")]
    InvalidDeviceId { id: String, kind: DeviceKind },

    #[error("Link {from}-{to} references unknown device {missing}")]
    UnknownLinkEndpoint {
        from: String,
        to: String,
        missing: String,
    },

    #[error("Link {from}-{to} has invalid weight {weight}")]
    InvalidLinkWeight { from: String, to: String, weight: i64 },

    #[error("Link on device {id} connects it to itself")]
    SelfLoop { id: String },

    #[error("Devices {from} and {to} are linked more than once")]
    DuplicateLink { from: String, to: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedNetwork {
    #[serde(default)]
    pub devices: Vec<PersistedDevice>,
    #[serde(default)]
    pub links: Vec<PersistedLink>,
    #[serde(default)]
    pub network_events: Vec<NetworkEvent>,
    #[serde(default)]
    pub router_count: u32,
    #[serde(default)]
    pub pc_count: u32,
    #[serde(default)]
    pub switch_count: u32,
}

/// Persisted device. Older documents spell the identifier `instanceId`
/// and the kind `deviceType`; both spellings are accepted, the legacy
/// identifier taking precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeviceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Position,
}

/// Persisted link. The weight is kept signed so bad values are reported
/// instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedLink {
    pub from: String,
    pub to: String,
    pub weight: i64,
}

impl PersistedNetwork {
    /// Captures the persistable parts of a state.
    pub fn from_state(state: &NetworkState) -> Self {
        let topology = &state.topology;
        let counters = topology.counters();

        Self {
            devices: topology
                .devices()
                .iter()
                .map(|device| PersistedDevice {
                    id: Some(device.id.to_string()),
                    instance_id: None,
                    kind: Some(device.kind),
                    device_type: None,
                    name: Some(device.name.clone()),
                    position: device.position,
                })
                .collect(),
            links: topology
                .links()
                .iter()
                .map(|link| PersistedLink {
                    from: link.from.to_string(),
                    to: link.to.to_string(),
                    weight: i64::from(link.weight),
                })
                .collect(),
            network_events: state.events.events().to_vec(),
            router_count: counters.routers,
            pc_count: counters.pcs,
            switch_count: counters.switches,
        }
    }

    /// Validates the document and rebuilds the topology and event log.
    ///
    /// Counters end up at least as high as the largest sequence number in
    /// use so new identifiers never collide with imported ones.
    pub fn into_parts(self) -> Result<(Topology, EventLog), ImportError> {
        let mut counters = DeviceCounters {
            routers: self.router_count,
            pcs: self.pc_count,
            switches: self.switch_count,
        };

        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(self.devices.len());
        for (index, persisted) in self.devices.into_iter().enumerate() {
            let device = persisted.into_device(index)?;
            if !seen.insert(device.id.clone()) {
                return Err(ImportError::DuplicateDevice {
                    id: device.id.to_string(),
                });
            }
            counters.observe(&device.id);
            devices.push(device);
        }

        let mut links: Vec<Link> = Vec::with_capacity(self.links.len());
        for persisted in self.links {
            let link = persisted.into_link(&seen)?;
            if links.iter().any(|l| l.connects(&link.from, &link.to)) {
                return Err(ImportError::DuplicateLink {
                    from: link.from.to_string(),
                    to: link.to.to_string(),
                });
            }
            links.push(link);
        }

        debug!(
            "Validated persisted network: {} devices, {} links",
            devices.len(),
            links.len()
        );

        Ok((
            Topology::from_parts(devices, links, counters),
            EventLog::from_events(self.network_events),
        ))
    }
}

impl PersistedDevice {
    fn into_device(self, index: usize) -> Result<Device, ImportError> {
        let id = self
            .instance_id
            .or(self.id)
            .ok_or(ImportError::MissingDeviceId { index })?;
        let kind = self
            .device_type
            .or(self.kind)
            .ok_or_else(|| ImportError::MissingDeviceKind { id: id.clone() })?;

        let node_id = NodeId::new(id);
        if node_id.kind() != Some(kind) || node_id.sequence().is_none() {
            return Err(ImportError::InvalidDeviceId {
                id: node_id.to_string(),
                kind,
            });
        }

        let name = match self.name {
            Some(name) => name,
            None => format!(
                "{}{}",
                kind.as_str().to_uppercase(),
                node_id.sequence().unwrap_or_default()
            ),
        };

        Ok(Device {
            id: node_id,
            kind,
            name,
            position: self.position,
        })
    }
}

impl PersistedLink {
    fn into_link(self, known: &HashSet<NodeId>) -> Result<Link, ImportError> {
        if self.from == self.to {
            return Err(ImportError::SelfLoop { id: self.from });
        }
        for endpoint in [&self.from, &self.to] {
            if !known.contains(endpoint.as_str()) {
                return Err(ImportError::UnknownLinkEndpoint {
                    from: self.from.clone(),
                    to: self.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        let weight = u32::try_from(self.weight)
            .ok()
            .filter(|w| *w >= 1)
            .ok_or_else(|| ImportError::InvalidLinkWeight {
                from: self.from.clone(),
                to: self.to.clone(),
                weight: self.weight,
            })?;

        Ok(Link {
            from: NodeId::new(self.from),
            to: NodeId::new(self.to),
            weight,
        })
    }
}

/// Parses and validates a persisted network, then derives fresh routing.
pub fn import_json(
    json: &str,
    protocol: Protocol,
    config: &RoutingConfig,
) -> Result<NetworkState, ImportError> {
    let document: PersistedNetwork = serde_json::from_str(json)?;
    let (topology, events) = document.into_parts()?;
    let routing = RoutingState::empty(protocol).recompute(&topology, config);

    info!(
        "Imported network with {} devices and {} links",
        topology.devices().len(),
        topology.links().len()
    );

    Ok(NetworkState {
        topology,
        routing,
        events,
    })
}

/// Serializes the persistable parts of a state as pretty-printed JSON.
pub fn export_json(state: &NetworkState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&PersistedNetwork::from_state(state))
}

/// Reads and imports a persisted network from disk.
pub fn read_from_path(
    path: &Path,
    protocol: Protocol,
    config: &RoutingConfig,
) -> Result<NetworkState, ImportError> {
    let json = fs::read_to_string(path)?;
    import_json(&json, protocol, config)
}

/// Writes a state to disk in the persisted layout.
pub fn write_to_path(state: &NetworkState, path: &Path) -> Result<(), ImportError> {
    let json = export_json(state)?;
    fs::write(path, json)?;
    info!("Exported network to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NetworkEventKind;

    fn import(json: &str) -> Result<NetworkState, ImportError> {
        import_json(json, Protocol::DistanceVector, &RoutingConfig::default())
    }

    #[test]
    fn test_import_legacy_spelling() {
        let json = r#"{
            "devices": [
                {"id": "1700000000", "instanceId": "R1", "type": "router", "name": "ROUTER1", "position": {"x": 10, "y": 20}},
                {"instanceId": "R2", "deviceType": "router", "position": {"x": 30, "y": 20}},
                {"instanceId": "P1", "type": "pc", "name": "PC1"}
            ],
            "links": [
                {"from": "R1", "to": "R2", "weight": 3},
                {"from": "R2", "to": "P1", "weight": 1}
            ],
            "routerCount": 2,
            "pcCount": 1,
            "switchCount": 0
        }"#;

        let state = import(json).unwrap();

        assert_eq!(state.topology.devices().len(), 3);
        assert_eq!(state.topology.device("R2").unwrap().name, "ROUTER2");
        assert_eq!(state.topology.device("R1").unwrap().position, Position::new(10.0, 20.0));
        let route = state.routing.route("R1", "R2").unwrap();
        assert_eq!(route.cost, 3);
    }

    #[test]
    fn test_counters_cover_imported_ids() {
        let json = r#"{
            "devices": [{"id": "R7", "type": "router"}],
            "routerCount": 2
        }"#;

        let state = import(json).unwrap();
        assert_eq!(state.topology.counters().routers, 7);
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            (r#"{"devices": [{"type": "router"}]}"#, "has no identifier"),
            (r#"{"devices": [{"id": "R1"}]}"#, "has no type"),
            (
                r#"{"devices": [{"id": "R1", "type": "router"}, {"id": "R1", "type": "router"}]}"#,
                "more than once",
            ),
            (r#"{"devices": [{"id": "P1", "type": "router"}]}"#, "does not match"),
            (
                r#"{"devices": [{"id": "R1", "type": "router"}], "links": [{"from": "R1", "to": "R9", "weight": 1}]}"#,
                "unknown device R9",
            ),
            (
                r#"{"devices": [{"id": "R1", "type": "router"}, {"id": "R2", "type": "router"}], "links": [{"from": "R1", "to": "R2", "weight": 0}]}"#,
                "invalid weight 0",
            ),
            (
                r#"{"devices": [{"id": "R1", "type": "router"}], "links": [{"from": "R1", "to": "R1", "weight": 1}]}"#,
                "to itself",
            ),
            (
                r#"{"devices": [{"id": "R1", "type": "router"}, {"id": "R2", "type": "router"}], "links": [{"from": "R1", "to": "R2", "weight": 1}, {"from": "R2", "to": "R1", "weight": 2}]}"#,
                "linked more than once",
            ),
            (r#"{"devices": 5}"#, "Malformed"),
        ];

        for (json, expected) in cases {
            let err = import(json).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "expected '{expected}' in '{err}'"
            );
        }
    }

    #[test]
    fn test_export_import_preserves_topology_and_events() {
        let mut state = NetworkState::empty(Protocol::LinkState);
        let r1 = state.topology.add_device(DeviceKind::Router, Position::new(1.0, 1.0));
        let s1 = state.topology.add_device(DeviceKind::Switch, Position::new(2.0, 1.0));
        let r2 = state.topology.add_device(DeviceKind::Router, Position::new(3.0, 1.0));
        state.topology.remove_device(&r2);
        state.topology.add_or_update_link(&r1, &s1, 4);
        state.events.record(NetworkEventKind::LinkCreated {
            from: r1.clone(),
            to: s1.clone(),
        });

        let json = export_json(&state).unwrap();
        let restored = import_json(&json, Protocol::LinkState, &RoutingConfig::default()).unwrap();

        assert_eq!(restored.topology, state.topology);
        assert_eq!(restored.events, state.events);
        assert_eq!(restored.topology.counters().routers, 2);
        assert!(json.contains("\"networkEvents\""));
        assert!(json.contains("\"type\": \"switch\""));
        assert!(!json.contains("instanceId"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");

        let mut state = NetworkState::empty(Protocol::DistanceVector);
        let r1 = state.topology.add_device(DeviceKind::Router, Position::default());
        let r2 = state.topology.add_device(DeviceKind::Router, Position::default());
        state.topology.add_or_update_link(&r1, &r2, 2);

        write_to_path(&state, &path).unwrap();
        let restored = read_from_path(&path, Protocol::DistanceVector, &RoutingConfig::default()).unwrap();

        assert_eq!(restored.topology, state.topology);
        assert_eq!(restored.routing.route("R2", "R1").unwrap().cost, 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_from_path(
            &dir.path().join("absent.json"),
            Protocol::DistanceVector,
            &RoutingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
