//! Append-only log of network events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::graph::{NodeId, Position};

/// What happened, with only the fields relevant to that event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum NetworkEventKind {
    /// Device placed on the canvas
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: NodeId, position: Position },
    /// Device dragged to a new position. Only found in imported logs.
    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: NodeId, position: Position },
    /// Device deleted together with its links
    #[serde(rename_all = "camelCase")]
    NodeRemoved { node_id: NodeId },
    /// Link created between two devices
    LinkCreated {
        #[serde(alias = "fromNode")]
        from: NodeId,
        #[serde(alias = "toNode")]
        to: NodeId,
    },
    /// Link deleted
    LinkRemoved {
        #[serde(alias = "fromNode")]
        from: NodeId,
        #[serde(alias = "toNode")]
        to: NodeId,
    },
    /// One hop of a flood delivered
    #[serde(rename_all = "camelCase")]
    PacketSent {
        #[serde(alias = "fromNode")]
        from: NodeId,
        #[serde(alias = "toNode")]
        to: NodeId,
        packet_id: u64,
    },
}

impl NetworkEventKind {
    /// Returns string representation of event type for counting and filtering.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkEventKind::NodeAdded { .. } => "node_added",
            NetworkEventKind::NodeMoved { .. } => "node_moved",
            NetworkEventKind::NodeRemoved { .. } => "node_removed",
            NetworkEventKind::LinkCreated { .. } => "link_created",
            NetworkEventKind::LinkRemoved { .. } => "link_removed",
            NetworkEventKind::PacketSent { .. } => "packet_sent",
        }
    }
}

/// Immutable log record with identity and creation time.
///
/// Records imported without a UUID identifier or a timestamp are given
/// fresh ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    #[serde(default = "Uuid::new_v4", deserialize_with = "uuid_or_fresh")]
    pub id: Uuid,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: NetworkEventKind,
}

impl NetworkEvent {
    /// Creates an event stamped with a fresh identifier and the current time.
    pub fn new(kind: NetworkEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

fn uuid_or_fresh<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PersistedId {
        Uuid(Uuid),
        Other(serde::de::IgnoredAny),
    }

    Ok(match PersistedId::deserialize(deserializer)? {
        PersistedId::Uuid(id) => id,
        PersistedId::Other(_) => Uuid::new_v4(),
    })
}

impl fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self.timestamp.format("%H:%M:%S");
        match &self.kind {
            NetworkEventKind::NodeAdded { node_id, position } => write!(
                f,
                "[{time}] Node {node_id} added at position ({}, {})",
                position.x, position.y
            ),
            NetworkEventKind::NodeMoved { node_id, position } => write!(
                f,
                "[{time}] Node {node_id} moved to position ({}, {})",
                position.x, position.y
            ),
            NetworkEventKind::NodeRemoved { node_id } => {
                write!(f, "[{time}] Node {node_id} removed")
            }
            NetworkEventKind::LinkCreated { from, to } => {
                write!(f, "[{time}] Link created between {from} and {to}")
            }
            NetworkEventKind::LinkRemoved { from, to } => {
                write!(f, "[{time}] Link removed between {from} and {to}")
            }
            NetworkEventKind::PacketSent {
                from,
                to,
                packet_id,
            } => write!(f, "[{time}] Packet {packet_id} sent from {from} to {to}"),
        }
    }
}

/// Ordered event log. Records are only ever appended.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<NetworkEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from persisted records, keeping their order.
    pub fn from_events(events: Vec<NetworkEvent>) -> Self {
        Self { events }
    }

    /// Appends a new event and returns it.
    pub fn record(&mut self, kind: NetworkEventKind) -> &NetworkEvent {
        self.events.push(NetworkEvent::new(kind));
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[NetworkEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NetworkEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&NetworkEvent> {
        self.events.last()
    }

    /// Counts events of the given type name (`"packet_sent"`, ...).
    pub fn count_of(&self, event_type: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind.as_str() == event_type)
            .count()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a NetworkEvent;
    type IntoIter = std::slice::Iter<'a, NetworkEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
