//! Device identity, kinds and placement.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique device identifier such as `R1`, `P2` or `S1`.
///
/// The first character names the device kind, the rest is the per-kind
/// sequence number assigned at creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node identifier from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the device kind encoded in the identifier prefix.
    pub fn kind(&self) -> Option<DeviceKind> {
        let prefix = self.0.chars().next()?;
        DeviceKind::from_prefix(prefix)
    }

    /// Returns the per-kind sequence number encoded after the prefix.
    pub fn sequence(&self) -> Option<u32> {
        let mut chars = self.0.chars();
        chars.next()?;
        chars.as_str().parse().ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Role a device plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Participates in routing protocol exchange
    Router,
    /// End host; a leaf that never relays traffic for distance vector
    #[serde(rename = "pc")]
    Endpoint,
    /// Layer-2 device; a plain graph vertex for link state
    Switch,
}

impl DeviceKind {
    /// Returns the identifier prefix for this kind.
    pub fn prefix(self) -> char {
        match self {
            DeviceKind::Router => 'R',
            DeviceKind::Endpoint => 'P',
            DeviceKind::Switch => 'S',
        }
    }

    /// Looks up the kind for an identifier prefix.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'R' => Some(DeviceKind::Router),
            'P' => Some(DeviceKind::Endpoint),
            'S' => Some(DeviceKind::Switch),
            _ => None,
        }
    }

    /// Returns the lowercase name used in action labels and persisted state.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Router => "router",
            DeviceKind::Endpoint => "pc",
            DeviceKind::Switch => "switch",
        }
    }

    /// Returns whether this kind runs the routing protocols.
    pub fn is_router(self) -> bool {
        self == DeviceKind::Router
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas position of a device. Not used by any routing computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A device placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: NodeId,
    pub kind: DeviceKind,
    pub name: String,
    pub position: Position,
}

impl Device {
    /// Returns whether this device runs the routing protocols.
    pub fn is_router(&self) -> bool {
        self.kind.is_router()
    }
}

/// Per-kind sequence counters.
///
/// Counters only grow, so identifiers are never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCounters {
    pub routers: u32,
    pub pcs: u32,
    pub switches: u32,
}

impl DeviceCounters {
    /// Returns the current counter for a kind.
    pub fn count(&self, kind: DeviceKind) -> u32 {
        match kind {
            DeviceKind::Router => self.routers,
            DeviceKind::Endpoint => self.pcs,
            DeviceKind::Switch => self.switches,
        }
    }

    fn count_mut(&mut self, kind: DeviceKind) -> &mut u32 {
        match kind {
            DeviceKind::Router => &mut self.routers,
            DeviceKind::Endpoint => &mut self.pcs,
            DeviceKind::Switch => &mut self.switches,
        }
    }

    /// Advances the counter for a kind and returns the new identifier.
    pub fn allocate(&mut self, kind: DeviceKind) -> (NodeId, u32) {
        let counter = self.count_mut(kind);
        *counter += 1;
        let sequence = *counter;
        (NodeId::new(format!("{}{sequence}", kind.prefix())), sequence)
    }

    /// Raises the counter for the identifier's kind so it is never handed out again.
    pub fn observe(&mut self, id: &NodeId) {
        if let (Some(kind), Some(sequence)) = (id.kind(), id.sequence()) {
            let counter = self.count_mut(kind);
            *counter = (*counter).max(sequence);
        }
    }
}
