//! Network graph model: devices, weighted undirected links and adjacency views.

mod device;
mod link;
mod topology;

pub use device::{Device, DeviceCounters, DeviceKind, NodeId, Position};
pub use link::{Link, LinkOutcome, LinkRejection};
pub use topology::{Adjacency, Neighbor, RemovedDevice, Topology};
