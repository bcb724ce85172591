//! Owned network topology with cascading mutations.

use std::collections::HashMap;

use super::{Device, DeviceCounters, DeviceKind, Link, LinkOutcome, LinkRejection, NodeId, Position};

/// Devices, links and per-kind counters of one simulated network.
///
/// Devices and links keep insertion order; every derived view (adjacency,
/// routing tables, flood schedules) is rebuilt from these two lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Topology {
    devices: Vec<Device>,
    links: Vec<Link>,
    counters: DeviceCounters,
}

/// A device removed from the topology together with its incident links.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedDevice {
    pub device: Device,
    pub links: Vec<Link>,
}

impl Topology {
    /// Creates an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a topology from already validated parts.
    pub(crate) fn from_parts(devices: Vec<Device>, links: Vec<Link>, counters: DeviceCounters) -> Self {
        Self {
            devices,
            links,
            counters,
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn counters(&self) -> DeviceCounters {
        self.counters
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Looks up a device by identifier.
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.device(id).is_some()
    }

    /// Returns whether `id` names a router on the canvas.
    pub fn is_router(&self, id: &str) -> bool {
        self.device(id).is_some_and(Device::is_router)
    }

    /// Returns router identifiers in lexical order.
    pub fn router_ids(&self) -> Vec<NodeId> {
        let mut routers: Vec<NodeId> = self
            .devices
            .iter()
            .filter(|d| d.is_router())
            .map(|d| d.id.clone())
            .collect();
        routers.sort();
        routers
    }

    /// Returns the link joining the unordered pair, if any.
    pub fn link_between(&self, a: &NodeId, b: &NodeId) -> Option<&Link> {
        self.links.iter().find(|l| l.connects(a, b))
    }

    /// Iterates `(neighbor, weight)` pairs of `id` in link order.
    pub fn neighbors_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = (&'a NodeId, u32)> + 'a {
        self.links
            .iter()
            .filter_map(move |l| l.other_end(id).map(|other| (other, l.weight)))
    }

    /// Places a new device and returns its identifier.
    pub fn add_device(&mut self, kind: DeviceKind, position: Position) -> NodeId {
        let (id, sequence) = self.counters.allocate(kind);
        self.devices.push(Device {
            id: id.clone(),
            kind,
            name: format!("{}{sequence}", kind.as_str().to_uppercase()),
            position,
        });
        id
    }

    /// Moves a device. Returns false for unknown identifiers.
    pub fn move_device(&mut self, id: &NodeId, position: Position) -> bool {
        match self.devices.iter_mut().find(|d| &d.id == id) {
            Some(device) => {
                device.position = position;
                true
            }
            None => false,
        }
    }

    /// Removes a device and every link touching it.
    pub fn remove_device(&mut self, id: &NodeId) -> Option<RemovedDevice> {
        let index = self.devices.iter().position(|d| &d.id == id)?;
        let device = self.devices.remove(index);

        let (removed, kept): (Vec<Link>, Vec<Link>) =
            self.links.drain(..).partition(|l| l.touches(id));
        self.links = kept;

        Some(RemovedDevice {
            device,
            links: removed,
        })
    }

    /// Creates the link `{a, b}` or re-weights the existing one.
    pub fn add_or_update_link(&mut self, a: &NodeId, b: &NodeId, weight: i64) -> LinkOutcome {
        if weight < 1 {
            return LinkOutcome::Rejected(LinkRejection::NonPositiveWeight);
        }
        let Ok(weight) = u32::try_from(weight) else {
            return LinkOutcome::Rejected(LinkRejection::WeightTooLarge);
        };
        if a == b {
            return LinkOutcome::Rejected(LinkRejection::SelfLoop);
        }
        for endpoint in [a, b] {
            if !self.contains(endpoint.as_str()) {
                return LinkOutcome::Rejected(LinkRejection::UnknownNode(endpoint.clone()));
            }
        }

        match self.links.iter_mut().find(|l| l.connects(a, b)) {
            Some(existing) if existing.weight == weight => LinkOutcome::Unchanged,
            Some(existing) => {
                let previous_weight = existing.weight;
                existing.weight = weight;
                LinkOutcome::Updated { previous_weight }
            }
            None => {
                self.links.push(Link {
                    from: a.clone(),
                    to: b.clone(),
                    weight,
                });
                LinkOutcome::Created
            }
        }
    }

    /// Removes the link joining the unordered pair.
    pub fn remove_link(&mut self, a: &NodeId, b: &NodeId) -> Option<Link> {
        let index = self.links.iter().position(|l| l.connects(a, b))?;
        Some(self.links.remove(index))
    }

    /// Builds a fresh adjacency view of the whole graph.
    pub fn adjacency(&self) -> Adjacency {
        let order: Vec<NodeId> = self.devices.iter().map(|d| d.id.clone()).collect();
        let mut neighbors: HashMap<NodeId, Vec<Neighbor>> =
            order.iter().map(|id| (id.clone(), Vec::new())).collect();

        for link in &self.links {
            if let Some(list) = neighbors.get_mut(&link.from) {
                list.push(Neighbor {
                    id: link.to.clone(),
                    weight: link.weight,
                });
            }
            if let Some(list) = neighbors.get_mut(&link.to) {
                list.push(Neighbor {
                    id: link.from.clone(),
                    weight: link.weight,
                });
            }
        }

        Adjacency { order, neighbors }
    }
}

/// One entry of an adjacency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub id: NodeId,
    pub weight: u32,
}

/// Snapshot adjacency view: node order plus per-node neighbor lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Adjacency {
    order: Vec<NodeId>,
    neighbors: HashMap<NodeId, Vec<Neighbor>>,
}

impl Adjacency {
    /// Nodes in device insertion order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    /// Neighbors of `id` in link insertion order; empty for unknown nodes.
    pub fn neighbors(&self, id: &str) -> &[Neighbor] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.neighbors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(count: usize) -> (Topology, Vec<NodeId>) {
        let mut topology = Topology::new();
        let ids: Vec<NodeId> = (0..count)
            .map(|_| topology.add_device(DeviceKind::Router, Position::default()))
            .collect();
        for pair in ids.windows(2) {
            topology.add_or_update_link(&pair[0], &pair[1], 1);
        }
        (topology, ids)
    }

    #[test]
    fn test_add_device_assigns_names() {
        let mut topology = Topology::new();
        let r = topology.add_device(DeviceKind::Router, Position::new(1.0, 2.0));
        let p = topology.add_device(DeviceKind::Endpoint, Position::default());

        assert_eq!(r.as_str(), "R1");
        assert_eq!(p.as_str(), "P1");
        assert_eq!(topology.device("R1").unwrap().name, "ROUTER1");
        assert_eq!(topology.device("P1").unwrap().name, "PC1");
        assert_eq!(topology.device("R1").unwrap().position, Position::new(1.0, 2.0));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut topology = Topology::new();
        let r1 = topology.add_device(DeviceKind::Router, Position::default());
        topology.remove_device(&r1);

        let next = topology.add_device(DeviceKind::Router, Position::default());
        assert_eq!(next.as_str(), "R2");
    }

    #[test]
    fn test_remove_device_cascades_links() {
        let (mut topology, ids) = line(3);

        let removed = topology.remove_device(&ids[1]).unwrap();

        assert_eq!(removed.links.len(), 2);
        assert!(topology.links().is_empty());
        assert_eq!(topology.devices().len(), 2);
        assert!(topology.remove_device(&NodeId::new("R9")).is_none());
    }

    #[test]
    fn test_duplicate_link_updates_in_place() {
        let (mut topology, ids) = line(2);

        let outcome = topology.add_or_update_link(&ids[1], &ids[0], 7);

        assert_eq!(outcome, LinkOutcome::Updated { previous_weight: 1 });
        assert_eq!(topology.links().len(), 1);
        assert_eq!(topology.links()[0].weight, 7);
        assert_eq!(
            topology.add_or_update_link(&ids[0], &ids[1], 7),
            LinkOutcome::Unchanged
        );
    }

    #[test]
    fn test_invalid_links_rejected() {
        let (mut topology, ids) = line(2);

        assert_eq!(
            topology.add_or_update_link(&ids[0], &ids[1], 0),
            LinkOutcome::Rejected(LinkRejection::NonPositiveWeight)
        );
        assert_eq!(
            topology.add_or_update_link(&ids[0], &ids[1], -4),
            LinkOutcome::Rejected(LinkRejection::NonPositiveWeight)
        );
        assert_eq!(
            topology.add_or_update_link(&ids[0], &ids[0], 1),
            LinkOutcome::Rejected(LinkRejection::SelfLoop)
        );
        let ghost = NodeId::new("R42");
        assert_eq!(
            topology.add_or_update_link(&ids[0], &ghost, 1),
            LinkOutcome::Rejected(LinkRejection::UnknownNode(ghost))
        );
        assert_eq!(topology.links()[0].weight, 1);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let (topology, ids) = line(3);
        let adjacency = topology.adjacency();

        assert_eq!(adjacency.nodes(), ids.as_slice());
        assert_eq!(adjacency.neighbors("R1").len(), 1);
        assert_eq!(adjacency.neighbors("R2").len(), 2);
        assert_eq!(adjacency.neighbors("R2")[0].id, ids[0]);
        assert!(adjacency.neighbors("R7").is_empty());
    }

    #[test]
    fn test_router_ids_are_lexical() {
        let mut topology = Topology::new();
        for _ in 0..10 {
            topology.add_device(DeviceKind::Router, Position::default());
        }
        topology.add_device(DeviceKind::Switch, Position::default());

        let routers = topology.router_ids();
        assert_eq!(routers.len(), 10);
        assert_eq!(routers[1].as_str(), "R10");
    }

    #[test]
    fn test_move_device() {
        let (mut topology, ids) = line(1);
        assert!(topology.move_device(&ids[0], Position::new(5.0, 6.0)));
        assert!(!topology.move_device(&NodeId::new("R5"), Position::default()));
        assert_eq!(topology.devices()[0].position, Position::new(5.0, 6.0));
    }
}
