//! Weighted undirected links between devices.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Undirected weighted link. `from`/`to` only record creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: u32,
}

impl Link {
    /// Returns whether this link joins the unordered pair `{a, b}`.
    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }

    /// Returns whether `id` is one of the endpoints.
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.from == id || &self.to == id
    }

    /// Returns the endpoint opposite to `id`, if `id` is an endpoint.
    pub fn other_end(&self, id: &NodeId) -> Option<&NodeId> {
        if &self.from == id {
            Some(&self.to)
        } else if &self.to == id {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// Result of an add-or-update link request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new link was created
    Created,
    /// The existing link between the pair got a new weight
    Updated { previous_weight: u32 },
    /// The existing link already had this weight
    Unchanged,
    /// Nothing changed because the request was invalid
    Rejected(LinkRejection),
}

impl LinkOutcome {
    /// Returns whether the topology changed.
    pub fn is_change(&self) -> bool {
        matches!(self, LinkOutcome::Created | LinkOutcome::Updated { .. })
    }
}

/// Why a link request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRejection {
    /// Weights must be at least 1
    NonPositiveWeight,
    /// Weight does not fit the 32-bit link cost
    WeightTooLarge,
    /// A device cannot link to itself
    SelfLoop,
    /// One endpoint is not on the canvas
    UnknownNode(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(from: &str, to: &str) -> Link {
        Link {
            from: NodeId::new(from),
            to: NodeId::new(to),
            weight: 1,
        }
    }

    #[test]
    fn test_connects_is_unordered() {
        let l = link("R1", "R2");
        assert!(l.connects(&NodeId::new("R2"), &NodeId::new("R1")));
        assert!(!l.connects(&NodeId::new("R1"), &NodeId::new("R3")));
    }

    #[test]
    fn test_other_end() {
        let l = link("R1", "P1");
        assert_eq!(l.other_end(&NodeId::new("P1")), Some(&NodeId::new("R1")));
        assert_eq!(l.other_end(&NodeId::new("S1")), None);
    }
}
