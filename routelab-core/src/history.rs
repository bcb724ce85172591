//! Linear undo/redo over topology-affecting actions.

use std::fmt;

use tracing::debug;

use crate::graph::{DeviceKind, NodeId};
use crate::state::NetworkState;

/// Label describing the action that produced a snapshot.
///
/// Only labels starting with `add_`, `delete_` or `link_` are recorded;
/// moves and recomputation never enter the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLabel(String);

impl ActionLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn add_device(kind: DeviceKind) -> Self {
        Self(format!("add_{kind}"))
    }

    pub fn delete_device(id: &NodeId) -> Self {
        Self(format!("delete_{id}"))
    }

    pub fn link_add(from: &NodeId, to: &NodeId) -> Self {
        Self(format!("link_add_{from}_{to}"))
    }

    pub fn link_update(from: &NodeId, to: &NodeId) -> Self {
        Self(format!("link_update_{from}_{to}"))
    }

    pub fn link_remove(from: &NodeId, to: &NodeId) -> Self {
        Self(format!("link_remove_{from}_{to}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether actions with this label are snapshotted.
    pub fn is_topology_affecting(&self) -> bool {
        ["add_", "delete_", "link_"]
            .iter()
            .any(|prefix| self.0.starts_with(prefix))
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deep copy of the state right after an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub action: ActionLabel,
    pub state: NetworkState,
}

/// Ordered snapshots plus a cursor.
///
/// A cursor of `None` means the baseline state before any recorded
/// action. The baseline is the empty network, or whatever was imported
/// last.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    baseline: NetworkState,
    snapshots: Vec<Snapshot>,
    cursor: Option<usize>,
    limit: Option<usize>,
}

impl HistoryManager {
    /// Creates an empty history over `baseline`.
    pub fn new(baseline: NetworkState, limit: Option<usize>) -> Self {
        Self {
            baseline,
            snapshots: Vec::new(),
            cursor: None,
            limit,
        }
    }

    /// Drops every snapshot and starts over from a new baseline.
    pub fn clear(&mut self, baseline: NetworkState) {
        self.baseline = baseline;
        self.snapshots.clear();
        self.cursor = None;
    }

    /// Records `state` as the result of `action`.
    ///
    /// Returns false (and records nothing) for labels that are not
    /// topology-affecting. Any redo branch beyond the cursor is discarded.
    pub fn record(&mut self, action: ActionLabel, state: &NetworkState) -> bool {
        if !action.is_topology_affecting() {
            return false;
        }

        let keep = self.cursor.map_or(0, |c| c + 1);
        self.snapshots.truncate(keep);

        debug!("History: recording '{}' at index {}", action, self.snapshots.len());
        self.snapshots.push(Snapshot {
            action,
            state: state.clone(),
        });

        if let Some(limit) = self.limit {
            while self.snapshots.len() > limit {
                // The oldest snapshot becomes the state undo bottoms out at
                let oldest = self.snapshots.remove(0);
                self.baseline = oldest.state;
            }
        }

        self.cursor = Some(self.snapshots.len() - 1);
        true
    }

    /// Steps back one action and returns the state to restore.
    pub fn undo(&mut self) -> Option<NetworkState> {
        match self.cursor? {
            0 => {
                self.cursor = None;
                Some(self.baseline.clone())
            }
            index => {
                let snapshot = self.snapshots.get(index - 1)?;
                self.cursor = Some(index - 1);
                Some(snapshot.state.clone())
            }
        }
    }

    /// Steps forward one action and returns the state to restore.
    pub fn redo(&mut self) -> Option<NetworkState> {
        let next = self.cursor.map_or(0, |c| c + 1);
        let snapshot = self.snapshots.get(next)?;
        self.cursor = Some(next);
        Some(snapshot.state.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.snapshots.len()
    }

    /// Current cursor; None for the baseline.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Label of the action the current state came from.
    pub fn current_action(&self) -> Option<&ActionLabel> {
        self.cursor
            .and_then(|c| self.snapshots.get(c))
            .map(|snapshot| &snapshot.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Position;
    use crate::routing::Protocol;

    fn state_with_routers(count: usize) -> NetworkState {
        let mut state = NetworkState::empty(Protocol::DistanceVector);
        for _ in 0..count {
            state
                .topology
                .add_device(DeviceKind::Router, Position::default());
        }
        state
    }

    fn history() -> HistoryManager {
        HistoryManager::new(NetworkState::empty(Protocol::DistanceVector), None)
    }

    #[test]
    fn test_labels() {
        assert!(ActionLabel::add_device(DeviceKind::Endpoint).is_topology_affecting());
        assert_eq!(ActionLabel::add_device(DeviceKind::Endpoint).as_str(), "add_pc");
        assert!(ActionLabel::delete_device(&NodeId::new("R1")).is_topology_affecting());
        assert_eq!(
            ActionLabel::link_add(&NodeId::new("R1"), &NodeId::new("R2")).as_str(),
            "link_add_R1_R2"
        );
        assert!(!ActionLabel::new("move_R1").is_topology_affecting());
    }

    #[test]
    fn test_non_topology_actions_ignored() {
        let mut history = history();
        assert!(!history.record(ActionLabel::new("move_R1"), &state_with_routers(1)));
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_to_baseline_and_redo() {
        let mut history = history();
        let one = state_with_routers(1);
        let two = state_with_routers(2);
        history.record(ActionLabel::add_device(DeviceKind::Router), &one);
        history.record(ActionLabel::add_device(DeviceKind::Router), &two);

        assert_eq!(history.undo(), Some(one.clone()));
        assert_eq!(history.cursor(), Some(0));
        assert!(history.undo().unwrap().topology.is_empty());
        assert_eq!(history.cursor(), None);
        assert_eq!(history.undo(), None);

        assert_eq!(history.redo(), Some(one));
        assert_eq!(history.redo(), Some(two));
        assert_eq!(history.redo(), None);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_discards_redo_branch() {
        let mut history = history();
        history.record(ActionLabel::new("add_router"), &state_with_routers(1));
        history.record(ActionLabel::new("add_router"), &state_with_routers(2));
        history.undo();
        assert!(history.can_redo());

        history.record(ActionLabel::new("add_switch"), &state_with_routers(3));

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current_action().unwrap().as_str(), "add_switch");
    }

    #[test]
    fn test_record_after_full_undo_starts_over() {
        let mut history = history();
        history.record(ActionLabel::new("add_router"), &state_with_routers(1));
        history.undo();
        assert!(history.current_action().is_none());

        history.record(ActionLabel::new("add_pc"), &state_with_routers(4));

        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.current_action().unwrap().as_str(), "add_pc");
    }

    #[test]
    fn test_limit_moves_baseline() {
        let mut history = HistoryManager::new(NetworkState::empty(Protocol::DistanceVector), Some(2));
        for count in 1..=3 {
            history.record(ActionLabel::new("add_router"), &state_with_routers(count));
        }

        assert_eq!(history.len(), 2);
        history.undo();
        let baseline = history.undo().unwrap();
        assert_eq!(baseline.topology.devices().len(), 1);
        assert!(!history.can_undo());
    }
}
