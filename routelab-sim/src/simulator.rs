//! The routing simulator: one owned network plus its history and floods.
//!
//! Every topology change follows the same sequence: mutate the graph,
//! append the network event, recompute routing into a fresh value and
//! swap it in, snapshot the result into history, then cancel pending
//! floods by advancing the scheduler epoch.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::time::Duration;

use routelab_core::persistence::{self, ImportError};
use routelab_core::routing::{DistanceVectorTables, LinkStateAdvertisement, LinkStateTables};
use routelab_core::{
    ActionLabel, DeviceKind, DistanceVector, EventLog, HistoryManager, LinkOutcome,
    NetworkEventKind, NetworkState, NodeId, Position, Protocol, RouteEntry, RoutelabConfig,
    RoutingState, Topology,
};
use tracing::{debug, info, warn};

use crate::deterministic::{
    DeliveredRound, FloodHandle, FloodMetrics, Invariant, InvariantViolation, SimulationError,
    WaveScheduler,
};
use crate::flood::{self, FloodPlan};

/// Oldest violations are dropped beyond this many.
const MAX_RECORDED_VIOLATIONS: usize = 256;

/// Interactive routing protocol simulator.
pub struct RoutingSimulator {
    config: RoutelabConfig,
    state: NetworkState,
    history: HistoryManager,
    scheduler: WaveScheduler,
    invariants: Vec<Box<dyn Invariant>>,
    violations: VecDeque<InvariantViolation>,
}

impl RoutingSimulator {
    /// Creates an empty simulator for the configured protocol.
    ///
    /// # Errors
    ///
    /// - `RoutelabError::Configuration` - Configuration values are unusable
    pub fn new(config: RoutelabConfig) -> routelab_core::Result<Self> {
        config.validate()?;

        let state = NetworkState::empty(config.routing.protocol);
        let history = HistoryManager::new(state.clone(), config.history.snapshot_limit);
        let scheduler = WaveScheduler::new(
            config.flooding.round_delay,
            config.flooding.max_pending_rounds,
        );

        info!(
            "Routing simulator ready: protocol={}, round_delay={:?}",
            config.routing.protocol, config.flooding.round_delay
        );

        Ok(Self {
            config,
            state,
            history,
            scheduler,
            invariants: Vec::new(),
            violations: VecDeque::new(),
        })
    }

    /// Places a new device and returns its identifier.
    pub fn add_node(&mut self, kind: DeviceKind, position: Position) -> NodeId {
        let id = self.state.topology.add_device(kind, position);
        self.state.events.record(NetworkEventKind::NodeAdded {
            node_id: id.clone(),
            position,
        });
        debug!("Added {} {}", kind, id);

        self.commit(ActionLabel::add_device(kind));
        id
    }

    /// Moves a device on the canvas. Routing and history are untouched.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> bool {
        self.state.topology.move_device(id, position)
    }

    /// Deletes a device and its links. Unknown identifiers are ignored.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let Some(removed) = self.state.topology.remove_device(id) else {
            debug!("Ignoring removal of unknown device {}", id);
            return false;
        };
        self.state.events.record(NetworkEventKind::NodeRemoved {
            node_id: id.clone(),
        });
        debug!("Removed {} with {} links", id, removed.links.len());

        self.commit(ActionLabel::delete_device(id));
        true
    }

    /// Creates the link `{a, b}` or re-weights the existing one.
    pub fn add_or_update_link(&mut self, a: &NodeId, b: &NodeId, weight: i64) -> LinkOutcome {
        let outcome = self.state.topology.add_or_update_link(a, b, weight);
        match &outcome {
            LinkOutcome::Created => {
                self.state.events.record(NetworkEventKind::LinkCreated {
                    from: a.clone(),
                    to: b.clone(),
                });
                self.commit(ActionLabel::link_add(a, b));
            }
            LinkOutcome::Updated { previous_weight } => {
                debug!("Link {}-{} re-weighted {} -> {}", a, b, previous_weight, weight);
                self.commit(ActionLabel::link_update(a, b));
            }
            LinkOutcome::Unchanged => {}
            LinkOutcome::Rejected(reason) => {
                warn!("Rejected link {}-{} with weight {}: {:?}", a, b, weight, reason);
            }
        }
        outcome
    }

    /// Links `{a, b}` with the configured default weight.
    pub fn add_link(&mut self, a: &NodeId, b: &NodeId) -> LinkOutcome {
        let weight = i64::from(self.config.routing.default_link_weight);
        self.add_or_update_link(a, b, weight)
    }

    /// Deletes the link joining `{a, b}`. Missing links are ignored.
    pub fn remove_link(&mut self, a: &NodeId, b: &NodeId) -> bool {
        let Some(link) = self.state.topology.remove_link(a, b) else {
            return false;
        };
        self.state.events.record(NetworkEventKind::LinkRemoved {
            from: link.from,
            to: link.to,
        });
        self.commit(ActionLabel::link_remove(a, b));
        true
    }

    fn commit(&mut self, action: ActionLabel) {
        self.recompute();
        self.history.record(action, &self.state);
        self.scheduler.invalidate();
    }

    fn recompute(&mut self) {
        let routing = self
            .state
            .routing
            .recompute(&self.state.topology, &self.config.routing);
        self.state.routing = routing;
        self.check_invariants();
    }

    fn check_invariants(&mut self) {
        for invariant in &self.invariants {
            if let Err(violation) = invariant.check(&self.state) {
                warn!("{}", violation);
                if self.violations.len() == MAX_RECORDED_VIOLATIONS {
                    self.violations.pop_front();
                }
                self.violations.push_back(violation);
            }
        }
    }

    /// Starts a hello round from `origin` to its direct neighbors.
    ///
    /// Returns `None` when the origin is unknown or has no neighbors.
    ///
    /// # Errors
    ///
    /// - `SimulationError::EventQueueOverflow` - Too many rounds pending
    pub fn start_hello_flood(&mut self, origin: &NodeId) -> Result<Option<FloodHandle>, SimulationError> {
        let plan = flood::plan_hello(&self.state.topology.adjacency(), origin);
        self.launch(plan)
    }

    /// Floods `origin`'s link-state packet across the network.
    ///
    /// # Errors
    ///
    /// - `SimulationError::EventQueueOverflow` - Too many rounds pending
    pub fn start_lsp_flood(&mut self, origin: &NodeId) -> Result<Option<FloodHandle>, SimulationError> {
        let plan = flood::plan_full_flood(&self.state.topology.adjacency(), origin);
        self.launch(plan)
    }

    /// Has every device greet its neighbors once.
    ///
    /// # Errors
    ///
    /// - `SimulationError::EventQueueOverflow` - Too many rounds pending
    pub fn start_network_hello(&mut self) -> Result<Option<FloodHandle>, SimulationError> {
        let plan = flood::plan_network_hello(&self.state.topology.adjacency());
        self.launch(plan)
    }

    fn launch(&mut self, plan: FloodPlan) -> Result<Option<FloodHandle>, SimulationError> {
        if plan.is_empty() {
            debug!("Nothing to flood for {} from {:?}", plan.kind, plan.origin);
            return Ok(None);
        }
        self.scheduler.schedule(plan).map(Some)
    }

    /// Advances simulation time and applies every round that came due.
    ///
    /// # Errors
    ///
    /// - `SimulationError::Clock` - Step exceeds the maximum clock advance
    pub fn advance(&mut self, by: Duration) -> Result<Vec<DeliveredRound>, SimulationError> {
        let delivered = self.scheduler.advance(by)?;
        self.apply(&delivered);
        Ok(delivered)
    }

    /// Delivers every pending round.
    ///
    /// # Errors
    ///
    /// - `SimulationError::Clock` - Simulation time would move backwards
    pub fn run_until_idle(&mut self) -> Result<Vec<DeliveredRound>, SimulationError> {
        let delivered = self.scheduler.run_until_idle()?;
        self.apply(&delivered);
        Ok(delivered)
    }

    fn apply(&mut self, delivered: &[DeliveredRound]) {
        for round in delivered {
            for hop in &round.hops {
                self.state.events.record(NetworkEventKind::PacketSent {
                    from: hop.from.clone(),
                    to: hop.to.clone(),
                    packet_id: hop.packet_id,
                });
            }
            debug!(
                "Delivered round {} of {} flood {} ({} packets)",
                round.round,
                round.kind,
                round.flood_id,
                round.hops.len()
            );
        }
    }

    /// Restores the state before the last recorded action.
    pub fn undo(&mut self) -> bool {
        let Some(state) = self.history.undo() else {
            return false;
        };
        self.restore(state);
        info!("Undo to history index {:?}", self.history.cursor());
        true
    }

    /// Re-applies the next recorded action.
    pub fn redo(&mut self) -> bool {
        let Some(state) = self.history.redo() else {
            return false;
        };
        self.restore(state);
        info!("Redo to history index {:?}", self.history.cursor());
        true
    }

    fn restore(&mut self, state: NetworkState) {
        self.state = state;
        self.scheduler.invalidate();
    }

    /// Clears the network, its history and every pending flood.
    pub fn reset(&mut self) {
        let empty = NetworkState::empty(self.protocol());
        self.history.clear(empty.clone());
        self.restore(empty);
        self.violations.clear();
        info!("Simulator reset");
    }

    /// Replaces the network with a persisted one.
    ///
    /// The document is fully validated first; on error nothing changes.
    /// The imported network becomes the new history baseline.
    ///
    /// # Errors
    ///
    /// - `ImportError` - Malformed JSON or semantically invalid network
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let state = persistence::import_json(json, self.protocol(), &self.config.routing)?;
        self.load(state);
        Ok(())
    }

    /// Imports a persisted network from disk.
    ///
    /// # Errors
    ///
    /// - `ImportError` - File unreadable, malformed or invalid
    pub fn import_file(&mut self, path: &Path) -> Result<(), ImportError> {
        let state = persistence::read_from_path(path, self.protocol(), &self.config.routing)?;
        self.load(state);
        Ok(())
    }

    fn load(&mut self, state: NetworkState) {
        self.history.clear(state.clone());
        self.restore(state);
        self.violations.clear();
        self.check_invariants();
    }

    /// Serializes the network in the persisted layout.
    ///
    /// # Errors
    ///
    /// - `ImportError::Malformed` - Serialization failed
    pub fn export_json(&self) -> Result<String, ImportError> {
        Ok(persistence::export_json(&self.state)?)
    }

    /// Writes the network to disk in the persisted layout.
    ///
    /// # Errors
    ///
    /// - `ImportError::Io` - File cannot be written
    pub fn export_file(&self, path: &Path) -> Result<(), ImportError> {
        persistence::write_to_path(&self.state, path)
    }

    /// Registers an invariant checked after every recomputation.
    pub fn add_invariant(&mut self, invariant: Box<dyn Invariant>) {
        self.invariants.push(invariant);
    }

    /// Most recent invariant violations, oldest first.
    pub fn violations(&self) -> &VecDeque<InvariantViolation> {
        &self.violations
    }

    /// Removes and returns the recorded violations.
    pub fn take_violations(&mut self) -> Vec<InvariantViolation> {
        self.violations.drain(..).collect()
    }

    pub fn protocol(&self) -> Protocol {
        self.state.protocol()
    }

    pub fn topology(&self) -> &Topology {
        &self.state.topology
    }

    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    /// Published routing output of the active protocol.
    pub fn routing_tables(&self) -> &RoutingState {
        &self.state.routing
    }

    /// Route `source` uses towards `destination`, if reachable.
    pub fn route(&self, source: &NodeId, destination: &NodeId) -> Option<RouteEntry> {
        self.state.routing.route(source.as_str(), destination.as_str())
    }

    /// Distance vectors; None when running link state.
    pub fn distance_vectors(&self) -> Option<&BTreeMap<NodeId, DistanceVector>> {
        match &self.state.routing {
            RoutingState::DistanceVector(DistanceVectorTables {
                distance_vectors, ..
            }) => Some(distance_vectors),
            RoutingState::LinkState(_) => None,
        }
    }

    /// Link-state advertisements; None when running distance vector.
    pub fn link_states(&self) -> Option<&BTreeMap<NodeId, LinkStateAdvertisement>> {
        match &self.state.routing {
            RoutingState::LinkState(LinkStateTables { advertisements, .. }) => Some(advertisements),
            RoutingState::DistanceVector(_) => None,
        }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.state.events
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Due time of the next live flood round.
    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    pub fn pending_rounds(&self) -> usize {
        self.scheduler.pending_rounds()
    }

    pub fn flood_metrics(&self) -> &FloodMetrics {
        self.scheduler.metrics()
    }

    pub fn config(&self) -> &RoutelabConfig {
        &self.config
    }
}
