//! Discrete-event scheduling of flood rounds.
//!
//! Rounds wait in a min-heap keyed by due time. Bumping the epoch cancels
//! every pending round at once and drops it from the queue, so cancelled
//! rounds never count against the pending cap.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use super::clock::{ClockError, DeterministicClock};
use crate::flood::{FloodKind, FloodPlan, HopEvent};

/// Errors that can occur while scheduling or running floods.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Event queue exceeded maximum capacity
    #[error("Event queue overflow: {count} rounds pending")]
    EventQueueOverflow { count: usize },

    /// Simulation clock misuse
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),
}

/// Identifies a scheduled flood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodHandle {
    pub flood_id: u64,
    /// Epoch the flood belongs to
    pub epoch: u64,
    pub rounds: usize,
    pub events: usize,
}

/// Round of a flood whose time has come.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredRound {
    pub flood_id: u64,
    pub kind: FloodKind,
    pub round: usize,
    pub due: Duration,
    pub hops: Vec<HopEvent>,
}

#[derive(Debug, Clone)]
struct ScheduledRound {
    sequence: u64,
    due: Duration,
    flood_id: u64,
    kind: FloodKind,
    round: usize,
    hops: Vec<HopEvent>,
}

impl Eq for ScheduledRound {}

impl PartialEq for ScheduledRound {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Ord for ScheduledRound {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due first, then scheduling order; reversed for min-heap
        self.due
            .cmp(&other.due)
            .then_with(|| self.sequence.cmp(&other.sequence))
            .reverse()
    }
}

impl PartialOrd for ScheduledRound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Counters collected by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloodMetrics {
    pub floods_scheduled: u64,
    pub rounds_delivered: u64,
    pub rounds_discarded: u64,
    pub hops_delivered: u64,
    pub invalidations: u64,
    pub floods_by_kind: HashMap<&'static str, u64>,
}

/// Epoch-guarded queue of flood rounds on a deterministic clock.
#[derive(Debug)]
pub struct WaveScheduler {
    clock: DeterministicClock,
    queue: BinaryHeap<ScheduledRound>,
    epoch: u64,
    next_sequence: u64,
    next_flood_id: u64,
    round_delay: Duration,
    max_pending: usize,
    metrics: FloodMetrics,
}

impl WaveScheduler {
    pub fn new(round_delay: Duration, max_pending: usize) -> Self {
        Self {
            clock: DeterministicClock::new(),
            queue: BinaryHeap::new(),
            epoch: 0,
            next_sequence: 0,
            next_flood_id: 0,
            round_delay,
            max_pending,
            metrics: FloodMetrics::default(),
        }
    }

    /// Schedules every round of `plan`: round k is due `k * round_delay`
    /// after the current time.
    ///
    /// # Errors
    ///
    /// - `SimulationError::EventQueueOverflow` - Plan would exceed the pending round cap
    pub fn schedule(&mut self, plan: FloodPlan) -> Result<FloodHandle, SimulationError> {
        let count = self.queue.len() + plan.rounds.len();
        if count > self.max_pending {
            return Err(SimulationError::EventQueueOverflow { count });
        }

        let flood_id = self.next_flood_id;
        self.next_flood_id += 1;
        let handle = FloodHandle {
            flood_id,
            epoch: self.epoch,
            rounds: plan.rounds.len(),
            events: plan.event_count(),
        };

        let start = self.clock.now();
        for (round, hops) in plan.rounds.into_iter().enumerate() {
            let due = start + self.round_delay * round as u32;
            self.queue.push(ScheduledRound {
                sequence: self.next_sequence,
                due,
                flood_id,
                kind: plan.kind,
                round,
                hops,
            });
            self.next_sequence += 1;
        }

        self.metrics.floods_scheduled += 1;
        *self
            .metrics
            .floods_by_kind
            .entry(plan.kind.as_str())
            .or_insert(0) += 1;

        debug!(
            "Scheduled {} flood {} with {} rounds and {} events at {:?}",
            plan.kind, flood_id, handle.rounds, handle.events, start
        );
        Ok(handle)
    }

    /// Cancels every pending round by moving to a new epoch.
    pub fn invalidate(&mut self) -> u64 {
        let discarded = self.queue.len();
        self.queue.clear();
        self.epoch += 1;
        self.metrics.invalidations += 1;
        self.metrics.rounds_discarded += discarded as u64;
        trace!(
            "Scheduler epoch advanced to {}, {} rounds discarded",
            self.epoch, discarded
        );
        self.epoch
    }

    /// Advances the clock by `by`, returning every round that became due,
    /// in due order.
    ///
    /// # Errors
    ///
    /// - `SimulationError::Clock` - Step exceeds the maximum clock advance
    pub fn advance(&mut self, by: Duration) -> Result<Vec<DeliveredRound>, SimulationError> {
        let target = self.clock.step_target(by)?;
        let mut delivered = Vec::new();

        while let Some(next) = self.queue.peek() {
            if next.due > target {
                break;
            }
            let Some(round) = self.queue.pop() else {
                break;
            };
            delivered.push(self.accept(round)?);
        }

        self.clock.advance_to(target)?;
        Ok(delivered)
    }

    /// Delivers every pending round regardless of due time.
    ///
    /// # Errors
    ///
    /// - `SimulationError::Clock` - Simulation time would move backwards
    pub fn run_until_idle(&mut self) -> Result<Vec<DeliveredRound>, SimulationError> {
        let mut delivered = Vec::new();
        while let Some(round) = self.queue.pop() {
            delivered.push(self.accept(round)?);
        }
        Ok(delivered)
    }

    fn accept(&mut self, round: ScheduledRound) -> Result<DeliveredRound, SimulationError> {
        if round.due > self.clock.now() {
            self.clock.advance_to(round.due)?;
        }

        self.metrics.rounds_delivered += 1;
        self.metrics.hops_delivered += round.hops.len() as u64;
        Ok(DeliveredRound {
            flood_id: round.flood_id,
            kind: round.kind,
            round: round.round,
            due: round.due,
            hops: round.hops,
        })
    }

    /// Due time of the next pending round, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|r| r.due)
    }

    /// Number of rounds still waiting.
    pub fn pending_rounds(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending_rounds() == 0
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn round_delay(&self) -> Duration {
        self.round_delay
    }

    pub fn metrics(&self) -> &FloodMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routelab_core::NodeId;

    const DELAY: Duration = Duration::from_millis(1200);

    fn plan(rounds: usize) -> FloodPlan {
        FloodPlan {
            origin: Some(NodeId::new("R1")),
            kind: FloodKind::LinkState,
            rounds: (0..rounds)
                .map(|round| {
                    vec![HopEvent {
                        from: NodeId::new("R1"),
                        to: NodeId::new(format!("R{}", round + 2)),
                        packet_id: round as u64,
                        round,
                    }]
                })
                .collect(),
        }
    }

    #[test]
    fn test_round_ordering() {
        let early = ScheduledRound {
            sequence: 5,
            due: Duration::from_millis(10),
            flood_id: 0,
            kind: FloodKind::Hello,
            round: 0,
            hops: Vec::new(),
        };
        let late = ScheduledRound {
            sequence: 1,
            due: Duration::from_millis(20),
            ..early.clone()
        };

        // Reversed for min-heap
        assert!(early > late);
    }

    #[test]
    fn test_rounds_follow_delay() {
        let mut scheduler = WaveScheduler::new(DELAY, 100);
        let handle = scheduler.schedule(plan(3)).unwrap();
        assert_eq!(handle.rounds, 3);

        let first = scheduler.advance(Duration::ZERO).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].round, 0);

        let none = scheduler.advance(Duration::from_millis(1000)).unwrap();
        assert!(none.is_empty());
        assert_eq!(scheduler.next_due(), Some(DELAY));

        let second = scheduler.advance(Duration::from_millis(200)).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].due, DELAY);

        let rest = scheduler.run_until_idle().unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(scheduler.now(), DELAY * 2);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_invalidate_cancels_pending_rounds() {
        let mut scheduler = WaveScheduler::new(DELAY, 100);
        scheduler.schedule(plan(4)).unwrap();
        scheduler.advance(Duration::ZERO).unwrap();

        scheduler.invalidate();

        assert_eq!(scheduler.pending_rounds(), 0);
        assert!(scheduler.run_until_idle().unwrap().is_empty());
        assert_eq!(scheduler.metrics().rounds_discarded, 3);
        assert_eq!(scheduler.metrics().rounds_delivered, 1);
    }

    #[test]
    fn test_new_flood_after_invalidate_still_runs() {
        let mut scheduler = WaveScheduler::new(DELAY, 100);
        scheduler.schedule(plan(2)).unwrap();
        scheduler.invalidate();
        let handle = scheduler.schedule(plan(2)).unwrap();

        let delivered = scheduler.run_until_idle().unwrap();

        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|r| r.flood_id == handle.flood_id));
    }

    #[test]
    fn test_queue_overflow() {
        let mut scheduler = WaveScheduler::new(DELAY, 3);
        scheduler.schedule(plan(2)).unwrap();

        let err = scheduler.schedule(plan(2)).unwrap_err();
        assert!(matches!(err, SimulationError::EventQueueOverflow { count: 4 }));
    }

    #[test]
    fn test_cancelled_rounds_free_capacity() {
        let mut scheduler = WaveScheduler::new(DELAY, 3);
        scheduler.schedule(plan(2)).unwrap();
        scheduler.invalidate();

        assert_eq!(scheduler.pending_rounds(), 0);
        assert_eq!(scheduler.metrics().rounds_discarded, 2);

        scheduler.schedule(plan(3)).unwrap();
        assert_eq!(scheduler.pending_rounds(), 3);
        assert_eq!(scheduler.run_until_idle().unwrap().len(), 3);
    }

    #[test]
    fn test_advance_rejects_oversized_step() {
        let mut scheduler = WaveScheduler::new(DELAY, 100);
        scheduler.schedule(plan(2)).unwrap();

        let err = scheduler.advance(Duration::from_secs(90_000)).unwrap_err();

        assert!(matches!(
            err,
            SimulationError::Clock(ClockError::AdvanceTooLarge { .. })
        ));
        assert_eq!(scheduler.now(), Duration::ZERO);
        assert_eq!(scheduler.pending_rounds(), 2);
    }

    #[test]
    fn test_interleaved_floods_deliver_in_due_order() {
        let mut scheduler = WaveScheduler::new(DELAY, 100);
        let first = scheduler.schedule(plan(3)).unwrap();
        scheduler.advance(Duration::from_millis(600)).unwrap();
        let second = scheduler.schedule(plan(2)).unwrap();

        let delivered = scheduler.run_until_idle().unwrap();
        let order: Vec<(u64, Duration)> = delivered.iter().map(|r| (r.flood_id, r.due)).collect();

        assert_eq!(
            order,
            vec![
                (second.flood_id, Duration::from_millis(600)),
                (first.flood_id, DELAY),
                (second.flood_id, Duration::from_millis(1800)),
                (first.flood_id, DELAY * 2),
            ]
        );
    }
}
