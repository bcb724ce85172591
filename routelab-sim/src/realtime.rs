//! Wall-clock playback of scheduled floods on tokio timers.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::deterministic::{DeliveredRound, SimulationError};
use crate::simulator::RoutingSimulator;

/// Plays pending flood rounds in real time until none are left.
///
/// The simulator lock is released while sleeping, so callers may mutate,
/// reset or undo concurrently; that cancels the rounds still pending and
/// playback stops. `on_round` runs for each delivered round, outside the
/// lock. Returns the number of rounds delivered.
///
/// # Errors
///
/// - `SimulationError::Clock` - Simulation time step out of range
pub async fn play_realtime<F>(
    simulator: Arc<Mutex<RoutingSimulator>>,
    mut on_round: F,
) -> Result<usize, SimulationError>
where
    F: FnMut(&DeliveredRound),
{
    let mut played = 0;

    loop {
        let wait = {
            let sim = simulator.lock().await;
            match sim.next_due() {
                Some(due) => due.saturating_sub(sim.now()),
                None => break,
            }
        };

        tokio::time::sleep(wait).await;

        let delivered = {
            let mut sim = simulator.lock().await;
            sim.advance(wait)?
        };
        for round in &delivered {
            on_round(round);
        }
        played += delivered.len();
    }

    debug!("Real-time playback finished after {} rounds", played);
    Ok(played)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use routelab_core::{DeviceKind, NodeId, Position, RoutelabConfig};
    use tokio::sync::mpsc;

    use super::*;

    fn line_simulator(round_delay: Duration, count: usize) -> (RoutingSimulator, Vec<NodeId>) {
        let mut config = RoutelabConfig::for_testing();
        config.flooding.round_delay = round_delay;
        let mut sim = RoutingSimulator::new(config).unwrap();
        let ids: Vec<NodeId> = (0..count)
            .map(|_| sim.add_node(DeviceKind::Router, Position::default()))
            .collect();
        for pair in ids.windows(2) {
            sim.add_or_update_link(&pair[0], &pair[1], 1);
        }
        (sim, ids)
    }

    #[tokio::test]
    async fn test_plays_every_round() {
        let (mut sim, ids) = line_simulator(Duration::from_millis(5), 4);
        sim.start_lsp_flood(&ids[0]).unwrap();
        let simulator = Arc::new(Mutex::new(sim));

        let mut rounds = Vec::new();
        let played = play_realtime(simulator.clone(), |round| rounds.push(round.round))
            .await
            .unwrap();

        assert_eq!(played, 3);
        assert_eq!(rounds, vec![0, 1, 2]);
        assert_eq!(simulator.lock().await.event_log().count_of("packet_sent"), 3);
    }

    #[tokio::test]
    async fn test_reset_stops_playback() {
        let (mut sim, ids) = line_simulator(Duration::from_millis(250), 5);
        sim.start_lsp_flood(&ids[0]).unwrap();
        let simulator = Arc::new(Mutex::new(sim));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = tokio::spawn(play_realtime(simulator.clone(), move |round| {
            let _ = tx.send(round.round);
        }));

        assert_eq!(rx.recv().await, Some(0));
        simulator.lock().await.reset();

        let played = player.await.unwrap().unwrap();
        assert_eq!(played, 1);
        assert!(simulator.lock().await.event_log().is_empty());
    }

    #[tokio::test]
    async fn test_idle_simulator_returns_immediately() {
        let (sim, _) = line_simulator(Duration::from_millis(5), 2);
        let played = play_realtime(Arc::new(Mutex::new(sim)), |_| {}).await.unwrap();
        assert_eq!(played, 0);
    }
}
