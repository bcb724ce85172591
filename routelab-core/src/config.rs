//! Centralized configuration for Routelab.
//!
//! All tunable parameters are defined here to avoid hard-coded values
//! scattered across the routing engines and the wave simulator.

use std::time::Duration;

use crate::RoutelabError;
use crate::routing::Protocol;

/// Central configuration for all Routelab components.
///
/// Groups related settings into logical sections. Supports environment
/// variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct RoutelabConfig {
    pub routing: RoutingConfig,
    pub flooding: FloodingConfig,
    pub history: HistoryConfig,
}

/// Routing engine configuration.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Routing protocol driven by topology changes
    pub protocol: Protocol,
    /// Weight assigned to links created without an explicit weight
    pub default_link_weight: u32,
    /// Overrides the distance-vector pass cap (None = number of routers)
    pub max_convergence_passes: Option<usize>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::DistanceVector,
            default_link_weight: 1,
            max_convergence_passes: None,
        }
    }
}

/// Packet wave scheduling configuration.
///
/// Controls the simulated propagation delay between flood rounds and
/// bounds the discrete-event queue.
#[derive(Debug, Clone)]
pub struct FloodingConfig {
    /// Simulated propagation delay between consecutive rounds
    pub round_delay: Duration,
    /// Maximum number of rounds waiting in the scheduler
    pub max_pending_rounds: usize,
}

impl Default for FloodingConfig {
    fn default() -> Self {
        Self {
            round_delay: Duration::from_millis(1200), // matches the packet animation length
            max_pending_rounds: 10_000,
        }
    }
}

/// Undo/redo history configuration.
#[derive(Debug, Clone, Default)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept (None = unbounded)
    pub snapshot_limit: Option<usize>,
}

impl RoutelabConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(delay) = std::env::var("ROUTELAB_ROUND_DELAY_MS") {
            if let Ok(millis) = delay.parse::<u64>() {
                config.flooding.round_delay = Duration::from_millis(millis);
            }
        }

        if let Ok(weight) = std::env::var("ROUTELAB_DEFAULT_LINK_WEIGHT") {
            if let Ok(value) = weight.parse::<u32>() {
                config.routing.default_link_weight = value;
            }
        }

        if let Ok(limit) = std::env::var("ROUTELAB_HISTORY_LIMIT") {
            if let Ok(value) = limit.parse::<usize>() {
                config.history.snapshot_limit = Some(value);
            }
        }

        if let Ok(passes) = std::env::var("ROUTELAB_MAX_PASSES") {
            if let Ok(value) = passes.parse::<usize>() {
                config.routing.max_convergence_passes = Some(value);
            }
        }

        if let Ok(protocol) = std::env::var("ROUTELAB_PROTOCOL") {
            if let Ok(value) = protocol.parse::<Protocol>() {
                config.routing.protocol = value;
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Rounds are a few milliseconds apart so real-time playback stays fast.
    pub fn for_testing() -> Self {
        Self {
            flooding: FloodingConfig {
                round_delay: Duration::from_millis(10),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Returns a copy of this configuration driving the given protocol.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.routing.protocol = protocol;
        self
    }

    /// Checks that the configured values are usable.
    ///
    /// # Errors
    ///
    /// - `RoutelabError::Configuration` - Zero link weight, zero snapshot limit or zero queue size
    pub fn validate(&self) -> Result<(), RoutelabError> {
        if self.routing.default_link_weight == 0 {
            return Err(RoutelabError::Configuration {
                reason: "default link weight must be at least 1".to_string(),
            });
        }
        if self.history.snapshot_limit == Some(0) {
            return Err(RoutelabError::Configuration {
                reason: "history snapshot limit must be at least 1".to_string(),
            });
        }
        if self.flooding.max_pending_rounds == 0 {
            return Err(RoutelabError::Configuration {
                reason: "flood queue must hold at least one round".to_string(),
            });
        }
        Ok(())
    }
}
