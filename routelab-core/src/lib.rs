//! Routelab Core - Graph model and routing engines
//!
//! This crate provides the algorithmic heart of the routing simulator:
//! the device/link graph, the distance-vector and link-state routing
//! engines, the network event log, undo/redo history and the persisted
//! JSON layout used for import and export.

pub mod config;
pub mod events;
pub mod graph;
pub mod history;
pub mod persistence;
pub mod routing;
pub mod state;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::RoutelabConfig;
pub use events::{EventLog, NetworkEvent, NetworkEventKind};
pub use graph::{
    Adjacency, Device, DeviceCounters, DeviceKind, Link, LinkOutcome, LinkRejection, Neighbor,
    NodeId, Position, Topology,
};
pub use history::{ActionLabel, HistoryManager, Snapshot};
pub use persistence::{ImportError, PersistedNetwork};
pub use routing::{
    Cost, DistanceVector, INFINITE_COST, Protocol, RouteEntry, RoutingState, RoutingTable,
};
pub use state::NetworkState;

/// Errors that can bubble up from any Routelab subsystem.
#[derive(Debug, thiserror::Error)]
pub enum RoutelabError {
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Tracing setup failed: {reason}")]
    Tracing { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoutelabError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            RoutelabError::Import(e) => format!("Failed to import network state: {e}"),
            RoutelabError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            RoutelabError::Tracing { .. } => "Logging could not be initialized".to_string(),
            RoutelabError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RoutelabError::Configuration { .. } | RoutelabError::Import(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RoutelabError>;
