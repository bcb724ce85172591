//! Tracing setup for Routelab
//!
//! Provides dual output: console logs at a caller-chosen level and a full
//! trace log on disk, so a UI embedding the engine keeps a quiet console
//! while every recomputation and flood round stays inspectable afterwards.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::RoutelabError;

/// Name of the trace file written inside the logs directory.
pub const LOG_FILE_NAME: &str = "routelab-last-run.log";

/// Initialize tracing with dual output: console (chosen level) + file (full trace)
///
/// Writes complete trace logs to `logs/routelab-last-run.log` (or the given
/// directory), overwriting the previous run. `RUST_LOG` overrides the
/// console level when set.
///
/// Returns the path of the trace file.
///
/// # Errors
///
/// - `RoutelabError::Io` - Logs directory cannot be created or log file cannot be opened
/// - `RoutelabError::Tracing` - A global subscriber is already installed
pub fn init_tracing(
    console_level: LogLevel,
    logs_dir: Option<&Path>,
) -> Result<PathBuf, RoutelabError> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;

    let log_file_path = logs_path.join(LOG_FILE_NAME);
    let log_file = File::create(&log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RoutelabError::Tracing {
            reason: e.to_string(),
        })?;

    tracing::info!(
        "Tracing initialized: console={}, trace_file={}",
        console_level,
        log_file_path.display()
    );

    Ok(log_file_path)
}

/// Console log levels exposed to embedding applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including per-round flood tracing
    Trace,
}

impl LogLevel {
    /// Converts to the corresponding `tracing::Level`.
    pub fn as_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Warn.as_tracing_level(), Level::WARN);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_init_tracing_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested");

        let path = init_tracing(LogLevel::Warn, Some(&logs)).unwrap();

        assert_eq!(path, logs.join(LOG_FILE_NAME));
        assert!(path.exists());

        // A second global subscriber is refused rather than panicking
        let err = init_tracing(LogLevel::Warn, Some(&logs)).unwrap_err();
        assert!(matches!(err, RoutelabError::Tracing { .. }));
    }
}
