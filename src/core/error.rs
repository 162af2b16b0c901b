//! Error types for scheduler and geofence operations.

use thiserror::Error;

/// Errors produced by scheduler and geofence components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Operation is not valid for the current state (double release,
    /// duplicate set, blocking an already blocked account).
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Polygon is unusable (fewer than three vertices).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Region definition text could not be parsed.
    #[error("parse error in {origin} at line {line}: {message}")]
    Parse {
        /// Which region source failed (`allowed`, `forbidden`, or a path).
        origin: String,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },
    /// No account set registered under this name.
    #[error("unknown account set: {0}")]
    UnknownSet(String),
    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Reading region files or writing a file sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
