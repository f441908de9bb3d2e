//! Core error types for worktally-core.
//!
//! Each layer has its own `thiserror` enum; [`CoreError`] wraps them all for
//! callers that don't care which layer failed.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::timer::TimerPhase;

/// Core error type for worktally-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer state machine errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Shared report fetch errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the timer state machine.
///
/// A call that fails with one of these leaves the engine untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Operation is not valid from the current phase
    #[error("cannot {operation} while timer is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: TimerPhase,
    },

    /// Task name was empty after trimming
    #[error("task name must not be empty")]
    EmptyTaskName,
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No identity context for an owner-scoped call
    #[error("Not authenticated: no user identity configured")]
    NotAuthenticated,

    /// Record does not exist (or belongs to another owner)
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Failed to open database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored value could not be decoded
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),

    /// Data directory could not be prepared
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcomes of fetching a published report that are not a payload.
///
/// All of these are terminal for a viewer; retrying won't change them.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The report's expiry timestamp has passed
    #[error("This report has expired (at {expired_at})")]
    Expired { expired_at: DateTime<Utc> },

    /// The owner switched the report off
    #[error("This report has been deactivated")]
    Deactivated,

    /// No report with that id
    #[error("Report '{0}' not found")]
    NotFound(String),

    /// Underlying storage failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside its allowed range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(StorageError::Sqlite(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
