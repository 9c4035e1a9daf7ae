//! Core error types for studytime-core.
//!
//! Every failure in the core reduces to one of three user-facing kinds:
//! validation (state unchanged), persistence (optimistic state kept) and
//! initialization (tracker degrades to offline mode).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studytime-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected user action
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Store read/write failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Backend unreachable at startup
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors (flushing an export)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Validation errors.
///
/// Raised before any state change; the caller surfaces them as notices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a subject first")]
    NoSubjectSelected,

    #[error("Timer is already running")]
    AlreadyRunning,

    #[error("Maximum session length reached, stop the timer to save it")]
    MaxLengthReached,

    #[error("Cannot change subject while the timer is running")]
    SubjectLocked,

    #[error("Subject name cannot be empty")]
    EmptySubject,

    #[error("Subject already exists: {0}")]
    DuplicateSubject(String),

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    #[error("Cannot remove active subject while timer is running")]
    SubjectInUse(String),

    #[error("Session must be at least {min_secs} seconds to save (got {secs})")]
    SessionTooShort { secs: u64, min_secs: u64 },

    #[error("No sessions to export")]
    NothingToExport,
}

/// Persistence gateway errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to open the store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored document could not be decoded
    #[error("Corrupt document for '{key}': {message}")]
    CorruptDocument { key: String, message: String },

    /// Store is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// Store not reachable (offline mode, failed connection)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
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

    /// No usable data directory
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    PersistenceError::Locked
                } else {
                    PersistenceError::QueryFailed(err.to_string())
                }
            }
            _ => PersistenceError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
