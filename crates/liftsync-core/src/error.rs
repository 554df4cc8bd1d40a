//! Core error types for liftsync-core.
//!
//! The taxonomy mirrors how each failure is recovered:
//! - [`SyncError::Auth`] is surfaced for re-authentication and never retried.
//! - [`SyncError::Remote`] is recovered through the pending-change queue.
//! - [`SyncError::OfflineUnavailable`] is terminal for the read that raised it.
//!
//! Malformed remote cells are not errors at all; the row codec substitutes
//! zero/empty defaults.

use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by the gateway, the durable stores and the coordinator.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing, expired or rejected bearer token.
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Transport failure or non-success response from the remote store.
    #[error("Remote store error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// Offline read with nothing cached for the date.
    #[error("No cached data for {date} while offline")]
    OfflineUnavailable { date: String },

    /// Caller supplied a record the fixed-offset schema cannot hold.
    #[error("Invalid record: {0}")]
    Invalid(String),

    /// Durable local store failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    pub fn remote(message: impl Into<String>) -> Self {
        SyncError::Remote {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this failure should be answered by re-authenticating.
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Auth(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Remote {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Durable key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database file
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// A mutex guarding the store was poisoned by a panicking holder
    #[error("Store mutex poisoned")]
    Poisoned,

    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        SyncError::Storage(err.into())
    }
}

/// Result type alias for SyncError
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
