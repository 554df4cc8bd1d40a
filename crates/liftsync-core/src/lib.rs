//! # LiftSync Core Library
//!
//! This library keeps a device-local workout log in step with a remote
//! spreadsheet that is the source of truth. Reads and writes keep working
//! without connectivity; deferred writes are replayed in order once the
//! remote store is reachable again.
//!
//! ## Architecture
//!
//! - **Codec**: Fixed-offset row layouts for the session and cardio logs
//! - **Storage**: SQLite-backed key-value store holding the cache and the
//!   pending queue, plus TOML-based configuration
//! - **Remote**: Google Sheets `values` API client behind the [`RemoteTable`] trait
//! - **Sync**: Connectivity state machine and the coordinator that routes
//!   every read and write
//!
//! ## Key Components
//!
//! - [`SyncCoordinator`]: Read/write entry point for the presentation layer
//! - [`LocalCache`]: Last-known-good snapshot per date
//! - [`PendingQueue`]: Durable FIFO of deferred writes
//! - [`SheetsGateway`]: Authenticated spreadsheet access

pub mod codec;
pub mod date_key;
pub mod error;
pub mod model;
pub mod remote;
pub mod storage;
pub mod sync;

pub use error::{ConfigError, Result, StorageError, SyncError};
pub use model::{CardioSession, ChangePayload, ExerciseEntry, PendingChange, SetEntry, WorkoutRecord};
pub use remote::{LogTables, RemoteTable, SheetsGateway, StoredTokenProvider, TokenProvider};
pub use storage::{DrainReport, KvStore, LocalCache, PendingQueue, SqliteKvStore, SyncConfig};
pub use sync::{
    ConnectivityEvent, ConnectivityState, DateSelection, SyncCoordinator, SyncStatus, WriteOutcome,
};
