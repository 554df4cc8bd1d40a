//! Offline-first synchronization layer.
//!
//! [`SyncCoordinator`] routes reads and writes between the local cache, the
//! pending queue and the remote log tables according to connectivity, and
//! replays queued writes when connectivity returns.

pub mod coordinator;
pub mod selection;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::SyncCoordinator;
pub use selection::{DateSelection, SelectionTicket};
pub use types::{ConnectivityEvent, ConnectivityState, SyncStatus, WriteOutcome};
