//! Connectivity state machine and sync status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the coordinator sends reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityState {
    /// Reads and writes go to the remote store.
    Online,
    /// Reads come from the cache, writes are queued.
    Offline,
    /// Connectivity is back and the pending queue is being drained.
    Syncing,
}

/// Connectivity notification from the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityEvent {
    Lost,
    Restored,
}

impl ConnectivityState {
    /// State after `event`, and whether a drain must start.
    ///
    /// Losing connectivity always lands in `Offline`. Regaining it only
    /// matters from `Offline`; repeated notifications are ignored.
    pub fn on_event(self, event: ConnectivityEvent) -> (Self, bool) {
        match (self, event) {
            (_, ConnectivityEvent::Lost) => (ConnectivityState::Offline, false),
            (ConnectivityState::Offline, ConnectivityEvent::Restored) => {
                (ConnectivityState::Syncing, true)
            }
            (state, ConnectivityEvent::Restored) => (state, false),
        }
    }

    /// State after a drain ends: `Online` only if nothing is left.
    pub fn after_drain(drained_everything: bool) -> Self {
        if drained_everything {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        }
    }

    /// Whether reads should try the remote store first.
    pub fn reads_remote(self) -> bool {
        !matches!(self, ConnectivityState::Offline)
    }
}

/// How a write was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Reached the remote store.
    Written,
    /// Durably queued for the next drain; the cache already reflects it.
    Queued,
}

/// Current sync status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: ConnectivityState,
    /// Number of pending changes to sync.
    pub pending_count: usize,
    /// Last drain that emptied the queue.
    pub last_sync_at: Option<DateTime<Utc>>,
}
