pub mod cache;
mod config;
pub mod kv;
pub mod queue;

pub use cache::{CacheEntry, LocalCache};
pub use config::SyncConfig;
pub use kv::{KvStore, MemoryKvStore, SqliteKvStore};
pub use queue::{DrainReport, PendingQueue};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/liftsync[-dev]/` based on LIFTSYNC_ENV.
///
/// Set LIFTSYNC_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LIFTSYNC_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("liftsync-dev")
    } else {
        base_dir.join("liftsync")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
