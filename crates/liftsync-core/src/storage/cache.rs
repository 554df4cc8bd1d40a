//! Last-known-good snapshots per canonical date key.
//!
//! Entries are overwritten on every successful remote read or local write and
//! never expire on their own.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::kv::KvStore;
use crate::error::Result;
use crate::model::{CardioSession, WorkoutRecord};

const SESSION_PREFIX: &str = "cache:session:";
const CARDIO_PREFIX: &str = "cache:cardio:";

/// Stored snapshot with the time it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub date_key: String,
    pub snapshot: T,
    pub cached_at: DateTime<Utc>,
}

/// Write-behind cache over a [`KvStore`].
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KvStore>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, date_key: &str) -> Result<Option<WorkoutRecord>> {
        Ok(self
            .entry(SESSION_PREFIX, date_key)?
            .map(|e: CacheEntry<WorkoutRecord>| e.snapshot))
    }

    /// Full entry including `cached_at`.
    pub fn get_entry(&self, date_key: &str) -> Result<Option<CacheEntry<WorkoutRecord>>> {
        self.entry(SESSION_PREFIX, date_key)
    }

    /// Overwrite unconditionally; no merge with what was there.
    pub fn set(&self, date_key: &str, record: &WorkoutRecord) -> Result<()> {
        self.put(SESSION_PREFIX, date_key, record)
    }

    /// `Some(None)` means the date is known to have no cardio session.
    pub fn get_cardio(&self, date_key: &str) -> Result<Option<Option<CardioSession>>> {
        Ok(self
            .entry(CARDIO_PREFIX, date_key)?
            .map(|e: CacheEntry<Option<CardioSession>>| e.snapshot))
    }

    pub fn set_cardio(&self, date_key: &str, session: Option<&CardioSession>) -> Result<()> {
        self.put(CARDIO_PREFIX, date_key, &session)
    }

    fn entry<T: DeserializeOwned>(
        &self,
        prefix: &str,
        date_key: &str,
    ) -> Result<Option<CacheEntry<T>>> {
        let Some(raw) = self.store.get(&format!("{prefix}{date_key}"))? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(date = %date_key, error = %e, "unreadable cache entry, treating as miss");
                Ok(None)
            }
        }
    }

    fn put<T: Serialize>(&self, prefix: &str, date_key: &str, snapshot: &T) -> Result<()> {
        let entry = CacheEntry {
            date_key: date_key.to_string(),
            snapshot,
            cached_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(&format!("{prefix}{date_key}"), &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExerciseEntry, SetEntry};
    use crate::storage::kv::MemoryKvStore;

    fn cache() -> (LocalCache, Arc<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new());
        (LocalCache::new(store.clone()), store)
    }

    #[test]
    fn miss_then_hit() {
        let (cache, _) = cache();
        assert!(cache.get("3/14").unwrap().is_none());
        let record = WorkoutRecord::new(
            "3/14",
            vec![ExerciseEntry::new("Squat", vec![SetEntry::new(5, 100.0, 2)])],
        );
        cache.set("3/14", &record).unwrap();
        assert_eq!(cache.get("3/14").unwrap(), Some(record));
    }

    #[test]
    fn set_overwrites_without_merging() {
        let (cache, _) = cache();
        let first = WorkoutRecord::new("3/14", vec![ExerciseEntry::new("Squat", vec![])]);
        let second = WorkoutRecord::new("3/14", vec![ExerciseEntry::new("Bench", vec![])]);
        cache.set("3/14", &first).unwrap();
        cache.set("3/14", &second).unwrap();
        assert_eq!(cache.get("3/14").unwrap(), Some(second));
    }

    #[test]
    fn cardio_absence_is_cached_separately() {
        let (cache, _) = cache();
        assert_eq!(cache.get_cardio("3/14").unwrap(), None);
        cache.set_cardio("3/14", None).unwrap();
        assert_eq!(cache.get_cardio("3/14").unwrap(), Some(None));
        assert!(cache.get("3/14").unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_reads_as_miss() {
        let (cache, store) = cache();
        store.set("cache:session:3/14", "not json").unwrap();
        assert!(cache.get("3/14").unwrap().is_none());
    }

    #[test]
    fn entry_records_when_it_was_cached() {
        let (cache, _) = cache();
        let before = Utc::now();
        cache.set("3/14", &WorkoutRecord::empty("3/14")).unwrap();
        let entry = cache.get_entry("3/14").unwrap().unwrap();
        assert_eq!(entry.date_key, "3/14");
        assert!(entry.cached_at >= before);
    }
}
