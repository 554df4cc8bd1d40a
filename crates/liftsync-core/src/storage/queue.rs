//! Durable FIFO of writes deferred while offline.
//!
//! The whole queue is one JSON array under a single key. Entries are never
//! reordered, merged or deduplicated; two offline edits of the same date are
//! two entries, applied in the order they were made.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::kv::KvStore;
use crate::error::{Result, StorageError, SyncError};
use crate::model::PendingChange;

const QUEUE_KEY: &str = "queue:pending";

/// Outcome of one pass over the queue.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Entries applied and removed, in order.
    pub applied: usize,
    /// Entries still queued when the pass ended.
    pub remaining: usize,
    /// The failure that stopped the pass, if any.
    pub error: Option<SyncError>,
    /// The pass was stopped by its continuation check before an entry.
    pub cancelled: bool,
}

impl DrainReport {
    /// Every entry was applied and nothing is left.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && !self.cancelled && self.remaining == 0
    }
}

/// Pending-change queue over a [`KvStore`].
#[derive(Clone)]
pub struct PendingQueue {
    store: Arc<dyn KvStore>,
    /// Serializes read-modify-write cycles on the stored array.
    guard: Arc<Mutex<()>>,
}

impl PendingQueue {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Append to the tail.
    pub fn enqueue(&self, change: PendingChange) -> Result<()> {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.load()?;
        debug!(date = %change.date, id = %change.id, position = entries.len(), "enqueue pending change");
        entries.push(change);
        self.persist(&entries)
    }

    /// Snapshot of the queue, head first.
    pub fn entries(&self) -> Result<Vec<PendingChange>> {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        self.load()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every entry. Only meant for after a drain that applied them all.
    pub fn clear(&self) -> Result<()> {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        self.store.remove(QUEUE_KEY)?;
        Ok(())
    }

    /// Apply entries head first, removing each only after `apply` succeeds.
    ///
    /// Stops at the first failure and leaves that entry and everything behind
    /// it untouched. Entries enqueued while the drain runs are picked up by it.
    pub async fn drain<F, Fut>(&self, apply: F) -> Result<DrainReport>
    where
        F: FnMut(PendingChange) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.drain_while(apply, || true).await
    }

    /// [`drain`](Self::drain) with a continuation check evaluated before each
    /// entry; returning `false` ends the pass with everything left in place.
    pub async fn drain_while<F, Fut, C>(&self, mut apply: F, keep_going: C) -> Result<DrainReport>
    where
        F: FnMut(PendingChange) -> Fut,
        Fut: Future<Output = Result<()>>,
        C: Fn() -> bool,
    {
        let mut report = DrainReport::default();

        loop {
            let Some(head) = self.entries()?.into_iter().next() else {
                break;
            };

            if !keep_going() {
                info!(applied = report.applied, "drain cancelled");
                report.cancelled = true;
                break;
            }

            let id = head.id;
            let date = head.date.clone();
            match apply(head).await {
                Ok(()) => {
                    self.remove(id)?;
                    report.applied += 1;
                    debug!(date = %date, id = %id, "applied pending change");
                }
                Err(e) => {
                    warn!(date = %date, id = %id, error = %e, "pending change failed, stopping drain");
                    report.error = Some(e);
                    break;
                }
            }
        }

        report.remaining = self.len()?;
        Ok(report)
    }

    fn remove(&self, id: uuid::Uuid) -> Result<()> {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.load()?;
        if let Some(pos) = entries.iter().position(|e| e.id == id) {
            entries.remove(pos);
        }
        self.persist(&entries)
    }

    fn load(&self) -> Result<Vec<PendingChange>> {
        match self.store.get(QUEUE_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, entries: &[PendingChange]) -> Result<()> {
        if entries.is_empty() {
            self.store.remove(QUEUE_KEY)?;
        } else {
            self.store.set(QUEUE_KEY, &serde_json::to_string(entries)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangePayload, WorkoutRecord};
    use crate::storage::kv::{MemoryKvStore, SqliteKvStore};
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn change(date: &str) -> PendingChange {
        PendingChange::session(WorkoutRecord::empty(date))
    }

    fn queue() -> PendingQueue {
        PendingQueue::new(Arc::new(MemoryKvStore::new()))
    }

    #[tokio::test]
    async fn drain_applies_in_fifo_order() {
        let queue = queue();
        for date in ["3/14", "3/15", "3/14"] {
            queue.enqueue(change(date)).unwrap();
        }

        let seen = RefCell::new(Vec::new());
        let report = queue
            .drain(|c| {
                seen.borrow_mut().push(c.date.clone());
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(*seen.borrow(), vec!["3/14", "3/15", "3/14"]);
        assert_eq!(report.applied, 3);
        assert!(report.is_complete());
        assert!(queue.is_empty().unwrap());
    }

    #[tokio::test]
    async fn failure_keeps_failed_entry_and_tail() {
        let queue = queue();
        let first = change("3/14");
        let second = change("3/15");
        let third = change("3/16");
        queue.enqueue(first.clone()).unwrap();
        queue.enqueue(second.clone()).unwrap();
        queue.enqueue(third.clone()).unwrap();

        let report = queue
            .drain(|c| {
                let fail = c.date == "3/15";
                async move {
                    if fail {
                        Err(SyncError::remote("503"))
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.remaining, 2);
        assert!(matches!(report.error, Some(SyncError::Remote { .. })));
        assert_eq!(queue.entries().unwrap(), vec![second, third]);
    }

    #[tokio::test]
    async fn second_of_two_failing_leaves_exactly_second() {
        let queue = queue();
        let first = change("3/14");
        let second = change("3/14");
        queue.enqueue(first.clone()).unwrap();
        queue.enqueue(second.clone()).unwrap();

        let second_id = second.id;
        let report = queue
            .drain(|c| async move {
                if c.id == second_id {
                    Err(SyncError::remote("timeout"))
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(queue.entries().unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn cancelled_drain_leaves_everything() {
        let queue = queue();
        queue.enqueue(change("3/14")).unwrap();
        let report = queue
            .drain_while(|_| async { Ok(()) }, || false)
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.applied, 0);
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn entries_enqueued_mid_drain_are_applied() {
        let queue = queue();
        queue.enqueue(change("3/14")).unwrap();
        let producer = queue.clone();
        let added = RefCell::new(false);

        let report = queue
            .drain(|_| {
                if !*added.borrow() {
                    producer.enqueue(change("3/15")).unwrap();
                    *added.borrow_mut() = true;
                }
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(report.applied, 2);
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn queue_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue.db");
        let original = change("3/14");
        {
            let queue = PendingQueue::new(Arc::new(SqliteKvStore::open(&path).unwrap()));
            queue.enqueue(original.clone()).unwrap();
        }
        let queue = PendingQueue::new(Arc::new(SqliteKvStore::open(&path).unwrap()));
        let entries = queue.entries().unwrap();
        assert_eq!(entries, vec![original]);
        assert!(matches!(entries[0].payload, ChangePayload::Session(_)));
    }

    #[test]
    fn clear_empties_queue() {
        let queue = queue();
        queue.enqueue(change("3/14")).unwrap();
        queue.clear().unwrap();
        assert!(queue.is_empty().unwrap());
    }
}
