//! Sync coordinator: picks read/write policy by connectivity and drains the
//! pending queue when connectivity returns.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use super::selection::DateSelection;
use super::types::{ConnectivityEvent, ConnectivityState, SyncStatus, WriteOutcome};
use crate::date_key;
use crate::error::{Result, SyncError};
use crate::model::{CardioSession, ChangePayload, PendingChange, WorkoutRecord};
use crate::remote::{LogTables, RemoteTable};
use crate::storage::{DrainReport, KvStore, LocalCache, PendingQueue, SqliteKvStore, SyncConfig};

/// Owns the cache, the queue and the remote tables, and the connectivity
/// state that decides which of them a call touches.
///
/// Starts `Offline`; the host reports connectivity through
/// [`handle_event`](Self::handle_event).
pub struct SyncCoordinator {
    cache: LocalCache,
    queue: PendingQueue,
    tables: LogTables,
    state: watch::Sender<ConnectivityState>,
    /// One lock per date key so writes to a date never interleave.
    write_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    /// Held for the whole of a drain; drains never overlap.
    drain_lock: AsyncMutex<()>,
    last_sync_at: Mutex<Option<DateTime<Utc>>>,
}

impl SyncCoordinator {
    pub fn new(cache: LocalCache, queue: PendingQueue, tables: LogTables) -> Self {
        let (state, _) = watch::channel(ConnectivityState::Offline);
        Self {
            cache,
            queue,
            tables,
            state,
            write_locks: Mutex::new(HashMap::new()),
            drain_lock: AsyncMutex::new(()),
            last_sync_at: Mutex::new(None),
        }
    }

    /// Cache and queue share one durable store.
    pub fn with_store(
        store: Arc<dyn KvStore>,
        remote: Arc<dyn RemoteTable>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(
            LocalCache::new(store.clone()),
            PendingQueue::new(store),
            LogTables::new(remote, config),
        )
    }

    /// Open the SQLite store named by `config` under `data_dir`.
    pub fn open(
        config: &SyncConfig,
        data_dir: &Path,
        remote: Arc<dyn RemoteTable>,
    ) -> Result<Self> {
        let store = SqliteKvStore::open(&config.database_path(data_dir))?;
        Ok(Self::with_store(Arc::new(store), remote, config))
    }

    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    pub fn status(&self) -> Result<SyncStatus> {
        Ok(SyncStatus {
            state: self.state(),
            pending_count: self.queue.len()?,
            last_sync_at: *self.last_sync_at.lock().unwrap_or_else(|p| p.into_inner()),
        })
    }

    pub fn pending(&self) -> Result<Vec<PendingChange>> {
        self.queue.entries()
    }

    /// Apply a connectivity notification.
    ///
    /// Returns the drain report when the event started a drain.
    pub async fn handle_event(&self, event: ConnectivityEvent) -> Result<Option<DrainReport>> {
        let mut start_drain = false;
        self.state.send_if_modified(|state| {
            let (next, drain) = state.on_event(event);
            start_drain = drain;
            let changed = *state != next;
            if changed {
                info!(from = ?*state, to = ?next, ?event, "connectivity state changed");
            }
            *state = next;
            changed
        });

        if !start_drain {
            return Ok(None);
        }
        self.sync_after_reconnect().await.map(Some)
    }

    async fn sync_after_reconnect(&self) -> Result<DrainReport> {
        let _drain = self.drain_lock.lock().await;

        // Another drain may have finished or connectivity dropped while we waited.
        if self.state() != ConnectivityState::Syncing {
            debug!(state = ?self.state(), "skipping drain, state moved on");
            return Ok(DrainReport {
                remaining: self.queue.len()?,
                ..DrainReport::default()
            });
        }

        let report = self
            .queue
            .drain_while(
                |change| self.apply_change(change),
                || self.state() == ConnectivityState::Syncing,
            )
            .await;

        let report = match report {
            Ok(report) => report,
            Err(e) => {
                self.finish_drain(false);
                return Err(e);
            }
        };

        let complete = report.is_complete();
        if complete {
            self.mark_synced();
        }
        if let Some(e) = &report.error {
            if e.is_auth() {
                warn!("drain stopped on authentication failure; re-authentication required");
            }
        }
        info!(
            applied = report.applied,
            remaining = report.remaining,
            cancelled = report.cancelled,
            "drain finished"
        );
        self.finish_drain(complete);
        Ok(report)
    }

    /// Leave `Syncing` unless something else already moved the state.
    fn finish_drain(&self, complete: bool) {
        self.state.send_if_modified(|state| {
            if *state != ConnectivityState::Syncing {
                return false;
            }
            *state = ConnectivityState::after_drain(complete);
            info!(to = ?*state, "drain ended");
            true
        });
    }

    fn mark_synced(&self) {
        *self.last_sync_at.lock().unwrap_or_else(|p| p.into_inner()) = Some(Utc::now());
    }

    /// Drain the queue while `Online`, e.g. after a write failed inline.
    ///
    /// Does nothing unless `Online`; leaves the state alone either way.
    pub async fn flush_pending(&self) -> Result<DrainReport> {
        let _drain = self.drain_lock.lock().await;
        if self.state() != ConnectivityState::Online {
            return Ok(DrainReport {
                remaining: self.queue.len()?,
                ..DrainReport::default()
            });
        }
        let report = self
            .queue
            .drain_while(
                |change| self.apply_change(change),
                || self.state() == ConnectivityState::Online,
            )
            .await?;
        if report.is_complete() {
            self.mark_synced();
        }
        Ok(report)
    }

    fn date_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.write_locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Push one queued change. The cache is not touched: it already holds
    /// this change or a newer local edit.
    async fn apply_change(&self, change: PendingChange) -> Result<()> {
        let lock = self.date_lock(&change.date);
        let _guard = lock.lock().await;
        match &change.payload {
            ChangePayload::Session(record) => self.tables.push_workout(record).await,
            ChangePayload::Cardio(session) => self.tables.push_cardio(&change.date, session).await,
        }
    }

    fn has_pending(&self, key: &str, cardio: bool) -> Result<bool> {
        Ok(self.queue.entries()?.iter().any(|c| {
            c.date == key && matches!(c.payload, ChangePayload::Cardio(_)) == cardio
        }))
    }

    /// Workout for a canonical date key.
    ///
    /// Offline: cache only, and a miss is [`SyncError::OfflineUnavailable`].
    /// Otherwise the remote log is read and cached; if that fails the cache
    /// answers, and only a cache miss surfaces the remote error.
    pub async fn load_workout(&self, key: &str) -> Result<WorkoutRecord> {
        if !self.state().reads_remote() {
            return self
                .cache
                .get(key)?
                .ok_or_else(|| SyncError::OfflineUnavailable { date: key.to_string() });
        }

        match self.tables.fetch_workout(key).await {
            Ok(record) => {
                // Queued local edits are newer than anything the remote holds.
                if self.has_pending(key, false)? {
                    if let Some(local) = self.cache.get(key)? {
                        debug!(date = %key, "pending edits, serving local snapshot");
                        return Ok(local);
                    }
                }
                self.cache.set(key, &record)?;
                Ok(record)
            }
            Err(e) => {
                warn!(date = %key, error = %e, "remote read failed, falling back to cache");
                self.cache.get(key)?.ok_or(e)
            }
        }
    }

    /// Cardio session for a canonical date key; same policy as
    /// [`load_workout`](Self::load_workout).
    pub async fn load_cardio(&self, key: &str) -> Result<Option<CardioSession>> {
        if !self.state().reads_remote() {
            return self
                .cache
                .get_cardio(key)?
                .ok_or_else(|| SyncError::OfflineUnavailable { date: key.to_string() });
        }

        match self.tables.fetch_cardio(key).await {
            Ok(session) => {
                if self.has_pending(key, true)? {
                    if let Some(local) = self.cache.get_cardio(key)? {
                        return Ok(local);
                    }
                }
                self.cache.set_cardio(key, session.as_ref())?;
                Ok(session)
            }
            Err(e) => {
                warn!(date = %key, error = %e, "remote cardio read failed, falling back to cache");
                self.cache.get_cardio(key)?.ok_or(e)
            }
        }
    }

    /// Load the selected date's workout; `None` if the selection changed
    /// while the read was in flight.
    ///
    /// Nothing selected yet also yields `None`, without touching any store.
    pub async fn load_selected(&self, selection: &DateSelection) -> Result<Option<WorkoutRecord>> {
        let ticket = selection.ticket();
        if ticket.key.is_empty() {
            return Ok(None);
        }
        let result = self.load_workout(&ticket.key).await;
        if !selection.is_current(&ticket) {
            debug!(date = %ticket.key, "discarding result for a date no longer selected");
            return Ok(None);
        }
        result.map(Some)
    }

    /// Save a workout.
    ///
    /// Online with an empty queue the write goes straight to the remote log.
    /// Otherwise, or when that fails, it is queued and the cache updated so
    /// the device sees the edit at once. An authentication failure is
    /// returned after the change is safely queued.
    pub async fn save_workout(&self, record: WorkoutRecord) -> Result<WriteOutcome> {
        record.validate()?;
        let key = record.date.clone();
        let change = PendingChange::session(record.clone());
        self.save(&key, change, || async {
            self.tables.push_workout(&record).await?;
            self.cache.set(&key, &record)
        })
        .await
    }

    /// Save the cardio session for `key`.
    pub async fn save_cardio(&self, key: &str, session: CardioSession) -> Result<WriteOutcome> {
        date_key::ensure_canonical(key)?;
        session.validate()?;
        let change = PendingChange::cardio(key, session.clone());
        self.save(key, change, || async {
            self.tables.push_cardio(key, &session).await?;
            self.cache.set_cardio(key, Some(&session))
        })
        .await
    }

    async fn save<F, Fut>(&self, key: &str, change: PendingChange, write_through: F) -> Result<WriteOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let lock = self.date_lock(key);
        let guard = lock.lock().await;

        let state = self.state();
        if state != ConnectivityState::Online {
            debug!(date = %key, ?state, "not online, queueing write");
            self.queue_locally(change)?;
            return Ok(WriteOutcome::Queued);
        }

        if !self.queue.is_empty()? {
            // Older queued writes must reach the remote first.
            let id = change.id;
            self.queue_locally(change)?;
            drop(guard);
            let report = self.flush_pending().await?;
            let still_queued = self.queue.entries()?.iter().any(|c| c.id == id);
            if let Some(e) = report.error.filter(SyncError::is_auth) {
                warn!(date = %key, "queued write blocked on authentication");
                return Err(e);
            }
            return Ok(if still_queued {
                WriteOutcome::Queued
            } else {
                WriteOutcome::Written
            });
        }

        match write_through().await {
            Ok(()) => Ok(WriteOutcome::Written),
            Err(SyncError::Storage(e)) => Err(SyncError::Storage(e)),
            Err(e) => {
                warn!(date = %key, error = %e, "write failed, queueing for retry");
                self.queue_locally(change)?;
                if e.is_auth() {
                    Err(e)
                } else {
                    Ok(WriteOutcome::Queued)
                }
            }
        }
    }

    /// Enqueue and mirror the change into the cache.
    fn queue_locally(&self, change: PendingChange) -> Result<()> {
        match &change.payload {
            ChangePayload::Session(record) => self.cache.set(&change.date, record)?,
            ChangePayload::Cardio(session) => self.cache.set_cardio(&change.date, Some(session))?,
        }
        self.queue.enqueue(change)
    }
}
