//! Date-keyed reads and writes against the two log tables.

use std::sync::Arc;
use tracing::{debug, info};

use super::RemoteTable;
use crate::codec::columns::{a1_columns, CardioLayout, SessionLayout};
use crate::codec::{cardio_log, session_log};
use crate::error::Result;
use crate::model::{CardioSession, WorkoutRecord};
use crate::storage::SyncConfig;

/// The session and cardio logs of one spreadsheet.
#[derive(Clone)]
pub struct LogTables {
    remote: Arc<dyn RemoteTable>,
    session_sheet: String,
    cardio_sheet: String,
}

impl LogTables {
    pub fn new(remote: Arc<dyn RemoteTable>, config: &SyncConfig) -> Self {
        Self {
            remote,
            session_sheet: config.session_sheet.clone(),
            cardio_sheet: config.cardio_sheet.clone(),
        }
    }

    pub fn session_range(&self) -> String {
        a1_columns(&self.session_sheet, SessionLayout::WIDTH)
    }

    pub fn cardio_range(&self) -> String {
        a1_columns(&self.cardio_sheet, CardioLayout::WIDTH)
    }

    /// Everything logged in the session table under `key`.
    pub async fn fetch_workout(&self, key: &str) -> Result<WorkoutRecord> {
        let grid = self.remote.read(&self.session_range()).await?;
        let record = session_log::decode_day(&grid, key);
        debug!(date = %key, exercises = record.exercises.len(), rows = grid.len(), "fetched workout");
        Ok(record)
    }

    /// The cardio session logged under `key`, if any.
    pub async fn fetch_cardio(&self, key: &str) -> Result<Option<CardioSession>> {
        let grid = self.remote.read(&self.cardio_range()).await?;
        Ok(cardio_log::decode_day(&grid, key))
    }

    /// Write a record: located rows are updated cell by cell in one batch,
    /// exercises with no row yet are appended.
    pub async fn push_workout(&self, record: &WorkoutRecord) -> Result<()> {
        let grid = self.remote.read(&self.session_range()).await?;
        let plan = session_log::plan_write(&self.session_sheet, &grid, record);
        if plan.is_empty() {
            debug!(date = %record.date, "nothing to write");
            return Ok(());
        }

        if !plan.updates.is_empty() {
            self.remote.batch_write(&plan.updates).await?;
        }
        if !plan.appends.is_empty() {
            let prefix = self.session_range();
            self.remote.append(&prefix, &plan.appends).await?;
        }
        info!(
            date = %record.date,
            updated_cells = plan.updates.len(),
            appended_rows = plan.appends.len(),
            "workout written"
        );
        Ok(())
    }

    /// Write the cardio session for `key`, updating its row or appending one.
    pub async fn push_cardio(&self, key: &str, session: &CardioSession) -> Result<()> {
        let grid = self.remote.read(&self.cardio_range()).await?;
        match cardio_log::find_row(&grid, key) {
            Some(index) => {
                let writes = cardio_log::encode_update(&self.cardio_sheet, index, session);
                self.remote.batch_write(&writes).await?;
            }
            None => {
                let row = cardio_log::encode_append(key, session);
                self.remote.append(&self.cardio_range(), &[row]).await?;
            }
        }
        info!(date = %key, "cardio written");
        Ok(())
    }
}
