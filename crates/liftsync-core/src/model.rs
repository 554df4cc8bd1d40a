//! Domain records exchanged between the cache, the queue and the remote log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date_key;
use crate::error::{Result, SyncError};

/// The session log reserves exactly this many (reps, weight, rir) triplets.
pub const MAX_SETS: usize = 3;

/// One working set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SetEntry {
    pub reps: u32,
    pub weight: f64,
    pub rir: u32,
}

impl SetEntry {
    pub fn new(reps: u32, weight: f64, rir: u32) -> Self {
        Self { reps, weight, rir }
    }
}

/// One exercise performed on a date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ExerciseEntry {
    pub fn new(name: impl Into<String>, sets: Vec<SetEntry>) -> Self {
        Self {
            name: name.into(),
            sets,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Names are matched case-insensitively against the remote log.
    pub fn same_exercise(&self, other_name: &str) -> bool {
        self.name.trim().to_lowercase() == other_name.trim().to_lowercase()
    }
}

/// Everything logged for one canonical date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub date: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

impl WorkoutRecord {
    pub fn new(date: impl Into<String>, exercises: Vec<ExerciseEntry>) -> Self {
        Self {
            date: date.into(),
            exercises,
        }
    }

    pub fn empty(date: impl Into<String>) -> Self {
        Self::new(date, Vec::new())
    }

    /// Check the record fits the fixed-offset layout before it is written.
    pub fn validate(&self) -> Result<()> {
        date_key::ensure_canonical(&self.date)?;
        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                return Err(SyncError::Invalid(format!(
                    "exercise without a name on {}",
                    self.date
                )));
            }
            if exercise.sets.len() > MAX_SETS {
                return Err(SyncError::Invalid(format!(
                    "'{}' has {} sets, at most {MAX_SETS} fit in a row",
                    exercise.name,
                    exercise.sets.len()
                )));
            }
            if exercise.sets.iter().any(|s| !s.weight.is_finite() || s.weight < 0.0) {
                return Err(SyncError::Invalid(format!(
                    "'{}' has a negative or non-finite weight",
                    exercise.name
                )));
            }
        }
        Ok(())
    }
}

/// A cardio block; at most one per date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardioSession {
    pub modality: String,
    pub minutes: u32,
    pub seconds: u32,
    pub rpe: f64,
    /// Interval description such as `"30/30"`, kept verbatim.
    pub work_rest: String,
    pub watts: u32,
    #[serde(default)]
    pub notes: String,
}

impl CardioSession {
    /// Check the numeric fields can be written to the sheet and read back.
    pub fn validate(&self) -> Result<()> {
        if !self.rpe.is_finite() || self.rpe < 0.0 {
            return Err(SyncError::Invalid(format!(
                "cardio rpe must be a non-negative number, got {}",
                self.rpe
            )));
        }
        Ok(())
    }
}

/// What a queued change carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum ChangePayload {
    Session(WorkoutRecord),
    Cardio(CardioSession),
}

/// A write deferred while the remote store was unreachable.
///
/// Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: Uuid,
    pub date: String,
    pub payload: ChangePayload,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingChange {
    pub fn new(date: impl Into<String>, payload: ChangePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: date.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }

    pub fn session(record: WorkoutRecord) -> Self {
        let date = record.date.clone();
        Self::new(date, ChangePayload::Session(record))
    }

    pub fn cardio(date: impl Into<String>, session: CardioSession) -> Self {
        Self::new(date, ChangePayload::Cardio(session))
    }
}
