//! Session log rows: one row per (date, exercise).

use std::collections::HashSet;

use tracing::debug;

use super::columns::{a1_cell, SessionLayout, SessionRow};
use super::{is_numeric, optional_text, parse_count, parse_decimal, CellWrite, RemoteRow};
use crate::date_key;
use crate::model::{ExerciseEntry, SetEntry, WorkoutRecord, MAX_SETS};

/// Decode one row. An empty exercise-name cell means the row holds no entry.
pub fn decode_row(cells: &[String]) -> Option<ExerciseEntry> {
    let row = SessionRow::new(cells);
    let name = row.exercise().trim();
    if name.is_empty() {
        return None;
    }

    let sets = (0..MAX_SETS)
        .filter_map(|n| {
            let (reps, weight, rir) = SessionLayout::set_columns(n);
            let reps_cell = row.cell(reps);
            if !is_numeric(reps_cell) {
                return None;
            }
            Some(SetEntry {
                reps: parse_count(reps_cell),
                weight: parse_decimal(row.cell(weight)),
                rir: parse_count(row.cell(rir)),
            })
        })
        .collect();

    Some(ExerciseEntry {
        name: name.to_string(),
        sets,
        notes: optional_text(row.notes()),
    })
}

/// Collect every entry logged under `key`, in sheet order.
pub fn decode_day(grid: &[Vec<String>], key: &str) -> WorkoutRecord {
    let exercises = grid
        .iter()
        .filter(|cells| date_key::matches(SessionRow::new(cells).date(), key))
        .filter_map(|cells| decode_row(cells))
        .collect();
    WorkoutRecord::new(key, exercises)
}

/// Full-width row for the append path.
pub fn encode_append(date_text: &str, exercise: &ExerciseEntry) -> Vec<String> {
    let mut row = RemoteRow::blank(SessionLayout::WIDTH);
    row.set(SessionLayout::DATE, date_text);
    row.set(SessionLayout::EXERCISE, exercise.name.trim());
    row.set(SessionLayout::SET_COUNT, exercise.sets.len().min(MAX_SETS).to_string());
    for (n, set) in exercise.sets.iter().take(MAX_SETS).enumerate() {
        let (reps, weight, rir) = SessionLayout::set_columns(n);
        row.set(reps, set.reps.to_string());
        row.set(weight, set.weight.to_string());
        row.set(rir, set.rir.to_string());
    }
    row.set(SessionLayout::NOTES, exercise.notes.as_deref().unwrap_or(""));
    row.into_cells()
}

/// Positional cell writes for an exercise whose row is already located.
///
/// Touches the set count, all three triplets (unused slots are cleared) and
/// the notes column. Date, name and sheet-side columns are left alone.
pub fn encode_update(sheet: &str, row_index: usize, exercise: &ExerciseEntry) -> Vec<CellWrite> {
    let mut writes = Vec::with_capacity(2 + 3 * MAX_SETS);
    writes.push(CellWrite::new(
        a1_cell(sheet, SessionLayout::SET_COUNT, row_index),
        exercise.sets.len().min(MAX_SETS).to_string(),
    ));
    for n in 0..MAX_SETS {
        let (reps, weight, rir) = SessionLayout::set_columns(n);
        let (reps_val, weight_val, rir_val) = match exercise.sets.get(n) {
            Some(set) => (
                set.reps.to_string(),
                set.weight.to_string(),
                set.rir.to_string(),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        writes.push(CellWrite::new(a1_cell(sheet, reps, row_index), reps_val));
        writes.push(CellWrite::new(a1_cell(sheet, weight, row_index), weight_val));
        writes.push(CellWrite::new(a1_cell(sheet, rir, row_index), rir_val));
    }
    writes.push(CellWrite::new(
        a1_cell(sheet, SessionLayout::NOTES, row_index),
        exercise.notes.as_deref().unwrap_or(""),
    ));
    writes
}

/// Row discovery: first row for (`key`, case-insensitive `name`).
pub fn find_row(grid: &[Vec<String>], key: &str, name: &str) -> Option<usize> {
    find_row_excluding(grid, key, name, &HashSet::new())
}

fn find_row_excluding(
    grid: &[Vec<String>],
    key: &str,
    name: &str,
    claimed: &HashSet<usize>,
) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    grid.iter().enumerate().find_map(|(index, cells)| {
        if claimed.contains(&index) {
            return None;
        }
        let row = SessionRow::new(cells);
        let hit = date_key::matches(row.date(), key)
            && row.exercise().trim().to_lowercase() == wanted;
        hit.then_some(index)
    })
}

/// How a record maps onto the current table contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionWritePlan {
    /// Cell writes for exercises that already have a row.
    pub updates: Vec<CellWrite>,
    /// Full rows for exercises with no row yet.
    pub appends: Vec<Vec<String>>,
}

impl SessionWritePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.appends.is_empty()
    }
}

/// Split a record into in-place updates and appends.
///
/// Two entries with the same name claim two distinct rows. Exercises present
/// remotely but missing from `record` are left untouched.
pub fn plan_write(sheet: &str, grid: &[Vec<String>], record: &WorkoutRecord) -> SessionWritePlan {
    let mut plan = SessionWritePlan::default();
    let mut claimed = HashSet::new();

    for exercise in &record.exercises {
        match find_row_excluding(grid, &record.date, &exercise.name, &claimed) {
            Some(index) => {
                claimed.insert(index);
                plan.updates.extend(encode_update(sheet, index, exercise));
            }
            None => {
                debug!(date = %record.date, exercise = %exercise.name, "no existing row, appending");
                plan.appends.push(encode_append(&record.date, exercise));
            }
        }
    }
    plan
}
