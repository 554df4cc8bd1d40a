//! Cardio log rows: at most one row per date.

use super::columns::{a1_cell, CardioLayout, CardioRow};
use super::{parse_count, parse_decimal, CellWrite, RemoteRow};
use crate::date_key;
use crate::model::CardioSession;

/// Decode one row. A row whose cardio columns are all blank holds no session.
pub fn decode_row(cells: &[String]) -> Option<CardioSession> {
    let row = CardioRow::new(cells);
    if CardioLayout::FIELDS
        .iter()
        .all(|&col| row.cell(col).trim().is_empty())
    {
        return None;
    }

    Some(CardioSession {
        modality: row.modality().trim().to_string(),
        minutes: parse_count(row.minutes()),
        seconds: parse_count(row.seconds()),
        rpe: parse_decimal(row.rpe()),
        work_rest: row.work_rest().trim().to_string(),
        watts: parse_count(row.watts()),
        notes: row.notes().trim().to_string(),
    })
}

/// Row discovery for the cardio table: the first row logged under `key`.
pub fn find_row(grid: &[Vec<String>], key: &str) -> Option<usize> {
    grid.iter()
        .position(|cells| date_key::matches(CardioRow::new(cells).date(), key))
}

/// The session for `key`. Later rows for the same date are ignored.
pub fn decode_day(grid: &[Vec<String>], key: &str) -> Option<CardioSession> {
    find_row(grid, key).and_then(|index| decode_row(&grid[index]))
}

fn field_values(session: &CardioSession) -> [(usize, String); 7] {
    [
        (CardioLayout::MODALITY, session.modality.trim().to_string()),
        (CardioLayout::MINUTES, session.minutes.to_string()),
        (CardioLayout::SECONDS, session.seconds.to_string()),
        (CardioLayout::RPE, session.rpe.to_string()),
        (CardioLayout::WORK_REST, session.work_rest.clone()),
        (CardioLayout::WATTS, session.watts.to_string()),
        (CardioLayout::NOTES, session.notes.clone()),
    ]
}

/// Full-width row for the append path.
pub fn encode_append(date_text: &str, session: &CardioSession) -> Vec<String> {
    let mut row = RemoteRow::blank(CardioLayout::WIDTH);
    row.set(CardioLayout::DATE, date_text);
    for (col, value) in field_values(session) {
        row.set(col, value);
    }
    row.into_cells()
}

/// Positional writes for a located cardio row.
pub fn encode_update(sheet: &str, row_index: usize, session: &CardioSession) -> Vec<CellWrite> {
    field_values(session)
        .into_iter()
        .map(|(col, value)| CellWrite::new(a1_cell(sheet, col, row_index), value))
        .collect()
}
