//! Row codec between domain records and fixed-offset remote rows.
//!
//! Decoding never fails: the remote sheet is filled in by hand as often as by
//! this crate, so blank or malformed cells degrade to zero/empty values.

pub mod cardio_log;
pub mod columns;
pub mod session_log;

pub use columns::{column_letter, CardioLayout, CardioRow, SessionLayout, SessionRow};

use serde::{Deserialize, Serialize};

/// A raw grid as returned by the remote store: rows of string cells with
/// trailing empty cells possibly omitted.
pub type Grid = Vec<Vec<String>>;

/// An owned, fixed-width row being assembled for an append.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteRow {
    cells: Vec<String>,
}

impl RemoteRow {
    /// A row of `width` empty cells.
    pub fn blank(width: usize) -> Self {
        Self {
            cells: vec![String::new(); width],
        }
    }

    /// Set a cell, growing the row if `index` is past the end.
    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, String::new());
        }
        self.cells[index] = value.into();
    }

    pub fn get(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_cells(self) -> Vec<String> {
        self.cells
    }
}

/// One positional single-cell write against an already located row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWrite {
    /// A1 reference such as `Log!D5`.
    pub range: String,
    pub value: String,
}

impl CellWrite {
    pub fn new(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            value: value.into(),
        }
    }
}

/// Whether a cell holds a number at all.
pub(crate) fn is_numeric(cell: &str) -> bool {
    let trimmed = cell.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// Non-negative integer cell; anything else reads as 0. Decimals truncate.
pub(crate) fn parse_count(cell: &str) -> u32 {
    let trimmed = cell.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return n;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 => v.trunc() as u32,
        _ => 0,
    }
}

/// Non-negative decimal cell; anything else reads as 0.
pub(crate) fn parse_decimal(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

pub(crate) fn optional_text(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("8"));
        assert!(is_numeric(" 22.5 "));
        assert!(!is_numeric(""));
        assert!(!is_numeric("x"));
        assert!(!is_numeric("NaN"));
    }

    #[test]
    fn counts_degrade_to_zero() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count("8.0"), 8);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn decimals_degrade_to_zero() {
        assert_eq!(parse_decimal("102.5"), 102.5);
        assert_eq!(parse_decimal("heavy"), 0.0);
        assert_eq!(parse_decimal("-10"), 0.0);
    }

    #[test]
    fn remote_row_grows_on_set() {
        let mut row = RemoteRow::blank(2);
        row.set(4, "x");
        assert_eq!(row.len(), 5);
        assert_eq!(row.get(4), "x");
        assert_eq!(row.get(9), "");
    }
}
