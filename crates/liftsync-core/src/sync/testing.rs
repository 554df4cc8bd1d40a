//! In-memory [`RemoteTable`] for tests, with failure and latency injection.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::codec::{CellWrite, Grid};
use crate::error::{Result, SyncError};
use crate::remote::RemoteTable;

#[derive(Default)]
struct FakeState {
    sheets: HashMap<String, Grid>,
    calls: Vec<&'static str>,
    offline: bool,
    unauthorized: bool,
    /// Successful writes left before every write fails; `None` is unlimited.
    write_budget: Option<usize>,
    read_delays: VecDeque<Duration>,
    write_delay: Option<Duration>,
}

#[derive(Default)]
pub(crate) struct FakeTable {
    state: Mutex<FakeState>,
}

impl FakeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, sheet: &str, grid: Grid) {
        self.lock().sheets.insert(sheet.to_string(), grid);
    }

    pub fn grid(&self, sheet: &str) -> Grid {
        self.lock().sheets.get(sheet).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Every call fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every call fails with an authentication error.
    pub fn set_unauthorized(&self, unauthorized: bool) {
        self.lock().unauthorized = unauthorized;
    }

    /// Let `n` more writes succeed, then fail the rest.
    pub fn fail_after_writes(&self, n: usize) {
        self.lock().write_budget = Some(n);
    }

    /// Delay the next read by `delay`; queued delays apply in order.
    pub fn delay_next_read(&self, delay: Duration) {
        self.lock().read_delays.push_back(delay);
    }

    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.lock().write_delay = delay;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn begin(&self, call: &'static str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.unauthorized {
            return Err(SyncError::Auth("token rejected".into()));
        }
        if state.offline {
            return Err(SyncError::Remote {
                status: None,
                message: "connection refused".into(),
            });
        }
        if call != "read" {
            if let Some(budget) = state.write_budget.as_mut() {
                if *budget == 0 {
                    return Err(SyncError::Remote {
                        status: Some(503),
                        message: "backend unavailable".into(),
                    });
                }
                *budget -= 1;
            }
        }
        Ok(())
    }

    async fn pause(&self, read: bool) {
        let delay = {
            let mut state = self.lock();
            if read {
                state.read_delays.pop_front()
            } else {
                state.write_delay
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn set_cell(&self, reference: &str, value: &str) {
        let (sheet, cell) = split_range(reference);
        let Some((column, row)) = parse_cell(cell) else {
            return;
        };
        let mut state = self.lock();
        let grid = state.sheets.entry(sheet).or_default();
        if grid.len() <= row {
            grid.resize(row + 1, Vec::new());
        }
        let cells = &mut grid[row];
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.to_string();
    }
}

/// `'Week 1'!A:AL` → (`Week 1`, `A:AL`).
fn split_range(range: &str) -> (String, &str) {
    let (sheet, rest) = range.rsplit_once('!').unwrap_or((range, ""));
    let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => sheet.to_string(),
    };
    (sheet, rest)
}

/// `D3` → (3, 2), zero-based.
fn parse_cell(cell: &str) -> Option<(usize, usize)> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let column = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    let row: usize = digits.parse().ok()?;
    Some((column - 1, row.checked_sub(1)?))
}

fn trim_row(row: &[String]) -> Vec<String> {
    let end = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
    row[..end].to_vec()
}

#[async_trait]
impl RemoteTable for FakeTable {
    async fn read(&self, range: &str) -> Result<Grid> {
        self.begin("read")?;
        self.pause(true).await;
        let (sheet, _) = split_range(range);
        Ok(self.grid(&sheet).iter().map(|row| trim_row(row)).collect())
    }

    async fn write_cell(&self, range: &str, value: &str) -> Result<()> {
        self.begin("write_cell")?;
        self.pause(false).await;
        self.set_cell(range, value);
        Ok(())
    }

    async fn batch_write(&self, writes: &[CellWrite]) -> Result<()> {
        self.begin("batch_write")?;
        self.pause(false).await;
        for write in writes {
            self.set_cell(&write.range, &write.value);
        }
        Ok(())
    }

    async fn append(&self, range_prefix: &str, rows: &[Vec<String>]) -> Result<()> {
        self.begin("append")?;
        self.pause(false).await;
        let (sheet, _) = split_range(range_prefix);
        self.lock()
            .sheets
            .entry(sheet)
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }
}

#[test]
fn parses_a1_references() {
    assert_eq!(parse_cell("A1"), Some((0, 0)));
    assert_eq!(parse_cell("AL12"), Some((37, 11)));
    assert_eq!(parse_cell("A0"), None);
    assert_eq!(split_range("'Bob''s Log'!D3"), ("Bob's Log".to_string(), "D3"));
}
