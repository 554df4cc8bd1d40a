//! Guards against slow reads for a date the user has already moved away from.

use std::sync::Mutex;

use crate::date_key;
use crate::error::Result;

/// Snapshot of the selection taken when a read starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTicket {
    generation: u64,
    pub key: String,
}

/// The date currently selected in the presentation layer.
///
/// Every change bumps a generation counter; a read's result is only applied
/// if the ticket it started with is still current.
#[derive(Debug, Default)]
pub struct DateSelection {
    current: Mutex<SelectionTicket>,
}

impl DateSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the ISO `YYYY-MM-DD` date handed over by the date picker.
    pub fn select_iso(&self, iso: &str) -> Result<SelectionTicket> {
        Ok(self.select_key(date_key::key_of_iso(iso)?))
    }

    /// Select by canonical key.
    pub fn select_key(&self, key: impl Into<String>) -> SelectionTicket {
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        current.generation += 1;
        current.key = key.into();
        current.clone()
    }

    pub fn ticket(&self) -> SelectionTicket {
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Whether nothing was selected since `ticket` was taken.
    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .generation
            == ticket.generation
    }
}
