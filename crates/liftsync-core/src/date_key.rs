//! Canonical date keys.
//!
//! Every lookup in the cache, the pending queue and the remote tables goes
//! through a `"<month>/<day>"` key with no leading zeros, no year and no
//! weekday token. Keys are year-less, so `3/14/2024` and `3/14/2025` collide;
//! that is a known limitation of the remote sheet layout and is kept as is.

use chrono::{Datelike, NaiveDate};

use crate::error::{Result, SyncError};

/// Canonicalize free-form date text from a sheet cell or user input.
///
/// `"Thu 12/12/2024"`, `"12/12"` and `" 12/12 "` all become `"12/12"`.
/// Text without a `/` is returned trimmed and otherwise unchanged, so it can
/// only ever match itself. Empty input yields an empty key.
pub fn normalize(raw: &str) -> String {
    let token = match raw.split_whitespace().last() {
        Some(token) => token,
        None => return String::new(),
    };

    if !token.contains('/') {
        return token.to_string();
    }

    let mut parts = token.split('/');
    let month = strip_leading_zeros(parts.next().unwrap_or_default());
    let day = strip_leading_zeros(parts.next().unwrap_or_default());
    format!("{month}/{day}")
}

fn strip_leading_zeros(component: &str) -> &str {
    let stripped = component.trim_start_matches('0');
    if stripped.is_empty() && !component.is_empty() {
        "0"
    } else {
        stripped
    }
}

/// Key for a calendar date picked by the user.
pub fn key_of(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

/// Key for the ISO `YYYY-MM-DD` string the presentation layer hands over.
pub fn key_of_iso(iso: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .map_err(|e| SyncError::Invalid(format!("bad date '{iso}': {e}")))?;
    Ok(key_of(date))
}

/// Reject anything that is not already a canonical key.
///
/// A key with padding, a year or a weekday would never match a normalized
/// row, so writes under it would append a fresh row every time.
pub fn ensure_canonical(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SyncError::Invalid("record has no date key".into()));
    }
    if !key.contains('/') || normalize(key) != key {
        return Err(SyncError::Invalid(format!(
            "'{key}' is not a canonical date key (expected e.g. '{}')",
            normalize(key)
        )));
    }
    Ok(())
}

/// Whether a stored row's date text belongs to `key`.
///
/// An empty key matches nothing.
pub fn matches(row_date_text: &str, key: &str) -> bool {
    !key.is_empty() && normalize(row_date_text) == key
}
