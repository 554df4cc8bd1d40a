//! The one place that knows which column holds what.
//!
//! Both remote tables are fixed-offset: a field lives at a predetermined
//! zero-based column index, never looked up by header. Each layout below
//! expands to index constants plus a borrowed, bounds-checked row view with
//! one accessor per field.

/// Declare a fixed-offset layout and its typed row view.
macro_rules! row_layout {
    (
        $(#[$meta:meta])*
        $layout:ident / $view:ident, width = $width:expr,
        { $( $(#[$fmeta:meta])* $field:ident : $konst:ident = $col:expr ),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $layout;

        impl $layout {
            /// Minimum number of cells in a full row of this table.
            pub const WIDTH: usize = $width;
            $( $(#[$fmeta])* pub const $konst: usize = $col; )*
        }

        /// Read-only view over one raw row of this table.
        #[derive(Debug, Clone, Copy)]
        pub struct $view<'a> {
            cells: &'a [String],
        }

        impl<'a> $view<'a> {
            pub fn new(cells: &'a [String]) -> Self {
                Self { cells }
            }

            /// Cell at `index`, or `""` when the remote row was short.
            pub fn cell(&self, index: usize) -> &'a str {
                self.cells.get(index).map(String::as_str).unwrap_or("")
            }

            $(
                pub fn $field(&self) -> &'a str {
                    self.cell($layout::$konst)
                }
            )*
        }
    };
}

row_layout! {
    /// Strength "session log": one row per (date, exercise).
    ///
    /// Columns 12..=36 hold sheet-side formulas and are never written.
    SessionLayout / SessionRow, width = 38,
    {
        date: DATE = 0,
        exercise: EXERCISE = 1,
        set_count: SET_COUNT = 2,
        /// First column of the first (reps, weight, rir) triplet.
        set_base: SET_BASE = 3,
        notes: NOTES = 37,
    }
}

row_layout! {
    /// "Cardio log": at most one row per date.
    CardioLayout / CardioRow, width = 65,
    {
        date: DATE = 0,
        modality: MODALITY = 58,
        minutes: MINUTES = 59,
        seconds: SECONDS = 60,
        rpe: RPE = 61,
        work_rest: WORK_REST = 62,
        watts: WATTS = 63,
        notes: NOTES = 64,
    }
}

impl SessionLayout {
    /// Column indices of triplet `n` as (reps, weight, rir).
    pub const fn set_columns(n: usize) -> (usize, usize, usize) {
        let base = Self::SET_BASE + 3 * n;
        (base, base + 1, base + 2)
    }
}

impl CardioLayout {
    /// Columns the update path rewrites, in sheet order.
    pub const FIELDS: [usize; 7] = [
        Self::MODALITY,
        Self::MINUTES,
        Self::SECONDS,
        Self::RPE,
        Self::WORK_REST,
        Self::WATTS,
        Self::NOTES,
    ];
}

/// Spreadsheet-style column letters for a zero-based index.
///
/// 0 → `A`, 25 → `Z`, 26 → `AA`, 63 → `BL`.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1 reference for a single cell. `row_index` is zero-based within a grid
/// read from row 1.
pub fn a1_cell(sheet: &str, column: usize, row_index: usize) -> String {
    format!("{}!{}{}", quote_sheet(sheet), column_letter(column), row_index + 1)
}

/// A1 reference spanning whole columns, e.g. `Log!A:AL`.
pub fn a1_columns(sheet: &str, width: usize) -> String {
    format!(
        "{}!A:{}",
        quote_sheet(sheet),
        column_letter(width.saturating_sub(1))
    )
}

fn quote_sheet(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return sheet.to_string();
    }
    let mut quoted = String::with_capacity(sheet.len() + 2);
    quoted.push('\'');
    for c in sheet.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
