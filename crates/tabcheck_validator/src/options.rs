//! Per-run options.

use serde::{Deserialize, Serialize};
use tabcheck_core::{CoordinateStyle, DebugPolicy, HeaderMode, LayoutFlags};

/// Bound on the number of failing data rows collected before reading stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxErrors {
    Limit(usize),
    Unlimited,
}

impl MaxErrors {
    /// Negative values mean no limit.
    pub fn from_signed(value: i64) -> Self {
        usize::try_from(value).map_or(MaxErrors::Unlimited, MaxErrors::Limit)
    }

    /// Whether `failed_rows` is more than the limit allows.
    pub fn is_exceeded(self, failed_rows: usize) -> bool {
        match self {
            MaxErrors::Limit(limit) => failed_rows > limit,
            MaxErrors::Unlimited => false,
        }
    }
}

impl Default for MaxErrors {
    fn default() -> Self {
        MaxErrors::Limit(100)
    }
}

/// Options for one validation run.
///
/// The structural overrides (`header_mode`, `no_header`, ...) replace the
/// layout's own flags for this run only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub max_errors: MaxErrors,
    /// Physical rows to drop before the header (or first data row)
    pub skip_rows: usize,
    pub coordinate_style: CoordinateStyle,
    pub debug: DebugPolicy,
    pub header_mode: Option<HeaderMode>,
    pub skip_header: Option<bool>,
    pub no_header: Option<bool>,
    pub empty_row_ok: Option<bool>,
    pub empty_cols_ok: Option<bool>,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_errors(mut self, max_errors: MaxErrors) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_skip_rows(mut self, rows: usize) -> Self {
        self.skip_rows = rows;
        self
    }

    /// Render cell coordinates as spreadsheet references (`C2`).
    pub fn with_excel_cells(mut self, excel: bool) -> Self {
        self.coordinate_style = if excel {
            CoordinateStyle::Spreadsheet
        } else {
            CoordinateStyle::Numeric
        };
        self
    }

    pub fn with_debug(mut self, debug: DebugPolicy) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_header_mode(mut self, mode: HeaderMode) -> Self {
        self.header_mode = Some(mode);
        self
    }

    pub fn with_skip_header(mut self, skip: bool) -> Self {
        self.skip_header = Some(skip);
        self
    }

    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = Some(no_header);
        self
    }

    pub fn with_empty_row_ok(mut self, ok: bool) -> Self {
        self.empty_row_ok = Some(ok);
        self
    }

    pub fn with_empty_cols_ok(mut self, ok: bool) -> Self {
        self.empty_cols_ok = Some(ok);
        self
    }

    /// Layout flags with this run's overrides applied.
    pub fn effective_flags(&self, declared: LayoutFlags) -> LayoutFlags {
        LayoutFlags {
            header_mode: self.header_mode.unwrap_or(declared.header_mode),
            skip_header: self.skip_header.unwrap_or(declared.skip_header),
            no_header: self.no_header.unwrap_or(declared.no_header),
            empty_row_ok: self.empty_row_ok.unwrap_or(declared.empty_row_ok),
            empty_cols_ok: self.empty_cols_ok.unwrap_or(declared.empty_cols_ok),
        }
    }
}
