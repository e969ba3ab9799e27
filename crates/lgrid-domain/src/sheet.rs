//! Persisted representation of a sheet: metadata, per-row documents, and the
//! shared column configuration.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{cell::Cell, layout::SheetFormat, layout::YearMonth};

/// Identifies one month of one account type, e.g. `weekline-2025-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetId {
    pub format: SheetFormat,
    pub period: YearMonth,
}

impl SheetId {
    pub fn new(format: SheetFormat, period: YearMonth) -> Self {
        Self { format, period }
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.format.account_type(),
            self.period.year(),
            self.period.month()
        )
    }
}

/// Sheet-level metadata document. `month` is 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    pub year: i32,
    pub month: u32,
    pub rows: usize,
    pub cols: usize,
    #[serde(default)]
    pub format: SheetFormat,
    pub updated_at: DateTime<Utc>,
}

impl SheetMeta {
    pub fn new(sheet: SheetId, rows: usize, cols: usize, updated_at: DateTime<Utc>) -> Self {
        Self {
            year: sheet.period.year(),
            month: sheet.period.month0(),
            rows,
            cols,
            format: sheet.format,
            updated_at,
        }
    }
}

/// One account row as stored in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDocument {
    pub row_index: usize,
    #[serde(default)]
    pub data: Vec<Cell>,
    pub updated_at: DateTime<Utc>,
}

impl RowDocument {
    /// A document whose data carries no value; written over rows that were cleared.
    pub fn is_tombstone(&self) -> bool {
        self.data.iter().all(Cell::is_blank)
    }
}

/// Fixed-column labels published by the primary identity of a format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedLayoutConfig {
    pub fixed_cols: Vec<String>,
    pub format: SheetFormat,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Whole-sheet blob written by the local fallback backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSheetBlob {
    pub meta: SheetMeta,
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}
