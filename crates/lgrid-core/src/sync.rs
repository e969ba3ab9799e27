//! Sparse persistence of a dense grid.
//!
//! Each non-empty row is its own document under the sheet, next to one
//! metadata document. Loading treats the row documents as a patch set applied
//! to a blank grid. The local backend stores the whole sheet as one blob.

use std::{collections::BTreeMap, fmt, sync::Arc};

use chrono::Utc;
use lgrid_domain::{
    Cell, GridModel, Layout, LocalSheetBlob, RowDocument, SharedLayoutConfig, SheetId, SheetMeta,
};
use tracing::{debug, info, warn};

use crate::{
    store::{
        accounts_collection, column_config_path, row_path, sheet_path, write_document, BlobStore,
        Document, DocumentStore,
    },
    CoreError,
};

/// Where a sheet is persisted.
#[derive(Clone)]
pub enum SheetBackend {
    /// Row-isolated document store.
    Documents(Arc<dyn DocumentStore>),
    /// One blob per sheet, keyed by the sheet id.
    Local(Arc<dyn BlobStore>),
}

impl SheetBackend {
    pub fn label(&self) -> &'static str {
        match self {
            SheetBackend::Documents(_) => "documents",
            SheetBackend::Local(_) => "local",
        }
    }
}

impl fmt::Debug for SheetBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SheetBackend").field(&self.label()).finish()
    }
}

/// Result of [`PersistenceSync::load`].
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub grid: GridModel,
    pub meta: Option<SheetMeta>,
    pub rows_loaded: usize,
    /// Documents that were skipped or repaired.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub rows_written: usize,
    pub rows_cleared: usize,
    pub layout_published: bool,
    pub backend: &'static str,
}

#[derive(Debug, Clone)]
pub struct FlushOutcome {
    pub report: FlushReport,
    cleared: Vec<usize>,
    seq: u64,
}

/// Loads and flushes one sheet for one identity.
#[derive(Debug)]
pub struct PersistenceSync {
    backend: SheetBackend,
    identity: String,
    sheet: SheetId,
    is_primary: bool,
    // Rows that have a live document, with the flush sequence that last wrote them.
    known_rows: BTreeMap<usize, u64>,
    seq: u64,
}

impl PersistenceSync {
    pub fn new(
        backend: SheetBackend,
        identity: impl Into<String>,
        sheet: SheetId,
        is_primary: bool,
    ) -> Self {
        Self {
            backend,
            identity: identity.into(),
            sheet,
            is_primary,
            known_rows: BTreeMap::new(),
            seq: 0,
        }
    }

    pub fn sheet(&self) -> SheetId {
        self.sheet
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn backend(&self) -> &SheetBackend {
        &self.backend
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Reads the shared fixed-column labels for this sheet's format.
    ///
    /// Always `None` on the local backend. A malformed config is logged and ignored.
    pub fn load_shared_layout(&self) -> Result<Option<SharedLayoutConfig>, CoreError> {
        let SheetBackend::Documents(store) = &self.backend else {
            return Ok(None);
        };
        let path = column_config_path(self.sheet.format);
        let Some(document) = store.get_document(&path)? else {
            return Ok(None);
        };
        match serde_json::from_value(document) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                warn!(%path, error = %err, "ignoring malformed shared column config");
                Ok(None)
            }
        }
    }

    /// Rebuilds a dense `rows x cols` grid from the persisted sheet.
    ///
    /// Unpersisted rows stay blank; short or long rows are padded or truncated.
    /// Malformed or out-of-range documents are skipped with a warning.
    pub fn load(&mut self, rows: usize, cols: usize) -> Result<LoadReport, CoreError> {
        self.known_rows.clear();
        let report = match self.backend.clone() {
            SheetBackend::Documents(store) => self.load_documents(store.as_ref(), rows, cols)?,
            SheetBackend::Local(store) => self.load_blob(store.as_ref(), rows, cols)?,
        };
        for warning in &report.warnings {
            warn!(sheet = %self.sheet, "{}", warning);
        }
        info!(
            sheet = %self.sheet,
            backend = self.backend.label(),
            rows = report.rows_loaded,
            "sheet loaded"
        );
        Ok(report)
    }

    fn load_documents(
        &mut self,
        store: &dyn DocumentStore,
        rows: usize,
        cols: usize,
    ) -> Result<LoadReport, CoreError> {
        let mut warnings = Vec::new();
        let meta = match store.get_document(&sheet_path(&self.identity, &self.sheet)) {
            Ok(Some(document)) => decode::<SheetMeta>(document, "sheet metadata", &mut warnings),
            Ok(None) => None,
            Err(CoreError::Serde(err)) => {
                warnings.push(format!("discarding unreadable sheet metadata: {}", err));
                None
            }
            Err(err) => return Err(err),
        };

        let mut grid = GridModel::new(rows, cols);
        let mut rows_loaded = 0;
        let collection = accounts_collection(&self.identity, &self.sheet);
        for document in store.list_documents(&collection)? {
            let Some(row) = decode::<RowDocument>(document, "row document", &mut warnings) else {
                continue;
            };
            if row.row_index >= rows {
                warnings.push(format!(
                    "row document {} is outside the {}-row grid",
                    row.row_index, rows
                ));
                continue;
            }
            if row.is_tombstone() {
                continue;
            }
            if row.data.len() != cols {
                debug!(
                    row = row.row_index,
                    width = row.data.len(),
                    cols,
                    "resizing persisted row"
                );
            }
            self.known_rows.insert(row.row_index, 0);
            grid.replace_row(row.row_index, row.data)?;
            rows_loaded += 1;
        }

        Ok(LoadReport {
            grid,
            meta,
            rows_loaded,
            warnings,
        })
    }

    fn load_blob(
        &self,
        store: &dyn BlobStore,
        rows: usize,
        cols: usize,
    ) -> Result<LoadReport, CoreError> {
        let mut warnings = Vec::new();
        let blob = match store.get_blob(&self.sheet.to_string())? {
            Some(raw) => match serde_json::from_str::<LocalSheetBlob>(&raw) {
                Ok(blob) => Some(blob),
                Err(err) => {
                    warnings.push(format!("discarding malformed local sheet: {}", err));
                    None
                }
            },
            None => None,
        };
        let Some(blob) = blob else {
            return Ok(LoadReport {
                grid: GridModel::new(rows, cols),
                meta: None,
                rows_loaded: 0,
                warnings,
            });
        };
        if blob.rows.len() > rows {
            warnings.push(format!(
                "local sheet has {} rows, keeping the first {}",
                blob.rows.len(),
                rows
            ));
        }
        let grid = GridModel::from_rows(rows, cols, blob.rows);
        let rows_loaded = grid
            .iter_rows()
            .filter(|row| !row.iter().all(Cell::is_blank))
            .count();
        Ok(LoadReport {
            grid,
            meta: Some(blob.meta),
            rows_loaded,
            warnings,
        })
    }

    /// Snapshots the grid into a job that can run away from the session.
    pub fn prepare_flush(&mut self, grid: &GridModel, layout: &Layout) -> FlushJob {
        self.seq += 1;
        let seq = self.seq;
        let snapshot = grid.snapshot_all_rows();
        let mut dirty = Vec::new();
        let mut cleared = Vec::new();
        for (index, row) in snapshot.iter().enumerate() {
            if row.iter().all(Cell::is_blank) {
                if self.known_rows.contains_key(&index) {
                    cleared.push(index);
                }
            } else {
                self.known_rows.insert(index, seq);
                dirty.push(index);
            }
        }
        let shared_layout = self.is_primary.then(|| SharedLayoutConfig {
            fixed_cols: layout.fixed_labels(),
            format: self.sheet.format,
            updated_at: Utc::now(),
            updated_by: self.identity.clone(),
        });
        FlushJob {
            backend: self.backend.clone(),
            identity: self.identity.clone(),
            sheet: self.sheet,
            rows: grid.rows(),
            cols: grid.cols(),
            snapshot,
            dirty,
            cleared,
            shared_layout,
            seq,
        }
    }

    /// Records a successful flush so cleared rows are not tombstoned again.
    pub fn complete_flush(&mut self, outcome: &FlushOutcome) {
        for row in &outcome.cleared {
            if self
                .known_rows
                .get(row)
                .is_some_and(|written| *written < outcome.seq)
            {
                self.known_rows.remove(row);
            }
        }
    }

    /// Prepares and runs a flush on the calling thread.
    pub fn flush(&mut self, grid: &GridModel, layout: &Layout) -> Result<FlushReport, CoreError> {
        let outcome = self.prepare_flush(grid, layout).run()?;
        self.complete_flush(&outcome);
        Ok(outcome.report)
    }
}

/// A point-in-time copy of the grid and everything needed to persist it.
#[derive(Debug)]
pub struct FlushJob {
    backend: SheetBackend,
    identity: String,
    sheet: SheetId,
    rows: usize,
    cols: usize,
    snapshot: Vec<Vec<Cell>>,
    dirty: Vec<usize>,
    cleared: Vec<usize>,
    shared_layout: Option<SharedLayoutConfig>,
    seq: u64,
}

impl FlushJob {
    pub fn sheet(&self) -> SheetId {
        self.sheet
    }

    /// Rows that carry at least one value in this snapshot.
    pub fn dirty_rows(&self) -> &[usize] {
        &self.dirty
    }

    pub fn cleared_rows(&self) -> &[usize] {
        &self.cleared
    }

    /// Writes the snapshot. Row documents go first and the metadata last, so an
    /// interrupted flush never advertises rows it did not write.
    pub fn run(self) -> Result<FlushOutcome, CoreError> {
        let now = Utc::now();
        let meta = SheetMeta::new(self.sheet, self.rows, self.cols, now);
        let report = match &self.backend {
            SheetBackend::Documents(store) => {
                let store = store.as_ref();
                for &index in &self.dirty {
                    let document = RowDocument {
                        row_index: index,
                        data: self.snapshot[index].clone(),
                        updated_at: now,
                    };
                    let path = row_path(&self.identity, &self.sheet, index);
                    write_document(store, &path, &document, false)?;
                }
                for &index in &self.cleared {
                    let tombstone = RowDocument {
                        row_index: index,
                        data: Vec::new(),
                        updated_at: now,
                    };
                    let path = row_path(&self.identity, &self.sheet, index);
                    write_document(store, &path, &tombstone, false)?;
                }
                write_document(store, &sheet_path(&self.identity, &self.sheet), &meta, true)?;
                if let Some(config) = &self.shared_layout {
                    write_document(store, &column_config_path(self.sheet.format), config, false)?;
                }
                FlushReport {
                    rows_written: self.dirty.len(),
                    rows_cleared: self.cleared.len(),
                    layout_published: self.shared_layout.is_some(),
                    backend: self.backend.label(),
                }
            }
            SheetBackend::Local(store) => {
                let blob = LocalSheetBlob {
                    meta,
                    rows: self.snapshot.clone(),
                };
                store.set_blob(&self.sheet.to_string(), &serde_json::to_string(&blob)?)?;
                FlushReport {
                    rows_written: self.dirty.len(),
                    rows_cleared: 0,
                    layout_published: false,
                    backend: self.backend.label(),
                }
            }
        };
        info!(
            sheet = %self.sheet,
            backend = report.backend,
            rows = report.rows_written,
            cleared = report.rows_cleared,
            "sheet flushed"
        );
        Ok(FlushOutcome {
            report,
            cleared: self.cleared,
            seq: self.seq,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    document: Document,
    what: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    match serde_json::from_value(document) {
        Ok(value) => Some(value),
        Err(err) => {
            warnings.push(format!("skipping malformed {}: {}", what, err));
            None
        }
    }
}
