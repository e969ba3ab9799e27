#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use ledger_grid::{month, GridView, SessionController, SyncStatus};
use lgrid_config::Config;
use lgrid_core::{MemoryDocumentStore, SheetBackend};
use lgrid_domain::{Cell, GridModel, Layout, SheetFormat};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Everything a [`RecordingView`] was asked to show.
#[derive(Debug, Default)]
pub struct ViewLog {
    pub renders: usize,
    pub updates: Vec<(usize, Vec<(usize, Cell)>)>,
    pub statuses: Vec<String>,
    pub totals: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    log: Arc<Mutex<ViewLog>>,
}

impl RecordingView {
    pub fn log(&self) -> MutexGuard<'_, ViewLog> {
        self.log.lock().expect("view log")
    }
}

impl GridView for RecordingView {
    fn render(&mut self, _layout: &Layout, _grid: &GridModel) {
        self.log().renders += 1;
    }

    fn update_cells(&mut self, row: usize, cells: &[(usize, Cell)]) {
        self.log().updates.push((row, cells.to_vec()));
    }

    fn set_status(&mut self, status: &SyncStatus) {
        self.log().statuses.push(status.to_string());
    }

    fn show_totals(&mut self, totals: &[f64]) {
        self.log().totals = totals.to_vec();
    }
}

pub fn memory_backend() -> (Arc<MemoryDocumentStore>, SheetBackend) {
    let store = Arc::new(MemoryDocumentStore::new());
    (store.clone(), SheetBackend::Documents(store))
}

pub fn open_session(
    config: &Config,
    backend: SheetBackend,
    format: SheetFormat,
    year: i32,
    month_number: u32,
) -> (SessionController, RecordingView) {
    let view = RecordingView::default();
    let controller = SessionController::open(
        config,
        backend,
        format,
        month(year, month_number).expect("valid month"),
        Box::new(view.clone()),
    )
    .expect("open session");
    (controller, view)
}
