use std::time::Duration;

use lgrid_config::Config;
use lgrid_core::{
    balance_status, build_layout, column_totals, normalize_input, BalanceStatus, CoreError,
    DerivedColumnEngine, DerivedUpdate, EditGate, FlushJob, FlushOutcome, FlushReport,
    NumberLocale, PersistenceSync, SheetBackend, Suggestion, SuggestionAdvisor, SuggestionChoice,
};
use lgrid_domain::{Cell, GridModel, Layout, SheetFormat, SheetId, YearMonth, GRID_ROWS};
use tokio::time::Instant;
use tracing::{info, info_span, warn, Span};
use uuid::Uuid;

use crate::{
    errors::LedgerGridError,
    session::view::GridView,
    sync::{SyncScheduler, SyncState, SyncStatus},
};

/// Why an edit notification did not change the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Subtotal and balance cells are written by the engine only.
    ReadOnly,
    OutOfRange,
    /// Suggestions exist for period columns only.
    NotPeriod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied(DerivedUpdate),
    /// The cell already held this value.
    Unchanged,
    Ignored(IgnoreReason),
    /// Arrived while derived cells were being written.
    Suppressed,
}

/// One open sheet: grid, layout, derived columns and persistence.
///
/// All mutation goes through [`SessionController::on_cell_changed`]. Flushes
/// are either run inline with [`SessionController::save_now`] or split into
/// [`SessionController::poll_flush`] and [`SessionController::complete_flush`]
/// so the store I/O can run elsewhere.
pub struct SessionController {
    id: Uuid,
    span: Span,
    layout: Layout,
    grid: GridModel,
    locale: NumberLocale,
    engine: DerivedColumnEngine,
    advisor: SuggestionAdvisor,
    gate: EditGate,
    sync: PersistenceSync,
    scheduler: SyncScheduler,
    status: SyncStatus,
    totals: Vec<f64>,
    view: Box<dyn GridView>,
    closed: bool,
}

impl SessionController {
    /// Builds the layout, loads the persisted sheet and renders it.
    ///
    /// A failing store aborts the open; an unreadable shared column config only
    /// falls back to the default labels.
    pub fn open(
        config: &Config,
        backend: SheetBackend,
        format: SheetFormat,
        period: YearMonth,
        mut view: Box<dyn GridView>,
    ) -> Result<Self, LedgerGridError> {
        let id = Uuid::new_v4();
        let sheet = SheetId::new(format, period);
        let span = info_span!("session", id = %id, sheet = %sheet);
        let entered = span.enter();

        let is_primary = config.is_primary(format.as_str(), &config.identity);
        let mut sync = PersistenceSync::new(backend, config.identity.clone(), sheet, is_primary);
        let shared = sync.load_shared_layout().unwrap_or_else(|err| {
            warn!(error = %err, "shared column config unavailable, using defaults");
            None
        });
        let layout = build_layout(format, period, shared.as_ref())?;
        let report = sync.load(GRID_ROWS, layout.len())?;
        let mut grid = report.grid;

        let locale = NumberLocale {
            grouping_separator: config.locale.grouping_separator,
            decimal_separator: config.locale.decimal_separator,
        };
        let engine = DerivedColumnEngine::new(locale);
        let gate = EditGate::new();
        if let Some(token) = gate.try_enter() {
            engine.recompute_all(&mut grid, &layout, &token)?;
        }
        let totals = column_totals(&grid, &layout, &locale);

        let status = SyncStatus::Ready;
        view.render(&layout, &grid);
        view.show_totals(&totals);
        view.set_status(&status);
        info!(
            identity = %config.identity,
            primary = is_primary,
            rows = report.rows_loaded,
            "session opened"
        );
        drop(entered);

        Ok(Self {
            id,
            span,
            layout,
            grid,
            locale,
            engine,
            advisor: SuggestionAdvisor::new(locale),
            gate,
            sync,
            scheduler: SyncScheduler::new(
                Duration::from_millis(config.debounce_ms),
                Duration::from_millis(config.retry_max_delay_ms),
            ),
            status,
            totals,
            view,
            closed: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sheet(&self) -> SheetId {
        self.sync.sheet()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn sync_state(&self) -> SyncState {
        self.scheduler.state()
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn next_flush_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Per-column sums over all rows, refreshed after every edit.
    pub fn column_totals(&self) -> &[f64] {
        &self.totals
    }

    pub fn balance_status(&self, row: usize) -> Option<BalanceStatus> {
        let cell = self.grid.get(row, self.layout.balance_column()).ok()?;
        balance_status(cell, &self.locale)
    }

    /// Applies raw widget input to one cell and recomputes the row.
    pub fn on_cell_changed(
        &mut self,
        row: usize,
        col: usize,
        raw: &str,
    ) -> Result<EditOutcome, LedgerGridError> {
        self.ensure_open()?;
        let numeric = match self.layout.column(col) {
            Some(spec) => spec.is_numeric(),
            None => return Ok(EditOutcome::Ignored(IgnoreReason::OutOfRange)),
        };
        let value = normalize_input(raw, numeric, &self.locale);
        self.apply_cell(row, col, value)
    }

    /// Proposals for a period cell entering edit mode; `None` for other columns.
    pub fn suggest(&self, row: usize, col: usize) -> Result<Option<Suggestion>, LedgerGridError> {
        if row >= self.grid.rows() {
            return Ok(None);
        }
        Ok(self.advisor.suggest(&self.grid, &self.layout, row, col)?)
    }

    /// Writes the chosen suggestion through the normal edit path.
    pub fn apply_suggestion(
        &mut self,
        row: usize,
        col: usize,
        choice: SuggestionChoice,
    ) -> Result<EditOutcome, LedgerGridError> {
        self.ensure_open()?;
        let Some(suggestion) = self.suggest(row, col)? else {
            return Ok(EditOutcome::Ignored(IgnoreReason::NotPeriod));
        };
        let value = suggestion.value(choice).clone();
        self.apply_cell(row, col, value)
    }

    /// Starts a debounced flush whose deadline has passed.
    pub fn poll_flush(&mut self, now: Instant) -> Option<FlushJob> {
        if self.closed || !self.scheduler.poll(now) {
            return None;
        }
        Some(self.start_flush())
    }

    /// Starts a flush right away. While another is in flight, one is queued
    /// for when it completes and `None` is returned.
    pub fn begin_save(&mut self, now: Instant) -> Option<FlushJob> {
        if self.scheduler.begin_manual() {
            Some(self.start_flush())
        } else {
            self.scheduler.request_now(now);
            None
        }
    }

    /// Records the result of a job from [`Self::poll_flush`] or [`Self::begin_save`].
    pub fn complete_flush(
        &mut self,
        result: Result<FlushOutcome, CoreError>,
        now: Instant,
    ) -> Result<FlushReport, LedgerGridError> {
        match result {
            Ok(outcome) => {
                self.sync.complete_flush(&outcome);
                self.scheduler.finish(true, now);
                self.set_status(SyncStatus::Saved(outcome.report.backend));
                Ok(outcome.report)
            }
            Err(err) => {
                self.scheduler.finish(false, now);
                warn!(
                    parent: &self.span,
                    error = %err,
                    failures = self.scheduler.failures(),
                    retry_in_ms = self.scheduler.backoff().as_millis() as u64,
                    "flush failed"
                );
                self.set_status(SyncStatus::Error(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Flushes synchronously, bypassing the debounce.
    pub fn save_now(&mut self) -> Result<FlushReport, LedgerGridError> {
        self.ensure_open()?;
        let now = Instant::now();
        let job = self
            .begin_save(now)
            .ok_or(LedgerGridError::FlushInProgress)?;
        self.complete_flush(job.run(), Instant::now())
    }

    /// Flushes pending edits and closes the session. Later edits are rejected.
    pub fn close(&mut self) -> Result<Option<FlushReport>, LedgerGridError> {
        if self.closed {
            return Ok(None);
        }
        let report = if self.scheduler.is_dirty() {
            Some(self.save_now()?)
        } else {
            None
        };
        self.closed = true;
        info!(parent: &self.span, "session closed");
        Ok(report)
    }

    /// Writes an already normalized value and recomputes the row.
    fn apply_cell(
        &mut self,
        row: usize,
        col: usize,
        value: Cell,
    ) -> Result<EditOutcome, LedgerGridError> {
        self.ensure_open()?;
        let _entered = self.span.enter();
        if self.gate.is_updating() {
            return Ok(EditOutcome::Suppressed);
        }
        let Some(spec) = self.layout.column(col) else {
            return Ok(EditOutcome::Ignored(IgnoreReason::OutOfRange));
        };
        if spec.is_derived() {
            return Ok(EditOutcome::Ignored(IgnoreReason::ReadOnly));
        }
        if row >= self.grid.rows() {
            return Ok(EditOutcome::Ignored(IgnoreReason::OutOfRange));
        }

        let previous = self.grid.set(row, col, value.clone()).map_err(CoreError::from)?;
        if previous == value {
            return Ok(EditOutcome::Unchanged);
        }

        let update = {
            let Some(token) = self.gate.try_enter() else {
                return Ok(EditOutcome::Suppressed);
            };
            let update = self
                .engine
                .recompute_row(&mut self.grid, &self.layout, row, &token)?;
            self.view.update_cells(row, &update.cells);
            update
        };
        self.totals = column_totals(&self.grid, &self.layout, &self.locale);
        self.view.show_totals(&self.totals);
        self.scheduler.notify_dirty(Instant::now());
        Ok(EditOutcome::Applied(update))
    }

    fn start_flush(&mut self) -> FlushJob {
        self.set_status(SyncStatus::Saving);
        self.sync.prepare_flush(&self.grid, &self.layout)
    }

    fn set_status(&mut self, status: SyncStatus) {
        self.view.set_status(&status);
        self.status = status;
    }

    fn ensure_open(&self) -> Result<(), LedgerGridError> {
        if self.closed {
            return Err(LedgerGridError::SessionClosed);
        }
        Ok(())
    }
}
