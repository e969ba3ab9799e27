use lgrid_domain::{Cell, GridModel, Layout};

use crate::sync::SyncStatus;

/// The grid widget a session drives. Implementations only display state; all
/// edits come back through [`crate::session::SessionController::on_cell_changed`].
pub trait GridView: Send {
    fn render(&mut self, layout: &Layout, grid: &GridModel);
    /// Derived cells rewritten after an edit to `row`.
    fn update_cells(&mut self, row: usize, cells: &[(usize, Cell)]);
    fn set_status(&mut self, status: &SyncStatus);
    fn show_totals(&mut self, _totals: &[f64]) {}
}

/// A view that discards everything; for headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl GridView for NullView {
    fn render(&mut self, _layout: &Layout, _grid: &GridModel) {}

    fn update_cells(&mut self, _row: usize, _cells: &[(usize, Cell)]) {}

    fn set_status(&mut self, _status: &SyncStatus) {}
}
