//! Recomputation of subtotal and balance columns.
//!
//! Derived writes go straight to the [`GridModel`]; they never pass through the
//! edit path. Callers must hold a [`GateToken`] while recomputing, and any edit
//! notification that arrives while the gate is held is dropped.

use std::cell::Cell as Flag;

use lgrid_domain::{Cell, ColumnKind, GridModel, Layout};
use tracing::debug;

use crate::{
    number::{cell_amount, NumberLocale},
    CoreError,
};

/// Whether derived cells are currently being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Updating,
}

/// Single-session re-entrancy guard for the recompute path.
#[derive(Debug)]
pub struct EditGate {
    state: Flag<GateState>,
}

impl EditGate {
    pub fn new() -> Self {
        Self {
            state: Flag::new(GateState::Idle),
        }
    }

    pub fn state(&self) -> GateState {
        self.state.get()
    }

    pub fn is_updating(&self) -> bool {
        self.state.get() == GateState::Updating
    }

    /// Enters the updating state, or returns `None` when it is already held.
    ///
    /// The returned token restores [`GateState::Idle`] when dropped, including
    /// during unwinding.
    pub fn try_enter(&self) -> Option<GateToken<'_>> {
        if self.is_updating() {
            return None;
        }
        self.state.set(GateState::Updating);
        Some(GateToken { gate: self })
    }
}

impl Default for EditGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that the holder owns the [`EditGate`].
#[derive(Debug)]
pub struct GateToken<'a> {
    gate: &'a EditGate,
}

impl Drop for GateToken<'_> {
    fn drop(&mut self) {
        self.gate.state.set(GateState::Idle);
    }
}

/// Derived cells rewritten for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedUpdate {
    pub row: usize,
    pub cells: Vec<(usize, Cell)>,
    pub balance: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DerivedColumnEngine {
    locale: NumberLocale,
}

impl DerivedColumnEngine {
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> &NumberLocale {
        &self.locale
    }

    /// Rewrites every subtotal cell and the balance cell of `row`.
    ///
    /// Rows without any input keep their derived cells blank, so an untouched
    /// row stays empty and is never persisted.
    pub fn recompute_row(
        &self,
        grid: &mut GridModel,
        layout: &Layout,
        row: usize,
        _token: &GateToken<'_>,
    ) -> Result<DerivedUpdate, CoreError> {
        let width = layout.len().min(grid.cols());
        let values = grid.row(row)?;
        let has_input = values
            .iter()
            .take(width)
            .enumerate()
            .any(|(col, cell)| !is_derived(layout, col) && !cell.is_blank());

        let mut writes = Vec::with_capacity(layout.subtotal_columns().len() + 1);
        for &column in layout.subtotal_columns() {
            let Some((start, end)) = layout.column(column).and_then(|spec| spec.subtotal_range)
            else {
                continue;
            };
            if end >= width {
                continue;
            }
            let value = if has_input {
                let sum: f64 = values[start..=end]
                    .iter()
                    .map(|cell| cell_amount(cell, &self.locale))
                    .sum();
                Cell::Number(sum)
            } else {
                Cell::Empty
            };
            writes.push((column, value));
        }

        let balance = if has_input {
            let amount1 = values
                .get(layout.amount1_column())
                .map(|cell| cell_amount(cell, &self.locale))
                .unwrap_or(0.0);
            let collected: f64 = layout
                .period_columns()
                .filter(|col| *col < width)
                .map(|col| cell_amount(&values[col], &self.locale))
                .sum();
            debug!(row, amount1, collected, "recomputed balance");
            Some(amount1 - collected)
        } else {
            None
        };
        writes.push((
            layout.balance_column(),
            balance.map(Cell::Number).unwrap_or_default(),
        ));

        for (column, value) in &writes {
            grid.set(row, *column, value.clone())?;
        }
        Ok(DerivedUpdate {
            row,
            cells: writes,
            balance,
        })
    }

    /// Recomputes every row; used after a load.
    pub fn recompute_all(
        &self,
        grid: &mut GridModel,
        layout: &Layout,
        token: &GateToken<'_>,
    ) -> Result<usize, CoreError> {
        let mut rows_with_balance = 0;
        for row in 0..grid.rows() {
            if self.recompute_row(grid, layout, row, token)?.balance.is_some() {
                rows_with_balance += 1;
            }
        }
        Ok(rows_with_balance)
    }
}

fn is_derived(layout: &Layout, col: usize) -> bool {
    matches!(
        layout.kind(col),
        Some(ColumnKind::Subtotal | ColumnKind::Balance)
    )
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;

    #[test]
    fn gate_rejects_nested_entry_and_resets_on_drop() {
        let gate = EditGate::new();
        let token = gate.try_enter().expect("first entry");
        assert!(gate.is_updating());
        assert!(gate.try_enter().is_none());
        drop(token);
        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn gate_resets_when_recompute_panics() {
        let gate = EditGate::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _token = gate.try_enter().expect("entry");
            panic!("recompute failed");
        }));
        assert!(result.is_err());
        assert_eq!(gate.state(), GateState::Idle);
    }
}
