//! Whole-grid aggregation and balance classification.

use lgrid_domain::{Cell, GridModel, Layout};

use crate::number::{cell_amount, NumberLocale};

/// Styling class of a balance cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStatus {
    /// Money still owed.
    Outstanding,
    Settled,
    /// More collected than the principal.
    Overpaid,
}

/// Sums every column over all rows. Blank, no-payment and non-numeric cells
/// count as zero. The result has one entry per layout column.
pub fn column_totals(grid: &GridModel, layout: &Layout, locale: &NumberLocale) -> Vec<f64> {
    let width = layout.len().min(grid.cols());
    let mut totals = vec![0.0; layout.len()];
    for row in grid.iter_rows() {
        for (total, cell) in totals.iter_mut().zip(row.iter().take(width)) {
            *total += cell_amount(cell, locale);
        }
    }
    totals
}

/// Classifies a balance cell; blank cells have no status.
pub fn balance_status(cell: &Cell, locale: &NumberLocale) -> Option<BalanceStatus> {
    if cell.is_blank() || cell.is_no_payment() {
        return None;
    }
    let value = cell_amount(cell, locale);
    Some(if value > 0.0 {
        BalanceStatus::Outstanding
    } else if value < 0.0 {
        BalanceStatus::Overpaid
    } else {
        BalanceStatus::Settled
    })
}
