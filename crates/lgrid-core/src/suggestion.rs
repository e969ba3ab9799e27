//! Input assist for period cells.

use lgrid_domain::{Cell, ColumnKind, GridModel, Layout};

use crate::{number::cell_amount, CoreError, NumberLocale};

/// Which of the two proposals the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionChoice {
    CarryForward,
    NoPayment,
}

/// Values offered when a period cell enters edit mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub carry_forward: Cell,
    pub no_payment: Cell,
}

impl Suggestion {
    pub fn value(&self, choice: SuggestionChoice) -> &Cell {
        match choice {
            SuggestionChoice::CarryForward => &self.carry_forward,
            SuggestionChoice::NoPayment => &self.no_payment,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionAdvisor {
    locale: NumberLocale,
}

impl SuggestionAdvisor {
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    /// Proposes a carry-forward value for a period cell.
    ///
    /// Scans leftwards from `col - 1` to the first period column, skipping
    /// subtotals, and picks the first non-zero amount. Falls back to the row's
    /// secondary amount field. Returns `None` for any non-period column.
    pub fn suggest(
        &self,
        grid: &GridModel,
        layout: &Layout,
        row: usize,
        col: usize,
    ) -> Result<Option<Suggestion>, CoreError> {
        if !layout.is_period(col) {
            return Ok(None);
        }
        let values = grid.row(row)?;
        let Some(first_period) = layout.first_period_column() else {
            return Ok(None);
        };

        let previous = (first_period..col)
            .rev()
            .filter(|index| layout.kind(*index) == Some(ColumnKind::Period))
            .filter_map(|index| values.get(index))
            .find(|cell| self.is_candidate(cell));

        let carry_forward = match previous {
            Some(cell) => cell.clone(),
            None => values
                .get(layout.amount_column())
                .filter(|cell| !cell.is_blank())
                .cloned()
                .unwrap_or_default(),
        };

        Ok(Some(Suggestion {
            carry_forward,
            no_payment: Cell::NoPayment,
        }))
    }

    fn is_candidate(&self, cell: &Cell) -> bool {
        !cell.is_blank() && !cell.is_no_payment() && cell_amount(cell, &self.locale) != 0.0
    }
}

#[cfg(test)]
mod tests {
    use lgrid_domain::{SheetFormat, YearMonth};

    use super::*;
    use crate::build_layout;

    fn weekly() -> Layout {
        build_layout(SheetFormat::Weekly, YearMonth::new(2025, 1).unwrap(), None).unwrap()
    }

    #[test]
    fn scan_skips_subtotal_columns() {
        let layout = weekly();
        let mut grid = GridModel::new(2, layout.len());
        grid.set(0, 15, Cell::Number(75.0)).unwrap();
        grid.set(0, 16, Cell::Number(75.0)).unwrap();

        let suggestion = SuggestionAdvisor::default()
            .suggest(&grid, &layout, 0, 17)
            .unwrap()
            .unwrap();
        assert_eq!(suggestion.carry_forward, Cell::Number(75.0));
        assert_eq!(suggestion.value(SuggestionChoice::NoPayment), &Cell::NoPayment);
    }

    #[test]
    fn falls_back_to_secondary_amount() {
        let layout = weekly();
        let mut grid = GridModel::new(1, layout.len());
        grid.set(0, layout.amount_column(), Cell::Number(40.0)).unwrap();
        grid.set(0, 9, Cell::Number(0.0)).unwrap();
        grid.set(0, 10, Cell::NoPayment).unwrap();

        let suggestion = SuggestionAdvisor::default()
            .suggest(&grid, &layout, 0, 11)
            .unwrap()
            .unwrap();
        assert_eq!(suggestion.carry_forward, Cell::Number(40.0));
    }

    #[test]
    fn empty_row_suggests_blank_carry_forward() {
        let layout = weekly();
        let grid = GridModel::new(1, layout.len());
        let suggestion = SuggestionAdvisor::default()
            .suggest(&grid, &layout, 0, 9)
            .unwrap()
            .unwrap();
        assert_eq!(suggestion.carry_forward, Cell::Empty);
    }

    #[test]
    fn non_period_columns_get_no_suggestion() {
        let layout = weekly();
        let grid = GridModel::new(1, layout.len());
        let advisor = SuggestionAdvisor::default();
        for col in [0, layout.amount1_column(), layout.balance_column(), 16, 49] {
            assert_eq!(advisor.suggest(&grid, &layout, 0, col).unwrap(), None);
        }
    }
}
