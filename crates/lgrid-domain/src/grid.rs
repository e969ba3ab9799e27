//! Dense, fixed-size value matrix backing a sheet.

use std::fmt;

use crate::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised by [`GridModel`] accessors.
pub enum GridError {
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfRange {
                row,
                col,
                rows,
                cols,
            } => write!(
                f,
                "cell ({}, {}) is outside the {}x{} grid",
                row, col, rows, cols
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Row-major `rows x cols` matrix of [`Cell`]s.
///
/// The dimensions are fixed at construction; there is no implicit growth.
#[derive(Debug, Clone, PartialEq)]
pub struct GridModel {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl GridModel {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Builds a grid from row vectors, padding or truncating each row and the
    /// row count to the requested dimensions.
    pub fn from_rows(rows: usize, cols: usize, data: Vec<Vec<Cell>>) -> Self {
        let mut grid = Self::new(rows, cols);
        for (index, row) in data.into_iter().take(rows).enumerate() {
            grid.fill_row(index, row);
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Result<&Cell, GridError> {
        let offset = self.offset(row, col)?;
        Ok(&self.cells[offset])
    }

    /// Stores `value` and returns the previous content of the cell.
    pub fn set(&mut self, row: usize, col: usize, value: Cell) -> Result<Cell, GridError> {
        let offset = self.offset(row, col)?;
        Ok(std::mem::replace(&mut self.cells[offset], value))
    }

    pub fn row(&self, row: usize) -> Result<&[Cell], GridError> {
        if row >= self.rows {
            return Err(self.out_of_range(row, 0));
        }
        let start = row * self.cols;
        Ok(&self.cells[start..start + self.cols])
    }

    /// Replaces a whole row; short input is padded with blanks, long input truncated.
    pub fn replace_row(&mut self, row: usize, data: Vec<Cell>) -> Result<(), GridError> {
        if row >= self.rows {
            return Err(self.out_of_range(row, 0));
        }
        self.fill_row(row, data);
        Ok(())
    }

    pub fn is_row_blank(&self, row: usize) -> Result<bool, GridError> {
        Ok(self.row(row)?.iter().all(Cell::is_blank))
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        (0..self.rows).map(move |row| {
            let start = row * self.cols;
            &self.cells[start..start + self.cols]
        })
    }

    pub fn snapshot_all_rows(&self) -> Vec<Vec<Cell>> {
        self.iter_rows().map(<[Cell]>::to_vec).collect()
    }

    fn fill_row(&mut self, row: usize, data: Vec<Cell>) {
        let start = row * self.cols;
        let mut values = data.into_iter();
        for slot in &mut self.cells[start..start + self.cols] {
            *slot = values.next().unwrap_or_default();
        }
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_range(row, col));
        }
        Ok(row * self.cols + col)
    }

    fn out_of_range(&self, row: usize, col: usize) -> GridError {
        GridError::OutOfRange {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_reject_out_of_range_coordinates() {
        let mut grid = GridModel::new(3, 4);
        assert!(grid.get(3, 0).is_err());
        assert!(grid.get(0, 4).is_err());
        assert_eq!(
            grid.set(5, 1, Cell::Number(1.0)),
            Err(GridError::OutOfRange {
                row: 5,
                col: 1,
                rows: 3,
                cols: 4
            })
        );
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
    }

    #[test]
    fn set_returns_previous_value() {
        let mut grid = GridModel::new(2, 2);
        grid.set(1, 1, Cell::Number(5.0)).unwrap();
        let previous = grid.set(1, 1, Cell::NoPayment).unwrap();
        assert_eq!(previous, Cell::Number(5.0));
        assert_eq!(grid.get(1, 1).unwrap(), &Cell::NoPayment);
    }

    #[test]
    fn from_rows_pads_short_rows_and_truncates_long_ones() {
        let grid = GridModel::from_rows(
            3,
            3,
            vec![
                vec![Cell::text("a")],
                vec![
                    Cell::Number(1.0),
                    Cell::Number(2.0),
                    Cell::Number(3.0),
                    Cell::Number(4.0),
                ],
            ],
        );
        assert_eq!(
            grid.row(0).unwrap(),
            &[Cell::text("a"), Cell::Empty, Cell::Empty]
        );
        assert_eq!(grid.row(1).unwrap().len(), 3);
        assert!(grid.is_row_blank(2).unwrap());
        assert_eq!(grid.snapshot_all_rows().len(), 3);
    }
}
