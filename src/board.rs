#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use serde::Serialize;
use std::ops::Range;

use crate::game::{COLS, ROWS};

/// A tile value drawn from `1..=max_tile`.
pub type Tile = u8;

/// Coordinate of a single board cell. Row 0 is the top of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Up, down, left and right neighbours that lie on the board.
    pub fn neighbours(self) -> impl Iterator<Item = Cell> {
        const OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        OFFSETS.into_iter().filter_map(move |(dr, dc)| {
            let row = self.row.checked_add_signed(dr)?;
            let col = self.col.checked_add_signed(dc)?;
            (row < ROWS && col < COLS).then_some(Cell { row, col })
        })
    }
}

/// The playing field. Dimensions are fixed; cells hold an optional tile value.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    cells: [[Option<Tile>; COLS]; ROWS],
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
        }
    }

    #[must_use]
    pub const fn from_rows(cells: [[Option<Tile>; COLS]; ROWS]) -> Self {
        Self { cells }
    }

    #[must_use]
    pub const fn rows(&self) -> &[[Option<Tile>; COLS]; ROWS] {
        &self.cells
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Tile> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    #[must_use]
    pub fn at(&self, cell: Cell) -> Option<Tile> {
        self.get(cell.row, cell.col)
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<Tile>) {
        if row < ROWS && col < COLS {
            self.cells[row][col] = value;
        }
    }

    pub fn clear_cell(&mut self, cell: Cell) {
        self.set(cell.row, cell.col, None);
    }

    /// Landing row for a tile dropped into `col`: the bottom-most empty cell.
    /// Returns `None` when the column is full or out of range.
    #[must_use]
    pub fn lowest_empty_row(&self, col: usize) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        (0..ROWS).rev().find(|&row| self.cells[row][col].is_none())
    }

    #[must_use]
    pub fn is_column_full(&self, col: usize) -> bool {
        self.lowest_empty_row(col).is_none()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.is_column_full(col))
    }

    /// Number of cells below the landing row of `col`.
    #[must_use]
    pub fn fill_height(&self, col: usize) -> usize {
        match self.lowest_empty_row(col) {
            Some(row) => ROWS - 1 - row,
            None => ROWS,
        }
    }

    /// The most filled column that can still take a tile, ties going to the
    /// lowest index.
    #[must_use]
    pub fn worst_column(&self) -> Option<usize> {
        let mut worst: Option<(usize, usize)> = None;
        for col in 0..COLS {
            let Some(row) = self.lowest_empty_row(col) else {
                continue;
            };
            let height = ROWS - 1 - row;
            if worst.is_none_or(|(_, best)| height > best) {
                worst = Some((col, height));
            }
        }
        worst.map(|(col, _)| col)
    }

    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn clear_rows(&mut self, rows: Range<usize>) {
        for row in rows.start..rows.end.min(ROWS) {
            self.cells[row] = [None; COLS];
        }
    }

    #[must_use]
    pub fn apply_gravity(&self) -> Grid {
        apply_gravity(self)
    }
}

/// Settles every column so that its tiles rest on the bottom row, keeping
/// their relative order.
#[must_use]
pub fn apply_gravity(grid: &Grid) -> Grid {
    let mut settled = Grid::empty();
    for col in 0..COLS {
        let mut write_row = ROWS;
        for row in (0..ROWS).rev() {
            if let Some(value) = grid.cells[row][col] {
                write_row -= 1;
                settled.cells[write_row][col] = Some(value);
            }
        }
    }
    settled
}
