#![warn(clippy::all, clippy::pedantic)]

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::board::{Cell, Grid};
use crate::game::{COLS, MIN_MATCH, ROWS};

/// Cells that clear together in one resolution step, each tagged with the
/// size of the largest group it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSet {
    #[serde(serialize_with = "serialize_cells")]
    cells: BTreeMap<Cell, usize>,
}

#[derive(Serialize)]
struct MatchedCell {
    row: usize,
    col: usize,
    size: usize,
}

// Cells are not valid JSON object keys, so the set goes out as a list
fn serialize_cells<S: Serializer>(
    cells: &BTreeMap<Cell, usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(cells.iter().map(|(cell, &size)| MatchedCell {
        row: cell.row,
        col: cell.col,
        size,
    }))
}

impl MatchSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    #[must_use]
    pub fn group_size(&self, cell: Cell) -> Option<usize> {
        self.cells.get(&cell).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, usize)> + '_ {
        self.cells.iter().map(|(cell, size)| (*cell, *size))
    }

    fn mark(&mut self, cell: Cell, group_size: usize) {
        let entry = self.cells.entry(cell).or_insert(group_size);
        *entry = (*entry).max(group_size);
    }

    fn mark_all(&mut self, group: &[Cell]) {
        for &cell in group {
            self.mark(cell, group.len());
        }
    }
}

/// Runs the horizontal, vertical and cluster passes over one snapshot and
/// unions their results.
#[must_use]
pub fn find_matches(grid: &Grid) -> MatchSet {
    let mut matches = MatchSet::default();
    horizontal_runs(grid, &mut matches);
    vertical_runs(grid, &mut matches);
    clusters(grid, &mut matches);
    matches
}

fn horizontal_runs(grid: &Grid, matches: &mut MatchSet) {
    for row in 0..ROWS {
        let line: Vec<Cell> = (0..COLS).map(|col| Cell::new(row, col)).collect();
        mark_runs(grid, &line, matches);
    }
}

fn vertical_runs(grid: &Grid, matches: &mut MatchSet) {
    for col in 0..COLS {
        let line: Vec<Cell> = (0..ROWS).map(|row| Cell::new(row, col)).collect();
        mark_runs(grid, &line, matches);
    }
}

// Marks every maximal run of equal values along `line` that reaches MIN_MATCH.
fn mark_runs(grid: &Grid, line: &[Cell], matches: &mut MatchSet) {
    let mut start = 0;
    while start < line.len() {
        let Some(value) = grid.at(line[start]) else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end < line.len() && grid.at(line[end]) == Some(value) {
            end += 1;
        }
        if end - start >= MIN_MATCH {
            matches.mark_all(&line[start..end]);
        }
        start = end;
    }
}

fn clusters(grid: &Grid, matches: &mut MatchSet) {
    let mut visited = [[false; COLS]; ROWS];

    for row in 0..ROWS {
        for col in 0..COLS {
            if visited[row][col] {
                continue;
            }
            let Some(value) = grid.get(row, col) else {
                continue;
            };

            // Iterative flood fill over orthogonal neighbours
            let mut component = Vec::new();
            let mut stack = vec![Cell::new(row, col)];
            visited[row][col] = true;

            while let Some(cell) = stack.pop() {
                component.push(cell);
                for next in cell.neighbours() {
                    if !visited[next.row][next.col] && grid.at(next) == Some(value) {
                        visited[next.row][next.col] = true;
                        stack.push(next);
                    }
                }
            }

            if component.len() >= MIN_MATCH {
                matches.mark_all(&component);
            }
        }
    }
}
