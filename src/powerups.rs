#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::{Grid, apply_gravity};
use crate::game::{COLS, ROWS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Bomb,
    Row,
    Swap,
}

impl PowerUpKind {
    pub const ALL: [Self; 3] = [Self::Bomb, Self::Row, Self::Swap];

    /// Bomb and row wait for a column; swap applies as soon as it is selected.
    #[must_use]
    pub fn needs_target(self) -> bool {
        !matches!(self, PowerUpKind::Swap)
    }

    const fn slot(self) -> usize {
        match self {
            PowerUpKind::Bomb => 0,
            PowerUpKind::Row => 1,
            PowerUpKind::Swap => 2,
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerUpKind::Bomb => "bomb",
            PowerUpKind::Row => "row",
            PowerUpKind::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// One counter per power-up kind.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerUps {
    counts: [u32; 3],
}

impl PowerUps {
    #[must_use]
    pub fn count(&self, kind: PowerUpKind) -> u32 {
        self.counts[kind.slot()]
    }

    #[must_use]
    pub fn has(&self, kind: PowerUpKind) -> bool {
        self.count(kind) > 0
    }

    pub fn add(&mut self, kind: PowerUpKind, amount: u32) {
        let slot = &mut self.counts[kind.slot()];
        *slot = slot.saturating_add(amount);
    }

    /// Takes one unit, returning false when none are left.
    pub fn try_consume(&mut self, kind: PowerUpKind) -> bool {
        let slot = &mut self.counts[kind.slot()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (PowerUpKind, u32)> + '_ {
        PowerUpKind::ALL.into_iter().map(|kind| (kind, self.count(kind)))
    }
}

/// Board after a bomb or row clear, plus how many tiles it removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlastResult {
    pub grid: Grid,
    pub row: usize,
    pub cleared: usize,
}

/// Clears the 3x3 block centred on the landing cell of `col`, then settles
/// the board once. Returns `None` when the column has no landing cell.
#[must_use]
pub fn apply_bomb(grid: &Grid, col: usize) -> Option<BlastResult> {
    let row = grid.lowest_empty_row(col)?;
    let mut blasted = *grid;
    let mut cleared = 0;
    for r in row.saturating_sub(1)..=(row + 1).min(ROWS - 1) {
        for c in col.saturating_sub(1)..=(col + 1).min(COLS - 1) {
            if blasted.get(r, c).is_some() {
                cleared += 1;
            }
            blasted.set(r, c, None);
        }
    }
    Some(BlastResult {
        grid: apply_gravity(&blasted),
        row,
        cleared,
    })
}

/// Clears the whole row holding the landing cell of `col`, then settles the
/// board once.
#[must_use]
pub fn apply_row_clear(grid: &Grid, col: usize) -> Option<BlastResult> {
    let row = grid.lowest_empty_row(col)?;
    let mut blasted = *grid;
    let cleared = (0..COLS).filter(|&c| grid.get(row, c).is_some()).count();
    blasted.clear_rows(row..row + 1);
    Some(BlastResult {
        grid: apply_gravity(&blasted),
        row,
        cleared,
    })
}
