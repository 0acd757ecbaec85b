use log::trace;
use serde::Serialize;

use crate::board::{Grid, apply_gravity};
use crate::game::{COLS, ROWS};
use crate::matching::{MatchSet, find_matches};

/// Outcome of resolving one placement to a fixpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeResult {
    #[serde(skip)]
    pub grid: Grid,
    /// Number of clear+gravity iterations that found a match.
    pub match_count: u32,
    pub total_cleared: u32,
    /// Cells cleared by each iteration, in order.
    pub steps: Vec<MatchSet>,
}

impl CascadeResult {
    #[must_use]
    pub fn matched(&self) -> bool {
        self.match_count > 0
    }
}

/// Clears matches and settles the board until no match remains.
#[must_use]
pub fn resolve_cascade(grid: Grid) -> CascadeResult {
    let mut working = grid;
    let mut match_count = 0u32;
    let mut total_cleared = 0u32;
    let mut steps = Vec::new();

    loop {
        let matches = find_matches(&working);
        if matches.is_empty() {
            break;
        }

        for cell in matches.cells() {
            working.clear_cell(cell);
        }
        working = apply_gravity(&working);

        match_count += 1;
        total_cleared += u32::try_from(matches.len()).unwrap_or(u32::MAX);
        trace!(
            "Cascade step {match_count} cleared {} cells",
            matches.len()
        );
        steps.push(matches);

        // Every step removes at least MIN_MATCH tiles
        debug_assert!(match_count as usize <= ROWS * COLS);
    }

    CascadeResult {
        grid: working,
        match_count,
        total_cleared,
        steps,
    }
}
