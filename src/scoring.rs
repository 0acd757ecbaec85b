#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::cascade::CascadeResult;
use crate::game::POINTS_PER_TILE;

/// Points for clearing `total_cleared` tiles over `match_count` cascade steps.
#[must_use]
pub fn score_for(total_cleared: u32, match_count: u32) -> u32 {
    total_cleared
        .saturating_mul(POINTS_PER_TILE)
        .saturating_mul(match_count.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreGain {
    pub amount: u32,
    pub multiplier: u32,
}

/// What a single placement did to the score and combo counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreUpdate {
    pub score_gained: u32,
    pub match_count: u32,
    pub combo_streak: u32,
    pub new_best_combo: bool,
}

#[derive(Debug, Resource, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    pub high_score: u32,
    /// Multiplier shown to the player: the last placement's cascade depth, or 1.
    pub combo_multiplier: u32,
    /// Cascade steps accumulated since the last auto-drop or restart.
    pub combo_count: u32,
    /// Consecutive placements that produced at least one match.
    pub combo_streak: u32,
    pub best_combo: u32,
    pub last_gain: Option<ScoreGain>,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self {
            score: 0,
            high_score: 0,
            combo_multiplier: 1,
            combo_count: 0,
            combo_streak: 0,
            best_combo: 0,
            last_gain: None,
        }
    }
}

impl Scoreboard {
    /// Fresh per-game counters that keep the persisted records.
    #[must_use]
    pub fn with_records(high_score: u32, best_combo: u32) -> Self {
        Self {
            high_score,
            best_combo,
            ..Self::default()
        }
    }

    pub fn record_cascade(&mut self, cascade: &CascadeResult) -> ScoreUpdate {
        let match_count = cascade.match_count;
        let score_gained = if cascade.matched() {
            score_for(cascade.total_cleared, match_count)
        } else {
            0
        };

        let mut new_best_combo = false;
        if match_count == 0 {
            // A matchless placement breaks the streak
            self.combo_multiplier = 1;
            self.combo_streak = 0;
        } else {
            self.score = self.score.saturating_add(score_gained);
            self.combo_multiplier = match_count;
            self.combo_count += match_count;
            self.combo_streak += 1;
            self.last_gain = Some(ScoreGain {
                amount: score_gained,
                multiplier: match_count,
            });
            if match_count > self.best_combo {
                self.best_combo = match_count;
                new_best_combo = true;
            }
        }

        ScoreUpdate {
            score_gained,
            match_count,
            combo_streak: self.combo_streak,
            new_best_combo,
        }
    }

    /// Applied before an automatic placement.
    pub fn reset_multiplier(&mut self) {
        self.combo_count = 0;
        self.combo_multiplier = 1;
    }

    /// Raises the high score if this game beat it.
    pub fn settle_high_score(&mut self) -> bool {
        if self.score > self.high_score {
            self.high_score = self.score;
            true
        } else {
            false
        }
    }
}
