#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::board::Tile;
use crate::config::DifficultyConfig;
use crate::powerups::PowerUpKind;

/// Where the session is in its lifecycle.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "power_up", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    AwaitingFirstPlacement,
    ReadyForInput,
    Resolving,
    PowerUpArmed(PowerUpKind),
    GameOver,
}

impl Phase {
    #[must_use]
    pub fn armed(self) -> Option<PowerUpKind> {
        match self {
            Phase::PowerUpArmed(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Draws tile values; the range only ever grows within a session.
#[derive(Resource, Debug, Clone)]
pub struct TileGenerator {
    rng: fastrand::Rng,
    max_tile: Tile,
    difficulty: DifficultyConfig,
}

impl TileGenerator {
    #[must_use]
    pub fn new(rng: fastrand::Rng, difficulty: DifficultyConfig) -> Self {
        Self {
            rng,
            max_tile: difficulty.starting_max_tile.max(1),
            difficulty,
        }
    }

    #[must_use]
    pub fn max_tile(&self) -> Tile {
        self.max_tile
    }

    pub fn draw(&mut self) -> Tile {
        self.rng.u8(1..=self.max_tile)
    }

    /// Unlocks higher tiles once `score` crosses a tier threshold.
    /// Returns true when the range grew.
    pub fn raise_tier(&mut self, score: u32) -> bool {
        let target = self.difficulty.max_tile_for(score);
        if target > self.max_tile {
            self.max_tile = target;
            true
        } else {
            false
        }
    }

    /// Hands the RNG back so a restarted game keeps the same stream.
    #[must_use]
    pub fn into_rng(self) -> fastrand::Rng {
        self.rng
    }
}

/// The tile about to be placed and the single lookahead.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingTiles {
    pub current: Tile,
    pub next: Tile,
}

impl PendingTiles {
    pub fn draw(generator: &mut TileGenerator) -> Self {
        let current = generator.draw();
        let next = generator.draw();
        Self { current, next }
    }

    /// Promotes the lookahead and queues `next` behind it.
    pub fn advance(&mut self, next: Tile) {
        self.current = self.next;
        self.next = next;
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub tiles_placed: u32,
    /// Lifetime total, mirrored to storage.
    pub total_tiles_cleared: u32,
    pub has_used_revive: bool,
}

/// Single-writer gate shared by placement and power-up application.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ActionGate {
    processing: bool,
}

impl ActionGate {
    pub fn try_acquire(&mut self) -> bool {
        if self.processing {
            return false;
        }
        self.processing = true;
        true
    }

    pub fn release(&mut self) {
        self.processing = false;
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.processing
    }
}
