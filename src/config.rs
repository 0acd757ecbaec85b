pub mod loader;
pub mod settings;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::game;
use crate::powerups::PowerUpKind;

pub use settings::{AccessibilitySettings, AudioSettings, DisplaySettings, Settings, SettingsHub};

/// Engine tuning. Every field falls back to its default, so partial files load.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
    pub timer: TimerConfig,
    pub difficulty: DifficultyConfig,
    pub economy: EconomyConfig,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub initial_drop_ms: u64,
    pub min_drop_ms: u64,
    pub drop_step_ms: u64,
    pub tiles_per_step: u32,
    pub freeze_ms: u64,
    pub revive_drop_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            initial_drop_ms: game::INITIAL_DROP_MS,
            min_drop_ms: game::MIN_DROP_MS,
            drop_step_ms: game::DROP_MS_STEP,
            tiles_per_step: game::TILES_PER_SPEEDUP,
            freeze_ms: game::FREEZE_MS,
            revive_drop_ms: game::REVIVE_DROP_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTier {
    pub score: u32,
    pub max_tile: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub starting_max_tile: u8,
    pub tiers: Vec<TileTier>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            starting_max_tile: game::STARTING_MAX_TILE,
            tiers: game::TILE_TIER_THRESHOLDS
                .iter()
                .map(|&(score, max_tile)| TileTier { score, max_tile })
                .collect(),
        }
    }
}

impl DifficultyConfig {
    /// Highest tier unlocked by `score`.
    #[must_use]
    pub fn max_tile_for(&self, score: u32) -> u8 {
        self.tiers
            .iter()
            .filter(|tier| score >= tier.score)
            .map(|tier| tier.max_tile)
            .fold(self.starting_max_tile, u8::max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub bomb_price: u32,
    pub row_price: u32,
    pub swap_price: u32,
    pub base_game_over_coins: u32,
    pub score_per_coin: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            bomb_price: game::BOMB_PRICE,
            row_price: game::ROW_PRICE,
            swap_price: game::SWAP_PRICE,
            base_game_over_coins: game::BASE_GAME_OVER_COINS,
            score_per_coin: game::SCORE_PER_COIN,
        }
    }
}

impl EconomyConfig {
    #[must_use]
    pub fn price(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Bomb => self.bomb_price,
            PowerUpKind::Row => self.row_price,
            PowerUpKind::Swap => self.swap_price,
        }
    }

    /// Coins paid out when a game ends with `score` points.
    #[must_use]
    pub fn game_over_award(&self, score: u32) -> u32 {
        score / self.score_per_coin.max(1) + self.base_game_over_coins
    }
}
