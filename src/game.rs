#![warn(clippy::all, clippy::pedantic)]

// Board dimensions
pub const ROWS: usize = 7;
pub const COLS: usize = 6;

// Smallest run or cluster that clears
pub const MIN_MATCH: usize = 3;

// Scoring
pub const POINTS_PER_TILE: u32 = 100;
pub const COMBO_STREAK_NOTIFY: u32 = 2; // Streak length at which the combo signal fires

// Tile generator tiers
pub const STARTING_MAX_TILE: u8 = 10;
pub const TILE_TIER_THRESHOLDS: &[(u32, u8)] = &[
    (2_000, 11), // Reach 2,000 points to draw 1-11
    (4_000, 12), // Reach 4,000 points to draw 1-12
];

// Drop timer (milliseconds)
pub const INITIAL_DROP_MS: u64 = 4_000;
pub const MIN_DROP_MS: u64 = 1_500;
pub const DROP_MS_STEP: u64 = 150;
pub const TILES_PER_SPEEDUP: u32 = 5;
pub const FREEZE_MS: u64 = 10_000; // Timer freeze after a power-up is selected
pub const REVIVE_DROP_MS: u64 = 3_500; // Grace budget granted by a revive

// Revive clears rows 0..REVIVE_CLEARED_ROWS
pub const REVIVE_CLEARED_ROWS: usize = 3;

// Economy
pub const BASE_GAME_OVER_COINS: u32 = 5;
pub const SCORE_PER_COIN: u32 = 100;
pub const BOMB_PRICE: u32 = 50;
pub const ROW_PRICE: u32 = 40;
pub const SWAP_PRICE: u32 = 30;
