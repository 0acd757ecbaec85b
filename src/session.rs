#![warn(clippy::all, clippy::pedantic)]

use anyhow::Context;
use bevy_ecs::prelude::*;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::board::{Grid, Tile};
use crate::challenge::{Calendar, DailyChallenge};
use crate::components::{ActionGate, PendingTiles, Phase, SessionStats, TileGenerator};
use crate::config::loader::load_config_from_file;
use crate::config::{Config, Settings, SettingsHub};
use crate::events::{EventSink, Notifier, NullSink};
use crate::game::{COLS, ROWS};
use crate::powerups::{PowerUpKind, PowerUps};
use crate::scoring::{ScoreGain, Scoreboard};
use crate::shop::{self, PurchaseError, Wallet};
use crate::store::{
    BEST_COMBO_KEY, COINS_KEY, DAILY_CHALLENGE_KEY, HIGH_SCORE_KEY, JsonFileStore,
    KeyValueStore, MemoryStore, Persistence, SETTINGS_KEY, TOTAL_TILES_CLEARED_KEY,
    get_store_file_path,
};
use crate::systems::{self, ActionError, CHALLENGE_ROLLOVER_MS, PowerUpSelection, TurnOutcome};
use crate::timer::{DropTimer, Scheduler, TaskKind};

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub grid: [[Option<Tile>; COLS]; ROWS],
    pub phase: Phase,
    pub current_tile: Tile,
    pub next_tile: Tile,
    pub max_tile: Tile,
    pub score: u32,
    pub high_score: u32,
    pub combo_multiplier: u32,
    pub combo_count: u32,
    pub combo_streak: u32,
    pub best_combo: u32,
    pub last_gain: Option<ScoreGain>,
    pub tiles_placed: u32,
    pub total_tiles_cleared: u32,
    pub has_used_revive: bool,
    pub power_ups: BTreeMap<PowerUpKind, u32>,
    pub coins: u32,
    pub coins_earned: u32,
    pub drop_ms: u64,
    pub time_remaining_ms: u64,
    pub timer_frozen: bool,
    pub paused: bool,
    pub daily_challenge: DailyChallenge,
}

/// One player's game. All state lives in the ECS world as resources.
pub struct GameSession {
    pub world: World,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(
            Config::default(),
            Box::new(MemoryStore::new()),
            Box::new(NullSink),
        )
    }
}

impl GameSession {
    #[must_use]
    pub fn new(config: Config, store: Box<dyn KeyValueStore>, sink: Box<dyn EventSink>) -> Self {
        Self::with_calendar(config, store, sink, Calendar::default())
    }

    #[must_use]
    pub fn with_calendar(
        config: Config,
        store: Box<dyn KeyValueStore>,
        sink: Box<dyn EventSink>,
        calendar: Calendar,
    ) -> Self {
        let persistence = Persistence::new(store);
        let settings = persistence
            .load::<Settings>(SETTINGS_KEY)
            .unwrap_or_else(|| config.settings.clone());
        let coins = persistence.load_or(COINS_KEY, 0u32);
        let total_tiles_cleared = persistence.load_or(TOTAL_TILES_CLEARED_KEY, 0u32);
        let today = calendar.today();
        let challenge = persistence
            .load::<DailyChallenge>(DAILY_CHALLENGE_KEY)
            .filter(|challenge| challenge.is_for(today));

        let rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

        let mut world = World::new();
        world.insert_resource(TileGenerator::new(rng, config.difficulty.clone()));
        world.insert_resource(SettingsHub::new(settings));
        world.insert_resource(config);
        world.insert_resource(persistence);
        world.insert_resource(Notifier::new(sink));
        world.insert_resource(calendar);
        world.insert_resource(Wallet::with_coins(coins));
        world.insert_resource(SessionStats {
            total_tiles_cleared,
            ..SessionStats::default()
        });

        match challenge {
            Some(challenge) => {
                world.insert_resource(challenge);
            }
            None => {
                let challenge = systems::challenge_for(today);
                world
                    .resource_mut::<Persistence>()
                    .save(DAILY_CHALLENGE_KEY, &challenge);
                world.insert_resource(challenge);
            }
        }

        let mut session = Self { world };
        session.start_game();
        session
    }

    /// Loads the config file and opens the JSON store at their default
    /// locations.
    pub fn open_default() -> anyhow::Result<Self> {
        let config = load_config_from_file().context("failed to load configuration")?;
        let store_path = get_store_file_path();
        let store = JsonFileStore::open(&store_path)
            .with_context(|| format!("failed to open store at {}", store_path.display()))?;
        info!("Opened session store at {}", store_path.display());
        Ok(Self::new(config, Box::new(store), Box::new(NullSink)))
    }

    // Per-game resources; records, coins, settings and the challenge survive
    fn start_game(&mut self) {
        let (mut high_score, mut best_combo) = {
            let persistence = self.world.resource::<Persistence>();
            (
                persistence.load_or(HIGH_SCORE_KEY, 0u32),
                persistence.load_or(BEST_COMBO_KEY, 0u32),
            )
        };
        // Records held in memory win over a store that missed a write
        if let Some(previous) = self.world.get_resource::<Scoreboard>() {
            high_score = high_score.max(previous.high_score);
            best_combo = best_combo.max(previous.best_combo);
        }
        let timer_config = self.world.resource::<Config>().timer.clone();
        let difficulty = self.world.resource::<Config>().difficulty.clone();

        let rng = self
            .world
            .remove_resource::<TileGenerator>()
            .map_or_else(fastrand::Rng::new, TileGenerator::into_rng);
        let mut generator = TileGenerator::new(rng, difficulty);
        let pending = PendingTiles::draw(&mut generator);

        self.world.insert_resource(generator);
        self.world.insert_resource(pending);
        self.world.insert_resource(Grid::empty());
        self.world.insert_resource(Phase::AwaitingFirstPlacement);
        self.world
            .insert_resource(Scoreboard::with_records(high_score, best_combo));
        self.world.insert_resource(PowerUps::default());
        self.world.insert_resource(DropTimer::new(timer_config));
        self.world.insert_resource(ActionGate::default());
        self.world.resource_mut::<Wallet>().start_new_game();
        {
            let mut stats = self.world.resource_mut::<SessionStats>();
            stats.tiles_placed = 0;
            stats.has_used_revive = false;
        }

        // The clock keeps running across games; only the pending work goes
        let mut scheduler = self
            .world
            .remove_resource::<Scheduler>()
            .unwrap_or_default();
        scheduler.cancel_all();
        scheduler.schedule_repeating(TaskKind::ChallengeRollover, CHALLENGE_ROLLOVER_MS);
        self.world.insert_resource(scheduler);
        debug!("New game, first tiles {pending:?}");
    }

    pub fn place_tile(&mut self, col: usize) -> Result<TurnOutcome, ActionError> {
        systems::place_tile_system(&mut self.world, col)
    }

    pub fn select_power_up(&mut self, kind: PowerUpKind) -> Result<PowerUpSelection, ActionError> {
        systems::select_power_up_system(&mut self.world, kind)
    }

    pub fn deselect_power_up(&mut self) -> bool {
        systems::deselect_power_up_system(&mut self.world)
    }

    /// Advances session time by `delta_ms` milliseconds.
    pub fn tick(&mut self, delta_ms: u64) {
        systems::tick_system(&mut self.world, delta_ms);
    }

    pub fn set_paused(&mut self, paused: bool) -> bool {
        systems::set_paused_system(&mut self.world, paused)
    }

    pub fn revive(&mut self) -> Result<(), ActionError> {
        systems::revive_system(&mut self.world)
    }

    /// Throws the current game away and deals a fresh board.
    pub fn restart(&mut self) {
        info!("Restarting game");
        self.start_game();
    }

    pub fn purchase_power_up(&mut self, kind: PowerUpKind) -> Result<u32, PurchaseError> {
        shop::purchase_power_up(&mut self.world, kind)
    }

    pub fn refund_power_up(&mut self, kind: PowerUpKind) -> Result<u32, PurchaseError> {
        shop::refund_power_up(&mut self.world, kind)
    }

    pub fn refresh_daily_challenge(&mut self, today: chrono::NaiveDate) -> bool {
        systems::refresh_daily_challenge_system(&mut self.world, today)
    }

    /// Applies a settings change, persisting and broadcasting it when
    /// something actually changed.
    pub fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) -> bool {
        if !self.world.resource_mut::<SettingsHub>().update(change) {
            return false;
        }
        let settings = self.world.resource::<SettingsHub>().settings().clone();
        self.world
            .resource_mut::<Persistence>()
            .save(SETTINGS_KEY, &settings);
        true
    }

    pub fn subscribe_settings(&mut self, listener: impl Fn(&Settings) + Send + Sync + 'static) {
        self.world.resource_mut::<SettingsHub>().subscribe(listener);
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        self.world.resource::<SettingsHub>().settings()
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.world.resource::<Grid>()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.world.resource::<Phase>()
    }

    #[must_use]
    pub fn pending(&self) -> PendingTiles {
        *self.world.resource::<PendingTiles>()
    }

    #[must_use]
    pub fn scoreboard(&self) -> &Scoreboard {
        self.world.resource::<Scoreboard>()
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        self.world.resource::<SessionStats>()
    }

    #[must_use]
    pub fn power_ups(&self) -> PowerUps {
        *self.world.resource::<PowerUps>()
    }

    #[must_use]
    pub fn wallet(&self) -> &Wallet {
        self.world.resource::<Wallet>()
    }

    #[must_use]
    pub fn timer(&self) -> &DropTimer {
        self.world.resource::<DropTimer>()
    }

    #[must_use]
    pub fn daily_challenge(&self) -> &DailyChallenge {
        self.world.resource::<DailyChallenge>()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase() == Phase::GameOver
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let pending = self.pending();
        let scoreboard = self.scoreboard();
        let stats = self.stats();
        let timer = self.timer();
        let wallet = self.wallet();
        SessionSnapshot {
            grid: *self.grid().rows(),
            phase: self.phase(),
            current_tile: pending.current,
            next_tile: pending.next,
            max_tile: self.world.resource::<TileGenerator>().max_tile(),
            score: scoreboard.score,
            high_score: scoreboard.high_score,
            combo_multiplier: scoreboard.combo_multiplier,
            combo_count: scoreboard.combo_count,
            combo_streak: scoreboard.combo_streak,
            best_combo: scoreboard.best_combo,
            last_gain: scoreboard.last_gain,
            tiles_placed: stats.tiles_placed,
            total_tiles_cleared: stats.total_tiles_cleared,
            has_used_revive: stats.has_used_revive,
            power_ups: self.power_ups().iter().collect(),
            coins: wallet.coins,
            coins_earned: wallet.coins_earned,
            drop_ms: timer.drop_ms,
            time_remaining_ms: timer.time_remaining_ms,
            timer_frozen: timer.frozen,
            paused: timer.paused,
            daily_challenge: self.daily_challenge().clone(),
        }
    }
}
