#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use chrono::{Datelike, NaiveDate};
use log::{debug, info, trace};
use serde::Serialize;
use std::fmt;

use crate::board::{Cell, Grid, Tile};
use crate::cascade::{CascadeResult, resolve_cascade};
use crate::challenge::{Calendar, DailyChallenge};
use crate::components::{ActionGate, PendingTiles, Phase, SessionStats, TileGenerator};
use crate::events::{GameEvent, Notifier};
use crate::game::{COLS, COMBO_STREAK_NOTIFY, REVIVE_CLEARED_ROWS};
use crate::powerups::{PowerUpKind, PowerUps, apply_bomb, apply_row_clear};
use crate::scoring::{ScoreUpdate, Scoreboard};
use crate::shop::{Wallet, award_game_over_coins};
use crate::store::{
    BEST_COMBO_KEY, COINS_KEY, DAILY_CHALLENGE_KEY, HIGH_SCORE_KEY, Persistence,
    TOTAL_TILES_CLEARED_KEY,
};
use crate::timer::{DropTimer, Scheduler, TaskKind};

// How often the daily challenge checks for a new calendar day
pub const CHALLENGE_ROLLOVER_MS: u64 = 60_000;

/// Why an action was turned away. None of these end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    InvalidColumn(usize),
    ConcurrentAction,
    PowerUpUnavailable(PowerUpKind),
    SessionOver,
    NoLandingRow(usize),
    ReviveUnavailable,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::InvalidColumn(col) => write!(f, "column {col} is off the board"),
            ActionError::ConcurrentAction => f.write_str("another action is still resolving"),
            ActionError::PowerUpUnavailable(kind) => write!(f, "no {kind} power-up available"),
            ActionError::SessionOver => f.write_str("the game is over"),
            ActionError::NoLandingRow(col) => write!(f, "column {col} has no landing row"),
            ActionError::ReviveUnavailable => f.write_str("revive is not available"),
        }
    }
}

impl std::error::Error for ActionError {}

/// A tile that landed and everything its cascade did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub cell: Cell,
    pub value: Tile,
    pub automatic: bool,
    pub cascade: CascadeResult,
    pub score: ScoreUpdate,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    Placed(Placement),
    /// The column had no room; the session is now over.
    ColumnFull { col: usize },
    PowerUpApplied {
        kind: PowerUpKind,
        row: usize,
        cleared: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "selection", rename_all = "snake_case")]
pub enum PowerUpSelection {
    Armed { kind: PowerUpKind },
    Disarmed { kind: PowerUpKind },
    Swapped { tile: Tile },
}

// Idle state to return to once an action finishes
fn idle_phase(world: &World) -> Phase {
    if world.resource::<SessionStats>().tiles_placed == 0 {
        Phase::AwaitingFirstPlacement
    } else {
        Phase::ReadyForInput
    }
}

fn emit(world: &World, event: GameEvent) {
    world.resource::<Notifier>().emit(event);
}

/// Re-arms or cancels the auto-drop task to match the current state. The
/// countdown restarts from the full budget whenever it is armed.
pub fn sync_drop_timer(world: &mut World) {
    let phase = *world.resource::<Phase>();
    let tiles_placed = world.resource::<SessionStats>().tiles_placed;
    let gate_held = world.resource::<ActionGate>().is_held();
    let (paused, frozen, drop_ms) = {
        let timer = world.resource::<DropTimer>();
        (timer.paused, timer.frozen, timer.drop_ms)
    };

    let runnable = tiles_placed > 0
        && !paused
        && !frozen
        && !gate_held
        && matches!(phase, Phase::ReadyForInput | Phase::PowerUpArmed(_));

    if runnable {
        world
            .resource_mut::<Scheduler>()
            .schedule_once(TaskKind::AutoDrop, drop_ms.max(1));
        world.resource_mut::<DropTimer>().time_remaining_ms = drop_ms;
        debug!("Auto-drop armed for {drop_ms}ms");
    } else if world.resource_mut::<Scheduler>().cancel(TaskKind::AutoDrop) {
        debug!("Auto-drop cancelled ({phase:?}, paused: {paused}, frozen: {frozen})");
    }
}

/// Handles a tap on `col`: drops the current tile, or fires the armed
/// power-up at that column.
pub fn place_tile_system(world: &mut World, col: usize) -> Result<TurnOutcome, ActionError> {
    if col >= COLS {
        debug!("Rejected placement in column {col}");
        return Err(ActionError::InvalidColumn(col));
    }
    if world.resource::<ActionGate>().is_held() {
        return Err(ActionError::ConcurrentAction);
    }

    match *world.resource::<Phase>() {
        Phase::GameOver => Err(ActionError::SessionOver),
        Phase::Resolving => Err(ActionError::ConcurrentAction),
        Phase::PowerUpArmed(kind) => apply_armed_power_up(world, kind, col),
        Phase::AwaitingFirstPlacement | Phase::ReadyForInput => drop_tile(world, col, false),
    }
}

/// Writes the current tile into `col` and resolves the board.
pub fn drop_tile(
    world: &mut World,
    col: usize,
    automatic: bool,
) -> Result<TurnOutcome, ActionError> {
    if !world.resource_mut::<ActionGate>().try_acquire() {
        return Err(ActionError::ConcurrentAction);
    }

    let value = world.resource::<PendingTiles>().current;
    let Some(row) = world.resource::<Grid>().lowest_empty_row(col) else {
        world.resource_mut::<ActionGate>().release();
        info!("Column {col} is full");
        enter_game_over(world);
        return Ok(TurnOutcome::ColumnFull { col });
    };

    *world.resource_mut::<Phase>() = Phase::Resolving;
    world.resource_mut::<Grid>().set(row, col, Some(value));
    let tiles_placed = {
        let mut stats = world.resource_mut::<SessionStats>();
        stats.tiles_placed += 1;
        stats.tiles_placed
    };
    world.resource_mut::<DropTimer>().on_tile_placed(tiles_placed);
    if automatic {
        info!("Auto-placed {value} at ({row}, {col})");
    } else {
        info!("Placed {value} at ({row}, {col})");
    }
    emit(
        world,
        GameEvent::TilePlaced {
            row,
            col,
            value,
            automatic,
        },
    );

    let cascade = resolve_cascade(*world.resource::<Grid>());
    *world.resource_mut::<Grid>() = cascade.grid;
    let score = world.resource_mut::<Scoreboard>().record_cascade(&cascade);
    if cascade.matched() {
        record_clears(world, &cascade, &score);
    }

    let game_over = world.resource::<Grid>().is_full();
    if game_over {
        world.resource_mut::<ActionGate>().release();
        enter_game_over(world);
    } else {
        let total = world.resource::<Scoreboard>().score;
        let next = {
            let mut generator = world.resource_mut::<TileGenerator>();
            if generator.raise_tier(total) {
                info!("Tiles now range up to {}", generator.max_tile());
            }
            generator.draw()
        };
        world.resource_mut::<PendingTiles>().advance(next);
        *world.resource_mut::<Phase>() = Phase::ReadyForInput;
        world.resource_mut::<ActionGate>().release();
        sync_drop_timer(world);
    }

    Ok(TurnOutcome::Placed(Placement {
        cell: Cell::new(row, col),
        value,
        automatic,
        cascade,
        score,
        game_over,
    }))
}

// Bookkeeping for a placement that cleared something
fn record_clears(world: &mut World, cascade: &CascadeResult, score: &ScoreUpdate) {
    let total_cleared = {
        let mut stats = world.resource_mut::<SessionStats>();
        stats.total_tiles_cleared = stats
            .total_tiles_cleared
            .saturating_add(cascade.total_cleared);
        stats.total_tiles_cleared
    };
    world
        .resource_mut::<Persistence>()
        .save(TOTAL_TILES_CLEARED_KEY, &total_cleared);
    if score.new_best_combo {
        let best = world.resource::<Scoreboard>().best_combo;
        world.resource_mut::<Persistence>().save(BEST_COMBO_KEY, &best);
    }

    debug!(
        "Cleared {} tiles over {} steps for {} points",
        cascade.total_cleared, cascade.match_count, score.score_gained
    );
    emit(
        world,
        GameEvent::MatchResolved {
            cleared: cascade.total_cleared,
            match_count: cascade.match_count,
            score_gained: score.score_gained,
        },
    );
    if score.combo_streak >= COMBO_STREAK_NOTIFY {
        emit(
            world,
            GameEvent::ComboStreak {
                streak: score.combo_streak,
            },
        );
    }

    let (reward, challenge) = {
        let mut challenge = world.resource_mut::<DailyChallenge>();
        let reward = challenge.record(cascade.total_cleared, score.score_gained);
        (reward, challenge.clone())
    };
    world
        .resource_mut::<Persistence>()
        .save(DAILY_CHALLENGE_KEY, &challenge);
    if let Some(reward_coins) = reward {
        world.resource_mut::<Wallet>().deposit(reward_coins);
        let coins = world.resource::<Wallet>().coins;
        world.resource_mut::<Persistence>().save(COINS_KEY, &coins);
        emit(world, GameEvent::ChallengeCompleted { reward_coins });
    }
}

/// Fires an armed bomb or row clear at `col`. A full column leaves the
/// power-up armed and unspent.
pub fn apply_armed_power_up(
    world: &mut World,
    kind: PowerUpKind,
    col: usize,
) -> Result<TurnOutcome, ActionError> {
    if !world.resource_mut::<ActionGate>().try_acquire() {
        return Err(ActionError::ConcurrentAction);
    }
    if !world.resource::<PowerUps>().has(kind) {
        world.resource_mut::<ActionGate>().release();
        let idle = idle_phase(world);
        *world.resource_mut::<Phase>() = idle;
        sync_drop_timer(world);
        return Err(ActionError::PowerUpUnavailable(kind));
    }

    let grid = *world.resource::<Grid>();
    let blast = match kind {
        PowerUpKind::Bomb => apply_bomb(&grid, col),
        PowerUpKind::Row => apply_row_clear(&grid, col),
        PowerUpKind::Swap => {
            world.resource_mut::<ActionGate>().release();
            return Err(ActionError::PowerUpUnavailable(kind));
        }
    };
    let Some(blast) = blast else {
        world.resource_mut::<ActionGate>().release();
        debug!("{kind} aimed at full column {col}");
        return Err(ActionError::NoLandingRow(col));
    };

    world.resource_mut::<PowerUps>().try_consume(kind);
    *world.resource_mut::<Grid>() = blast.grid;
    let idle = idle_phase(world);
    *world.resource_mut::<Phase>() = idle;
    world.resource_mut::<ActionGate>().release();
    info!("Used {kind} on row {} cleared {} tiles", blast.row, blast.cleared);
    emit(world, GameEvent::PowerUpUsed { kind });
    sync_drop_timer(world);

    Ok(TurnOutcome::PowerUpApplied {
        kind,
        row: blast.row,
        cleared: blast.cleared,
    })
}

fn freeze_timer(world: &mut World) {
    let freeze_ms = world.resource::<DropTimer>().config().freeze_ms;
    world.resource_mut::<DropTimer>().frozen = true;
    world
        .resource_mut::<Scheduler>()
        .schedule_once(TaskKind::Unfreeze, freeze_ms);
    debug!("Timer frozen for {freeze_ms}ms");
}

/// Arms bomb/row, disarms the kind already armed, or applies swap at once.
pub fn select_power_up_system(
    world: &mut World,
    kind: PowerUpKind,
) -> Result<PowerUpSelection, ActionError> {
    let phase = *world.resource::<Phase>();
    if phase == Phase::GameOver {
        return Err(ActionError::PowerUpUnavailable(kind));
    }
    if phase == Phase::Resolving || world.resource::<ActionGate>().is_held() {
        return Err(ActionError::ConcurrentAction);
    }
    if !world.resource::<PowerUps>().has(kind) {
        debug!("No {kind} left to select");
        return Err(ActionError::PowerUpUnavailable(kind));
    }

    // Every accepted selection freezes, toggling off included
    freeze_timer(world);
    let selection = if phase == Phase::PowerUpArmed(kind) {
        let idle = idle_phase(world);
        *world.resource_mut::<Phase>() = idle;
        debug!("Disarmed {kind}");
        PowerUpSelection::Disarmed { kind }
    } else if kind.needs_target() {
        *world.resource_mut::<Phase>() = Phase::PowerUpArmed(kind);
        debug!("Armed {kind}");
        PowerUpSelection::Armed { kind }
    } else {
        world.resource_mut::<PowerUps>().try_consume(kind);
        let tile = world.resource_mut::<TileGenerator>().draw();
        world.resource_mut::<PendingTiles>().current = tile;
        info!("Swapped current tile for {tile}");
        emit(world, GameEvent::PowerUpUsed { kind });
        PowerUpSelection::Swapped { tile }
    };
    sync_drop_timer(world);
    Ok(selection)
}

/// Drops an armed power-up without using it. Returns whether one was armed.
pub fn deselect_power_up_system(world: &mut World) -> bool {
    let Some(kind) = world.resource::<Phase>().armed() else {
        return false;
    };
    let idle = idle_phase(world);
    *world.resource_mut::<Phase>() = idle;
    debug!("Deselected {kind}");
    sync_drop_timer(world);
    true
}

/// Advances the virtual clock by `delta_ms`, running every task that falls
/// due in order.
pub fn tick_system(world: &mut World, delta_ms: u64) {
    let until = world.resource::<Scheduler>().now_ms().saturating_add(delta_ms);

    loop {
        let Some(handle) = world.resource_mut::<Scheduler>().pop_due(until) else {
            break;
        };
        trace!("Running {:?}", handle.kind);
        match handle.kind {
            TaskKind::Unfreeze => {
                world.resource_mut::<DropTimer>().frozen = false;
                debug!("Timer unfrozen");
                sync_drop_timer(world);
            }
            TaskKind::AutoDrop => auto_drop(world),
            TaskKind::ChallengeRollover => {
                let today = world.resource::<Calendar>().today();
                refresh_daily_challenge_system(world, today);
            }
        }
    }

    world.resource_mut::<Scheduler>().settle_at(until);
    if let Some(remaining) = world.resource::<Scheduler>().remaining_ms(TaskKind::AutoDrop) {
        world.resource_mut::<DropTimer>().time_remaining_ms = remaining;
    }
}

/// Places the current tile into the worst column on timer expiry.
pub fn auto_drop(world: &mut World) {
    match *world.resource::<Phase>() {
        Phase::ReadyForInput => {}
        Phase::PowerUpArmed(kind) => {
            debug!("Timer expired with {kind} armed, disarming");
            let idle = idle_phase(world);
            *world.resource_mut::<Phase>() = idle;
        }
        phase => {
            trace!("Ignoring auto-drop in {phase:?}");
            return;
        }
    }

    let Some(col) = world.resource::<Grid>().worst_column() else {
        enter_game_over(world);
        return;
    };
    world.resource_mut::<Scoreboard>().reset_multiplier();
    info!("Timer expired, dropping into column {col}");
    if let Err(err) = drop_tile(world, col, true) {
        debug!("Auto-drop failed: {err}");
    }
}

/// Ends the game: records the high score, pays the coin award and stops the
/// countdown.
pub fn enter_game_over(world: &mut World) {
    *world.resource_mut::<Phase>() = Phase::GameOver;

    let (score, new_high_score) = {
        let mut scoreboard = world.resource_mut::<Scoreboard>();
        let beaten = scoreboard.settle_high_score();
        (scoreboard.score, beaten)
    };
    if new_high_score {
        world.resource_mut::<Persistence>().save(HIGH_SCORE_KEY, &score);
    }
    info!("Game over with {score} points, new high score: {new_high_score}");
    emit(
        world,
        GameEvent::GameOver {
            score,
            new_high_score,
        },
    );
    award_game_over_coins(world);
    sync_drop_timer(world);
}

/// Clears the top rows and resumes play. Once per game.
pub fn revive_system(world: &mut World) -> Result<(), ActionError> {
    let over = *world.resource::<Phase>() == Phase::GameOver;
    if !over || world.resource::<SessionStats>().has_used_revive {
        debug!("Revive rejected");
        return Err(ActionError::ReviveUnavailable);
    }

    world.resource_mut::<Grid>().clear_rows(0..REVIVE_CLEARED_ROWS);
    world.resource_mut::<SessionStats>().has_used_revive = true;
    world.resource_mut::<DropTimer>().grant_revive_grace();
    *world.resource_mut::<Phase>() = Phase::ReadyForInput;
    info!("Revived");
    emit(world, GameEvent::ReviveUsed);
    sync_drop_timer(world);
    Ok(())
}

/// Returns whether the pause state changed.
pub fn set_paused_system(world: &mut World, paused: bool) -> bool {
    if world.resource::<DropTimer>().paused == paused {
        return false;
    }
    world.resource_mut::<DropTimer>().paused = paused;
    debug!("Paused: {paused}");
    sync_drop_timer(world);
    true
}

/// Every player sees the same challenge on a given day.
#[must_use]
pub fn challenge_for(date: NaiveDate) -> DailyChallenge {
    let seed = u64::try_from(date.num_days_from_ce()).unwrap_or_default();
    DailyChallenge::generate(date, &mut fastrand::Rng::with_seed(seed))
}

/// Replaces the daily challenge when `today` is a new day. Returns whether it
/// was replaced.
pub fn refresh_daily_challenge_system(world: &mut World, today: NaiveDate) -> bool {
    if world.resource::<DailyChallenge>().is_for(today) {
        return false;
    }
    let challenge = challenge_for(today);
    info!("New daily challenge for {today}: {}", challenge.description);
    world
        .resource_mut::<Persistence>()
        .save(DAILY_CHALLENGE_KEY, &challenge);
    world.insert_resource(challenge);
    true
}
