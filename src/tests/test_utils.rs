#![allow(clippy::cast_possible_truncation)]

use chrono::NaiveDate;
use crossbeam_channel::Receiver;
use serde_json::Value;
use std::io;
use std::sync::{Arc, Mutex};

use crate::board::{Grid, Tile};
use crate::challenge::{Calendar, ChallengeGoal, DailyChallenge};
use crate::components::PendingTiles;
use crate::config::Config;
use crate::events::{self, EventSink, GameEvent, NullSink};
use crate::game::{COLS, ROWS};
use crate::session::GameSession;
use crate::store::{KeyValueStore, MemoryStore, StoreError};

pub fn init_logger() {
    env_logger::builder().is_test(true).try_init().ok();
}

#[must_use]
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
}

#[must_use]
pub fn seeded_config() -> Config {
    Config {
        seed: Some(42),
        ..Config::default()
    }
}

/// Memory store that tests can keep a handle on after the session takes it.
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner
            .lock()
            .expect("store lock")
            .get(key)
            .expect("memory store never fails")
    }

    pub fn put(&self, key: &str, value: Value) {
        self.inner
            .lock()
            .expect("store lock")
            .set(key, value)
            .expect("memory store never fails");
    }
}

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.lock().expect("store lock").get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.inner.lock().expect("store lock").set(key, value)
    }
}

/// Store whose every call fails.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Io(io::Error::other("storage unavailable")))
    }

    fn set(&mut self, _key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Io(io::Error::other("storage unavailable")))
    }
}

/// Challenge for the test date that no test finishes by accident.
#[must_use]
pub fn distant_challenge() -> DailyChallenge {
    DailyChallenge {
        goal: 100_000,
        progress: 0,
        kind: ChallengeGoal::ClearTiles,
        description: "Clear 100000 tiles today".to_owned(),
        reward_coins: 20,
        completed: false,
        date: test_date(),
    }
}

fn build_session(store: Box<dyn KeyValueStore>, sink: Box<dyn EventSink>) -> GameSession {
    init_logger();
    let mut session =
        GameSession::with_calendar(seeded_config(), store, sink, Calendar::fixed(test_date()));
    session.world.insert_resource(distant_challenge());
    session
}

// Helper function to create a seeded session with in-memory storage
#[must_use]
pub fn create_test_session() -> GameSession {
    build_session(Box::new(MemoryStore::new()), Box::new(NullSink))
}

#[must_use]
pub fn create_session_with_store(store: &SharedStore) -> GameSession {
    build_session(Box::new(store.clone()), Box::new(NullSink))
}

/// Session whose events land on the returned receiver.
#[must_use]
pub fn create_observed_session() -> (GameSession, Receiver<GameEvent>) {
    let (sink, receiver) = events::channel(256);
    let session = build_session(Box::new(MemoryStore::new()), Box::new(sink));
    (session, receiver)
}

#[must_use]
pub fn drain(receiver: &Receiver<GameEvent>) -> Vec<GameEvent> {
    receiver.try_iter().collect()
}

/// Grid holding only the listed `(row, col, value)` cells.
#[must_use]
pub fn grid_with(cells: &[(usize, usize, Tile)]) -> Grid {
    let mut grid = Grid::empty();
    for &(row, col, value) in cells {
        grid.set(row, col, Some(value));
    }
    grid
}

/// Fills the bottom `heights[col]` cells of every column with a checkerboard
/// of 1s and 2s, which never matches.
#[must_use]
pub fn grid_with_heights(heights: [usize; COLS]) -> Grid {
    let mut grid = Grid::empty();
    for (col, &height) in heights.iter().enumerate() {
        for row in ROWS - height.min(ROWS)..ROWS {
            grid.set(row, col, Some(1 + ((row + col) % 2) as Tile));
        }
    }
    grid
}

pub fn set_grid(session: &mut GameSession, grid: Grid) {
    session.world.insert_resource(grid);
}

pub fn set_current_tile(session: &mut GameSession, tile: Tile) {
    session.world.resource_mut::<PendingTiles>().current = tile;
}

/// Places `tile` in `col`, panicking if the session turns it away.
pub fn place(session: &mut GameSession, col: usize, tile: Tile) -> crate::systems::TurnOutcome {
    set_current_tile(session, tile);
    session.place_tile(col).expect("placement accepted")
}
