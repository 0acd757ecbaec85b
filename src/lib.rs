pub mod board;
pub mod cascade;
pub mod challenge;
pub mod components;
pub mod config;
pub mod events;
pub mod game;
pub mod matching;
pub mod powerups;
pub mod scoring;
pub mod session;
pub mod shop;
pub mod store;
pub mod systems;
pub mod timer;

pub use board::{Cell, Grid, Tile};
pub use cascade::{CascadeResult, resolve_cascade};
pub use components::Phase;
pub use config::Config;
pub use events::{EventSink, GameEvent};
pub use matching::{MatchSet, find_matches};
pub use powerups::PowerUpKind;
pub use session::{GameSession, SessionSnapshot};
pub use store::KeyValueStore;
pub use systems::{ActionError, PowerUpSelection, TurnOutcome};

#[cfg(test)]
mod tests;
