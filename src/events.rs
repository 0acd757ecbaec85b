use bevy_ecs::prelude::Resource;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, trace};
use serde::Serialize;
use std::thread;

use crate::board::Tile;
use crate::powerups::PowerUpKind;

// Signals the engine raises for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    TilePlaced {
        row: usize,
        col: usize,
        value: Tile,
        automatic: bool,
    },
    MatchResolved {
        cleared: u32,
        match_count: u32,
        score_gained: u32,
    },
    ComboStreak {
        streak: u32,
    },
    PowerUpUsed {
        kind: PowerUpKind,
    },
    GameOver {
        score: u32,
        new_high_score: bool,
    },
    ReviveUsed,
    CoinsAwarded {
        amount: u32,
        total: u32,
    },
    ChallengeCompleted {
        reward_coins: u32,
    },
}

/// Fire-and-forget receiver of game events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GameEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: GameEvent) {}
}

/// Forwards events into a bounded channel, dropping them when it is full.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<GameEvent>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(sender: Sender<GameEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: GameEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => debug!("Event channel full, dropping {event:?}"),
            Err(TrySendError::Disconnected(_)) => trace!("Event receiver gone"),
        }
    }
}

/// Creates a bounded sink/receiver pair.
#[must_use]
pub fn channel(capacity: usize) -> (ChannelSink, Receiver<GameEvent>) {
    let (sender, receiver) = bounded(capacity);
    (ChannelSink::new(sender), receiver)
}

/// Runs `handler` for every event on a background thread until the sink side
/// is dropped.
pub fn spawn_forwarder<F>(capacity: usize, mut handler: F) -> (ChannelSink, thread::JoinHandle<()>)
where
    F: FnMut(GameEvent) + Send + 'static,
{
    let (sink, receiver) = channel(capacity);
    let handle = thread::spawn(move || {
        while let Ok(event) = receiver.recv() {
            handler(event);
        }
        debug!("Event forwarder stopped");
    });
    (sink, handle)
}

#[derive(Resource)]
pub struct Notifier {
    sink: Box<dyn EventSink>,
}

impl Notifier {
    #[must_use]
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn emit(&self, event: GameEvent) {
        trace!("Emitting {event:?}");
        self.sink.emit(event);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}
