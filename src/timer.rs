#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use log::trace;

use crate::config::TimerConfig;

/// Delayed work the session knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    /// Auto-places the current tile when the countdown runs out.
    AutoDrop,
    /// Ends the timer freeze started by selecting a power-up.
    Unfreeze,
    /// Periodic daily challenge date check.
    ChallengeRollover,
}

/// Identifies one scheduling of a task; a superseded handle is never fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub kind: TaskKind,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    handle: TaskHandle,
    due_ms: u64,
    period_ms: Option<u64>,
}

/// Cancellable delayed and periodic tasks on a virtual millisecond clock.
/// At most one task per kind is pending: scheduling a kind cancels the
/// previous one.
#[derive(Resource, Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_generation: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule_once(&mut self, kind: TaskKind, delay_ms: u64) -> TaskHandle {
        self.insert(kind, delay_ms, None)
    }

    pub fn schedule_repeating(&mut self, kind: TaskKind, period_ms: u64) -> TaskHandle {
        self.insert(kind, period_ms, Some(period_ms.max(1)))
    }

    fn insert(&mut self, kind: TaskKind, delay_ms: u64, period_ms: Option<u64>) -> TaskHandle {
        self.cancel(kind);
        self.next_generation += 1;
        let handle = TaskHandle {
            kind,
            generation: self.next_generation,
        };
        self.tasks.push(ScheduledTask {
            handle,
            due_ms: self.now_ms.saturating_add(delay_ms),
            period_ms,
        });
        trace!("Scheduled {kind:?} in {delay_ms}ms");
        handle
    }

    /// Returns whether a pending task was removed.
    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.handle.kind != kind);
        before != self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    #[must_use]
    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|task| task.handle.kind == kind)
    }

    #[must_use]
    pub fn remaining_ms(&self, kind: TaskKind) -> Option<u64> {
        self.tasks
            .iter()
            .find(|task| task.handle.kind == kind)
            .map(|task| task.due_ms.saturating_sub(self.now_ms))
    }

    /// Pops the earliest task due at or before `until_ms`, moving the clock to
    /// its due time. Periodic tasks fire at most once per call window and are
    /// re-armed at their first period boundary past `until_ms`.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TaskHandle> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due_ms <= until_ms)
            .min_by_key(|(_, task)| (task.due_ms, task.handle.generation))
            .map(|(index, _)| index)?;

        let task = self.tasks.remove(index);
        self.now_ms = self.now_ms.max(task.due_ms);
        if let Some(period) = task.period_ms {
            // Missed periods collapse into this one firing
            let next_due = task.due_ms.saturating_add(period);
            let next_due = if next_due <= until_ms {
                let skipped = (until_ms - task.due_ms) / period;
                task.due_ms.saturating_add(skipped.saturating_add(1).saturating_mul(period))
            } else {
                next_due
            };
            // A period that cannot land after the clock end is dropped
            if next_due > until_ms {
                self.tasks.push(ScheduledTask {
                    due_ms: next_due,
                    ..task
                });
            }
        }
        Some(task.handle)
    }

    /// Moves the clock forward without firing anything.
    pub fn settle_at(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

/// Countdown state for forced placement.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct DropTimer {
    pub drop_ms: u64,
    pub time_remaining_ms: u64,
    pub frozen: bool,
    pub paused: bool,
    config: TimerConfig,
}

impl Default for DropTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl DropTimer {
    #[must_use]
    pub fn new(config: TimerConfig) -> Self {
        Self {
            drop_ms: config.initial_drop_ms,
            time_remaining_ms: config.initial_drop_ms,
            frozen: false,
            paused: false,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Shortens the budget on every `tiles_per_step`th placed tile.
    pub fn on_tile_placed(&mut self, tiles_placed: u32) {
        let step = self.config.tiles_per_step.max(1);
        if tiles_placed > 0 && tiles_placed % step == 0 {
            self.drop_ms = self
                .drop_ms
                .saturating_sub(self.config.drop_step_ms)
                .max(self.config.min_drop_ms);
            trace!("Drop budget now {}ms", self.drop_ms);
        }
    }

    /// Budget granted after a revive.
    pub fn grant_revive_grace(&mut self) {
        self.drop_ms = self.config.revive_drop_ms;
        self.time_remaining_ms = self.config.revive_drop_ms;
    }
}
