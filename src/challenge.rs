use bevy_ecs::prelude::Resource;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

/// What a challenge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeGoal {
    ClearTiles,
    ScorePoints,
}

struct ChallengeTemplate {
    goal: u32,
    kind: ChallengeGoal,
    description: &'static str,
    reward_coins: u32,
}

const CHALLENGES: &[ChallengeTemplate] = &[
    ChallengeTemplate {
        goal: 50,
        kind: ChallengeGoal::ClearTiles,
        description: "Clear 50 tiles today",
        reward_coins: 20,
    },
    ChallengeTemplate {
        goal: 75,
        kind: ChallengeGoal::ClearTiles,
        description: "Clear 75 tiles today",
        reward_coins: 30,
    },
    ChallengeTemplate {
        goal: 100,
        kind: ChallengeGoal::ClearTiles,
        description: "Clear 100 tiles today",
        reward_coins: 40,
    },
    ChallengeTemplate {
        goal: 30,
        kind: ChallengeGoal::ClearTiles,
        description: "Clear 30 tiles in one session",
        reward_coins: 25,
    },
    ChallengeTemplate {
        goal: 1000,
        kind: ChallengeGoal::ScorePoints,
        description: "Score 1000 points today",
        reward_coins: 35,
    },
];

#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub goal: u32,
    pub progress: u32,
    pub kind: ChallengeGoal,
    pub description: String,
    pub reward_coins: u32,
    pub completed: bool,
    pub date: NaiveDate,
}

impl DailyChallenge {
    /// Picks one of the fixed challenges for `date`.
    #[must_use]
    pub fn generate(date: NaiveDate, rng: &mut fastrand::Rng) -> Self {
        let template = &CHALLENGES[rng.usize(..CHALLENGES.len())];
        Self {
            goal: template.goal,
            progress: 0,
            kind: template.kind,
            description: template.description.to_owned(),
            reward_coins: template.reward_coins,
            completed: false,
            date,
        }
    }

    #[must_use]
    pub fn reward_label(&self) -> String {
        format!("+{} coins", self.reward_coins)
    }

    #[must_use]
    pub fn is_for(&self, date: NaiveDate) -> bool {
        self.date == date
    }

    /// Adds the progress a matching placement earned. Returns the reward when
    /// this call completes the challenge; a completed challenge pays once.
    pub fn record(&mut self, tiles_cleared: u32, score_gained: u32) -> Option<u32> {
        if self.completed {
            return None;
        }
        let increment = match self.kind {
            ChallengeGoal::ClearTiles => tiles_cleared,
            ChallengeGoal::ScorePoints => score_gained,
        };
        self.progress = self.progress.saturating_add(increment).min(self.goal);
        if self.progress >= self.goal {
            self.completed = true;
            info!(
                "Daily challenge completed, earned {} coins",
                self.reward_coins
            );
            return Some(self.reward_coins);
        }
        None
    }
}

/// Source of the current calendar date.
#[derive(Resource)]
pub struct Calendar {
    today: Box<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl Calendar {
    #[must_use]
    pub fn new(today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        Self {
            today: Box::new(today),
        }
    }

    #[must_use]
    pub fn fixed(date: NaiveDate) -> Self {
        Self::new(move || date)
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(|| chrono::Local::now().date_naive())
    }
}
