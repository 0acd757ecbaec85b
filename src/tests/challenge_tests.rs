#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};
    use std::sync::{Arc, Mutex};

    use crate::GameSession;
    use crate::challenge::{Calendar, ChallengeGoal, DailyChallenge};
    use crate::events::{self, GameEvent};
    use crate::store::{COINS_KEY, DAILY_CHALLENGE_KEY, MemoryStore};
    use crate::systems::{CHALLENGE_ROLLOVER_MS, challenge_for};
    use crate::tests::test_utils::{
        SharedStore, create_session_with_store, drain, grid_with, place, seeded_config, set_grid,
        test_date,
    };

    fn challenge(kind: ChallengeGoal, goal: u32, reward_coins: u32) -> DailyChallenge {
        DailyChallenge {
            goal,
            progress: 0,
            kind,
            description: String::new(),
            reward_coins,
            completed: false,
            date: test_date(),
        }
    }

    #[test]
    fn test_generate_picks_from_table() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..20 {
            let challenge = DailyChallenge::generate(test_date(), &mut rng);
            assert!(matches!(challenge.goal, 30 | 50 | 75 | 100 | 1_000));
            assert_eq!(challenge.progress, 0);
            assert!(!challenge.completed);
            assert!(challenge.is_for(test_date()));
            assert_eq!(
                challenge.reward_label(),
                format!("+{} coins", challenge.reward_coins)
            );
        }
    }

    #[test]
    fn test_same_day_same_challenge() {
        assert_eq!(challenge_for(test_date()), challenge_for(test_date()));
    }

    #[test]
    fn test_progress_caps_and_pays_once() {
        let mut daily = challenge(ChallengeGoal::ClearTiles, 10, 20);

        assert_eq!(daily.record(4, 400), None);
        assert_eq!(daily.progress, 4);
        assert_eq!(daily.record(9, 900), Some(20));
        assert_eq!(daily.progress, 10);
        assert!(daily.completed);
        assert_eq!(daily.record(5, 500), None);
        assert_eq!(daily.progress, 10);
    }

    #[test]
    fn test_score_challenge_counts_points() {
        let mut daily = challenge(ChallengeGoal::ScorePoints, 1_000, 35);

        assert_eq!(daily.record(3, 300), None);
        assert_eq!(daily.progress, 300);
        assert_eq!(daily.record(7, 1_400), Some(35));
    }

    #[test]
    fn test_completing_challenge_pays_coins() {
        let store = SharedStore::new();
        let mut session = create_session_with_store(&store);
        session
            .world
            .insert_resource(challenge(ChallengeGoal::ClearTiles, 3, 20));
        set_grid(&mut session, grid_with(&[(6, 0, 7), (6, 1, 7)]));

        place(&mut session, 2, 7);

        assert!(session.daily_challenge().completed);
        assert_eq!(session.wallet().coins, 20);
        assert_eq!(store.value(COINS_KEY), Some(serde_json::json!(20)));
        let stored: DailyChallenge = serde_json::from_value(
            store
                .value(DAILY_CHALLENGE_KEY)
                .expect("challenge persisted"),
        )
        .expect("challenge decodes");
        assert!(stored.completed);
    }

    #[test]
    fn test_completion_event() {
        let (sink, receiver) = events::channel(64);
        let mut session = GameSession::with_calendar(
            seeded_config(),
            Box::new(MemoryStore::new()),
            Box::new(sink),
            Calendar::fixed(test_date()),
        );
        session
            .world
            .insert_resource(challenge(ChallengeGoal::ScorePoints, 300, 35));
        set_grid(&mut session, grid_with(&[(6, 0, 7), (6, 1, 7)]));

        place(&mut session, 2, 7);

        assert!(drain(&receiver).contains(&GameEvent::ChallengeCompleted { reward_coins: 35 }));
    }

    #[test]
    fn test_stored_challenge_is_resumed_today() {
        let store = SharedStore::new();
        let mut saved = challenge(ChallengeGoal::ClearTiles, 75, 30);
        saved.progress = 40;
        store.put(
            DAILY_CHALLENGE_KEY,
            serde_json::to_value(&saved).expect("challenge encodes"),
        );

        let session = GameSession::with_calendar(
            seeded_config(),
            Box::new(store.clone()),
            Box::new(events::NullSink),
            Calendar::fixed(test_date()),
        );

        assert_eq!(*session.daily_challenge(), saved);
    }

    #[test]
    fn test_stale_challenge_is_replaced() {
        let store = SharedStore::new();
        let mut stale = challenge(ChallengeGoal::ClearTiles, 75, 30);
        stale.date = NaiveDate::from_ymd_opt(2025, 3, 13).expect("valid date");
        stale.completed = true;
        store.put(
            DAILY_CHALLENGE_KEY,
            serde_json::to_value(&stale).expect("challenge encodes"),
        );

        let session = GameSession::with_calendar(
            seeded_config(),
            Box::new(store.clone()),
            Box::new(events::NullSink),
            Calendar::fixed(test_date()),
        );

        assert_eq!(*session.daily_challenge(), challenge_for(test_date()));
        assert!(!session.daily_challenge().completed);
    }

    #[test]
    fn test_refresh_daily_challenge() {
        let store = SharedStore::new();
        let mut session = create_session_with_store(&store);
        let tomorrow = test_date() + Days::new(1);

        assert!(!session.refresh_daily_challenge(test_date()));
        assert!(session.refresh_daily_challenge(tomorrow));
        assert!(session.daily_challenge().is_for(tomorrow));
        assert_eq!(
            store.value(DAILY_CHALLENGE_KEY),
            Some(serde_json::to_value(challenge_for(tomorrow)).expect("challenge encodes"))
        );
    }

    #[test]
    fn test_rollover_follows_the_calendar() {
        let today = Arc::new(Mutex::new(test_date()));
        let clock = Arc::clone(&today);
        let mut session = GameSession::with_calendar(
            seeded_config(),
            Box::new(MemoryStore::new()),
            Box::new(events::NullSink),
            Calendar::new(move || *clock.lock().expect("date lock")),
        );
        assert!(session.daily_challenge().is_for(test_date()));

        let tomorrow = test_date() + Days::new(1);
        *today.lock().expect("date lock") = tomorrow;
        session.tick(CHALLENGE_ROLLOVER_MS - 1);
        assert!(session.daily_challenge().is_for(test_date()));

        session.tick(1);
        assert!(session.daily_challenge().is_for(tomorrow));
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(challenge(ChallengeGoal::ClearTiles, 50, 20))
            .expect("challenge encodes");

        assert_eq!(value["rewardCoins"], serde_json::json!(20));
        assert_eq!(value["kind"], serde_json::json!("clear_tiles"));
        assert_eq!(value["date"], serde_json::json!("2025-03-14"));
    }
}
