#[cfg(test)]
mod tests {
    use crate::components::Phase;
    use crate::powerups::PowerUpKind;
    use crate::shop::{PurchaseError, Wallet};
    use crate::store::COINS_KEY;
    use crate::tests::test_utils::{
        SharedStore, create_session_with_store, create_test_session, grid_with_heights, set_grid,
    };
    use serde_json::json;

    fn funded_session(coins: u32) -> (crate::GameSession, SharedStore) {
        let store = SharedStore::new();
        store.put(COINS_KEY, json!(coins));
        (create_session_with_store(&store), store)
    }

    #[test]
    fn test_purchase_deducts_price() {
        let (mut session, store) = funded_session(100);

        assert_eq!(session.purchase_power_up(PowerUpKind::Bomb), Ok(50));
        assert_eq!(session.power_ups().count(PowerUpKind::Bomb), 1);
        assert_eq!(store.value(COINS_KEY), Some(json!(50)));

        assert_eq!(session.purchase_power_up(PowerUpKind::Row), Ok(10));
        assert_eq!(session.wallet().coins, 10);
    }

    #[test]
    fn test_one_purchase_per_kind_per_game() {
        let (mut session, _store) = funded_session(200);
        session
            .purchase_power_up(PowerUpKind::Swap)
            .expect("affordable");

        assert_eq!(
            session.purchase_power_up(PowerUpKind::Swap),
            Err(PurchaseError::AlreadyPurchased(PowerUpKind::Swap))
        );
        assert_eq!(session.wallet().coins, 170);

        session.restart();
        assert_eq!(session.purchase_power_up(PowerUpKind::Swap), Ok(140));
    }

    #[test]
    fn test_insufficient_coins() {
        let (mut session, _store) = funded_session(35);

        assert_eq!(
            session.purchase_power_up(PowerUpKind::Row),
            Err(PurchaseError::InsufficientCoins {
                price: 40,
                coins: 35
            })
        );
        assert_eq!(session.power_ups().count(PowerUpKind::Row), 0);
        assert_eq!(session.purchase_power_up(PowerUpKind::Swap), Ok(5));
    }

    #[test]
    fn test_refund_unused_purchase() {
        let (mut session, store) = funded_session(60);
        session
            .purchase_power_up(PowerUpKind::Bomb)
            .expect("affordable");

        assert_eq!(session.refund_power_up(PowerUpKind::Bomb), Ok(60));
        assert_eq!(session.power_ups().count(PowerUpKind::Bomb), 0);
        assert_eq!(store.value(COINS_KEY), Some(json!(60)));
        assert_eq!(
            session.refund_power_up(PowerUpKind::Bomb),
            Err(PurchaseError::NotPurchased(PowerUpKind::Bomb))
        );

        // A refunded kind can be bought again
        assert_eq!(session.purchase_power_up(PowerUpKind::Bomb), Ok(10));
    }

    #[test]
    fn test_refund_after_use() {
        let (mut session, _store) = funded_session(30);
        session
            .purchase_power_up(PowerUpKind::Swap)
            .expect("affordable");
        session
            .select_power_up(PowerUpKind::Swap)
            .expect("swap is stocked");

        assert_eq!(
            session.refund_power_up(PowerUpKind::Swap),
            Err(PurchaseError::AlreadyUsed(PowerUpKind::Swap))
        );
        assert_eq!(session.wallet().coins, 0);
    }

    #[test]
    fn test_bought_bomb_can_be_used() {
        let (mut session, _store) = funded_session(50);
        set_grid(&mut session, grid_with_heights([2, 2, 2, 0, 0, 0]));
        session
            .purchase_power_up(PowerUpKind::Bomb)
            .expect("affordable");
        session
            .select_power_up(PowerUpKind::Bomb)
            .expect("bomb is stocked");
        session.place_tile(1).expect("bomb applied");

        assert_eq!(session.power_ups().count(PowerUpKind::Bomb), 0);
        assert_eq!(session.grid().occupied(), 3);
        assert_eq!(session.phase(), Phase::AwaitingFirstPlacement);
    }

    #[test]
    fn test_wallet_new_game_keeps_balance() {
        let mut wallet = Wallet::with_coins(90);
        wallet.coins_earned = 12;
        wallet.start_new_game();

        assert_eq!(wallet.coins, 90);
        assert_eq!(wallet.coins_earned, 0);
        assert!(!wallet.has_purchased(PowerUpKind::Bomb));
    }

    #[test]
    fn test_purchase_error_messages() {
        assert_eq!(
            PurchaseError::InsufficientCoins {
                price: 50,
                coins: 10
            }
            .to_string(),
            "need 50 coins, have 10"
        );
        assert_eq!(
            PurchaseError::AlreadyUsed(PowerUpKind::Row).to_string(),
            "row has already been used"
        );
    }

    #[test]
    fn test_new_player_has_no_coins() {
        let mut session = create_test_session();
        assert_eq!(session.wallet().coins, 0);
        assert!(session.purchase_power_up(PowerUpKind::Swap).is_err());
    }
}
