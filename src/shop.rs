#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use log::{debug, info};
use std::fmt;

use crate::config::Config;
use crate::events::{GameEvent, Notifier};
use crate::powerups::{PowerUpKind, PowerUps};
use crate::scoring::Scoreboard;
use crate::store::{COINS_KEY, Persistence};

/// Coin balance plus what this game has bought and earned.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    pub coins: u32,
    /// Coins paid out by this game's game over.
    pub coins_earned: u32,
    awarded: bool,
    purchased: Vec<PowerUpKind>,
}

impl Wallet {
    #[must_use]
    pub fn with_coins(coins: u32) -> Self {
        Self {
            coins,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_purchased(&self, kind: PowerUpKind) -> bool {
        self.purchased.contains(&kind)
    }

    pub fn deposit(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Forgets per-game purchases and awards; the balance carries over.
    pub fn start_new_game(&mut self) {
        self.coins_earned = 0;
        self.awarded = false;
        self.purchased.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseError {
    AlreadyPurchased(PowerUpKind),
    InsufficientCoins { price: u32, coins: u32 },
    NotPurchased(PowerUpKind),
    AlreadyUsed(PowerUpKind),
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseError::AlreadyPurchased(kind) => {
                write!(f, "{kind} was already bought this game")
            }
            PurchaseError::InsufficientCoins { price, coins } => {
                write!(f, "need {price} coins, have {coins}")
            }
            PurchaseError::NotPurchased(kind) => write!(f, "{kind} was not bought this game"),
            PurchaseError::AlreadyUsed(kind) => write!(f, "{kind} has already been used"),
        }
    }
}

impl std::error::Error for PurchaseError {}

fn persist_coins(world: &mut World) {
    let coins = world.resource::<Wallet>().coins;
    world.resource_mut::<Persistence>().save(COINS_KEY, &coins);
}

/// Buys one unit of `kind`. Returns the remaining balance.
pub fn purchase_power_up(world: &mut World, kind: PowerUpKind) -> Result<u32, PurchaseError> {
    let price = world.resource::<Config>().economy.price(kind);
    {
        let mut wallet = world.resource_mut::<Wallet>();
        if wallet.has_purchased(kind) {
            return Err(PurchaseError::AlreadyPurchased(kind));
        }
        if wallet.coins < price {
            debug!("Cannot afford {kind}: {} < {price}", wallet.coins);
            return Err(PurchaseError::InsufficientCoins {
                price,
                coins: wallet.coins,
            });
        }
        wallet.coins -= price;
        wallet.purchased.push(kind);
    }
    world.resource_mut::<PowerUps>().add(kind, 1);
    persist_coins(world);

    let coins = world.resource::<Wallet>().coins;
    info!("Bought {kind} for {price} coins, {coins} left");
    Ok(coins)
}

/// Returns an unused purchase. Returns the new balance.
pub fn refund_power_up(world: &mut World, kind: PowerUpKind) -> Result<u32, PurchaseError> {
    if !world.resource::<Wallet>().has_purchased(kind) {
        return Err(PurchaseError::NotPurchased(kind));
    }
    if !world.resource_mut::<PowerUps>().try_consume(kind) {
        return Err(PurchaseError::AlreadyUsed(kind));
    }

    let price = world.resource::<Config>().economy.price(kind);
    {
        let mut wallet = world.resource_mut::<Wallet>();
        wallet.purchased.retain(|bought| *bought != kind);
        wallet.deposit(price);
    }
    persist_coins(world);

    let coins = world.resource::<Wallet>().coins;
    info!("Refunded {kind}, {coins} coins");
    Ok(coins)
}

/// Pays the game-over award once per game. Returns the amount paid.
pub fn award_game_over_coins(world: &mut World) -> Option<u32> {
    if world.resource::<Wallet>().awarded {
        return None;
    }

    let score = world.resource::<Scoreboard>().score;
    let amount = world.resource::<Config>().economy.game_over_award(score);
    let total = {
        let mut wallet = world.resource_mut::<Wallet>();
        wallet.awarded = true;
        wallet.coins_earned = amount;
        wallet.deposit(amount);
        wallet.coins
    };
    persist_coins(world);

    info!("Awarded {amount} coins for {score} points");
    world
        .resource::<Notifier>()
        .emit(GameEvent::CoinsAwarded { amount, total });
    Some(amount)
}
