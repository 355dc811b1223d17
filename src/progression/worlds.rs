//! The five worlds: progression gates and completion rewards

use serde::{Deserialize, Serialize};

use crate::data::EconomySettings;

/// Number of worlds in the game
pub const MAX_WORLDS: u8 = 5;

/// One of the five sequential mini-games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum World {
    /// World 1: Noah and the Ark (runner)
    Noah,
    /// World 2: David and Goliath (boss)
    David,
    /// World 3: Jonah (3-step ordering puzzle)
    Jonah,
    /// World 4: Moses and the Red Sea (4-step ordering puzzle)
    Moses,
    /// World 5: Jesus (heart collection)
    Jesus,
}

/// Named virtues a world teaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Virtue {
    Obedience,
    Courage,
    Faith,
    Love,
    Kindness,
}

impl Virtue {
    pub const ALL: [Virtue; 5] = [
        Virtue::Obedience,
        Virtue::Courage,
        Virtue::Faith,
        Virtue::Love,
        Virtue::Kindness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Virtue::Obedience => "Obedience",
            Virtue::Courage => "Courage",
            Virtue::Faith => "Faith",
            Virtue::Love => "Love",
            Virtue::Kindness => "Kindness",
        }
    }
}

/// How many coins a completion pays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinReward {
    /// A fixed amount
    Fixed(u32),
    /// One coin per scroll collected, clamped to the economy's per-level bounds
    PerScroll,
}

/// Everything a completed world grants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub coins: CoinReward,
    pub virtues: u32,
    /// `worlds_unlocked` is raised to at least this value
    pub unlocks: Option<u8>,
}

impl World {
    pub const ALL: [World; 5] = [World::Noah, World::David, World::Jonah, World::Moses, World::Jesus];

    /// 1-based world number
    pub fn number(&self) -> u8 {
        match self {
            World::Noah => 1,
            World::David => 2,
            World::Jonah => 3,
            World::Moses => 4,
            World::Jesus => 5,
        }
    }

    /// World from its 1-based number
    pub fn from_number(number: u8) -> Option<World> {
        World::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            World::Noah => "World 1 - Noah and the Ark",
            World::David => "World 2 - David and Goliath",
            World::Jonah => "World 3 - Jonah",
            World::Moses => "World 4 - Moses",
            World::Jesus => "World 5 - Jesus",
        }
    }

    /// Minimum `worlds_unlocked` needed to enter
    pub fn required_unlocked(&self) -> u8 {
        self.number()
    }

    /// Whether a save with `worlds_unlocked` may enter this world
    pub fn is_open(&self, worlds_unlocked: u8) -> bool {
        worlds_unlocked >= self.required_unlocked()
    }

    pub fn reward(&self) -> Reward {
        match self {
            World::Noah => Reward { coins: CoinReward::PerScroll, virtues: 1, unlocks: Some(2) },
            World::David => Reward { coins: CoinReward::Fixed(80), virtues: 2, unlocks: Some(3) },
            World::Jonah => Reward { coins: CoinReward::Fixed(70), virtues: 2, unlocks: Some(4) },
            World::Moses => Reward { coins: CoinReward::Fixed(90), virtues: 2, unlocks: Some(5) },
            World::Jesus => Reward { coins: CoinReward::Fixed(100), virtues: 2, unlocks: None },
        }
    }

    /// Virtues named on this world's victory screen
    pub fn virtues(&self) -> &'static [Virtue] {
        match self {
            World::Noah => &[Virtue::Obedience],
            World::David => &[Virtue::Courage, Virtue::Faith],
            World::Jonah => &[Virtue::Obedience],
            World::Moses => &[Virtue::Faith],
            World::Jesus => &[Virtue::Love, Virtue::Kindness],
        }
    }
}

impl Reward {
    /// Coins paid out, given the scrolls collected during the attempt
    pub fn coins_for(&self, scrolls: u32, economy: &EconomySettings) -> u32 {
        let scale = |amount: u32| (amount as f32 * economy.coin_multiplier.max(0.0)).round() as u32;
        match self.coins {
            CoinReward::Fixed(amount) => scale(amount),
            CoinReward::PerScroll => scale(scrolls)
                .clamp(economy.min_coins_per_level, economy.max_coins_per_level.max(economy.min_coins_per_level)),
        }
    }
}
