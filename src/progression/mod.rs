//! Progression: worlds, rewards, heroes and skins

pub mod shop;
pub mod worlds;

pub use shop::{Hero, MAX_SKINS, PurchaseOutcome, SkinSelection, clamp_skin, cosmetic_color, skin_name};
pub use worlds::{CoinReward, MAX_WORLDS, Reward, Virtue, World};
