//! Heroes, skins and the skin shop

use serde::{Deserialize, Serialize};

/// Number of skins, including the free default at index 0
pub const MAX_SKINS: usize = 3;

/// Playable hero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum Hero {
    #[default]
    Theo,
    Lia,
    Nina,
}

impl Hero {
    pub const ALL: [Hero; 3] = [Hero::Theo, Hero::Lia, Hero::Nina];

    /// Hero for an index, clamping out-of-range values
    pub fn from_index(index: i64) -> Hero {
        Hero::ALL[index.clamp(0, 2) as usize]
    }

    pub fn index(&self) -> usize {
        match self {
            Hero::Theo => 0,
            Hero::Lia => 1,
            Hero::Nina => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Hero::Theo => "Theo",
            Hero::Lia => "Lia",
            Hero::Nina => "Nina",
        }
    }

    /// Base body colour
    pub fn base_color(&self) -> (u8, u8, u8) {
        match self {
            Hero::Theo => (242, 242, 242),
            Hero::Lia => (242, 230, 153),
            Hero::Nina => (204, 242, 242),
        }
    }
}

impl From<i64> for Hero {
    fn from(index: i64) -> Self {
        Hero::from_index(index)
    }
}

impl From<Hero> for u8 {
    fn from(hero: Hero) -> Self {
        hero.index() as u8
    }
}

/// Display name of a skin slot
pub fn skin_name(index: usize) -> &'static str {
    match index {
        0 => "Basic",
        1 => "Blue",
        _ => "Purple",
    }
}

/// Tint a skin applies over the hero's base colour
pub fn skin_tint(index: usize) -> (u8, u8, u8) {
    match index {
        0 => (255, 255, 255),
        1 => (140, 217, 255),
        _ => (191, 166, 255),
    }
}

/// Clamp a requested skin index into the catalogue
pub fn clamp_skin(index: i64) -> usize {
    index.clamp(0, MAX_SKINS as i64 - 1) as usize
}

/// Final avatar colour for a hero wearing a skin
pub fn cosmetic_color(hero: Hero, skin: usize) -> (u8, u8, u8) {
    let (br, bg, bb) = hero.base_color();
    let (tr, tg, tb) = skin_tint(skin);
    let mul = |a: u8, b: u8| ((a as u16 * b as u16) / 255) as u8;
    (mul(br, tr), mul(bg, tg), mul(bb, tb))
}

/// Result of trying to buy a skin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased { index: usize, price: u32 },
    AlreadyOwned { index: usize },
    InsufficientCoins { index: usize, price: u32 },
}

/// Result of trying to wear a skin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinSelection {
    Selected { index: usize },
    Locked { index: usize },
}
