//! Player progress: coins, virtues, unlocked worlds and cosmetics
//!
//! The whole struct is one JSON blob stored under [`SAVE_KEY`]. Loading
//! never fails: a missing or corrupt blob yields the default progress.

use serde::{Deserialize, Deserializer, Serialize};

use crate::progression::{Hero, MAX_SKINS, MAX_WORLDS};
use super::store::{KeyValueStore, SaveError};

/// Store key of the progress blob
pub const SAVE_KEY: &str = "bible_heroes_save_v2";

/// Persistent player progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveData {
    #[serde(deserialize_with = "clamped_u32")]
    pub coins: u32,
    #[serde(deserialize_with = "clamped_u32")]
    pub virtues: u32,
    /// Highest world number the player may enter (1..=5)
    #[serde(deserialize_with = "clamped_u8")]
    pub worlds_unlocked: u8,
    pub selected_hero: Hero,
    /// One flag per skin; index 0 is always owned
    pub owned_skins: Vec<bool>,
    #[serde(deserialize_with = "clamped_usize")]
    pub selected_skin: usize,
    pub stats: LifetimeStats,
}

/// Counters accumulated across every attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifetimeStats {
    #[serde(deserialize_with = "clamped_u32")]
    pub scrolls_collected: u32,
    #[serde(deserialize_with = "clamped_u32")]
    pub hearts_collected: u32,
    pub play_seconds: f64,
}

// Numbers are read as i64 and clamped to the field's type; `sanitize`
// applies the game ranges afterwards.
fn clamped_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = i64::deserialize(deserializer)?;
    Ok(value.clamp(0, i64::from(u32::MAX)) as u32)
}

fn clamped_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = i64::deserialize(deserializer)?;
    Ok(value.clamp(0, i64::from(u8::MAX)) as u8)
}

fn clamped_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = i64::deserialize(deserializer)?;
    Ok(value.clamp(0, i64::from(u32::MAX)) as usize)
}

fn default_owned_skins() -> Vec<bool> {
    let mut skins = vec![false; MAX_SKINS];
    skins[0] = true;
    skins
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            coins: 0,
            virtues: 0,
            worlds_unlocked: 1,
            selected_hero: Hero::Theo,
            owned_skins: default_owned_skins(),
            selected_skin: 0,
            stats: LifetimeStats::default(),
        }
    }
}

impl SaveData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repair values a hand-edited or older blob may carry
    pub fn sanitize(&mut self) {
        if self.owned_skins.len() != MAX_SKINS {
            self.owned_skins = default_owned_skins();
        }
        self.owned_skins[0] = true;
        self.worlds_unlocked = self.worlds_unlocked.clamp(1, MAX_WORLDS);
        self.selected_skin = self.selected_skin.min(MAX_SKINS - 1);
        if !self.owned_skins[self.selected_skin] {
            self.selected_skin = 0;
        }
        if !self.stats.play_seconds.is_finite() || self.stats.play_seconds < 0.0 {
            self.stats.play_seconds = 0.0;
        }
    }

    /// Raise `worlds_unlocked` to `target`; never lowers it
    pub fn unlock_world(&mut self, target: u8) -> bool {
        let target = target.min(MAX_WORLDS);
        if target > self.worlds_unlocked {
            self.worlds_unlocked = target;
            true
        } else {
            false
        }
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    pub fn add_virtues(&mut self, amount: u32) {
        self.virtues = self.virtues.saturating_add(amount);
    }

    /// Deduct `price` if affordable
    pub fn spend_coins(&mut self, price: u32) -> bool {
        if self.coins < price {
            return false;
        }
        self.coins -= price;
        true
    }

    pub fn owns_skin(&self, index: usize) -> bool {
        self.owned_skins.get(index).copied().unwrap_or(false)
    }

    pub fn all_skins_owned(&self) -> bool {
        self.owned_skins.iter().all(|owned| *owned)
    }

    /// Skins bought beyond the free default
    pub fn purchased_skins(&self) -> usize {
        self.owned_skins.iter().skip(1).filter(|owned| **owned).count()
    }
}

/// Load progress from the store, falling back to defaults
pub fn load_save(store: &dyn KeyValueStore) -> SaveData {
    let json = match store.get(SAVE_KEY) {
        Ok(Some(json)) if !json.trim().is_empty() => json,
        Ok(_) => {
            log::info!("No save found, starting fresh");
            return SaveData::new();
        }
        Err(e) => {
            log::warn!("Failed to read save: {}, starting fresh", e);
            return SaveData::new();
        }
    };

    match serde_json::from_str::<SaveData>(&json) {
        Ok(mut data) => {
            data.sanitize();
            log::info!(
                "Save loaded: {} coins, {} virtues, {} worlds unlocked",
                data.coins,
                data.virtues,
                data.worlds_unlocked
            );
            data
        }
        Err(e) => {
            log::warn!("Failed to parse save: {}, starting fresh", e);
            SaveData::new()
        }
    }
}

/// Overwrite the stored progress
pub fn write_save(store: &mut dyn KeyValueStore, data: &SaveData) -> Result<(), SaveError> {
    let json = serde_json::to_string(data)?;
    store.set(SAVE_KEY, &json)?;
    log::debug!("Progress saved");
    Ok(())
}

/// Delete the stored progress
pub fn reset_save(store: &mut dyn KeyValueStore) -> Result<(), SaveError> {
    store.delete(SAVE_KEY)?;
    log::info!("Progress reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::MemoryStore;

    #[test]
    fn test_missing_save_gives_defaults() {
        let store = MemoryStore::new();
        let data = load_save(&store);
        assert_eq!(data, SaveData::default());
        assert_eq!(data.worlds_unlocked, 1);
        assert_eq!(data.owned_skins, vec![true, false, false]);
    }

    #[test]
    fn test_corrupt_save_gives_defaults() {
        let mut store = MemoryStore::new();
        store.set(SAVE_KEY, "{ not json").unwrap();
        assert_eq!(load_save(&store), SaveData::default());

        store.set(SAVE_KEY, "   ").unwrap();
        assert_eq!(load_save(&store), SaveData::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut store = MemoryStore::new();
        store
            .set(
                SAVE_KEY,
                r#"{"coins":12,"worldsUnlocked":9,"selectedHero":5,"ownedSkins":[false,true],"selectedSkin":2}"#,
            )
            .unwrap();

        let data = load_save(&store);
        assert_eq!(data.coins, 12);
        assert_eq!(data.worlds_unlocked, MAX_WORLDS);
        assert_eq!(data.selected_hero, Hero::Nina);
        assert_eq!(data.owned_skins, vec![true, false, false]);
        assert_eq!(data.selected_skin, 0);
    }

    #[test]
    fn test_oversized_world_count_keeps_other_fields() {
        let mut store = MemoryStore::new();
        store
            .set(SAVE_KEY, r#"{"coins":250,"virtues":7,"worldsUnlocked":300}"#)
            .unwrap();

        let data = load_save(&store);
        assert_eq!(data.coins, 250);
        assert_eq!(data.virtues, 7);
        assert_eq!(data.worlds_unlocked, MAX_WORLDS);
    }

    #[test]
    fn test_negative_values_clamp_to_zero() {
        let mut store = MemoryStore::new();
        store
            .set(
                SAVE_KEY,
                r#"{"coins":250,"virtues":7,"worldsUnlocked":4,"selectedSkin":-1}"#,
            )
            .unwrap();

        let data = load_save(&store);
        assert_eq!(data.coins, 250);
        assert_eq!(data.virtues, 7);
        assert_eq!(data.worlds_unlocked, 4);
        assert_eq!(data.selected_skin, 0);

        store
            .set(
                SAVE_KEY,
                r#"{"coins":-5,"virtues":3,"worldsUnlocked":0,"stats":{"scrollsCollected":-2,"heartsCollected":9}}"#,
            )
            .unwrap();

        let data = load_save(&store);
        assert_eq!(data.coins, 0);
        assert_eq!(data.virtues, 3);
        assert_eq!(data.worlds_unlocked, 1);
        assert_eq!(data.stats.scrolls_collected, 0);
        assert_eq!(data.stats.hearts_collected, 9);
    }

    #[test]
    fn test_first_skin_always_owned() {
        let mut store = MemoryStore::new();
        store
            .set(SAVE_KEY, r#"{"ownedSkins":[false,true,false],"selectedSkin":1}"#)
            .unwrap();

        let data = load_save(&store);
        assert!(data.owns_skin(0));
        assert_eq!(data.selected_skin, 1);
    }

    #[test]
    fn test_write_then_load() {
        let mut store = MemoryStore::new();
        let mut data = SaveData::new();
        data.add_coins(75);
        data.unlock_world(3);
        data.owned_skins[2] = true;
        data.selected_skin = 2;
        write_save(&mut store, &data).unwrap();

        assert_eq!(load_save(&store), data);

        reset_save(&mut store).unwrap();
        assert_eq!(load_save(&store), SaveData::default());
    }

    #[test]
    fn test_unlock_world_never_lowers() {
        let mut data = SaveData::new();
        assert!(data.unlock_world(3));
        assert!(!data.unlock_world(2));
        assert_eq!(data.worlds_unlocked, 3);
        assert!(!data.unlock_world(3));
        data.unlock_world(11);
        assert_eq!(data.worlds_unlocked, MAX_WORLDS);
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let json = serde_json::to_string(&SaveData::new()).unwrap();
        assert!(json.contains("\"worldsUnlocked\":1"));
        assert!(json.contains("\"ownedSkins\":[true,false,false]"));
    }
}
