//! Achievements ledger
//!
//! Tracks which achievements are unlocked and when. Persisted separately
//! from the progress blob as a map of identifier to record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::progression::{Virtue, World};
use super::save_data::SaveData;
use super::store::{KeyValueStore, SaveError};

/// Store key of the achievements blob
pub const ACHIEVEMENTS_KEY: &str = "bible_heroes_achievements";

/// Playtime needed for [`AchievementId::PlayFor1Hour`]
const ONE_HOUR_SECONDS: f64 = 3600.0;

/// Every achievement in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AchievementId {
    // Progression
    CompleteWorld1,
    CompleteWorld2,
    CompleteWorld3,
    CompleteWorld4,
    CompleteWorld5,
    CompleteAllWorlds,
    // Collection
    Collect100Coins,
    Collect500Coins,
    Collect1000Coins,
    Collect50Scrolls,
    Collect100Hearts,
    // Virtues
    Earn10Virtues,
    Earn25Virtues,
    EarnAllVirtues,
    // Boss
    DefeatGoliathPerfect,
    DefeatGoliathFast,
    // Runner
    RunnerNoHits,
    RunnerPerfect,
    // Cosmetics
    UnlockAllSkins,
    BuyFirstSkin,
    // Special
    PlayFor1Hour,
    FirstVictory,
}

impl AchievementId {
    pub const ALL: [AchievementId; 22] = [
        AchievementId::CompleteWorld1,
        AchievementId::CompleteWorld2,
        AchievementId::CompleteWorld3,
        AchievementId::CompleteWorld4,
        AchievementId::CompleteWorld5,
        AchievementId::CompleteAllWorlds,
        AchievementId::Collect100Coins,
        AchievementId::Collect500Coins,
        AchievementId::Collect1000Coins,
        AchievementId::Collect50Scrolls,
        AchievementId::Collect100Hearts,
        AchievementId::Earn10Virtues,
        AchievementId::Earn25Virtues,
        AchievementId::EarnAllVirtues,
        AchievementId::DefeatGoliathPerfect,
        AchievementId::DefeatGoliathFast,
        AchievementId::RunnerNoHits,
        AchievementId::RunnerPerfect,
        AchievementId::UnlockAllSkins,
        AchievementId::BuyFirstSkin,
        AchievementId::PlayFor1Hour,
        AchievementId::FirstVictory,
    ];

    /// Completion achievement of a world
    pub fn for_world(world: World) -> AchievementId {
        match world {
            World::Noah => AchievementId::CompleteWorld1,
            World::David => AchievementId::CompleteWorld2,
            World::Jonah => AchievementId::CompleteWorld3,
            World::Moses => AchievementId::CompleteWorld4,
            World::Jesus => AchievementId::CompleteWorld5,
        }
    }

    pub fn definition(&self) -> Achievement {
        let (name, description, coin_reward) = match self {
            AchievementId::CompleteWorld1 => ("Ark Survivor", "Complete World 1 - Noah", 50),
            AchievementId::CompleteWorld2 => ("Giant Slayer", "Complete World 2 - David and Goliath", 75),
            AchievementId::CompleteWorld3 => ("The Great Fish", "Complete World 3 - Jonah", 75),
            AchievementId::CompleteWorld4 => ("Miracle at Sea", "Complete World 4 - Moses", 100),
            AchievementId::CompleteWorld5 => ("Love and Kindness", "Complete World 5 - Jesus", 100),
            AchievementId::CompleteAllWorlds => ("Bible Hero", "Complete all 5 worlds", 250),
            AchievementId::Collect100Coins => ("Beginner Collector", "Hold 100 coins", 20),
            AchievementId::Collect500Coins => ("Seasoned Collector", "Hold 500 coins", 50),
            AchievementId::Collect1000Coins => ("Master Collector", "Hold 1000 coins", 100),
            AchievementId::Collect50Scrolls => ("Scholar", "Collect 50 scrolls", 40),
            AchievementId::Collect100Hearts => ("Full Heart", "Collect 100 hearts", 60),
            AchievementId::Earn10Virtues => ("Virtuous", "Earn 10 virtues", 50),
            AchievementId::Earn25Virtues => ("Truly Virtuous", "Earn 25 virtues", 100),
            AchievementId::EarnAllVirtues => ("Holy of Holies", "Learn every named virtue", 200),
            AchievementId::DefeatGoliathPerfect => ("Perfect Aim", "Defeat Goliath without missing a throw", 150),
            AchievementId::DefeatGoliathFast => ("Swift Faith", "Defeat Goliath in under 30 seconds", 120),
            AchievementId::RunnerNoHits => ("Untouchable", "Finish a run without crashing", 75),
            AchievementId::RunnerPerfect => ("Perfect Run", "Collect every item in a run", 100),
            AchievementId::UnlockAllSkins => ("Fashionista", "Unlock every skin", 100),
            AchievementId::BuyFirstSkin => ("First Purchase", "Buy your first skin", 30),
            AchievementId::PlayFor1Hour => ("Dedicated", "Play for one hour in total", 80),
            AchievementId::FirstVictory => ("First Victory", "Complete your first level", 50),
        };
        Achievement { id: *self, name, description, coin_reward }
    }
}

/// Achievement definition
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub coin_reward: u32,
}

/// Get all achievement definitions
pub fn all_achievements() -> Vec<Achievement> {
    AchievementId::ALL.iter().map(|id| id.definition()).collect()
}

/// Persisted state of one achievement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub unlocked: bool,
    pub timestamp: String,
}

/// Details of a won boss encounter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossVictory {
    pub misses: u32,
    pub elapsed: f32,
}

/// Details of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunVictory {
    pub missed_collectibles: u32,
}

/// The achievements ledger
#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    records: BTreeMap<AchievementId, AchievementRecord>,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger, ignoring unreadable blobs and unknown identifiers
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let json = match store.get(ACHIEVEMENTS_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return Self::new(),
            Err(e) => {
                log::warn!("Failed to read achievements: {}", e);
                return Self::new();
            }
        };

        let raw: BTreeMap<String, AchievementRecord> = match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to parse achievements: {}", e);
                return Self::new();
            }
        };

        let mut records = BTreeMap::new();
        for (key, record) in raw {
            match serde_json::from_value::<AchievementId>(serde_json::Value::String(key.clone())) {
                Ok(id) => {
                    records.insert(id, record);
                }
                Err(_) => log::warn!("Ignoring unknown achievement '{}'", key),
            }
        }

        let tracker = Self { records };
        log::info!("Achievements loaded: {} unlocked", tracker.unlocked().len());
        tracker
    }

    /// Overwrite the stored ledger
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), SaveError> {
        let json = serde_json::to_string(&self.records)?;
        store.set(ACHIEVEMENTS_KEY, &json)
    }

    /// Unlock an achievement, returns true only the first time
    pub fn unlock(&mut self, id: AchievementId) -> bool {
        let record = self.records.entry(id).or_default();
        if record.unlocked {
            return false;
        }
        record.unlocked = true;
        record.timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        log::info!("Achievement unlocked: {}", id.definition().name);
        true
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.records.get(&id).is_some_and(|r| r.unlocked)
    }

    pub fn record(&self, id: AchievementId) -> Option<&AchievementRecord> {
        self.records.get(&id)
    }

    pub fn unlocked(&self) -> Vec<AchievementId> {
        AchievementId::ALL.into_iter().filter(|id| self.is_unlocked(*id)).collect()
    }

    pub fn locked(&self) -> Vec<AchievementId> {
        AchievementId::ALL.into_iter().filter(|id| !self.is_unlocked(*id)).collect()
    }

    /// Fraction of achievements unlocked
    pub fn progress(&self) -> f32 {
        self.unlocked().len() as f32 / AchievementId::ALL.len() as f32
    }

    /// Sum of coin rewards of unlocked achievements
    pub fn total_coin_rewards(&self) -> u32 {
        self.unlocked().iter().map(|id| id.definition().coin_reward).sum()
    }

    /// Record a completed world, returns newly unlocked achievements
    pub fn record_world_complete(&mut self, world: World) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        self.try_unlock(AchievementId::FirstVictory, &mut unlocked);
        self.try_unlock(AchievementId::for_world(world), &mut unlocked);

        if World::ALL.iter().all(|w| self.is_unlocked(AchievementId::for_world(*w))) {
            self.try_unlock(AchievementId::CompleteAllWorlds, &mut unlocked);
        }

        let learned: BTreeSet<Virtue> = World::ALL
            .iter()
            .filter(|w| self.is_unlocked(AchievementId::for_world(**w)))
            .flat_map(|w| w.virtues().iter().copied())
            .collect();
        if Virtue::ALL.iter().all(|v| learned.contains(v)) {
            self.try_unlock(AchievementId::EarnAllVirtues, &mut unlocked);
        }

        unlocked
    }

    pub fn record_boss_victory(&mut self, victory: BossVictory) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        if victory.misses == 0 {
            self.try_unlock(AchievementId::DefeatGoliathPerfect, &mut unlocked);
        }
        if victory.elapsed < 30.0 {
            self.try_unlock(AchievementId::DefeatGoliathFast, &mut unlocked);
        }
        unlocked
    }

    pub fn record_run_victory(&mut self, run: RunVictory) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        // A finished run never touched an obstacle; crashing ends it.
        self.try_unlock(AchievementId::RunnerNoHits, &mut unlocked);
        if run.missed_collectibles == 0 {
            self.try_unlock(AchievementId::RunnerPerfect, &mut unlocked);
        }
        unlocked
    }

    /// Check the threshold achievements against the current progress
    pub fn check_progress(&mut self, save: &SaveData) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();

        let coin_tiers = [
            (100, AchievementId::Collect100Coins),
            (500, AchievementId::Collect500Coins),
            (1000, AchievementId::Collect1000Coins),
        ];
        for (threshold, id) in coin_tiers {
            if save.coins >= threshold {
                self.try_unlock(id, &mut unlocked);
            }
        }

        if save.virtues >= 10 {
            self.try_unlock(AchievementId::Earn10Virtues, &mut unlocked);
        }
        if save.virtues >= 25 {
            self.try_unlock(AchievementId::Earn25Virtues, &mut unlocked);
        }

        if save.stats.scrolls_collected >= 50 {
            self.try_unlock(AchievementId::Collect50Scrolls, &mut unlocked);
        }
        if save.stats.hearts_collected >= 100 {
            self.try_unlock(AchievementId::Collect100Hearts, &mut unlocked);
        }
        if save.stats.play_seconds >= ONE_HOUR_SECONDS {
            self.try_unlock(AchievementId::PlayFor1Hour, &mut unlocked);
        }

        if save.purchased_skins() >= 1 {
            self.try_unlock(AchievementId::BuyFirstSkin, &mut unlocked);
        }
        if save.all_skins_owned() {
            self.try_unlock(AchievementId::UnlockAllSkins, &mut unlocked);
        }

        unlocked
    }

    fn try_unlock(&mut self, id: AchievementId, unlocked: &mut Vec<AchievementId>) {
        if self.unlock(id) {
            unlocked.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::MemoryStore;

    #[test]
    fn test_unlock_is_idempotent() {
        let mut tracker = AchievementTracker::new();
        assert!(tracker.unlock(AchievementId::FirstVictory));
        assert!(!tracker.unlock(AchievementId::FirstVictory));
        assert!(tracker.is_unlocked(AchievementId::FirstVictory));
        assert!(!tracker.record(AchievementId::FirstVictory).unwrap().timestamp.is_empty());
    }

    #[test]
    fn test_ledger_round_trip() {
        let mut store = MemoryStore::new();
        let mut tracker = AchievementTracker::new();
        tracker.unlock(AchievementId::CompleteWorld2);
        tracker.save(&mut store).unwrap();

        let json = store.get(ACHIEVEMENTS_KEY).unwrap().unwrap();
        assert!(json.contains("\"CompleteWorld2\":{\"unlocked\":true"));

        let loaded = AchievementTracker::load(&store);
        assert!(loaded.is_unlocked(AchievementId::CompleteWorld2));
        assert_eq!(loaded.unlocked().len(), 1);
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let mut store = MemoryStore::new();
        store
            .set(
                ACHIEVEMENTS_KEY,
                r#"{"Mystery":{"unlocked":true,"timestamp":""},"FirstVictory":{"unlocked":true,"timestamp":"x"}}"#,
            )
            .unwrap();

        let tracker = AchievementTracker::load(&store);
        assert_eq!(tracker.unlocked(), vec![AchievementId::FirstVictory]);
    }

    #[test]
    fn test_perfect_goliath_needs_zero_misses() {
        let mut tracker = AchievementTracker::new();
        let unlocked = tracker.record_boss_victory(BossVictory { misses: 1, elapsed: 40.0 });
        assert!(unlocked.is_empty());

        let unlocked = tracker.record_boss_victory(BossVictory { misses: 0, elapsed: 12.0 });
        assert_eq!(
            unlocked,
            vec![AchievementId::DefeatGoliathPerfect, AchievementId::DefeatGoliathFast]
        );
    }

    #[test]
    fn test_all_worlds_and_virtues() {
        let mut tracker = AchievementTracker::new();
        for world in [World::Noah, World::David, World::Jonah, World::Moses] {
            tracker.record_world_complete(world);
        }
        assert!(!tracker.is_unlocked(AchievementId::CompleteAllWorlds));
        assert!(!tracker.is_unlocked(AchievementId::EarnAllVirtues));

        let unlocked = tracker.record_world_complete(World::Jesus);
        assert!(unlocked.contains(&AchievementId::CompleteAllWorlds));
        assert!(unlocked.contains(&AchievementId::EarnAllVirtues));
    }

    #[test]
    fn test_threshold_checks() {
        let mut tracker = AchievementTracker::new();
        let mut save = SaveData::new();
        save.coins = 120;
        save.virtues = 11;
        save.owned_skins = vec![true, true, true];

        let unlocked = tracker.check_progress(&save);
        assert!(unlocked.contains(&AchievementId::Collect100Coins));
        assert!(!unlocked.contains(&AchievementId::Collect500Coins));
        assert!(unlocked.contains(&AchievementId::Earn10Virtues));
        assert!(unlocked.contains(&AchievementId::BuyFirstSkin));
        assert!(unlocked.contains(&AchievementId::UnlockAllSkins));

        assert!(tracker.check_progress(&save).is_empty());
    }

    #[test]
    fn test_progress_and_rewards() {
        let mut tracker = AchievementTracker::new();
        assert_eq!(tracker.progress(), 0.0);
        tracker.unlock(AchievementId::FirstVictory);
        tracker.unlock(AchievementId::BuyFirstSkin);
        assert_eq!(tracker.total_coin_rewards(), 80);
        assert!(tracker.progress() > 0.0);
    }
}
