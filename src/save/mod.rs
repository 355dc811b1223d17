//! Save/load system
//!
//! Handles the progress blob, the achievements ledger and the store
//! they live in.

pub mod achievements;
pub mod save_data;
pub mod store;

pub use save_data::{
    SaveData, LifetimeStats, SAVE_KEY,
    load_save, write_save, reset_save,
};

pub use achievements::{
    Achievement, AchievementId, AchievementRecord, AchievementTracker,
    BossVictory, RunVictory, ACHIEVEMENTS_KEY, all_achievements,
};

pub use store::{FileStore, KeyValueStore, MemoryStore, SaveError};
