//! Data loading and tuning
//!
//! Game tuning lives in an external RON file so modes can be balanced
//! without rebuilding.

pub mod loader;
pub mod settings;

pub use loader::{DataLoadError, DATA_DIR, export_default_settings, load_settings, try_load_settings};
pub use settings::{
    BossSettings, CollectSettings, DebugSettings, EconomySettings, GameSettings, RunnerSettings,
};
