//! Tuning values for every mode and the economy
//!
//! Every field has a default so a partial `settings.ron` only needs to
//! name the values it overrides.

use serde::{Deserialize, Serialize};

/// Root settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Frames per second targeted by the frontend loop
    pub target_fps: u32,
    /// Seconds per physics step
    pub fixed_timestep: f32,
    /// Global speed multiplier applied to frame and physics deltas
    pub game_speed: f32,
    pub economy: EconomySettings,
    pub runner: RunnerSettings,
    pub boss: BossSettings,
    pub collect: CollectSettings,
    pub debug: DebugSettings,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            target_fps: 60,
            fixed_timestep: 0.02,
            game_speed: 1.0,
            economy: EconomySettings::default(),
            runner: RunnerSettings::default(),
            boss: BossSettings::default(),
            collect: CollectSettings::default(),
            debug: DebugSettings::default(),
        }
    }
}

/// Coins, prices and reward scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomySettings {
    /// Multiplier applied to every coin reward
    pub coin_multiplier: f32,
    /// Floor of the runner's scroll-based coin reward
    pub min_coins_per_level: u32,
    /// Ceiling of the runner's scroll-based coin reward
    pub max_coins_per_level: u32,
    /// Price per skin slot (slot 0 is the free default skin)
    pub skin_prices: [u32; 3],
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            coin_multiplier: 1.0,
            min_coins_per_level: 10,
            max_coins_per_level: 120,
            skin_prices: [0, 80, 120],
        }
    }
}

/// World 1 runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    pub forward_speed: f32,
    pub lane_change_speed: f32,
    pub jump_force: f32,
    pub gravity_multiplier: f32,
    /// Distance that completes the run
    pub phase_length: f32,
    pub slide_duration: f32,
    /// How far ahead of the avatar objects are kept spawned
    pub spawn_ahead: f32,
    pub first_obstacle: f32,
    pub obstacle_spacing: f32,
    pub first_collectible: f32,
    pub collectible_spacing: f32,
    /// Probability that a spawned collectible is a scroll rather than a heart
    pub scroll_chance: f32,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            forward_speed: 7.5,
            lane_change_speed: 12.0,
            jump_force: 7.0,
            gravity_multiplier: 2.2,
            phase_length: 320.0,
            slide_duration: 0.8,
            spawn_ahead: 90.0,
            first_obstacle: 25.0,
            obstacle_spacing: 9.0,
            first_collectible: 27.0,
            collectible_spacing: 5.8,
            scroll_chance: 0.72,
        }
    }
}

/// World 2 boss encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossSettings {
    pub needed_hits: u32,
    /// Seconds without aiming before the encounter fails
    pub intimidation_limit: f32,
    /// Max distance of the aim value from 0.5 that still counts as a hit
    pub aim_tolerance: f32,
    /// Angular frequency of the aim oscillation
    pub aim_frequency: f32,
    pub approach_speed: f32,
    pub lane_change_speed: f32,
    pub stone_count: u32,
    pub first_stone: f32,
    pub stone_spacing: f32,
    /// Seconds the boss stays tinted after a throw
    pub flash_duration: f32,
}

impl Default for BossSettings {
    fn default() -> Self {
        Self {
            needed_hits: 3,
            intimidation_limit: 22.0,
            aim_tolerance: 0.18,
            aim_frequency: 4.2,
            approach_speed: 0.6,
            lane_change_speed: 14.0,
            stone_count: 12,
            first_stone: 6.0,
            stone_spacing: 1.8,
            flash_duration: 0.35,
        }
    }
}

/// World 5 heart collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectSettings {
    pub forward_speed: f32,
    pub lane_change_speed: f32,
    pub spawn_ahead: f32,
    pub first_heart: f32,
    pub heart_spacing: f32,
    pub hearts_target: u32,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            forward_speed: 6.5,
            lane_change_speed: 12.0,
            spawn_ahead: 90.0,
            first_heart: 15.0,
            heart_spacing: 5.5,
            hearts_target: 18,
        }
    }
}

/// Developer switches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Skip every progression gate
    pub unlock_all_levels: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let settings: GameSettings =
            ron::from_str("(boss: (needed_hits: 5), debug: (unlock_all_levels: true))").unwrap();

        assert_eq!(settings.boss.needed_hits, 5);
        assert_eq!(settings.boss.aim_tolerance, 0.18);
        assert!(settings.debug.unlock_all_levels);
        assert_eq!(settings.runner, RunnerSettings::default());
    }
}
