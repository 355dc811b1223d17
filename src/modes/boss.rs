//! World 2: the timing encounter with Goliath
//!
//! The avatar creeps toward the giant picking up stones. Pressing the action
//! spends a stone and starts an oscillating aim; pressing again throws. A
//! throw near the centre of the swing is a hit. Standing idle too long lets
//! Goliath intimidate the player into losing.

use hecs::Entity;
use rand::Rng;

use crate::data::BossSettings;
use super::lane::Lane;
use super::stage::{CollectibleKind, Extent, Position, Stage};
use super::{Mode, ModeEvent, ModeInput};

/// Where Goliath stands
pub const BOSS_Z: f32 = 18.0;
/// The avatar stops this far short of Goliath
const BOSS_STANDOFF: f32 = 3.0;
const STONE_CENTER_Y: f32 = 1.1;

const BOSS_COLOR: (u8, u8, u8) = (77, 102, 184);
const HIT_FLASH: (u8, u8, u8) = (255, 90, 90);
const MISS_FLASH: (u8, u8, u8) = (255, 191, 115);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BossPhase {
    /// Walking in and gathering stones
    #[default]
    Approaching,
    /// A stone is loaded and the aim is swinging
    Aiming,
    Won,
    Failed,
}

impl BossPhase {
    pub fn is_over(&self) -> bool {
        matches!(self, BossPhase::Won | BossPhase::Failed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BossStats {
    pub stones: u32,
    pub hits: u32,
    pub misses: u32,
    pub elapsed: f32,
    pub intimidation: f32,
}

pub struct BossMode {
    settings: BossSettings,
    enabled: bool,
    phase: BossPhase,
    stats: BossStats,
    aim: f32,
    boss: Option<Entity>,
    flash_remaining: f32,
}

impl BossMode {
    pub fn new(settings: BossSettings) -> Self {
        Self {
            settings,
            enabled: false,
            phase: BossPhase::Approaching,
            stats: BossStats::default(),
            aim: 0.0,
            boss: None,
            flash_remaining: 0.0,
        }
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn stats(&self) -> BossStats {
        self.stats
    }

    /// Current aim in [0, 1]; the sweet spot is 0.5
    pub fn aim(&self) -> f32 {
        self.aim
    }

    pub fn needed_hits(&self) -> u32 {
        self.settings.needed_hits
    }

    pub fn aim_tolerance(&self) -> f32 {
        self.settings.aim_tolerance
    }

    /// Seconds left before intimidation ends the encounter
    pub fn courage_left(&self) -> f32 {
        (self.settings.intimidation_limit - self.stats.intimidation).max(0.0)
    }

    pub fn boss_entity(&self) -> Option<Entity> {
        self.boss
    }

    /// Load a stone, or throw the loaded one
    pub fn action(&mut self, stage: &mut Stage, events: &mut Vec<ModeEvent>) {
        if !self.enabled || self.phase.is_over() {
            return;
        }

        if self.phase != BossPhase::Aiming {
            if self.stats.stones == 0 {
                return;
            }
            self.stats.stones -= 1;
            self.phase = BossPhase::Aiming;
            events.push(ModeEvent::BossAiming);
            return;
        }

        self.stats.intimidation = 0.0;
        if (self.aim - 0.5).abs() < self.settings.aim_tolerance {
            self.stats.hits += 1;
            self.flash(stage, HIT_FLASH);
            events.push(ModeEvent::BossHit { hits: self.stats.hits, needed: self.settings.needed_hits });
            if self.stats.hits >= self.settings.needed_hits {
                self.phase = BossPhase::Won;
                log::info!(
                    "Goliath defeated in {:.1}s with {} misses",
                    self.stats.elapsed,
                    self.stats.misses
                );
                events.push(ModeEvent::BossWon(self.stats));
                return;
            }
        } else {
            self.stats.misses += 1;
            self.flash(stage, MISS_FLASH);
            events.push(ModeEvent::BossMiss);
        }
        self.phase = BossPhase::Approaching;
    }

    fn flash(&mut self, stage: &mut Stage, tint: (u8, u8, u8)) {
        if let Some(boss) = self.boss {
            if stage.scene.set_tint(boss, tint) {
                self.flash_remaining = self.settings.flash_duration;
            }
        }
    }

    fn tick_flash(&mut self, stage: &mut Stage, dt: f32) {
        if self.flash_remaining <= 0.0 {
            return;
        }
        self.flash_remaining -= dt;
        if self.flash_remaining <= 0.0 {
            self.flash_remaining = 0.0;
            // The arena may have been cleared in the meantime
            if let Some(boss) = self.boss.filter(|b| stage.scene.contains(*b)) {
                stage.scene.set_tint(boss, BOSS_COLOR);
            }
        }
    }

    fn spawn_arena(&mut self, stage: &mut Stage) {
        self.boss = Some(stage.scene.spawn_boss_part(
            Position { x: 0.0, y: 0.0, z: BOSS_Z },
            Extent { half_width: 1.2, half_depth: 1.2, height: 5.5 },
            BOSS_COLOR,
        ));
        stage.scene.spawn_boss_part(
            Position { x: 2.6, y: 0.3, z: 14.0 },
            Extent { half_width: 0.8, half_depth: 0.25, height: 2.4 },
            (107, 97, 82),
        );
        for i in 0..6 {
            let side = if i % 2 == 0 { -1.0 } else { 1.0 };
            let x = side * stage.rng.gen_range(5.0..7.0);
            let size: f32 = stage.rng.gen_range(0.5..1.2);
            stage.scene.spawn_boss_part(
                Position { x, y: 0.0, z: 4.0 + i as f32 * 3.5 },
                Extent { half_width: size * 0.55, half_depth: size * 0.4, height: size * 0.5 },
                (140, 122, 97),
            );
        }

        for i in 0..self.settings.stone_count {
            let lane = Lane::from_index(stage.rng.gen_range(0..3));
            let z = self.settings.first_stone + i as f32 * self.settings.stone_spacing;
            stage.scene.spawn_collectible(CollectibleKind::Stone, lane.x(), STONE_CENTER_Y, z);
        }
        log::debug!("Boss arena spawned with {} stones", self.settings.stone_count);
    }
}

impl Mode for BossMode {
    fn name(&self) -> &'static str {
        "boss"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn reset(&mut self, stage: &mut Stage) {
        self.phase = BossPhase::Approaching;
        self.stats = BossStats::default();
        self.aim = 0.0;
        self.flash_remaining = 0.0;
        self.spawn_arena(stage);
    }

    fn update(&mut self, stage: &mut Stage, input: &ModeInput, dt: f32, events: &mut Vec<ModeEvent>) {
        if !self.enabled {
            return;
        }
        self.tick_flash(stage, dt);
        if self.phase.is_over() {
            return;
        }

        stage.avatar.lane = Lane::from_axis(input.stick_x);
        if input.action {
            self.action(stage, events);
            if self.phase.is_over() {
                return;
            }
        }

        self.stats.elapsed += dt;
        if self.phase == BossPhase::Aiming {
            self.aim = 0.5 + 0.5 * (self.stats.elapsed * self.settings.aim_frequency).sin();
        } else {
            self.stats.intimidation += dt;
            if self.stats.intimidation > self.settings.intimidation_limit {
                self.phase = BossPhase::Failed;
                log::info!("Goliath intimidated the player after {:.1}s", self.stats.elapsed);
                events.push(ModeEvent::BossFailed(self.stats));
            }
        }
    }

    fn fixed_update(&mut self, stage: &mut Stage, dt: f32, events: &mut Vec<ModeEvent>) {
        if !self.enabled || self.phase.is_over() {
            return;
        }

        if stage.avatar.z < BOSS_Z - BOSS_STANDOFF {
            stage.avatar.advance(dt, self.settings.approach_speed);
        }
        stage.avatar.steer(dt, self.settings.lane_change_speed);

        for (entity, kind) in stage.scene.touching_collectibles(&stage.avatar) {
            stage.scene.despawn(entity);
            if kind == CollectibleKind::Stone {
                self.stats.stones += 1;
                self.stats.intimidation = 0.0;
                events.push(ModeEvent::Collected(kind));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (BossMode, Stage) {
        let mut stage = Stage::with_seed(11);
        let mut boss = BossMode::new(BossSettings::default());
        boss.set_enabled(true);
        boss.reset(&mut stage);
        (boss, stage)
    }

    #[test]
    fn test_arena_layout() {
        let (boss, stage) = started();
        assert_eq!(stage.scene.collectible_count(), 12);
        assert!(stage.scene.boss_part_count() >= 1);
        assert!(boss.boss_entity().is_some());
    }

    #[test]
    fn test_action_without_stones_does_nothing() {
        let (mut boss, mut stage) = started();
        let mut events = Vec::new();
        boss.action(&mut stage, &mut events);
        assert_eq!(boss.phase(), BossPhase::Approaching);
        assert!(events.is_empty());
    }

    #[test]
    fn test_hit_only_inside_tolerance() {
        let (mut boss, mut stage) = started();
        let mut events = Vec::new();
        boss.stats.stones = 2;

        boss.action(&mut stage, &mut events);
        assert_eq!(boss.phase(), BossPhase::Aiming);
        assert_eq!(boss.stats().stones, 1);
        boss.aim = 0.95;
        boss.action(&mut stage, &mut events);
        assert_eq!(boss.stats().hits, 0);
        assert_eq!(boss.stats().misses, 1);

        boss.action(&mut stage, &mut events);
        boss.aim = 0.55;
        boss.action(&mut stage, &mut events);
        assert_eq!(boss.stats().hits, 1);
        assert_eq!(boss.stats().stones, 0);
        assert!(events.contains(&ModeEvent::BossMiss));
    }

    #[test]
    fn test_three_hits_win() {
        let (mut boss, mut stage) = started();
        let mut events = Vec::new();
        boss.stats.stones = 3;
        for _ in 0..3 {
            boss.action(&mut stage, &mut events);
            boss.aim = 0.5;
            boss.action(&mut stage, &mut events);
        }
        assert_eq!(boss.phase(), BossPhase::Won);
        assert!(matches!(events.last(), Some(ModeEvent::BossWon(s)) if s.misses == 0));
    }

    #[test]
    fn test_intimidation_fails_encounter() {
        let (mut boss, mut stage) = started();
        let mut events = Vec::new();
        for _ in 0..23 {
            boss.update(&mut stage, &ModeInput::default(), 1.0, &mut events);
        }
        assert_eq!(boss.phase(), BossPhase::Failed);
        let failed = events.iter().filter(|e| matches!(e, ModeEvent::BossFailed(_))).count();
        assert_eq!(failed, 1);
    }

    #[test]
    fn test_stone_pickup_resets_intimidation() {
        let (mut boss, mut stage) = started();
        let mut events = Vec::new();
        boss.update(&mut stage, &ModeInput::default(), 10.0, &mut events);
        assert!(boss.stats().intimidation > 0.0);

        stage.scene.spawn_collectible(CollectibleKind::Stone, 0.0, STONE_CENTER_Y, stage.avatar.z);
        boss.fixed_update(&mut stage, 0.02, &mut events);
        assert_eq!(boss.stats().stones, 1);
        assert_eq!(boss.stats().intimidation, 0.0);
    }

    #[test]
    fn test_aim_frozen_while_not_aiming() {
        let (mut boss, mut stage) = started();
        boss.update(&mut stage, &ModeInput::default(), 0.3, &mut Vec::new());
        assert_eq!(boss.aim(), 0.0);
    }

    #[test]
    fn test_flash_reset_skips_cleared_boss() {
        let (mut boss, mut stage) = started();
        boss.stats.stones = 1;
        let mut events = Vec::new();
        boss.action(&mut stage, &mut events);
        boss.aim = 0.5;
        boss.action(&mut stage, &mut events);
        let entity = boss.boss_entity().unwrap();
        assert_eq!(stage.scene.tint(entity), Some(HIT_FLASH));

        stage.clear();
        boss.update(&mut stage, &ModeInput::default(), 1.0, &mut events);
        assert!(!stage.scene.contains(entity));
    }
}
