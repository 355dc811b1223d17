//! World 1: the three-lane runner
//!
//! The avatar runs forward at a constant rate, dodging ground blocks and
//! collecting scrolls and hearts until it has covered the phase length.

use hecs::Entity;
use rand::Rng;

use crate::data::RunnerSettings;
use super::lane::{Lane, SpawnCursor, DESPAWN_BEHIND};
use super::stage::{CollectibleKind, Extent, Stage, AVATAR_START_Z};
use super::{Mode, ModeEvent, ModeInput};

/// Height at which scrolls and hearts float
const PICKUP_CENTER_Y: f32 = 1.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStatus {
    #[default]
    Running,
    Finished,
    Failed,
}

/// Counters of one attempt
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub distance: f32,
    pub scrolls: u32,
    pub hearts: u32,
    /// Pickups the avatar ran past
    pub missed: u32,
}

pub struct RunnerMode {
    settings: RunnerSettings,
    enabled: bool,
    status: RunStatus,
    stats: RunStats,
    obstacles: SpawnCursor,
    pickups: SpawnCursor,
}

impl RunnerMode {
    pub fn new(settings: RunnerSettings) -> Self {
        let obstacles = SpawnCursor::new(AVATAR_START_Z + settings.first_obstacle, settings.obstacle_spacing);
        let pickups = SpawnCursor::new(AVATAR_START_Z + settings.first_collectible, settings.collectible_spacing);
        Self {
            settings,
            enabled: false,
            status: RunStatus::Running,
            stats: RunStats::default(),
            obstacles,
            pickups,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Fraction of the phase covered, 0..=1
    pub fn progress(&self) -> f32 {
        if self.settings.phase_length <= 0.0 {
            return 1.0;
        }
        (self.stats.distance / self.settings.phase_length).clamp(0.0, 1.0)
    }

    fn active(&self) -> bool {
        self.enabled && self.status == RunStatus::Running
    }

    fn spawn_ahead(&mut self, stage: &mut Stage) {
        let horizon = stage.avatar.z + self.settings.spawn_ahead;

        while let Some(z) = self.obstacles.next_before(horizon) {
            let lane = Lane::from_index(stage.rng.gen_range(0..3));
            let extent = Extent {
                half_width: stage.rng.gen_range(0.5..0.675),
                half_depth: stage.rng.gen_range(0.4..0.6),
                height: stage.rng.gen_range(0.5..1.0),
            };
            stage.scene.spawn_obstacle(lane.x(), z, extent);
            log::debug!("Obstacle spawned at z={:.1} lane={:?}", z, lane);
        }

        while let Some(z) = self.pickups.next_before(horizon) {
            let lane = Lane::from_index(stage.rng.gen_range(0..3));
            let kind = if stage.rng.gen::<f32>() < self.settings.scroll_chance {
                CollectibleKind::Scroll
            } else {
                CollectibleKind::Heart
            };
            stage.scene.spawn_collectible(kind, lane.x(), PICKUP_CENTER_Y, z);
        }
    }

    fn finish(&mut self, status: RunStatus, events: &mut Vec<ModeEvent>) {
        self.status = status;
        match status {
            RunStatus::Finished => {
                log::info!(
                    "Run finished: {:.0} units, {} scrolls, {} hearts",
                    self.stats.distance,
                    self.stats.scrolls,
                    self.stats.hearts
                );
                events.push(ModeEvent::RunnerFinished(self.stats));
            }
            RunStatus::Failed => {
                log::info!("Run failed at {:.0} units", self.stats.distance);
                events.push(ModeEvent::RunnerFailed(self.stats));
            }
            RunStatus::Running => {}
        }
    }
}

impl Mode for RunnerMode {
    fn name(&self) -> &'static str {
        "runner"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn reset(&mut self, stage: &mut Stage) {
        self.status = RunStatus::Running;
        self.stats = RunStats::default();
        let start = stage.avatar.z;
        self.obstacles = SpawnCursor::new(start + self.settings.first_obstacle, self.settings.obstacle_spacing);
        self.pickups = SpawnCursor::new(start + self.settings.first_collectible, self.settings.collectible_spacing);
        self.spawn_ahead(stage);
    }

    fn update(&mut self, stage: &mut Stage, input: &ModeInput, dt: f32, _events: &mut Vec<ModeEvent>) {
        if !self.active() {
            return;
        }

        stage.avatar.lane = Lane::from_axis(input.stick_x);
        if input.jump {
            stage.avatar.jump(self.settings.jump_force);
        }
        if input.slide {
            stage.avatar.slide(self.settings.slide_duration);
        }
        stage.avatar.tick_slide(dt);

        self.spawn_ahead(stage);
        stage.scene.despawn_behind(stage.avatar.z - DESPAWN_BEHIND);
    }

    fn fixed_update(&mut self, stage: &mut Stage, dt: f32, events: &mut Vec<ModeEvent>) {
        if !self.active() {
            return;
        }

        stage.avatar.advance(dt, self.settings.forward_speed.max(0.0));
        stage.avatar.steer(dt, self.settings.lane_change_speed);
        stage.avatar.apply_gravity(dt, self.settings.gravity_multiplier);
        self.stats.distance = self.stats.distance.max(stage.avatar.z - AVATAR_START_Z);

        let touched: Vec<(Entity, CollectibleKind)> = stage.scene.touching_collectibles(&stage.avatar);
        for (entity, kind) in touched {
            stage.scene.despawn(entity);
            match kind {
                CollectibleKind::Scroll => self.stats.scrolls += 1,
                CollectibleKind::Heart => self.stats.hearts += 1,
                CollectibleKind::Stone => continue,
            }
            events.push(ModeEvent::Collected(kind));
        }

        self.stats.missed += stage.scene.mark_passed(&stage.avatar, CollectibleKind::Scroll);
        self.stats.missed += stage.scene.mark_passed(&stage.avatar, CollectibleKind::Heart);

        if stage.scene.touching_obstacle(&stage.avatar).is_some() {
            self.finish(RunStatus::Failed, events);
            return;
        }

        if self.stats.distance >= self.settings.phase_length {
            self.finish(RunStatus::Finished, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_run() -> RunnerSettings {
        RunnerSettings {
            phase_length: 10.0,
            first_obstacle: 1000.0,
            ..RunnerSettings::default()
        }
    }

    fn started(settings: RunnerSettings) -> (RunnerMode, Stage) {
        let mut stage = Stage::with_seed(7);
        let mut runner = RunnerMode::new(settings);
        runner.set_enabled(true);
        runner.reset(&mut stage);
        (runner, stage)
    }

    #[test]
    fn test_reset_spawns_ahead_of_avatar() {
        let (_, stage) = started(RunnerSettings::default());
        assert!(stage.scene.obstacle_count() > 0);
        assert!(stage.scene.collectible_count() > 0);
        assert!(stage.scene.objects().iter().all(|o| o.z > stage.avatar.z));
    }

    #[test]
    fn test_finishes_exactly_once() {
        let (mut runner, mut stage) = started(short_run());
        let mut events = Vec::new();
        let mut last_distance = 0.0;
        for _ in 0..200 {
            runner.update(&mut stage, &ModeInput::default(), 0.02, &mut events);
            runner.fixed_update(&mut stage, 0.02, &mut events);
            assert!(runner.stats().distance >= last_distance);
            last_distance = runner.stats().distance;
        }
        let finished = events.iter().filter(|e| matches!(e, ModeEvent::RunnerFinished(_))).count();
        assert_eq!(finished, 1);
        assert_eq!(runner.status(), RunStatus::Finished);
        assert_eq!(runner.progress(), 1.0);
    }

    #[test]
    fn test_obstacle_fails_run() {
        let (mut runner, mut stage) = started(short_run());
        stage.scene.spawn_obstacle(
            0.0,
            stage.avatar.z + 0.5,
            Extent { half_width: 0.6, half_depth: 0.5, height: 1.0 },
        );
        let mut events = Vec::new();
        runner.fixed_update(&mut stage, 0.02, &mut events);
        assert_eq!(runner.status(), RunStatus::Failed);
        assert!(matches!(events.last(), Some(ModeEvent::RunnerFailed(_))));

        // Updates stop after failing
        let z = stage.avatar.z;
        runner.fixed_update(&mut stage, 0.02, &mut events);
        assert_eq!(stage.avatar.z, z);
    }

    #[test]
    fn test_collecting_counts_by_kind() {
        let (mut runner, mut stage) = started(short_run());
        let z = stage.avatar.z + 0.3;
        stage.scene.spawn_collectible(CollectibleKind::Scroll, 0.0, PICKUP_CENTER_Y, z);
        let mut events = Vec::new();
        runner.fixed_update(&mut stage, 0.02, &mut events);
        assert_eq!(runner.stats().scrolls, 1);
        assert!(events.contains(&ModeEvent::Collected(CollectibleKind::Scroll)));
    }

    #[test]
    fn test_disabled_runner_does_nothing() {
        let mut stage = Stage::with_seed(1);
        let mut runner = RunnerMode::new(RunnerSettings::default());
        let mut events = Vec::new();
        runner.fixed_update(&mut stage, 0.5, &mut events);
        assert_eq!(stage.avatar.z, AVATAR_START_Z);
        assert!(events.is_empty());
    }

    #[test]
    fn test_stick_selects_lane() {
        let (mut runner, mut stage) = started(short_run());
        let input = ModeInput { stick_x: -1.0, ..ModeInput::default() };
        runner.update(&mut stage, &input, 0.02, &mut Vec::new());
        assert_eq!(stage.avatar.lane, Lane::Left);
    }
}
