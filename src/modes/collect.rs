//! World 5: gather hearts along an obstacle-free track

use rand::Rng;

use crate::data::CollectSettings;
use super::lane::{Lane, SpawnCursor, DESPAWN_BEHIND};
use super::stage::{CollectibleKind, Stage, AVATAR_START_Z};
use super::{Mode, ModeEvent, ModeInput};

const HEART_CENTER_Y: f32 = 1.25;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollectStats {
    pub distance: f32,
    pub hearts: u32,
}

pub struct CollectMode {
    settings: CollectSettings,
    enabled: bool,
    finished: bool,
    stats: CollectStats,
    hearts: SpawnCursor,
}

impl CollectMode {
    pub fn new(settings: CollectSettings) -> Self {
        let hearts = SpawnCursor::new(AVATAR_START_Z + settings.first_heart, settings.heart_spacing);
        Self {
            settings,
            enabled: false,
            finished: false,
            stats: CollectStats::default(),
            hearts,
        }
    }

    pub fn stats(&self) -> CollectStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn target(&self) -> u32 {
        self.settings.hearts_target
    }

    fn spawn_ahead(&mut self, stage: &mut Stage) {
        let horizon = stage.avatar.z + self.settings.spawn_ahead;
        while let Some(z) = self.hearts.next_before(horizon) {
            let lane = Lane::from_index(stage.rng.gen_range(0..3));
            stage.scene.spawn_collectible(CollectibleKind::Heart, lane.x(), HEART_CENTER_Y, z);
        }
    }
}

impl Mode for CollectMode {
    fn name(&self) -> &'static str {
        "collect"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn reset(&mut self, stage: &mut Stage) {
        self.finished = false;
        self.stats = CollectStats::default();
        self.hearts = SpawnCursor::new(stage.avatar.z + self.settings.first_heart, self.settings.heart_spacing);
        self.spawn_ahead(stage);
    }

    fn update(&mut self, stage: &mut Stage, input: &ModeInput, _dt: f32, _events: &mut Vec<ModeEvent>) {
        if !self.enabled || self.finished {
            return;
        }
        stage.avatar.lane = Lane::from_axis(input.stick_x);
        self.spawn_ahead(stage);
        stage.scene.despawn_behind(stage.avatar.z - DESPAWN_BEHIND);
    }

    fn fixed_update(&mut self, stage: &mut Stage, dt: f32, events: &mut Vec<ModeEvent>) {
        if !self.enabled || self.finished {
            return;
        }

        stage.avatar.advance(dt, self.settings.forward_speed.max(0.0));
        stage.avatar.steer(dt, self.settings.lane_change_speed);
        self.stats.distance = self.stats.distance.max(stage.avatar.z - AVATAR_START_Z);

        for (entity, kind) in stage.scene.touching_collectibles(&stage.avatar) {
            stage.scene.despawn(entity);
            if kind == CollectibleKind::Heart {
                self.stats.hearts += 1;
                events.push(ModeEvent::Collected(kind));
            }
        }

        if self.stats.hearts >= self.settings.hearts_target {
            self.finished = true;
            log::info!("Collected {} hearts", self.stats.hearts);
            events.push(ModeEvent::CollectFinished(self.stats));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finishes_once_at_heart_target() {
        let mut stage = Stage::with_seed(3);
        let mut mode = CollectMode::new(CollectSettings { hearts_target: 2, ..CollectSettings::default() });
        mode.set_enabled(true);
        mode.reset(&mut stage);

        let mut events = Vec::new();
        for _ in 0..3 {
            let z = stage.avatar.z + 0.2;
            stage.scene.spawn_collectible(CollectibleKind::Heart, stage.avatar.x, HEART_CENTER_Y, z);
            mode.fixed_update(&mut stage, 0.02, &mut events);
        }

        assert!(mode.is_finished());
        assert_eq!(mode.stats().hearts, 2);
        let finished = events.iter().filter(|e| matches!(e, ModeEvent::CollectFinished(_))).count();
        assert_eq!(finished, 1);
    }

    #[test]
    fn test_distance_never_decreases() {
        let mut stage = Stage::with_seed(9);
        let mut mode = CollectMode::new(CollectSettings::default());
        mode.set_enabled(true);
        mode.reset(&mut stage);

        let mut events = Vec::new();
        let mut last_distance = 0.0;
        for tick in 0..500 {
            let stick_x = [-1.0, 0.0, 1.0][(tick / 40) % 3];
            let input = ModeInput { stick_x, ..ModeInput::default() };
            mode.update(&mut stage, &input, 0.02, &mut events);
            mode.fixed_update(&mut stage, 0.02, &mut events);
            assert!(mode.stats().distance >= last_distance);
            last_distance = mode.stats().distance;
        }

        assert!(last_distance > 0.0);
        let collected = events.iter().filter(|e| matches!(e, ModeEvent::Collected(_))).count();
        assert_eq!(collected as u32, mode.stats().hearts);
    }

    #[test]
    fn test_hearts_laid_out_on_schedule() {
        let mut stage = Stage::with_seed(3);
        let mut mode = CollectMode::new(CollectSettings::default());
        mode.set_enabled(true);
        mode.reset(&mut stage);
        // 15 ahead, every 5.5, within a 90-unit window
        assert_eq!(stage.scene.collectible_count(), 14);
        assert_eq!(stage.scene.obstacle_count(), 0);
    }
}
