//! The shared stage: player avatar plus the scene of transient objects
//!
//! Obstacles, collectibles and boss props live in a `hecs` world so the
//! flow controller can wipe everything tagged between transitions.

use hecs::{Entity, World};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::lane::Lane;

/// Downward acceleration before mode-specific multipliers
pub const GRAVITY: f32 = 9.81;

/// Where the avatar stands after every reset
pub const AVATAR_START_Z: f32 = 2.0;

const AVATAR_HALF_WIDTH: f32 = 0.5;
const AVATAR_HALF_DEPTH: f32 = 0.5;
const AVATAR_HEIGHT: f32 = 2.0;
/// Collider height factor while sliding
const SLIDE_HEIGHT_FACTOR: f32 = 0.55;

// ============================================================================
// Avatar
// ============================================================================

/// The player avatar shared by every mode
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    pub x: f32,
    /// Height of the feet above the ground
    pub y: f32,
    pub z: f32,
    pub vertical_velocity: f32,
    pub lane: Lane,
    pub grounded: bool,
    pub sliding: bool,
    slide_remaining: f32,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: AVATAR_START_Z,
            vertical_velocity: 0.0,
            lane: Lane::Center,
            grounded: true,
            sliding: false,
            slide_remaining: 0.0,
        }
    }
}

impl Avatar {
    /// Back to the start position, standing still
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Collider height, reduced while sliding
    pub fn height(&self) -> f32 {
        if self.sliding {
            AVATAR_HEIGHT * SLIDE_HEIGHT_FACTOR
        } else {
            AVATAR_HEIGHT
        }
    }

    /// Ease x toward the current lane
    pub fn steer(&mut self, dt: f32, lane_change_speed: f32) {
        let t = (dt * lane_change_speed).clamp(0.0, 1.0);
        self.x += (self.lane.x() - self.x) * t;
    }

    pub fn advance(&mut self, dt: f32, forward_speed: f32) {
        self.z += forward_speed * dt;
    }

    /// Vertical integration; lands the avatar when it reaches the ground
    pub fn apply_gravity(&mut self, dt: f32, gravity_multiplier: f32) {
        if self.grounded {
            return;
        }
        self.vertical_velocity -= GRAVITY * gravity_multiplier * dt;
        self.y += self.vertical_velocity * dt;
        if self.y <= 0.0 {
            self.y = 0.0;
            self.vertical_velocity = 0.0;
            self.grounded = true;
        }
    }

    /// Launch upward, only from the ground
    pub fn jump(&mut self, force: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.vertical_velocity = force;
        self.grounded = false;
        true
    }

    /// Shrink the collider for `duration` seconds, only from the ground
    pub fn slide(&mut self, duration: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.sliding = true;
        self.slide_remaining = duration;
        true
    }

    /// Count down an active slide
    pub fn tick_slide(&mut self, dt: f32) {
        if !self.sliding {
            return;
        }
        self.slide_remaining -= dt;
        if self.slide_remaining <= 0.0 {
            self.sliding = false;
            self.slide_remaining = 0.0;
        }
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            x: self.x,
            z: self.z,
            half_width: AVATAR_HALF_WIDTH,
            half_depth: AVATAR_HALF_DEPTH,
            bottom: self.y,
            top: self.y + self.height(),
        }
    }
}

// ============================================================================
// Scene components
// ============================================================================

/// Position of a scene object; `y` is its bottom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Collision box around a [`Position`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub half_width: f32,
    pub half_depth: f32,
    pub height: f32,
}

/// Tag: touching it ends a run
#[derive(Debug, Clone, Copy)]
pub struct Obstacle;

/// Tag: part of the boss arena
#[derive(Debug, Clone, Copy)]
pub struct BossPart;

/// Tag: a collectible the avatar has already passed
#[derive(Debug, Clone, Copy)]
pub struct Missed;

/// Things that can be picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectibleKind {
    Scroll,
    Heart,
    Stone,
}

#[derive(Debug, Clone, Copy)]
pub struct Collectible {
    pub kind: CollectibleKind,
}

/// Display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint(pub (u8, u8, u8));

/// What a scene object is, for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Obstacle,
    Collectible(CollectibleKind),
    Boss,
}

/// Read-only copy of a scene object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub x: f32,
    pub z: f32,
    pub tint: Option<(u8, u8, u8)>,
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    x: f32,
    z: f32,
    half_width: f32,
    half_depth: f32,
    bottom: f32,
    top: f32,
}

impl Bounds {
    fn of(pos: &Position, extent: &Extent) -> Self {
        Self {
            x: pos.x,
            z: pos.z,
            half_width: extent.half_width,
            half_depth: extent.half_depth,
            bottom: pos.y,
            top: pos.y + extent.height,
        }
    }

    fn overlaps(&self, other: &Bounds) -> bool {
        (self.x - other.x).abs() < self.half_width + other.half_width
            && (self.z - other.z).abs() < self.half_depth + other.half_depth
            && self.bottom < other.top
            && other.bottom < self.top
    }
}

// ============================================================================
// Scene
// ============================================================================

/// Transient objects of the current attempt
pub struct Scene {
    world: World,
}

impl Scene {
    pub fn new() -> Self {
        Self { world: World::new() }
    }

    pub fn spawn_obstacle(&mut self, x: f32, z: f32, extent: Extent) -> Entity {
        self.world.spawn((Position { x, y: 0.0, z }, extent, Obstacle, Tint((140, 110, 80))))
    }

    /// Spawn a pickup whose centre floats at `center_y`
    pub fn spawn_collectible(&mut self, kind: CollectibleKind, x: f32, center_y: f32, z: f32) -> Entity {
        let radius = match kind {
            CollectibleKind::Scroll => 0.33,
            CollectibleKind::Heart => 0.35,
            CollectibleKind::Stone => 0.28,
        };
        let tint = match kind {
            CollectibleKind::Scroll => (255, 224, 90),
            CollectibleKind::Heart => (255, 97, 133),
            CollectibleKind::Stone => (153, 148, 140),
        };
        self.world.spawn((
            Position { x, y: center_y - radius, z },
            Extent { half_width: radius, half_depth: radius, height: radius * 2.0 },
            Collectible { kind },
            Tint(tint),
        ))
    }

    pub fn spawn_boss_part(&mut self, position: Position, extent: Extent, tint: (u8, u8, u8)) -> Entity {
        self.world.spawn((position, extent, BossPart, Tint(tint)))
    }

    /// Whether an object has not been despawned yet
    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn set_tint(&mut self, entity: Entity, tint: (u8, u8, u8)) -> bool {
        match self.world.get::<&mut Tint>(entity) {
            Ok(mut current) => {
                current.0 = tint;
                true
            }
            Err(_) => false,
        }
    }

    pub fn tint(&self, entity: Entity) -> Option<(u8, u8, u8)> {
        self.world.get::<&Tint>(entity).ok().map(|t| t.0)
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity).is_ok()
    }

    /// Despawn obstacles and collectibles lying before `z_limit`
    pub fn despawn_behind(&mut self, z_limit: f32) -> usize {
        let mut doomed: Vec<Entity> = Vec::new();
        for (entity, (pos, _)) in self.world.query::<(&Position, &Obstacle)>().iter() {
            if pos.z < z_limit {
                doomed.push(entity);
            }
        }
        for (entity, (pos, _)) in self.world.query::<(&Position, &Collectible)>().iter() {
            if pos.z < z_limit {
                doomed.push(entity);
            }
        }
        for entity in &doomed {
            let _ = self.world.despawn(*entity);
        }
        doomed.len()
    }

    /// Despawn every obstacle, collectible and boss prop
    pub fn clear_tagged(&mut self) -> usize {
        let mut doomed: Vec<Entity> = Vec::new();
        doomed.extend(self.world.query::<&Obstacle>().iter().map(|(e, _)| e));
        doomed.extend(self.world.query::<&Collectible>().iter().map(|(e, _)| e));
        doomed.extend(self.world.query::<&BossPart>().iter().map(|(e, _)| e));
        for entity in &doomed {
            let _ = self.world.despawn(*entity);
        }
        doomed.len()
    }

    /// Collectibles currently touching the avatar
    pub fn touching_collectibles(&self, avatar: &Avatar) -> Vec<(Entity, CollectibleKind)> {
        let body = avatar.bounds();
        self.world
            .query::<(&Position, &Extent, &Collectible)>()
            .iter()
            .filter(|(_, (pos, extent, _))| body.overlaps(&Bounds::of(pos, extent)))
            .map(|(entity, (_, _, c))| (entity, c.kind))
            .collect()
    }

    /// First obstacle touching the avatar
    pub fn touching_obstacle(&self, avatar: &Avatar) -> Option<Entity> {
        let body = avatar.bounds();
        self.world
            .query::<(&Position, &Extent, &Obstacle)>()
            .iter()
            .find(|(_, (pos, extent, _))| body.overlaps(&Bounds::of(pos, extent)))
            .map(|(entity, _)| entity)
    }

    /// Tag collectibles of `kind` the avatar has fully passed; returns how many were newly tagged
    pub fn mark_passed(&mut self, avatar: &Avatar, kind: CollectibleKind) -> u32 {
        let rear = avatar.z - AVATAR_HALF_DEPTH;
        let passed: Vec<Entity> = self
            .world
            .query::<(&Position, &Extent, &Collectible, Option<&Missed>)>()
            .iter()
            .filter(|(_, (pos, extent, c, missed))| {
                c.kind == kind && missed.is_none() && pos.z + extent.half_depth < rear
            })
            .map(|(entity, _)| entity)
            .collect();
        for entity in &passed {
            let _ = self.world.insert_one(*entity, Missed);
        }
        passed.len() as u32
    }

    pub fn obstacle_count(&self) -> usize {
        self.world.query::<&Obstacle>().iter().count()
    }

    pub fn collectible_count(&self) -> usize {
        self.world.query::<&Collectible>().iter().count()
    }

    pub fn boss_part_count(&self) -> usize {
        self.world.query::<&BossPart>().iter().count()
    }

    /// Snapshot of every tagged object, nearest first
    pub fn objects(&self) -> Vec<SceneObject> {
        let mut objects = Vec::new();
        for (_, (pos, _, tint)) in self.world.query::<(&Position, &Obstacle, Option<&Tint>)>().iter() {
            objects.push(SceneObject { kind: ObjectKind::Obstacle, x: pos.x, z: pos.z, tint: tint.map(|t| t.0) });
        }
        for (_, (pos, c, tint)) in self.world.query::<(&Position, &Collectible, Option<&Tint>)>().iter() {
            objects.push(SceneObject {
                kind: ObjectKind::Collectible(c.kind),
                x: pos.x,
                z: pos.z,
                tint: tint.map(|t| t.0),
            });
        }
        for (_, (pos, _, tint)) in self.world.query::<(&Position, &BossPart, Option<&Tint>)>().iter() {
            objects.push(SceneObject { kind: ObjectKind::Boss, x: pos.x, z: pos.z, tint: tint.map(|t| t.0) });
        }
        objects.sort_by(|a, b| a.z.total_cmp(&b.z));
        objects
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Stage
// ============================================================================

/// Avatar, scene and the random source modes spawn with
pub struct Stage {
    pub avatar: Avatar,
    pub scene: Scene,
    pub rng: StdRng,
}

impl Stage {
    pub fn new() -> Self {
        Self {
            avatar: Avatar::default(),
            scene: Scene::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic stage for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self {
            avatar: Avatar::default(),
            scene: Scene::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Reset the avatar and wipe every tagged object
    pub fn clear(&mut self) -> usize {
        self.avatar.reset();
        self.scene.clear_tagged()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Extent {
        Extent { half_width: 0.5, half_depth: 0.5, height: 0.8 }
    }

    #[test]
    fn test_steer_converges_on_lane() {
        let mut avatar = Avatar::default();
        avatar.lane = Lane::Right;
        for _ in 0..60 {
            avatar.steer(0.02, 12.0);
        }
        assert!((avatar.x - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_jump_only_from_ground_and_lands() {
        let mut avatar = Avatar::default();
        assert!(avatar.jump(7.0));
        assert!(!avatar.jump(7.0));
        let mut peak: f32 = 0.0;
        for _ in 0..100 {
            avatar.apply_gravity(0.02, 2.2);
            peak = peak.max(avatar.y);
        }
        assert!(peak > 1.0);
        assert!(avatar.grounded);
        assert_eq!(avatar.y, 0.0);
    }

    #[test]
    fn test_slide_expires() {
        let mut avatar = Avatar::default();
        assert!(avatar.slide(0.1));
        assert!(avatar.height() < 2.0);
        avatar.tick_slide(0.05);
        assert!(avatar.sliding);
        avatar.tick_slide(0.06);
        assert!(!avatar.sliding);
        assert_eq!(avatar.height(), 2.0);
    }

    #[test]
    fn test_obstacle_collision_respects_lane_and_height() {
        let mut scene = Scene::new();
        let mut avatar = Avatar::default();
        scene.spawn_obstacle(2.0, avatar.z, block());
        assert!(scene.touching_obstacle(&avatar).is_none());

        scene.spawn_obstacle(0.0, avatar.z, block());
        assert!(scene.touching_obstacle(&avatar).is_some());

        avatar.y = 1.0;
        assert!(scene.touching_obstacle(&avatar).is_none());
    }

    #[test]
    fn test_despawn_behind_and_clear() {
        let mut scene = Scene::new();
        scene.spawn_obstacle(0.0, 1.0, block());
        scene.spawn_obstacle(0.0, 40.0, block());
        scene.spawn_collectible(CollectibleKind::Scroll, 0.0, 1.3, 2.0);
        scene.spawn_boss_part(Position { x: 0.0, y: 0.0, z: 18.0 }, block(), (1, 2, 3));

        assert_eq!(scene.despawn_behind(5.0), 2);
        assert_eq!(scene.obstacle_count(), 1);
        assert_eq!(scene.collectible_count(), 0);

        assert_eq!(scene.clear_tagged(), 2);
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn test_passed_collectibles_are_counted_once() {
        let mut scene = Scene::new();
        let mut avatar = Avatar::default();
        scene.spawn_collectible(CollectibleKind::Scroll, 2.0, 1.3, 4.0);
        assert_eq!(scene.mark_passed(&avatar, CollectibleKind::Scroll), 0);

        avatar.z = 10.0;
        assert_eq!(scene.mark_passed(&avatar, CollectibleKind::Scroll), 1);
        assert_eq!(scene.mark_passed(&avatar, CollectibleKind::Scroll), 0);
    }

    #[test]
    fn test_tint_on_despawned_entity_is_ignored() {
        let mut scene = Scene::new();
        let boss = scene.spawn_boss_part(Position { x: 0.0, y: 0.0, z: 18.0 }, block(), (1, 2, 3));
        assert!(scene.set_tint(boss, (9, 9, 9)));
        assert_eq!(scene.tint(boss), Some((9, 9, 9)));
        scene.clear_tagged();
        assert!(!scene.contains(boss));
        assert!(!scene.set_tint(boss, (1, 1, 1)));
    }
}
