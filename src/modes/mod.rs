//! Gameplay modes
//!
//! Every mode is driven by the flow controller through two tick phases and
//! reports what happened by pushing [`ModeEvent`]s. Modes never touch the
//! save data.

pub mod boss;
pub mod collect;
pub mod lane;
pub mod puzzle;
pub mod runner;
pub mod stage;

pub use boss::{BossMode, BossPhase, BossStats};
pub use collect::{CollectMode, CollectStats};
pub use lane::{Lane, SpawnCursor, AXIS_DEAD_ZONE, DESPAWN_BEHIND, LANE_X};
pub use puzzle::{OrderingPuzzle, PickOutcome, PuzzleKind, PuzzleStatus};
pub use runner::{RunStats, RunStatus, RunnerMode};
pub use stage::{Avatar, CollectibleKind, ObjectKind, Scene, SceneObject, Stage};

/// Input snapshot routed to the active mode once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeInput {
    /// Horizontal stick value in [-1, 1]
    pub stick_x: f32,
    pub jump: bool,
    pub slide: bool,
    pub action: bool,
}

/// Something a mode wants the flow controller to know about
#[derive(Debug, Clone, PartialEq)]
pub enum ModeEvent {
    Collected(CollectibleKind),
    RunnerFinished(RunStats),
    RunnerFailed(RunStats),
    CollectFinished(CollectStats),
    BossAiming,
    BossHit { hits: u32, needed: u32 },
    BossMiss,
    BossWon(BossStats),
    BossFailed(BossStats),
    PuzzleStep { kind: PuzzleKind, step: usize },
    PuzzleSolved(PuzzleKind),
    PuzzleWrong(PuzzleKind),
}

/// Shared lifecycle of every gameplay mode
pub trait Mode {
    fn name(&self) -> &'static str;

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Zero the counters and lay out the mode's starting objects
    fn reset(&mut self, stage: &mut Stage);

    /// Per-frame phase: input, timers, spawning
    fn update(&mut self, stage: &mut Stage, input: &ModeInput, dt: f32, events: &mut Vec<ModeEvent>);

    /// Fixed-step phase: movement and contacts
    fn fixed_update(&mut self, stage: &mut Stage, dt: f32, events: &mut Vec<ModeEvent>);
}
