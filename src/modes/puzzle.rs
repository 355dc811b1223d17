//! Worlds 3 and 4: put the story beats in order

use super::stage::Stage;
use super::{Mode, ModeEvent, ModeInput};

/// Which story is being ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PuzzleKind {
    Jonah,
    Moses,
}

impl PuzzleKind {
    /// Beat labels in canonical order
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            PuzzleKind::Jonah => &["Jonah flees", "Great fish", "Jonah obeys"],
            PuzzleKind::Moses => &["Staff raised", "Sea parts", "People cross", "Sea closes"],
        }
    }

    pub fn steps(&self) -> usize {
        self.labels().len()
    }

    pub fn title(&self) -> &'static str {
        match self {
            PuzzleKind::Jonah => "Jonah: order the story",
            PuzzleKind::Moses => "Moses: order the crossing",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PuzzleStatus {
    #[default]
    Picking,
    Solved,
    Wrong,
}

/// Result of a single pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// Duplicate, out of range, or the attempt is over
    Ignored,
    Placed { step: usize },
    Solved,
    Wrong,
}

/// A sequence of slots filled one pick at a time
#[derive(Debug, Clone)]
pub struct OrderingPuzzle {
    kind: PuzzleKind,
    slots: Vec<Option<usize>>,
    step: usize,
    status: PuzzleStatus,
    enabled: bool,
}

impl OrderingPuzzle {
    pub fn new(kind: PuzzleKind) -> Self {
        Self {
            kind,
            slots: vec![None; kind.steps()],
            step: 0,
            status: PuzzleStatus::Picking,
            enabled: false,
        }
    }

    pub fn kind(&self) -> PuzzleKind {
        self.kind
    }

    pub fn status(&self) -> PuzzleStatus {
        self.status
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    /// Back to an empty sequence
    pub fn restart(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.step = 0;
        self.status = PuzzleStatus::Picking;
    }

    /// Place beat `index` in the next free slot
    pub fn pick(&mut self, index: usize, events: &mut Vec<ModeEvent>) -> PickOutcome {
        if !self.enabled || self.status != PuzzleStatus::Picking {
            return PickOutcome::Ignored;
        }
        if index >= self.kind.steps() || self.slots.contains(&Some(index)) {
            return PickOutcome::Ignored;
        }

        self.slots[self.step] = Some(index);
        self.step += 1;
        events.push(ModeEvent::PuzzleStep { kind: self.kind, step: self.step });

        if self.step < self.slots.len() {
            return PickOutcome::Placed { step: self.step };
        }

        let in_order = self.slots.iter().enumerate().all(|(i, slot)| *slot == Some(i));
        if in_order {
            self.status = PuzzleStatus::Solved;
            log::info!("{:?} puzzle solved", self.kind);
            events.push(ModeEvent::PuzzleSolved(self.kind));
            PickOutcome::Solved
        } else {
            self.status = PuzzleStatus::Wrong;
            log::info!("{:?} puzzle answered out of order", self.kind);
            events.push(ModeEvent::PuzzleWrong(self.kind));
            PickOutcome::Wrong
        }
    }

    /// Filled slots as "label → label → —"
    pub fn status_text(&self) -> String {
        let labels = self.kind.labels();
        self.slots
            .iter()
            .map(|slot| slot.and_then(|i| labels.get(i).copied()).unwrap_or("—"))
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

impl Mode for OrderingPuzzle {
    fn name(&self) -> &'static str {
        match self.kind {
            PuzzleKind::Jonah => "jonah puzzle",
            PuzzleKind::Moses => "moses puzzle",
        }
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn reset(&mut self, _stage: &mut Stage) {
        self.restart();
    }

    fn update(&mut self, _stage: &mut Stage, _input: &ModeInput, _dt: f32, _events: &mut Vec<ModeEvent>) {}

    fn fixed_update(&mut self, _stage: &mut Stage, _dt: f32, _events: &mut Vec<ModeEvent>) {}
}
