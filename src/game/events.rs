//! Overlays and the events the flow controller reports to the frontend

use crate::modes::{CollectibleKind, PuzzleKind};
use crate::progression::{Hero, PurchaseOutcome, SkinSelection, Virtue, World};
use crate::save::AchievementId;

use super::state::GameState;

/// What pressing a modal button does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    /// Close the overlay and stay where we are
    Dismiss,
    GoMap,
    /// Start the given world again from scratch
    Retry(World),
    /// Empty the puzzle's slots without leaving it
    ResetPuzzle(PuzzleKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalButton {
    pub label: String,
    pub action: ModalAction,
}

impl ModalButton {
    pub fn new(label: impl Into<String>, action: ModalAction) -> Self {
        Self { label: label.into(), action }
    }
}

/// Which modal button was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalChoice {
    Primary,
    Secondary,
}

/// A blocking message box with one or two buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub title: String,
    pub body: String,
    pub primary: ModalButton,
    pub secondary: Option<ModalButton>,
}

impl Modal {
    pub fn new(title: impl Into<String>, body: impl Into<String>, primary: ModalButton) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, button: ModalButton) -> Self {
        self.secondary = Some(button);
        self
    }

    /// Action behind a choice; a missing secondary button falls back to the primary
    pub fn action(&self, choice: ModalChoice) -> ModalAction {
        match (choice, &self.secondary) {
            (ModalChoice::Secondary, Some(button)) => button.action,
            _ => self.primary.action,
        }
    }
}

/// The post-run question shown after world 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub virtue: Virtue,
    answer: Option<usize>,
}

impl Quiz {
    pub fn new(
        title: impl Into<String>,
        question: impl Into<String>,
        options: &[&str],
        correct: usize,
        virtue: Virtue,
    ) -> Self {
        Self {
            title: title.into(),
            question: question.into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct,
            virtue,
            answer: None,
        }
    }

    /// The Noah quiz
    pub fn noah() -> Self {
        Self::new(
            "Mini challenge",
            "What did God ask Noah to do?",
            &["Build the ark", "Plant a garden", "Become a king"],
            0,
            Virtue::Obedience,
        )
    }

    /// Record an answer; out-of-range choices are ignored
    pub fn answer(&mut self, choice: usize) -> Option<bool> {
        if choice >= self.options.len() {
            return None;
        }
        self.answer = Some(choice);
        Some(choice == self.correct)
    }

    pub fn answered(&self) -> Option<usize> {
        self.answer
    }

    /// Feedback line once an answer has been given
    pub fn feedback(&self) -> Option<String> {
        self.answer.map(|choice| {
            if choice == self.correct {
                format!("Correct! Virtue: {}", self.virtue.name())
            } else {
                "Almost! Let's learn together.".to_string()
            }
        })
    }
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    StateChanged(GameState),
    ModalShown { title: String },
    QuizShown,
    QuizAnswered { correct: bool },
    Paused(bool),
    Collected(CollectibleKind),
    PlayerHit,
    BossAiming,
    BossHit { hits: u32, needed: u32 },
    BossMiss,
    PuzzleStep { kind: PuzzleKind, step: usize },
    RewardGranted { world: World, coins: u32, virtues: u32 },
    WorldUnlocked(u8),
    AchievementUnlocked(AchievementId),
    Blocked { world: World, required: u8 },
    HeroChanged(Hero),
    SkinSelected(SkinSelection),
    Purchase(PurchaseOutcome),
    ProgressReset,
    SaveFailed(String),
}
