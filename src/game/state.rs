//! Game state machine
//!
//! `Game` is the flow controller: it owns the save data, the achievements
//! ledger, the stage and every mode, moves between states, and turns mode
//! events into rewards, overlays and presentation events.

use std::time::Duration;

use thiserror::Error;

use crate::data::GameSettings;
use crate::modes::{
    BossMode, CollectMode, CollectibleKind, Mode, ModeEvent, OrderingPuzzle, PickOutcome,
    PuzzleKind, RunnerMode, Stage,
};
use crate::progression::{clamp_skin, cosmetic_color, Hero, PurchaseOutcome, SkinSelection, World};
use crate::save::{
    load_save, reset_save, write_save, AchievementId, AchievementTracker, BossVictory,
    KeyValueStore, RunVictory, SaveData,
};

use super::events::{GameEvent, Modal, ModalAction, ModalButton, ModalChoice, Quiz};
use super::input::InputRouter;
use super::time::FixedTimestep;

/// Messages kept in the log
const MAX_MESSAGES: usize = 100;

/// All possible game states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    /// Title screen
    Home,
    /// World selection
    Map,
    /// World 1
    RunnerNoe,
    /// World 2
    BossDavi,
    /// World 3
    JonasPuzzle,
    /// World 4
    MoisesPuzzle,
    /// World 5 intro screen
    JesusMenu,
    /// World 5
    JesusGameplay,
}

impl GameState {
    /// World this state belongs to, if any
    pub fn world(&self) -> Option<World> {
        match self {
            GameState::Home | GameState::Map => None,
            GameState::RunnerNoe => Some(World::Noah),
            GameState::BossDavi => Some(World::David),
            GameState::JonasPuzzle => Some(World::Jonah),
            GameState::MoisesPuzzle => Some(World::Moses),
            GameState::JesusMenu | GameState::JesusGameplay => Some(World::Jesus),
        }
    }

    /// Whether a mode is running in this state
    pub fn is_gameplay(&self) -> bool {
        !matches!(self, GameState::Home | GameState::Map | GameState::JesusMenu)
    }
}

/// Flow errors reported to the caller of a start operation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("world {world} is locked: requires {required} worlds unlocked, have {unlocked}")]
    Locked { world: u8, required: u8, unlocked: u8 },
}

/// A line in the message log
#[derive(Debug, Clone)]
pub struct GameMessage {
    pub text: String,
    pub timestamp: f32,
    pub category: MessageCategory,
}

/// Categories for message colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    Reward,
    Achievement,
    System,
    Warning,
}

/// Status line for the active mode
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub title: &'static str,
    pub line: String,
    /// Fill of the mode's progress bar, 0..=1
    pub progress: Option<f32>,
}

/// The main game struct that holds all game data
pub struct Game {
    state: GameState,
    settings: GameSettings,
    store: Box<dyn KeyValueStore>,
    save: SaveData,
    achievements: AchievementTracker,
    stage: Stage,
    input: InputRouter,
    clock: FixedTimestep,
    runner: RunnerMode,
    boss: BossMode,
    jonah: OrderingPuzzle,
    moses: OrderingPuzzle,
    collect: CollectMode,
    /// Raised by modes, drained after every tick
    mode_events: Vec<ModeEvent>,
    /// Waiting for the presentation layer
    events: Vec<GameEvent>,
    modal: Option<Modal>,
    quiz: Option<Quiz>,
    paused: bool,
    messages: Vec<GameMessage>,
    /// Seconds since start, for message timestamps
    elapsed: f32,
}

impl Game {
    /// Build the game around a store, loading progress and achievements from it
    pub fn new(settings: GameSettings, store: Box<dyn KeyValueStore>) -> Self {
        Self::with_stage(settings, store, Stage::new())
    }

    /// Same as [`Game::new`] with deterministic spawning
    pub fn with_seed(settings: GameSettings, store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        Self::with_stage(settings, store, Stage::with_seed(seed))
    }

    fn with_stage(settings: GameSettings, store: Box<dyn KeyValueStore>, stage: Stage) -> Self {
        let mut save = load_save(store.as_ref());
        if settings.debug.unlock_all_levels {
            log::warn!("Debug: all worlds unlocked");
            save.worlds_unlocked = crate::progression::MAX_WORLDS;
        }
        let achievements = AchievementTracker::load(store.as_ref());

        Self {
            state: GameState::Home,
            runner: RunnerMode::new(settings.runner.clone()),
            boss: BossMode::new(settings.boss.clone()),
            jonah: OrderingPuzzle::new(PuzzleKind::Jonah),
            moses: OrderingPuzzle::new(PuzzleKind::Moses),
            collect: CollectMode::new(settings.collect.clone()),
            clock: FixedTimestep::new(settings.fixed_timestep),
            settings,
            store,
            save,
            achievements,
            stage,
            input: InputRouter::new(),
            mode_events: Vec::new(),
            events: Vec::new(),
            modal: None,
            quiz: None,
            paused: false,
            messages: Vec::new(),
            elapsed: 0.0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn save(&self) -> &SaveData {
        &self.save
    }

    pub fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn runner(&self) -> &RunnerMode {
        &self.runner
    }

    pub fn boss(&self) -> &BossMode {
        &self.boss
    }

    pub fn collect(&self) -> &CollectMode {
        &self.collect
    }

    pub fn puzzle(&self, kind: PuzzleKind) -> &OrderingPuzzle {
        match kind {
            PuzzleKind::Jonah => &self.jonah,
            PuzzleKind::Moses => &self.moses,
        }
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn input_mut(&mut self) -> &mut InputRouter {
        &mut self.input
    }

    pub fn messages(&self) -> &[GameMessage] {
        &self.messages
    }

    /// Colour of the avatar with the selected hero and skin
    pub fn avatar_color(&self) -> (u8, u8, u8) {
        cosmetic_color(self.save.selected_hero, self.save.selected_skin)
    }

    /// Names of the modes currently enabled
    pub fn enabled_modes(&self) -> Vec<&'static str> {
        let modes: [&dyn Mode; 5] = [&self.runner, &self.boss, &self.jonah, &self.moses, &self.collect];
        modes.iter().filter(|m| m.enabled()).map(|m| m.name()).collect()
    }

    /// Take every presentation event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> Option<Hud> {
        let title = self.state.world()?.title();
        match self.state {
            GameState::RunnerNoe => {
                let stats = self.runner.stats();
                Some(Hud {
                    title,
                    line: format!("Scrolls: {}   Hearts: {}", stats.scrolls, stats.hearts),
                    progress: Some(self.runner.progress()),
                })
            }
            GameState::BossDavi => {
                let stats = self.boss.stats();
                let limit = self.settings.boss.intimidation_limit.max(f32::EPSILON);
                Some(Hud {
                    title,
                    line: format!("Stones: {}   Hits: {}/{}", stats.stones, stats.hits, self.boss.needed_hits()),
                    progress: Some(self.boss.courage_left() / limit),
                })
            }
            GameState::JonasPuzzle | GameState::MoisesPuzzle => {
                let puzzle = if self.state == GameState::JonasPuzzle { &self.jonah } else { &self.moses };
                Some(Hud { title, line: puzzle.status_text(), progress: None })
            }
            GameState::JesusGameplay => {
                let hearts = self.collect.stats().hearts;
                let target = self.collect.target().max(1);
                Some(Hud {
                    title,
                    line: format!("Hearts: {}/{}", hearts, self.collect.target()),
                    progress: Some((hearts as f32 / target as f32).min(1.0)),
                })
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub fn go_home(&mut self) {
        self.enter(GameState::Home);
    }

    pub fn go_map(&mut self) {
        self.enter(GameState::Map);
    }

    pub fn start_runner_noe(&mut self) -> Result<(), FlowError> {
        self.launch(World::Noah, GameState::RunnerNoe)
    }

    pub fn start_boss_davi(&mut self) -> Result<(), FlowError> {
        self.launch(World::David, GameState::BossDavi)
    }

    pub fn start_jonas(&mut self) -> Result<(), FlowError> {
        self.launch(World::Jonah, GameState::JonasPuzzle)
    }

    pub fn start_moises(&mut self) -> Result<(), FlowError> {
        self.launch(World::Moses, GameState::MoisesPuzzle)
    }

    pub fn start_jesus_menu(&mut self) -> Result<(), FlowError> {
        self.launch(World::Jesus, GameState::JesusMenu)
    }

    pub fn start_jesus_gameplay(&mut self) -> Result<(), FlowError> {
        self.launch(World::Jesus, GameState::JesusGameplay)
    }

    /// Enter a world from the map
    pub fn start_world(&mut self, world: World) -> Result<(), FlowError> {
        match world {
            World::Noah => self.start_runner_noe(),
            World::David => self.start_boss_davi(),
            World::Jonah => self.start_jonas(),
            World::Moses => self.start_moises(),
            World::Jesus => self.start_jesus_menu(),
        }
    }

    /// Start a world's gameplay again
    fn retry(&mut self, world: World) -> Result<(), FlowError> {
        match world {
            World::Jesus => self.start_jesus_gameplay(),
            other => self.start_world(other),
        }
    }

    fn launch(&mut self, world: World, state: GameState) -> Result<(), FlowError> {
        let required = world.required_unlocked();
        let unlocked = self.save.worlds_unlocked;
        if unlocked < required {
            log::info!("{} is locked ({} of {} worlds unlocked)", world.title(), unlocked, required);
            self.events.push(GameEvent::Blocked { world, required });
            let body = match World::from_number(required.saturating_sub(1)) {
                Some(previous) => format!("Finish world {} first.", previous.number()),
                None => "This world is not open yet.".to_string(),
            };
            self.show_modal(Modal::new("Locked", body, ModalButton::new("OK", ModalAction::GoMap)));
            return Err(FlowError::Locked { world: world.number(), required, unlocked });
        }

        self.enter(state);
        if let Some((mode, stage, _)) = self.split_active() {
            mode.set_enabled(true);
            mode.reset(stage);
            log::debug!("Enabled {} mode", mode.name());
        }
        Ok(())
    }

    fn enter(&mut self, state: GameState) {
        let was_playing = self.state.is_gameplay();
        self.cleanup();
        if was_playing {
            // Flush play time gathered during the attempt
            self.commit();
        }
        log::info!("State {:?} -> {:?}", self.state, state);
        self.state = state;
        self.events.push(GameEvent::StateChanged(state));
    }

    /// Disable every mode, reset the avatar and wipe tagged objects
    fn cleanup(&mut self) {
        let modes: [&mut dyn Mode; 5] = [
            &mut self.runner,
            &mut self.boss,
            &mut self.jonah,
            &mut self.moses,
            &mut self.collect,
        ];
        for mode in modes {
            mode.set_enabled(false);
        }
        let removed = self.stage.clear();
        log::debug!("Cleanup removed {} objects", removed);

        self.input.clear();
        self.clock.reset();
        self.mode_events.clear();
        self.modal = None;
        self.quiz = None;
        self.paused = false;
    }

    /// The mode owned by the current state, alongside what it ticks with
    fn split_active(&mut self) -> Option<(&mut dyn Mode, &mut Stage, &mut Vec<ModeEvent>)> {
        let mode: &mut dyn Mode = match self.state {
            GameState::RunnerNoe => &mut self.runner,
            GameState::BossDavi => &mut self.boss,
            GameState::JonasPuzzle => &mut self.jonah,
            GameState::MoisesPuzzle => &mut self.moses,
            GameState::JesusGameplay => &mut self.collect,
            GameState::Home | GameState::Map | GameState::JesusMenu => return None,
        };
        Some((mode, &mut self.stage, &mut self.mode_events))
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    fn frozen(&self) -> bool {
        self.paused || self.modal.is_some() || self.quiz.is_some()
    }

    /// Per-frame phase
    pub fn update(&mut self, dt: f32) {
        let input = self.input.snapshot();
        self.input.consume();
        self.elapsed += dt;

        if self.frozen() || !self.state.is_gameplay() {
            return;
        }

        self.save.stats.play_seconds += f64::from(dt);
        let dt = dt * self.settings.game_speed;
        if let Some((mode, stage, events)) = self.split_active() {
            mode.update(stage, &input, dt, events);
        }
        self.apply_mode_events();
    }

    /// Physics phase, called once per fixed step
    pub fn fixed_update(&mut self, dt: f32) {
        if self.frozen() {
            return;
        }
        let dt = dt * self.settings.game_speed;
        if let Some((mode, stage, events)) = self.split_active() {
            mode.fixed_update(stage, dt, events);
        }
        self.apply_mode_events();
    }

    /// One frame: the per-frame phase plus whatever fixed steps are due
    pub fn advance(&mut self, delta: Duration) {
        self.update(delta.as_secs_f32());
        let steps = self.clock.update(delta);
        let step = self.clock.step();
        for _ in 0..steps {
            self.fixed_update(step);
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        if !self.state.is_gameplay() {
            return false;
        }
        self.paused = !self.paused;
        log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
        self.events.push(GameEvent::Paused(self.paused));
        self.paused
    }

    // ------------------------------------------------------------------
    // Mode events
    // ------------------------------------------------------------------

    fn apply_mode_events(&mut self) {
        for event in std::mem::take(&mut self.mode_events) {
            self.handle_mode_event(event);
        }
    }

    fn handle_mode_event(&mut self, event: ModeEvent) {
        match event {
            ModeEvent::Collected(kind) => {
                self.events.push(GameEvent::Collected(kind));
                match kind {
                    CollectibleKind::Scroll => {
                        self.save.stats.scrolls_collected = self.save.stats.scrolls_collected.saturating_add(1)
                    }
                    CollectibleKind::Heart => {
                        self.save.stats.hearts_collected = self.save.stats.hearts_collected.saturating_add(1)
                    }
                    CollectibleKind::Stone => return,
                }
                self.commit();
            }
            ModeEvent::RunnerFinished(stats) => {
                let bonus = self.achievements.record_run_victory(RunVictory { missed_collectibles: stats.missed });
                self.complete_world(World::Noah, stats.scrolls, bonus);
                self.show_quiz(Quiz::noah());
            }
            ModeEvent::RunnerFailed(_) => {
                self.events.push(GameEvent::PlayerHit);
                self.show_modal(
                    Modal::new(
                        "Oops!",
                        "You bumped into an obstacle. Try again!",
                        ModalButton::new("Restart", ModalAction::Retry(World::Noah)),
                    )
                    .with_secondary(ModalButton::new("Map", ModalAction::GoMap)),
                );
            }
            ModeEvent::BossAiming => self.events.push(GameEvent::BossAiming),
            ModeEvent::BossHit { hits, needed } => self.events.push(GameEvent::BossHit { hits, needed }),
            ModeEvent::BossMiss => self.events.push(GameEvent::BossMiss),
            ModeEvent::BossWon(stats) => {
                let bonus = self.achievements.record_boss_victory(BossVictory {
                    misses: stats.misses,
                    elapsed: stats.elapsed,
                });
                self.complete_world(World::David, 0, bonus);
                self.show_victory("Victory!", "You won with courage and strategy!", World::David);
            }
            ModeEvent::BossFailed(_) => {
                self.show_modal(
                    Modal::new(
                        "Almost!",
                        "Goliath scared you, but you can try again!",
                        ModalButton::new("Try again", ModalAction::Retry(World::David)),
                    )
                    .with_secondary(ModalButton::new("Map", ModalAction::GoMap)),
                );
            }
            ModeEvent::PuzzleStep { kind, step } => self.events.push(GameEvent::PuzzleStep { kind, step }),
            ModeEvent::PuzzleSolved(kind) => {
                let (world, title, body) = match kind {
                    PuzzleKind::Jonah => (World::Jonah, "Well done!", "You put the story in the right order!"),
                    PuzzleKind::Moses => (World::Moses, "Amazing!", "You remembered the order of the miracle!"),
                };
                self.complete_world(world, 0, Vec::new());
                self.show_victory(title, body, world);
            }
            ModeEvent::PuzzleWrong(kind) => {
                self.show_modal(
                    Modal::new(
                        "Almost!",
                        "That was not the right order. Try again!",
                        ModalButton::new("Try", ModalAction::ResetPuzzle(kind)),
                    )
                    .with_secondary(ModalButton::new("Map", ModalAction::GoMap)),
                );
            }
            ModeEvent::CollectFinished(_) => {
                self.complete_world(World::Jesus, 0, Vec::new());
                self.show_victory("Congratulations!", "You gathered love and kindness along the way!", World::Jesus);
            }
        }
    }

    /// Grant a world's reward, persist, and record achievements
    fn complete_world(&mut self, world: World, scrolls: u32, bonus: Vec<AchievementId>) {
        let reward = world.reward();
        let coins = reward.coins_for(scrolls, &self.settings.economy);
        self.save.add_coins(coins);
        self.save.add_virtues(reward.virtues);
        if let Some(target) = reward.unlocks {
            if self.save.unlock_world(target) {
                log::info!("World {} unlocked", target);
                self.events.push(GameEvent::WorldUnlocked(target));
            }
        }
        log::info!("{} complete: +{} coins, +{} virtues", world.title(), coins, reward.virtues);
        self.add_message(
            format!("+{} coins, +{} virtues", coins, reward.virtues),
            MessageCategory::Reward,
        );
        self.events.push(GameEvent::RewardGranted { world, coins, virtues: reward.virtues });

        let mut unlocked = bonus;
        unlocked.extend(self.achievements.record_world_complete(world));
        self.announce(unlocked);
        self.commit();
    }

    fn show_victory(&mut self, title: &str, body: &str, world: World) {
        let virtues: Vec<&str> = world.virtues().iter().map(|v| v.name()).collect();
        let label = if virtues.len() > 1 { "Virtues" } else { "Virtue" };
        let body = format!("{}\n{}: {}", body, label, virtues.join(" + "));
        self.show_modal(Modal::new(title, body, ModalButton::new("Map", ModalAction::GoMap)));
    }

    // ------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------

    fn show_modal(&mut self, modal: Modal) {
        log::debug!("Modal: {}", modal.title);
        self.events.push(GameEvent::ModalShown { title: modal.title.clone() });
        self.modal = Some(modal);
    }

    fn show_quiz(&mut self, quiz: Quiz) {
        self.events.push(GameEvent::QuizShown);
        self.quiz = Some(quiz);
    }

    /// Press a modal button and run its action
    pub fn choose_modal(&mut self, choice: ModalChoice) -> Result<(), FlowError> {
        let Some(modal) = self.modal.take() else {
            return Ok(());
        };
        match modal.action(choice) {
            ModalAction::Dismiss => Ok(()),
            ModalAction::GoMap => {
                self.go_map();
                Ok(())
            }
            ModalAction::Retry(world) => self.retry(world),
            ModalAction::ResetPuzzle(kind) => {
                let puzzle = match kind {
                    PuzzleKind::Jonah => &mut self.jonah,
                    PuzzleKind::Moses => &mut self.moses,
                };
                puzzle.restart();
                self.events.push(GameEvent::PuzzleStep { kind, step: 0 });
                Ok(())
            }
        }
    }

    /// Answer the open quiz; returns whether the answer was right
    pub fn answer_quiz(&mut self, choice: usize) -> Option<bool> {
        let correct = self.quiz.as_mut()?.answer(choice)?;
        self.events.push(GameEvent::QuizAnswered { correct });
        Some(correct)
    }

    /// Close the quiz and head back to the map
    pub fn continue_quiz(&mut self) {
        if self.quiz.take().is_some() {
            self.go_map();
        }
    }

    // ------------------------------------------------------------------
    // Player actions outside the tick
    // ------------------------------------------------------------------

    /// Place a story beat in whichever puzzle is active
    pub fn puzzle_pick(&mut self, index: usize) -> PickOutcome {
        if self.frozen() {
            return PickOutcome::Ignored;
        }
        let outcome = match self.state {
            GameState::JonasPuzzle => self.jonah.pick(index, &mut self.mode_events),
            GameState::MoisesPuzzle => self.moses.pick(index, &mut self.mode_events),
            _ => {
                log::debug!("Puzzle pick {} ignored in {:?}", index, self.state);
                return PickOutcome::Ignored;
            }
        };
        self.apply_mode_events();
        outcome
    }

    pub fn set_hero(&mut self, index: i64) -> Hero {
        let hero = Hero::from_index(index);
        self.save.selected_hero = hero;
        self.events.push(GameEvent::HeroChanged(hero));
        self.commit();
        hero
    }

    pub fn select_skin(&mut self, index: i64) -> SkinSelection {
        let index = clamp_skin(index);
        let selection = if self.save.owns_skin(index) {
            self.save.selected_skin = index;
            self.commit();
            SkinSelection::Selected { index }
        } else {
            self.show_modal(Modal::new(
                "Skin locked",
                "Buy the skin in the shop first.",
                ModalButton::new("OK", ModalAction::Dismiss),
            ));
            SkinSelection::Locked { index }
        };
        self.events.push(GameEvent::SkinSelected(selection));
        selection
    }

    pub fn buy_skin(&mut self, index: i64) -> PurchaseOutcome {
        let index = clamp_skin(index);
        let price = self.settings.economy.skin_prices.get(index).copied().unwrap_or(0);

        let outcome = if self.save.owns_skin(index) {
            PurchaseOutcome::AlreadyOwned { index }
        } else if !self.save.spend_coins(price) {
            PurchaseOutcome::InsufficientCoins { index, price }
        } else {
            self.save.owned_skins[index] = true;
            log::info!("Bought skin {} for {} coins", index, price);
            self.commit();
            PurchaseOutcome::Purchased { index, price }
        };

        let modal = match outcome {
            PurchaseOutcome::AlreadyOwned { .. } => Modal::new(
                "Already owned",
                "You already own this skin.",
                ModalButton::new("OK", ModalAction::Dismiss),
            ),
            PurchaseOutcome::InsufficientCoins { price, .. } => Modal::new(
                "Not enough coins",
                format!("You need {} coins.", price),
                ModalButton::new("OK", ModalAction::Dismiss),
            ),
            PurchaseOutcome::Purchased { .. } => Modal::new(
                "Purchased!",
                "Skin unlocked.",
                ModalButton::new("OK", ModalAction::Dismiss),
            ),
        };
        self.show_modal(modal);
        self.events.push(GameEvent::Purchase(outcome));
        outcome
    }

    /// Delete saved progress and start over from defaults
    pub fn reset_progress(&mut self) {
        if let Err(e) = reset_save(self.store.as_mut()) {
            log::warn!("Failed to delete save: {}", e);
            self.events.push(GameEvent::SaveFailed(e.to_string()));
        }
        self.save = load_save(self.store.as_ref());
        if self.settings.debug.unlock_all_levels {
            self.save.worlds_unlocked = crate::progression::MAX_WORLDS;
        }
        self.add_message("Progress reset", MessageCategory::System);
        self.events.push(GameEvent::ProgressReset);
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Flush progress before the program exits
    pub fn save_progress(&mut self) {
        self.commit();
        log::info!("Progress saved on exit");
    }

    /// Persist progress and unlock any threshold achievements it reached
    fn commit(&mut self) {
        if let Err(e) = write_save(self.store.as_mut(), &self.save) {
            log::warn!("Failed to write save: {}", e);
            self.add_message("Could not save progress", MessageCategory::Warning);
            self.events.push(GameEvent::SaveFailed(e.to_string()));
        }
        let unlocked = self.achievements.check_progress(&self.save);
        self.announce(unlocked);
    }

    fn announce(&mut self, unlocked: Vec<AchievementId>) {
        if unlocked.is_empty() {
            return;
        }
        for id in &unlocked {
            self.add_message(
                format!("Achievement unlocked: {}", id.definition().name),
                MessageCategory::Achievement,
            );
            self.events.push(GameEvent::AchievementUnlocked(*id));
        }
        if let Err(e) = self.achievements.save(self.store.as_mut()) {
            log::warn!("Failed to write achievements: {}", e);
            self.events.push(GameEvent::SaveFailed(e.to_string()));
        }
    }

    pub fn add_message(&mut self, text: impl Into<String>, category: MessageCategory) {
        self.messages.push(GameMessage {
            text: text.into(),
            timestamp: self.elapsed,
            category,
        });
        if self.messages.len() > MAX_MESSAGES {
            self.messages.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{BossStats, CollectStats, RunStats};
    use crate::save::{MemoryStore, SAVE_KEY};

    fn fresh() -> Game {
        Game::with_seed(GameSettings::default(), Box::new(MemoryStore::new()), 42)
    }

    fn with_unlocked(worlds: u8) -> Game {
        let mut game = fresh();
        game.save.worlds_unlocked = worlds;
        game
    }

    fn short_runner_settings() -> GameSettings {
        let mut settings = GameSettings::default();
        settings.runner.phase_length = 5.0;
        settings.runner.first_obstacle = 10_000.0;
        settings
    }

    fn inject(game: &mut Game, event: ModeEvent) {
        game.mode_events.push(event);
        game.apply_mode_events();
    }

    #[test]
    fn test_fresh_save_blocks_boss() {
        let mut game = fresh();
        game.go_map();
        let result = game.start_boss_davi();
        assert_eq!(result, Err(FlowError::Locked { world: 2, required: 2, unlocked: 1 }));
        assert_eq!(game.state(), GameState::Map);
        assert_eq!(game.modal().map(|m| m.title.as_str()), Some("Locked"));

        game.choose_modal(ModalChoice::Primary).unwrap();
        assert_eq!(game.state(), GameState::Map);
        assert!(game.modal().is_none());
    }

    #[test]
    fn test_jesus_states_need_five_worlds() {
        let mut game = with_unlocked(4);
        assert!(game.start_jesus_menu().is_err());
        assert!(game.start_jesus_gameplay().is_err());
        game.save.worlds_unlocked = 5;
        assert!(game.start_jesus_menu().is_ok());
        assert_eq!(game.state(), GameState::JesusMenu);
        assert!(game.enabled_modes().is_empty());
    }

    #[test]
    fn test_runner_completion_rewards_and_quiz() {
        let mut game = Game::with_seed(short_runner_settings(), Box::new(MemoryStore::new()), 1);
        game.start_runner_noe().unwrap();

        for _ in 0..200 {
            game.advance(Duration::from_millis(20));
            if game.quiz().is_some() {
                break;
            }
        }

        assert!(game.quiz().is_some());
        assert_eq!(game.save().worlds_unlocked, 2);
        assert!((10..=120).contains(&game.save().coins));
        assert_eq!(game.save().virtues, 1);
        assert!(game.achievements().is_unlocked(AchievementId::CompleteWorld1));

        let persisted = load_save(game.store());
        assert_eq!(persisted.worlds_unlocked, 2);

        assert_eq!(game.answer_quiz(0), Some(true));
        game.continue_quiz();
        assert_eq!(game.state(), GameState::Map);
    }

    #[test]
    fn test_runner_reward_is_clamped() {
        let mut game = fresh();
        game.start_runner_noe().unwrap();
        inject(&mut game, ModeEvent::RunnerFinished(RunStats { scrolls: 500, ..RunStats::default() }));
        assert_eq!(game.save().coins, 120);
    }

    #[test]
    fn test_boss_win_rewards() {
        let mut game = with_unlocked(2);
        game.start_boss_davi().unwrap();
        inject(&mut game, ModeEvent::BossWon(BossStats { hits: 3, elapsed: 40.0, ..BossStats::default() }));

        assert_eq!(game.save().worlds_unlocked, 3);
        assert_eq!(game.save().coins, 80);
        assert_eq!(game.save().virtues, 2);
        assert!(game.achievements().is_unlocked(AchievementId::DefeatGoliathPerfect));
        assert!(!game.achievements().is_unlocked(AchievementId::DefeatGoliathFast));
        assert_eq!(game.modal().map(|m| m.title.as_str()), Some("Victory!"));
    }

    #[test]
    fn test_boss_failure_offers_retry() {
        let mut game = with_unlocked(2);
        game.start_boss_davi().unwrap();
        inject(&mut game, ModeEvent::BossFailed(BossStats::default()));
        assert_eq!(game.save().coins, 0);

        game.choose_modal(ModalChoice::Primary).unwrap();
        assert_eq!(game.state(), GameState::BossDavi);
        assert_eq!(game.boss().stats(), BossStats::default());
        assert_eq!(game.enabled_modes(), vec!["boss"]);
    }

    #[test]
    fn test_boss_intimidation_through_ticks() {
        let mut game = with_unlocked(2);
        game.start_boss_davi().unwrap();
        for _ in 0..30 {
            game.update(1.0);
        }
        assert!(game.boss().phase().is_over());
        assert_eq!(game.modal().map(|m| m.title.as_str()), Some("Almost!"));
    }

    #[test]
    fn test_jonah_wrong_then_right() {
        let mut game = with_unlocked(3);
        game.start_jonas().unwrap();

        for pick in [1, 0, 2] {
            game.puzzle_pick(pick);
        }
        assert_eq!(game.puzzle(PuzzleKind::Jonah).status(), crate::modes::PuzzleStatus::Wrong);
        assert_eq!(game.save().worlds_unlocked, 3);

        // "Try" resets the puzzle in place
        game.choose_modal(ModalChoice::Primary).unwrap();
        assert_eq!(game.state(), GameState::JonasPuzzle);
        assert_eq!(game.puzzle(PuzzleKind::Jonah).step(), 0);

        let outcomes: Vec<PickOutcome> = [0, 1, 2].into_iter().map(|p| game.puzzle_pick(p)).collect();
        assert_eq!(outcomes.last(), Some(&PickOutcome::Solved));
        assert_eq!(game.save().worlds_unlocked, 4);
        assert_eq!(game.save().coins, 70);
    }

    #[test]
    fn test_moses_solve_rewards() {
        let mut game = with_unlocked(4);
        game.start_moises().unwrap();

        let outcomes: Vec<PickOutcome> = [0, 1, 2, 3].into_iter().map(|p| game.puzzle_pick(p)).collect();
        assert_eq!(outcomes.last(), Some(&PickOutcome::Solved));
        assert_eq!(game.save().coins, 90);
        assert_eq!(game.save().virtues, 2);
        assert_eq!(game.save().worlds_unlocked, 5);
        assert!(game.achievements().is_unlocked(AchievementId::CompleteWorld4));
        assert_eq!(game.modal().map(|m| m.title.as_str()), Some("Amazing!"));

        let persisted = load_save(game.store());
        assert_eq!((persisted.coins, persisted.virtues, persisted.worlds_unlocked), (90, 2, 5));
    }

    #[test]
    fn test_collect_finish_rewards() {
        let mut game = with_unlocked(5);
        game.start_jesus_gameplay().unwrap();
        game.drain_events();

        inject(&mut game, ModeEvent::CollectFinished(CollectStats::default()));
        assert_eq!(game.save().coins, 100);
        assert_eq!(game.save().virtues, 2);
        assert_eq!(game.save().worlds_unlocked, 5);
        assert!(!game
            .drain_events()
            .iter()
            .any(|event| matches!(event, GameEvent::WorldUnlocked(_))));
        assert_eq!(game.modal().map(|m| m.title.as_str()), Some("Congratulations!"));
    }

    #[test]
    fn test_collected_items_are_persisted() {
        let mut game = fresh();
        game.start_runner_noe().unwrap();
        inject(&mut game, ModeEvent::Collected(CollectibleKind::Scroll));
        inject(&mut game, ModeEvent::Collected(CollectibleKind::Stone));
        assert_eq!(game.save().stats.scrolls_collected, 1);

        let persisted = load_save(game.store());
        assert_eq!(persisted.stats.scrolls_collected, 1);
        assert_eq!(persisted.stats.hearts_collected, 0);

        game.save.worlds_unlocked = 5;
        game.start_jesus_gameplay().unwrap();
        inject(&mut game, ModeEvent::Collected(CollectibleKind::Heart));
        assert_eq!(load_save(game.store()).stats.hearts_collected, 1);
    }

    #[test]
    fn test_puzzle_picks_outside_puzzle_are_ignored() {
        let mut game = with_unlocked(5);
        game.go_map();
        assert_eq!(game.puzzle_pick(0), PickOutcome::Ignored);
        game.start_moises().unwrap();
        assert_eq!(game.puzzle_pick(0), PickOutcome::Placed { step: 1 });
        assert_eq!(game.puzzle(PuzzleKind::Jonah).step(), 0);
    }

    #[test]
    fn test_completion_never_lowers_unlocks() {
        let mut game = with_unlocked(5);
        game.start_runner_noe().unwrap();
        inject(&mut game, ModeEvent::RunnerFinished(RunStats::default()));
        assert_eq!(game.save().worlds_unlocked, 5);

        game.start_jesus_gameplay().unwrap();
        inject(&mut game, ModeEvent::CollectFinished(CollectStats::default()));
        assert_eq!(game.save().worlds_unlocked, 5);
        assert!(game.achievements().is_unlocked(AchievementId::CompleteWorld5));
    }

    #[test]
    fn test_cleanup_leaves_one_mode_and_no_objects() {
        let mut game = with_unlocked(5);
        game.start_runner_noe().unwrap();
        assert!(game.stage().scene.obstacle_count() > 0);

        game.start_boss_davi().unwrap();
        assert_eq!(game.enabled_modes(), vec!["boss"]);
        assert_eq!(game.stage().scene.obstacle_count(), 0);
        assert_eq!(game.stage().scene.collectible_count(), 12);

        game.go_map();
        assert!(game.enabled_modes().is_empty());
        assert!(game.stage().scene.objects().is_empty());
        assert_eq!(game.stage().avatar.z, crate::modes::stage::AVATAR_START_Z);
    }

    #[test]
    fn test_pause_freezes_ticks() {
        let mut game = fresh();
        game.start_runner_noe().unwrap();
        assert!(game.toggle_pause());
        let z = game.stage().avatar.z;
        game.advance(Duration::from_millis(100));
        assert_eq!(game.stage().avatar.z, z);

        assert!(!game.toggle_pause());
        game.advance(Duration::from_millis(100));
        assert!(game.stage().avatar.z > z);

        game.toggle_pause();
        game.go_map();
        assert!(!game.is_paused());
    }

    #[test]
    fn test_buying_owned_skin_is_noop() {
        let mut game = fresh();
        game.save.coins = 500;
        assert_eq!(game.buy_skin(0), PurchaseOutcome::AlreadyOwned { index: 0 });
        assert_eq!(game.save().coins, 500);
        assert_eq!(game.modal().map(|m| m.title.as_str()), Some("Already owned"));
    }

    #[test]
    fn test_skin_purchase_and_selection() {
        let mut game = fresh();
        game.save.coins = 100;
        assert_eq!(game.select_skin(1), SkinSelection::Locked { index: 1 });
        assert_eq!(game.save().selected_skin, 0);

        assert_eq!(game.buy_skin(2), PurchaseOutcome::InsufficientCoins { index: 2, price: 120 });
        assert_eq!(game.buy_skin(1), PurchaseOutcome::Purchased { index: 1, price: 80 });
        assert_eq!(game.save().coins, 20);
        assert!(game.achievements().is_unlocked(AchievementId::BuyFirstSkin));

        assert_eq!(game.select_skin(9), SkinSelection::Locked { index: 2 });
        assert_eq!(game.select_skin(1), SkinSelection::Selected { index: 1 });
        assert_eq!(load_save(game.store()).selected_skin, 1);
    }

    #[test]
    fn test_hero_index_clamped_and_saved() {
        let mut game = fresh();
        assert_eq!(game.set_hero(-3), Hero::Theo);
        assert_eq!(game.set_hero(7), Hero::Nina);
        assert_eq!(load_save(game.store()).selected_hero, Hero::Nina);
    }

    #[test]
    fn test_reset_progress_reloads_defaults() {
        let mut game = with_unlocked(4);
        game.save.coins = 300;
        game.commit();
        assert!(game.store().get(SAVE_KEY).unwrap().is_some());

        game.reset_progress();
        assert_eq!(game.save(), &SaveData::default());
        assert!(game.store().get(SAVE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_store_loads_defaults() {
        let mut store = MemoryStore::new();
        store.set(SAVE_KEY, "]]").unwrap();
        let game = Game::new(GameSettings::default(), Box::new(store));
        assert_eq!(game.save(), &SaveData::default());
        assert!(game.save().owns_skin(0));
    }

    #[test]
    fn test_events_drain() {
        let mut game = fresh();
        game.go_map();
        let events = game.drain_events();
        assert_eq!(events, vec![GameEvent::StateChanged(GameState::Map)]);
        assert!(game.drain_events().is_empty());
    }
}
