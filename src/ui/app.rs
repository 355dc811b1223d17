//! Main UI Application
//!
//! Routes keys to the flow controller, turns its events into toasts and
//! tweens, and draws whichever screen the current state calls for.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::seq::SliceRandom;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
};

use crate::game::{Game, GameEvent, GameState, MessageCategory, Modal, ModalChoice, Quiz};
use crate::modes::{BossPhase, CollectibleKind, ObjectKind, PuzzleKind, LANE_X};
use crate::progression::{skin_name, Hero, World, MAX_SKINS};
use crate::save::all_achievements;
use super::tween::{Tween, TweenQueue, UiElement};

/// How far ahead of the avatar the track view reaches
const TRACK_DEPTH: f32 = 30.0;
/// Seconds a toast stays on screen
const TOAST_SECONDS: f32 = 2.5;

/// Pages reachable from the title screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Main,
    Hero,
    Shop,
    Achievements,
}

/// Short-lived notification in the corner
#[derive(Debug, Clone)]
struct Toast {
    text: String,
    color: (u8, u8, u8),
}

/// Main UI application
pub struct App {
    /// Current page while on the title screen
    page: Page,
    tweens: TweenQueue,
    toast: Option<Toast>,
    /// Display order of the active puzzle's beats; digit keys index into it
    puzzle_order: Vec<usize>,
    /// Set after the first press of the reset key
    confirm_reset: bool,
    achievements_scroll: u16,
}

impl App {
    pub fn new() -> Self {
        Self {
            page: Page::Main,
            tweens: TweenQueue::new(),
            toast: None,
            puzzle_order: Vec::new(),
            confirm_reset: false,
            achievements_scroll: 0,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Advance animations and react to what happened in the game
    pub fn update(&mut self, dt: f32, game: &mut Game) {
        self.tweens.tick(dt);
        if self.tweens.value(UiElement::Toast).is_none() {
            self.toast = None;
        }
        for event in game.drain_events() {
            self.on_event(event);
        }
    }

    fn show_toast(&mut self, text: impl Into<String>, color: (u8, u8, u8)) {
        self.toast = Some(Toast { text: text.into(), color });
        self.tweens.push(Tween::fade_out(UiElement::Toast, TOAST_SECONDS));
    }

    fn on_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::StateChanged(state) => {
                self.tweens.cancel(UiElement::Modal);
                self.tweens.cancel(UiElement::Quiz);
                let kind = match state {
                    GameState::JonasPuzzle => Some(PuzzleKind::Jonah),
                    GameState::MoisesPuzzle => Some(PuzzleKind::Moses),
                    _ => None,
                };
                if let Some(kind) = kind {
                    self.shuffle_puzzle(kind);
                }
                if state == GameState::Home {
                    self.page = Page::Main;
                }
            }
            GameEvent::ModalShown { .. } => self.tweens.push(Tween::pop(UiElement::Modal, 0.25)),
            GameEvent::QuizShown => self.tweens.push(Tween::fade_in(UiElement::Quiz, 0.4)),
            GameEvent::QuizAnswered { correct } => {
                if correct {
                    self.show_toast("Correct!", (120, 220, 120));
                } else {
                    self.show_toast("Almost!", (230, 180, 90));
                }
            }
            GameEvent::Collected(kind) => {
                let (text, color) = match kind {
                    CollectibleKind::Scroll => ("+1 scroll", (255, 224, 90)),
                    CollectibleKind::Heart => ("+1 heart", (255, 97, 133)),
                    CollectibleKind::Stone => ("+1 stone", (190, 190, 190)),
                };
                self.show_toast(text, color);
                self.tweens.push(Tween::flash(UiElement::Hud, 0.2));
            }
            GameEvent::PlayerHit => self.tweens.push(Tween::flash(UiElement::Hud, 0.6)),
            GameEvent::BossAiming => self.show_toast("Aiming... press Space to throw", (200, 200, 255)),
            GameEvent::BossHit { hits, needed } => {
                self.show_toast(format!("Hit! {}/{}", hits, needed), (255, 120, 120));
                self.tweens.push(Tween::flash(UiElement::Boss, 0.35));
            }
            GameEvent::BossMiss => {
                self.show_toast("Missed!", (255, 191, 115));
                self.tweens.push(Tween::flash(UiElement::Boss, 0.35));
            }
            GameEvent::RewardGranted { coins, virtues, .. } => {
                self.show_toast(format!("+{} coins  +{} virtues", coins, virtues), (255, 215, 0));
            }
            GameEvent::WorldUnlocked(number) => {
                self.show_toast(format!("World {} unlocked!", number), (140, 220, 255));
            }
            GameEvent::AchievementUnlocked(id) => {
                self.show_toast(format!("Achievement: {}", id.definition().name), (255, 215, 0));
            }
            GameEvent::ProgressReset => self.show_toast("Progress reset", (200, 200, 200)),
            GameEvent::SaveFailed(reason) => {
                log::warn!("Save failed: {}", reason);
                self.show_toast("Could not save!", (255, 90, 90));
            }
            GameEvent::PuzzleStep { kind, step: 0 } => self.shuffle_puzzle(kind),
            _ => {}
        }
    }

    fn shuffle_puzzle(&mut self, kind: PuzzleKind) {
        let mut order: Vec<usize> = (0..kind.steps()).collect();
        order.shuffle(&mut rand::thread_rng());
        self.puzzle_order = order;
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Handle keyboard input, returns true if should quit
    pub fn handle_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        // Global quit shortcut
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            game.save_progress();
            return Ok(true);
        }

        if game.quiz().is_some() {
            self.handle_quiz_input(key, game);
            return Ok(false);
        }
        if game.modal().is_some() {
            self.handle_modal_input(key, game)?;
            return Ok(false);
        }
        if game.is_paused() {
            return self.handle_pause_input(key, game);
        }

        match game.state() {
            GameState::Home => self.handle_home_input(key, game),
            GameState::Map => self.handle_map_input(key, game),
            GameState::JesusMenu => self.handle_jesus_menu_input(key, game),
            GameState::RunnerNoe | GameState::JesusGameplay => self.handle_track_input(key, game),
            GameState::BossDavi => self.handle_boss_input(key, game),
            GameState::JonasPuzzle => self.handle_puzzle_input(key, game),
            GameState::MoisesPuzzle => self.handle_puzzle_input(key, game),
        }
    }

    fn handle_modal_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<()> {
        let choice = match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('1') => ModalChoice::Primary,
            KeyCode::Esc | KeyCode::Char('2') => ModalChoice::Secondary,
            _ => return Ok(()),
        };
        self.tweens.cancel(UiElement::Modal);
        game.choose_modal(choice)?;
        Ok(())
    }

    fn handle_quiz_input(&mut self, key: KeyEvent, game: &mut Game) {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(d) = c.to_digit(10).filter(|d| *d >= 1) {
                    game.answer_quiz(d as usize - 1);
                }
            }
            KeyCode::Enter | KeyCode::Esc => game.continue_quiz(),
            _ => {}
        }
    }

    fn handle_pause_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('p') => {
                game.toggle_pause();
            }
            KeyCode::Char('m') => game.go_map(),
            KeyCode::Char('h') => game.go_home(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_home_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match self.page {
            Page::Main => {
                let reset_pressed = key.code == KeyCode::Char('r');
                match key.code {
                    KeyCode::Enter | KeyCode::Char('p') => game.go_map(),
                    KeyCode::Char('h') => self.page = Page::Hero,
                    KeyCode::Char('s') => self.page = Page::Shop,
                    KeyCode::Char('a') => {
                        self.achievements_scroll = 0;
                        self.page = Page::Achievements;
                    }
                    KeyCode::Char('r') => {
                        if self.confirm_reset {
                            game.reset_progress();
                        }
                        self.confirm_reset = !self.confirm_reset;
                    }
                    KeyCode::Char('q') => {
                        game.save_progress();
                        return Ok(true);
                    }
                    _ => {}
                }
                if !reset_pressed {
                    self.confirm_reset = false;
                }
            }
            Page::Hero => match key.code {
                KeyCode::Left | KeyCode::Char('a') => {
                    let current = game.save().selected_hero.index() as i64;
                    game.set_hero(current - 1);
                }
                KeyCode::Right | KeyCode::Char('d') => {
                    let current = game.save().selected_hero.index() as i64;
                    game.set_hero(current + 1);
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    if let Some(d) = c.to_digit(10).filter(|d| *d >= 1) {
                        game.select_skin(i64::from(d) - 1);
                    }
                }
                KeyCode::Esc | KeyCode::Backspace => self.page = Page::Main,
                _ => {}
            },
            Page::Shop => match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    if let Some(d) = c.to_digit(10).filter(|d| *d >= 1) {
                        game.buy_skin(i64::from(d) - 1);
                    }
                }
                KeyCode::Esc | KeyCode::Backspace => self.page = Page::Main,
                _ => {}
            },
            Page::Achievements => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.achievements_scroll = self.achievements_scroll.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.achievements_scroll = self.achievements_scroll.saturating_add(1);
                }
                KeyCode::Esc | KeyCode::Backspace => self.page = Page::Main,
                _ => {}
            },
        }
        Ok(false)
    }

    fn handle_map_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let world = c.to_digit(10).and_then(|d| World::from_number(d as u8));
                if let Some(world) = world {
                    if let Err(e) = game.start_world(world) {
                        log::info!("{}", e);
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('h') => game.go_home(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_jesus_menu_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => game.start_jesus_gameplay()?,
            KeyCode::Esc => game.go_map(),
            _ => {}
        }
        Ok(false)
    }

    /// Nudge the stick one lane left or right
    fn nudge_stick(game: &mut Game, direction: f32) {
        let (x, y) = game.input_mut().stick();
        game.input_mut().set_stick((x + direction).clamp(-1.0, 1.0), y);
    }

    fn handle_track_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Char('a') => Self::nudge_stick(game, -1.0),
            KeyCode::Right | KeyCode::Char('d') => Self::nudge_stick(game, 1.0),
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char(' ') => game.input_mut().press_jump(),
            KeyCode::Down | KeyCode::Char('s') => game.input_mut().press_slide(),
            KeyCode::Esc | KeyCode::Char('p') => {
                game.toggle_pause();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_boss_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Char('a') => Self::nudge_stick(game, -1.0),
            KeyCode::Right | KeyCode::Char('d') => Self::nudge_stick(game, 1.0),
            KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Up | KeyCode::Char('w') => {
                game.input_mut().press_action();
            }
            KeyCode::Esc | KeyCode::Char('p') => {
                game.toggle_pause();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_puzzle_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let slot = c.to_digit(10).and_then(|d| (d as usize).checked_sub(1));
                if let Some(&index) = slot.and_then(|s| self.puzzle_order.get(s)) {
                    game.puzzle_pick(index);
                }
            }
            KeyCode::Esc | KeyCode::Char('p') => {
                game.toggle_pause();
            }
            _ => {}
        }
        Ok(false)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    pub fn render(&self, frame: &mut Frame, game: &Game) {
        // Clear the entire screen first to prevent artifacts
        frame.render_widget(Clear, frame.area());

        match game.state() {
            GameState::Home => match self.page {
                Page::Main => self.render_home(frame, game),
                Page::Hero => self.render_hero(frame, game),
                Page::Shop => self.render_shop(frame, game),
                Page::Achievements => self.render_achievements(frame, game),
            },
            GameState::Map => self.render_map(frame, game),
            GameState::JesusMenu => self.render_jesus_menu(frame),
            _ => self.render_playing(frame, game),
        }

        if game.is_paused() {
            self.render_pause(frame);
        }
        if let Some(modal) = game.modal() {
            self.render_modal(frame, modal);
        }
        if let Some(quiz) = game.quiz() {
            self.render_quiz(frame, quiz);
        }
        self.render_toast(frame);
    }

    fn render_home(&self, frame: &mut Frame, game: &Game) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(45),
                Constraint::Percentage(25),
            ])
            .split(area);

        let title = vec![
            Line::from(""),
            Line::from(Span::styled(
                "B I B L E   H E R O E S",
                Style::default().fg(Color::Rgb(255, 215, 120)).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Five stories, five adventures",
                Style::default().fg(Color::Rgb(150, 150, 170)),
            )),
        ];
        frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), chunks[0]);

        let save = game.save();
        let reset_line = if self.confirm_reset {
            Span::styled("[R] Press again to erase all progress", Style::default().fg(Color::LightRed))
        } else {
            Span::styled("[R] Reset Progress", Style::default().fg(Color::DarkGray))
        };
        let menu = vec![
            Line::from(vec![
                Span::styled("Coins: ", Style::default().fg(Color::Gray)),
                Span::styled(save.coins.to_string(), Style::default().fg(Color::Yellow)),
                Span::styled("   Virtues: ", Style::default().fg(Color::Gray)),
                Span::styled(save.virtues.to_string(), Style::default().fg(Color::LightMagenta)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "[Enter] Play",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("[H] Hero / Skin", Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(Span::styled("[S] Shop", Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(Span::styled("[A] Achievements", Style::default().fg(Color::Yellow))),
            Line::from(""),
            Line::from(reset_line),
            Line::from(""),
            Line::from(Span::styled("[Q] Quit", Style::default().fg(Color::Gray))),
        ];
        frame.render_widget(Paragraph::new(menu).alignment(Alignment::Center), chunks[1]);

        let version = Paragraph::new(format!("v{}", env!("CARGO_PKG_VERSION")))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(version, chunks[2]);
    }

    fn render_hero(&self, frame: &mut Frame, game: &Game) {
        let area = centered_rect(60, 70, frame.area());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" HERO / SKIN ")
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let save = game.save();
        let mut lines = vec![Line::from("")];
        for hero in Hero::ALL {
            let selected = hero == save.selected_hero;
            let marker = if selected { "▶ " } else { "  " };
            let style = if selected {
                Style::default().fg(rgb(game.avatar_color())).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(rgb(hero.base_color()))
            };
            lines.push(Line::from(Span::styled(format!("{}{}", marker, hero.name()), style)));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Skins", Style::default().fg(Color::Gray))));
        for index in 0..MAX_SKINS {
            let status = if index == save.selected_skin {
                "wearing"
            } else if save.owns_skin(index) {
                "owned"
            } else {
                "locked"
            };
            let color = if save.owns_skin(index) { Color::White } else { Color::DarkGray };
            lines.push(Line::from(Span::styled(
                format!("[{}] {:<10} {}", index + 1, skin_name(index), status),
                Style::default().fg(color),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "[←/→] Hero   [1-3] Skin   [Esc] Back",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn render_shop(&self, frame: &mut Frame, game: &Game) {
        let area = centered_rect(60, 60, frame.area());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" SHOP ")
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let save = game.save();
        let prices = game.settings().economy.skin_prices;
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Coins: ", Style::default().fg(Color::Gray)),
                Span::styled(save.coins.to_string(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
        ];
        for (index, price) in prices.iter().enumerate().take(MAX_SKINS) {
            let (price_text, color) = if save.owns_skin(index) {
                ("owned".to_string(), Color::Green)
            } else if save.coins >= *price {
                (format!("{} coins", price), Color::White)
            } else {
                (format!("{} coins", price), Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("[{}] {:<10} ", index + 1, skin_name(index)), Style::default().fg(color)),
                Span::styled(price_text, Style::default().fg(color)),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("[1-3] Buy   [Esc] Back", Style::default().fg(Color::DarkGray))));

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn render_achievements(&self, frame: &mut Frame, game: &Game) {
        let area = frame.area();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" ACHIEVEMENTS & STATS ")
            .border_style(Style::default().fg(Color::Yellow));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let save = game.save();
        let tracker = game.achievements();

        // Layout: left side for stats, right side for achievements
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(inner);

        let stats_block = Block::default()
            .borders(Borders::ALL)
            .title(" Statistics ")
            .border_style(Style::default().fg(Color::Cyan));
        let stats_inner = stats_block.inner(chunks[0]);
        frame.render_widget(stats_block, chunks[0]);

        let play_seconds = save.stats.play_seconds as u64;
        let stat = |label: &str, value: String, color: Color| {
            Line::from(vec![
                Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
                Span::styled(value, Style::default().fg(color)),
            ])
        };
        let stats_lines = vec![
            Line::from(""),
            stat("Coins", save.coins.to_string(), Color::Yellow),
            stat("Virtues", save.virtues.to_string(), Color::LightMagenta),
            stat("Worlds", format!("{}/{}", save.worlds_unlocked, World::ALL.len()), Color::White),
            stat("Scrolls", save.stats.scrolls_collected.to_string(), Color::White),
            stat("Hearts", save.stats.hearts_collected.to_string(), Color::White),
            stat(
                "Play time",
                format!("{}h {}m", play_seconds / 3600, (play_seconds % 3600) / 60),
                Color::White,
            ),
            Line::from(""),
            stat(
                "Unlocked",
                format!("{}/{} ({:.0}%)", tracker.unlocked().len(), all_achievements().len(), tracker.progress() * 100.0),
                Color::Green,
            ),
            stat("Reward total", format!("{} coins", tracker.total_coin_rewards()), Color::Yellow),
        ];
        frame.render_widget(Paragraph::new(stats_lines), stats_inner);

        let list_block = Block::default()
            .borders(Borders::ALL)
            .title(" Achievements ")
            .border_style(Style::default().fg(Color::Yellow));
        let list_inner = list_block.inner(chunks[1]);
        frame.render_widget(list_block, chunks[1]);

        let mut lines = Vec::new();
        for achievement in all_achievements() {
            let unlocked = tracker.is_unlocked(achievement.id);
            let (mark, color) = if unlocked { ("✔", Color::Green) } else { ("·", Color::DarkGray) };
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", mark), Style::default().fg(color)),
                Span::styled(achievement.name, Style::default().fg(if unlocked { Color::White } else { Color::Gray })),
                Span::styled(format!(" - {}", achievement.description), Style::default().fg(Color::DarkGray)),
            ]));
            if let Some(record) = tracker.record(achievement.id).filter(|r| r.unlocked) {
                lines.push(Line::from(Span::styled(
                    format!("    {}", record.timestamp),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        frame.render_widget(Paragraph::new(lines).scroll((self.achievements_scroll, 0)), list_inner);
    }

    fn render_map(&self, frame: &mut Frame, game: &Game) {
        let area = centered_rect(70, 70, frame.area());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" MAP ")
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let unlocked = game.save().worlds_unlocked;
        let mut lines = vec![Line::from("")];
        for world in World::ALL {
            let open = world.is_open(unlocked);
            let (mark, color) = if open { ("  ", Color::White) } else { ("🔒", Color::DarkGray) };
            lines.push(Line::from(Span::styled(
                format!("{} [{}] {}", mark, world.number(), world.title()),
                Style::default().fg(color),
            )));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled("[1-5] Enter world   [Esc] Home", Style::default().fg(Color::DarkGray))));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_jesus_menu(&self, frame: &mut Frame) {
        let area = centered_rect(60, 40, frame.area());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", World::Jesus.title()))
            .border_style(Style::default().fg(Color::LightMagenta));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = vec![
            Line::from(""),
            Line::from("Walk the road and gather every heart you can."),
            Line::from("Each one is an act of love and kindness."),
            Line::from(""),
            Line::from(Span::styled("[Enter] Start   [Esc] Map", Style::default().fg(Color::DarkGray))),
        ];
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true }),
            inner,
        );
    }

    fn render_playing(&self, frame: &mut Frame, game: &Game) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(8), Constraint::Length(6)])
            .split(area);

        self.render_hud(frame, game, rows[0]);

        match game.state() {
            GameState::JonasPuzzle => self.render_puzzle(frame, game, PuzzleKind::Jonah, rows[1]),
            GameState::MoisesPuzzle => self.render_puzzle(frame, game, PuzzleKind::Moses, rows[1]),
            _ => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Length(25), Constraint::Min(20)])
                    .split(rows[1]);
                self.render_track(frame, game, cols[0]);
                if game.state() == GameState::BossDavi {
                    self.render_boss_panel(frame, game, cols[1]);
                } else {
                    self.render_controls(frame, cols[1]);
                }
            }
        }

        self.render_messages(frame, game, rows[2]);
    }

    fn render_hud(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let Some(hud) = game.hud() else {
            return;
        };
        let flash = self.tweens.value(UiElement::Hud).unwrap_or(0.0);
        let border = if flash > 0.0 { fade((255, 90, 90), flash.max(0.4)) } else { Color::Gray };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", hud.title))
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        let save = game.save();
        let line = Line::from(vec![
            Span::styled(hud.line, Style::default().fg(Color::White)),
            Span::styled(
                format!("   Coins: {}  Virtues: {}", save.coins, save.virtues),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), parts[0]);

        if let Some(progress) = hud.progress {
            let ratio = f64::from(progress.clamp(0.0, 1.0));
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
                .ratio(ratio)
                .label(format!("{:.0}%", ratio * 100.0));
            frame.render_widget(gauge, parts[1]);
        }
    }

    fn render_track(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = inner.height as usize;
        let cols = inner.width as usize;
        if rows < 2 || cols < 3 {
            return;
        }

        let mut grid: Vec<Vec<(char, Color)>> = vec![vec![(' ', Color::Reset); cols]; rows];
        let lane_span = cols as f32 / 3.0;
        for row in grid.iter_mut() {
            for boundary in [lane_span, lane_span * 2.0] {
                let col = boundary as usize;
                if col < cols {
                    row[col] = ('·', Color::DarkGray);
                }
            }
        }

        let to_col = |x: f32| -> Option<usize> {
            let t = (x - LANE_X[0]) / (LANE_X[2] - LANE_X[0]);
            if !(-0.25..=1.25).contains(&t) {
                return None;
            }
            Some(((t * 2.0 + 0.5) * lane_span).clamp(0.0, cols as f32 - 1.0) as usize)
        };
        let to_row = |dz: f32| -> Option<usize> {
            if !(-0.5..=TRACK_DEPTH).contains(&dz) {
                return None;
            }
            let frac = dz.max(0.0) / TRACK_DEPTH;
            Some(((1.0 - frac) * (rows - 1) as f32).round() as usize)
        };

        let avatar = &game.stage().avatar;
        let boss_flash = self.tweens.value(UiElement::Boss).is_some();
        for object in game.stage().scene.objects() {
            let (Some(col), Some(row)) = (to_col(object.x), to_row(object.z - avatar.z)) else {
                continue;
            };
            let glyph = match object.kind {
                ObjectKind::Obstacle => '█',
                ObjectKind::Collectible(CollectibleKind::Scroll) => '§',
                ObjectKind::Collectible(CollectibleKind::Heart) => '♥',
                ObjectKind::Collectible(CollectibleKind::Stone) => '●',
                ObjectKind::Boss if object.x.abs() < 0.5 => if boss_flash { '☼' } else { 'G' },
                ObjectKind::Boss => '▓',
            };
            grid[row][col] = (glyph, object.tint.map(rgb).unwrap_or(Color::White));
        }

        if let Some(col) = to_col(avatar.x) {
            let glyph = if !avatar.grounded {
                '^'
            } else if avatar.sliding {
                '_'
            } else {
                '@'
            };
            grid[rows - 1][col] = (glyph, rgb(game.avatar_color()));
        }

        let lines: Vec<Line> = grid
            .into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|(c, color)| Span::styled(c.to_string(), Style::default().fg(color)))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_boss_panel(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Goliath ")
            .border_style(Style::default().fg(Color::Rgb(77, 102, 184)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let boss = game.boss();
        let stats = boss.stats();
        let width = inner.width.saturating_sub(2).max(3) as usize;

        let aiming = boss.phase() == BossPhase::Aiming;
        let marker = (boss.aim().clamp(0.0, 1.0) * (width - 1) as f32).round() as usize;
        let meter: Vec<Span> = (0..width)
            .map(|i| {
                let pos = i as f32 / (width - 1) as f32;
                let sweet = (pos - 0.5).abs() < boss.aim_tolerance();
                if aiming && i == marker {
                    Span::styled("▲", Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
                } else if sweet {
                    Span::styled("█", Style::default().fg(Color::Green))
                } else {
                    Span::styled("─", Style::default().fg(Color::DarkGray))
                }
            })
            .collect();

        let hint = match boss.phase() {
            BossPhase::Approaching if stats.stones == 0 => "Gather stones along the lanes",
            BossPhase::Approaching => "[Space] Load a stone",
            BossPhase::Aiming => "[Space] Throw when the marker is in the green",
            BossPhase::Won => "Goliath has fallen!",
            BossPhase::Failed => "Goliath's roar was too much...",
        };

        let courage = boss.courage_left();
        let courage_color = if courage < 5.0 { Color::LightRed } else { Color::White };
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("Aim", Style::default().fg(Color::Gray))),
            Line::from(meter),
            Line::from(""),
            Line::from(vec![
                Span::styled("Stones: ", Style::default().fg(Color::Gray)),
                Span::styled(stats.stones.to_string(), Style::default().fg(Color::White)),
                Span::styled("   Hits: ", Style::default().fg(Color::Gray)),
                Span::styled(format!("{}/{}", stats.hits, boss.needed_hits()), Style::default().fg(Color::Green)),
                Span::styled("   Misses: ", Style::default().fg(Color::Gray)),
                Span::styled(stats.misses.to_string(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(vec![
                Span::styled("Courage: ", Style::default().fg(Color::Gray)),
                Span::styled(format!("{:.1}s", courage), Style::default().fg(courage_color)),
            ]),
            Line::from(""),
            Line::from(Span::styled(hint, Style::default().fg(Color::Cyan))),
            Line::from(Span::styled("[←/→] Lane   [Esc] Pause", Style::default().fg(Color::DarkGray))),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Controls ")
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(k, Style::default().fg(Color::Yellow)),
                Span::styled(what, Style::default().fg(Color::Gray)),
            ])
        };
        let lines = vec![
            Line::from(""),
            key("←/→ A/D  ", "change lane"),
            key("↑ W Space", " jump"),
            key("↓ S      ", "slide"),
            key("Esc      ", "pause"),
            Line::from(""),
            Line::from(vec![
                Span::styled("§", Style::default().fg(Color::Rgb(255, 224, 90))),
                Span::styled(" scroll  ", Style::default().fg(Color::Gray)),
                Span::styled("♥", Style::default().fg(Color::Rgb(255, 97, 133))),
                Span::styled(" heart  ", Style::default().fg(Color::Gray)),
                Span::styled("█", Style::default().fg(Color::Rgb(140, 110, 80))),
                Span::styled(" obstacle", Style::default().fg(Color::Gray)),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_puzzle(&self, frame: &mut Frame, game: &Game, kind: PuzzleKind, area: Rect) {
        let area = centered_rect(80, 90, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", kind.title()))
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let puzzle = game.puzzle(kind);
        let labels = kind.labels();
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(puzzle.status_text(), Style::default().fg(Color::White))),
            Line::from(""),
        ];
        for (slot, &index) in self.puzzle_order.iter().enumerate() {
            let used = puzzle.slots().contains(&Some(index));
            let style = if used {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            let label = labels.get(index).copied().unwrap_or("?");
            lines.push(Line::from(Span::styled(format!("[{}] {}", slot + 1, label), style)));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Pick the {} beats in the order they happened", kind.steps()),
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn render_messages(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Messages ")
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);

        let messages: Vec<Line> = game
            .messages()
            .iter()
            .rev()
            .take(inner.height as usize)
            .rev()
            .map(|msg| {
                let color = match msg.category {
                    MessageCategory::Reward => Color::Yellow,
                    MessageCategory::Achievement => Color::LightMagenta,
                    MessageCategory::System => Color::Cyan,
                    MessageCategory::Warning => Color::LightRed,
                };
                Line::from(Span::styled(&msg.text, Style::default().fg(color)))
            })
            .collect();

        frame.render_widget(Paragraph::new(messages).block(block), area);
    }

    fn render_pause(&self, frame: &mut Frame) {
        let area = centered_rect(30, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" PAUSED ")
            .border_style(Style::default().fg(Color::White));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let menu = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("[Esc] Resume", Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(Span::styled("[M] Map", Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(Span::styled("[H] Home", Style::default().fg(Color::Gray))),
        ])
        .alignment(Alignment::Center);

        frame.render_widget(menu, inner);
    }

    fn render_modal(&self, frame: &mut Frame, modal: &Modal) {
        let scale = self.tweens.value(UiElement::Modal).unwrap_or(1.0);
        let height = (35.0 * scale).clamp(10.0, 60.0) as u16;
        let area = centered_rect(50, height, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", modal.title))
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::from("")];
        lines.extend(modal.body.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
        let mut buttons = vec![Span::styled(
            format!("[Enter] {}", modal.primary.label),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )];
        if let Some(secondary) = &modal.secondary {
            buttons.push(Span::raw("    "));
            buttons.push(Span::styled(format!("[Esc] {}", secondary.label), Style::default().fg(Color::Gray)));
        }
        lines.push(Line::from(buttons));

        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true }),
            inner,
        );
    }

    fn render_quiz(&self, frame: &mut Frame, quiz: &Quiz) {
        let alpha = self.tweens.value(UiElement::Quiz).unwrap_or(1.0);
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", quiz.title))
            .border_style(Style::default().fg(fade((140, 220, 255), alpha)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(quiz.question.clone(), Style::default().fg(fade((255, 255, 255), alpha)))),
            Line::from(""),
        ];
        for (i, option) in quiz.options.iter().enumerate() {
            let chosen = quiz.answered() == Some(i);
            let style = if chosen {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(fade((220, 220, 220), alpha))
            };
            lines.push(Line::from(Span::styled(format!("[{}] {}", i + 1, option), style)));
        }
        lines.push(Line::from(""));
        if let Some(feedback) = quiz.feedback() {
            lines.push(Line::from(Span::styled(feedback, Style::default().fg(Color::Green))));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled("[Enter] Continue", Style::default().fg(Color::DarkGray))));

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn render_toast(&self, frame: &mut Frame) {
        let Some(toast) = &self.toast else {
            return;
        };
        let alpha = self.tweens.value(UiElement::Toast).unwrap_or(0.0);
        let full = frame.area();
        let width = (toast.text.chars().count() as u16 + 4).min(full.width);
        let area = Rect {
            x: full.x + full.width.saturating_sub(width + 1),
            y: full.y + 1,
            width,
            height: 3.min(full.height),
        };
        frame.render_widget(Clear, area);
        let color = fade(toast.color, alpha.max(0.25));
        let para = Paragraph::new(Span::styled(toast.text.clone(), Style::default().fg(color)))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        frame.render_widget(para, area);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Scale a colour's brightness by `alpha` in 0..=1
fn fade((r, g, b): (u8, u8, u8), alpha: f32) -> Color {
    let a = alpha.clamp(0.0, 1.0);
    let scale = |c: u8| (c as f32 * a).round() as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let percent_x = percent_x.min(100);
    let percent_y = percent_y.min(100);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameSettings;
    use crate::save::MemoryStore;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn game() -> Game {
        Game::with_seed(GameSettings::default(), Box::new(MemoryStore::new()), 5)
    }

    #[test]
    fn test_home_navigation() {
        let mut app = App::new();
        let mut game = game();
        app.handle_input(key(KeyCode::Char('s')), &mut game).unwrap();
        assert_eq!(app.page(), Page::Shop);
        app.handle_input(key(KeyCode::Esc), &mut game).unwrap();
        app.handle_input(key(KeyCode::Enter), &mut game).unwrap();
        assert_eq!(game.state(), GameState::Map);
        assert!(!app.handle_input(key(KeyCode::Char('q')), &mut game).unwrap());
        game.go_home();
        assert!(app.handle_input(key(KeyCode::Char('q')), &mut game).unwrap());
    }

    #[test]
    fn test_ctrl_q_persists_play_time() {
        let mut app = App::new();
        let mut game = game();
        game.start_runner_noe().unwrap();
        game.update(0.5);

        let quit = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.handle_input(quit, &mut game).unwrap());
        let persisted = crate::save::load_save(game.store());
        assert!((persisted.stats.play_seconds - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_locked_world_shows_modal_and_enter_dismisses() {
        let mut app = App::new();
        let mut game = game();
        game.go_map();
        app.handle_input(key(KeyCode::Char('2')), &mut game).unwrap();
        assert!(game.modal().is_some());
        app.update(0.016, &mut game);
        assert!(app.tweens.value(UiElement::Modal).is_some());

        app.handle_input(key(KeyCode::Enter), &mut game).unwrap();
        assert!(game.modal().is_none());
        assert_eq!(game.state(), GameState::Map);
    }

    #[test]
    fn test_reset_needs_confirmation() {
        let mut app = App::new();
        let mut game = game();
        game.buy_skin(0);
        game.choose_modal(ModalChoice::Primary).unwrap();
        app.handle_input(key(KeyCode::Char('r')), &mut game).unwrap();
        assert!(app.confirm_reset);
        app.handle_input(key(KeyCode::Char('x')), &mut game).unwrap();
        assert!(!app.confirm_reset);
    }

    #[test]
    fn test_arrow_keys_step_the_stick() {
        let mut app = App::new();
        let mut game = game();
        game.start_runner_noe().unwrap();
        app.handle_input(key(KeyCode::Left), &mut game).unwrap();
        assert_eq!(game.input_mut().stick().0, -1.0);
        app.handle_input(key(KeyCode::Left), &mut game).unwrap();
        assert_eq!(game.input_mut().stick().0, -1.0);
        app.handle_input(key(KeyCode::Right), &mut game).unwrap();
        assert_eq!(game.input_mut().stick().0, 0.0);
    }

    #[test]
    fn test_puzzle_digits_follow_display_order() {
        let mut app = App::new();
        let mut settings = GameSettings::default();
        settings.debug.unlock_all_levels = true;
        let mut game = Game::with_seed(settings, Box::new(MemoryStore::new()), 5);
        game.start_jonas().unwrap();
        app.update(0.016, &mut game);
        assert_eq!(app.puzzle_order.len(), 3);

        let first = app.puzzle_order[0];
        app.handle_input(key(KeyCode::Char('1')), &mut game).unwrap();
        assert_eq!(game.puzzle(PuzzleKind::Jonah).slots()[0], Some(first));
    }

    #[test]
    fn test_fade_scales_channels() {
        assert_eq!(fade((200, 100, 0), 0.5), Color::Rgb(100, 50, 0));
        assert_eq!(fade((200, 100, 0), 2.0), Color::Rgb(200, 100, 0));
    }
}
