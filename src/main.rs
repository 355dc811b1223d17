//! Bible Heroes - Entry Point
//!
//! Initializes the terminal, loads settings and progress, and runs the
//! main loop.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use bible_heroes::data::{export_default_settings, load_settings, DATA_DIR};
use bible_heroes::game::Game;
use bible_heroes::save::FileStore;
use bible_heroes::ui::App;

const LOG_FILE: &str = "bible-heroes.log";

fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // Log to file so output doesn't interfere with the TUI
    match OpenOptions::new().create(true).write(true).truncate(true).open(LOG_FILE) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();
    log::info!("Starting Bible Heroes v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = Path::new(DATA_DIR);
    if std::env::args().any(|arg| arg == "--export-settings") {
        export_default_settings(data_dir)?;
        println!("Wrote default settings to {}", data_dir.display());
        return Ok(());
    }

    let settings = load_settings(data_dir);
    let store = FileStore::default_location();
    log::info!("Saving progress to {}", store.dir().display());
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(settings.target_fps.max(1)));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let mut game = Game::new(settings, Box::new(store));

    let result = run_game_loop(&mut terminal, &mut app, &mut game, frame_time);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("Game exited with error: {}", e);
        eprintln!("Error: {}", e);
    }

    log::info!("Bible Heroes shut down cleanly");
    result
}

/// Main game loop
fn run_game_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    game: &mut Game,
    frame_time: Duration,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        let delta = frame_start.duration_since(last_frame);
        last_frame = frame_start;

        // Drain every pending key so held keys don't lag behind
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events, not releases
                if key.kind == KeyEventKind::Press {
                    match app.handle_input(key, game) {
                        Ok(true) => return Ok(()),
                        Ok(false) => {}
                        Err(e) => log::warn!("Input handling error: {}", e),
                    }
                }
            }
        }

        game.advance(delta);
        app.update(delta.as_secs_f32(), game);

        terminal.draw(|frame| {
            app.render(frame, game);
        })?;

        // Frame rate limiting
        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            std::thread::sleep(frame_time - elapsed);
        }
    }
}
