/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::KeyCode;
use crossterm::style::Color;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::GameConfig;
use domain::entity::Direction;
use sim::level::{LevelCatalog, LevelRules};
use sim::world::{LevelState, Status};
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_WAIT: Duration = Duration::from_millis(50);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        tracing::warn!("config: {w}");
    }

    let catalog = LevelCatalog::discover(&config.levels_dir);
    tracing::info!(source = catalog.source(), levels = catalog.len(), "starting");

    let renderer = Rc::new(RefCell::new(Renderer::new()));
    if let Err(e) = renderer.borrow_mut().init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let start = (config.start_level - 1).min(catalog.len().saturating_sub(1));
    let mut session = Session {
        catalog,
        rules: config.rules.clone(),
        index: start,
        level: None,
        renderer: renderer.clone(),
    };
    let result = if session.open(start, true) || session.open(0, true) {
        game_loop(&mut session)
    } else {
        Err(std::io::Error::other("no level could be loaded"))
    };

    if let Err(e) = renderer.borrow_mut().cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        tracing::error!(error = %e, "terminal error");
        eprintln!("Game error: {e}");
    }

    println!("Thanks for playing Discaptive!");
}

/// File logging. Logging is skipped if the file cannot be opened; the
/// terminal belongs to the game.
fn init_logging(config: &GameConfig) {
    let file = match OpenOptions::new().create(true).append(true).open(&config.log.file) {
        Ok(f) => f,
        Err(_) => return,
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .init();
}

/// The level being played and where it sits in the catalog.
struct Session {
    catalog: LevelCatalog,
    rules: LevelRules,
    index: usize,
    level: Option<LevelState>,
    renderer: Rc<RefCell<Renderer>>,
}

impl Session {
    /// Build a fresh level at `index` and hook the renderer up to it.
    /// Levels that fail to load are skipped in the direction of travel.
    fn open(&mut self, index: usize, forward: bool) -> bool {
        let mut at = index;
        loop {
            let Some(def) = self.catalog.get(at) else { return false };
            match def.build(&self.rules) {
                Ok(mut level) => {
                    level.register_observer(self.renderer.clone());
                    let mut renderer = self.renderer.borrow_mut();
                    renderer.invalidate();
                    if at == index {
                        renderer.clear_message();
                    }
                    self.index = at;
                    self.level = Some(level);
                    return true;
                }
                Err(e) => {
                    tracing::error!(level = %def.name, error = %e, "level failed to load");
                    self.renderer
                        .borrow_mut()
                        .set_message(format!("Skipped {}: {e}", def.name), Color::Red);
                }
            }
            at = match (forward, at) {
                (true, _) => at + 1,
                (false, 0) => return false,
                (false, _) => at - 1,
            };
        }
    }

    fn restart(&mut self) {
        tracing::info!(index = self.index, "restart");
        self.open(self.index, true);
    }

    fn next(&mut self) {
        if !self.open(self.index + 1, true) {
            self.renderer.borrow_mut().set_message("That was the last level.", Color::Cyan);
        }
    }

    fn previous(&mut self) {
        if self.index > 0 {
            self.open(self.index - 1, false);
        }
    }

    fn status(&self) -> Option<Status> {
        self.level.as_ref().map(LevelState::status)
    }
}

fn game_loop(session: &mut Session) -> std::io::Result<()> {
    let mut input = InputState::new();

    loop {
        input.drain_events(FRAME_WAIT);

        if input.ctrl_c_pressed()
            || input.any_pressed(&[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')])
        {
            return Ok(());
        }
        if input.resized {
            session.renderer.borrow_mut().invalidate();
        }

        let keys: Vec<KeyCode> = input.pressed().collect();
        for key in keys {
            handle_key(session, key);
        }

        for &(column, row) in input.clicks() {
            let target = session.renderer.borrow().cell_at(column, row);
            if let (Some(at), Some(level)) = (target, session.level.as_mut()) {
                level.attempt_move_to(at.row, at.col);
            }
        }

        if let Some(level) = &session.level {
            session.renderer.borrow_mut().render(level, session.index, session.catalog.len())?;
        }
    }
}

fn handle_key(session: &mut Session, key: KeyCode) {
    match key {
        KeyCode::Char('r') | KeyCode::Char('R') => session.restart(),
        KeyCode::Char('p') | KeyCode::Char('P') => session.previous(),
        KeyCode::Char('n') | KeyCode::Char('N') => session.next(),
        KeyCode::Enter if session.status() == Some(Status::Won) => session.next(),
        _ => {
            if let (Some(dir), Some(level)) = (key_direction(key), session.level.as_mut()) {
                level.attempt_move(dir);
            }
        }
    }
}

fn key_direction(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}
