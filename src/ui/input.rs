/// Input state tracker.
///
/// The game is turn-based, so only edge events matter: each key press
/// (or auto-repeat) is one command, each left click is one move request.
/// Release events are ignored.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

pub struct InputState {
    /// Keys pressed during the most recent drain_events() call, in order.
    presses: Vec<KeyEvent>,

    /// Left clicks as terminal (column, row), in order.
    clicks: Vec<(u16, u16)>,

    /// The terminal was resized.
    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            clicks: Vec::with_capacity(4),
            resized: false,
        }
    }

    /// Drain all pending terminal events, waiting up to `timeout` for the
    /// first one. Call once per frame.
    pub fn drain_events(&mut self, timeout: Duration) {
        self.presses.clear();
        self.clicks.clear();
        self.resized = false;

        let mut wait = timeout;
        while poll(wait).unwrap_or(false) {
            wait = Duration::ZERO;
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    self.presses.push(key);
                }
                Ok(Event::Mouse(m)) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                    self.clicks.push((m.column, m.row));
                }
                Ok(Event::Resize(..)) => self.resized = true,
                _ => {}
            }
        }
    }

    /// Key codes pressed this frame, in arrival order.
    pub fn pressed(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.presses.iter().map(|k| k.code)
    }

    pub fn clicks(&self) -> &[(u16, u16)] {
        &self.clicks
    }

    /// Was any of these keys pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        self.presses.iter().any(|k| codes.contains(&k.code))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
