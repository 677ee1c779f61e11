/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer is also a `LevelObserver`: engine notifications mark it
/// dirty, so frames are only rebuilt after something actually changed.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{ActorKind, Coord, Direction};
use crate::domain::tile::{Rotation, Tile};
use crate::error::LogicWarning;
use crate::sim::observer::LevelObserver;
use crate::sim::world::{LevelState, Status};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every terminal cell, so row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }
}

// ── Glyphs ──

/// Each game cell is 2 terminal columns wide.
const CELL_W: usize = 2;

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const WALL: Color = Color::Rgb { r: 90, g: 90, b: 110 };
const ICE: Color = Color::Rgb { r: 120, g: 200, b: 230 };
const CRATE: Color = Color::Rgb { r: 190, g: 140, b: 70 };

fn arrow(d: Direction) -> char {
    match d {
        Direction::Up => '↑',
        Direction::Down => '↓',
        Direction::Left => '←',
        Direction::Right => '→',
    }
}

fn tile_glyph(tile: Tile) -> ([char; 2], Color) {
    match tile {
        Tile::Wall => (['▓', '▓'], WALL),
        Tile::Empty => ([' ', ' '], Color::White),
        Tile::Objective => (['(', ')'], Color::Green),
        Tile::Pitfall { filled: false } => (['▒', '▒'], Color::DarkRed),
        Tile::Pitfall { filled: true } => (['·', '·'], Color::DarkGrey),
        Tile::Rotation(Rotation::Left) => (['↺', ' '], Color::Yellow),
        Tile::Rotation(Rotation::Right) => (['↻', ' '], Color::Yellow),
        Tile::Icy { exit: None } => (['~', '~'], ICE),
        Tile::Icy { exit: Some(d) } => ([arrow(d), '~'], ICE),
        Tile::CurvedIcy { vertical, horizontal } => {
            let glyph = match (vertical, horizontal) {
                (Direction::Up, Direction::Right) => ['╰', '─'],
                (Direction::Down, Direction::Right) => ['╭', '─'],
                (Direction::Down, Direction::Left) => ['─', '╮'],
                _ => ['─', '╯'],
            };
            (glyph, ICE)
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Terminal column of map column 0.
    map_x: usize,
    dirty: bool,
    message: Option<(String, Color)>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            map_x: 0,
            dirty: true,
            message: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size()?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Force a full repaint on the next frame (new level, resize).
    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.back.cells.fill(Cell::INVALID);
    }

    /// Show a line under the map until the next level change.
    pub fn set_message(&mut self, text: impl Into<String>, color: Color) {
        self.message = Some((text.into(), color));
        self.dirty = true;
    }

    pub fn clear_message(&mut self) {
        self.message = None;
        self.dirty = true;
    }

    /// Map a terminal position (mouse click) to a level cell.
    pub fn cell_at(&self, column: u16, row: u16) -> Option<Coord> {
        let (column, row) = (column as usize, row as usize);
        if column < self.map_x || row < MAP_ROW { return None; }
        Some(Coord::new((row - MAP_ROW) as i32, ((column - self.map_x) / CELL_W) as i32))
    }

    pub fn render(&mut self, level: &LevelState, index: usize, total: usize) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.sync_size()?;
        }
        if !self.dirty { return Ok(()); }

        self.front.clear();
        self.map_x = self.term_w.saturating_sub(level.cols() * CELL_W) / 2;
        self.compose_hud(level, index, total);
        self.compose_map(level);
        self.compose_footer(level);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        self.dirty = false;
        Ok(())
    }

    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.invalidate();
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    fn compose_hud(&mut self, level: &LevelState, index: usize, total: usize) {
        let left = format!(" DISCAPTIVE  Level {}/{}: {}", index + 1, total, level.title());
        let right = format!("Moves: {} ", level.move_count());
        self.front.put_str(0, HUD_ROW, &left, Color::White, Cell::BASE_BG);
        let rx = self.term_w.saturating_sub(right.chars().count());
        self.front.put_str(rx, HUD_ROW, &right, Color::Yellow, Cell::BASE_BG);
    }

    fn compose_map(&mut self, level: &LevelState) {
        for r in 0..level.rows() {
            for c in 0..level.cols() {
                let at = Coord::new(r as i32, c as i32);
                let (glyph, fg) = self.cell_glyph(level, at);
                let x = self.map_x + c * CELL_W;
                let y = MAP_ROW + r;
                self.front.set(x, y, Cell { ch: glyph[0], fg, bg: Cell::BASE_BG });
                self.front.set(x + 1, y, Cell { ch: glyph[1], fg, bg: Cell::BASE_BG });
            }
        }
    }

    fn cell_glyph(&self, level: &LevelState, at: Coord) -> ([char; 2], Color) {
        match level.occupant_kind_at(at) {
            Some(ActorKind::Player) => {
                let fg = if level.status() == Status::Lost { Color::Red } else { Color::White };
                (['@', arrow(level.player_facing())], fg)
            }
            Some(ActorKind::Guard) => {
                let facing = level.guards().find(|g| g.pos == at).map_or(Direction::Down, |g| g.facing);
                (['G', arrow(facing)], Color::Red)
            }
            Some(ActorKind::Crate) => (['[', ']'], CRATE),
            None => tile_glyph(level.tile_at(at)),
        }
    }

    fn compose_footer(&mut self, level: &LevelState) {
        let y = MAP_ROW + level.rows() + 1;
        let (text, color) = match (&self.message, level.status()) {
            (Some((m, c)), _) => (m.clone(), *c),
            (None, Status::Won) => ("Level complete!  Enter: next level   R: replay".into(), Color::Green),
            (None, Status::Lost) => ("Spotted!  R: restart".into(), Color::Red),
            (None, Status::Playing) => (String::new(), Color::White),
        };
        let x = self.term_w.saturating_sub(text.chars().count()) / 2;
        self.front.put_str(x, y, &text, color, Cell::BASE_BG);

        let help = "Arrows/WASD/click: move   R: restart   N/P: next/prev   Q: quit";
        let hx = self.term_w.saturating_sub(help.chars().count()) / 2;
        self.front.put_str(hx, y + 2, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()
    }
}

impl LevelObserver for Renderer {
    fn on_tile_changed(&mut self, _at: Coord) {
        self.dirty = true;
    }

    fn on_actor_presence_changed(&mut self, _kind: ActorKind, _at: Coord) {
        self.dirty = true;
    }

    fn on_status_line_changed(&mut self) {
        self.dirty = true;
    }

    fn on_level_complete(&mut self) {
        self.clear_message();
    }

    fn on_level_lost(&mut self) {
        self.clear_message();
    }

    fn on_warning(&mut self, warning: &LogicWarning) {
        self.set_message(format!("Level data problem: {warning}"), Color::Yellow);
    }
}
