/// The level grid: one `Cell` per coordinate, row-major.
///
/// Each cell pairs a `Tile` with an optional occupant handle. The grid never
/// owns actors; `Registry` does. Reads outside the grid see a wall, matching
/// the way ragged level files are padded with `#` at load time.

use super::entity::{ActorId, Coord};
use super::tile::Tile;

#[derive(Clone, Copy, Debug, Default)]
pub struct Cell {
    pub tile: Tile,
    pub occupant: Option<ActorId>,
    /// Times the player has been recorded here.
    pub steps: u32,
}

#[derive(Clone, Debug)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid filled with walls.
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid { rows, cols, cells: vec![Cell::default(); rows * cols] }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, at: Coord) -> bool {
        at.row >= 0 && at.col >= 0 && (at.row as usize) < self.rows && (at.col as usize) < self.cols
    }

    #[inline]
    fn index(&self, at: Coord) -> Option<usize> {
        if self.in_bounds(at) {
            Some(at.row as usize * self.cols + at.col as usize)
        } else {
            None
        }
    }

    /// Tile at `at`; out of bounds = wall.
    #[inline]
    pub fn tile(&self, at: Coord) -> Tile {
        self.index(at).map_or(Tile::Wall, |i| self.cells[i].tile)
    }

    #[inline]
    pub fn occupant(&self, at: Coord) -> Option<ActorId> {
        self.index(at).and_then(|i| self.cells[i].occupant)
    }

    pub fn steps(&self, at: Coord) -> u32 {
        self.index(at).map_or(0, |i| self.cells[i].steps)
    }

    /// Replace the tile at `at` (load time, pitfall fill). Out of bounds is ignored.
    pub fn set_tile(&mut self, at: Coord, tile: Tile) {
        if let Some(i) = self.index(at) {
            self.cells[i].tile = tile;
        }
    }

    /// Record (or clear) who stands on `at`.
    ///
    /// Walls never hold anything: asking for it is an engine bug. It
    /// asserts in debug builds and is refused in release builds.
    pub fn set_occupant(&mut self, at: Coord, who: Option<ActorId>) {
        let i = match self.index(at) {
            Some(i) => i,
            None => {
                debug_assert!(who.is_none(), "occupant placed outside the grid at {at}");
                if who.is_some() {
                    tracing::error!(%at, "refused to place an occupant outside the grid");
                }
                return;
            }
        };
        if who.is_some() && !self.cells[i].tile.can_hold() {
            debug_assert!(false, "occupant placed on a wall at {at}");
            tracing::error!(%at, "refused to place an occupant on a wall");
            return;
        }
        self.cells[i].occupant = who;
    }

    /// Bump the player's visit counter (skipped for walls and pitfalls).
    pub fn count_step(&mut self, at: Coord) {
        if let Some(i) = self.index(at) {
            if self.cells[i].tile.counts_steps() {
                self.cells[i].steps += 1;
            }
        }
    }

    /// All coordinates, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        let cols = self.cols;
        (0..self.rows * self.cols).map(move |i| Coord::new((i / cols) as i32, (i % cols) as i32))
    }
}
