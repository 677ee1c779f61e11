/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use super::entity::{Axis, Direction};

/// Turn sense of a rotation passage.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rotation {
    Left,
    Right,
}

impl Rotation {
    /// 90° screen-relative turn:
    ///
    /// | facing | Right | Left  |
    /// |--------|-------|-------|
    /// | Up     | Right | Left  |
    /// | Right  | Down  | Up    |
    /// | Down   | Left  | Right |
    /// | Left   | Up    | Down  |
    pub fn turn(self, facing: Direction) -> Direction {
        match (self, facing) {
            (Rotation::Right, Direction::Up)    => Direction::Right,
            (Rotation::Right, Direction::Right) => Direction::Down,
            (Rotation::Right, Direction::Down)  => Direction::Left,
            (Rotation::Right, Direction::Left)  => Direction::Up,
            (Rotation::Left, Direction::Up)     => Direction::Left,
            (Rotation::Left, Direction::Left)   => Direction::Down,
            (Rotation::Left, Direction::Down)   => Direction::Right,
            (Rotation::Left, Direction::Right)  => Direction::Up,
        }
    }
}

/// Outcome of entering a tile, as far as sliding is concerned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlideExit {
    /// Not ice: the actor stops here.
    Stop,
    /// Keep moving in this direction.
    Continue(Direction),
    /// Entered a bend through a wall side. Inconsistent level.
    ClosedSide,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    Empty,
    Objective,
    /// Impassable hole until a crate drops into it.
    Pitfall { filled: bool },
    /// Reorients guards that step on it.
    Rotation(Rotation),
    /// Keeps the actor sliding. `None` = straight on in the direction of travel.
    Icy { exit: Option<Direction> },
    /// Icy bend with one open vertical side and one open horizontal side.
    CurvedIcy { vertical: Direction, horizontal: Direction },
}

impl Tile {
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Blocks every mover except a crate, which falls in and fills it.
    pub fn is_open_pit(self) -> bool {
        matches!(self, Tile::Pitfall { filled: false })
    }

    /// Can this tile record an occupant at all?
    pub fn can_hold(self) -> bool {
        !self.is_wall()
    }

    /// Does this tile count player visits?
    pub fn counts_steps(self) -> bool {
        !matches!(self, Tile::Wall | Tile::Pitfall { .. })
    }

    /// Is `side` one of this curved tile's open sides?
    pub fn is_open_side(self, side: Direction) -> bool {
        match self {
            Tile::CurvedIcy { vertical, horizontal } => side == vertical || side == horizontal,
            _ => false,
        }
    }

    /// Where a slide continues after entering this tile while moving `moving`.
    ///
    /// Straight ice keeps `moving`, fixed ice forces its exit. A bend is
    /// entered through one open side and left through the other.
    pub fn slide_exit(self, moving: Direction) -> SlideExit {
        match self {
            Tile::Icy { exit } => SlideExit::Continue(exit.unwrap_or(moving)),
            Tile::CurvedIcy { vertical, horizontal } => {
                let entered_from = moving.opposite();
                if entered_from == vertical {
                    SlideExit::Continue(horizontal)
                } else if entered_from == horizontal {
                    SlideExit::Continue(vertical)
                } else {
                    SlideExit::ClosedSide
                }
            }
            _ => SlideExit::Stop,
        }
    }

    /// Build a bend from its two open sides, in either order.
    /// Returns `None` unless exactly one side is vertical and one horizontal.
    pub fn curved(a: Direction, b: Direction) -> Option<Tile> {
        match (a.axis(), b.axis()) {
            (Axis::Vertical, Axis::Horizontal) => Some(Tile::CurvedIcy { vertical: a, horizontal: b }),
            (Axis::Horizontal, Axis::Vertical) => Some(Tile::CurvedIcy { vertical: b, horizontal: a }),
            _ => None,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Wall
    }
}
