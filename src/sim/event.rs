/// Events emitted while a turn resolves.
/// Buffered, then handed to observers once the turn is complete.

use crate::domain::entity::{ActorKind, Coord};
use crate::error::LogicWarning;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// The tile itself changed (a pitfall got filled).
    TileChanged { at: Coord },
    /// An actor of `kind` arrived at or left `at`.
    Presence { kind: ActorKind, at: Coord },
    /// Move counter changed.
    StatusLine,
    LevelComplete,
    LevelLost,
    Warning(LogicWarning),
}
