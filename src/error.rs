/// Error and warning types.
///
/// `LoadError` stops a level from being built at all. `LogicWarning` is
/// raised mid-turn for inconsistent level data; the turn still completes.

use std::path::PathBuf;

use crate::domain::entity::{Coord, Direction};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read level file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("level has no rows")]
    Empty,

    #[error("level must contain exactly one player '@', found {found}")]
    PlayerCount { found: usize },

    #[error("no levels found in {}", dir.display())]
    NoLevels { dir: PathBuf },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io { path: path.into(), source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicWarning {
    #[error("actor moving {moving:?} entered the curved ice at {at} through a closed side")]
    CurvedEntry { at: Coord, moving: Direction },

    #[error("slide stopped at {at}: ice loop longer than the level")]
    SlideLimit { at: Coord },

    #[error("planned push onto {at} found the cell occupied; push abandoned")]
    StaleStep { at: Coord },
}
