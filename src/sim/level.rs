/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory: files named `Level<N>.txt`, played in order of N
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Optional first line: `; Level Title`
///   Lines: map rows. Ragged rows are padded with wall, trailing blank
///   lines and `\r` are ignored.
///
/// ## Tile legend:
///   ' ' = Empty passage          '#' = Wall (also any unknown character)
///   '$' = Crate                  '@' = Player (exactly one)
///   '.' = Objective              '*' = Crate on objective
///   '!' = Pitfall                'N' 'S' 'O' 'W' = Guard facing Up/Down/Right/Left
///   'L' = Rotate-left passage    'R' = Rotate-right passage
///   '=' = Ice (keeps direction)  '>' '<' '^' 'v' = Ice with a fixed exit
///   'n' = Curved ice, open Up + Right      'o' = open Down + Right
///   's' = Curved ice, open Down + Left     'w' = open Up + Left

use std::path::{Path, PathBuf};

use crate::domain::entity::{Coord, Crate, Direction, Guard, Player, Registry};
use crate::domain::grid::Grid;
use crate::domain::rules::PushRule;
use crate::domain::tile::{Rotation, Tile};
use crate::error::LoadError;
use crate::sim::world::LevelState;

/// How level characters map to tiles where the mapping is configurable.
#[derive(Clone, Copy, Debug)]
pub struct Legend {
    /// Rotation produced by `R`. Legacy levels were authored with `Left`.
    pub r_rotation: Rotation,
}

impl Default for Legend {
    fn default() -> Self {
        Legend { r_rotation: Rotation::Right }
    }
}

/// Everything needed to turn a `LevelDef` into a playable level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LevelRules {
    pub push: PushRule,
    pub legend: Legend,
}

/// Grid plus actors, as built from the map rows.
pub struct Layout {
    pub grid: Grid,
    pub actors: Registry,
}

/// Runtime level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub title: Option<String>,
    pub rows: Vec<String>,
}

impl LevelDef {
    /// Split level text into rows, pulling out an optional `;` title line.
    pub fn from_text(name: &str, text: &str) -> LevelDef {
        let mut lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        let mut title = None;
        if let Some(first) = lines.first() {
            if let Some(rest) = first.strip_prefix(';') {
                title = Some(rest.trim().to_string()).filter(|t| !t.is_empty());
                lines.remove(0);
            }
        }
        LevelDef {
            name: name.to_string(),
            title,
            rows: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Build a fresh, playable level. Called again on restart.
    pub fn build(&self, rules: &LevelRules) -> Result<LevelState, LoadError> {
        let rows: Vec<&str> = self.rows.iter().map(String::as_str).collect();
        let layout = parse_layout(&rows, &rules.legend)?;
        let title = self.title.clone().unwrap_or_else(|| self.name.clone());
        tracing::info!(
            level = %title,
            rows = layout.grid.rows(),
            cols = layout.grid.cols(),
            guards = layout.actors.guard_ids().len(),
            crates = layout.actors.crate_count(),
            "level loaded"
        );
        Ok(LevelState::new(layout, title, rules.push))
    }
}

/// Parse complete level text.
pub fn parse_level(text: &str, rules: &LevelRules) -> Result<LevelState, LoadError> {
    LevelDef::from_text("untitled", text).build(rules)
}

/// What a level character puts on top of its tile.
enum Spawn {
    Player,
    Guard(Direction),
    Crate,
}

fn decode(ch: char, legend: &Legend) -> (Tile, Option<Spawn>) {
    match ch {
        ' ' => (Tile::Empty, None),
        '#' => (Tile::Wall, None),
        '$' => (Tile::Empty, Some(Spawn::Crate)),
        '@' => (Tile::Empty, Some(Spawn::Player)),
        '.' => (Tile::Objective, None),
        '*' => (Tile::Objective, Some(Spawn::Crate)),
        '!' => (Tile::Pitfall { filled: false }, None),
        'N' => (Tile::Empty, Some(Spawn::Guard(Direction::Up))),
        'S' => (Tile::Empty, Some(Spawn::Guard(Direction::Down))),
        'O' => (Tile::Empty, Some(Spawn::Guard(Direction::Right))),
        'W' => (Tile::Empty, Some(Spawn::Guard(Direction::Left))),
        'L' => (Tile::Rotation(Rotation::Left), None),
        'R' => (Tile::Rotation(legend.r_rotation), None),
        '=' => (Tile::Icy { exit: None }, None),
        '>' => (Tile::Icy { exit: Some(Direction::Right) }, None),
        '<' => (Tile::Icy { exit: Some(Direction::Left) }, None),
        '^' => (Tile::Icy { exit: Some(Direction::Up) }, None),
        'v' => (Tile::Icy { exit: Some(Direction::Down) }, None),
        'n' => (Tile::CurvedIcy { vertical: Direction::Up, horizontal: Direction::Right }, None),
        'o' => (Tile::CurvedIcy { vertical: Direction::Down, horizontal: Direction::Right }, None),
        's' => (Tile::CurvedIcy { vertical: Direction::Down, horizontal: Direction::Left }, None),
        'w' => (Tile::CurvedIcy { vertical: Direction::Up, horizontal: Direction::Left }, None),
        _ => (Tile::Wall, None),
    }
}

/// Build grid and actors from map rows.
///
/// Actors are registered in row-major order, which fixes the guards'
/// turn order.
pub fn parse_layout(rows: &[&str], legend: &Legend) -> Result<Layout, LoadError> {
    let mut rows: Vec<&str> = rows.iter().map(|r| r.trim_end_matches('\r')).collect();
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(LoadError::Empty);
    }

    let found = rows.iter().map(|r| r.matches('@').count()).sum::<usize>();
    if found != 1 {
        return Err(LoadError::PlayerCount { found });
    }

    let height = rows.len();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut grid = Grid::new(height, width);
    let mut spawns = Vec::new();
    let mut legacy_r = false;

    for (r, line) in rows.iter().enumerate() {
        for (c, ch) in line.chars().enumerate() {
            let at = Coord::new(r as i32, c as i32);
            let (tile, spawn) = decode(ch, legend);
            if !matches!(ch, ' ' | '#') && tile == Tile::Wall {
                tracing::debug!(%at, ch = %ch, "unknown level character, using wall");
            }
            legacy_r |= ch == 'R' && legend.r_rotation == Rotation::Left;
            grid.set_tile(at, tile);
            if let Some(s) = spawn {
                spawns.push((at, s));
            }
        }
    }
    if legacy_r {
        tracing::warn!("level uses 'R' with the legacy left-rotation mapping");
    }

    let player_at = spawns.iter().find_map(|(at, s)| matches!(s, Spawn::Player).then_some(*at));
    let Some(player_at) = player_at else {
        return Err(LoadError::PlayerCount { found: 0 });
    };
    let mut actors = Registry::new(Player { pos: player_at, facing: Direction::Up });
    grid.set_occupant(player_at, Some(actors.player_id()));

    for (at, spawn) in spawns {
        let id = match spawn {
            Spawn::Player => continue,
            Spawn::Guard(facing) => actors.add_guard(Guard::new(at, facing)),
            Spawn::Crate => actors.add_crate(Crate { pos: at }),
        };
        grid.set_occupant(at, Some(id));
    }

    Ok(Layout { grid, actors })
}

// ══════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════

/// The ordered list of playable levels.
pub struct LevelCatalog {
    levels: Vec<LevelDef>,
    source: String,
}

impl LevelCatalog {
    /// Levels from `dir`, or the embedded set if the directory has none.
    pub fn discover(dir: &Path) -> LevelCatalog {
        match LevelCatalog::from_dir(dir) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::info!(error = %e, "using embedded levels");
                LevelCatalog::embedded()
            }
        }
    }

    /// Every readable `Level<N>.txt` in `dir`, ordered by N. Unreadable
    /// files are logged and skipped.
    pub fn from_dir(dir: &Path) -> Result<LevelCatalog, LoadError> {
        let entries = std::fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;

        let mut numbered: Vec<(u32, PathBuf)> = entries
            .flatten()
            .map(|e| e.path())
            .filter_map(|p| level_number(&p).map(|n| (n, p)))
            .collect();
        numbered.sort();

        let mut levels = Vec::with_capacity(numbered.len());
        for (n, path) in numbered {
            match std::fs::read_to_string(&path) {
                Ok(text) => levels.push(LevelDef::from_text(&format!("Level {n}"), &text)),
                Err(e) => {
                    tracing::error!(error = %LoadError::io(&path, e), "level file skipped");
                }
            }
        }
        if levels.is_empty() {
            return Err(LoadError::NoLevels { dir: dir.to_path_buf() });
        }
        tracing::info!(dir = %dir.display(), count = levels.len(), "level directory scanned");
        Ok(LevelCatalog { levels, source: dir.display().to_string() })
    }

    pub fn embedded() -> LevelCatalog {
        let levels = EMBEDDED
            .iter()
            .enumerate()
            .map(|(i, text)| LevelDef::from_text(&format!("Level {}", i + 1), text))
            .collect();
        LevelCatalog { levels, source: "embedded".into() }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get(&self, index: usize) -> Option<&LevelDef> {
        self.levels.get(index)
    }
}

/// `Level12.txt` -> 12
fn level_number(path: &Path) -> Option<u32> {
    if path.extension()? != "txt" {
        return None;
    }
    path.file_stem()?.to_str()?.strip_prefix("Level")?.parse().ok()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[&str] = &[
    "; Mind the Gap
########
#@ $ !.#
########
",
    "; Patrol
##########
#@  $!  .#
## ##### #
#  O     #
##########
",
    "; Thin Ice
#########
#@ ==== #
#######.#
#########
",
    "; Around the Bend
########
#@ =s  #
####=###
####.###
########
",
    "; Watchtower
###########
#@   $ ! .#
# ####### #
#R   W    #
###########
",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ActorKind;
    use crate::sim::world::Status;

    fn layout(rows: &[&str]) -> Layout {
        parse_layout(rows, &Legend::default()).unwrap()
    }

    #[test]
    fn legend_tiles() {
        let l = layout(&[" #.!LR=><^vnosw?@"]);
        let tiles: Vec<Tile> = (0..16).map(|c| l.grid.tile(Coord::new(0, c))).collect();
        assert_eq!(tiles[0], Tile::Empty);
        assert_eq!(tiles[1], Tile::Wall);
        assert_eq!(tiles[2], Tile::Objective);
        assert_eq!(tiles[3], Tile::Pitfall { filled: false });
        assert_eq!(tiles[4], Tile::Rotation(Rotation::Left));
        assert_eq!(tiles[5], Tile::Rotation(Rotation::Right));
        assert_eq!(tiles[6], Tile::Icy { exit: None });
        assert_eq!(tiles[7], Tile::Icy { exit: Some(Direction::Right) });
        assert_eq!(tiles[8], Tile::Icy { exit: Some(Direction::Left) });
        assert_eq!(tiles[9], Tile::Icy { exit: Some(Direction::Up) });
        assert_eq!(tiles[10], Tile::Icy { exit: Some(Direction::Down) });
        assert_eq!(tiles[11], Tile::CurvedIcy { vertical: Direction::Up, horizontal: Direction::Right });
        assert_eq!(tiles[12], Tile::CurvedIcy { vertical: Direction::Down, horizontal: Direction::Right });
        assert_eq!(tiles[13], Tile::CurvedIcy { vertical: Direction::Down, horizontal: Direction::Left });
        assert_eq!(tiles[14], Tile::CurvedIcy { vertical: Direction::Up, horizontal: Direction::Left });
        // unknown character
        assert_eq!(tiles[15], Tile::Wall);
    }

    #[test]
    fn legacy_r_mapping() {
        let legend = Legend { r_rotation: Rotation::Left };
        let l = parse_layout(&["@R"], &legend).unwrap();
        assert_eq!(l.grid.tile(Coord::new(0, 1)), Tile::Rotation(Rotation::Left));
    }

    #[test]
    fn actors_and_their_tiles() {
        let l = layout(&["@$*", "NSOW"]);
        let kind = |r, c| l.grid.occupant(Coord::new(r, c)).and_then(|id| l.actors.kind(id));
        assert_eq!(kind(0, 0), Some(ActorKind::Player));
        assert_eq!(kind(0, 1), Some(ActorKind::Crate));
        assert_eq!(kind(0, 2), Some(ActorKind::Crate));
        assert_eq!(l.actors.player().facing, Direction::Up);
        assert_eq!(l.grid.tile(Coord::new(0, 1)), Tile::Empty);
        assert_eq!(l.grid.tile(Coord::new(0, 2)), Tile::Objective);

        let facings: Vec<Direction> = l.actors.guards().map(|g| g.facing).collect();
        assert_eq!(facings, vec![Direction::Up, Direction::Down, Direction::Right, Direction::Left]);
        for c in 0..4 {
            assert_eq!(kind(1, c), Some(ActorKind::Guard));
            assert_eq!(l.grid.tile(Coord::new(1, c)), Tile::Empty);
        }
    }

    #[test]
    fn ragged_rows_are_padded_with_wall() {
        let l = layout(&["@  ", " ", ""]);
        // the trailing empty row is dropped
        assert_eq!(l.grid.rows(), 2);
        assert_eq!(l.grid.cols(), 3);
        assert_eq!(l.grid.tile(Coord::new(1, 0)), Tile::Empty);
        assert_eq!(l.grid.tile(Coord::new(1, 1)), Tile::Wall);
        assert_eq!(l.grid.tile(Coord::new(1, 2)), Tile::Wall);
    }

    #[test]
    fn carriage_returns_are_ignored() {
        let l = layout(&["@ \r", "##\r"]);
        assert_eq!(l.grid.cols(), 2);
        assert_eq!(l.grid.tile(Coord::new(0, 1)), Tile::Empty);
    }

    #[test]
    fn empty_level_is_an_error() {
        assert!(matches!(parse_layout(&[], &Legend::default()), Err(LoadError::Empty)));
        assert!(matches!(parse_layout(&["", ""], &Legend::default()), Err(LoadError::Empty)));
    }

    #[test]
    fn player_count_is_checked() {
        assert!(matches!(
            parse_layout(&["  $ "], &Legend::default()),
            Err(LoadError::PlayerCount { found: 0 })
        ));
        assert!(matches!(
            parse_layout(&["@ @"], &Legend::default()),
            Err(LoadError::PlayerCount { found: 2 })
        ));
    }

    #[test]
    fn title_line() {
        let def = LevelDef::from_text("Level 3", "; The Vault \r\n#@.#\r\n");
        assert_eq!(def.title.as_deref(), Some("The Vault"));
        assert_eq!(def.rows, vec!["#@.#".to_string()]);

        let def = LevelDef::from_text("Level 3", "#@.#\n");
        assert_eq!(def.title, None);
        let level = def.build(&LevelRules::default()).unwrap();
        assert_eq!(level.title(), "Level 3");
    }

    #[test]
    fn parse_level_builds_a_playing_state() {
        let level = parse_level("@$.", &LevelRules::default()).unwrap();
        assert_eq!(level.status(), Status::Playing);
        assert_eq!(level.move_count(), 0);
        assert_eq!(level.crate_count(), 1);
        assert_eq!(level.rows(), 1);
        assert_eq!(level.cols(), 3);
    }

    #[test]
    fn level_numbers_from_file_names() {
        assert_eq!(level_number(Path::new("levels/Level7.txt")), Some(7));
        assert_eq!(level_number(Path::new("Level12.txt")), Some(12));
        assert_eq!(level_number(Path::new("Level.txt")), None);
        assert_eq!(level_number(Path::new("Level3.map")), None);
        assert_eq!(level_number(Path::new("notes.txt")), None);
    }

    #[test]
    fn embedded_levels_all_load() {
        let catalog = LevelCatalog::embedded();
        assert!(catalog.len() >= 5);
        for i in 0..catalog.len() {
            let def = catalog.get(i).unwrap();
            assert!(def.title.is_some(), "{}", def.name);
            def.build(&LevelRules::default()).unwrap();
        }
        assert!(catalog.get(catalog.len()).is_none());
    }

    #[test]
    fn directory_catalog_orders_by_number() {
        let dir = std::env::temp_dir().join(format!("discaptive-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Level10.txt"), "; Ten\n@.\n").unwrap();
        std::fs::write(dir.join("Level2.txt"), "; Two\n@.\n").unwrap();
        std::fs::write(dir.join("readme.md"), "not a level").unwrap();

        let catalog = LevelCatalog::from_dir(&dir).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().title.as_deref(), Some("Two"));
        assert_eq!(catalog.get(1).unwrap().title.as_deref(), Some("Ten"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unreadable_level_file_is_skipped() {
        let dir = std::env::temp_dir().join(format!("discaptive-bad-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("Level2.txt")).unwrap();
        std::fs::write(dir.join("Level1.txt"), "; Mine\n@.\n").unwrap();

        let catalog = LevelCatalog::discover(&dir);
        assert_eq!(catalog.source(), dir.display().to_string());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().title.as_deref(), Some("Mine"));

        // nothing readable at all: no levels
        std::fs::remove_file(dir.join("Level1.txt")).unwrap();
        assert!(matches!(LevelCatalog::from_dir(&dir), Err(LoadError::NoLevels { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let dir = Path::new("/nonexistent/discaptive/levels");
        assert!(matches!(LevelCatalog::from_dir(dir), Err(LoadError::Io { .. })));
        let catalog = LevelCatalog::discover(dir);
        assert_eq!(catalog.source(), "embedded");
        assert!(catalog.len() > 0);
    }
}
