/// LevelState: the aggregate root of a running level.
///
/// Owns the grid, the actor registry, status and move count, plus the
/// observers that get told about changes. Built once by the loader and
/// mutated in place until it is discarded (restart builds a fresh one).
///
/// All mutation goes through `attempt_move` / `attempt_move_to`. A call
/// resolves the whole turn (see `sim::step`) before any observer hears
/// about it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::entity::{ActorKind, Coord, Direction, Guard, Registry};
use crate::domain::grid::Grid;
use crate::domain::rules::{check_collision, Board, PushRule};
use crate::domain::tile::Tile;
use super::level::Layout;
use super::observer::{LevelObserver, ObserverId, ObserverList};
use super::step;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Playing,
    Won,
    Lost,
}

pub struct LevelState {
    pub(crate) grid: Grid,
    pub(crate) actors: Registry,
    pub(crate) push: PushRule,
    pub(crate) status: Status,
    pub(crate) move_count: u32,
    title: String,
    observers: ObserverList,
}

impl LevelState {
    pub fn new(layout: Layout, title: String, push: PushRule) -> Self {
        LevelState {
            grid: layout.grid,
            actors: layout.actors,
            push,
            status: Status::Playing,
            move_count: 0,
            title,
            observers: ObserverList::default(),
        }
    }

    pub(crate) fn board(&self) -> Board<'_> {
        Board { grid: &self.grid, actors: &self.actors, push: self.push }
    }

    // ── Commands ──

    /// Resolve one player command. Blocked moves and moves after the level
    /// ended are ignored; the status is returned either way.
    pub fn attempt_move(&mut self, dir: Direction) -> Status {
        let events = step::resolve_turn(self, dir);
        self.observers.dispatch(&events);
        self.status
    }

    /// Move toward a neighbouring cell (mouse click). Anything that is not
    /// exactly one cardinal step away is ignored.
    pub fn attempt_move_to(&mut self, row: i32, col: i32) -> Status {
        let here = self.player_position();
        match Direction::from_delta(row - here.row, col - here.col) {
            Some(dir) => self.attempt_move(dir),
            None => self.status,
        }
    }

    /// Would the player's move in `dir` be accepted right now? Changes nothing.
    pub fn can_player_move(&self, dir: Direction) -> bool {
        self.status == Status::Playing
            && !check_collision(&self.board(), self.actors.player_id(), dir).is_blocked()
    }

    // ── Observers ──

    pub fn register_observer(&mut self, observer: Rc<RefCell<dyn LevelObserver>>) -> ObserverId {
        let id = self.observers.register(observer);
        tracing::debug!(observers = self.observers.len(), "observer registered");
        id
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    // ── Queries ──

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn tile_at(&self, at: Coord) -> Tile {
        self.grid.tile(at)
    }

    pub fn occupant_kind_at(&self, at: Coord) -> Option<ActorKind> {
        self.grid.occupant(at).and_then(|id| self.actors.kind(id))
    }

    pub fn is_player_at(&self, at: Coord) -> bool {
        self.player_position() == at
    }

    pub fn player_position(&self) -> Coord {
        self.actors.player().pos
    }

    pub fn player_facing(&self) -> Direction {
        self.actors.player().facing
    }

    /// Guards in turn order.
    pub fn guards(&self) -> impl Iterator<Item = &Guard> + '_ {
        self.actors.guards()
    }

    pub fn crate_count(&self) -> usize {
        self.actors.crate_count()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Times the player has been recorded on `at`. Always 0 for walls and pitfalls.
    pub fn stepped_on_count(&self, at: Coord) -> u32 {
        self.grid.steps(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogicWarning;
    use crate::sim::level::{parse_level, LevelRules};

    fn level_from(rows: &[&str]) -> LevelState {
        parse_level(&rows.join("\n"), &LevelRules::default()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl LevelObserver for Recorder {
        fn on_tile_changed(&mut self, at: Coord) {
            self.log.push(format!("tile {at}"));
        }
        fn on_actor_presence_changed(&mut self, kind: ActorKind, at: Coord) {
            self.log.push(format!("{kind:?} {at}"));
        }
        fn on_status_line_changed(&mut self) {
            self.log.push("status".into());
        }
        fn on_level_complete(&mut self) {
            self.log.push("complete".into());
        }
        fn on_level_lost(&mut self) {
            self.log.push("lost".into());
        }
        fn on_warning(&mut self, warning: &LogicWarning) {
            self.log.push(format!("warning {warning}"));
        }
    }

    #[test]
    fn queries_after_load() {
        let level = level_from(&["@$.", "  O"]);
        assert_eq!(level.rows(), 2);
        assert_eq!(level.cols(), 3);
        assert!(level.is_player_at(Coord::new(0, 0)));
        assert!(!level.is_player_at(Coord::new(0, 1)));
        assert_eq!(level.occupant_kind_at(Coord::new(0, 1)), Some(ActorKind::Crate));
        assert_eq!(level.occupant_kind_at(Coord::new(1, 2)), Some(ActorKind::Guard));
        assert_eq!(level.occupant_kind_at(Coord::new(1, 0)), None);
        assert_eq!(level.tile_at(Coord::new(0, 2)), Tile::Objective);
        assert_eq!(level.tile_at(Coord::new(9, 9)), Tile::Wall);
        assert_eq!(level.guards().count(), 1);
        assert_eq!(level.crate_count(), 1);
        assert_eq!(level.status(), Status::Playing);
    }

    #[test]
    fn move_to_adjacent_cell_only() {
        let mut level = level_from(&["@  ", "   "]);
        level.attempt_move_to(0, 2);
        level.attempt_move_to(1, 1);
        level.attempt_move_to(0, 0);
        assert_eq!(level.move_count(), 0);
        assert!(level.is_player_at(Coord::new(0, 0)));

        level.attempt_move_to(1, 0);
        assert_eq!(level.move_count(), 1);
        assert!(level.is_player_at(Coord::new(1, 0)));
        assert_eq!(level.player_facing(), Direction::Down);
    }

    #[test]
    fn probe_does_not_move() {
        let level = level_from(&["@$ #"]);
        assert!(level.can_player_move(Direction::Right));
        assert!(!level.can_player_move(Direction::Left));
        assert!(level.is_player_at(Coord::new(0, 0)));
        assert_eq!(level.occupant_kind_at(Coord::new(0, 1)), Some(ActorKind::Crate));
    }

    #[test]
    fn observers_hear_a_resolved_turn() {
        let mut level = level_from(&["@$."]);
        let rec = Rc::new(RefCell::new(Recorder::default()));
        level.register_observer(rec.clone());

        assert_eq!(level.attempt_move(Direction::Right), Status::Playing);
        let log = rec.borrow().log.clone();
        assert_eq!(
            log,
            vec![
                "Crate (0, 1)".to_string(),
                "Crate (0, 2)".to_string(),
                "Player (0, 0)".to_string(),
                "Player (0, 1)".to_string(),
                "status".to_string(),
            ]
        );
    }

    #[test]
    fn completion_is_announced_once() {
        let mut level = level_from(&["@."]);
        let rec = Rc::new(RefCell::new(Recorder::default()));
        level.register_observer(rec.clone());
        assert_eq!(level.attempt_move(Direction::Right), Status::Won);
        assert_eq!(level.attempt_move(Direction::Left), Status::Won);
        let log = rec.borrow().log.clone();
        assert_eq!(log.iter().filter(|l| *l == "complete").count(), 1);
        assert_eq!(log.iter().filter(|l| *l == "status").count(), 1);
    }

    #[test]
    fn blocked_move_notifies_nobody() {
        let mut level = level_from(&["@#"]);
        let rec = Rc::new(RefCell::new(Recorder::default()));
        level.register_observer(rec.clone());
        level.attempt_move(Direction::Right);
        assert!(rec.borrow().log.is_empty());
    }

    #[test]
    fn unregister_stops_notifications() {
        let mut level = level_from(&["@  "]);
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let id = level.register_observer(rec.clone());
        assert!(level.unregister_observer(id));
        level.attempt_move(Direction::Right);
        assert!(rec.borrow().log.is_empty());
        assert_eq!(level.move_count(), 1);
    }

    #[test]
    fn warnings_reach_observers() {
        // 'n' is open Up and Right; stepping in from the left hits a closed side
        let mut level = level_from(&["@n "]);
        let rec = Rc::new(RefCell::new(Recorder::default()));
        level.register_observer(rec.clone());
        level.attempt_move(Direction::Right);

        let expected = format!(
            "warning {}",
            LogicWarning::CurvedEntry { at: Coord::new(0, 1), moving: Direction::Right }
        );
        assert!(rec.borrow().log.contains(&expected));
        assert!(level.is_player_at(Coord::new(0, 1)));
    }

    #[test]
    fn loss_reaches_observers() {
        let mut level = level_from(&["@ ", "  ", "N "]);
        let rec = Rc::new(RefCell::new(Recorder::default()));
        level.register_observer(rec.clone());
        // the guard walks up while the player steps aside, then bumps
        // into the player when it steps back
        level.attempt_move(Direction::Right);
        level.attempt_move(Direction::Left);
        assert_eq!(level.status(), Status::Lost);
        assert!(rec.borrow().log.iter().any(|l| l == "lost"));
    }
}
