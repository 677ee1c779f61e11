/// Guard AI: the advance-or-turn patrol and the line-of-sight scan.
///
/// Guards do not path-find. Each turn a guard walks one cell along its
/// facing; if that is blocked it walks the other way; if both are blocked
/// it stays put. The planning here is pure; `sim::step` commits the result.

use super::entity::{ActorId, ActorKind};
use super::rules::{check_collision, Board, Step};
use super::tile::Tile;

/// What one guard will do on its own turn.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct GuardTurn {
    /// Steps to commit (pushes first, the guard's own step last).
    /// Empty = the guard stays where it is.
    pub steps: Vec<Step>,
    /// One of the checks would have put the guard onto the player.
    pub caught_player: bool,
}

/// Plan a guard's patrol step: forward, else back, else stay.
pub fn plan_turn(board: &Board, guard: ActorId) -> GuardTurn {
    let Some(g) = board.actors.guard(guard) else {
        return GuardTurn::default();
    };
    let mut caught = false;
    for dir in [g.facing, g.facing.opposite()] {
        let c = check_collision(board, guard, dir);
        caught |= c.caught_player;
        if let Some(steps) = c.plan {
            return GuardTurn { steps, caught_player: caught };
        }
    }
    GuardTurn { steps: Vec::new(), caught_player: caught }
}

/// Does this guard see the player?
///
/// Scans outward along the guard's facing. Floor and open pitfalls are
/// transparent. Walls, guards and crates block. A curved icy tile can only
/// be looked into through one of its open sides, and nothing behind it is
/// visible.
pub fn sees_player(board: &Board, guard: ActorId) -> bool {
    let Some(g) = board.actors.guard(guard) else { return false };
    let facing = g.facing;
    let mut at = g.pos;
    loop {
        at = at.step(facing);
        let tile = board.grid.tile(at);
        if tile.is_wall() { return false; }
        let occupant = board.grid.occupant(at).and_then(|id| board.actors.kind(id));
        if let Tile::CurvedIcy { .. } = tile {
            return tile.is_open_side(facing.opposite()) && occupant == Some(ActorKind::Player);
        }
        match occupant {
            Some(ActorKind::Player) => return true,
            Some(_) => return false,
            None => {}
        }
    }
}

/// First guard, in registry order, that has the player in view.
pub fn spotter(board: &Board) -> Option<ActorId> {
    board.actors.guard_ids().iter().copied().find(|&id| sees_player(board, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Coord, Direction};
    use crate::domain::rules::PushRule;
    use crate::sim::level::{parse_layout, Layout, Legend};

    fn level_from(rows: &[&str]) -> Layout {
        parse_layout(rows, &Legend::default()).unwrap()
    }

    fn board(l: &Layout) -> Board<'_> {
        Board { grid: &l.grid, actors: &l.actors, push: PushRule::Either }
    }

    fn guard_at(l: &Layout, row: i32, col: i32) -> ActorId {
        l.grid.occupant(Coord::new(row, col)).unwrap()
    }

    #[test]
    fn guard_walks_forward() {
        let l = level_from(&["@#  O "]);
        let t = plan_turn(&board(&l), guard_at(&l, 0, 4));
        assert_eq!(t.steps.len(), 1);
        assert_eq!(t.steps[0].dir, Direction::Right);
    }

    #[test]
    fn guard_turns_around_when_blocked() {
        let l = level_from(&["@# O#"]);
        let t = plan_turn(&board(&l), guard_at(&l, 0, 3));
        assert_eq!(t.steps.len(), 1);
        assert_eq!(t.steps[0].dir, Direction::Left);
    }

    #[test]
    fn boxed_guard_stays() {
        let l = level_from(&["@#O#"]);
        let t = plan_turn(&board(&l), guard_at(&l, 0, 2));
        assert!(t.steps.is_empty());
        assert!(!t.caught_player);
    }

    #[test]
    fn guard_bumping_player_catches() {
        let l = level_from(&["#O@"]);
        let t = plan_turn(&board(&l), guard_at(&l, 0, 1));
        assert!(t.caught_player);
        assert!(t.steps.is_empty());
    }

    #[test]
    fn clear_line_sees_player() {
        let l = level_from(&[
            "@",
            " ",
            "!",
            "N",
        ]);
        assert!(sees_player(&board(&l), guard_at(&l, 3, 0)));
        assert_eq!(spotter(&board(&l)), Some(guard_at(&l, 3, 0)));
    }

    #[test]
    fn horizontal_line_sees_player() {
        let l = level_from(&["W   @", "O   #"]);
        assert!(!sees_player(&board(&l), guard_at(&l, 0, 0)));
        let l = level_from(&["O   @"]);
        assert!(sees_player(&board(&l), guard_at(&l, 0, 0)));
    }

    #[test]
    fn walls_crates_and_guards_block_view() {
        for row in ["O #@", "O $@", "O N@"] {
            let l = level_from(&[row]);
            assert!(!sees_player(&board(&l), guard_at(&l, 0, 0)), "{row}");
        }
    }

    #[test]
    fn looking_away_sees_nothing() {
        let l = level_from(&["W  @"]);
        assert!(!sees_player(&board(&l), guard_at(&l, 0, 0)));
        assert_eq!(spotter(&board(&l)), None);
    }

    #[test]
    fn curved_ice_is_seen_into_through_open_side_only() {
        // 's' opens Down and Left: a guard to its left looking Right sees in
        let mut l = level_from(&["O  @"]);
        let bend = Coord::new(0, 3);
        l.grid.set_tile(bend, Tile::CurvedIcy { vertical: Direction::Down, horizontal: Direction::Left });
        assert!(sees_player(&board(&l), guard_at(&l, 0, 0)));

        l.grid.set_tile(bend, Tile::CurvedIcy { vertical: Direction::Down, horizontal: Direction::Right });
        assert!(!sees_player(&board(&l), guard_at(&l, 0, 0)));
    }

    #[test]
    fn curved_ice_ends_the_scan() {
        let l = level_from(&["O s @"]);
        assert!(!sees_player(&board(&l), guard_at(&l, 0, 0)));
    }
}
