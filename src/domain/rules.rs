/// Collision rules, truth-table driven.
///
/// Pure functions over the board. Nothing here mutates: a successful check
/// returns the list of steps that make the move happen, and `sim::step`
/// applies them.
///
/// ## Collision Truth Table
///
/// First matching row wins. `mover` is the actor asking, `dest` the cell
/// one step in the requested direction.
///
/// ┌────────────────────────────────────────┬──────────────────────────────┐
/// │ Condition                               │ Result                       │
/// ├────────────────────────────────────────┼──────────────────────────────┤
/// │ dest is Wall (or off the grid)          │ BLOCKED                      │
/// │ dest is open Pitfall, mover = Crate     │ FREE (crate drops in)        │
/// │ dest is open Pitfall, mover = character │ BLOCKED                      │
/// │ dest empty                              │ FREE                         │
/// │ mover = Crate, dest occupied            │ BLOCKED (crates never push)  │
/// │ dest holds Crate                        │ FREE iff crate can move same │
/// │                                         │ dir; crate step goes first   │
/// │ mover = Guard, dest holds Player        │ BLOCKED + caught_player      │
/// │ dest Guard, same axis as the move       │ FREE iff guard can move same │
/// │                                         │ dir; guard step goes first   │
/// │ dest Guard, crossing axis (Either)      │ FREE iff guard can go forward│
/// │                                         │ else backward along its axis │
/// │ dest Guard, crossing axis (Both)        │ FREE iff guard can go forward│
/// │                                         │ AND backward; goes forward   │
/// │ anything else                           │ BLOCKED                      │
/// └────────────────────────────────────────┴──────────────────────────────┘
///
/// Chains recurse. An actor already part of the chain being planned is
/// treated as immovable, so a ring of guards can not shove itself forever.

use serde::Deserialize;

use super::entity::{ActorId, ActorKind, Coord, Direction, Registry};
use super::grid::Grid;

/// How a guard standing across the mover's axis gets out of the way.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushRule {
    /// Forward or backward, whichever is free (forward preferred).
    #[default]
    Either,
    /// Only when forward and backward are both free; goes forward.
    Both,
}

/// Read-only view of a level for rule queries.
pub struct Board<'a> {
    pub grid: &'a Grid,
    pub actors: &'a Registry,
    pub push: PushRule,
}

/// One actor moving one cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Step {
    pub actor: ActorId,
    pub from: Coord,
    pub dir: Direction,
}

impl Step {
    pub fn to(&self) -> Coord {
        self.from.step(self.dir)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Collision {
    /// Steps to apply in order, deepest push first, the mover's own step
    /// last. `None` = blocked.
    pub plan: Option<Vec<Step>>,
    /// A guard checked a step onto the player. Holds even when blocked.
    pub caught_player: bool,
}

impl Collision {
    pub fn is_blocked(&self) -> bool {
        self.plan.is_none()
    }
}

/// Can `mover` step once in `dir`? See the truth table above.
pub fn check_collision(board: &Board, mover: ActorId, dir: Direction) -> Collision {
    let mut chain = Vec::new();
    let mut caught = false;
    let plan = plan_step(board, mover, dir, &mut chain, &mut caught);
    Collision { plan, caught_player: caught }
}

fn plan_step(
    board: &Board,
    id: ActorId,
    dir: Direction,
    chain: &mut Vec<ActorId>,
    caught: &mut bool,
) -> Option<Vec<Step>> {
    if chain.contains(&id) { return None; }
    let actor = board.actors.get(id)?;
    let kind = actor.kind();
    let own = Step { actor: id, from: actor.pos(), dir };
    let dest = own.to();
    let tile = board.grid.tile(dest);

    if tile.is_wall() { return None; }
    if tile.is_open_pit() {
        return if kind == ActorKind::Crate { Some(vec![own]) } else { None };
    }
    // A stale handle belongs to a crate already swallowed: nobody is there.
    let Some((other, other_kind)) = board.grid.occupant(dest)
        .and_then(|o| board.actors.kind(o).map(|k| (o, k)))
    else {
        return Some(vec![own]);
    };
    if !kind.is_character() { return None; }

    chain.push(id);
    let ahead = match (kind, other_kind) {
        (_, ActorKind::Crate) => plan_step(board, other, dir, chain, caught),
        (ActorKind::Guard, ActorKind::Player) => {
            *caught = true;
            None
        }
        (_, ActorKind::Guard) => plan_shove(board, other, dir, chain, caught),
        _ => None,
    };
    chain.pop();

    let mut steps = ahead?;
    steps.push(own);
    Some(steps)
}

/// Plan for a guard that stands in the way of a character moving `dir`.
fn plan_shove(
    board: &Board,
    guard: ActorId,
    dir: Direction,
    chain: &mut Vec<ActorId>,
    caught: &mut bool,
) -> Option<Vec<Step>> {
    let g = board.actors.guard(guard)?;
    let facing = g.facing;
    if g.axis() == dir.axis() {
        return plan_step(board, guard, dir, chain, caught);
    }
    let forward = plan_step(board, guard, facing, chain, caught);
    match board.push {
        PushRule::Either => {
            forward.or_else(|| plan_step(board, guard, facing.opposite(), chain, caught))
        }
        PushRule::Both => {
            let backward = plan_step(board, guard, facing.opposite(), chain, caught);
            forward.filter(|_| backward.is_some())
        }
    }
}
