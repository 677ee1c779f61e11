/// The step function: resolves one player command into a complete turn.
///
/// Processing order:
///   1. Player move (collision plan: pushes and shoves first, then the player)
///   2. Tile effects for every committed step (pitfall fill, objective,
///      rotation, ice slides)
///   3. Guard phase, registry order: advance, else turn back, else stay
///   4. Line of sight: any guard seeing the player loses the level
///   5. Reset per-turn guard flags
///
/// Steps 3 and 4 only run while the level is still Playing.
/// Collision planning is pure (`domain::rules`); everything that mutates
/// the level lives here.

use crate::domain::ai;
use crate::domain::entity::{Actor, ActorId, ActorKind, Direction};
use crate::domain::rules::{check_collision, Step};
use crate::domain::tile::{SlideExit, Tile};
use crate::error::LogicWarning;
use super::event::GameEvent;
use super::world::{LevelState, Status};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn resolve_turn(level: &mut LevelState, dir: Direction) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if level.status != Status::Playing { return events; }

    let player = level.actors.player_id();
    if try_move(level, player, dir, &mut events) {
        level.move_count += 1;
        events.push(GameEvent::StatusLine);
        tracing::debug!(?dir, moves = level.move_count, at = %level.player_position(), "player moved");

        if level.status == Status::Playing { resolve_guards(level, &mut events); }
        if level.status == Status::Playing { resolve_line_of_sight(level, &mut events); }
    } else {
        tracing::debug!(?dir, "player move blocked");
    }

    level.actors.reset_guard_flags();
    events
}

// ══════════════════════════════════════════════════════════════
// Moving actors
// ══════════════════════════════════════════════════════════════

/// Where a committed step left its actor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Landing {
    /// Nothing moved (blocked, or the plan went stale).
    Blocked,
    /// Moved and came to rest.
    Rest,
    /// Moved onto ice that sends it on in this direction.
    Slide(Direction),
}

/// Plan and apply one move of `actor` in `dir`, following any ice slide
/// to its end.
///
/// A guard that would have stepped onto the player loses the level even
/// when the move itself is blocked. Returns whether the actor moved.
pub fn try_move(level: &mut LevelState, actor: ActorId, dir: Direction, events: &mut Vec<GameEvent>) -> bool {
    let landing = step_once(level, actor, dir, events);
    settle(level, actor, landing, events)
}

/// Plan and apply a single cell of movement. Pushed actors finish their
/// own slides; the mover's continuation is handed back to the caller.
fn step_once(level: &mut LevelState, actor: ActorId, dir: Direction, events: &mut Vec<GameEvent>) -> Landing {
    let collision = check_collision(&level.board(), actor, dir);
    if collision.caught_player {
        lose(level, events, "guard bumped into the player");
    }
    match collision.plan {
        Some(steps) => apply_plan(level, &steps, events),
        None => Landing::Blocked,
    }
}

/// Commit planned steps in order, the mover's own step last. Stops at the
/// first stale step.
fn apply_plan(level: &mut LevelState, steps: &[Step], events: &mut Vec<GameEvent>) -> Landing {
    let Some((own, pushed)) = steps.split_last() else { return Landing::Blocked };
    if !pushed.is_empty() {
        tracing::debug!(?steps, "push plan");
    }
    for &step in pushed {
        let landing = commit_step(level, step, events);
        if !settle(level, step.actor, landing, events) {
            return Landing::Blocked;
        }
    }
    commit_step(level, *own, events)
}

/// Run a landing to completion. Returns whether the actor moved at all.
fn settle(level: &mut LevelState, actor: ActorId, landing: Landing, events: &mut Vec<GameEvent>) -> bool {
    match landing {
        Landing::Blocked => false,
        Landing::Rest => true,
        Landing::Slide(dir) => {
            slide(level, actor, dir, events);
            true
        }
    }
}

/// Keep an actor moving across ice, one cell per iteration, until it comes
/// to rest, is blocked, or has covered `rows * cols` cells.
fn slide(level: &mut LevelState, actor: ActorId, mut dir: Direction, events: &mut Vec<GameEvent>) {
    let limit = level.rows() * level.cols();
    for _ in 0..limit {
        match step_once(level, actor, dir, events) {
            Landing::Slide(next) => dir = next,
            Landing::Rest | Landing::Blocked => return,
        }
    }
    if let Some(at) = level.actors.get(actor).map(Actor::pos) {
        warn(events, LogicWarning::SlideLimit { at });
    }
}

/// Move one actor one cell and apply the destination's tile effect.
///
/// Tile effects, in precedence order:
///   - open pitfall entered by a crate: fill it, the crate leaves play
///   - objective entered by the player: level won
///   - rotation passage entered by a guard: guard turns
///   - ice: the actor keeps moving, returned as `Landing::Slide`
pub fn commit_step(level: &mut LevelState, step: Step, events: &mut Vec<GameEvent>) -> Landing {
    let to = step.to();
    let current = level.actors.get(step.actor).map(|a| (a.kind(), a.pos()));
    let Some((kind, pos)) = current else { return Landing::Blocked };
    if pos != step.from || level.occupant_kind_at(to).is_some() {
        warn(events, LogicWarning::StaleStep { at: to });
        return Landing::Blocked;
    }

    level.grid.set_occupant(step.from, None);
    events.push(GameEvent::Presence { kind, at: step.from });

    let tile = level.grid.tile(to);
    if kind == ActorKind::Crate && tile.is_open_pit() {
        level.grid.set_tile(to, Tile::Pitfall { filled: true });
        level.actors.remove(step.actor);
        events.push(GameEvent::TileChanged { at: to });
        events.push(GameEvent::Presence { kind, at: to });
        tracing::debug!(at = %to, "crate filled a pitfall");
        return Landing::Rest;
    }

    if let Some(actor) = level.actors.get_mut(step.actor) {
        actor.set_pos(to);
        match actor {
            Actor::Player(p) => p.facing = step.dir,
            Actor::Guard(g) => {
                g.facing = step.dir;
                g.moved = true;
                if let Tile::Rotation(rot) = tile {
                    g.facing = rot.turn(g.facing);
                }
            }
            Actor::Crate(_) => {}
        }
    }
    level.grid.set_occupant(to, Some(step.actor));
    events.push(GameEvent::Presence { kind, at: to });

    if kind == ActorKind::Player {
        level.grid.count_step(to);
        if tile == Tile::Objective && level.status == Status::Playing {
            level.status = Status::Won;
            events.push(GameEvent::LevelComplete);
            tracing::info!(at = %to, "level complete");
        }
    }

    match tile.slide_exit(step.dir) {
        SlideExit::Stop => Landing::Rest,
        SlideExit::Continue(next) => Landing::Slide(next),
        SlideExit::ClosedSide => {
            warn(events, LogicWarning::CurvedEntry { at: to, moving: step.dir });
            Landing::Rest
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Guards
// ══════════════════════════════════════════════════════════════

fn resolve_guards(level: &mut LevelState, events: &mut Vec<GameEvent>) {
    let ids = level.actors.guard_ids().to_vec();
    for id in ids {
        // shoved earlier this turn
        if level.actors.guard(id).map_or(true, |g| g.moved) { continue; }

        let turn = ai::plan_turn(&level.board(), id);
        if turn.caught_player {
            lose(level, events, "guard bumped into the player");
        }
        let landing = apply_plan(level, &turn.steps, events);
        settle(level, id, landing, events);
    }
}

fn resolve_line_of_sight(level: &mut LevelState, events: &mut Vec<GameEvent>) {
    if let Some(guard) = ai::spotter(&level.board()) {
        let at = level.actors.get(guard).map(Actor::pos);
        tracing::debug!(?at, "guard has the player in view");
        lose(level, events, "spotted by a guard");
    }
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn lose(level: &mut LevelState, events: &mut Vec<GameEvent>, cause: &str) {
    if level.status != Status::Playing { return; }
    level.status = Status::Lost;
    events.push(GameEvent::LevelLost);
    tracing::info!(cause, moves = level.move_count, "level lost");
}

fn warn(events: &mut Vec<GameEvent>, warning: LogicWarning) {
    tracing::warn!(%warning, "inconsistent level");
    events.push(GameEvent::Warning(warning));
}
