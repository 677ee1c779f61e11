/// Coordinates, directions and the actor arena (Player, Guards, Crates).
///
/// Actors live in a single `Registry` and are addressed by `ActorId`.
/// Tiles only ever hold an `ActorId`, never the actor itself, so removing
/// a crate can not leave a dangling occupant behind: a stale id simply
/// resolves to `None`.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Coord { row, col }
    }

    /// The neighbouring coordinate one step in `dir`. May leave the grid.
    pub fn step(self, dir: Direction) -> Coord {
        let (dr, dc) = dir.delta();
        Coord { row: self.row + dr, col: self.col + dc }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// (row delta, col delta)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up    => (-1, 0),
            Direction::Down  => (1, 0),
            Direction::Left  => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up    => Direction::Down,
            Direction::Down  => Direction::Up,
            Direction::Left  => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }

    /// Direction for a single cardinal step, `None` for anything else.
    pub fn from_delta(drow: i32, dcol: i32) -> Option<Direction> {
        match (drow, dcol) {
            (-1, 0) => Some(Direction::Up),
            (1, 0)  => Some(Direction::Down),
            (0, -1) => Some(Direction::Left),
            (0, 1)  => Some(Direction::Right),
            _ => None,
        }
    }
}

// ── Actors ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ActorId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActorKind {
    Player,
    Guard,
    Crate,
}

impl ActorKind {
    /// Player and Guard are characters: they push crates and shove guards.
    pub fn is_character(self) -> bool {
        matches!(self, ActorKind::Player | ActorKind::Guard)
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Coord,
    pub facing: Direction,
}

#[derive(Clone, Debug)]
pub struct Guard {
    pub pos: Coord,
    pub facing: Direction,
    /// Already acted this turn (walked, turned, or got shoved).
    pub moved: bool,
}

impl Guard {
    pub fn new(pos: Coord, facing: Direction) -> Self {
        Guard { pos, facing, moved: false }
    }

    pub fn axis(&self) -> Axis {
        self.facing.axis()
    }
}

#[derive(Clone, Debug)]
pub struct Crate {
    pub pos: Coord,
}

#[derive(Clone, Debug)]
pub enum Actor {
    Player(Player),
    Guard(Guard),
    Crate(Crate),
}

impl Actor {
    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Player(_) => ActorKind::Player,
            Actor::Guard(_) => ActorKind::Guard,
            Actor::Crate(_) => ActorKind::Crate,
        }
    }

    pub fn pos(&self) -> Coord {
        match self {
            Actor::Player(p) => p.pos,
            Actor::Guard(g) => g.pos,
            Actor::Crate(c) => c.pos,
        }
    }

    pub fn set_pos(&mut self, pos: Coord) {
        match self {
            Actor::Player(p) => p.pos = pos,
            Actor::Guard(g) => g.pos = pos,
            Actor::Crate(c) => c.pos = pos,
        }
    }
}

/// Owning arena for every actor of a level.
///
/// Slot order is creation order. Guards are additionally listed in
/// `guards` because their iteration order decides turn resolution.
#[derive(Clone, Debug)]
pub struct Registry {
    slots: Vec<Option<Actor>>,
    player: ActorId,
    guards: Vec<ActorId>,
}

impl Registry {
    /// Start a registry with the level's single player.
    pub fn new(player: Player) -> Self {
        Registry {
            slots: vec![Some(Actor::Player(player))],
            player: ActorId(0),
            guards: vec![],
        }
    }

    pub fn add_guard(&mut self, guard: Guard) -> ActorId {
        let id = ActorId(self.slots.len());
        self.slots.push(Some(Actor::Guard(guard)));
        self.guards.push(id);
        id
    }

    pub fn add_crate(&mut self, c: Crate) -> ActorId {
        let id = ActorId(self.slots.len());
        self.slots.push(Some(Actor::Crate(c)));
        id
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slots.get_mut(id.0).and_then(|s| s.as_mut())
    }

    pub fn kind(&self, id: ActorId) -> Option<ActorKind> {
        self.get(id).map(Actor::kind)
    }

    /// Take an actor out of play (a crate swallowed by a pitfall).
    /// The player can never be removed.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        if id == self.player { return None; }
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn player_id(&self) -> ActorId {
        self.player
    }

    pub fn player(&self) -> &Player {
        match self.get(self.player) {
            Some(Actor::Player(p)) => p,
            _ => unreachable!("player slot always holds the player"),
        }
    }

    pub fn guard_ids(&self) -> &[ActorId] {
        &self.guards
    }

    pub fn guard(&self, id: ActorId) -> Option<&Guard> {
        match self.get(id) {
            Some(Actor::Guard(g)) => Some(g),
            _ => None,
        }
    }

    pub fn guard_mut(&mut self, id: ActorId) -> Option<&mut Guard> {
        match self.get_mut(id) {
            Some(Actor::Guard(g)) => Some(g),
            _ => None,
        }
    }

    pub fn guards(&self) -> impl Iterator<Item = &Guard> + '_ {
        self.guards.iter().filter_map(|&id| self.guard(id))
    }

    /// Crates still in play.
    pub fn crates(&self) -> impl Iterator<Item = (ActorId, &Crate)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            Some(Actor::Crate(c)) => Some((ActorId(i), c)),
            _ => None,
        })
    }

    pub fn crate_count(&self) -> usize {
        self.crates().count()
    }

    /// All live actors with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &Actor)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| s.as_ref().map(|a| (ActorId(i), a)))
    }

    pub fn reset_guard_flags(&mut self) {
        for i in 0..self.guards.len() {
            let id = self.guards[i];
            if let Some(g) = self.guard_mut(id) {
                g.moved = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
            assert_eq!(d.opposite().axis(), d.axis());
        }
    }

    #[test]
    fn delta_and_from_delta_agree() {
        for d in Direction::ALL {
            let (dr, dc) = d.delta();
            assert_eq!(Direction::from_delta(dr, dc), Some(d));
        }
        assert_eq!(Direction::from_delta(0, 0), None);
        assert_eq!(Direction::from_delta(1, 1), None);
        assert_eq!(Direction::from_delta(0, 2), None);
    }

    #[test]
    fn axis_mapping() {
        assert_eq!(Direction::Left.axis(), Axis::Horizontal);
        assert_eq!(Direction::Right.axis(), Axis::Horizontal);
        assert_eq!(Direction::Up.axis(), Axis::Vertical);
        assert_eq!(Direction::Down.axis(), Axis::Vertical);
    }

    #[test]
    fn coord_step() {
        let c = Coord::new(2, 3);
        assert_eq!(c.step(Direction::Up), Coord::new(1, 3));
        assert_eq!(c.step(Direction::Down), Coord::new(3, 3));
        assert_eq!(c.step(Direction::Left), Coord::new(2, 2));
        assert_eq!(c.step(Direction::Right), Coord::new(2, 4));
        assert_eq!(Coord::new(0, 0).step(Direction::Up), Coord::new(-1, 0));
    }

    #[test]
    fn registry_ids_are_stable_after_removal() {
        let mut reg = Registry::new(Player { pos: Coord::new(0, 0), facing: Direction::Up });
        let g = reg.add_guard(Guard::new(Coord::new(1, 1), Direction::Left));
        let c1 = reg.add_crate(Crate { pos: Coord::new(2, 2) });
        let c2 = reg.add_crate(Crate { pos: Coord::new(3, 3) });
        assert_eq!(reg.crate_count(), 2);

        assert!(reg.remove(c1).is_some());
        assert!(reg.get(c1).is_none());
        assert!(reg.remove(c1).is_none());
        assert_eq!(reg.crate_count(), 1);
        assert_eq!(reg.kind(c2), Some(ActorKind::Crate));
        assert_eq!(reg.kind(g), Some(ActorKind::Guard));
        assert_eq!(reg.player().pos, Coord::new(0, 0));
    }

    #[test]
    fn guard_flags_reset() {
        let mut reg = Registry::new(Player { pos: Coord::new(0, 0), facing: Direction::Up });
        let a = reg.add_guard(Guard::new(Coord::new(1, 1), Direction::Left));
        let b = reg.add_guard(Guard::new(Coord::new(1, 2), Direction::Up));
        reg.guard_mut(a).unwrap().moved = true;
        reg.guard_mut(b).unwrap().moved = true;
        reg.reset_guard_flags();
        assert!(reg.guards().all(|g| !g.moved));
        assert_eq!(reg.guard_ids(), &[a, b]);
    }
}
