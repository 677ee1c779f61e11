/// View-side callbacks and the level-owned list of registered observers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::entity::{ActorKind, Coord};
use crate::error::LogicWarning;
use super::event::GameEvent;

/// Receives change notifications after each resolved turn, never mid-turn.
pub trait LevelObserver {
    fn on_tile_changed(&mut self, at: Coord);
    fn on_actor_presence_changed(&mut self, kind: ActorKind, at: Coord);
    fn on_status_line_changed(&mut self) {}
    fn on_level_complete(&mut self) {}
    fn on_level_lost(&mut self) {}
    fn on_warning(&mut self, _warning: &LogicWarning) {}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObserverId(u64);

#[derive(Default)]
pub struct ObserverList {
    next: u64,
    entries: Vec<(ObserverId, Rc<RefCell<dyn LevelObserver>>)>,
}

impl ObserverList {
    pub fn register(&mut self, observer: Rc<RefCell<dyn LevelObserver>>) -> ObserverId {
        let id = ObserverId(self.next);
        self.next += 1;
        self.entries.push((id, observer));
        id
    }

    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(i, _)| *i != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deliver events in order, to observers in registration order.
    pub fn dispatch(&self, events: &[GameEvent]) {
        for (_, observer) in &self.entries {
            let mut o = observer.borrow_mut();
            for event in events {
                match event {
                    GameEvent::TileChanged { at } => o.on_tile_changed(*at),
                    GameEvent::Presence { kind, at } => o.on_actor_presence_changed(*kind, *at),
                    GameEvent::StatusLine => o.on_status_line_changed(),
                    GameEvent::LevelComplete => o.on_level_complete(),
                    GameEvent::LevelLost => o.on_level_lost(),
                    GameEvent::Warning(w) => o.on_warning(w),
                }
            }
        }
    }
}
