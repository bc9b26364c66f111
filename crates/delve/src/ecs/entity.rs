//! # Entity — Opaque Identifiers for Things in the Dungeon
//!
//! An [`Entity`] is just a number. It carries no data of its own; the
//! [`World`](super::world::World) maps it to a set of components.
//!
//! ## Design: Monotonic, Never Reused
//!
//! Generational indices exist to let an allocator recycle slots safely. We
//! don't recycle at all: ids are handed out in increasing order starting at 1
//! and a deleted id is retired for the rest of the session. A stale handle can
//! therefore never alias a newer entity, and ascending id order doubles as
//! creation order, which the turn system relies on for deterministic ties.
//!
//! ```text
//! allocate() → 1, 2, 3, ...
//! retire(2)  → 2 is dead forever; next allocate() still returns 4
//! ```

use std::collections::HashSet;
use std::fmt;

/// A lightweight handle to an entity in the [`World`](super::world::World).
///
/// Ids are positive; `0` is never allocated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    /// Build a handle from a raw id. Useful for tests and diagnostics; the id
    /// is only meaningful if the world actually allocated it.
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out entity ids and tracks which ones are still alive.
///
/// Retired ids are the allocated ids missing from `live`.
pub(crate) struct EntityAllocator {
    /// Next fresh id.
    next: u32,
    /// Allocated ids not yet retired.
    live: HashSet<Entity>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            next: 1,
            live: HashSet::new(),
        }
    }

    /// Allocate the next id in sequence.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        self.live.insert(entity);
        entity
    }

    /// Mark an id as permanently dead.
    ///
    /// Returns `false` if the id was never allocated or already retired.
    pub fn retire(&mut self, entity: Entity) -> bool {
        self.live.remove(&entity)
    }

    /// True if `entity` was handed out by this allocator at some point.
    #[cfg(test)]
    pub fn was_allocated(&self, entity: Entity) -> bool {
        entity.0 >= 1 && entity.0 < self.next
    }

    /// True if `entity` was allocated and has not been retired.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    /// Number of allocated ids not yet retired.
    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total number of ids ever allocated.
    #[cfg(any(feature = "diagnostics", test))]
    pub fn total_allocated(&self) -> u32 {
        self.next - 1
    }
}
