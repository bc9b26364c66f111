//! # Query — Selecting Entities by Component Kind
//!
//! Systems select the entities they care about by naming a tuple of component
//! kinds. The world answers with the ids of every entity holding **all** of
//! them, in ascending id order:
//!
//! ```text
//! world.query_all::<(Position, Blocker)>()
//!
//! 1. Build the KindSet {Position, Blocker}
//! 2. Cache hit?  → return the memoized id slice
//!    Cache miss? → walk the smallest participating column, keep ids whose
//!                  bucket contains every kind, memoize the result
//! 3. Fetch (&Position, &Blocker) for each id
//! ```
//!
//! ## Dependency-Tracked Cache
//!
//! Each memoized result is keyed by the exact [`KindSet`] that produced it.
//! When an entity gains or loses a kind K (or is deleted), every entry whose
//! key contains K is dropped, and only those. Entries over unrelated kinds
//! keep hitting. Replacing a component value in place does not change
//! membership, so it invalidates nothing.
//!
//! ## Snapshots, Not Borrows
//!
//! A result is an `Rc<[Entity]>`: an immutable snapshot of ids. A system can
//! hold one while it adds, removes and deletes on the same world, which is
//! how "mutate while iterating" stays safe here. Entities removed after the
//! snapshot was taken are skipped at fetch time.

use std::collections::HashMap;
use std::rc::Rc;

use super::component::{Component, KindSet};
use super::entity::Entity;
use super::world::World;
use crate::components::ComponentKind;

/// A tuple of component types that can be fetched together.
///
/// Implemented for tuples of one to six [`Component`]s. The item is a tuple of
/// shared references in the same order.
pub trait Query: 'static {
    /// The item yielded per matching entity.
    type Item<'w>;

    /// Kinds an entity must hold to match.
    fn kinds() -> KindSet;

    /// Fetch the item for `entity`, or `None` if it no longer matches.
    fn fetch(world: &World, entity: Entity) -> Option<Self::Item<'_>>;
}

macro_rules! impl_query_tuple {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Query for ($($T,)+) {
            type Item<'w> = ($(&'w $T,)+);

            fn kinds() -> KindSet {
                KindSet::EMPTY$(.with($T::KIND))+
            }

            fn fetch(world: &World, entity: Entity) -> Option<Self::Item<'_>> {
                Some(($(world.try_get::<$T>(entity)?,)+))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);
impl_query_tuple!(A, B, C, D, E);
impl_query_tuple!(A, B, C, D, E, F);

// ── Cache ───────────────────────────────────────────────────────────────

/// Hit/miss counters of the query cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of memoized entries dropped by invalidation.
    pub evictions: u64,
}

/// Memoized id sets keyed by the exact kind combination requested.
#[derive(Default)]
pub(crate) struct QueryCache {
    entries: HashMap<KindSet, Rc<[Entity]>>,
    stats: CacheStats,
}

impl QueryCache {
    pub fn lookup(&mut self, key: KindSet) -> Option<Rc<[Entity]>> {
        let found = self.entries.get(&key).cloned();
        match found {
            Some(_) => self.stats.hits += 1,
            None => self.stats.misses += 1,
        }
        found
    }

    pub fn store(&mut self, key: KindSet, ids: Rc<[Entity]>) {
        self.entries.insert(key, ids);
    }

    /// Drop every entry whose key involves `kind`.
    pub fn invalidate(&mut self, kind: ComponentKind) {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(kind));
        self.stats.evictions += (before - self.entries.len()) as u64;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
