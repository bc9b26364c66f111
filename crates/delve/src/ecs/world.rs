//! # World — The Component Store
//!
//! The [`World`] is the sole authority over which entity holds which
//! components. Every structural change (create, add, remove, delete) goes
//! through it, and it keeps three views consistent synchronously:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ World                                               │
//! │                                                     │
//! │  allocator: monotonic ids, retired ids never reused │
//! │                                                     │
//! │  buckets: BTreeMap<Entity, KindSet>                 │
//! │    which kinds each live entity holds               │
//! │                                                     │
//! │  columns: [BTreeMap<Entity, AnyComponent>; COUNT]   │
//! │    one column per kind = the per-kind index         │
//! │                                                     │
//! │  pending: deferred deletions, insertion order       │
//! │  tags:    named single-entity slots (the player)    │
//! │  cache:   memoized query results (see query.rs)     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! An entity appears in a kind's column if and only if its bucket contains
//! that kind. An entity with no components has no bucket and is treated as
//! unknown by lookups.
//!
//! ## Deletion
//!
//! [`World::delete_entity`] with `immediate = false` only queues the id; the
//! entity stays fully queryable until [`World::flush_deletions`] runs at the
//! end of the step. With `immediate = true` every component is detached on
//! the spot, tag slots referencing it are cleared and its id is retired.
//!
//! ## Ordering
//!
//! Columns are ordered maps, so every iteration is in ascending id order,
//! which is creation order. Nothing in the store depends on hash order.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: archetype tables keyed by `TypeId`, open set of
//!   component types, resources and change detection.
//! - **Here**: a closed set of kinds, one sparse column per kind and an
//!   explicit query cache. The game owns every kind it stores, and entity
//!   counts stay in the hundreds.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use log::trace;

use super::component::{AnyComponent, Bundle, Component, ComponentKind, KindSet};
use super::entity::{Entity, EntityAllocator};
use super::query::{CacheStats, Query, QueryCache};
use crate::error::{SimError, SimResult};

/// Named single-entity slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Player,
}

impl Tag {
    const COUNT: usize = 1;

    fn index(self) -> usize {
        self as usize
    }
}

/// The central store for all simulation entities and their components.
pub struct World {
    allocator: EntityAllocator,
    buckets: BTreeMap<Entity, KindSet>,
    columns: Vec<BTreeMap<Entity, AnyComponent>>,
    /// Deferred deletions in the order they were requested.
    pending: Vec<Entity>,
    pending_set: HashSet<Entity>,
    tags: [Option<Entity>; Tag::COUNT],
    cache: RefCell<QueryCache>,
    /// Entities created since the last flush (diagnostics only).
    #[cfg(feature = "diagnostics")]
    spawned_this_step: u32,
    /// Entities physically deleted since the last flush (diagnostics only).
    #[cfg(feature = "diagnostics")]
    deleted_this_step: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            buckets: BTreeMap::new(),
            columns: (0..ComponentKind::COUNT).map(|_| BTreeMap::new()).collect(),
            pending: Vec::new(),
            pending_set: HashSet::new(),
            tags: [None; Tag::COUNT],
            cache: RefCell::new(QueryCache::default()),
            #[cfg(feature = "diagnostics")]
            spawned_this_step: 0,
            #[cfg(feature = "diagnostics")]
            deleted_this_step: 0,
        }
    }

    // ── Tags ──────────────────────────────────────────────────────────

    /// Point a tag slot at `entity`.
    pub fn set_tag(&mut self, tag: Tag, entity: Entity) -> SimResult<()> {
        if !self.allocator.is_alive(entity) {
            return Err(SimError::UnknownEntity(entity));
        }
        self.tags[tag.index()] = Some(entity);
        Ok(())
    }

    /// The entity a tag slot refers to, if set.
    pub fn tag(&self, tag: Tag) -> Option<Entity> {
        self.tags[tag.index()]
    }

    pub fn clear_tag(&mut self, tag: Tag) {
        self.tags[tag.index()] = None;
    }

    // ── Entity Management ────────────────────────────────────────────

    /// Number of entities holding at least one component.
    pub fn entity_count(&self) -> usize {
        self.buckets.len()
    }

    /// True if `entity` holds at least one component.
    pub fn contains(&self, entity: Entity) -> bool {
        self.buckets.contains_key(&entity)
    }

    /// True if `entity` was allocated and not yet physically deleted.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// The set of kinds `entity` holds (empty for unknown ids).
    pub fn kinds_of(&self, entity: Entity) -> KindSet {
        self.buckets.get(&entity).copied().unwrap_or_default()
    }

    /// Iterate every live entity that holds components, in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.buckets.keys().copied()
    }

    /// Allocate a new entity and attach `components`. Later duplicates of a
    /// kind replace earlier ones.
    pub fn create_entity(&mut self, components: impl IntoIterator<Item = AnyComponent>) -> Entity {
        let entity = self.allocator.allocate();
        for component in components {
            self.insert_any(entity, component);
        }
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_step += 1;
        }
        trace!("created {entity:?} with {:?}", self.kinds_of(entity));
        entity
    }

    /// Create an entity from a tuple of components (or a `Vec<AnyComponent>`).
    ///
    /// ```ignore
    /// let wall = world.spawn((Position::new(3, 4), Blocker, Destructible));
    /// ```
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        self.create_entity(bundle.into_components())
    }

    /// Delete `entity`, now or at the end of the step.
    ///
    /// Immediate deletion detaches every component, clears tag slots that
    /// refer to the entity, drops it from the pending queue and retires the
    /// id. Deferred deletion queues the id once; repeated requests are
    /// ignored. Both fail with [`SimError::UnknownEntity`] if the id was never
    /// allocated or is already deleted.
    pub fn delete_entity(&mut self, entity: Entity, immediate: bool) -> SimResult<()> {
        if !self.allocator.is_alive(entity) {
            return Err(SimError::UnknownEntity(entity));
        }
        if !immediate {
            if self.pending_set.insert(entity) {
                self.pending.push(entity);
            }
            return Ok(());
        }

        if let Some(kinds) = self.buckets.remove(&entity) {
            let cache = self.cache.get_mut();
            for kind in kinds.iter() {
                self.columns[kind.index()].remove(&entity);
                cache.invalidate(kind);
            }
        }
        for slot in &mut self.tags {
            if *slot == Some(entity) {
                *slot = None;
            }
        }
        if self.pending_set.remove(&entity) {
            self.pending.retain(|e| *e != entity);
        }
        self.allocator.retire(entity);
        #[cfg(feature = "diagnostics")]
        {
            self.deleted_this_step += 1;
        }
        trace!("deleted {entity:?}");
        Ok(())
    }

    /// True if `entity` is queued for deferred deletion.
    pub fn is_pending_deletion(&self, entity: Entity) -> bool {
        self.pending_set.contains(&entity)
    }

    /// Deferred deletions in request order.
    pub fn pending_deletions(&self) -> &[Entity] {
        &self.pending
    }

    /// Physically delete every queued entity, in request order. Returns how
    /// many were deleted.
    pub fn flush_deletions(&mut self) -> SimResult<usize> {
        let pending = std::mem::take(&mut self.pending);
        self.pending_set.clear();
        let count = pending.len();
        for entity in pending {
            self.delete_entity(entity, true)?;
        }
        Ok(count)
    }

    // ── Per-Entity Component Access ──────────────────────────────────

    /// Borrow `entity`'s component of type `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> SimResult<&T> {
        self.try_get(entity).ok_or_else(|| self.lookup_error(entity, T::KIND))
    }

    /// Mutably borrow `entity`'s component of type `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> SimResult<&mut T> {
        if !self.kinds_of(entity).contains(T::KIND) {
            return Err(self.lookup_error(entity, T::KIND));
        }
        self.columns[T::KIND.index()]
            .get_mut(&entity)
            .and_then(T::from_any_mut)
            .ok_or(SimError::MissingComponent {
                entity,
                kind: T::KIND,
            })
    }

    /// Probe for an optional component.
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.columns[T::KIND.index()]
            .get(&entity)
            .and_then(T::from_any)
    }

    /// Probe for an optional component, mutably.
    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.columns[T::KIND.index()]
            .get_mut(&entity)
            .and_then(T::from_any_mut)
    }

    /// True if `entity` holds a `T`. False for unknown ids.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_kind(entity, T::KIND)
    }

    pub fn has_kind(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.kinds_of(entity).contains(kind)
    }

    /// Clone every component of `entity`, in kind declaration order.
    pub fn entity_components(&self, entity: Entity) -> SimResult<Vec<AnyComponent>> {
        let kinds = self
            .buckets
            .get(&entity)
            .ok_or(SimError::UnknownEntity(entity))?;
        Ok(kinds
            .iter()
            .filter_map(|kind| self.columns[kind.index()].get(&entity).cloned())
            .collect())
    }

    fn lookup_error(&self, entity: Entity, kind: ComponentKind) -> SimError {
        if self.buckets.contains_key(&entity) {
            SimError::MissingComponent { entity, kind }
        } else {
            SimError::UnknownEntity(entity)
        }
    }

    // ── Dynamic Component Add/Remove ─────────────────────────────────

    /// Attach `component` to `entity`, replacing any component of the same
    /// kind. Creates the entity's bucket if this is its first component.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> SimResult<()> {
        self.add_any(entity, component.into_any())
    }

    /// Type-erased [`add_component`](Self::add_component).
    pub fn add_any(&mut self, entity: Entity, component: AnyComponent) -> SimResult<()> {
        if !self.allocator.is_alive(entity) {
            return Err(SimError::UnknownEntity(entity));
        }
        self.insert_any(entity, component);
        Ok(())
    }

    fn insert_any(&mut self, entity: Entity, component: AnyComponent) {
        let kind = component.kind();
        let bucket = self.buckets.entry(entity).or_default();
        if !bucket.contains(kind) {
            bucket.insert(kind);
            self.cache.get_mut().invalidate(kind);
        }
        self.columns[kind.index()].insert(entity, component);
    }

    /// Detach and return `entity`'s `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> SimResult<T> {
        let any = self.remove_kind(entity, T::KIND)?;
        T::from_any_owned(any).ok_or(SimError::MissingComponent {
            entity,
            kind: T::KIND,
        })
    }

    /// Detach and return `entity`'s component of `kind`. Removes the bucket
    /// when it becomes empty.
    pub fn remove_kind(&mut self, entity: Entity, kind: ComponentKind) -> SimResult<AnyComponent> {
        let bucket = self
            .buckets
            .get_mut(&entity)
            .ok_or(SimError::UnknownEntity(entity))?;
        if !bucket.contains(kind) {
            return Err(SimError::MissingComponent { entity, kind });
        }
        bucket.remove(kind);
        if bucket.is_empty() {
            self.buckets.remove(&entity);
        }
        self.cache.get_mut().invalidate(kind);
        self.columns[kind.index()]
            .remove(&entity)
            .ok_or(SimError::MissingComponent { entity, kind })
    }

    /// Remove `T` if present. Returns whether something was removed.
    pub fn discard<T: Component>(&mut self, entity: Entity) -> bool {
        self.has::<T>(entity) && self.remove_kind(entity, T::KIND).is_ok()
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Ids of every entity holding all kinds of `Q`, ascending.
    ///
    /// The slice is a snapshot: it is safe to keep while mutating the world.
    pub fn query_ids<Q: Query>(&self) -> Rc<[Entity]> {
        self.ids_with(Q::kinds())
    }

    /// Ids of every entity whose bucket contains `kinds`, ascending.
    pub fn ids_with(&self, kinds: KindSet) -> Rc<[Entity]> {
        if let Some(ids) = self.cache.borrow_mut().lookup(kinds) {
            return ids;
        }
        let smallest = kinds
            .iter()
            .min_by_key(|kind| self.columns[kind.index()].len());
        let ids: Rc<[Entity]> = match smallest {
            Some(kind) => self.columns[kind.index()]
                .keys()
                .copied()
                .filter(|e| self.kinds_of(*e).contains_all(kinds))
                .collect(),
            None => self.buckets.keys().copied().collect(),
        };
        self.cache.borrow_mut().store(kinds, ids.clone());
        ids
    }

    /// Every `(entity, &T)` pair, ascending by id. Always reads live storage.
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.columns[T::KIND.index()]
            .iter()
            .filter_map(|(e, any)| T::from_any(any).map(|c| (*e, c)))
    }

    /// Every entity holding all kinds of `Q`, with its components.
    ///
    /// ```ignore
    /// for (e, (pos, _)) in world.query_all::<(Position, Blocker)>() { ... }
    /// ```
    pub fn query_all<Q: Query>(&self) -> impl Iterator<Item = (Entity, Q::Item<'_>)> {
        let ids = self.query_ids::<Q>();
        (0..ids.len()).filter_map(move |i| {
            let entity = ids[i];
            Q::fetch(self, entity).map(|item| (entity, item))
        })
    }

    /// Mutate every component of type `T` in place, ascending by id. No
    /// structural change happens, so no cache entry is touched.
    pub fn query_mut<T: Component>(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        for (entity, any) in self.columns[T::KIND.index()].iter_mut() {
            if let Some(component) = T::from_any_mut(any) {
                f(*entity, component);
            }
        }
    }

    /// Number of entities holding a `T`.
    pub fn count<T: Component>(&self) -> usize {
        self.columns[T::KIND.index()].len()
    }

    /// First entity (lowest id) holding a `T`.
    pub fn first_with<T: Component>(&self) -> Option<Entity> {
        self.columns[T::KIND.index()].keys().next().copied()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// `(spawned, deleted)` since the last call, then reset.
    #[cfg(feature = "diagnostics")]
    pub fn take_step_counts(&mut self) -> (u32, u32) {
        let counts = (self.spawned_this_step, self.deleted_this_step);
        self.spawned_this_step = 0;
        self.deleted_this_step = 0;
        counts
    }

    /// Check the column/bucket correspondence. Used by tests and the step
    /// driver in debug builds.
    pub fn check_consistency(&self) -> SimResult<()> {
        for (kind_index, column) in self.columns.iter().enumerate() {
            let kind = ComponentKind::ALL[kind_index];
            for (entity, any) in column {
                if any.kind() != kind || !self.kinds_of(*entity).contains(kind) {
                    return Err(SimError::invariant(format!(
                        "{entity:?} is in the {kind} column without a matching bucket"
                    )));
                }
            }
        }
        for (entity, kinds) in &self.buckets {
            for kind in kinds.iter() {
                if !self.columns[kind.index()].contains_key(entity) {
                    return Err(SimError::invariant(format!(
                        "{entity:?} claims {kind} but the column has no entry"
                    )));
                }
            }
        }
        for entity in self.tags.iter().flatten() {
            if !self.allocator.is_alive(*entity) {
                return Err(SimError::invariant(format!(
                    "tag slot refers to deleted {entity:?}"
                )));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn total_allocated(&self) -> u32 {
        self.allocator.total_allocated()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
