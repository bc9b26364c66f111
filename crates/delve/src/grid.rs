//! # Grid — Spatial Index Over Positioned Entities
//!
//! The [`World`] is authoritative for positions; the grid is a derived mirror
//! that answers "what is on tile (x, y)?" in O(1):
//!
//! ```text
//! blockers: [Option<Entity>; w*h]    at most one blocker per cell
//! cells:    [BTreeSet<Entity>; w*h]  everything standing on the cell
//! cached:   BTreeMap<Entity, IVec2>  where each tracked entity was registered
//! ```
//!
//! [`Grid::sync`] runs once per step, before anything that reads positions,
//! and diffs the world's `Position` components against `cached`:
//!
//! 1. tracked entities that lost their position are deregistered,
//! 2. tracked entities whose position changed are re-registered,
//! 3. untracked positioned entities are registered,
//! 4. blocker occupancy is reconciled with the `Blocker` tags.
//!
//! Deregistering first means a cell freed this step (a level change clears
//! the map) is free again before new arrivals claim it.
//!
//! Between syncs, systems move entities through [`Grid::move_entity`], which
//! updates the `Position` component and the index together.

use std::collections::{BTreeMap, BTreeSet};

use glam::IVec2;
use log::debug;

use crate::components::{Blocker, Position};
use crate::ecs::{Entity, World};
use crate::error::{SimError, SimResult};

/// The 8-neighbourhood, clockwise from north.
pub const ADJACENT: [IVec2; 8] = [
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(1, 0),
    IVec2::new(1, 1),
    IVec2::new(0, 1),
    IVec2::new(-1, 1),
    IVec2::new(-1, 0),
    IVec2::new(-1, -1),
];

static EMPTY_CELL: BTreeSet<Entity> = BTreeSet::new();

pub struct Grid {
    width: i32,
    height: i32,
    blockers: Vec<Option<Entity>>,
    cells: Vec<BTreeSet<Entity>>,
    cached: BTreeMap<Entity, IVec2>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            blockers: vec![None; len],
            cells: vec![BTreeSet::new(); len],
            cached: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// True if `pos` lies inside the grid bounds.
    pub fn on_grid(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: IVec2) -> Option<usize> {
        self.on_grid(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// The blocker standing on `pos`, if any. Off-grid tiles have none.
    pub fn blocker_at(&self, pos: IVec2) -> Option<Entity> {
        self.index(pos).and_then(|i| self.blockers[i])
    }

    /// Every tracked entity on `pos`, ascending by id.
    pub fn entities_at(&self, pos: IVec2) -> &BTreeSet<Entity> {
        match self.index(pos) {
            Some(i) => &self.cells[i],
            None => &EMPTY_CELL,
        }
    }

    /// True if `pos` is on the grid and holds no blocker.
    pub fn is_free(&self, pos: IVec2) -> bool {
        self.on_grid(pos) && self.blocker_at(pos).is_none()
    }

    /// Where `entity` is registered, if it is tracked.
    pub fn tracked_position(&self, entity: Entity) -> Option<IVec2> {
        self.cached.get(&entity).copied()
    }

    pub fn tracked_count(&self) -> usize {
        self.cached.len()
    }

    /// A random free tile among the 8 neighbours of `pos`, falling back to
    /// `pos` itself. `None` if all nine are blocked or off-grid.
    pub fn random_free_adjacent(&self, pos: IVec2, rng: &mut fastrand::Rng) -> Option<IVec2> {
        let mut offsets = ADJACENT;
        rng.shuffle(&mut offsets);
        offsets
            .iter()
            .map(|o| pos + *o)
            .chain(std::iter::once(pos))
            .find(|p| self.is_free(*p))
    }

    /// A random free tile anywhere on the grid. `None` if every tile is
    /// blocked. The tile is not reserved.
    pub fn random_free_pos(&self, rng: &mut fastrand::Rng) -> Option<IVec2> {
        if self.width <= 0 || self.height <= 0 {
            return None;
        }
        for _ in 0..self.blockers.len() * 2 {
            let pos = IVec2::new(rng.i32(0..self.width), rng.i32(0..self.height));
            if self.blocker_at(pos).is_none() {
                return Some(pos);
            }
        }
        // Crowded grid: fall back to a scan.
        self.blockers
            .iter()
            .position(Option::is_none)
            .map(|i| IVec2::new(i as i32 % self.width, i as i32 / self.width))
    }

    /// True if `entity` could step one tile in `direction` right now.
    pub fn can_move_in_direction(
        &self,
        world: &World,
        entity: Entity,
        direction: IVec2,
    ) -> SimResult<bool> {
        let pos = world.get::<Position>(entity)?.as_ivec2();
        Ok(self.is_free(pos + direction))
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Move `entity` to `target`, updating its `Position` and the index.
    ///
    /// Fails with [`SimError::OffGrid`] outside the bounds and with
    /// [`SimError::OccupiedTile`] if a different blocker holds `target`.
    /// Moving onto the entity's own cell is a no-op move that succeeds.
    pub fn move_entity(&mut self, world: &mut World, entity: Entity, target: IVec2) -> SimResult<()> {
        let Some(target_index) = self.index(target) else {
            return Err(SimError::OffGrid { entity, pos: target });
        };
        world.get::<Position>(entity)?;
        let is_blocker = world.has::<Blocker>(entity);
        if is_blocker {
            if let Some(blocker) = self.blockers[target_index].filter(|b| *b != entity) {
                return Err(SimError::OccupiedTile {
                    entity,
                    pos: target,
                    blocker,
                });
            }
        }

        self.remove_tracking(entity);
        *world.get_mut::<Position>(entity)? = Position::from(target);
        self.cells[target_index].insert(entity);
        if is_blocker {
            self.blockers[target_index] = Some(entity);
        }
        self.cached.insert(entity, target);
        debug!("{entity:?} moved to {target}");
        Ok(())
    }

    /// Forget `entity`. Must be called while its `Position` is still known
    /// to the grid (before deletion or pickup). Returns whether it was
    /// tracked.
    pub fn remove_tracking(&mut self, entity: Entity) -> bool {
        let Some(pos) = self.cached.remove(&entity) else {
            return false;
        };
        if let Some(i) = self.index(pos) {
            self.cells[i].remove(&entity);
            if self.blockers[i] == Some(entity) {
                self.blockers[i] = None;
            }
        }
        true
    }

    /// Bring the index in line with the world's `Position` and `Blocker`
    /// components.
    pub fn sync(&mut self, world: &World) -> SimResult<()> {
        // 1. Deregister entities that lost their position.
        let gone: Vec<Entity> = self
            .cached
            .keys()
            .copied()
            .filter(|e| !world.has::<Position>(*e))
            .collect();
        for entity in gone {
            self.remove_tracking(entity);
        }

        // 2. Re-register moved entities. Vacate every old cell before filling
        // any new one, so two blockers trading places do not collide.
        let moved: Vec<(Entity, IVec2, IVec2)> = self
            .cached
            .iter()
            .filter_map(|(e, old)| {
                let new = world.try_get::<Position>(*e)?.as_ivec2();
                (new != *old).then_some((*e, *old, new))
            })
            .collect();
        for (entity, old, new) in &moved {
            if !self.on_grid(*new) {
                return Err(SimError::OffGrid {
                    entity: *entity,
                    pos: *new,
                });
            }
            let i = self.flat(*old);
            self.cells[i].remove(entity);
        }
        for (entity, _, new) in &moved {
            let i = self.flat(*new);
            self.cells[i].insert(*entity);
            self.cached.insert(*entity, *new);
        }

        // 3. Register newcomers.
        for (entity, pos) in world.query::<Position>() {
            if self.cached.contains_key(&entity) {
                continue;
            }
            let Some(i) = self.index(pos.as_ivec2()) else {
                return Err(SimError::OffGrid {
                    entity,
                    pos: pos.as_ivec2(),
                });
            };
            self.cells[i].insert(entity);
            self.cached.insert(entity, pos.as_ivec2());
        }

        // 4. Reconcile blocker occupancy.
        self.rebuild_blockers(world)
    }

    fn flat(&self, pos: IVec2) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// Recompute blocker occupancy from the tracked set. Ascending id order
    /// makes the reported conflict deterministic.
    fn rebuild_blockers(&mut self, world: &World) -> SimResult<()> {
        self.blockers.iter_mut().for_each(|slot| *slot = None);
        for (entity, pos) in &self.cached {
            if !world.has::<Blocker>(*entity) {
                continue;
            }
            let i = (pos.y * self.width + pos.x) as usize;
            if let Some(blocker) = self.blockers[i] {
                return Err(SimError::OccupiedTile {
                    entity: *entity,
                    pos: *pos,
                    blocker,
                });
            }
            self.blockers[i] = Some(*entity);
        }
        Ok(())
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.blockers.iter_mut().for_each(|slot| *slot = None);
        self.cells.iter_mut().for_each(BTreeSet::clear);
        self.cached.clear();
    }

    /// Verify the index against the world right after a [`sync`](Self::sync):
    /// every positioned blocker is registered, and [`check_claims`](Self::check_claims)
    /// holds.
    pub fn check_consistency(&self, world: &World) -> SimResult<()> {
        for (entity, (pos, _)) in world.query_all::<(Position, Blocker)>() {
            if self.blocker_at(pos.as_ivec2()) != Some(entity) {
                return Err(SimError::invariant(format!(
                    "blocker {entity:?} at {} is missing from the blocker grid",
                    pos.as_ivec2()
                )));
            }
        }
        self.check_claims(world)
    }

    /// Verify that everything the index claims is still true of the world.
    ///
    /// Holds at any point, including for entities spawned since the last
    /// sync (they are simply not indexed yet). The step driver checks it at
    /// the end of every step in debug builds.
    pub fn check_claims(&self, world: &World) -> SimResult<()> {
        for (i, slot) in self.blockers.iter().enumerate() {
            let Some(entity) = *slot else { continue };
            let here = IVec2::new(i as i32 % self.width, i as i32 / self.width);
            let pos = world.try_get::<Position>(entity).map(|p| p.as_ivec2());
            if pos != Some(here) || !world.has::<Blocker>(entity) {
                return Err(SimError::invariant(format!(
                    "blocker grid holds {entity:?} at {here} but the world disagrees"
                )));
            }
        }
        for (&entity, &at) in &self.cached {
            if !world.contains(entity) {
                return Err(SimError::invariant(format!(
                    "grid still tracks deleted {entity:?} at {at}"
                )));
            }
        }
        let registrations: usize = self.cells.iter().map(BTreeSet::len).sum();
        if registrations != self.cached.len() {
            return Err(SimError::invariant(format!(
                "{} cell registrations for {} tracked entities",
                registrations,
                self.cached.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Item;
    use crate::math::chebyshev;

    fn setup() -> (World, Grid) {
        (World::new(), Grid::new(10, 10))
    }

    #[test]
    fn sync_registers_blockers_and_contents() {
        let (mut world, mut grid) = setup();
        let wall = world.spawn((Position::new(2, 3), Blocker));
        let item = world.spawn((Position::new(2, 3), Item { consumable: false }));
        grid.sync(&world).unwrap();

        assert_eq!(grid.blocker_at(IVec2::new(2, 3)), Some(wall));
        let here: Vec<_> = grid.entities_at(IVec2::new(2, 3)).iter().copied().collect();
        assert_eq!(here, vec![wall, item]);
        grid.check_consistency(&world).unwrap();
    }

    #[test]
    fn sync_follows_position_changes() {
        let (mut world, mut grid) = setup();
        let e = world.spawn((Position::new(1, 1), Blocker));
        grid.sync(&world).unwrap();

        world.add_component(e, Position::new(4, 4)).unwrap();
        grid.sync(&world).unwrap();
        assert_eq!(grid.blocker_at(IVec2::new(1, 1)), None);
        assert_eq!(grid.blocker_at(IVec2::new(4, 4)), Some(e));
        assert!(grid.entities_at(IVec2::new(1, 1)).is_empty());
        grid.check_consistency(&world).unwrap();
    }

    #[test]
    fn sync_deregisters_lost_positions_and_blocker_tags() {
        let (mut world, mut grid) = setup();
        let a = world.spawn((Position::new(1, 1), Blocker));
        let b = world.spawn((Position::new(2, 2), Blocker));
        grid.sync(&world).unwrap();

        world.remove_component::<Position>(a).unwrap();
        world.remove_component::<Blocker>(b).unwrap();
        grid.sync(&world).unwrap();
        assert_eq!(grid.tracked_position(a), None);
        assert_eq!(grid.blocker_at(IVec2::new(2, 2)), None);
        assert!(grid.entities_at(IVec2::new(2, 2)).contains(&b));
    }

    #[test]
    fn blockers_trading_places_do_not_collide() {
        let (mut world, mut grid) = setup();
        let a = world.spawn((Position::new(1, 1), Blocker));
        let b = world.spawn((Position::new(2, 1), Blocker));
        grid.sync(&world).unwrap();

        world.add_component(a, Position::new(2, 1)).unwrap();
        world.add_component(b, Position::new(1, 1)).unwrap();
        grid.sync(&world).unwrap();
        assert_eq!(grid.blocker_at(IVec2::new(2, 1)), Some(a));
        assert_eq!(grid.blocker_at(IVec2::new(1, 1)), Some(b));
    }

    #[test]
    fn two_blockers_on_one_cell_is_an_error() {
        let (mut world, mut grid) = setup();
        world.spawn((Position::new(3, 3), Blocker));
        world.spawn((Position::new(3, 3), Blocker));
        assert!(matches!(
            grid.sync(&world),
            Err(SimError::OccupiedTile { .. })
        ));
    }

    #[test]
    fn off_grid_position_is_an_error() {
        let (mut world, mut grid) = setup();
        let e = world.spawn((Position::new(10, 0),));
        assert_eq!(
            grid.sync(&world),
            Err(SimError::OffGrid {
                entity: e,
                pos: IVec2::new(10, 0)
            })
        );
    }

    #[test]
    fn move_into_other_blocker_fails() {
        let (mut world, mut grid) = setup();
        let a = world.spawn((Position::new(1, 1), Blocker));
        let b = world.spawn((Position::new(2, 1), Blocker));
        grid.sync(&world).unwrap();

        assert_eq!(
            grid.move_entity(&mut world, a, IVec2::new(2, 1)),
            Err(SimError::OccupiedTile {
                entity: a,
                pos: IVec2::new(2, 1),
                blocker: b
            })
        );
        // Nothing changed.
        assert_eq!(world.get::<Position>(a).unwrap().as_ivec2(), IVec2::new(1, 1));
        assert_eq!(grid.blocker_at(IVec2::new(1, 1)), Some(a));
    }

    #[test]
    fn move_onto_empty_or_own_cell_succeeds() {
        let (mut world, mut grid) = setup();
        let a = world.spawn((Position::new(1, 1), Blocker));
        grid.sync(&world).unwrap();

        grid.move_entity(&mut world, a, IVec2::new(1, 1)).unwrap();
        grid.move_entity(&mut world, a, IVec2::new(1, 2)).unwrap();
        assert_eq!(world.get::<Position>(a).unwrap().as_ivec2(), IVec2::new(1, 2));
        assert_eq!(grid.blocker_at(IVec2::new(1, 2)), Some(a));
        assert_eq!(grid.blocker_at(IVec2::new(1, 1)), None);
        grid.check_consistency(&world).unwrap();
    }

    #[test]
    fn non_blocker_may_share_a_blocked_cell() {
        let (mut world, mut grid) = setup();
        let wall = world.spawn((Position::new(5, 5), Blocker));
        let bomb = world.spawn((Position::new(4, 5), Item { consumable: false }));
        grid.sync(&world).unwrap();
        grid.move_entity(&mut world, bomb, IVec2::new(5, 5)).unwrap();
        assert_eq!(grid.blocker_at(IVec2::new(5, 5)), Some(wall));
        assert!(grid.entities_at(IVec2::new(5, 5)).contains(&bomb));
    }

    #[test]
    fn create_then_delete_leaves_no_trace() {
        let mut ctx = crate::systems::testing::ctx();
        let e = ctx.world.spawn((Position::new(2, 3), Blocker));
        ctx.sync_grid().unwrap();

        ctx.delete_entity(e, true).unwrap();
        assert_eq!(ctx.grid.blocker_at(IVec2::new(2, 3)), None);
        assert!(ctx.grid.entities_at(IVec2::new(2, 3)).is_empty());
        assert!(ctx.grid.is_free(IVec2::new(2, 3)));
        assert_eq!(ctx.grid.tracked_count(), 0);
        assert!(ctx.world.kinds_of(e).is_empty());
        ctx.grid.check_consistency(&ctx.world).unwrap();
    }

    #[test]
    fn deleting_behind_the_grids_back_breaks_its_claims() {
        let (mut world, mut grid) = setup();
        let e = world.spawn((Position::new(2, 3), Blocker));
        grid.sync(&world).unwrap();

        world.delete_entity(e, true).unwrap();
        assert!(grid.check_claims(&world).is_err());
        grid.sync(&world).unwrap();
        grid.check_consistency(&world).unwrap();
    }

    #[test]
    fn unindexed_newcomers_do_not_break_claims() {
        let (mut world, mut grid) = setup();
        world.spawn((Position::new(1, 1), Blocker));
        grid.sync(&world).unwrap();

        world.spawn((Position::new(4, 4), Blocker));
        grid.check_claims(&world).unwrap();
        assert!(grid.check_consistency(&world).is_err());
    }

    #[test]
    fn random_free_adjacent_prefers_neighbours() {
        let (mut world, mut grid) = setup();
        let mut rng = fastrand::Rng::with_seed(1);
        world.spawn((Position::new(5, 5), Blocker));
        grid.sync(&world).unwrap();

        let pos = grid.random_free_adjacent(IVec2::new(5, 5), &mut rng).unwrap();
        assert_eq!(chebyshev(pos, IVec2::new(5, 5)), 1);
    }

    #[test]
    fn random_free_adjacent_falls_back_to_origin_then_none() {
        let (mut world, mut grid) = setup();
        let mut rng = fastrand::Rng::with_seed(1);
        let center = IVec2::new(0, 0);
        for offset in ADJACENT {
            let p = center + offset;
            if grid.on_grid(p) {
                world.spawn((Position::from(p), Blocker));
            }
        }
        grid.sync(&world).unwrap();
        assert_eq!(grid.random_free_adjacent(center, &mut rng), Some(center));

        world.spawn((Position::from(center), Blocker));
        grid.sync(&world).unwrap();
        assert_eq!(grid.random_free_adjacent(center, &mut rng), None);
    }

    #[test]
    fn random_free_pos_on_full_grid_is_none() {
        let mut world = World::new();
        let mut grid = Grid::new(2, 1);
        let mut rng = fastrand::Rng::with_seed(5);
        world.spawn((Position::new(0, 0), Blocker));
        grid.sync(&world).unwrap();
        assert_eq!(grid.random_free_pos(&mut rng), Some(IVec2::new(1, 0)));

        world.spawn((Position::new(1, 0), Blocker));
        grid.sync(&world).unwrap();
        assert_eq!(grid.random_free_pos(&mut rng), None);
    }

    #[test]
    fn can_move_in_direction_checks_bounds_and_blockers() {
        let (mut world, mut grid) = setup();
        let e = world.spawn((Position::new(0, 0), Blocker));
        world.spawn((Position::new(1, 0), Blocker));
        grid.sync(&world).unwrap();
        assert!(!grid.can_move_in_direction(&world, e, IVec2::new(-1, 0)).unwrap());
        assert!(!grid.can_move_in_direction(&world, e, IVec2::new(1, 0)).unwrap());
        assert!(grid.can_move_in_direction(&world, e, IVec2::new(0, 1)).unwrap());
    }
}
