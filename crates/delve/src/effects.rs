//! Item effects.
//!
//! An item with [`UseEffect`](crate::components::UseEffect) carries a list of
//! [`Effect`]s that are applied in order to whoever uses it (or whoever it is
//! thrown at).

use glam::IVec2;
use log::{debug, warn};

use crate::components::{FreeTurn, Health, Position};
use crate::ecs::Entity;
use crate::error::SimResult;
use crate::math::TileRect;
use crate::sim::SimContext;

/// Random tiles tried per teleport before falling back to a scan.
const TELEPORT_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Restore health, capped at max.
    Heal(i32),
    /// Jump to a random free tile within this Chebyshev range.
    Teleport(i32),
    /// Grant this many free turns.
    SpeedBoost(u32),
}

impl Effect {
    /// The same effect at half strength, rounded down.
    pub fn halved(self) -> Self {
        match self {
            Effect::Heal(amount) => Effect::Heal(amount / 2),
            Effect::Teleport(range) => Effect::Teleport(range / 2),
            Effect::SpeedBoost(turns) => Effect::SpeedBoost(turns / 2),
        }
    }

    pub fn apply(self, ctx: &mut SimContext, target: Entity) -> SimResult<()> {
        match self {
            Effect::Heal(amount) => heal(ctx, target, amount),
            Effect::Teleport(range) => teleport(ctx, target, range).map(|_| ()),
            Effect::SpeedBoost(turns) => speed_boost(ctx, target, turns),
        }
    }
}

/// Heal `target` by `amount` without exceeding its max. Targets without
/// health are unaffected.
pub fn heal(ctx: &mut SimContext, target: Entity, amount: i32) -> SimResult<()> {
    if let Some(health) = ctx.world.try_get_mut::<Health>(target) {
        health.current = (health.current + amount).min(health.max);
        debug!("{target:?} healed to {}/{}", health.current, health.max);
    }
    Ok(())
}

/// Move `target` to a random free tile within `range`. Returns the new tile,
/// or `None` (with a warning) if nothing in range is free.
pub fn teleport(ctx: &mut SimContext, target: Entity, range: i32) -> SimResult<Option<IVec2>> {
    let origin = ctx.world.get::<Position>(target)?.as_ivec2();
    let area = TileRect::around(origin, range.max(0));

    let mut destination = None;
    for _ in 0..TELEPORT_ATTEMPTS {
        let candidate = IVec2::new(
            ctx.rng.i32(area.min.x..=area.max.x),
            ctx.rng.i32(area.min.y..=area.max.y),
        );
        if candidate != origin && ctx.grid.is_free(candidate) {
            destination = Some(candidate);
            break;
        }
    }
    if destination.is_none() {
        let free: Vec<IVec2> = area
            .iter()
            .filter(|p| *p != origin && ctx.grid.is_free(*p))
            .collect();
        if !free.is_empty() {
            destination = Some(free[ctx.rng.usize(..free.len())]);
        }
    }

    let Some(destination) = destination else {
        warn!("{target:?} found no free tile within {range} to teleport to");
        return Ok(None);
    };
    ctx.grid.move_entity(&mut ctx.world, target, destination)?;
    Ok(Some(destination))
}

/// Give `target` `turns` free turns, stacking with any it already has.
/// Zero turns is a no-op.
pub fn speed_boost(ctx: &mut SimContext, target: Entity, turns: u32) -> SimResult<()> {
    if turns == 0 {
        return Ok(());
    }
    let turns_left = ctx
        .world
        .try_get::<FreeTurn>(target)
        .map_or(0, |f| f.turns_left)
        + turns;
    ctx.world.add_component(target, FreeTurn { turns_left })
}
