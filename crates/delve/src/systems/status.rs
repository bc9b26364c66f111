//! Status effects: freezing, burning, regeneration.
//!
//! Burning and regeneration advance on turn ticks only, so a fast creature
//! does not burn faster than a slow one.

use log::debug;

use crate::components::{Bump, Burning, Damage, Frozen, Health, Initiative, MyTurn, Regen};
use crate::error::SimResult;
use crate::sim::SimContext;

/// A frozen entity trying to act spends the action thawing instead.
pub fn freezing_system(ctx: &mut SimContext) -> SimResult<()> {
    for &entity in ctx.world.query_ids::<(Frozen, MyTurn, Bump)>().iter() {
        ctx.world.remove_component::<Frozen>(entity)?;
        ctx.world.remove_component::<MyTurn>(entity)?;
        ctx.world.remove_component::<Bump>(entity)?;
        if let Some(initiative) = ctx.world.try_get_mut::<Initiative>(entity) {
            initiative.countdown = 1;
        }
        debug!("{entity:?} thawed");
    }
    Ok(())
}

pub fn burning_system(ctx: &mut SimContext) -> SimResult<()> {
    if !ctx.clock.tick {
        return Ok(());
    }
    let amount = ctx.config.burn_damage;
    for &entity in ctx.world.query_ids::<(Burning,)>().iter() {
        if ctx.world.has::<Health>(entity) {
            ctx.world.spawn((Damage::new(entity, amount),));
        }
        let burning = ctx.world.get_mut::<Burning>(entity)?;
        burning.turns_left = burning.turns_left.saturating_sub(1);
        if burning.turns_left == 0 {
            ctx.world.remove_component::<Burning>(entity)?;
            debug!("{entity:?} stopped burning");
        }
    }
    Ok(())
}

pub fn regen_system(ctx: &mut SimContext) -> SimResult<()> {
    if !ctx.clock.tick {
        return Ok(());
    }
    for &entity in ctx.world.query_ids::<(Regen, Health)>().iter() {
        let amount = ctx.world.get::<Regen>(entity)?.amount;
        let health = ctx.world.get_mut::<Health>(entity)?;
        if health.current < health.max {
            health.current = (health.current + amount).min(health.max);
        }
    }
    Ok(())
}
