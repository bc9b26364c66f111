//! Grid sync and turn granting.
//!
//! Initiative works as a countdown per entity. When nobody holds
//! [`MyTurn`] a turn boundary has been reached (`clock.tick`): every
//! countdown drops by one and those reaching zero are granted the marker and
//! pay their `speed` back. While anyone holds [`FreeTurn`], only free-turn
//! holders advance.

use log::debug;

use crate::components::{FreeTurn, Initiative, MyTurn};
use crate::error::SimResult;
use crate::sim::SimContext;

/// Reconcile the grid with positions changed since the last step.
pub fn grid_sync_system(ctx: &mut SimContext) -> SimResult<()> {
    ctx.sync_grid()
}

pub fn initiative_system(ctx: &mut SimContext) -> SimResult<()> {
    ctx.clock.tick = ctx.world.count::<MyTurn>() == 0;
    if !ctx.clock.tick {
        return Ok(());
    }

    let free_turn_holders = ctx.world.query_ids::<(FreeTurn,)>();
    if !free_turn_holders.is_empty() {
        for &entity in free_turn_holders.iter() {
            if !ctx.world.has::<Initiative>(entity) {
                ctx.world.remove_component::<FreeTurn>(entity)?;
                continue;
            }
            let free = ctx.world.get_mut::<FreeTurn>(entity)?;
            free.turns_left = free.turns_left.saturating_sub(1);
            if free.turns_left == 0 {
                ctx.world.remove_component::<FreeTurn>(entity)?;
            }
            grant_if_due(ctx, entity)?;
        }
        // Nobody else moves during free turns.
        ctx.clock.tick = false;
        return Ok(());
    }

    for &entity in ctx.world.query_ids::<(Initiative,)>().iter() {
        grant_if_due(ctx, entity)?;
    }
    Ok(())
}

fn grant_if_due(ctx: &mut SimContext, entity: crate::ecs::Entity) -> SimResult<()> {
    let initiative = ctx.world.get_mut::<Initiative>(entity)?;
    initiative.countdown -= 1;
    if initiative.countdown <= 0 {
        initiative.countdown += initiative.speed;
        ctx.world.add_component(entity, MyTurn)?;
        debug!("{entity:?} gets the turn");
    }
    Ok(())
}
