//! # Lifecycle — Idle Turns, Death and Deletion
//!
//! Death is two-phase:
//!
//! ```text
//! Dead           soft: "react to my death" (split, drop bomb, free minions)
//!   ↓ dead_system
//! PendingDelete  hard: "remove me this step"
//!   ↓ delete_system
//! deferred deletion, swept by Simulation::run_step after the last system
//! ```
//!
//! Deletion goes through [`SimContext::delete_entity`], which unwinds
//! relationships: the entity leaves its carrier's inventory, leaves the grid,
//! and takes whatever it was carrying with it. Skipping any of these leaves
//! dangling ids behind.

use log::{debug, warn};

use crate::components::{
    Boss, Bomber, Dead, Explosive, FireElement, IceElement, Initiative, Inventory, MyTurn,
    PendingDelete, Position, Split, Stored,
};
use crate::ecs::Entity;
use crate::error::SimResult;
use crate::sim::SimContext;
use crate::templates::Template;

/// Non-player entities that still hold the turn after every decider ran
/// pass, and try again next tick.
pub fn idle_system(ctx: &mut SimContext) -> SimResult<()> {
    for &entity in ctx.world.query_ids::<(MyTurn,)>().iter() {
        if ctx.is_player(entity) {
            continue;
        }
        ctx.world.remove_component::<MyTurn>(entity)?;
        if let Some(initiative) = ctx.world.try_get_mut::<Initiative>(entity) {
            initiative.countdown = 1;
        }
    }
    Ok(())
}

/// Dead entities with [`Split`] scatter their offspring on free adjacent
/// tiles. Offspring inherit the parent's element.
pub fn split_system(ctx: &mut SimContext) -> SimResult<()> {
    for &entity in ctx.world.query_ids::<(Split, Dead, Position)>().iter() {
        let pos = ctx.world.get::<Position>(entity)?.as_ivec2();
        let split = ctx.world.remove_component::<Split>(entity)?;
        let ice = ctx.world.has::<IceElement>(entity);
        let fire = ctx.world.has::<FireElement>(entity);

        for template in split.offspring {
            let Some(spawn) = ctx.grid.random_free_adjacent(pos, &mut ctx.rng) else {
                warn!("no room around {pos} for {entity:?}'s {}", template.name());
                continue;
            };
            let child = ctx.spawn_template(template, spawn);
            if ice {
                ctx.world.add_component(child, IceElement)?;
            }
            if fire {
                ctx.world.add_component(child, FireElement)?;
            }
            ctx.sync_grid()?;
            debug!("{entity:?} split off {child:?} at {spawn}");
        }
    }
    Ok(())
}

/// Run death reactions, then queue every dead entity except the player.
pub fn dead_system(ctx: &mut SimContext) -> SimResult<()> {
    for &entity in ctx.world.query_ids::<(Dead,)>().iter() {
        let pos = ctx.world.try_get::<Position>(entity).map(|p| p.as_ivec2());

        if let Some(pos) = pos.filter(|_| ctx.world.has::<Bomber>(entity)) {
            let mut explosive = ctx
                .world
                .try_get::<Explosive>(entity)
                .copied()
                .unwrap_or(Explosive::new(3));
            explosive.primed = true;
            let bomb = ctx.spawn_template(Template::Bomb, pos);
            ctx.world.add_component(bomb, explosive)?;
            debug!("{entity:?} dropped {bomb:?}");
        }

        if let Some(boss) = ctx.world.try_get::<Boss>(entity) {
            let minions = boss.minions.clone();
            for minion in minions {
                if ctx.world.contains(minion) && !ctx.world.is_pending_deletion(minion) {
                    ctx.world.add_component(minion, PendingDelete)?;
                }
            }
            if let Some(pos) = pos {
                ctx.spawn_template(Template::Stairs, pos);
            }
            debug!("boss {entity:?} fell");
        }

        if !ctx.is_player(entity) {
            ctx.world.add_component(entity, PendingDelete)?;
        }
    }
    Ok(())
}

pub fn delete_system(ctx: &mut SimContext) -> SimResult<()> {
    for &entity in ctx.world.query_ids::<(PendingDelete,)>().iter() {
        ctx.delete_entity(entity, false)?;
    }
    Ok(())
}
