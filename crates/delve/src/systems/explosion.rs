//! Fuses and detonations.
//!
//! A primed [`Explosive`] burns one fuse unit per turn tick and gains
//! [`Explode`] at zero. Anything holding `Explode` (a burnt-out bomb, a bomb
//! goblin that just attacked) detonates this step:
//!
//! 1. the detonating entity is marked [`Dead`];
//! 2. its origin is its own tile, or the tile of whoever carries it;
//! 3. every other entity in the square `TileRect::around(origin, radius)`
//!    is hit. Walls and other health-less destructibles and plain items are
//!    destroyed outright; everything else receives a [`Damage`] message
//!    (which also primes neighbouring bombs, so explosions chain).

use std::collections::BTreeSet;

use glam::IVec2;
use log::{debug, warn};

use crate::components::{
    Bomber, Damage, Dead, Destructible, Explode, Explosive, Health, Item, Position, Stored,
};
use crate::ecs::{Entity, World};
use crate::error::SimResult;
use crate::math::{TileRect, distance};
use crate::sim::SimContext;

pub fn explosion_system(ctx: &mut SimContext) -> SimResult<()> {
    if ctx.clock.tick {
        burn_fuses(ctx)?;
    }
    for &entity in ctx.world.query_ids::<(Explode,)>().iter() {
        let explode = ctx.world.remove_component::<Explode>(entity)?;
        ctx.world.discard::<Bomber>(entity);
        ctx.world.add_component(entity, Dead)?;

        let Some(origin) = origin_of(&ctx.world, entity) else {
            debug!("{entity:?} detonated nowhere");
            continue;
        };
        debug!("{entity:?} explodes at {origin} (radius {})", explode.radius);

        let area = TileRect::around(origin, explode.radius);
        let mut hit: Vec<Entity> = Vec::new();
        for tile in area.iter().filter(|t| ctx.grid.on_grid(*t)) {
            hit.extend(ctx.grid.entities_at(tile).iter().copied().filter(|e| *e != entity));
        }
        for target in hit {
            if !ctx.world.contains(target) {
                continue;
            }
            let destructible = ctx.world.has::<Destructible>(target) && !ctx.world.has::<Health>(target);
            let fragile = ctx.world.has::<Item>(target) && !ctx.world.has::<Explosive>(target);
            if destructible || fragile {
                ctx.world.add_component(target, Dead)?;
            } else {
                ctx.world.spawn((Damage::new(target, explode.damage),));
            }
        }

        if let Ok(player_pos) = ctx.player_pos() {
            let d = distance(origin, player_pos);
            if d < ctx.config.feedback_range {
                ctx.feedback.shake(40.0 - d * 3.0);
                ctx.feedback.sound("explosion", 0.6 - d * 0.05);
            }
        }
    }
    Ok(())
}

fn burn_fuses(ctx: &mut SimContext) -> SimResult<()> {
    for &entity in ctx.world.query_ids::<(Explosive,)>().iter() {
        let explosive = ctx.world.get_mut::<Explosive>(entity)?;
        if !explosive.primed {
            continue;
        }
        explosive.fuse = explosive.fuse.saturating_sub(1);
        if explosive.fuse == 0 {
            let explode = Explode::from_config(&ctx.config);
            ctx.world.add_component(entity, explode)?;
        }
    }
    Ok(())
}

/// The tile an entity explodes on: its own, or its outermost carrier's.
pub fn origin_of(world: &World, entity: Entity) -> Option<IVec2> {
    let mut seen = BTreeSet::new();
    let mut current = entity;
    while let Some(stored) = world.try_get::<Stored>(current) {
        if !seen.insert(current) {
            warn!("carrier cycle through {current:?}");
            return None;
        }
        current = stored.carrier;
    }
    world.try_get::<Position>(current).map(|p| p.as_ivec2())
}
