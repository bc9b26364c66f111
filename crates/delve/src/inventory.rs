//! Item actions.
//!
//! Menus live outside the crate; these are the actions they trigger. The
//! driver calls them between steps, on items held by `carrier`. Each one
//! re-syncs the grid first, since positions may have changed since the last
//! step's sync (a level transition, for one).

use glam::IVec2;
use log::debug;

use crate::components::{
    Dead, Explosive, Inventory, Item, Position, Stored, UseEffect, WeakPotions,
};
use crate::ecs::{Entity, World};
use crate::error::{SimError, SimResult};
use crate::input::Direction;
use crate::sim::SimContext;

/// Where a thrown item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throw {
    pub landed: IVec2,
    /// The blocker the item struck, if any.
    pub hit: Option<Entity>,
}

/// Apply every effect of `item` to `user`. Users with [`WeakPotions`] get
/// half strength. Consumables are used up.
pub fn use_item(ctx: &mut SimContext, user: Entity, item: Entity) -> SimResult<()> {
    check_carried(&ctx.world, user, item)?;
    ctx.sync_grid()?;
    let effects = ctx.world.get::<UseEffect>(item)?.effects.clone();
    let weak = ctx.world.has::<WeakPotions>(user);
    for effect in effects {
        let effect = if weak { effect.halved() } else { effect };
        debug!("{user:?} uses {item:?}: {effect:?}");
        effect.apply(ctx, user)?;
    }
    if ctx.world.get::<Item>(item)?.consumable {
        take_out(&mut ctx.world, user, item)?;
        ctx.delete_entity(item, true)?;
    }
    Ok(())
}

/// Arm an explosive. Its fuse starts burning on the next tick.
pub fn prime_item(world: &mut World, item: Entity) -> SimResult<()> {
    world.get_mut::<Explosive>(item)?.primed = true;
    debug!("{item:?} primed");
    Ok(())
}

/// Put `item` down on `carrier`'s tile.
pub fn drop_item(ctx: &mut SimContext, carrier: Entity, item: Entity) -> SimResult<IVec2> {
    check_carried(&ctx.world, carrier, item)?;
    let pos = ctx.world.get::<Position>(carrier)?.as_ivec2();
    take_out(&mut ctx.world, carrier, item)?;
    ctx.world.add_component(item, Position::from(pos))?;
    ctx.sync_grid()?;
    Ok(pos)
}

/// Throw `item` up to `throw_range` tiles in `direction`.
///
/// The item flies until the next tile is off the grid or blocked, and lands
/// on the last free tile. A blocker it strikes receives the item's effects
/// at full strength; a consumable that strikes something breaks.
pub fn throw_item(
    ctx: &mut SimContext,
    thrower: Entity,
    item: Entity,
    direction: Direction,
) -> SimResult<Throw> {
    check_carried(&ctx.world, thrower, item)?;
    ctx.sync_grid()?;
    let step = direction.offset();
    let mut landed = ctx.world.get::<Position>(thrower)?.as_ivec2();
    let mut hit = None;
    for _ in 0..ctx.config.throw_range {
        let next = landed + step;
        if !ctx.grid.on_grid(next) {
            break;
        }
        if let Some(blocker) = ctx.grid.blocker_at(next) {
            hit = Some(blocker);
            break;
        }
        landed = next;
    }

    take_out(&mut ctx.world, thrower, item)?;
    ctx.world.add_component(item, Position::from(landed))?;
    ctx.sync_grid()?;

    if let Some(target) = hit {
        if let Some(use_effect) = ctx.world.try_get::<UseEffect>(item) {
            for effect in use_effect.effects.clone() {
                effect.apply(ctx, target)?;
            }
        }
        if ctx.world.get::<Item>(item)?.consumable {
            ctx.world.add_component(item, Dead)?;
        }
    }
    debug!("{thrower:?} threw {item:?} to {landed} hitting {hit:?}");
    Ok(Throw { landed, hit })
}

fn check_carried(world: &World, carrier: Entity, item: Entity) -> SimResult<()> {
    let stored = world.get::<Stored>(item)?;
    if stored.carrier != carrier {
        return Err(SimError::invariant(format!(
            "{item:?} is carried by {:?}, not {carrier:?}",
            stored.carrier
        )));
    }
    Ok(())
}

fn take_out(world: &mut World, carrier: Entity, item: Entity) -> SimResult<()> {
    world
        .get_mut::<Inventory>(carrier)?
        .contents
        .retain(|e| *e != item);
    world.remove_component::<Stored>(item)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Blocker, FreeTurn, Health};
    use crate::ecs::Tag;
    use crate::systems::testing::{ctx, player_at, spawn_at};
    use crate::templates::Template;

    fn give(ctx: &mut SimContext, carrier: Entity, template: Template) -> Entity {
        let item = ctx.spawn_template(template, IVec2::ZERO);
        ctx.world.remove_component::<Position>(item).unwrap();
        ctx.world.add_component(item, Stored { carrier }).unwrap();
        ctx.world.get_mut::<Inventory>(carrier).unwrap().contents.push(item);
        item
    }

    #[test]
    fn drinking_a_potion_heals_and_consumes_it() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        ctx.world.get_mut::<Health>(player).unwrap().current = 10;
        let potion = give(&mut ctx, player, Template::HealthPotion);

        use_item(&mut ctx, player, potion).unwrap();
        assert_eq!(ctx.world.get::<Health>(player).unwrap().current, 30);
        assert!(ctx.world.get::<Inventory>(player).unwrap().contents.is_empty());
        assert!(!ctx.world.contains(potion));
    }

    #[test]
    fn weak_potions_are_halved() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        ctx.world.add_component(player, WeakPotions).unwrap();
        let potion = give(&mut ctx, player, Template::SpeedPotion);
        use_item(&mut ctx, player, potion).unwrap();
        assert_eq!(*ctx.world.get::<FreeTurn>(player).unwrap(), FreeTurn { turns_left: 2 });
    }

    #[test]
    fn using_someone_elses_item_fails() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        let other = spawn_at(&mut ctx, 5, 5, (Inventory::new(3),));
        let potion = give(&mut ctx, other, Template::HealthPotion);
        let err = use_item(&mut ctx, player, potion).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolation(_)));
    }

    #[test]
    fn drop_places_item_under_the_carrier() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        let bomb = give(&mut ctx, player, Template::Bomb);
        prime_item(&mut ctx.world, bomb).unwrap();

        assert_eq!(drop_item(&mut ctx, player, bomb).unwrap(), IVec2::new(2, 2));
        assert!(!ctx.world.has::<Stored>(bomb));
        assert!(ctx.world.get::<Explosive>(bomb).unwrap().primed);
        assert!(ctx.grid.entities_at(IVec2::new(2, 2)).contains(&bomb));
    }

    #[test]
    fn throw_stops_before_a_blocker_and_hits_it() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        let ogre = spawn_at(&mut ctx, 2, 5, (Blocker, Health { current: 1, max: 20 }));
        let potion = give(&mut ctx, player, Template::HealthPotion);

        let throw = throw_item(&mut ctx, player, potion, Direction::Down).unwrap();
        assert_eq!(throw, Throw { landed: IVec2::new(2, 4), hit: Some(ogre) });
        assert_eq!(ctx.world.get::<Health>(ogre).unwrap().current, 20);
        assert!(ctx.world.has::<Dead>(potion));
    }

    #[test]
    fn throw_stops_at_range_or_edge() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        let bomb = give(&mut ctx, player, Template::Bomb);
        let throw = throw_item(&mut ctx, player, bomb, Direction::Right).unwrap();
        assert_eq!(throw, Throw { landed: IVec2::new(7, 2), hit: None });

        let player_pos = ctx.world.get::<Position>(player).unwrap().as_ivec2();
        let second = give(&mut ctx, player, Template::Bomb);
        let throw = throw_item(&mut ctx, player, second, Direction::Up).unwrap();
        assert_eq!(throw.landed, IVec2::new(player_pos.x, 0));
        assert_eq!(ctx.world.tag(Tag::Player), Some(player));
    }

    #[test]
    fn throw_into_adjacent_wall_lands_at_the_feet() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        let bomb = give(&mut ctx, player, Template::Bomb);
        let throw = throw_item(&mut ctx, player, bomb, Direction::Left).unwrap();
        assert_eq!(throw, Throw { landed: IVec2::ZERO, hit: None });
        assert!(!ctx.world.has::<Dead>(bomb));
    }
}
