//! Picking up items.

use log::debug;

use crate::components::{Inventory, Item, MyTurn, Position, Stored};
use crate::ecs::Entity;
use crate::error::SimResult;
use crate::sim::SimContext;

/// Carriers pick up every item on their tile once their action is over,
/// until their inventory is full.
pub fn pickup_system(ctx: &mut SimContext) -> SimResult<()> {
    for &carrier in ctx.world.query_ids::<(Position, Inventory)>().iter() {
        if ctx.world.has::<MyTurn>(carrier) {
            continue;
        }
        let pos = *ctx.world.get::<Position>(carrier)?;
        let here: Vec<Entity> = ctx
            .world
            .query_all::<(Item, Position)>()
            .filter(|(e, (_, p))| *e != carrier && **p == pos)
            .map(|(e, _)| e)
            .collect();

        for item in here {
            if ctx.world.get::<Inventory>(carrier)?.is_full() {
                break;
            }
            ctx.grid.remove_tracking(item);
            ctx.world.remove_component::<Position>(item)?;
            ctx.world.add_component(item, Stored { carrier })?;
            ctx.world.get_mut::<Inventory>(carrier)?.contents.push(item);
            debug!("{carrier:?} picked up {item:?}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::testing::{ctx, player_at, spawn_at};
    use glam::IVec2;

    fn item_at(ctx: &mut SimContext, x: i32, y: i32) -> Entity {
        spawn_at(ctx, x, y, (Item { consumable: true },))
    }

    #[test]
    fn carrier_picks_up_items_on_its_tile() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        let a = item_at(&mut ctx, 2, 2);
        let elsewhere = item_at(&mut ctx, 3, 2);
        ctx.sync_grid().unwrap();

        pickup_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Inventory>(player).unwrap().contents, vec![a]);
        assert_eq!(*ctx.world.get::<Stored>(a).unwrap(), Stored { carrier: player });
        assert!(!ctx.world.has::<Position>(a));
        assert_eq!(ctx.grid.tracked_position(a), None);
        assert!(!ctx.grid.entities_at(IVec2::new(2, 2)).contains(&a));
        assert!(ctx.world.has::<Position>(elsewhere));
    }

    #[test]
    fn no_pickup_while_holding_the_turn() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        ctx.world.add_component(player, MyTurn).unwrap();
        item_at(&mut ctx, 2, 2);
        pickup_system(&mut ctx).unwrap();
        assert!(ctx.world.get::<Inventory>(player).unwrap().contents.is_empty());
    }

    #[test]
    fn full_inventory_leaves_the_rest() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        ctx.world.get_mut::<Inventory>(player).unwrap().capacity = 2;
        let items: Vec<Entity> = (0..3).map(|_| item_at(&mut ctx, 2, 2)).collect();
        ctx.sync_grid().unwrap();

        pickup_system(&mut ctx).unwrap();
        assert_eq!(
            ctx.world.get::<Inventory>(player).unwrap().contents,
            vec![items[0], items[1]]
        );
        assert!(ctx.world.has::<Position>(items[2]));
    }
}
