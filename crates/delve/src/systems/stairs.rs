//! Level transitions.

use std::collections::BTreeSet;

use log::info;

use crate::components::{Inventory, Level, PendingDelete, Position, Stairs, StairsDirection, Stored};
use crate::ecs::Entity;
use crate::error::SimResult;
use crate::sim::SimContext;

/// When the player stands on stairs: change depth, queue everything that is
/// not the player or in its pack for deletion, and load the next level.
pub fn stairs_system(ctx: &mut SimContext) -> SimResult<()> {
    let player = ctx.player()?;
    let Some(&player_pos) = ctx.world.try_get::<Position>(player) else {
        return Ok(());
    };
    let Some(stairs) = ctx
        .world
        .query_all::<(Stairs, Position)>()
        .find(|(_, (_, pos))| **pos == player_pos)
        .map(|(_, (stairs, _))| *stairs)
    else {
        return Ok(());
    };

    if stairs.direction == StairsDirection::Down {
        ctx.world.get_mut::<Level>(player)?.depth += 1;
    }

    let mut keep: BTreeSet<Entity> = BTreeSet::from([player]);
    if let Some(inventory) = ctx.world.try_get::<Inventory>(player) {
        keep.extend(inventory.contents.iter().copied());
    }
    let positioned = ctx.world.query_ids::<(Position,)>();
    let stored = ctx.world.query_ids::<(Stored,)>();
    for &entity in positioned.iter().chain(stored.iter()) {
        if !keep.contains(&entity) {
            ctx.world.add_component(entity, PendingDelete)?;
        }
    }

    info!("{player:?} takes the stairs {:?}", stairs.direction);
    ctx.load_level()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Blocker, Item};
    use crate::systems::testing::{ctx, player_at, spawn_at};
    use glam::IVec2;

    #[test]
    fn stepping_on_stairs_loads_the_next_depth() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 4, 4);
        spawn_at(&mut ctx, 4, 4, (Stairs::default(),));
        let monster = spawn_at(&mut ctx, 7, 7, (Blocker,));
        let carried = ctx.world.spawn((Item { consumable: true }, Stored { carrier: player }));
        ctx.world.get_mut::<Inventory>(player).unwrap().contents.push(carried);
        let foreign = ctx.world.spawn((Item { consumable: true }, Stored { carrier: monster }));

        stairs_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Level>(player).unwrap().depth, 2);
        assert!(ctx.world.has::<PendingDelete>(monster));
        assert!(ctx.world.has::<PendingDelete>(foreign));
        assert!(!ctx.world.has::<PendingDelete>(player));
        assert!(!ctx.world.has::<PendingDelete>(carried));
        // Empty arena on a 10x10 grid starts the player at (1, 5).
        assert_eq!(ctx.world.get::<Position>(player).unwrap().as_ivec2(), IVec2::new(1, 5));
    }

    #[test]
    fn up_stairs_keep_the_depth() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 4, 4);
        spawn_at(
            &mut ctx,
            4,
            4,
            (Stairs {
                direction: StairsDirection::Up,
            },),
        );
        stairs_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Level>(player).unwrap().depth, 1);
    }

    #[test]
    fn nothing_happens_off_the_stairs() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 4, 4);
        spawn_at(&mut ctx, 5, 4, (Stairs::default(),));
        let before = ctx.world.entity_count();
        stairs_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.entity_count(), before);
        assert_eq!(ctx.world.get::<Level>(player).unwrap().depth, 1);
    }
}
