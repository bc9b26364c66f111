//! # Combat — Bump Resolution and Damage
//!
//! A [`Bump`] is "go one tile that way". What it means depends on what is
//! standing there:
//!
//! ```text
//! destination off-grid      → nothing (intent dropped)
//! destination free          → move, turn spent
//! destination blocked by X  → attack X if X has Health, the actor has
//!                             Attack, and the player is one of the two;
//!                             otherwise nothing (turn kept)
//! ```
//!
//! Attacks never touch health directly. They spawn a message entity holding
//! a [`Damage`], and [`damage_system`] applies every message later in the
//! same step. Explosions and burning feed the same path.

use log::debug;

use crate::components::{
    AiFlyWizard, Attack, Bomber, Bump, Burning, Damage, Dead, Explode, Explosive, FireElement,
    Frozen, GameStats, Health, IceElement, Item, KillRush, MyTurn, Position, WizardState,
};
use crate::ecs::{Entity, Tag};
use crate::effects;
use crate::error::SimResult;
use crate::sim::SimContext;
use crate::systems::ai::change_wizard_state;

// ── Bump ────────────────────────────────────────────────────────────────

pub fn bump_system(ctx: &mut SimContext) -> SimResult<()> {
    for &entity in ctx.world.query_ids::<(Position, Bump, MyTurn)>().iter() {
        let pos = ctx.world.get::<Position>(entity)?.as_ivec2();
        let destination = pos + ctx.world.get::<Bump>(entity)?.direction;
        if !ctx.grid.on_grid(destination) {
            continue;
        }
        match ctx.grid.blocker_at(destination) {
            None => {
                ctx.grid.move_entity(&mut ctx.world, entity, destination)?;
                ctx.world.remove_component::<MyTurn>(entity)?;
            }
            Some(target) if target != entity => attack(ctx, entity, target)?,
            Some(_) => {}
        }
    }
    for &entity in ctx.world.query_ids::<(Bump,)>().iter() {
        ctx.world.remove_component::<Bump>(entity)?;
    }
    Ok(())
}

fn attack(ctx: &mut SimContext, attacker: Entity, target: Entity) -> SimResult<()> {
    if !ctx.world.has::<Health>(target) {
        return Ok(());
    }
    let Some(&Attack { damage: amount }) = ctx.world.try_get::<Attack>(attacker) else {
        return Ok(());
    };
    // Monsters shuffling into each other never fight.
    let player = ctx.world.tag(Tag::Player);
    if player != Some(attacker) && player != Some(target) {
        return Ok(());
    }

    let damage = Damage {
        target,
        amount,
        burn: ctx.world.has::<FireElement>(attacker),
        freeze: ctx.world.has::<IceElement>(attacker),
    };
    ctx.world.spawn((damage,));
    debug!("{attacker:?} attacks {target:?} for {amount}");

    if player == Some(attacker) {
        ctx.feedback.shake(5.0);
        ctx.feedback.sound("punch", 0.5);
    }
    if ctx.world.discard::<Bomber>(attacker) {
        let explode = Explode::from_config(&ctx.config);
        ctx.world.add_component(attacker, explode)?;
    }
    ctx.world.remove_component::<MyTurn>(attacker)?;
    Ok(())
}

// ── Damage ──────────────────────────────────────────────────────────────

/// Apply and consume every [`Damage`] message.
pub fn damage_system(ctx: &mut SimContext) -> SimResult<()> {
    for &message in ctx.world.query_ids::<(Damage,)>().iter() {
        let damage = *ctx.world.get::<Damage>(message)?;
        if ctx.world.contains(damage.target) {
            apply(ctx, damage)?;
        } else {
            debug!("damage for vanished {:?} dropped", damage.target);
        }
        ctx.world.delete_entity(message, false)?;
    }
    Ok(())
}

fn apply(ctx: &mut SimContext, damage: Damage) -> SimResult<()> {
    let target = damage.target;
    let is_player = ctx.is_player(target);

    if let Some(health) = ctx.world.try_get_mut::<Health>(target) {
        health.current -= damage.amount;
        let remaining = health.current;
        debug!("{target:?} takes {} ({remaining} left)", damage.amount);

        if is_player {
            ctx.feedback.shake(5.0 + damage.amount as f32 * 2.0);
            ctx.feedback.sound("ow", 0.4);
        }
        if remaining <= 0 && !ctx.world.has::<Dead>(target) {
            ctx.world.add_component(target, Dead)?;
            if !is_player {
                credit_kill(ctx)?;
            }
        }
        if damage.burn && !ctx.world.has::<FireElement>(target) {
            let turns_left = ctx.config.burn_turns;
            ctx.world.add_component(target, Burning { turns_left })?;
        }
        if damage.freeze && !ctx.world.has::<IceElement>(target) {
            ctx.world.add_component(target, Frozen)?;
        }
    }

    let explosive = ctx.world.try_get_mut::<Explosive>(target);
    let is_explosive = explosive.is_some();
    if let Some(explosive) = explosive {
        explosive.primed = true;
    }
    if ctx.world.has::<Item>(target) && !is_explosive {
        ctx.world.add_component(target, Dead)?;
    }

    if let Some(wizard) = ctx.world.try_get::<AiFlyWizard>(target) {
        let next = match wizard.state {
            WizardState::Angry => WizardState::Normal,
            _ => WizardState::Angry,
        };
        change_wizard_state(ctx, target, next)?;
    }
    Ok(())
}

fn credit_kill(ctx: &mut SimContext) -> SimResult<()> {
    let Some(player) = ctx.world.tag(Tag::Player) else {
        return Ok(());
    };
    if let Some(stats) = ctx.world.try_get_mut::<GameStats>(player) {
        stats.kills += 1;
    }
    if ctx.world.has::<KillRush>(player) {
        effects::speed_boost(ctx, player, 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Blocker, Initiative};
    use crate::feedback::FeedbackEvent;
    use crate::systems::testing::{ctx, player_at, spawn_at};
    use glam::IVec2;

    fn monster(ctx: &mut SimContext, x: i32, y: i32, hp: i32) -> Entity {
        spawn_at(ctx, x, y, (Blocker, Health::new(hp), Attack { damage: 3 }))
    }

    // ── Bump tests ──

    #[test]
    fn bump_into_free_tile_moves_and_spends_turn() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        ctx.sync_grid().unwrap();
        ctx.world.add_component(player, MyTurn).unwrap();
        ctx.world.add_component(player, Bump::new(0, 1)).unwrap();

        bump_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Position>(player).unwrap().as_ivec2(), IVec2::new(2, 3));
        assert_eq!(ctx.grid.blocker_at(IVec2::new(2, 3)), Some(player));
        assert!(!ctx.world.has::<MyTurn>(player));
        assert!(!ctx.world.has::<Bump>(player));
    }

    #[test]
    fn bump_off_grid_is_dropped_and_turn_kept() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        ctx.sync_grid().unwrap();
        ctx.world.add_component(player, MyTurn).unwrap();
        ctx.world.add_component(player, Bump::new(-1, 0)).unwrap();

        bump_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Position>(player).unwrap().as_ivec2(), IVec2::ZERO);
        assert!(ctx.world.has::<MyTurn>(player));
        assert!(!ctx.world.has::<Bump>(player));
    }

    #[test]
    fn player_attack_raises_damage_and_feedback() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        let ogre = monster(&mut ctx, 3, 2, 10);
        ctx.world.add_component(player, FireElement).unwrap();
        ctx.sync_grid().unwrap();
        ctx.world.add_component(player, MyTurn).unwrap();
        ctx.world.add_component(player, Bump::new(1, 0)).unwrap();

        bump_system(&mut ctx).unwrap();
        let (_, damage) = ctx.world.query::<Damage>().next().unwrap();
        assert_eq!(damage.target, ogre);
        assert_eq!(damage.amount, 5);
        assert!(damage.burn && !damage.freeze);
        assert!(!ctx.world.has::<MyTurn>(player));
        assert_eq!(
            ctx.feedback.events(),
            &[
                FeedbackEvent::Shake { intensity: 5.0 },
                FeedbackEvent::Sound {
                    name: "punch",
                    volume: 0.5
                },
            ]
        );
        // The attacker did not move.
        assert_eq!(ctx.world.get::<Position>(player).unwrap().as_ivec2(), IVec2::new(2, 2));
    }

    #[test]
    fn monsters_do_not_attack_each_other() {
        let mut ctx = ctx();
        player_at(&mut ctx, 8, 8);
        let a = monster(&mut ctx, 2, 2, 10);
        let _b = monster(&mut ctx, 3, 2, 10);
        ctx.sync_grid().unwrap();
        ctx.world.add_component(a, MyTurn).unwrap();
        ctx.world.add_component(a, Bump::new(1, 0)).unwrap();

        bump_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.count::<Damage>(), 0);
        assert!(ctx.world.has::<MyTurn>(a));
    }

    #[test]
    fn bump_into_wall_keeps_turn() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        spawn_at(&mut ctx, 2, 1, (Blocker,));
        ctx.sync_grid().unwrap();
        ctx.world.add_component(player, MyTurn).unwrap();
        ctx.world.add_component(player, Bump::new(0, -1)).unwrap();

        bump_system(&mut ctx).unwrap();
        assert!(ctx.world.has::<MyTurn>(player));
        assert_eq!(ctx.world.count::<Damage>(), 0);
    }

    #[test]
    fn bomber_attack_turns_into_explosion() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        let goblin = monster(&mut ctx, 3, 2, 10);
        ctx.world.add_component(goblin, Bomber).unwrap();
        ctx.sync_grid().unwrap();
        ctx.world.add_component(goblin, MyTurn).unwrap();
        ctx.world.add_component(goblin, Bump::new(-1, 0)).unwrap();

        bump_system(&mut ctx).unwrap();
        assert!(ctx.world.has::<Explode>(goblin));
        assert!(!ctx.world.has::<Bomber>(goblin));
        let (_, damage) = ctx.world.query::<Damage>().next().unwrap();
        assert_eq!(damage.target, player);
    }

    #[test]
    fn only_turn_holders_bump() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 2, 2);
        ctx.sync_grid().unwrap();
        ctx.world.add_component(player, Bump::new(1, 0)).unwrap();
        bump_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Position>(player).unwrap().as_ivec2(), IVec2::new(2, 2));
        assert!(!ctx.world.has::<Bump>(player));
    }

    // ── Damage tests ──

    #[test]
    fn lethal_damage_marks_dead_and_counts_kill() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        let snake = monster(&mut ctx, 4, 4, 5);
        let msg = ctx.world.spawn((Damage::new(snake, 5),));

        damage_system(&mut ctx).unwrap();
        assert!(ctx.world.has::<Dead>(snake));
        assert_eq!(ctx.world.get::<GameStats>(player).unwrap().kills, 1);
        assert!(ctx.world.is_pending_deletion(msg));
    }

    #[test]
    fn already_dead_target_is_not_counted_twice() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        let snake = monster(&mut ctx, 4, 4, 5);
        ctx.world.spawn((Damage::new(snake, 5),));
        ctx.world.spawn((Damage::new(snake, 5),));
        damage_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<GameStats>(player).unwrap().kills, 1);
        assert_eq!(ctx.world.get::<Health>(snake).unwrap().current, -5);
    }

    #[test]
    fn hurting_the_player_shakes_the_camera() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        ctx.world.spawn((Damage::new(player, 3),));
        damage_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Health>(player).unwrap().current, 47);
        assert_eq!(
            ctx.feedback.drain(),
            vec![
                FeedbackEvent::Shake { intensity: 11.0 },
                FeedbackEvent::Sound {
                    name: "ow",
                    volume: 0.4
                },
            ]
        );
    }

    #[test]
    fn dead_player_is_not_credited_as_a_kill() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        ctx.world.spawn((Damage::new(player, 100),));
        damage_system(&mut ctx).unwrap();
        assert!(ctx.world.has::<Dead>(player));
        assert_eq!(ctx.world.get::<GameStats>(player).unwrap().kills, 0);
    }

    #[test]
    fn elemental_damage_respects_immunity() {
        let mut ctx = ctx();
        player_at(&mut ctx, 0, 0);
        let plain = monster(&mut ctx, 4, 4, 50);
        let fiery = monster(&mut ctx, 5, 5, 50);
        ctx.world.add_component(fiery, FireElement).unwrap();
        for target in [plain, fiery] {
            ctx.world.spawn((Damage {
                target,
                amount: 1,
                burn: true,
                freeze: true,
            },));
        }
        damage_system(&mut ctx).unwrap();
        assert_eq!(*ctx.world.get::<Burning>(plain).unwrap(), Burning { turns_left: 5 });
        assert!(ctx.world.has::<Frozen>(plain));
        assert!(!ctx.world.has::<Burning>(fiery));
        assert!(ctx.world.has::<Frozen>(fiery));
    }

    #[test]
    fn damaged_items_break_and_explosives_prime() {
        let mut ctx = ctx();
        player_at(&mut ctx, 0, 0);
        let potion = spawn_at(&mut ctx, 3, 3, (Item { consumable: true },));
        let bomb = spawn_at(&mut ctx, 3, 3, (Item { consumable: false }, Explosive::new(3)));
        ctx.world.spawn((Damage::new(potion, 10),));
        ctx.world.spawn((Damage::new(bomb, 10),));
        damage_system(&mut ctx).unwrap();
        assert!(ctx.world.has::<Dead>(potion));
        assert!(!ctx.world.has::<Dead>(bomb));
        assert!(ctx.world.get::<Explosive>(bomb).unwrap().primed);
    }

    #[test]
    fn kill_rush_grants_a_free_turn() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        ctx.world.add_component(player, KillRush).unwrap();
        let snake = monster(&mut ctx, 4, 4, 1);
        ctx.world.spawn((Damage::new(snake, 1),));
        damage_system(&mut ctx).unwrap();
        assert_eq!(
            *ctx.world.get::<crate::components::FreeTurn>(player).unwrap(),
            crate::components::FreeTurn { turns_left: 1 }
        );
    }

    #[test]
    fn hitting_the_wizard_toggles_its_mood() {
        let mut ctx = ctx();
        ctx.config.wizard_flies = 0;
        player_at(&mut ctx, 0, 0);
        let wizard = ctx.spawn_template(crate::templates::Template::FlyWizard, IVec2::new(5, 5));
        ctx.sync_grid().unwrap();

        ctx.world.spawn((Damage::new(wizard, 1),));
        damage_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<AiFlyWizard>(wizard).unwrap().state, WizardState::Angry);
        assert_eq!(ctx.world.get::<Initiative>(wizard).unwrap().speed, 1);

        ctx.world.spawn((Damage::new(wizard, 1),));
        damage_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<AiFlyWizard>(wizard).unwrap().state, WizardState::Normal);
    }
}
