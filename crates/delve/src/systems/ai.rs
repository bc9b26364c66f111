//! AI deciders.
//!
//! AI systems only raise intents ([`Bump`]) or change their own state. The
//! bump system resolves the intents later in the same step, exactly like
//! player input.

use glam::IVec2;
use log::debug;

use crate::components::{
    Ai, AiDodge, AiFlyWizard, Boss, Bump, Dead, Initiative, Movement, MyTurn, Position, Render,
    WizardState,
};
use crate::ecs::Entity;
use crate::effects;
use crate::error::SimResult;
use crate::grid::Grid;
use crate::math::distance;
use crate::sim::SimContext;
use crate::templates::{Template, wizard_image};

// ── Chase ───────────────────────────────────────────────────────────────

/// Entities with [`Ai`] that hold the turn walk towards the player when it
/// is within `aggro_range`.
pub fn chase_ai_system(ctx: &mut SimContext) -> SimResult<()> {
    let player = ctx.player()?;
    let Some(player_pos) = ctx.world.try_get::<Position>(player).map(|p| p.as_ivec2()) else {
        return Ok(());
    };

    for &entity in ctx.world.query_ids::<(Movement, Position, Ai, MyTurn)>().iter() {
        let pos = ctx.world.get::<Position>(entity)?.as_ivec2();
        let diagonal = ctx.world.get::<Movement>(entity)?.diagonal;

        let target = (distance(pos, player_pos) <= ctx.config.aggro_range).then_some(player);
        ctx.world.get_mut::<Ai>(entity)?.target = target;
        let Some(target) = target else { continue };

        if let Some(step) = chase_step(&ctx.grid, pos, player_pos, target, diagonal, &mut ctx.rng) {
            ctx.world.add_component(entity, Bump { direction: step })?;
        }
    }
    Ok(())
}

/// One-tile step from `pos` towards `goal`: diagonal when allowed, then the
/// major axis (coin flip on ties), then the other axis. A step is only taken
/// onto an on-grid tile that is free or held by `target`.
fn chase_step(
    grid: &Grid,
    pos: IVec2,
    goal: IVec2,
    target: Entity,
    diagonal: bool,
    rng: &mut fastrand::Rng,
) -> Option<IVec2> {
    let passable = |step: IVec2| {
        let to = pos + step;
        step != IVec2::ZERO
            && grid.on_grid(to)
            && grid.blocker_at(to).is_none_or(|b| b == target)
    };
    let delta = goal - pos;
    let sign = delta.signum();

    if diagonal && passable(sign) {
        return Some(sign);
    }

    let along_x = IVec2::new(sign.x, 0);
    let along_y = IVec2::new(0, sign.y);
    let (major, minor) = match delta.x.abs().cmp(&delta.y.abs()) {
        std::cmp::Ordering::Greater => (along_x, along_y),
        std::cmp::Ordering::Less => (along_y, along_x),
        std::cmp::Ordering::Equal if rng.bool() => (along_x, along_y),
        std::cmp::Ordering::Equal => (along_y, along_x),
    };
    [major, minor].into_iter().find(|step| passable(*step))
}

// ── Fly wizard ──────────────────────────────────────────────────────────

/// Wake sleeping fly wizards once the player comes close.
pub fn fly_wizard_system(ctx: &mut SimContext) -> SimResult<()> {
    let player = ctx.player()?;
    let Some(player_pos) = ctx.world.try_get::<Position>(player).map(|p| p.as_ivec2()) else {
        return Ok(());
    };
    for &entity in ctx.world.query_ids::<(AiFlyWizard, Position)>().iter() {
        let state = ctx.world.get::<AiFlyWizard>(entity)?.state;
        let pos = ctx.world.get::<Position>(entity)?.as_ivec2();
        if state == WizardState::Asleep && distance(pos, player_pos) <= ctx.config.wizard_wake_range {
            change_wizard_state(ctx, entity, WizardState::Normal)?;
        }
    }
    Ok(())
}

/// Switch a fly wizard to `state`.
///
/// Leaving any awake state teleports the wizard. Entering `Normal` summons
/// flies around it; `Angry` doubles its speed. Dead wizards keep their state.
pub fn change_wizard_state(ctx: &mut SimContext, wizard: Entity, state: WizardState) -> SimResult<()> {
    if ctx.world.has::<Dead>(wizard) {
        return Ok(());
    }
    let previous = ctx.world.get::<AiFlyWizard>(wizard)?.state;
    if previous != WizardState::Asleep && ctx.world.has::<Position>(wizard) {
        let range = ctx.config.wizard_teleport_range;
        effects::teleport(ctx, wizard, range)?;
    }

    ctx.world.get_mut::<AiFlyWizard>(wizard)?.state = state;
    if let Some(render) = ctx.world.try_get_mut::<Render>(wizard) {
        render.image = wizard_image(state).to_owned();
    }
    debug!("{wizard:?} wizard {previous:?} -> {state:?}");

    match state {
        WizardState::Asleep => {}
        WizardState::Normal => {
            ctx.world.add_component(wizard, Initiative::new(2))?;
            summon_flies(ctx, wizard)?;
        }
        WizardState::Angry => {
            ctx.world.add_component(wizard, Initiative::new(1))?;
        }
    }
    Ok(())
}

fn summon_flies(ctx: &mut SimContext, wizard: Entity) -> SimResult<()> {
    let Some(pos) = ctx.world.try_get::<Position>(wizard).map(|p| p.as_ivec2()) else {
        return Ok(());
    };
    for _ in 0..ctx.config.wizard_flies {
        let Some(spawn) = ctx.grid.random_free_adjacent(pos, &mut ctx.rng) else {
            break;
        };
        let fly = ctx.spawn_template(Template::Fly, spawn);
        if let Some(boss) = ctx.world.try_get_mut::<Boss>(wizard) {
            boss.minions.push(fly);
        }
        ctx.sync_grid()?;
    }
    Ok(())
}

// ── Dodge ───────────────────────────────────────────────────────────────

/// An [`AiDodge`] entity about to act steps out of the way of anything
/// bumping into its tile, paying a full turn for it.
pub fn dodge_system(ctx: &mut SimContext) -> SimResult<()> {
    let bumpers = ctx.world.query_ids::<(Position, Bump, MyTurn)>();
    for &dodger in ctx.world.query_ids::<(AiDodge, Position, Initiative)>().iter() {
        if ctx.world.get::<Initiative>(dodger)?.countdown > 1 {
            continue;
        }
        for &actor in bumpers.iter() {
            if actor == dodger {
                continue;
            }
            let direction = ctx.world.get::<Bump>(actor)?.direction;
            let aimed_at = ctx.world.get::<Position>(actor)?.as_ivec2() + direction;
            let pos = ctx.world.get::<Position>(dodger)?.as_ivec2();
            if aimed_at != pos || !ctx.grid.can_move_in_direction(&ctx.world, dodger, direction)? {
                continue;
            }
            ctx.grid.move_entity(&mut ctx.world, dodger, pos + direction)?;
            let initiative = ctx.world.get_mut::<Initiative>(dodger)?;
            initiative.countdown += initiative.speed;
            debug!("{dodger:?} dodged {actor:?}");
        }
    }
    Ok(())
}
