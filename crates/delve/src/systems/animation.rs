//! Sprite animation.
//!
//! Frames advance with wall-clock time, not turns. Leftover milliseconds
//! carry over to the next step so slow and fast frame rates animate at the
//! same speed.

use crate::components::{Animation, ClipKind, Initiative, Render};
use crate::ecs::Tag;
use crate::error::SimResult;
use crate::sim::SimContext;

pub fn animation_system(ctx: &mut SimContext) -> SimResult<()> {
    let frame_ms = ctx.config.animation_frame_ms.max(1);
    let total = ctx.animation_backlog_ms + ctx.input.elapsed_ms;
    let frames = (total / frame_ms) as usize;
    ctx.animation_backlog_ms = total % frame_ms;

    let player_countdown = ctx
        .world
        .tag(Tag::Player)
        .and_then(|p| ctx.world.try_get::<Initiative>(p))
        .map(|i| i.countdown);

    for &entity in ctx.world.query_ids::<(Animation, Render)>().iter() {
        // About to act before (or with) the player: show the wind-up.
        let ready = match (ctx.world.try_get::<Initiative>(entity), player_countdown) {
            (Some(init), Some(player)) => init.countdown <= player,
            _ => false,
        };
        let kind = if ready { ClipKind::Ready } else { ClipKind::Idle };

        let animation = ctx.world.get_mut::<Animation>(entity)?;
        let clip = animation.clip(kind);
        if clip.is_empty() {
            continue;
        }
        if animation.current == Some(kind) {
            animation.frame = (animation.frame + frames) % clip.len();
        } else {
            animation.current = Some(kind);
            animation.frame = 0;
        }
        let image = clip[animation.frame];

        let render = ctx.world.get_mut::<Render>(entity)?;
        if render.image != image {
            render.image = image.to_owned();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Position;
    use crate::input::StepInput;
    use crate::systems::testing::{ctx, player_at};
    use crate::templates::{OGRE_IDLE, OGRE_READY, Template};
    use glam::IVec2;

    #[test]
    fn frames_advance_with_elapsed_time() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        ctx.world.get_mut::<Initiative>(player).unwrap().countdown = 1;
        let ogre = ctx.spawn_template(Template::Ogre, IVec2::new(5, 5));
        ctx.world.get_mut::<Initiative>(ogre).unwrap().countdown = 3;

        animation_system(&mut ctx).unwrap();
        let anim = ctx.world.get::<Animation>(ogre).unwrap();
        assert_eq!(anim.current, Some(ClipKind::Idle));
        assert_eq!(anim.frame, 0);

        ctx.input = StepInput::IDLE.with_elapsed(600);
        animation_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Animation>(ogre).unwrap().frame, 2);
        assert_eq!(ctx.animation_backlog_ms, 100);

        ctx.input = StepInput::IDLE.with_elapsed(150);
        animation_system(&mut ctx).unwrap();
        assert_eq!(ctx.world.get::<Animation>(ogre).unwrap().frame, 3);
        assert_eq!(ctx.world.get::<Render>(ogre).unwrap().image, OGRE_IDLE[3]);
    }

    #[test]
    fn ready_clip_when_acting_before_the_player() {
        let mut ctx = ctx();
        let player = player_at(&mut ctx, 0, 0);
        ctx.world.get_mut::<Initiative>(player).unwrap().countdown = 2;
        let ogre = ctx.spawn_template(Template::Ogre, IVec2::new(5, 5));
        ctx.world.get_mut::<Initiative>(ogre).unwrap().countdown = 2;

        ctx.input = StepInput::IDLE.with_elapsed(1000);
        animation_system(&mut ctx).unwrap();
        let anim = ctx.world.get::<Animation>(ogre).unwrap();
        assert_eq!(anim.current, Some(ClipKind::Ready));
        // Switching clips restarts at the first frame.
        assert_eq!(anim.frame, 0);
        assert_eq!(ctx.world.get::<Render>(ogre).unwrap().image, OGRE_READY[0]);
        assert!(ctx.world.has::<Position>(ogre));
    }
}
