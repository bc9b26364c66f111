//! Run statistics.

use crate::components::{Dead, GameStats};
use crate::ecs::Tag;
use crate::error::SimResult;
use crate::sim::SimContext;

/// Play time accrues while the player is alive.
pub fn game_stats_system(ctx: &mut SimContext) -> SimResult<()> {
    let Some(player) = ctx.world.tag(Tag::Player) else {
        return Ok(());
    };
    if ctx.world.has::<Dead>(player) {
        return Ok(());
    }
    let elapsed = u64::from(ctx.input.elapsed_ms);
    if let Some(stats) = ctx.world.try_get_mut::<GameStats>(player) {
        stats.time_ms += elapsed;
    }
    Ok(())
}
