//! Player input.

use crate::components::{Bump, MyTurn, PlayerInput};
use crate::error::SimResult;
use crate::sim::SimContext;

/// Turn the step's direction into a [`Bump`] for every input-driven entity
/// that holds the turn. No direction means the player is still deciding.
pub fn player_input_system(ctx: &mut SimContext) -> SimResult<()> {
    let Some(direction) = ctx.input.direction else {
        return Ok(());
    };
    let offset = direction.offset();
    for &entity in ctx.world.query_ids::<(PlayerInput, MyTurn)>().iter() {
        ctx.world.add_component(entity, Bump { direction: offset })?;
    }
    Ok(())
}
