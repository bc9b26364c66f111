//! Read-only projection of an entity for renderers.
//!
//! Renderers never inspect components themselves. They ask for a
//! [`DrawData`] per entity and draw that.

use crate::components::{
    Burning, Explosive, FireElement, FreeTurn, Frozen, IceElement, Render,
};
use crate::ecs::{Entity, World};

/// An overlay icon, optionally with a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    pub name: &'static str,
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawData<'w> {
    pub image: &'w str,
    /// Additive RGB tint. `None` when untinted.
    pub tint: Option<[u8; 3]>,
    /// Lit this frame (blinking entities alternate with `blink_phase`).
    pub blinking: bool,
    pub icons: Vec<Icon>,
    pub frozen: bool,
}

/// Draw data for `entity`, or `None` if it has nothing to show.
pub fn draw_data(world: &World, entity: Entity, blink_phase: bool) -> Option<DrawData<'_>> {
    let render = world.try_get::<Render>(entity)?;
    let fire = world.has::<FireElement>(entity);
    let ice = world.has::<IceElement>(entity);

    let mut tint = [0u8; 3];
    if fire || world.has::<Burning>(entity) {
        tint[0] += 100;
    }
    if ice {
        tint[1] += 50;
        tint[2] += 100;
    }

    let mut icons = Vec::new();
    if fire {
        icons.push(Icon {
            name: "element-fire",
            count: None,
        });
    }
    if ice {
        icons.push(Icon {
            name: "element-ice",
            count: None,
        });
    }
    if let Some(explosive) = world.try_get::<Explosive>(entity).filter(|x| x.primed) {
        icons.push(Icon {
            name: "explosive",
            count: Some(explosive.fuse),
        });
    }
    if let Some(free) = world.try_get::<FreeTurn>(entity) {
        icons.push(Icon {
            name: "free-turn",
            count: Some(free.turns_left),
        });
    }

    Some(DrawData {
        image: &render.image,
        tint: (tint != [0; 3]).then_some(tint),
        blinking: render.blinking && blink_phase,
        icons,
        frozen: world.has::<Frozen>(entity),
    })
}
