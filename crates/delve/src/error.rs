//! # Errors — Fail-Fast Conditions of the Simulation Core
//!
//! Every error here is programmer-facing. None of them is expected in correct
//! system code, and game logic never catches one to carry on: an error aborts
//! the step and propagates to whoever drives the simulation.
//!
//! Expected absence ("does this item have a use effect?") is not an error.
//! Probe it with [`World::has`](crate::ecs::World::has) or
//! [`World::try_get`](crate::ecs::World::try_get) instead.

use glam::IVec2;
use thiserror::Error;

use crate::ecs::{ComponentKind, Entity};

/// Result alias used by every fallible operation of the core.
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The id has no live component bucket (never created, or already deleted).
    #[error("unknown entity {0}")]
    UnknownEntity(Entity),

    /// The entity exists but does not hold a component of this kind.
    #[error("entity {entity} has no `{kind}` component")]
    MissingComponent { entity: Entity, kind: ComponentKind },

    /// A move targeted a cell already held by a different blocker.
    #[error("entity {entity} cannot enter {pos}: tile is held by blocker {blocker}")]
    OccupiedTile {
        entity: Entity,
        pos: IVec2,
        blocker: Entity,
    },

    /// A position outside the grid bounds reached the spatial index.
    #[error("entity {entity} is off the grid at {pos}")]
    OffGrid { entity: Entity, pos: IVec2 },

    /// Internal consistency check failed.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl SimError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        SimError::InvariantViolation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity_and_kind() {
        let err = SimError::MissingComponent {
            entity: Entity::from_raw(7),
            kind: ComponentKind::Health,
        };
        assert_eq!(err.to_string(), "entity 7 has no `Health` component");

        let err = SimError::OccupiedTile {
            entity: Entity::from_raw(1),
            pos: IVec2::new(2, 3),
            blocker: Entity::from_raw(4),
        };
        assert!(err.to_string().contains("blocker 4"));
    }
}
