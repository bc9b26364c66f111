//! Convenience re-exports — `use delve::prelude::*` for the common items.

// Core
pub use crate::config::{ConfigError, SimConfig};
pub use crate::ecs::{AnyComponent, Bundle, Component, ComponentKind, Entity, Schedule, Tag, World};
pub use crate::error::{SimError, SimResult};
pub use crate::grid::Grid;
pub use crate::input::{Direction, StepInput};
pub use crate::math::{IVec2, TileRect};
pub use crate::sim::{SimContext, Simulation, TurnClock};

// Game data
pub use crate::components::*;
pub use crate::effects::Effect;
pub use crate::level::{ArenaLevels, Level as LevelData, LevelSource};
pub use crate::templates::Template;

// Presentation
pub use crate::draw::{DrawData, Icon, draw_data};
pub use crate::feedback::FeedbackEvent;
pub use crate::inventory::{Throw, drop_item, prime_item, throw_item, use_item};
