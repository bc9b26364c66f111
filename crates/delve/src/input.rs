//! Step input.
//!
//! The simulation consumes one [`StepInput`] per step: at most one direction
//! pressed by the player and the wall-clock time since the previous step.
//! Mapping keys or gamepads to a [`Direction`] is the caller's job.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// One of the four player movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Tile offset; `y` grows downwards.
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }
}

/// Inputs shared by every system for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInput {
    pub direction: Option<Direction>,
    pub elapsed_ms: u32,
}

impl StepInput {
    /// No input and no elapsed time: the polling step.
    pub const IDLE: Self = Self {
        direction: None,
        elapsed_ms: 0,
    };

    pub fn moving(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            elapsed_ms: 0,
        }
    }

    pub fn with_elapsed(mut self, elapsed_ms: u32) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }
}
