//! # Delve — Turn-Based Roguelike Simulation Core
//!
//! A small ECS store plus the fixed pipeline of systems that resolves one
//! dungeon turn at a time: initiative, input and AI intents, bumps, combat,
//! explosions, status effects, pickups, level transitions and death.
//! Rendering, audio and menus are someone else's job; they read
//! [`draw::draw_data`] and drain [`feedback`] events.
//!
//! Start with `use delve::prelude::*`, create a [`Simulation`](sim::Simulation),
//! call [`new_game`](sim::Simulation::new_game), then
//! [`advance`](sim::Simulation::advance) once per player action.

pub mod components;
pub mod config;
pub mod draw;
pub mod ecs;
pub mod effects;
pub mod error;
pub mod feedback;
pub mod grid;
pub mod input;
pub mod inventory;
pub mod level;
pub mod math;
pub mod prelude;
pub mod sim;
pub mod systems;
pub mod templates;
