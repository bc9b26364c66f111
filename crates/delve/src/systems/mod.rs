//! # Systems — The Turn Pipeline
//!
//! Every system is a plain `fn(&mut SimContext) -> SimResult<()>`. The
//! [`default_pipeline`] registers them with fixed priorities; a step runs
//! them from highest to lowest:
//!
//! ```text
//! 200 stats        190 grid sync    180 initiative   170 player input
//! 160 fly wizard   150 chase ai     140 freezing     130 burning
//! 120 dodge        110 bump         100 explosion     90 damage
//!  80 regen         70 pickup        60 idle          50 split
//!  40 stairs        30 animation     20 dead          10 delete
//! ```
//!
//! ## Design
//!
//! The order is the contract. Intents raised early in a step (bumps from
//! input and AI) are resolved later in the same step (bump → damage →
//! dead → delete), so a kill is fully processed before the step ends and
//! nothing observes a half-dead entity on the next one.
//!
//! Systems iterate id snapshots from [`World::query_ids`], so they are free
//! to add, remove and delete while they walk them.
//!
//! [`World::query_ids`]: crate::ecs::World::query_ids

pub mod ai;
pub mod animation;
pub mod combat;
pub mod control;
pub mod explosion;
pub mod items;
pub mod lifecycle;
pub mod stairs;
pub mod stats;
pub mod status;
pub mod turn;

use crate::ecs::Schedule;
use crate::sim::SimContext;

pub mod priority {
    pub const STATS: i32 = 200;
    pub const GRID_SYNC: i32 = 190;
    pub const INITIATIVE: i32 = 180;
    pub const PLAYER_INPUT: i32 = 170;
    pub const FLY_WIZARD: i32 = 160;
    pub const CHASE_AI: i32 = 150;
    pub const FREEZING: i32 = 140;
    pub const BURNING: i32 = 130;
    pub const DODGE: i32 = 120;
    pub const BUMP: i32 = 110;
    pub const EXPLOSION: i32 = 100;
    pub const DAMAGE: i32 = 90;
    pub const REGEN: i32 = 80;
    pub const PICKUP: i32 = 70;
    pub const IDLE: i32 = 60;
    pub const SPLIT: i32 = 50;
    pub const STAIRS: i32 = 40;
    pub const ANIMATION: i32 = 30;
    pub const DEAD: i32 = 20;
    pub const DELETE: i32 = 10;
}

/// The full turn pipeline.
pub fn default_pipeline() -> Schedule<SimContext> {
    let mut schedule = Schedule::new();
    schedule.add_named("stats", priority::STATS, stats::game_stats_system);
    schedule.add_named("grid_sync", priority::GRID_SYNC, turn::grid_sync_system);
    schedule.add_named("initiative", priority::INITIATIVE, turn::initiative_system);
    schedule.add_named("player_input", priority::PLAYER_INPUT, control::player_input_system);
    schedule.add_named("fly_wizard", priority::FLY_WIZARD, ai::fly_wizard_system);
    schedule.add_named("chase_ai", priority::CHASE_AI, ai::chase_ai_system);
    schedule.add_named("freezing", priority::FREEZING, status::freezing_system);
    schedule.add_named("burning", priority::BURNING, status::burning_system);
    schedule.add_named("dodge", priority::DODGE, ai::dodge_system);
    schedule.add_named("bump", priority::BUMP, combat::bump_system);
    schedule.add_named("explosion", priority::EXPLOSION, explosion::explosion_system);
    schedule.add_named("damage", priority::DAMAGE, combat::damage_system);
    schedule.add_named("regen", priority::REGEN, status::regen_system);
    schedule.add_named("pickup", priority::PICKUP, items::pickup_system);
    schedule.add_named("idle", priority::IDLE, lifecycle::idle_system);
    schedule.add_named("split", priority::SPLIT, lifecycle::split_system);
    schedule.add_named("stairs", priority::STAIRS, stairs::stairs_system);
    schedule.add_named("animation", priority::ANIMATION, animation::animation_system);
    schedule.add_named("dead", priority::DEAD, lifecycle::dead_system);
    schedule.add_named("delete", priority::DELETE, lifecycle::delete_system);
    schedule
}
