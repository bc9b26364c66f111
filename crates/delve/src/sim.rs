//! # Simulation — Step Context and Driver
//!
//! Systems never reach for globals. Everything a system may touch lives on
//! [`SimContext`], which the [`Schedule`] passes to each of them in turn:
//!
//! ```text
//! SimContext
//!   world     component store (player = Tag::Player)
//!   grid      spatial index, synced at the start of each step
//!   clock     tick flag + step counter
//!   rng       seeded fastrand::Rng
//!   config    SimConfig
//!   feedback  camera/audio events for the driver
//!   levels    Box<dyn LevelSource>
//!   input     StepInput of the current step
//! ```
//!
//! [`Simulation`] owns a context and the pipeline. One
//! [`run_step`](Simulation::run_step) is one pass over every system followed
//! by the deferred-deletion sweep. [`advance`](Simulation::advance) is what a
//! game loop calls with the player's input: one step, then empty polling
//! steps until the player may act again.

use glam::IVec2;
use log::{debug, info};

use crate::components::{Dead, Inventory, Level as DepthLevel, MyTurn, Position, Stored};
use crate::config::SimConfig;
use crate::ecs::{Entity, Schedule, Tag, World};
use crate::error::{SimError, SimResult};
use crate::feedback::{Feedback, FeedbackEvent};
use crate::grid::Grid;
use crate::input::StepInput;
use crate::level::LevelSource;
use crate::systems;
use crate::templates::Template;

/// Turn bookkeeping shared by the systems of a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnClock {
    /// True when no entity held the turn marker at the start of this step,
    /// meaning a full turn has elapsed and per-turn effects should advance.
    pub tick: bool,
    /// Steps run so far.
    pub steps: u64,
}

/// Everything a system can read or write during a step.
pub struct SimContext {
    pub world: World,
    pub grid: Grid,
    pub clock: TurnClock,
    pub rng: fastrand::Rng,
    pub config: SimConfig,
    pub feedback: Feedback,
    pub levels: Box<dyn LevelSource>,
    pub input: StepInput,
    /// Milliseconds not yet turned into animation frames.
    pub animation_backlog_ms: u32,
}

impl SimContext {
    pub fn new(config: SimConfig, levels: Box<dyn LevelSource>) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            world: World::new(),
            grid: Grid::new(config.grid_width, config.grid_height),
            clock: TurnClock::default(),
            rng,
            config,
            feedback: Feedback::default(),
            levels,
            input: StepInput::IDLE,
            animation_backlog_ms: 0,
        }
    }

    /// The player entity.
    pub fn player(&self) -> SimResult<Entity> {
        self.world
            .tag(Tag::Player)
            .ok_or_else(|| SimError::invariant("no entity is tagged as the player"))
    }

    /// True if `entity` is the player.
    pub fn is_player(&self, entity: Entity) -> bool {
        self.world.tag(Tag::Player) == Some(entity)
    }

    pub fn player_pos(&self) -> SimResult<IVec2> {
        let player = self.player()?;
        Ok(self.world.get::<Position>(player)?.as_ivec2())
    }

    /// Re-sync the grid with the world. Systems that spawn positioned
    /// entities mid-step call this so later spawns see them.
    pub fn sync_grid(&mut self) -> SimResult<()> {
        self.grid.sync(&self.world)
    }

    /// Delete `entity` together with everything it carries, unlinking it
    /// from its carrier's inventory and from the grid first.
    ///
    /// Deferred deletion skips entities already queued. Immediate deletion
    /// leaves no trace in the grid even before the next sync.
    pub fn delete_entity(&mut self, entity: Entity, immediate: bool) -> SimResult<()> {
        if !immediate && self.world.is_pending_deletion(entity) {
            return Ok(());
        }
        if let Some(inventory) = self.world.try_get::<Inventory>(entity) {
            for item in inventory.contents.clone() {
                if self.world.contains(item) {
                    self.delete_entity(item, immediate)?;
                }
            }
        }
        if let Some(&Stored { carrier }) = self.world.try_get::<Stored>(entity) {
            if let Some(inventory) = self.world.try_get_mut::<Inventory>(carrier) {
                inventory.contents.retain(|e| *e != entity);
            }
        }
        self.grid.remove_tracking(entity);
        self.world.delete_entity(entity, immediate)
    }

    /// Instantiate a template at `pos`.
    pub fn spawn_template(&mut self, template: Template, pos: IVec2) -> Entity {
        let components = template.components(pos, &mut self.rng);
        self.world.create_entity(components)
    }

    /// Ask the level source for the player's current depth and populate the
    /// world with it. The player is moved to the level's start tile.
    pub fn load_level(&mut self) -> SimResult<()> {
        let player = self.player()?;
        let depth = self.world.get::<DepthLevel>(player)?.depth;
        let level = self.levels.generate(
            depth,
            self.config.grid_width,
            self.config.grid_height,
            &mut self.rng,
        );
        let count = level.entities.len();
        for components in level.entities {
            self.world.create_entity(components);
        }
        self.grid.remove_tracking(player);
        self.world
            .add_component(player, Position::from(level.player_start))?;

        if depth == 1 {
            for _ in 0..self.config.starting_bombs {
                self.spawn_template(Template::Bomb, level.player_start);
            }
        }
        info!(
            "entered depth {depth}: {count} entities, player at {}",
            level.player_start
        );
        Ok(())
    }
}

/// A context plus the ordered pipeline that advances it.
pub struct Simulation {
    ctx: SimContext,
    schedule: Schedule<SimContext>,
}

impl Simulation {
    /// A simulation running the standard pipeline.
    pub fn new(config: SimConfig, levels: Box<dyn LevelSource>) -> Self {
        Self::with_schedule(SimContext::new(config, levels), systems::default_pipeline())
    }

    pub fn with_schedule(ctx: SimContext, schedule: Schedule<SimContext>) -> Self {
        Self { ctx, schedule }
    }

    /// Create the player from `character`, tag it, and load depth 1.
    pub fn new_game(&mut self, character: Template) -> SimResult<Entity> {
        let player = self.ctx.spawn_template(character, IVec2::ZERO);
        self.ctx.world.set_tag(Tag::Player, player)?;
        self.ctx.load_level()?;
        info!("new game as {}", character.name());
        Ok(player)
    }

    /// Run every system once, then sweep deferred deletions.
    pub fn run_step(&mut self, input: StepInput) -> SimResult<()> {
        self.ctx.input = input;
        self.ctx.clock.steps += 1;
        self.schedule.run(&mut self.ctx)?;
        let deleted = self.ctx.world.flush_deletions()?;
        if deleted > 0 {
            debug!("step {}: swept {deleted} entities", self.ctx.clock.steps);
        }
        #[cfg(feature = "diagnostics")]
        {
            let (created, removed) = self.ctx.world.take_step_counts();
            log::trace!(
                "step {}: +{created} -{removed} entities, {} systems timed",
                self.ctx.clock.steps,
                self.schedule.timings().len()
            );
        }
        #[cfg(debug_assertions)]
        {
            self.ctx.world.check_consistency()?;
            self.ctx.grid.check_claims(&self.ctx.world)?;
        }
        Ok(())
    }

    /// Apply `input`, then poll empty steps until the player holds the turn
    /// marker again or is dead. Returns the number of polling steps.
    pub fn advance(&mut self, input: StepInput) -> SimResult<u32> {
        self.run_step(input)?;
        let mut polls = 0;
        while !self.player_can_act()? && !self.is_game_over() {
            if polls >= self.ctx.config.max_idle_steps {
                return Err(SimError::invariant(format!(
                    "player got no turn within {polls} steps"
                )));
            }
            self.run_step(StepInput::IDLE)?;
            polls += 1;
        }
        if self.is_game_over() {
            info!("game over after {} steps", self.ctx.clock.steps);
        }
        Ok(polls)
    }

    fn player_can_act(&self) -> SimResult<bool> {
        let player = self.ctx.player()?;
        Ok(self.ctx.world.has::<MyTurn>(player))
    }

    /// True once the player is dead (or gone).
    pub fn is_game_over(&self) -> bool {
        match self.ctx.world.tag(Tag::Player) {
            Some(player) => self.ctx.world.has::<Dead>(player),
            None => true,
        }
    }

    /// Drain camera/audio events raised since the last call.
    pub fn take_feedback(&mut self) -> Vec<FeedbackEvent> {
        self.ctx.feedback.drain()
    }

    pub fn world(&self) -> &World {
        &self.ctx.world
    }

    pub fn grid(&self) -> &Grid {
        &self.ctx.grid
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    pub fn schedule(&self) -> &Schedule<SimContext> {
        &self.schedule
    }
}
