//! # Components — Every Kind of Data an Entity Can Hold
//!
//! Components are leaf data with no behaviour. Systems give them meaning.
//! They fall into a few families:
//!
//! - **Spatial**: [`Position`], [`Blocker`], [`Movement`].
//! - **Turn order**: [`Initiative`], [`MyTurn`], [`FreeTurn`].
//! - **Intents and messages** (live for one step): [`Bump`], [`Damage`],
//!   [`Explode`].
//! - **Combat and status**: [`Health`], [`Attack`], [`Regen`], [`Burning`],
//!   [`Frozen`], the elemental tags.
//! - **Items**: [`Item`], [`Inventory`], [`Stored`], [`Explosive`],
//!   [`UseEffect`].
//! - **Lifecycle**: [`Dead`] (soft, "react to my death") and
//!   [`PendingDelete`] (hard, "remove me this step").
//! - **Presentation**: [`Render`], [`Animation`]. Read by renderers only.
//!
//! The [`declare_components!`](crate::ecs::component::declare_components)
//! call at the bottom is the single list of kinds the store knows about.

use glam::IVec2;

use crate::config::SimConfig;
use crate::ecs::Entity;
use crate::ecs::component::declare_components;
use crate::effects::Effect;
use crate::templates::Template;

// ── Spatial ─────────────────────────────────────────────────────────────

/// Tile coordinates of an entity on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn as_ivec2(self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

impl From<IVec2> for Position {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Occupies its cell exclusively. At most one blocker per cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blocker;

/// The entity can walk. `diagonal` lets the chase AI step diagonally.
#[derive(Debug, Clone, Copy, Default)]
pub struct Movement {
    pub diagonal: bool,
}

// ── Turn order ──────────────────────────────────────────────────────────

/// Turn scheduling state.
///
/// `countdown` is the number of ticks until the entity acts; `speed` is what
/// gets added back when it is granted a turn. Lower speed acts more often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initiative {
    pub speed: i32,
    pub countdown: i32,
}

impl Initiative {
    /// First turn after a full `speed` ticks.
    pub fn new(speed: i32) -> Self {
        Self {
            speed,
            countdown: speed,
        }
    }

    /// First turn after a random 1..=speed ticks, so a room of monsters with
    /// equal speed does not act in lockstep.
    pub fn staggered(speed: i32, rng: &mut fastrand::Rng) -> Self {
        Self {
            speed,
            countdown: rng.i32(1..=speed.max(1)),
        }
    }
}

/// The entity may act this step.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyTurn;

/// Bonus turns: while any entity holds one, only free-turn holders advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeTurn {
    pub turns_left: u32,
}

// ── Control ─────────────────────────────────────────────────────────────

/// Driven by the step input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerInput;

/// Chase AI. `target` is refreshed every time the entity acts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ai {
    pub target: Option<Entity>,
}

/// Steps aside when something bumps into its cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct AiDodge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardState {
    #[default]
    Asleep,
    Normal,
    Angry,
}

/// Fly-wizard boss behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct AiFlyWizard {
    pub state: WizardState,
}

// ── Intents and messages ────────────────────────────────────────────────

/// One-step move/attack intent in `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bump {
    pub direction: IVec2,
}

impl Bump {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self {
            direction: IVec2::new(dx, dy),
        }
    }
}

/// Damage message. Lives on its own entity, deleted once applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Damage {
    pub target: Entity,
    pub amount: i32,
    pub burn: bool,
    pub freeze: bool,
}

impl Damage {
    pub fn new(target: Entity, amount: i32) -> Self {
        Self {
            target,
            amount,
            burn: false,
            freeze: false,
        }
    }
}

/// Detonate this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explode {
    pub radius: i32,
    pub damage: i32,
}

impl Explode {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            radius: config.explosion_radius,
            damage: config.explosion_damage,
        }
    }
}

// ── Combat and status ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attack {
    pub damage: i32,
}

/// Heals `amount` per tick up to max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regen {
    pub amount: i32,
}

/// Destroyed by explosions even without health.
#[derive(Debug, Clone, Copy, Default)]
pub struct Destructible;

/// Immune to burning; attacks set targets on fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct FireElement;

/// Immune to freezing; attacks freeze targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct IceElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burning {
    pub turns_left: u32,
}

/// Next action is spent breaking free.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frozen;

// ── Items ───────────────────────────────────────────────────────────────

/// Can be picked up. Consumables are destroyed when used or when they hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub consumable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub capacity: usize,
    pub contents: Vec<Entity>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            contents: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.contents.len() >= self.capacity
    }
}

/// Carried by `carrier`; the entity has no position of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stored {
    pub carrier: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explosive {
    pub fuse: u32,
    pub primed: bool,
}

impl Explosive {
    pub fn new(fuse: u32) -> Self {
        Self {
            fuse,
            primed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseEffect {
    pub effects: Vec<Effect>,
}

/// Name and flavour text shown by item menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Describable {
    pub name: String,
    pub description: String,
}

// ── Lifecycle ───────────────────────────────────────────────────────────

/// Soft death marker. Death reactions run, then the entity is deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dead;

/// Hard marker: queued for deletion by the delete system this step.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingDelete;

/// Spawns `offspring` around itself when it dies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub offspring: Vec<Template>,
}

/// Explodes instead of attacking twice; drops its bomb on death.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bomber;

/// Minions are released (deleted) when the boss dies; stairs appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boss {
    pub minions: Vec<Entity>,
}

// ── Player and progression ──────────────────────────────────────────────

/// Potion amounts are halved.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeakPotions;

/// Gains a free turn after every kill.
#[derive(Debug, Clone, Copy, Default)]
pub struct KillRush;

/// Current dungeon depth, carried by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    pub kills: u32,
    pub time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StairsDirection {
    #[default]
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stairs {
    pub direction: StairsDirection,
}

// ── Presentation ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    pub image: String,
    pub blinking: bool,
}

impl Render {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            blinking: false,
        }
    }
}

/// A looping sequence of image keys.
pub type Clip = &'static [&'static str];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipKind {
    Idle,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    pub idle: Clip,
    pub ready: Clip,
    pub current: Option<ClipKind>,
    pub frame: usize,
}

impl Animation {
    pub fn new(idle: Clip, ready: Clip) -> Self {
        Self {
            idle,
            ready,
            current: None,
            frame: 0,
        }
    }

    pub fn clip(&self, kind: ClipKind) -> Clip {
        match kind {
            ClipKind::Idle => self.idle,
            ClipKind::Ready => self.ready,
        }
    }
}

declare_components! {
    Position,
    Blocker,
    Movement,
    Initiative,
    MyTurn,
    FreeTurn,
    PlayerInput,
    Ai,
    AiDodge,
    AiFlyWizard,
    Bump,
    Damage,
    Explode,
    Health,
    Attack,
    Regen,
    Destructible,
    FireElement,
    IceElement,
    Burning,
    Frozen,
    Item,
    Inventory,
    Stored,
    Explosive,
    UseEffect,
    Describable,
    Dead,
    PendingDelete,
    Split,
    Bomber,
    Boss,
    WeakPotions,
    KillRush,
    Level,
    GameStats,
    Stairs,
    Render,
    Animation,
}
