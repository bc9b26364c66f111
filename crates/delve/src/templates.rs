//! # Templates — Named Component Recipes
//!
//! A [`Template`] expands to the component list of one entity at a given
//! tile. Level sources and systems (splitting slimes, summoning flies,
//! dropping bombs) both spawn through here, so every creature is defined in
//! exactly one place.
//!
//! ## Design
//!
//! Templates are a closed enum rather than boxed closures: [`Split`] stores
//! its offspring as plain `Template` values, which keeps components `Clone`
//! and comparable in tests.
//!
//! Randomness (staggered first turns, wall tile variants) comes from the
//! caller's `fastrand::Rng`, so a seeded simulation spawns identically.
//!
//! [`Split`]: crate::components::Split

use glam::IVec2;

use crate::components::*;
use crate::ecs::AnyComponent;
use crate::effects::Effect;

// ── Animation clips ─────────────────────────────────────────────────────

pub const OGRE_IDLE: Clip = &[
    "ogre-i", "ogre-i", "ogre-i", "ogre-i2", "ogre-i3", "ogre-i3", "ogre-i3", "ogre-i4",
];
pub const OGRE_READY: Clip = &["ogre-r", "ogre-r", "ogre-i", "ogre-i"];
pub const SNAKE_IDLE: Clip = &["snake-i", "snake-i", "snake-i2", "snake-i2"];
pub const SNAKE_READY: Clip = &["snake-r", "snake-r", "snake-r2", "snake-r2"];
pub const GOLEM_IDLE: Clip = &[
    "golem-stone-i",
    "golem-stone-i",
    "golem-stone-i",
    "golem-stone-r",
    "golem-stone-r",
    "golem-stone-r",
];
pub const GOLEM_READY: Clip = &["golem-stone-i", "golem-stone-i", "golem-stone-r", "golem-stone-r"];
pub const SLIME_LARGE_IDLE: Clip = &["slime-l-i"];
pub const SLIME_LARGE_READY: Clip = &["slime-l-r", "slime-l-r", "slime-l-i", "slime-l-i"];
pub const CATERKILLER_IDLE: Clip = &["caterkiller-i", "caterkiller-i", "caterkiller-i2"];
pub const CATERKILLER_READY: Clip = &["caterkiller-r", "caterkiller-r", "caterkiller-i"];

/// Image keys the fly wizard shows in each state.
pub fn wizard_image(state: WizardState) -> &'static str {
    match state {
        WizardState::Asleep => "fly-wizard-i",
        WizardState::Normal => "fly-wizard-r2",
        WizardState::Angry => "fly-wizard-r",
    }
}

// ── Templates ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    // Playable characters.
    Magnum,
    Mecha,
    Edward,
    // Creatures.
    Ogre,
    Snake,
    Golem,
    SlimeSmall,
    SlimeMedium,
    SlimeLarge,
    Caterkiller,
    Fly,
    FlyWizard,
    BombGoblin,
    // Terrain.
    Wall,
    Stairs,
    // Items.
    Bomb,
    HealthPotion,
    SpeedPotion,
    TeleportPotion,
}

impl Template {
    pub const CHARACTERS: [Template; 3] = [Template::Magnum, Template::Mecha, Template::Edward];

    pub fn name(self) -> &'static str {
        match self {
            Template::Magnum => "magnum",
            Template::Mecha => "mecha",
            Template::Edward => "edward",
            Template::Ogre => "ogre",
            Template::Snake => "snake",
            Template::Golem => "golem",
            Template::SlimeSmall => "slime_small",
            Template::SlimeMedium => "slime_medium",
            Template::SlimeLarge => "slime_large",
            Template::Caterkiller => "caterkiller",
            Template::Fly => "fly",
            Template::FlyWizard => "fly_wizard",
            Template::BombGoblin => "bomb_goblin",
            Template::Wall => "wall",
            Template::Stairs => "stairs",
            Template::Bomb => "bomb",
            Template::HealthPotion => "health_potion",
            Template::SpeedPotion => "speed_potion",
            Template::TeleportPotion => "teleport_potion",
        }
    }

    pub fn is_character(self) -> bool {
        Self::CHARACTERS.contains(&self)
    }

    /// The components of one instance at `pos`.
    pub fn components(self, pos: IVec2, rng: &mut fastrand::Rng) -> Vec<AnyComponent> {
        let pos = Position::from(pos);
        match self {
            Template::Magnum => player(pos, "magnum", 50),
            Template::Mecha => {
                let mut c = player(pos, "mecha", 80);
                c.push(WeakPotions.into());
                c
            }
            Template::Edward => {
                let mut c = player(pos, "edward", 30);
                c.push(KillRush.into());
                c
            }

            Template::Ogre => animated(
                creature(pos, rng, Stats::new(false, 3, 10, 10), OGRE_IDLE[0]),
                OGRE_IDLE,
                OGRE_READY,
            ),
            Template::Snake => animated(
                creature(pos, rng, Stats::new(true, 2, 5, 5), SNAKE_IDLE[0]),
                SNAKE_IDLE,
                SNAKE_READY,
            ),
            Template::Golem => animated(
                creature(pos, rng, Stats::new(false, 3, 30, 10), GOLEM_IDLE[0]),
                GOLEM_IDLE,
                GOLEM_READY,
            ),
            Template::SlimeSmall => creature(pos, rng, Stats::new(false, 3, 5, 5), "slime-s-i"),
            Template::SlimeMedium => {
                let mut c = creature(pos, rng, Stats::new(false, 3, 10, 5), "slime-m-i");
                c.push(
                    Split {
                        offspring: vec![Template::SlimeSmall, Template::SlimeSmall],
                    }
                    .into(),
                );
                c
            }
            Template::SlimeLarge => {
                let mut c = animated(
                    creature(pos, rng, Stats::new(false, 4, 20, 5), SLIME_LARGE_IDLE[0]),
                    SLIME_LARGE_IDLE,
                    SLIME_LARGE_READY,
                );
                c.push(
                    Split {
                        offspring: vec![Template::SlimeMedium, Template::SlimeMedium],
                    }
                    .into(),
                );
                c
            }
            Template::Caterkiller => {
                let mut c = animated(
                    creature(pos, rng, Stats::new(false, 2, 10, 5), CATERKILLER_IDLE[0]),
                    CATERKILLER_IDLE,
                    CATERKILLER_READY,
                );
                c.push(Regen { amount: 1 }.into());
                c
            }
            Template::Fly => creature(pos, rng, Stats::new(true, 2, 1, 2), "fly"),
            Template::FlyWizard => vec![
                Render::new(wizard_image(WizardState::Asleep)).into(),
                pos.into(),
                Blocker.into(),
                Health::new(30).into(),
                AiFlyWizard::default().into(),
                Boss::default().into(),
            ],
            Template::BombGoblin => {
                let mut c = creature(pos, rng, Stats::new(false, 2, 10, 5), "bomb-goblin");
                c.push(Bomber.into());
                c.push(Explosive::new(3).into());
                c
            }

            Template::Wall => vec![
                Render::new(if rng.bool() { "wall1" } else { "wall2" }).into(),
                pos.into(),
                Blocker.into(),
                Destructible.into(),
            ],
            Template::Stairs => vec![
                Render::new("stairs-down").into(),
                pos.into(),
                Stairs::default().into(),
            ],

            Template::Bomb => {
                let mut c = item(pos, "bomb", false);
                c.push(Explosive::new(3).into());
                c.push(describe("Bomb", "Explodes three turns after priming."));
                c
            }
            Template::HealthPotion => potion(
                pos,
                "red",
                Effect::Heal(20),
                describe("Health potion", "Restores 20 health."),
            ),
            Template::SpeedPotion => potion(
                pos,
                "green",
                Effect::SpeedBoost(5),
                describe("Speed potion", "Grants 5 free turns."),
            ),
            Template::TeleportPotion => potion(
                pos,
                "blue",
                Effect::Teleport(15),
                describe("Teleport potion", "Teleports the drinker up to 15 tiles."),
            ),
        }
    }
}

// ── Building blocks ─────────────────────────────────────────────────────

struct Stats {
    diagonal: bool,
    speed: i32,
    health: i32,
    attack: i32,
}

impl Stats {
    fn new(diagonal: bool, speed: i32, health: i32, attack: i32) -> Self {
        Self {
            diagonal,
            speed,
            health,
            attack,
        }
    }
}

fn creature(pos: Position, rng: &mut fastrand::Rng, stats: Stats, image: &str) -> Vec<AnyComponent> {
    vec![
        Render::new(image).into(),
        pos.into(),
        Ai::default().into(),
        Movement {
            diagonal: stats.diagonal,
        }
        .into(),
        Initiative::staggered(stats.speed, rng).into(),
        Blocker.into(),
        Health::new(stats.health).into(),
        Attack {
            damage: stats.attack,
        }
        .into(),
    ]
}

fn animated(mut components: Vec<AnyComponent>, idle: Clip, ready: Clip) -> Vec<AnyComponent> {
    components.push(Animation::new(idle, ready).into());
    components
}

fn player(pos: Position, image: &str, health: i32) -> Vec<AnyComponent> {
    vec![
        Render::new(image).into(),
        pos.into(),
        PlayerInput.into(),
        Movement::default().into(),
        Initiative::new(1).into(),
        Blocker.into(),
        Health::new(health).into(),
        Inventory::new(10).into(),
        Attack { damage: 5 }.into(),
        Level { depth: 1 }.into(),
        GameStats::default().into(),
        // Keeps monsters from acting before the player's first move.
        FreeTurn { turns_left: 1 }.into(),
    ]
}

fn item(pos: Position, image: &str, consumable: bool) -> Vec<AnyComponent> {
    vec![
        Render::new(image).into(),
        pos.into(),
        Item { consumable }.into(),
    ]
}

fn potion(pos: Position, color: &str, effect: Effect, info: AnyComponent) -> Vec<AnyComponent> {
    let mut c = item(pos, &format!("potion-{color}"), true);
    c.push(UseEffect { effects: vec![effect] }.into());
    c.push(info);
    c
}

fn describe(name: &str, description: &str) -> AnyComponent {
    Describable {
        name: name.to_owned(),
        description: description.to_owned(),
    }
    .into()
}
