//! Level sources.
//!
//! The simulation never lays out a dungeon itself. When the player starts a
//! game or takes the stairs it asks a [`LevelSource`] for the entities of the
//! next depth and where the player should stand. Procedural dungeon
//! generation lives outside this crate; [`ArenaLevels`] is a small built-in
//! source for demos and tests.

use std::collections::BTreeSet;

use glam::IVec2;
use log::debug;

use crate::components::{FireElement, IceElement};
use crate::ecs::AnyComponent;
use crate::math::TileRect;
use crate::templates::Template;

/// Depth at which [`ArenaLevels`] puts the fly-wizard arena.
pub const BOSS_DEPTH: u32 = 12;

/// The contents of one depth.
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub player_start: IVec2,
    /// Component lists, one per entity.
    pub entities: Vec<Vec<AnyComponent>>,
}

impl Level {
    pub fn new(player_start: IVec2) -> Self {
        Self {
            player_start,
            entities: Vec::new(),
        }
    }

    pub fn push(&mut self, template: Template, pos: IVec2, rng: &mut fastrand::Rng) {
        self.entities.push(template.components(pos, rng));
    }
}

/// Produces the level for a depth.
pub trait LevelSource {
    fn generate(&mut self, depth: u32, width: i32, height: i32, rng: &mut fastrand::Rng) -> Level;
}

/// Creatures that can appear at `depth`, weighted by repetition.
pub fn spawn_pool(depth: u32) -> Vec<Template> {
    let mut pool = vec![Template::Snake; 10];
    if (1..=6).contains(&depth) {
        pool.extend([Template::Ogre; 4]);
    }
    if (1..=5).contains(&depth) {
        pool.extend([Template::SlimeMedium; 2]);
    } else {
        pool.extend([Template::SlimeLarge; 2]);
    }
    if depth >= 7 {
        pool.extend([Template::BombGoblin; 2]);
        pool.extend([Template::Caterkiller; 3]);
    }
    if depth >= 9 {
        pool.push(Template::Golem);
    }
    pool
}

const LOOT: [Template; 4] = [
    Template::HealthPotion,
    Template::SpeedPotion,
    Template::TeleportPotion,
    Template::Bomb,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Normal,
    Ice,
    Fire,
}

/// A walled rectangular arena per depth: player on the left, stairs on the
/// right, monsters from [`spawn_pool`] and loot scattered in between.
/// Depth [`BOSS_DEPTH`] is the fly-wizard arena instead.
#[derive(Debug, Clone)]
pub struct ArenaLevels {
    pub monsters: usize,
    pub loot: usize,
    pub boss: bool,
}

impl Default for ArenaLevels {
    fn default() -> Self {
        Self {
            monsters: 8,
            loot: 3,
            boss: true,
        }
    }
}

impl ArenaLevels {
    /// Walls and stairs only.
    pub fn empty() -> Self {
        Self {
            monsters: 0,
            loot: 0,
            boss: false,
        }
    }

    fn walls(level: &mut Level, bounds: TileRect, rng: &mut fastrand::Rng, element: Element) {
        for pos in bounds.iter().filter(|p| bounds.on_border(*p)) {
            let mut wall = Template::Wall.components(pos, rng);
            if rng.u8(0..3) == 0 {
                match element {
                    Element::Ice => wall.push(IceElement.into()),
                    Element::Fire => wall.push(FireElement.into()),
                    Element::Normal => {}
                }
            }
            level.entities.push(wall);
        }
    }

    fn boss_arena(width: i32, height: i32, rng: &mut fastrand::Rng) -> Level {
        let bounds = TileRect::from_origin_size(IVec2::ZERO, IVec2::new(width, height));
        let mid = height / 2;
        let mut level = Level::new(IVec2::new(2, mid));
        Self::walls(&mut level, bounds, rng, Element::Normal);
        level.push(Template::Fly, IVec2::new(width / 4, mid), rng);
        level.push(Template::FlyWizard, IVec2::new(width - 4, mid), rng);
        level
    }
}

impl LevelSource for ArenaLevels {
    fn generate(&mut self, depth: u32, width: i32, height: i32, rng: &mut fastrand::Rng) -> Level {
        if self.boss && depth == BOSS_DEPTH {
            debug!("generating boss arena");
            return Self::boss_arena(width, height, rng);
        }

        let element = if depth > 1 && rng.bool() {
            if rng.bool() { Element::Ice } else { Element::Fire }
        } else {
            Element::Normal
        };

        let bounds = TileRect::from_origin_size(IVec2::ZERO, IVec2::new(width, height));
        let inner = TileRect {
            min: IVec2::ONE,
            max: IVec2::new(width - 2, height - 2),
        };
        let mid = height / 2;
        let start = IVec2::new(inner.min.x, mid);
        let stairs = IVec2::new(inner.max.x, mid);

        let mut level = Level::new(start);
        Self::walls(&mut level, bounds, rng, element);
        level.push(Template::Stairs, stairs, rng);

        let mut taken: BTreeSet<(i32, i32)> = [start, stairs].iter().map(|p| (p.x, p.y)).collect();
        let mut random_tile = |rng: &mut fastrand::Rng| -> Option<IVec2> {
            let area = ((inner.max - inner.min + IVec2::ONE).max(IVec2::ZERO)).element_product();
            if taken.len() as i32 >= area {
                return None;
            }
            loop {
                let p = IVec2::new(
                    rng.i32(inner.min.x..=inner.max.x),
                    rng.i32(inner.min.y..=inner.max.y),
                );
                if taken.insert((p.x, p.y)) {
                    return Some(p);
                }
            }
        };

        let pool = spawn_pool(depth);
        for _ in 0..self.monsters {
            let Some(pos) = random_tile(rng) else { break };
            let mut monster = pool[rng.usize(..pool.len())].components(pos, rng);
            if rng.bool() {
                match element {
                    Element::Ice => monster.push(IceElement.into()),
                    Element::Fire => monster.push(FireElement.into()),
                    Element::Normal => {}
                }
            }
            level.entities.push(monster);
        }
        for _ in 0..self.loot {
            let Some(pos) = random_tile(rng) else { break };
            level.push(LOOT[rng.usize(..LOOT.len())], pos, rng);
        }
        level
    }
}
