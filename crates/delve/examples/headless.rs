//! Headless run — a random walker explores the dungeon and prints the map.
//!
//! Pass a JSON config path to override the defaults:
//! `cargo run --example headless -- delve.json`

use delve::prelude::*;

const MAX_TURNS: u32 = 400;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig {
            grid_width: 24,
            grid_height: 12,
            ..SimConfig::default()
        }
        .with_seed(1),
    };
    let mut walker = fastrand::Rng::with_seed(config.seed.unwrap_or(0));

    let mut sim = Simulation::new(config, Box::new(ArenaLevels::default()));
    let player = sim.new_game(Template::Magnum)?;
    sim.advance(StepInput::IDLE)?;
    print_map(&sim, player);

    let mut turns = 0;
    while !sim.is_game_over() && turns < MAX_TURNS {
        let direction = Direction::ALL[walker.usize(..Direction::ALL.len())];
        let polls = sim.advance(StepInput::moving(direction).with_elapsed(120))?;
        turns += 1;

        for event in sim.take_feedback() {
            println!("turn {turns:>3}: {event:?}");
        }
        if polls > 0 && turns % 100 == 0 {
            print_map(&sim, player);
        }
    }

    print_map(&sim, player);
    let stats = sim.world().get::<GameStats>(player)?;
    let depth = sim.world().get::<Level>(player)?.depth;
    println!(
        "{} after {turns} turns: depth {depth}, {} kills, {} ms played",
        if sim.is_game_over() { "died" } else { "stopped" },
        stats.kills,
        stats.time_ms,
    );
    Ok(())
}

fn print_map(sim: &Simulation, player: Entity) {
    let config = &sim.context().config;
    let (w, h) = (config.grid_width as usize, config.grid_height as usize);
    let mut rows = vec![vec!['.'; w]; h];

    for (entity, pos) in sim.world().query::<Position>() {
        let Some(draw) = draw_data(sim.world(), entity, true) else {
            continue;
        };
        let glyph = if entity == player {
            '@'
        } else if draw.image.starts_with("wall") {
            '#'
        } else if draw.image.starts_with("stairs") {
            '>'
        } else if sim.world().has::<Item>(entity) {
            '!'
        } else {
            draw.image.chars().next().unwrap_or('?')
        };
        if let Some(cell) = rows
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
        {
            *cell = glyph;
        }
    }
    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
    println!();
}
