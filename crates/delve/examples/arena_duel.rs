//! Arena duel — pick up a bomb, lob it at an ogre, then finish the job.

use delve::prelude::*;

fn main() -> SimResult<()> {
    env_logger::init();

    let config = SimConfig {
        grid_width: 12,
        grid_height: 7,
        starting_bombs: 1,
        ..SimConfig::default()
    }
    .with_seed(12);
    let mut sim = Simulation::new(config, Box::new(ArenaLevels::empty()));
    let player = sim.new_game(Template::Magnum)?;
    let ogre = sim
        .context_mut()
        .spawn_template(Template::Ogre, IVec2::new(9, 3));
    sim.advance(StepInput::IDLE)?;

    // Step off the bomb and back onto it to pick it up.
    sim.advance(StepInput::moving(Direction::Right))?;
    sim.advance(StepInput::moving(Direction::Left))?;
    let Some(&bomb) = sim.world().get::<Inventory>(player)?.contents.first() else {
        println!("the bomb was not picked up");
        return Ok(());
    };

    prime_item(&mut sim.context_mut().world, bomb)?;
    let throw = throw_item(sim.context_mut(), player, bomb, Direction::Right)?;
    println!("bomb landed at {} (hit {:?})", throw.landed, throw.hit);

    let mut pace = [Direction::Up, Direction::Down].into_iter().cycle();
    for turn in 1..=40 {
        if sim.is_game_over() || !sim.world().contains(ogre) {
            break;
        }
        let me = sim.world().get::<Position>(player)?.as_ivec2();
        let them = sim.world().get::<Position>(ogre)?.as_ivec2();
        let direction = match them - me {
            IVec2 { x: 1, y: 0 } => Direction::Right,
            IVec2 { x: -1, y: 0 } => Direction::Left,
            IVec2 { x: 0, y: 1 } => Direction::Down,
            IVec2 { x: 0, y: -1 } => Direction::Up,
            _ => pace.next().unwrap_or(Direction::Up),
        };
        sim.advance(StepInput::moving(direction).with_elapsed(100))?;

        let ogre_hp = sim.world().try_get::<Health>(ogre).map(|h| h.current);
        let my_hp = sim.world().get::<Health>(player)?.current;
        println!("turn {turn:>2}: {direction:?}, player hp {my_hp}, ogre hp {ogre_hp:?}");
        for event in sim.take_feedback() {
            println!("         {event:?}");
        }
    }

    let kills = sim.world().get::<GameStats>(player)?.kills;
    if sim.is_game_over() {
        println!("the ogre won");
    } else {
        println!("duel over, {kills} kill(s)");
    }
    Ok(())
}
