/// One logical turn: player move, then one rockfall pass, atomically.
///
/// The presentation layer may render any number of interpolation
/// subframes between turns; none of them touch the grid. Input is
/// sampled once per turn, and an illegal direction is simply dropped.

use crate::domain::entity::TurnInput;
use crate::domain::physics;
use crate::domain::rules::{self, MoveEffect};
use super::event::GameEvent;
use super::world::{Phase, WorldState};

pub fn advance_turn(world: &mut WorldState, input: TurnInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.turn += 1;

    // ── Movement ──
    world.hero.velocity = input
        .movement
        .filter(|&dir| rules::can_move(&world.grid, world.hero.pos, dir));

    if let Some(dir) = world.hero.velocity.take() {
        let target = world.hero.pos + dir.delta();
        match rules::do_move(&mut world.grid, &mut world.hero, dir) {
            MoveEffect::Collected => {
                world.diamonds -= 1;
                events.push(GameEvent::Collected { pos: target });
            }
            MoveEffect::Unlocked => events.push(GameEvent::Unlocked),
            MoveEffect::Pushed | MoveEffect::Walked => {}
        }
    }

    // ── Physics ──
    let outcome = physics::rockfall(&mut world.grid, world.hero.pos);

    if outcome.moved && !world.falling {
        world.falling = true;
        events.push(GameEvent::FallingStarted);
    } else if !outcome.moved && world.falling {
        world.falling = false;
        events.push(GameEvent::FallingStopped);
    }

    // ── Death / completion ──
    // Collecting the last diamond clears the level even on a turn in
    // which a rock also lands on the hero: the clear wins the tie.
    if world.diamonds == 0 {
        world.phase = Phase::LevelCleared;
        world.anim_tick = 0;
        if world.falling {
            world.falling = false;
            events.push(GameEvent::FallingStopped);
        }
        events.push(GameEvent::LevelCleared);
        if world.current_level + 1 >= world.total_levels {
            events.push(GameEvent::GameWon);
        }
    } else if outcome.crushed {
        world.hero.dead = true;
        world.phase = Phase::Dying;
        world.anim_tick = 0;
        if world.falling {
            world.falling = false;
            events.push(GameEvent::FallingStopped);
        }
        events.push(GameEvent::HeroDied);
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Dir, Hero};
    use crate::domain::grid::{Grid, Pos};
    use crate::domain::tile::Tile;

    fn world_from(rows: &[&str]) -> WorldState {
        let mut w = WorldState::new();
        let h = rows.len() as i32;
        let wd = rows[0].len() as i32;
        w.grid = Grid::new(wd, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let pos = Pos::new(x as i32, y as i32);
                let tile = match ch {
                    '#' => Tile::Brick,
                    '.' => Tile::Earth,
                    'O' => Tile::Rock,
                    '*' => Tile::Diamond,
                    'X' => Tile::Safe,
                    'K' => Tile::Key,
                    '@' => {
                        w.hero = Hero::new(pos);
                        Tile::Empty
                    }
                    _ => Tile::Empty,
                };
                w.grid.set(pos, tile);
            }
        }
        w.grid.drain_dirty();
        w.survey();
        w.phase = Phase::Playing;
        w.total_levels = 2;
        w
    }

    fn input(dir: Dir) -> TurnInput {
        TurnInput { movement: Some(dir) }
    }

    fn no_input() -> TurnInput {
        TurnInput { movement: None }
    }

    #[test]
    fn rejected_direction_is_dropped() {
        let mut w = world_from(&["#@ "]);
        let start = w.hero.pos;
        advance_turn(&mut w, input(Dir::Left));
        assert_eq!(w.hero.pos, start);
        assert!(w.hero.velocity.is_none());
    }

    #[test]
    fn collecting_decrements_the_counter() {
        let mut w = world_from(&["@**"]);
        assert_eq!(w.diamonds, 2);
        let events = advance_turn(&mut w, input(Dir::Right));
        assert_eq!(w.diamonds, 1);
        assert!(matches!(events[0], GameEvent::Collected { .. }));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn last_diamond_clears_the_level() {
        let mut w = world_from(&["@*"]);
        w.current_level = 0;
        w.total_levels = 3;
        let events = advance_turn(&mut w, input(Dir::Right));
        assert_eq!(w.phase, Phase::LevelCleared);
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelCleared)));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::GameWon)));
    }

    #[test]
    fn clearing_the_final_level_wins_the_game() {
        let mut w = world_from(&["@*"]);
        w.current_level = 1;
        w.total_levels = 2;
        let events = advance_turn(&mut w, input(Dir::Right));
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameWon)));
    }

    #[test]
    fn unlock_keeps_the_count_and_the_level_open() {
        let mut w = world_from(&["@KX"]);
        assert_eq!(w.diamonds, 1);
        let events = advance_turn(&mut w, input(Dir::Right));
        assert!(matches!(events[0], GameEvent::Unlocked));
        assert_eq!(w.diamonds, 1);
        assert_eq!(w.grid.get(Pos::new(2, 0)), Tile::Diamond);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn move_and_physics_are_one_turn() {
        // Stepping under a hovering rock lets it drop in the same turn.
        let mut w = world_from(&[
            "O*",
            "  ",
            ".@",
            "##",
        ]);
        advance_turn(&mut w, input(Dir::Left));
        assert_eq!(w.hero.pos, Pos::new(0, 2)); // hero dug the earth
        // ...and the rock fell onto the hero's head: crushed.
        assert_eq!(w.phase, Phase::Dying);
        assert!(w.hero.dead);
    }

    #[test]
    fn standing_under_a_resting_rock_is_safe() {
        // The hero's cell blocks the fall entirely; a rock that never
        // moves never crushes.
        let mut w = world_from(&[
            "O*",
            "@ ",
            "##",
        ]);
        advance_turn(&mut w, no_input());
        assert_eq!(w.phase, Phase::Playing);
        assert!(!w.hero.dead);
        assert_eq!(w.grid.get(Pos::new(0, 0)), Tile::Rock);
    }

    #[test]
    fn falling_flag_tracks_rock_motion() {
        let mut w = world_from(&[
            "O*",
            "  ",
            "  ",
            "##",
        ]);
        let events = advance_turn(&mut w, no_input());
        assert!(w.falling);
        assert!(matches!(events[0], GameEvent::FallingStarted));

        advance_turn(&mut w, no_input()); // still dropping
        assert!(w.falling);

        let events = advance_turn(&mut w, no_input()); // at rest on brick
        assert!(!w.falling);
        assert!(events.iter().any(|e| matches!(e, GameEvent::FallingStopped)));
    }

    #[test]
    fn clearing_beats_crushing_on_the_same_turn() {
        // Stepping up collects the last diamond, and the rock above drops
        // onto the hero's head in the same turn. The clear wins.
        let mut w = world_from(&[
            " O ",
            "   ",
            " * ",
            " @ ",
            "###",
        ]);
        assert_eq!(w.diamonds, 1);
        let events = advance_turn(&mut w, input(Dir::Up));
        assert_eq!(w.phase, Phase::LevelCleared);
        assert!(!w.hero.dead);
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelCleared)));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::HeroDied)));
        // The rock still stops, and the slide loop with it.
        assert!(!w.falling);
        assert!(events.iter().any(|e| matches!(e, GameEvent::FallingStopped)));
    }

    #[test]
    fn death_stops_the_slide_loop() {
        let mut w = world_from(&[
            "O*",
            "  ",
            "  ",
            "@ ",
            "##",
        ]);
        let e1 = advance_turn(&mut w, no_input());
        assert!(matches!(e1[0], GameEvent::FallingStarted));
        let e2 = advance_turn(&mut w, no_input());
        assert_eq!(w.phase, Phase::Dying);
        assert!(e2.iter().any(|e| matches!(e, GameEvent::FallingStopped)));
        assert!(e2.iter().any(|e| matches!(e, GameEvent::HeroDied)));
        assert!(!w.falling);
    }
}
