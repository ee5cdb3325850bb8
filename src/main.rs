/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::entity::{Dir, TurnInput};
use sim::event::GameEvent;
use sim::level::{load_level, load_levels, LevelDef};
use sim::save::{self, LoadResult};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let levels = match load_levels(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut world = WorldState::new();
    world.speed = config.speed.clone();
    start_level(&mut world, 0, &levels);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, &levels);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    if world.phase == Phase::GameWon {
        println!("All {} caverns cleared. Thanks for playing Stonefall!", world.total_levels);
    } else {
        println!("Thanks for playing Stonefall!");
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    levels: &[LevelDef],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // Render ticks since the last simulation turn. The simulation runs
    // once per `subframes` ticks; the ticks in between exist purely for
    // pacing and blink animation.
    let mut subframe: u32 = 0;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, sound, &kb, &gp, levels) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            match world.phase {
                Phase::Playing => {
                    subframe += 1;
                    if subframe >= world.speed.subframes {
                        subframe = 0;
                        let input = TurnInput { movement: detect_movement(&kb, &gp) };
                        let events = step::advance_turn(world, input);
                        process_events(world, sound, &events);
                    }
                }
                Phase::LevelStarting => {
                    world.anim_tick += 1;
                    if world.anim_tick >= world.speed.intro_ticks {
                        world.phase = Phase::Playing;
                        subframe = 0;
                    }
                }
                Phase::Dying => {
                    world.anim_tick += 1;
                    if world.anim_tick >= world.speed.dying_ticks {
                        reload_position(world, levels);
                    }
                }
                Phase::LevelCleared => {
                    world.anim_tick += 1;
                    if world.anim_tick >= world.speed.cleared_ticks {
                        let next = world.current_level + 1;
                        if next >= world.total_levels {
                            world.phase = Phase::GameWon;
                            world.anim_tick = 0;
                        } else {
                            start_level(world, next, levels);
                        }
                    }
                }
                Phase::GameWon => {
                    world.anim_tick += 1;
                }
            }

            // Tick the message timer in every phase
            if world.message_timer > 0 {
                world.message_timer -= 1;
                if world.message_timer == 0 {
                    world.message.clear();
                }
            }

            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Fresh level load plus the automatic position save, so `l` with no
/// explicit save returns to the level start.
fn start_level(world: &mut WorldState, level_idx: usize, levels: &[LevelDef]) {
    load_level(world, level_idx, levels);
    if save::save_position(&world.grid, world.hero.pos).is_err() {
        world.set_message("Warning: could not save start position", 40);
    }
}

/// Death recovery: back to the saved position, or to the level start
/// when the save is missing or unreadable.
fn reload_position(world: &mut WorldState, levels: &[LevelDef]) {
    match save::load_position() {
        LoadResult::Loaded(grid) => {
            world.grid = grid;
            world.hero.dead = false;
            world.hero.velocity = None;
            world.falling = false;
            world.survey();
            world.phase = Phase::Playing;
            world.anim_tick = 0;
        }
        LoadResult::Missing => {
            start_level(world, world.current_level, levels);
        }
        LoadResult::Corrupt(_) => {
            start_level(world, world.current_level, levels);
            world.set_message("Saved position unreadable, restarting level", 40);
        }
    }
}

fn process_events(world: &mut WorldState, sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Unlocked => {
                world.set_message("The safes spring open!", 30);
            }
            GameEvent::LevelCleared => {
                world.set_message("Cavern cleared!", 30);
            }
            _ => {}
        }
    }

    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Collected { .. } => sfx.play_collect(),
            GameEvent::Unlocked => sfx.play_unlock(),
            GameEvent::FallingStarted => sfx.start_slide(),
            GameEvent::FallingStopped => sfx.stop_slide(),
            GameEvent::HeroDied => sfx.play_splat(),
            GameEvent::LevelCleared => sfx.play_clear(),
            GameEvent::GameWon => sfx.play_won(),
        }
    }
}

// ── Key Constants ──
//
// Movement is the arrows plus the classic BBC-micro Z/X/'/? cluster.
// WASD is not bound: S saves the position.

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('z'), KeyCode::Char('Z')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('x'), KeyCode::Char('X')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('\''), KeyCode::Char('"')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('/'), KeyCode::Char('?')];
const KEYS_SAVE: &[KeyCode] = &[KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LOAD: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<Dir> {
    if kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP) || gp.up_held() {
        Some(Dir::Up)
    } else if kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN) || gp.down_held() {
        Some(Dir::Down)
    } else if kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held() {
        Some(Dir::Left)
    } else if kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held() {
        Some(Dir::Right)
    } else {
        None
    }
}

fn handle_meta(
    world: &mut WorldState,
    sound: Option<&SoundEngine>,
    kb: &InputState,
    gp: &GamepadState,
    levels: &[LevelDef],
) -> bool {
    if kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
        return true;
    }

    match world.phase {
        Phase::Playing => {
            if kb.any_pressed(KEYS_SAVE) || gp.save_pressed() {
                match save::save_position(&world.grid, world.hero.pos) {
                    Ok(()) => world.set_message("Position saved", 30),
                    Err(_) => world.set_message("Save failed!", 30),
                }
            } else if kb.any_pressed(KEYS_LOAD) || gp.load_pressed() {
                match save::load_position() {
                    LoadResult::Loaded(grid) => {
                        world.grid = grid;
                        world.hero.velocity = None;
                        world.falling = false;
                        world.survey();
                        if let Some(sfx) = sound {
                            sfx.stop_slide();
                        }
                        world.set_message("Position loaded", 30);
                    }
                    LoadResult::Missing => {
                        world.set_message("No saved position", 30);
                    }
                    LoadResult::Corrupt(_) => {
                        world.set_message("Saved position unreadable, ignored", 40);
                    }
                }
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                // Restart does NOT touch the saved position: a later `l`
                // still returns to wherever the player last saved.
                load_level(world, world.current_level, levels);
                if let Some(sfx) = sound {
                    sfx.stop_slide();
                }
            }
        }

        Phase::LevelStarting => {
            // Any movement key skips the splash.
            if kb.any_pressed(KEYS_LEFT) || kb.any_pressed(KEYS_RIGHT)
                || kb.any_pressed(KEYS_UP) || kb.any_pressed(KEYS_DOWN)
            {
                world.phase = Phase::Playing;
            }
        }

        Phase::GameWon => {
            if !kb.raw_events.is_empty() {
                return true;
            }
        }

        Phase::Dying | Phase::LevelCleared => {
            // Can't skip
        }
    }

    false
}
