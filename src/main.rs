/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::player::MoveDir;
use sim::level::LevelSource;
use sim::step;
use sim::store::{self, FileStore};
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, MoveRepeater, KEYS_CONFIRM, KEYS_MUTE, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;
use ui::sound::AudioEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "fogmaze.log";
const LOG_ENV: &str = "FOGMAZE_LOG";

fn main() {
    let config = GameConfig::load();
    let save_dir = store::save_dir(config.save_dir.as_deref());
    init_tracing(&save_dir);
    let store = FileStore::new(&save_dir);
    info!(
        levels_dir = %config.levels_dir.display(),
        save_dir = %store.dir().display(),
        "fogmaze starting"
    );

    let mut world = WorldState::new(
        LevelSource::from_config(&config),
        config.display.clone(),
        Box::new(store),
    );
    world.discover();

    let mut renderer = Renderer::new();
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            error!(error = %e, "terminal init failed");
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let mut audio = AudioEngine::init();

    let result = game_loop(&mut world, &mut renderer, &mut audio, &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game loop aborted");
        eprintln!("Game error: {e}");
    }

    info!(cleared = world.progress.completed_count(), "fogmaze exiting");
    println!();
    println!("Thanks for playing Fogmaze!");
    println!("Mazes cleared: {}/{}", world.progress.completed_count(), world.total_levels);
}

/// Log to a file in the save directory; the terminal belongs to the game.
/// Filter with `FOGMAZE_LOG` (same syntax as `RUST_LOG`), default `info`.
fn init_tracing(save_dir: &Path) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let file = fs::create_dir_all(save_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(save_dir.join(LOG_FILE)));

    match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .compact()
            .with_writer(Mutex::new(file))
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    audio: &mut AudioEngine,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    info!(connected = gp.connected, "gamepad detected");

    let mut repeater = MoveRepeater::new(Duration::from_millis(config.input.repeat_ms));
    let tick_rate = Duration::from_millis(config.input.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut muted = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        let rows = renderer.select_rows();
        if handle_meta(world, &kb, &gp, &mut muted, rows) {
            break;
        }

        // Audio plays only while unpaused and unmuted
        if world.paused || muted {
            audio.suspend();
        } else {
            audio.resume();
        }

        if world.phase == Phase::Playing && !world.paused {
            let pressed = kb.pressed_direction().or_else(|| gp.pressed_direction());
            let held = kb.held_direction().or_else(|| gp.held_direction());
            if let Some(dir) = repeater.poll(pressed, held, Instant::now()) {
                let events = step::step(world, dir);
                audio.handle(&events);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            world.anim_tick = world.anim_tick.wrapping_add(1);
            world.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Menu navigation and per-phase actions. Returns true to quit.
/// `rows` is the level-select list height the renderer will draw.
fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    muted: &mut bool,
    rows: usize,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let back = kb.was_pressed(KeyCode::Esc) || gp.cancel_pressed();

    if kb.any_pressed(KEYS_MUTE) {
        *muted = !*muted;
        world.set_message(if *muted { "Sound off" } else { "Sound on" }, 60);
    }

    match world.phase {
        // ── Title ──
        Phase::Title => {
            if confirm {
                if world.total_levels > 0 {
                    world.open_level_select(rows);
                } else {
                    world.set_message("No mazes to play", 120);
                }
            } else if back || kb.any_pressed(KEYS_QUIT) {
                return true;
            }
        }

        // ── Level Select ──
        Phase::LevelSelect => {
            let nav = kb.pressed_direction().or_else(|| gp.pressed_direction());
            if nav == Some(MoveDir::Up) {
                world.move_select_cursor(-1, rows);
            } else if nav == Some(MoveDir::Down) {
                world.move_select_cursor(1, rows);
            } else if kb.was_pressed(KeyCode::PageUp) {
                world.move_select_cursor(-(rows as isize), rows);
            } else if kb.was_pressed(KeyCode::PageDown) {
                world.move_select_cursor(rows as isize, rows);
            } else if confirm {
                let level = world.selected_level();
                // Refusals and load failures already surface as a message
                let _ = step::enter_level(world, level);
            } else if back {
                world.phase = Phase::Title;
            } else {
                // Terminal may have shrunk since the last move
                world.scroll_to_cursor(rows);
            }
        }

        // ── Playing ──
        Phase::Playing => {
            if kb.was_pressed(KeyCode::F(1)) {
                world.paused = !world.paused;
                info!(paused = world.paused, "pause toggled");
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                step::restart_level(world);
            } else if back {
                step::leave_level(world);
                world.scroll_to_cursor(rows);
            }
        }

        // ── Level Complete ──
        Phase::LevelComplete => {
            if confirm {
                step::advance_after_completion(world);
                world.scroll_to_cursor(rows);
            } else if back {
                world.open_level_select(rows);
            }
        }
    }

    false
}
