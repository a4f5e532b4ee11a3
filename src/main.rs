/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::{Cue, GameEvent};
use sim::{game, step};
use sim::world::{Phase, World};
use ui::gamepad::GamepadState;
use ui::input::{Controls, InputState, KEYS_PAUSE, KEYS_QUIT};
use ui::renderer::Renderer;
use ui::sound::{positional_gain, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for note in &config.load_notes {
        log::info!("{note}");
    }

    let seed = if config.seed == 0 { time_seed() } else { config.seed };
    log::info!("starting with seed {seed}, tick {} ms", config.tick_rate_ms);
    let mut world = World::new(config.rules.clone(), seed);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        log::error!("terminal init failed: {e}");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing FrogMan!");
    if let Some(score) = world.final_score {
        println!("Last score: {score}");
    }
}

/// Log to a file: the terminal belongs to the renderer. `RUST_LOG` wins over
/// the configured level.
fn init_logging(config: &GameConfig) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()));
    match File::create(&config.log_file) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("cannot open log file {}: {e}; logging disabled", config.log_file.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    if builder.try_init().is_err() {
        eprintln!("logger already initialised");
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5eed)
}

fn game_loop(
    world: &mut World,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut controls = Controls::new();

    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let dt = tick_rate.as_secs_f64();
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        let was_paused = world.paused;
        let was_in_game = world.phase != Phase::Title;
        if handle_meta(world, &kb, &gp) {
            break;
        }
        if let Some(sfx) = sound {
            if world.paused != was_paused {
                sfx.set_music_paused(world.paused);
            }
            if was_in_game && world.phase == Phase::Title {
                sfx.stop_music();
            }
        }
        if world.paused && !was_paused {
            // Keys released during the pause would otherwise stay held.
            let mut events = Vec::new();
            for intent in controls.release_all() {
                game::handle_intent(world, intent, &mut events);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            if world.paused {
                world.anim_tick = world.anim_tick.wrapping_add(1);
            } else {
                let in_play = matches!(world.phase, Phase::Playing | Phase::Respawning);
                let intents = controls.intents(&kb, &gp, in_play);
                let events = step::step(world, &intents, dt);
                renderer.observe(&events, world.now);
                process_sound_events(sound, &events, world);
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Pause, quit and back-to-title. Returns true to leave the program.
fn handle_meta(world: &mut World, kb: &InputState, gp: &GamepadState) -> bool {
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();
    let in_play = matches!(world.phase, Phase::Playing | Phase::Respawning);

    if in_play && (kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed()) {
        world.paused = !world.paused;
        log::debug!("paused: {}", world.paused);
        return false;
    }

    match world.phase {
        Phase::Title => esc || kb.any_pressed(KEYS_QUIT),
        Phase::Playing | Phase::Respawning | Phase::GameOver => {
            if esc {
                return_to_title(world);
            }
            false
        }
    }
}

/// Abandon the current game. The world is rebuilt so no timer survives.
fn return_to_title(world: &mut World) {
    log::info!("back to title at score {}", world.ledger.score());
    let seed = time_seed();
    let final_score = world.final_score;
    *world = World::new(world.rules.clone(), seed);
    world.final_score = final_score;
}

/// Map events to cues, louder the closer they happen to the player.
fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent], world: &World) {
    let Some(sfx) = sound else { return };
    let listener = world.player_pos().or(Some(world.player.last_pos));
    let reach = world.rules.width.max(world.rules.height);

    for event in events {
        match event {
            GameEvent::PlayerKilled { .. } => {
                sfx.stop_cue(Cue::Jump);
                sfx.stop_cue(Cue::Land);
            }
            GameEvent::GameStarted => sfx.start_music(),
            GameEvent::GameOver { .. } => {
                sfx.stop_cue(Cue::LevelComplete);
                sfx.stop_music();
            }
            _ => {}
        }
        if let Some(cue) = event.cue() {
            sfx.play_cue(cue, positional_gain(event.position(), listener, reach));
        }
    }
}
