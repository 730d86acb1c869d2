/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};

use config::GameConfig;
use sim::event::GameEvent;
use sim::game::Game;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    init_logging();

    let config = match GameConfig::load() {
        Ok(c) => c,
        Err(e) => {
            log::error!("invalid config: {e}");
            eprintln!("config.toml: {e}");
            std::process::exit(2);
        }
    };

    let mut game = match Game::new(config) {
        Ok(g) => g,
        Err(e) => {
            log::error!("cannot build playfield: {e}");
            eprintln!("config.toml: {e}");
            std::process::exit(2);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut kb = InputState::new();
    kb.honor_release = enable_key_release();

    let sound = SoundEngine::new();

    let result = game_loop(&mut game, &mut renderer, &mut kb, sound.as_ref());

    if kb.honor_release {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        log::error!("game loop: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Frogger!");
    println!("Final Score: {}  (level {})", game.score(), game.level());
}

/// Log to `frogger.log` in the temp dir; the terminal belongs to the game.
fn init_logging() {
    let path = std::env::temp_dir().join("frogger.log");
    let file = match File::create(&path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

/// Ask the terminal to report key releases. Only honored where supported.
fn enable_key_release() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        return false;
    }
    execute!(
        std::io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gp = GamepadState::new(&game.config().gamepad);
    if gp.connected {
        log::info!("gamepad connected");
    }
    let frame = Duration::from_secs_f64(1.0 / game.config().timing.fps as f64);
    let mut last = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        let mut inputs = kb.game_inputs();
        inputs.extend(gp.game_inputs());
        if !game.handle_input(&inputs) {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let events = game.update(dt);
        process_sound_events(sound, &events);

        renderer.render(game)?;

        let spent = last.elapsed();
        if spent < frame {
            std::thread::sleep(frame - spent);
        }
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for event in events {
        sfx.play_event(event);
    }
}
