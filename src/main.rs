//! # Emberfall Main Entry Point
//!
//! Parses arguments, loads configuration, and runs the state machine inside
//! the macroquad frame loop.

use clap::Parser;
use emberfall::config::{ConfigPaths, Settings, TemplateLibrary};
use emberfall::input::InputHandler;
use emberfall::rendering::{MacroquadRenderer, SoundPlayer};
use emberfall::states::{GameContext, MenuState, StateMachine};
use emberfall::{GameError, GameResult};
use log::{error, info};
use macroquad::prelude::*;

/// Command line arguments for Emberfall.
#[derive(Parser, Debug)]
#[command(name = "emberfall")]
#[command(about = "A 2D arcade/RPG hybrid with turn-based combat")]
#[command(version)]
struct Args {
    /// Random seed for spawns and combat rolls
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory holding settings.toml, characters.toml and high scores
    #[arg(long, default_value = emberfall::DEFAULT_CONFIG_DIR)]
    config_dir: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the character templates as JSON and exit
    #[arg(long)]
    print_templates: bool,
}

/// Longest frame step fed to the simulation.
const MAX_FRAME_TIME: f32 = 4.0 / emberfall::TARGET_FPS as f32;

fn window_conf() -> Conf {
    let args = Args::parse();
    let settings = Settings::load_or_default(&ConfigPaths::new(&args.config_dir).settings());
    let int = |key: &str, fallback: i64| settings.get_int("display", key).unwrap_or(fallback);

    Conf {
        window_title: "Emberfall".to_string(),
        window_width: int("width", 1280) as i32,
        window_height: int("height", 720) as i32,
        fullscreen: settings.get_bool("display", "fullscreen").unwrap_or(false),
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() -> GameResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting Emberfall v{}", emberfall::VERSION);

    let paths = ConfigPaths::new(&args.config_dir);
    if let Err(e) = std::fs::create_dir_all(paths.dir()) {
        error!("Cannot use config directory {}: {}", paths.dir().display(), e);
        return Err(GameError::Init(format!(
            "config directory {} is unusable",
            paths.dir().display()
        )));
    }

    if args.print_templates {
        let templates = TemplateLibrary::load_or_builtin(&paths.templates());
        println!("{}", templates.to_json()?);
        return Ok(());
    }

    let seed = args.seed.unwrap_or_else(emberfall::game::now_timestamp);
    info!("Using seed {}", seed);

    let mut ctx = GameContext::load(paths, seed);
    run(&mut ctx).await;

    info!("Goodbye");
    Ok(())
}

/// Initializes `env_logger`, letting `RUST_LOG` override the command line.
fn initialize_logging(log_level: &str) {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .try_init();
    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Main game loop.
async fn run(ctx: &mut GameContext) {
    let input = InputHandler::new();
    let mut renderer = MacroquadRenderer::new();
    let mut sounds = SoundPlayer::new(1.0, 1.0, false);
    let mut machine = StateMachine::new();
    machine.push(Box::new(MenuState::new()), ctx);

    while machine.is_running() {
        let frame = input.poll(machine.wants_text_input());
        machine.handle_input(&frame, ctx);

        let dt = get_frame_time().min(MAX_FRAME_TIME);
        machine.update(dt, ctx);

        sounds.master_volume = ctx.settings.get_float("audio", "master_volume").unwrap_or(1.0) as f32;
        sounds.sfx_volume = ctx.settings.get_float("audio", "sfx_volume").unwrap_or(1.0) as f32;
        sounds.muted = ctx.settings.get_bool("audio", "muted").unwrap_or(false);
        sounds.play_all(ctx.drain_sounds()).await;

        machine.render(ctx, &mut renderer);
        if ctx.settings.get_bool("display", "show_fps").unwrap_or(false) {
            draw_text(&format!("FPS {}", get_fps()), 10.0, screen_height() - 10.0, 20.0, WHITE);
        }

        next_frame().await;
    }

    info!("Game loop ended after {:.0}s of play", ctx.statistics.play_time);
}
