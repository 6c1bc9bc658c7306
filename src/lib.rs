//! # Emberfall
//!
//! A 2D arcade/RPG hybrid. The party leader explores an arena in real time;
//! touching an enemy drops the party into turn-based combat.
//!
//! ## Architecture Overview
//!
//! - **ECS**: [`EntityManager`] owns entities, typed component storage and
//!   the systems that run each frame
//! - **Systems**: movement, collision, AI, health, status effects, abilities,
//!   animation and audio, each a [`System`] over plain components
//! - **Combat**: a phase machine with initiative-ordered turns, damage rolls
//!   and rewards, independent of any rendering
//! - **States**: a stack of screens (menu, customization, playing, combat,
//!   pause, game over, high scores) driven by [`states::StateMachine`]
//! - **Configuration**: TOML settings and character templates with fallbacks
//!   to built-in defaults
//!
//! Rendering and input sit behind [`rendering::Renderer`] and
//! [`input::InputFrame`] so everything above them runs headless in tests.

pub mod combat;
pub mod components;
pub mod config;
pub mod ecs;
pub mod game;
pub mod input;
pub mod rendering;
pub mod states;
pub mod systems;
pub mod utils;

pub use components::*;
pub use ecs::*;
pub use utils::*;

pub use combat::{CombatAction, CombatEngine, CombatOutcome, CombatPhase};
pub use config::{ConfigPaths, Settings, TemplateLibrary};
pub use states::{GameContext, GameState, StateKind, StateMachine, Transition};
pub use systems::{
    AbilitySystem, AiSystem, AnimationSystem, AudioSystem, CollisionSystem, HealthSystem,
    MovementSystem, StatusEffectSystem,
};

/// Core error type for the game.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML file could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value could not be written as TOML
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A setting or template is malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup failed
    #[error("Initialization failed: {0}")]
    Init(String),
}

/// Result type used throughout the codebase.
pub type GameResult<T> = Result<T, GameError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory searched for configuration files when none is given.
pub const DEFAULT_CONFIG_DIR: &str = "assets/config";

pub const SETTINGS_FILE: &str = "settings.toml";

pub const TEMPLATES_FILE: &str = "characters.toml";

pub const HIGH_SCORES_FILE: &str = "highscores.txt";

/// Frames per second target for the game loop
pub const TARGET_FPS: u32 = 60;
