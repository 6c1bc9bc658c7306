//! # Systems Module
//!
//! Per-frame behavior. Each system is registered with the
//! [`EntityManager`](crate::EntityManager) and runs in registration order.
//! Systems that produce events (collisions, deaths, attacks, sounds) queue
//! them for the owning game state to drain after the update.

pub mod abilities;
pub mod ai;
pub mod animation;
pub mod audio;
pub mod collision;
pub mod health;
pub mod movement;
pub mod status_effects;

pub use abilities::AbilitySystem;
pub use ai::{center_of, find_nearest_player, AiSystem, AttackEvent, WAYPOINT_TOLERANCE};
pub use animation::AnimationSystem;
pub use audio::{AudioSystem, SoundRequest};
pub use collision::{CollisionCallback, CollisionInfo, CollisionSystem};
pub use health::{DeathEvent, HealthSystem};
pub use movement::{MovementSystem, HASTE_MULTIPLIER};
pub use status_effects::StatusEffectSystem;
