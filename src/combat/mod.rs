//! # Combat Module
//!
//! Turn-based battles fought between the party and a group of enemies.
//!
//! The [`CombatEngine`] is a phase machine that works on plain entity handles
//! and reads and writes components through the
//! [`EntityManager`](crate::EntityManager). It owns no entities itself.
//! Randomness is always passed in, so a seeded RNG replays a battle exactly.

pub mod damage;
pub mod engine;
pub mod participant;
pub mod rewards;
pub mod turn_order;

pub use damage::{base_damage, AttackRoll, DamageRoll};
pub use engine::{CombatAction, CombatEngine, CombatPhase};
pub use participant::{CombatParticipant, Team};
pub use rewards::{Rewards, EXPERIENCE_PER_ENEMY_LEVEL, SCORE_PER_ENEMY_LEVEL};
pub use turn_order::roll_turn_order;

use crate::config::Settings;
use crate::ecs::Entity;
use serde::{Deserialize, Serialize};

/// Tunables for a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Half-width of the damage variance band
    pub damage_variance: f32,
    pub crit_multiplier: f32,
    /// Probability in `[0, 1]` that a flee attempt succeeds
    pub flee_success_rate: f32,
    /// Seconds spent on the battle start and battle end banners
    pub phase_delay: f32,
    /// Seconds between choosing an action and resolving it
    pub action_delay: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            damage_variance: 0.1,
            crit_multiplier: 1.5,
            flee_success_rate: 0.5,
            phase_delay: 0.8,
            action_delay: 0.4,
        }
    }
}

impl CombatConfig {
    /// Reads the `[combat]` section, falling back to defaults per key.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        let float = |key: &str, fallback: f32| {
            settings
                .get_float("combat", key)
                .map(|value| value as f32)
                .unwrap_or(fallback)
        };
        Self {
            damage_variance: float("damage_variance", defaults.damage_variance),
            crit_multiplier: float("crit_multiplier", defaults.crit_multiplier),
            flee_success_rate: float("flee_success_rate", defaults.flee_success_rate),
            phase_delay: float("phase_delay", defaults.phase_delay),
            action_delay: float("action_delay", defaults.action_delay),
        }
    }

    /// No pacing delays; every phase advances on the next update.
    pub fn instant() -> Self {
        Self {
            phase_delay: 0.0,
            action_delay: 0.0,
            ..Self::default()
        }
    }
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Fled,
}

/// Summary handed back to the exploring state when a battle is over.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatReport {
    pub outcome: CombatOutcome,
    /// Zero unless the outcome is a victory
    pub rewards: Rewards,
    pub defeated_enemies: Vec<Entity>,
    /// Remaining health of every party combatant
    pub party_health: Vec<(Entity, i32)>,
    pub rounds: u32,
}
