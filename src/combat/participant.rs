//! Combatants as seen by the turn-based engine.

use crate::components::{Health, Name, Stats};
use crate::ecs::{Entity, EntityManager};
use serde::{Deserialize, Serialize};

/// Which side of the battle a participant fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }
}

/// One entity taking part in a battle.
///
/// Only the entity handle is authoritative; `health` and `max_health` are a
/// snapshot refreshed from the world after every action.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatParticipant {
    pub entity: Entity,
    pub team: Team,
    pub name: String,
    /// Base initiative from [`Stats`]
    pub initiative: f32,
    /// Initiative after this round's random jitter
    pub rolled_initiative: f32,
    pub health: i32,
    pub max_health: i32,
    /// Defense doubled until this participant's next turn
    pub defending: bool,
}

impl CombatParticipant {
    pub fn new(entity: Entity, team: Team, name: impl Into<String>, initiative: f32, health: i32) -> Self {
        Self {
            entity,
            team,
            name: name.into(),
            initiative,
            rolled_initiative: initiative,
            health,
            max_health: health,
            defending: false,
        }
    }

    /// Builds a participant from the entity's components. Entities without
    /// [`Health`] cannot fight and yield `None`.
    pub fn from_world(world: &EntityManager, entity: Entity, team: Team) -> Option<Self> {
        let health = world.get_component::<Health>(entity)?;
        let initiative = world
            .get_component::<Stats>(entity)
            .map(|stats| stats.initiative)
            .unwrap_or_else(|| Stats::default().initiative) as f32;
        let name = world
            .get_component::<Name>(entity)
            .map(|name| name.0.clone())
            .unwrap_or_else(|| format!("{:?} {}", team, entity));

        let mut participant = Self::new(entity, team, name, initiative, health.current);
        participant.max_health = health.max;
        Some(participant)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Re-reads the health snapshot. A vanished entity counts as dead.
    pub fn refresh(&mut self, world: &EntityManager) {
        self.health = match world.get_component::<Health>(self.entity) {
            Some(health) if !health.is_dead() => health.current,
            _ => 0,
        };
    }
}
