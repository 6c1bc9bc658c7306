//! Death detection, invulnerability timers and corpse cleanup.

use crate::components::{EntityKind, Health, Tag};
use crate::ecs::{Entity, EntityManager, System};
use log::debug;
use std::any::Any;

/// Emitted once when an entity's health first reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathEvent {
    pub entity: Entity,
    pub kind: Option<EntityKind>,
}

/// Keeps [`Health`] consistent and removes dead non-player entities once
/// their despawn delay runs out. Players are never destroyed here; game over
/// is the playing state's call.
#[derive(Debug, Default)]
pub struct HealthSystem {
    deaths: Vec<DeathEvent>,
}

impl HealthSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deaths recorded since the last drain.
    pub fn drain_deaths(&mut self) -> Vec<DeathEvent> {
        std::mem::take(&mut self.deaths)
    }
}

impl System for HealthSystem {
    fn name(&self) -> &'static str {
        "health"
    }

    fn update(&mut self, world: &mut EntityManager, dt: f32) {
        for entity in world.entities_with::<(Health,)>() {
            let kind = world.get_component::<Tag>(entity).map(|tag| tag.0);
            let mut died = false;
            let mut expired = false;

            if let Some(health) = world.get_component_mut::<Health>(entity) {
                health.current = health.current.max(0).min(health.max);
                health.invulnerable_timer = (health.invulnerable_timer - dt).max(0.0);

                if !health.dead && health.current <= 0 {
                    health.dead = true;
                    died = true;
                } else if health.dead && kind != Some(EntityKind::Player) {
                    health.despawn_delay -= dt;
                    expired = health.despawn_delay <= 0.0;
                }
            }

            if died {
                debug!("{} died ({:?})", entity, kind);
                self.deaths.push(DeathEvent { entity, kind });
            }
            if expired && !world.is_pending_destroy(entity) {
                world.destroy_entity(entity);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
