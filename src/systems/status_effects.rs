//! Timed status effects.

use crate::components::{apply_health_delta, Health, StatusEffects};
use crate::ecs::{EntityManager, System};
use std::any::Any;

/// Ticks effect durations and applies poison and regeneration once per
/// elapsed second. Effects on dead entities are cleared.
#[derive(Debug, Clone, Default)]
pub struct StatusEffectSystem;

impl System for StatusEffectSystem {
    fn name(&self) -> &'static str {
        "status_effects"
    }

    fn update(&mut self, world: &mut EntityManager, dt: f32) {
        for entity in world.entities_with::<(StatusEffects,)>() {
            let dead = world
                .get_component::<Health>(entity)
                .map(|health| health.is_dead())
                .unwrap_or(false);

            let Some(effects) = world.get_component_mut::<StatusEffects>(entity) else {
                continue;
            };
            if dead {
                effects.clear();
                continue;
            }

            let delta = effects.advance(dt);
            if delta != 0 {
                if let Some(health) = world.get_component_mut::<Health>(entity) {
                    apply_health_delta(health, delta);
                }
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
