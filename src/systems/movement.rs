//! Velocity integration.

use crate::components::{Collider, Health, StatusEffects, Transform, Velocity};
use crate::ecs::{EntityManager, System};
use crate::utils::Aabb;
use std::any::Any;

/// Speed multiplier while hasted.
pub const HASTE_MULTIPLIER: f32 = 1.5;

/// Moves every entity with a [`Transform`] and [`Velocity`].
///
/// Stunned and dead entities stay put. When `bounds` is set, entities are
/// kept inside it using their collider size.
#[derive(Debug, Clone, Default)]
pub struct MovementSystem {
    pub bounds: Option<Aabb>,
}

impl MovementSystem {
    pub fn new(bounds: Option<Aabb>) -> Self {
        Self { bounds }
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn update(&mut self, world: &mut EntityManager, dt: f32) {
        for entity in world.entities_with::<(Transform, Velocity)>() {
            if world
                .get_component::<Health>(entity)
                .map(|health| health.is_dead())
                .unwrap_or(false)
            {
                continue;
            }

            let (stunned, hasted) = world
                .get_component::<StatusEffects>(entity)
                .map(|effects| (effects.is_stunned(), effects.is_hasted()))
                .unwrap_or((false, false));
            if stunned {
                continue;
            }

            let Some(velocity) = world.get_component::<Velocity>(entity).map(|v| v.0) else {
                continue;
            };
            let factor = if hasted { HASTE_MULTIPLIER } else { 1.0 };
            let size = world
                .get_component::<Collider>(entity)
                .map(|collider| (collider.width, collider.height))
                .unwrap_or((0.0, 0.0));

            if let Some(transform) = world.get_component_mut::<Transform>(entity) {
                transform.position += velocity * (dt * factor);

                if let Some(bounds) = self.bounds {
                    // Not f32::clamp: min exceeds max for oversized entities
                    transform.position.x = transform
                        .position
                        .x
                        .max(bounds.min.x)
                        .min(bounds.max.x - size.0);
                    transform.position.y = transform
                        .position
                        .y
                        .max(bounds.min.y)
                        .min(bounds.max.y - size.1);
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
