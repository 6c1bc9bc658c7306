//! Position, motion and collision volume components.

use crate::ecs::Component;
use crate::utils::{Aabb, Vector2};

/// World placement of an entity. `position` is the top-left corner of the
/// entity's footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector2,
    pub rotation: f32,
    pub scale: Vector2,
}

impl Transform {
    /// A transform at `position` with no rotation and unit scale.
    pub fn at(position: Vector2) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vector2::ZERO)
    }
}

impl Component for Transform {}

/// Linear velocity in world units per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vector2);

impl Component for Velocity {}

/// Axis-aligned collision volume relative to the entity's transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub width: f32,
    pub height: f32,
    pub offset: Vector2,
    /// Triggers report overlaps but are never meant to block movement
    pub is_trigger: bool,
}

impl Collider {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            offset: Vector2::ZERO,
            is_trigger: false,
        }
    }

    pub fn trigger(width: f32, height: f32) -> Self {
        Self {
            is_trigger: true,
            ..Self::new(width, height)
        }
    }

    /// The world-space box for this collider placed at `transform`.
    pub fn bounds(&self, transform: &Transform) -> Aabb {
        Aabb::from_origin_size(
            transform.position + self.offset,
            self.width * transform.scale.x,
            self.height * transform.scale.y,
        )
    }
}

impl Component for Collider {}
