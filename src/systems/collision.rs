//! Pairwise AABB collision detection.

use crate::components::{Collider, Transform};
use crate::ecs::{Entity, EntityManager, System};
use crate::utils::Aabb;
use std::any::Any;

/// One overlapping pair found during a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    pub a: Entity,
    pub b: Entity,
    pub overlap_x: f32,
    pub overlap_y: f32,
}

impl CollisionInfo {
    /// Whether this pair involves `entity`.
    pub fn involves(&self, entity: Entity) -> bool {
        self.a == entity || self.b == entity
    }

    /// The entity on the other side of the pair from `entity`.
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

pub type CollisionCallback = Box<dyn FnMut(&CollisionInfo)>;

/// Tests every pair of entities with a [`Transform`] and [`Collider`] each
/// frame. This is O(n²) with no broad phase, fine for the tens to low hundreds
/// of entities an arena holds.
///
/// The system never changes entities. Responses belong to whoever reads the
/// collisions, through the callback or [`drain_collisions`].
///
/// [`drain_collisions`]: CollisionSystem::drain_collisions
#[derive(Default)]
pub struct CollisionSystem {
    callback: Option<CollisionCallback>,
    collisions: Vec<CollisionInfo>,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the function called once per colliding pair.
    pub fn set_callback(&mut self, callback: impl FnMut(&CollisionInfo) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Collisions found by the most recent update.
    pub fn collisions(&self) -> &[CollisionInfo] {
        &self.collisions
    }

    pub fn drain_collisions(&mut self) -> Vec<CollisionInfo> {
        std::mem::take(&mut self.collisions)
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn update(&mut self, world: &mut EntityManager, _dt: f32) {
        self.collisions.clear();

        let boxes: Vec<(Entity, Aabb)> = world
            .entities_with::<(Transform, Collider)>()
            .into_iter()
            .filter_map(|entity| {
                let transform = world.get_component::<Transform>(entity)?;
                let collider = world.get_component::<Collider>(entity)?;
                Some((entity, collider.bounds(transform)))
            })
            .collect();

        for (i, (a, box_a)) in boxes.iter().enumerate() {
            for (b, box_b) in &boxes[i + 1..] {
                if let Some((overlap_x, overlap_y)) = box_a.overlap(box_b) {
                    let info = CollisionInfo {
                        a: *a,
                        b: *b,
                        overlap_x,
                        overlap_y,
                    };
                    if let Some(callback) = self.callback.as_mut() {
                        callback(&info);
                    }
                    self.collisions.push(info);
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
