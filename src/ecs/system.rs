//! The system trait.

use crate::ecs::{Entity, EntityManager};
use std::any::Any;

/// A unit of behavior run once per frame by the [`EntityManager`].
///
/// Systems do not hold a reference back to the manager; the manager hands
/// itself to [`System::update`] instead. Most systems re-query
/// [`EntityManager::entities_with`] every frame, the add/remove hooks are for
/// the few that keep their own bookkeeping.
pub trait System: Any {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Advances the system by `dt` seconds.
    fn update(&mut self, world: &mut EntityManager, dt: f32);

    /// Called after an entity is created.
    fn on_entity_added(&mut self, _entity: Entity) {}

    /// Called after an entity has been purged.
    fn on_entity_removed(&mut self, _entity: Entity) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
