//! The entity manager: sole owner of entities, components and systems.

use crate::ecs::component::{ComponentStorage, TypedStorage};
use crate::ecs::{
    Component, ComponentQuery, ComponentRegistry, ComponentTypeId, Entity, System,
};
use log::{debug, trace};
use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Owns entity existence, component storage and the ordered system list.
///
/// Every operation on an unknown or destroyed entity is a silent no-op that
/// returns `None`/`false`. Destruction is deferred: [`destroy_entity`]
/// only queues the entity, and the purge happens at the start of the next
/// [`update`], before any system runs.
///
/// [`destroy_entity`]: EntityManager::destroy_entity
/// [`update`]: EntityManager::update
///
/// # Examples
///
/// ```
/// use emberfall::{EntityManager, Transform, Vector2};
///
/// let mut world = EntityManager::new();
/// let e = world.create_entity();
/// world.add_component(e, Transform::at(Vector2::new(1.0, 2.0)));
///
/// assert!(world.has_component::<Transform>(e));
/// world.destroy_entity(e);
/// assert!(world.is_valid(e)); // valid until the frame boundary
/// world.update(0.016);
/// assert!(!world.is_valid(e));
/// ```
pub struct EntityManager {
    next_id: u64,
    /// Live entities in creation order
    entities: Vec<Entity>,
    alive: HashSet<Entity>,
    pending_destroy: Vec<Entity>,
    registry: ComponentRegistry,
    storages: HashMap<ComponentTypeId, Box<dyn ComponentStorage>>,
    /// A slot is `None` while its system is running
    systems: Vec<Option<Box<dyn System>>>,
    system_index: HashMap<TypeId, usize>,
    running_system: Option<usize>,
    spawned_during_run: Vec<Entity>,
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityManager {
    /// Creates an empty manager. The first entity gets ID 1.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entities: Vec::new(),
            alive: HashSet::new(),
            pending_destroy: Vec::new(),
            registry: ComponentRegistry::new(),
            storages: HashMap::new(),
            systems: Vec::new(),
            system_index: HashMap::new(),
            running_system: None,
            spawned_during_run: Vec::new(),
        }
    }

    /// Allocates a new entity and announces it to every system.
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity::from_raw(self.next_id);
        self.next_id += 1;
        self.entities.push(entity);
        self.alive.insert(entity);

        for system in self.systems.iter_mut().flatten() {
            system.on_entity_added(entity);
        }
        if self.running_system.is_some() {
            self.spawned_during_run.push(entity);
        }

        trace!("created entity {}", entity);
        entity
    }

    /// Queues `entity` for removal at the next frame boundary.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if !self.alive.contains(&entity) {
            trace!("destroy_entity: {} is not alive, ignoring", entity);
            return;
        }
        if !self.pending_destroy.contains(&entity) {
            self.pending_destroy.push(entity);
        }
    }

    /// Whether the entity exists. Entities queued for destruction stay valid
    /// until the next [`update`](EntityManager::update).
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Whether the entity is queued for destruction.
    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.pending_destroy.contains(&entity)
    }

    /// Number of live entities, including ones queued for destruction.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities waiting for the next purge.
    pub fn pending_destroy_count(&self) -> usize {
        self.pending_destroy.len()
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Attaches `component` to `entity`, replacing any existing value of the
    /// same type. Returns `None` if the entity does not exist.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        if !self.is_valid(entity) {
            trace!(
                "add_component<{}>: {} is not alive",
                std::any::type_name::<T>(),
                entity
            );
            return None;
        }

        let id = self.registry.id_of::<T>();
        let storage = self
            .storages
            .entry(id)
            .or_insert_with(|| Box::new(TypedStorage::<T>::new()));
        let typed = storage.as_any_mut().downcast_mut::<TypedStorage<T>>()?;

        match typed.items.entry(entity) {
            Entry::Occupied(mut slot) => {
                slot.insert(component);
                Some(slot.into_mut())
            }
            Entry::Vacant(slot) => Some(slot.insert(component)),
        }
    }

    /// Detaches and returns the `T` on `entity`, if any.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.items.remove(&entity)
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.items.get(&entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.items.get_mut(&entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.registry
            .lookup::<T>()
            .and_then(|id| self.storages.get(&id))
            .map(|storage| storage.contains(entity))
            .unwrap_or(false)
    }

    /// Number of entities carrying a `T`.
    pub fn component_count<T: Component>(&self) -> usize {
        self.registry
            .lookup::<T>()
            .and_then(|id| self.storages.get(&id))
            .map(|storage| storage.len())
            .unwrap_or(0)
    }

    /// The numeric ID assigned to `T`, if it has been used yet.
    pub fn component_type_id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.registry.lookup::<T>()
    }

    /// Every live entity that has all components in `Q`, in creation order.
    ///
    /// This is a linear scan, O(entities × types).
    pub fn entities_with<Q: ComponentQuery>(&self) -> Vec<Entity> {
        self.entities
            .iter()
            .copied()
            .filter(|&entity| Q::matches(self, entity))
            .collect()
    }

    /// Registers a system. One instance per type: adding a second `S`
    /// replaces the first in place, keeping its position in the run order.
    /// Returns the registered instance.
    pub fn add_system<S: System>(&mut self, system: S) -> Option<&mut S> {
        let type_id = TypeId::of::<S>();
        match self.system_index.get(&type_id) {
            Some(&index) => {
                debug!("replacing system {}", system.name());
                self.systems[index] = Some(Box::new(system));
            }
            None => {
                debug!("adding system {}", system.name());
                self.systems.push(Some(Box::new(system)));
                self.system_index.insert(type_id, self.systems.len() - 1);
            }
        }
        self.get_system_mut::<S>()
    }

    /// Looks up a system by type. Returns `None` for the system currently
    /// running.
    pub fn get_system<S: System>(&self) -> Option<&S> {
        let index = *self.system_index.get(&TypeId::of::<S>())?;
        self.systems
            .get(index)?
            .as_ref()?
            .as_any()
            .downcast_ref::<S>()
    }

    pub fn get_system_mut<S: System>(&mut self) -> Option<&mut S> {
        let index = *self.system_index.get(&TypeId::of::<S>())?;
        self.systems
            .get_mut(index)?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<S>()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs one frame: purges queued entities, then runs every system in
    /// insertion order.
    pub fn update(&mut self, dt: f32) {
        self.flush_destroyed();

        let mut index = 0;
        while index < self.systems.len() {
            if let Some(mut system) = self.systems[index].take() {
                self.running_system = Some(index);
                system.update(self, dt);
                self.running_system = None;

                for entity in std::mem::take(&mut self.spawned_during_run) {
                    system.on_entity_added(entity);
                }
                // A replacement registered mid-run wins over the old instance
                if self.systems[index].is_none() {
                    self.systems[index] = Some(system);
                }
            }
            index += 1;
        }
    }

    /// Purges every queued entity now. Called by [`update`](Self::update);
    /// exposed for states that stop running systems but still need the purge.
    pub fn flush_destroyed(&mut self) {
        if self.pending_destroy.is_empty() {
            return;
        }

        for entity in std::mem::take(&mut self.pending_destroy) {
            if !self.alive.remove(&entity) {
                continue;
            }
            for storage in self.storages.values_mut() {
                storage.remove_entity(entity);
            }
            for system in self.systems.iter_mut().flatten() {
                system.on_entity_removed(entity);
            }
            trace!("purged entity {}", entity);
        }

        let alive = &self.alive;
        self.entities.retain(|entity| alive.contains(entity));
    }

    /// Removes every entity and component immediately. Systems, the component
    /// registry and the ID counter are kept, so old handles never come back.
    pub fn clear(&mut self) {
        for &entity in &self.entities {
            for system in self.systems.iter_mut().flatten() {
                system.on_entity_removed(entity);
            }
        }
        debug!("clearing {} entities", self.entities.len());
        self.entities.clear();
        self.alive.clear();
        self.pending_destroy.clear();
        self.storages.clear();
    }

    fn storage<T: Component>(&self) -> Option<&TypedStorage<T>> {
        let id = self.registry.lookup::<T>()?;
        self.storages
            .get(&id)?
            .as_any()
            .downcast_ref::<TypedStorage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut TypedStorage<T>> {
        let id = self.registry.lookup::<T>()?;
        self.storages
            .get_mut(&id)?
            .as_any_mut()
            .downcast_mut::<TypedStorage<T>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);
    impl Component for Label {}

    #[derive(Default)]
    struct CountingSystem {
        updates: u32,
        added: Vec<Entity>,
        removed: Vec<Entity>,
        seen_last_update: usize,
    }

    impl System for CountingSystem {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn update(&mut self, world: &mut EntityManager, _dt: f32) {
            self.updates += 1;
            self.seen_last_update = world.entities_with::<(Position,)>().len();
        }

        fn on_entity_added(&mut self, entity: Entity) {
            self.added.push(entity);
        }

        fn on_entity_removed(&mut self, entity: Entity) {
            self.removed.push(entity);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct SpawningSystem;

    impl System for SpawningSystem {
        fn name(&self) -> &'static str {
            "spawning"
        }

        fn update(&mut self, world: &mut EntityManager, _dt: f32) {
            let e = world.create_entity();
            world.add_component(e, Label("spawned"));
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_ids_are_monotonic_and_start_at_one() {
        let mut world = EntityManager::new();
        let a = world.create_entity();
        let b = world.create_entity();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);

        world.destroy_entity(a);
        world.update(0.0);
        let c = world.create_entity();
        assert_eq!(c.id(), 3);
    }

    #[test]
    fn test_add_component_overwrites() {
        let mut world = EntityManager::new();
        let e = world.create_entity();

        world.add_component(e, Position(1));
        world.add_component(e, Position(2));

        assert_eq!(world.get_component::<Position>(e), Some(&Position(2)));
        assert_eq!(world.component_count::<Position>(), 1);
    }

    #[test]
    fn test_add_component_returns_mutable_handle() {
        let mut world = EntityManager::new();
        let e = world.create_entity();

        if let Some(pos) = world.add_component(e, Position(1)) {
            pos.0 = 10;
        }
        assert_eq!(world.get_component::<Position>(e), Some(&Position(10)));
    }

    #[test]
    fn test_operations_on_invalid_entity_are_noops() {
        let mut world = EntityManager::new();
        let ghost = Entity::from_raw(42);

        assert!(world.add_component(ghost, Position(1)).is_none());
        assert!(world.get_component::<Position>(ghost).is_none());
        assert!(!world.has_component::<Position>(ghost));
        assert!(world.remove_component::<Position>(ghost).is_none());
        world.destroy_entity(ghost);
        world.destroy_entity(Entity::INVALID);
        assert_eq!(world.pending_destroy_count(), 0);
    }

    #[test]
    fn test_deferred_destruction() {
        let mut world = EntityManager::new();
        let e = world.create_entity();
        world.add_component(e, Position(5));

        world.destroy_entity(e);
        world.destroy_entity(e);
        assert_eq!(world.pending_destroy_count(), 1);
        assert!(world.is_valid(e));
        assert_eq!(world.get_component::<Position>(e), Some(&Position(5)));

        world.update(0.016);
        assert!(!world.is_valid(e));
        assert!(world.get_component::<Position>(e).is_none());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_purge_happens_before_systems_run() {
        let mut world = EntityManager::new();
        world.add_system(CountingSystem::default());

        let e = world.create_entity();
        world.add_component(e, Position(0));
        world.update(0.0);
        assert_eq!(
            world.get_system::<CountingSystem>().unwrap().seen_last_update,
            1
        );

        world.destroy_entity(e);
        world.update(0.0);
        let system = world.get_system::<CountingSystem>().unwrap();
        assert_eq!(system.seen_last_update, 0);
        assert_eq!(system.removed, vec![e]);
        assert_eq!(system.added, vec![e]);
    }

    #[test]
    fn test_add_system_returns_the_stored_instance() {
        let mut world = EntityManager::new();
        let system = world.add_system(CountingSystem::default());
        assert!(system.is_some());
        if let Some(system) = system {
            system.updates = 3;
        }

        assert_eq!(world.get_system::<CountingSystem>().unwrap().updates, 3);
        world.update(0.0);
        assert_eq!(world.get_system::<CountingSystem>().unwrap().updates, 4);
    }

    #[test]
    fn test_system_replacement_keeps_one_instance() {
        let mut world = EntityManager::new();
        if let Some(system) = world.add_system(CountingSystem::default()) {
            system.updates = 7;
        }
        world.add_system(CountingSystem::default());

        assert_eq!(world.system_count(), 1);
        assert_eq!(world.get_system::<CountingSystem>().unwrap().updates, 0);
    }

    #[test]
    fn test_entities_spawned_by_systems_are_announced() {
        let mut world = EntityManager::new();
        world.add_system(CountingSystem::default());
        world.add_system(SpawningSystem);

        world.update(0.0);
        assert_eq!(world.entities_with::<(Label,)>().len(), 1);
        assert_eq!(world.get_system::<CountingSystem>().unwrap().added.len(), 1);
        assert!(world.get_system::<SpawningSystem>().is_some());
    }

    #[test]
    fn test_remove_component() {
        let mut world = EntityManager::new();
        let e = world.create_entity();
        world.add_component(e, Label("x"));

        assert_eq!(world.remove_component::<Label>(e), Some(Label("x")));
        assert!(!world.has_component::<Label>(e));
    }

    #[test]
    fn test_clear_keeps_id_counter() {
        let mut world = EntityManager::new();
        let a = world.create_entity();
        world.add_component(a, Position(1));
        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert!(!world.is_valid(a));
        let b = world.create_entity();
        assert!(b > a);
        assert!(world.get_component::<Position>(b).is_none());
    }
}
