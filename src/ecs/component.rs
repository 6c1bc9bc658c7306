//! Component marker trait, type registry and typed storage.

use crate::ecs::Entity;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Marker for plain data that can be attached to an entity.
///
/// Components carry no behavior; systems read and write them through the
/// [`EntityManager`](crate::EntityManager).
pub trait Component: Any {}

/// Numeric ID assigned to a component type the first time the manager sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTypeId(pub u32);

/// Maps Rust types to sequential [`ComponentTypeId`]s.
///
/// IDs are per registry, so two managers may number the same type differently.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentTypeId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID for `T`, assigning the next free one on first use.
    pub fn id_of<T: Component>(&mut self) -> ComponentTypeId {
        let next = ComponentTypeId(self.names.len() as u32);
        let names = &mut self.names;
        *self.ids.entry(TypeId::of::<T>()).or_insert_with(|| {
            names.push(std::any::type_name::<T>());
            next
        })
    }

    /// Returns the ID for `T` only if it has been registered.
    pub fn lookup<T: Component>(&self) -> Option<ComponentTypeId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Type name recorded for an ID, for diagnostics.
    pub fn name(&self, id: ComponentTypeId) -> Option<&'static str> {
        self.names.get(id.0 as usize).copied()
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Type-erased view over one component type's storage.
pub(crate) trait ComponentStorage {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Entity-keyed map holding every instance of one component type.
pub(crate) struct TypedStorage<T> {
    pub(crate) items: HashMap<Entity, T>,
}

impl<T> TypedStorage<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<T: Component> ComponentStorage for TypedStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.items.remove(&entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.items.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    impl Component for Marker {}

    struct Other;
    impl Component for Other {}

    #[test]
    fn test_ids_assigned_on_first_use() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.lookup::<Marker>().is_none());

        let first = registry.id_of::<Marker>();
        let second = registry.id_of::<Other>();
        assert_eq!(first, ComponentTypeId(0));
        assert_eq!(second, ComponentTypeId(1));

        // Stable on repeat lookups
        assert_eq!(registry.id_of::<Marker>(), first);
        assert_eq!(registry.lookup::<Other>(), Some(second));
        assert_eq!(registry.len(), 2);
        assert!(registry.name(first).unwrap().ends_with("Marker"));
    }
}
