//! Multi-component queries.

use crate::ecs::{Component, Entity, EntityManager};

/// A set of component types an entity must all have.
///
/// Implemented for tuples of one to six component types, so a query reads
/// `world.entities_with::<(Transform, Velocity)>()`.
pub trait ComponentQuery {
    /// Whether `entity` currently has every component in the set.
    fn matches(world: &EntityManager, entity: Entity) -> bool;
}

macro_rules! impl_component_query {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> ComponentQuery for ($($ty,)+) {
            fn matches(world: &EntityManager, entity: Entity) -> bool {
                $(world.has_component::<$ty>(entity))&&+
            }
        }
    };
}

impl_component_query!(A);
impl_component_query!(A, B);
impl_component_query!(A, B, C);
impl_component_query!(A, B, C, D);
impl_component_query!(A, B, C, D, E);
impl_component_query!(A, B, C, D, E, F);
