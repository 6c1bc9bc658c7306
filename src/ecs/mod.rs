//! # ECS Module
//!
//! The entity-component-system runtime the rest of the game is built on.
//!
//! - [`Entity`]: an opaque numeric handle
//! - [`Component`]: plain data stored per entity, keyed by a [`ComponentTypeId`]
//! - [`System`]: behavior run once per frame in registration order
//! - [`EntityManager`]: owns all of the above and handles deferred destruction

pub mod component;
pub mod entity;
pub mod manager;
pub mod query;
pub mod system;

pub use component::{Component, ComponentRegistry, ComponentTypeId};
pub use entity::Entity;
pub use manager::EntityManager;
pub use query::ComponentQuery;
pub use system::System;
