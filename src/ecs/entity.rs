//! Entity handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle identifying an entity.
///
/// IDs are handed out monotonically by the
/// [`EntityManager`](crate::EntityManager) starting at 1 and are never reused,
/// so a handle to a destroyed entity simply stops resolving. `0` is the
/// invalid handle.
///
/// # Examples
///
/// ```
/// use emberfall::Entity;
///
/// assert!(!Entity::INVALID.is_valid());
/// assert!(Entity::from_raw(1) < Entity::from_raw(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    /// The handle that never refers to a live entity.
    pub const INVALID: Entity = Entity(0);

    /// Wraps a raw ID.
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric ID.
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Whether the handle is non-zero. This says nothing about liveness;
    /// ask the manager for that.
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::INVALID
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
