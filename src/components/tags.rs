//! Identity and role components.

use crate::ecs::Component;
use serde::{Deserialize, Serialize};

/// Broad category of an entity, used by target acquisition and collision
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Enemy,
    Npc,
    Pickup,
    Projectile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub EntityKind);

impl Tag {
    pub fn is(&self, kind: EntityKind) -> bool {
        self.0 == kind
    }
}

impl Component for Tag {}

/// Display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Component for Name {}

/// Marks the entity steered by player input.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerController {
    /// Index of the party member this entity represents
    pub party_slot: usize,
}

impl Component for PlayerController {}

/// Collectible that heals and scores when the player touches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub heal: i32,
    pub score: u32,
}

impl Component for Pickup {}
