//! Builds entities from character templates.

use crate::components::{
    Abilities, AiComponent, Animation, AudioSource, Collider, EntityKind, Health, Name, Pickup,
    PlayerController, Sprite, StatusEffects, Tag, Transform, Velocity,
};
use crate::config::CharacterTemplate;
use crate::ecs::{Entity, EntityManager};
use crate::game::PartyMember;
use crate::utils::{Rgba, Vector2};
use log::debug;

pub const PICKUP_SIZE: f32 = 16.0;

/// Enemy scaling for the `gameplay.difficulty` setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    pub health_scale: f32,
    pub attack_scale: f32,
}

impl Difficulty {
    pub const NORMAL: Difficulty = Difficulty {
        health_scale: 1.0,
        attack_scale: 1.0,
    };

    /// Parses `easy`, `normal` or `hard`; anything else is normal.
    pub fn from_name(name: &str) -> Self {
        match name {
            "easy" => Difficulty {
                health_scale: 0.75,
                attack_scale: 0.8,
            },
            "hard" => Difficulty {
                health_scale: 1.5,
                attack_scale: 1.25,
            },
            _ => Self::NORMAL,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Spawns players, enemies and pickups with every component they need.
#[derive(Debug, Clone, Default)]
pub struct EntityFactory {
    pub difficulty: Difficulty,
}

impl EntityFactory {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// Spawns the entity for party member `slot`, carrying over its level,
    /// stats and current health.
    pub fn spawn_player(
        &self,
        world: &mut EntityManager,
        template: &CharacterTemplate,
        member: &PartyMember,
        slot: usize,
        position: Vector2,
        tint: Rgba,
    ) -> Entity {
        let entity = self.spawn_body(world, template, position, tint);

        let mut health = Health::new(member.max_health);
        health.current = member.current_health.clamp(0, member.max_health);
        world.add_component(entity, health);
        world.add_component(entity, member.stats.clone());
        world.add_component(entity, Tag(EntityKind::Player));
        world.add_component(entity, Name(member.name.clone()));
        world.add_component(entity, PlayerController { party_slot: slot });

        debug!("spawned player {} ({}) at {:?}", entity, member.name, position);
        entity
    }

    /// Spawns an enemy scaled by the current difficulty. Non-empty
    /// `patrol` points make it patrol when idle.
    pub fn spawn_enemy(
        &self,
        world: &mut EntityManager,
        template: &CharacterTemplate,
        position: Vector2,
        patrol: Vec<Vector2>,
    ) -> Entity {
        let entity = self.spawn_body(world, template, position, template.color);

        let max_health = ((template.max_health as f32) * self.difficulty.health_scale)
            .round()
            .max(1.0) as i32;
        let mut stats = template.stats.clone();
        stats.attack_power =
            ((stats.attack_power as f32) * self.difficulty.attack_scale).round() as i32;

        world.add_component(entity, Health::new(max_health));
        world.add_component(entity, stats);
        world.add_component(entity, Tag(template.kind));
        world.add_component(entity, Name(template.name.clone()));
        world.add_component(entity, AiComponent::new(template.ai.clone()).with_patrol(patrol));

        debug!("spawned {} {} at {:?}", template.name, entity, position);
        entity
    }

    pub fn spawn_pickup(
        &self,
        world: &mut EntityManager,
        position: Vector2,
        heal: i32,
        score: u32,
    ) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, Transform::at(position));
        world.add_component(entity, Collider::trigger(PICKUP_SIZE, PICKUP_SIZE));
        world.add_component(
            entity,
            Sprite::new(None, Rgba::GOLD, PICKUP_SIZE, PICKUP_SIZE),
        );
        world.add_component(entity, Animation::new(4, 0.2, true));
        world.add_component(entity, Tag(EntityKind::Pickup));
        world.add_component(entity, Pickup { heal, score });
        entity
    }

    /// Components shared by every character.
    fn spawn_body(
        &self,
        world: &mut EntityManager,
        template: &CharacterTemplate,
        position: Vector2,
        tint: Rgba,
    ) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, Transform::at(position));
        world.add_component(entity, Velocity::default());
        world.add_component(entity, Collider::new(template.width, template.height));
        world.add_component(
            entity,
            Abilities::new(template.abilities.clone(), template.max_mana, template.mana_regen),
        );
        world.add_component(entity, StatusEffects::default());
        world.add_component(
            entity,
            Sprite::new(template.texture.clone(), tint, template.width, template.height),
        );
        world.add_component(
            entity,
            Animation::new(template.animation_frames, template.frame_time, true),
        );
        if let Some(sound) = &template.attack_sound {
            world.add_component(entity, AudioSource::new(sound.clone(), 1.0));
        }
        entity
    }
}
