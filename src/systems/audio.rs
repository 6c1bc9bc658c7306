//! Sound request collection.

use crate::components::AudioSource;
use crate::ecs::{Entity, EntityManager, System};
use std::any::Any;

/// A sound the presentation layer should play this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundRequest {
    pub entity: Entity,
    pub sound: String,
    pub volume: f32,
}

/// Turns [`AudioSource::play_requested`] flags into a queue of
/// [`SoundRequest`]s. Playback itself happens outside the ECS.
#[derive(Debug, Default)]
pub struct AudioSystem {
    pub muted: bool,
    queue: Vec<SoundRequest>,
}

impl AudioSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a sound not tied to any entity, such as a menu blip.
    pub fn request(&mut self, sound: impl Into<String>, volume: f32) {
        if !self.muted {
            self.queue.push(SoundRequest {
                entity: Entity::INVALID,
                sound: sound.into(),
                volume,
            });
        }
    }

    pub fn pending(&self) -> &[SoundRequest] {
        &self.queue
    }

    pub fn drain_requests(&mut self) -> Vec<SoundRequest> {
        std::mem::take(&mut self.queue)
    }
}

impl System for AudioSystem {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn update(&mut self, world: &mut EntityManager, _dt: f32) {
        for entity in world.entities_with::<(AudioSource,)>() {
            let Some(source) = world.get_component_mut::<AudioSource>(entity) else {
                continue;
            };
            if !source.play_requested {
                continue;
            }
            source.play_requested = false;
            if !self.muted {
                self.queue.push(SoundRequest {
                    entity,
                    sound: source.sound.clone(),
                    volume: source.volume,
                });
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_are_queued_once() {
        let mut world = EntityManager::new();
        world.add_system(AudioSystem::new());
        let e = world.create_entity();
        let mut source = AudioSource::new("assets/sounds/hit.wav", 0.8);
        source.play_requested = true;
        world.add_component(e, source);

        world.update(0.016);
        world.update(0.016);
        let requests = world.get_system_mut::<AudioSystem>().unwrap().drain_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].entity, e);
        assert_eq!(requests[0].volume, 0.8);
    }

    #[test]
    fn test_muted_drops_requests() {
        let mut world = EntityManager::new();
        let mut audio = AudioSystem::new();
        audio.muted = true;
        world.add_system(audio);
        let e = world.create_entity();
        let mut source = AudioSource::new("hit.wav", 1.0);
        source.play_requested = true;
        world.add_component(e, source);

        world.update(0.016);
        let system = world.get_system::<AudioSystem>().unwrap();
        assert!(system.pending().is_empty());
        assert!(!world.get_component::<AudioSource>(e).unwrap().play_requested);
    }
}
