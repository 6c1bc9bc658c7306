//! Frame animation clocks.

use crate::components::Animation;
use crate::ecs::{EntityManager, System};
use std::any::Any;

#[derive(Debug, Clone, Default)]
pub struct AnimationSystem;

impl System for AnimationSystem {
    fn name(&self) -> &'static str {
        "animation"
    }

    fn update(&mut self, world: &mut EntityManager, dt: f32) {
        for entity in world.entities_with::<(Animation,)>() {
            let Some(animation) = world.get_component_mut::<Animation>(entity) else {
                continue;
            };
            if !animation.playing || animation.frame_time <= 0.0 {
                continue;
            }

            animation.timer += dt;
            while animation.timer >= animation.frame_time {
                animation.timer -= animation.frame_time;
                if animation.current_frame + 1 < animation.frame_count {
                    animation.current_frame += 1;
                } else if animation.looping {
                    animation.current_frame = 0;
                } else {
                    animation.finished = true;
                    animation.playing = false;
                    break;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looping_wraps() {
        let mut world = EntityManager::new();
        world.add_system(AnimationSystem);
        let e = world.create_entity();
        world.add_component(e, Animation::new(3, 0.25, true));

        world.update(0.75);
        assert_eq!(world.get_component::<Animation>(e).unwrap().current_frame, 0);
        world.update(0.25);
        assert_eq!(world.get_component::<Animation>(e).unwrap().current_frame, 1);
    }

    #[test]
    fn test_one_shot_stops_on_last_frame() {
        let mut world = EntityManager::new();
        world.add_system(AnimationSystem);
        let e = world.create_entity();
        world.add_component(e, Animation::new(2, 0.5, false));

        world.update(3.0);
        let animation = world.get_component::<Animation>(e).unwrap();
        assert_eq!(animation.current_frame, 1);
        assert!(animation.finished);
        assert!(!animation.playing);
    }
}
