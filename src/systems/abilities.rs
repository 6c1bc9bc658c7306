//! Out-of-combat mana regeneration and cooldown recovery.

use crate::components::Abilities;
use crate::ecs::{EntityManager, System};
use std::any::Any;

/// Regenerates mana and recovers ability cooldowns in real time.
///
/// Cooldowns are counted in combat turns; outside combat one turn passes
/// every `seconds_per_turn`.
#[derive(Debug, Clone)]
pub struct AbilitySystem {
    pub seconds_per_turn: f32,
}

impl Default for AbilitySystem {
    fn default() -> Self {
        Self {
            seconds_per_turn: 1.0,
        }
    }
}

impl System for AbilitySystem {
    fn name(&self) -> &'static str {
        "abilities"
    }

    fn update(&mut self, world: &mut EntityManager, dt: f32) {
        for entity in world.entities_with::<(Abilities,)>() {
            let Some(abilities) = world.get_component_mut::<Abilities>(entity) else {
                continue;
            };

            abilities.regen_accumulator += abilities.mana_regen * dt;
            let whole = abilities.regen_accumulator.floor();
            if whole >= 1.0 {
                abilities.regen_accumulator -= whole;
                abilities.mana = (abilities.mana + whole as i32).min(abilities.max_mana);
            }

            if self.seconds_per_turn > 0.0 {
                abilities.recovery_timer += dt;
                while abilities.recovery_timer >= self.seconds_per_turn {
                    abilities.recovery_timer -= self.seconds_per_turn;
                    abilities.tick_cooldowns();
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
