//! Health, combat statistics, abilities and status effects.

use crate::ecs::Component;
use serde::{Deserialize, Serialize};

/// Hit points plus the bookkeeping the health system needs around death.
#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
    /// Set by the health system once `current` reaches zero
    pub dead: bool,
    /// Seconds of immunity to real-time hits left
    pub invulnerable_timer: f32,
    /// Seconds a dead non-player entity lingers before it is destroyed
    pub despawn_delay: f32,
}

impl Health {
    /// Full health with the given maximum.
    pub fn new(max: i32) -> Self {
        Self {
            current: max,
            max,
            dead: false,
            invulnerable_timer: 0.0,
            despawn_delay: 1.0,
        }
    }

    /// Current health as a fraction of the maximum, in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            return 0.0;
        }
        (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
    }

    pub fn is_dead(&self) -> bool {
        self.dead || self.current <= 0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    /// Subtracts `amount`, never going below zero. Returns the damage
    /// actually dealt.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.current = (self.current - amount.max(0)).max(0);
        before - self.current
    }

    /// Adds `amount`, never exceeding the maximum. Dead entities cannot heal.
    /// Returns the health actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.is_dead() {
            return 0;
        }
        let before = self.current;
        self.current = (self.current + amount.max(0)).min(self.max);
        self.current - before
    }
}

impl Component for Health {}

/// Offensive and defensive numbers used by combat and movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub attack_power: i32,
    pub defense: i32,
    /// Hit chance in percent, compared against a roll in `[0, 100)`
    pub accuracy: f32,
    pub initiative: i32,
    /// Probability in `[0, 1]`
    pub crit_chance: f32,
    pub level: u32,
    pub move_speed: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            attack_power: 10,
            defense: 2,
            accuracy: 90.0,
            initiative: 50,
            crit_chance: 0.05,
            level: 1,
            move_speed: 120.0,
        }
    }
}

impl Component for Stats {}

/// A combat ability usable in place of a basic attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    /// Multiplier applied to attack power
    #[serde(default = "default_power")]
    pub power_multiplier: f32,
    #[serde(default)]
    pub mana_cost: i32,
    /// Turns before the ability can be used again
    #[serde(default)]
    pub cooldown_turns: u32,
    #[serde(skip)]
    pub remaining_cooldown: u32,
    /// Applied to the target when the ability lands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_hit: Option<OnHitEffect>,
}

fn default_power() -> f32 {
    1.5
}

impl Ability {
    pub fn new(name: impl Into<String>, power_multiplier: f32, mana_cost: i32, cooldown_turns: u32) -> Self {
        Self {
            name: name.into(),
            power_multiplier,
            mana_cost,
            cooldown_turns,
            remaining_cooldown: 0,
            on_hit: None,
        }
    }

    pub fn with_effect(mut self, kind: StatusKind, magnitude: f32, duration: f32) -> Self {
        self.on_hit = Some(OnHitEffect {
            kind,
            magnitude,
            duration,
        });
        self
    }

    pub fn is_ready(&self) -> bool {
        self.remaining_cooldown == 0
    }
}

/// The abilities an entity knows and the mana pool they draw from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Abilities {
    pub list: Vec<Ability>,
    pub mana: i32,
    pub max_mana: i32,
    /// Mana restored per second outside combat
    pub mana_regen: f32,
    pub(crate) regen_accumulator: f32,
    pub(crate) recovery_timer: f32,
}

impl Abilities {
    pub fn new(list: Vec<Ability>, max_mana: i32, mana_regen: f32) -> Self {
        Self {
            list,
            mana: max_mana,
            max_mana,
            mana_regen,
            regen_accumulator: 0.0,
            recovery_timer: 0.0,
        }
    }

    /// Whether ability `index` exists, is off cooldown and is affordable.
    pub fn can_use(&self, index: usize) -> bool {
        self.list
            .get(index)
            .map(|ability| ability.is_ready() && ability.mana_cost <= self.mana)
            .unwrap_or(false)
    }

    /// Spends mana and starts the cooldown. Returns the used ability, or
    /// `None` if it could not be used.
    pub fn use_ability(&mut self, index: usize) -> Option<Ability> {
        if !self.can_use(index) {
            return None;
        }
        let ability = &mut self.list[index];
        self.mana -= ability.mana_cost;
        ability.remaining_cooldown = ability.cooldown_turns;
        Some(ability.clone())
    }

    /// Counts every cooldown down by one turn.
    pub fn tick_cooldowns(&mut self) {
        for ability in &mut self.list {
            ability.remaining_cooldown = ability.remaining_cooldown.saturating_sub(1);
        }
    }
}

impl Component for Abilities {}

/// Kinds of timed status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Loses `magnitude` health per second
    Poison,
    /// Regains `magnitude` health per second
    Regeneration,
    /// Cannot move
    Stun,
    /// Moves faster
    Haste,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub magnitude: f32,
    pub remaining: f32,
    pub(crate) tick_accumulator: f32,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, magnitude: f32, duration: f32) -> Self {
        Self {
            kind,
            magnitude,
            remaining: duration,
            tick_accumulator: 0.0,
        }
    }
}

/// A status effect as written in character templates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnHitEffect {
    pub kind: StatusKind,
    #[serde(default)]
    pub magnitude: f32,
    /// Seconds; one combat turn counts as one second
    pub duration: f32,
}

impl OnHitEffect {
    pub fn to_effect(self) -> StatusEffect {
        StatusEffect::new(self.kind, self.magnitude, self.duration)
    }
}

/// Active status effects. At most one effect per kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusEffects {
    pub active: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Adds an effect, refreshing the existing one of the same kind.
    pub fn apply(&mut self, effect: StatusEffect) {
        match self.active.iter_mut().find(|e| e.kind == effect.kind) {
            Some(existing) => {
                existing.magnitude = existing.magnitude.max(effect.magnitude);
                existing.remaining = existing.remaining.max(effect.remaining);
            }
            None => self.active.push(effect),
        }
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    pub fn is_stunned(&self) -> bool {
        self.has(StatusKind::Stun)
    }

    pub fn is_hasted(&self) -> bool {
        self.has(StatusKind::Haste)
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Runs every effect down by `dt` seconds and drops the expired ones.
    /// Poison and regeneration fire once per whole elapsed second; the
    /// returned value is the net health change they produced.
    pub fn advance(&mut self, dt: f32) -> i32 {
        let mut health_delta = 0.0;
        for effect in &mut self.active {
            let elapsed = dt.min(effect.remaining.max(0.0));
            effect.remaining -= dt;

            if matches!(effect.kind, StatusKind::Poison | StatusKind::Regeneration) {
                effect.tick_accumulator += elapsed;
                while effect.tick_accumulator >= 1.0 {
                    effect.tick_accumulator -= 1.0;
                    health_delta += match effect.kind {
                        StatusKind::Poison => -effect.magnitude,
                        _ => effect.magnitude,
                    };
                }
            }
        }
        self.active.retain(|effect| effect.remaining > 0.0);
        health_delta.round() as i32
    }
}

/// Applies a net health change from [`StatusEffects::advance`].
pub fn apply_health_delta(health: &mut Health, delta: i32) {
    if delta < 0 {
        health.apply_damage(-delta);
    } else if delta > 0 {
        health.heal(delta);
    }
}

impl Component for StatusEffects {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_and_heal_clamp() {
        let mut health = Health::new(50);
        assert_eq!(health.apply_damage(80), 50);
        assert_eq!(health.current, 0);
        assert!(health.is_dead());
        assert_eq!(health.heal(10), 0);

        let mut health = Health::new(50);
        health.apply_damage(20);
        assert_eq!(health.heal(100), 20);
        assert_eq!(health.fraction(), 1.0);
    }

    #[test]
    fn test_ability_cooldown_and_mana() {
        let mut abilities = Abilities::new(vec![Ability::new("Fireball", 2.0, 10, 2)], 15, 1.0);

        assert!(abilities.use_ability(0).is_some());
        assert_eq!(abilities.mana, 5);
        assert!(!abilities.can_use(0));

        abilities.tick_cooldowns();
        abilities.tick_cooldowns();
        // Off cooldown but too expensive now
        assert!(abilities.list[0].is_ready());
        assert!(abilities.use_ability(0).is_none());
        assert!(abilities.use_ability(3).is_none());
    }

    #[test]
    fn test_status_effects_refresh_instead_of_stacking() {
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::new(StatusKind::Poison, 2.0, 3.0));
        effects.apply(StatusEffect::new(StatusKind::Poison, 1.0, 5.0));

        assert_eq!(effects.active.len(), 1);
        assert_eq!(effects.active[0].magnitude, 2.0);
        assert_eq!(effects.active[0].remaining, 5.0);
        assert!(!effects.is_stunned());
    }

    #[test]
    fn test_advance_expires_short_stun_and_ticks_poison() {
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::new(StatusKind::Stun, 1.0, 0.5));
        effects.apply(StatusEffect::new(StatusKind::Poison, 4.0, 3.0));

        assert_eq!(effects.advance(1.0), -4);
        assert!(!effects.is_stunned());
        assert!(effects.has(StatusKind::Poison));
    }

    #[test]
    fn test_ability_on_hit_reads_from_toml() {
        let ability: Ability = toml::from_str(
            r#"
            name = "Frost Lance"
            on_hit = { kind = "Stun", duration = 1.0 }
            "#,
        )
        .unwrap();

        let effect = ability.on_hit.unwrap().to_effect();
        assert_eq!(effect.kind, StatusKind::Stun);
        assert_eq!(effect.remaining, 1.0);
        assert_eq!(effect.magnitude, 0.0);

        let plain: Ability = toml::from_str(r#"name = "Cleave""#).unwrap();
        assert!(plain.on_hit.is_none());
    }
}
