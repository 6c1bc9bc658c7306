//! Hit, damage and critical rolls.

use rand::Rng;

/// Result of one attack roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRoll {
    Miss,
    Hit { damage: i32, critical: bool },
}

impl AttackRoll {
    /// Damage dealt, zero on a miss.
    pub fn damage(self) -> i32 {
        match self {
            AttackRoll::Miss => 0,
            AttackRoll::Hit { damage, .. } => damage,
        }
    }
}

/// Inputs for a single damage roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub attack_power: i32,
    pub defense: i32,
    /// Hit chance in percent
    pub accuracy: f32,
    /// Multiplier on attack power, 1.0 for a basic attack
    pub power_multiplier: f32,
    /// Variance band half-width; damage is scaled by `U(1 - v, 1 + v)`
    pub variance: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
}

/// Damage before any random factor: `max(1, attack - defense)`.
///
/// # Examples
///
/// ```
/// use emberfall::combat::base_damage;
///
/// assert_eq!(base_damage(20, 5), 15);
/// assert_eq!(base_damage(3, 10), 1);
/// ```
pub fn base_damage(attack_power: i32, defense: i32) -> i32 {
    (attack_power - defense).max(1)
}

impl DamageRoll {
    /// Rolls accuracy, then variance, then an independent critical hit.
    /// A hit always deals at least 1.
    pub fn roll(&self, rng: &mut impl Rng) -> AttackRoll {
        let accuracy_roll: f32 = rng.gen_range(0.0..100.0);
        if accuracy_roll >= self.accuracy {
            return AttackRoll::Miss;
        }

        let attack = (self.attack_power as f32 * self.power_multiplier).round() as i32;
        let mut damage = base_damage(attack, self.defense) as f32;

        let variance = self.variance.clamp(0.0, 1.0);
        if variance > 0.0 {
            damage *= rng.gen_range((1.0 - variance)..=(1.0 + variance));
        }

        let critical = rng.gen::<f32>() < self.crit_chance;
        if critical {
            damage *= self.crit_multiplier;
        }

        AttackRoll::Hit {
            damage: (damage.round() as i32).max(1),
            critical,
        }
    }
}
