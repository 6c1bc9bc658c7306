//! Victory rewards.

use serde::{Deserialize, Serialize};

/// Experience granted per level of each defeated enemy.
pub const EXPERIENCE_PER_ENEMY_LEVEL: u32 = 25;
/// Score granted per level of each defeated enemy.
pub const SCORE_PER_ENEMY_LEVEL: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rewards {
    pub experience: u32,
    pub score: u32,
}

impl Rewards {
    /// Rewards for defeating enemies of the given levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::combat::Rewards;
    ///
    /// let rewards = Rewards::for_defeated(&[1, 3]);
    /// assert_eq!(rewards.experience, 100);
    /// assert_eq!(rewards.score, 400);
    /// ```
    pub fn for_defeated(levels: &[u32]) -> Self {
        levels.iter().fold(Rewards::default(), |total, &level| {
            let level = level.max(1);
            Rewards {
                experience: total
                    .experience
                    .saturating_add(EXPERIENCE_PER_ENEMY_LEVEL.saturating_mul(level)),
                score: total.score.saturating_add(SCORE_PER_ENEMY_LEVEL.saturating_mul(level)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_zero_counts_as_one() {
        let rewards = Rewards::for_defeated(&[0]);
        assert_eq!(rewards.experience, EXPERIENCE_PER_ENEMY_LEVEL);
        assert_eq!(rewards.score, SCORE_PER_ENEMY_LEVEL);
    }

    #[test]
    fn test_huge_levels_saturate() {
        let rewards = Rewards::for_defeated(&[u32::MAX, u32::MAX / 2, 7]);
        assert_eq!(rewards.experience, u32::MAX);
        assert_eq!(rewards.score, u32::MAX);
    }
}
