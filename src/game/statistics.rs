//! Run statistics and the events that feed them.

use crate::combat::CombatOutcome;
use serde::{Deserialize, Serialize};

/// Something noteworthy that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BattleStarted { enemies: usize },
    BattleEnded { outcome: CombatOutcome },
    EnemyDefeated { level: u32 },
    DamageDealt { amount: i32 },
    DamageTaken { amount: i32 },
    PickupCollected { score: u32 },
    ScoreGained { points: u32 },
    PartyLevelUp { member: usize, level: u32 },
    PlayerDied,
}

/// Counters for the current run. The score here is what ends up in the
/// high score table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub score: u64,
    pub enemies_defeated: u32,
    pub battles_fought: u32,
    pub battles_won: u32,
    pub battles_fled: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub pickups_collected: u32,
    pub level_ups: u32,
    pub deaths: u32,
    /// Seconds spent in the playing state
    pub play_time: f32,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::BattleStarted { .. } => {
                self.battles_fought += 1;
            }
            GameEvent::BattleEnded { outcome } => match outcome {
                CombatOutcome::Victory => self.battles_won += 1,
                CombatOutcome::Fled => self.battles_fled += 1,
                CombatOutcome::Defeat => {}
            },
            GameEvent::EnemyDefeated { .. } => {
                self.enemies_defeated += 1;
            }
            GameEvent::DamageDealt { amount } => {
                self.damage_dealt += (*amount).max(0) as u64;
            }
            GameEvent::DamageTaken { amount } => {
                self.damage_taken += (*amount).max(0) as u64;
            }
            GameEvent::PickupCollected { score } => {
                self.pickups_collected += 1;
                self.score += *score as u64;
            }
            GameEvent::ScoreGained { points } => {
                self.score += *points as u64;
            }
            GameEvent::PartyLevelUp { .. } => {
                self.level_ups += 1;
            }
            GameEvent::PlayerDied => {
                self.deaths += 1;
            }
        }
    }
}
