//! AI state machine data.

use crate::ecs::{Component, Entity};
use crate::utils::Vector2;
use serde::{Deserialize, Serialize};

/// States of the enemy AI state machine. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Patrol,
    Chase,
    Attack,
    Flee,
    Search,
    Dead,
}

/// Per-enemy tuning, usually loaded from a character template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    pub detection_radius: f32,
    /// Distance beyond which a chased target counts as lost
    pub lose_target_radius: f32,
    pub attack_range: f32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub flee_speed: f32,
    /// Seconds between attacks while in `Attack`
    pub attack_cooldown: f32,
    /// Seconds spent searching the last known position
    pub search_duration: f32,
    /// Seconds idling before patrolling, when patrol points exist
    pub idle_duration: f32,
    /// Health fraction under which the entity flees
    pub flee_health_threshold: f32,
    pub can_flee: bool,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            detection_radius: 200.0,
            lose_target_radius: 300.0,
            attack_range: 40.0,
            patrol_speed: 50.0,
            chase_speed: 90.0,
            flee_speed: 110.0,
            attack_cooldown: 1.0,
            search_duration: 3.0,
            idle_duration: 2.0,
            flee_health_threshold: 0.3,
            can_flee: true,
        }
    }
}

/// AI state for one entity.
///
/// `target` is a plain handle; resolve it through the
/// [`EntityManager`](crate::EntityManager) every time it is used.
#[derive(Debug, Clone, PartialEq)]
pub struct AiComponent {
    pub state: AiState,
    pub previous_state: AiState,
    pub target: Option<Entity>,
    pub patrol_points: Vec<Vector2>,
    pub patrol_index: usize,
    /// Walking up the patrol list (`true`) or back down it
    pub patrol_forward: bool,
    /// Seconds spent in the current state
    pub state_timer: f32,
    /// `state_timer` value at the last attack
    pub last_attack_time: f32,
    pub last_known_target: Option<Vector2>,
    pub tuning: AiTuning,
}

impl AiComponent {
    pub fn new(tuning: AiTuning) -> Self {
        Self {
            state: AiState::Idle,
            previous_state: AiState::Idle,
            target: None,
            patrol_points: Vec::new(),
            patrol_index: 0,
            patrol_forward: true,
            state_timer: 0.0,
            last_attack_time: 0.0,
            last_known_target: None,
            tuning,
        }
    }

    pub fn with_patrol(mut self, points: Vec<Vector2>) -> Self {
        self.patrol_points = points;
        self
    }

    /// Moves to `next`, resetting the state timer. Leaving `Dead` is refused.
    pub fn change_state(&mut self, next: AiState) {
        if self.state == next || self.state == AiState::Dead {
            return;
        }
        self.previous_state = self.state;
        self.state = next;
        self.state_timer = 0.0;
        self.last_attack_time = 0.0;
    }

    pub fn is_dead(&self) -> bool {
        self.state == AiState::Dead
    }

    /// The current patrol waypoint, if any.
    pub fn current_waypoint(&self) -> Option<Vector2> {
        self.patrol_points.get(self.patrol_index).copied()
    }

    /// Steps to the next waypoint, reversing direction at either end of the
    /// list instead of wrapping around.
    pub fn advance_waypoint(&mut self) {
        let len = self.patrol_points.len();
        if len < 2 {
            self.patrol_index = 0;
            return;
        }
        if self.patrol_forward {
            if self.patrol_index + 1 >= len {
                self.patrol_forward = false;
                self.patrol_index -= 1;
            } else {
                self.patrol_index += 1;
            }
        } else if self.patrol_index == 0 {
            self.patrol_forward = true;
            self.patrol_index = 1;
        } else {
            self.patrol_index -= 1;
        }
    }
}

impl Default for AiComponent {
    fn default() -> Self {
        Self::new(AiTuning::default())
    }
}

impl Component for AiComponent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_ping_pongs() {
        let points = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(20.0, 0.0),
        ];
        let mut ai = AiComponent::default().with_patrol(points);

        let mut visited = vec![ai.patrol_index];
        for _ in 0..6 {
            ai.advance_waypoint();
            visited.push(ai.patrol_index);
        }
        assert_eq!(visited, vec![0, 1, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut ai = AiComponent::default();
        ai.change_state(AiState::Chase);
        ai.state_timer = 4.0;
        ai.change_state(AiState::Dead);
        assert_eq!(ai.previous_state, AiState::Chase);
        assert_eq!(ai.state_timer, 0.0);

        ai.change_state(AiState::Idle);
        assert!(ai.is_dead());
    }
}
