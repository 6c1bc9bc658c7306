//! Per-frame input snapshots.

use crate::utils::Vector2;

/// Discrete inputs game states react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameInput {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    /// Escape: leave the current screen, or pause while playing
    Back,
    Pause,
    Backspace,
}

/// Everything the player did this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    /// Held movement direction, normalized or zero
    pub movement: Vector2,
    /// Inputs pressed this frame, in polling order
    pub actions: Vec<GameInput>,
    /// Characters typed this frame
    pub text: Vec<char>,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame with a single pressed input.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::input::{GameInput, InputFrame};
    ///
    /// let frame = InputFrame::pressed_once(GameInput::Confirm);
    /// assert!(frame.pressed(GameInput::Confirm));
    /// assert!(!frame.pressed(GameInput::Back));
    /// ```
    pub fn pressed_once(input: GameInput) -> Self {
        Self {
            actions: vec![input],
            ..Self::default()
        }
    }

    pub fn with_movement(movement: Vector2) -> Self {
        Self {
            movement: movement.normalized(),
            ..Self::default()
        }
    }

    pub fn typed(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            ..Self::default()
        }
    }

    pub fn pressed(&self, input: GameInput) -> bool {
        self.actions.contains(&input)
    }

    pub fn is_empty(&self) -> bool {
        self.movement == Vector2::ZERO && self.actions.is_empty() && self.text.is_empty()
    }
}
