//! # Input Module
//!
//! Keyboard polling. [`InputHandler`] reads macroquad's keyboard state once
//! per frame and turns it into an [`InputFrame`] that game states consume.

pub mod frame;

pub use frame::{GameInput, InputFrame};

use crate::utils::Vector2;
use macroquad::prelude::*;

/// Polls the keyboard.
pub struct InputHandler {
    /// Whether WASD also moves, in addition to the arrow keys
    pub wasd_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self { wasd_enabled: true }
    }

    /// Reads this frame's input.
    ///
    /// With `text_entry` set, letters are delivered as typed text only, so
    /// typing a name never triggers movement or menu shortcuts.
    pub fn poll(&self, text_entry: bool) -> InputFrame {
        let letters = self.wasd_enabled && !text_entry;
        let mut frame = InputFrame::new();

        let held = |arrow: KeyCode, letter: KeyCode| {
            is_key_down(arrow) || (letters && is_key_down(letter))
        };
        let mut movement = Vector2::ZERO;
        if held(KeyCode::Up, KeyCode::W) {
            movement.y -= 1.0;
        }
        if held(KeyCode::Down, KeyCode::S) {
            movement.y += 1.0;
        }
        if held(KeyCode::Left, KeyCode::A) {
            movement.x -= 1.0;
        }
        if held(KeyCode::Right, KeyCode::D) {
            movement.x += 1.0;
        }
        frame.movement = movement.normalized();

        let pressed = |arrow: KeyCode, letter: KeyCode| {
            is_key_pressed(arrow) || (letters && is_key_pressed(letter))
        };
        let bindings = [
            (pressed(KeyCode::Up, KeyCode::W), GameInput::Up),
            (pressed(KeyCode::Down, KeyCode::S), GameInput::Down),
            (pressed(KeyCode::Left, KeyCode::A), GameInput::Left),
            (pressed(KeyCode::Right, KeyCode::D), GameInput::Right),
            (
                is_key_pressed(KeyCode::Enter) || (!text_entry && is_key_pressed(KeyCode::Space)),
                GameInput::Confirm,
            ),
            (is_key_pressed(KeyCode::Escape), GameInput::Back),
            (!text_entry && is_key_pressed(KeyCode::P), GameInput::Pause),
            (is_key_pressed(KeyCode::Backspace), GameInput::Backspace),
        ];
        frame.actions = bindings
            .into_iter()
            .filter(|(down, _)| *down)
            .map(|(_, input)| input)
            .collect();

        while let Some(c) = get_char_pressed() {
            if text_entry && !c.is_control() {
                frame.text.push(c);
            }
        }

        frame
    }
}
