//! The pause overlay.

use crate::input::{GameInput, InputFrame};
use crate::rendering::{draw_centered_text, draw_menu, Renderer, TITLE_SIZE};
use crate::states::menu::step_selection;
use crate::states::{GameContext, GameState, MenuState, StateKind, Transition};
use crate::utils::Rgba;

pub const PAUSE_OPTIONS: [&str; 2] = ["Resume", "Quit to Menu"];

/// Drawn over the playing state, which stops updating while paused.
#[derive(Debug, Default)]
pub struct PauseState {
    selected: usize,
}

impl PauseState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameState for PauseState {
    fn kind(&self) -> StateKind {
        StateKind::Pause
    }

    fn handle_input(&mut self, input: &InputFrame, _ctx: &mut GameContext) -> Transition {
        if input.pressed(GameInput::Back) || input.pressed(GameInput::Pause) {
            return Transition::Pop;
        }
        self.selected = step_selection(self.selected, PAUSE_OPTIONS.len(), input);
        if !input.pressed(GameInput::Confirm) {
            return Transition::None;
        }
        match self.selected {
            0 => Transition::Pop,
            _ => Transition::Switch(Box::new(MenuState::new())),
        }
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) -> Transition {
        Transition::None
    }

    fn render(&self, _ctx: &GameContext, renderer: &mut dyn Renderer) {
        let (width, height) = renderer.screen_size();
        renderer.draw_rect(0.0, 0.0, width, height, Rgba::BLACK.with_alpha(160));
        draw_centered_text(renderer, "Paused", height * 0.35, TITLE_SIZE, Rgba::WHITE);
        draw_menu(renderer, &PAUSE_OPTIONS, self.selected, height * 0.5);
    }

    fn is_overlay(&self) -> bool {
        true
    }
}
