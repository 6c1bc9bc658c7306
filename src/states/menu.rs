//! The title screen.

use crate::input::{GameInput, InputFrame};
use crate::rendering::{draw_centered_text, draw_menu, Renderer, BODY_SIZE, TITLE_SIZE};
use crate::states::{
    CustomizationState, GameContext, GameState, HighScoresState, PlayingState, StateKind,
    Transition,
};
use crate::utils::Rgba;

pub const MENU_OPTIONS: [&str; 4] = ["New Game", "Customize", "High Scores", "Quit"];

/// Moves a menu cursor up or down, wrapping at both ends.
pub fn step_selection(selected: usize, len: usize, input: &InputFrame) -> usize {
    if len == 0 {
        return 0;
    }
    let mut selected = selected % len;
    if input.pressed(GameInput::Up) {
        selected = (selected + len - 1) % len;
    }
    if input.pressed(GameInput::Down) {
        selected = (selected + 1) % len;
    }
    selected
}

#[derive(Debug, Default)]
pub struct MenuState {
    selected: usize,
}

impl MenuState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }
}

impl GameState for MenuState {
    fn kind(&self) -> StateKind {
        StateKind::Menu
    }

    fn handle_input(&mut self, input: &InputFrame, _ctx: &mut GameContext) -> Transition {
        self.selected = step_selection(self.selected, MENU_OPTIONS.len(), input);
        if input.pressed(GameInput::Back) {
            return Transition::Quit;
        }
        if !input.pressed(GameInput::Confirm) {
            return Transition::None;
        }
        match self.selected {
            0 => Transition::Switch(Box::new(PlayingState::new())),
            1 => Transition::Push(Box::new(CustomizationState::new())),
            2 => Transition::Push(Box::new(HighScoresState::new())),
            _ => Transition::Quit,
        }
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) -> Transition {
        Transition::None
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        renderer.clear(Rgba::BLACK);
        let (_, height) = renderer.screen_size();
        draw_centered_text(renderer, "EMBERFALL", height * 0.25, TITLE_SIZE, Rgba::GOLD);
        draw_menu(renderer, &MENU_OPTIONS, self.selected, height * 0.45);

        let footer = match ctx.high_scores.best() {
            Some(best) => format!("Best: {} by {}", best.score, best.name),
            None => format!("Playing as {}", ctx.customization.player_name()),
        };
        draw_centered_text(renderer, &footer, height - 40.0, BODY_SIZE, Rgba::GRAY);
    }
}
