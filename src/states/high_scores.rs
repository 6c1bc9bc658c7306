//! The high score table screen.

use crate::input::{GameInput, InputFrame};
use crate::rendering::{draw_centered_text, Renderer, BODY_SIZE, HIGHLIGHT, MENU_SIZE, TITLE_SIZE};
use crate::states::{GameContext, GameState, MenuState, StateKind, Transition};
use crate::utils::Rgba;

/// Lists the table. Opened from the menu it pops back; opened after a run
/// it highlights the new entry and continues to the menu.
#[derive(Debug, Default)]
pub struct HighScoresState {
    highlight: Option<usize>,
}

impl HighScoresState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighting(rank: usize) -> Self {
        Self {
            highlight: Some(rank),
        }
    }
}

impl GameState for HighScoresState {
    fn kind(&self) -> StateKind {
        StateKind::HighScores
    }

    fn handle_input(&mut self, input: &InputFrame, _ctx: &mut GameContext) -> Transition {
        if !input.pressed(GameInput::Back) && !input.pressed(GameInput::Confirm) {
            return Transition::None;
        }
        match self.highlight {
            Some(_) => Transition::Switch(Box::new(MenuState::new())),
            None => Transition::Pop,
        }
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) -> Transition {
        Transition::None
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        renderer.clear(Rgba::BLACK);
        let (_, height) = renderer.screen_size();
        draw_centered_text(renderer, "High Scores", height * 0.15, TITLE_SIZE, Rgba::GOLD);

        let entries = ctx.high_scores.entries();
        if entries.is_empty() {
            draw_centered_text(renderer, "No scores yet", height * 0.4, MENU_SIZE, Rgba::GRAY);
        }
        for (rank, entry) in entries.iter().enumerate() {
            let line = format!("{:>2}. {:<16} {:>8}", rank + 1, entry.name, entry.score);
            let color = if self.highlight == Some(rank) { HIGHLIGHT } else { Rgba::WHITE };
            let y = height * 0.27 + rank as f32 * (BODY_SIZE + 10.0);
            draw_centered_text(renderer, &line, y, BODY_SIZE, color);
        }
        draw_centered_text(renderer, "Press Enter to return", height - 40.0, BODY_SIZE, Rgba::GRAY);
    }
}
