//! The end-of-run screen.

use crate::game::{now_timestamp, GameEvent};
use crate::input::{GameInput, InputFrame};
use crate::rendering::{draw_centered_text, Renderer, BODY_SIZE, MENU_SIZE, TITLE_SIZE};
use crate::states::{GameContext, GameState, HighScoresState, MenuState, StateKind, Transition};
use crate::utils::Rgba;
use log::info;

/// Shown when the party is wiped out. Entering records the run's score.
#[derive(Debug, Default)]
pub struct GameOverState {
    rank: Option<usize>,
    score: u64,
}

impl GameOverState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank the run reached in the high score table, if any.
    pub fn rank(&self) -> Option<usize> {
        self.rank
    }
}

impl GameState for GameOverState {
    fn kind(&self) -> StateKind {
        StateKind::GameOver
    }

    fn on_enter(&mut self, ctx: &mut GameContext) -> crate::GameResult<()> {
        ctx.record_event(GameEvent::PlayerDied);
        self.score = ctx.statistics.score;
        let name = ctx.customization.final_name();
        self.rank = ctx.high_scores.insert(&name, self.score, now_timestamp());
        if let Some(rank) = self.rank {
            info!("{} placed #{} with {} points", name, rank + 1, self.score);
            ctx.save_high_scores();
        }
        ctx.world.clear();
        ctx.party.detach_entities();
        Ok(())
    }

    fn handle_input(&mut self, input: &InputFrame, _ctx: &mut GameContext) -> Transition {
        if input.pressed(GameInput::Confirm) {
            return match self.rank {
                Some(rank) => Transition::Switch(Box::new(HighScoresState::highlighting(rank))),
                None => Transition::Switch(Box::new(MenuState::new())),
            };
        }
        if input.pressed(GameInput::Back) {
            return Transition::Switch(Box::new(MenuState::new()));
        }
        Transition::None
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) -> Transition {
        Transition::None
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        renderer.clear(Rgba::BLACK);
        let (_, height) = renderer.screen_size();
        let stats = &ctx.statistics;
        draw_centered_text(renderer, "Game Over", height * 0.25, TITLE_SIZE, Rgba::RED);
        draw_centered_text(renderer, &format!("Score: {}", self.score), height * 0.4, MENU_SIZE, Rgba::GOLD);

        let lines = [
            format!("Enemies defeated: {}", stats.enemies_defeated),
            format!("Battles won: {} of {}", stats.battles_won, stats.battles_fought),
            format!("Damage dealt: {}", stats.damage_dealt),
            format!("Time: {:.0}s", stats.play_time),
        ];
        for (index, line) in lines.iter().enumerate() {
            let y = height * 0.5 + index as f32 * (BODY_SIZE + 8.0);
            draw_centered_text(renderer, line, y, BODY_SIZE, Rgba::WHITE);
        }
        if let Some(rank) = self.rank {
            let line = format!("New high score! Rank #{}", rank + 1);
            draw_centered_text(renderer, &line, height * 0.8, MENU_SIZE, Rgba::GOLD);
        }
        draw_centered_text(renderer, "Press Enter to continue", height - 40.0, BODY_SIZE, Rgba::GRAY);
    }
}
