//! Character customization: name, class and color.

use crate::input::{GameInput, InputFrame};
use crate::rendering::{draw_centered_text, draw_panel, Renderer, BODY_SIZE, HIGHLIGHT, MENU_SIZE, TITLE_SIZE};
use crate::states::menu::step_selection;
use crate::states::{GameContext, GameState, StateKind, Transition};
use crate::utils::Rgba;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomizationField {
    Name,
    Class,
    Tint,
    Done,
}

const FIELDS: [CustomizationField; 4] = [
    CustomizationField::Name,
    CustomizationField::Class,
    CustomizationField::Tint,
    CustomizationField::Done,
];

/// Edits the [`CustomizationManager`](crate::game::CustomizationManager) in
/// the context. Typed characters always go to the name; Up and Down move
/// between fields, Left and Right cycle the class or color.
#[derive(Debug, Default)]
pub struct CustomizationState {
    field: usize,
}

impl CustomizationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self) -> CustomizationField {
        FIELDS[self.field % FIELDS.len()]
    }
}

impl GameState for CustomizationState {
    fn kind(&self) -> StateKind {
        StateKind::Customization
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        info!(
            "Customized: {} ({})",
            ctx.customization.final_name(),
            ctx.customization.selected_class().unwrap_or("none")
        );
    }

    fn handle_input(&mut self, input: &InputFrame, ctx: &mut GameContext) -> Transition {
        for &c in &input.text {
            ctx.customization.push_char(c);
        }
        if input.pressed(GameInput::Backspace) {
            ctx.customization.pop_char();
        }
        if input.pressed(GameInput::Back) {
            return Transition::Pop;
        }

        self.field = step_selection(self.field, FIELDS.len(), input);
        let left = input.pressed(GameInput::Left);
        let right = input.pressed(GameInput::Right);
        match self.field() {
            CustomizationField::Class if left => ctx.customization.previous_class(),
            CustomizationField::Class if right => ctx.customization.next_class(),
            CustomizationField::Tint if left => ctx.customization.previous_tint(),
            CustomizationField::Tint if right => ctx.customization.next_tint(),
            CustomizationField::Done if input.pressed(GameInput::Confirm) => {
                return Transition::Pop;
            }
            _ => {}
        }
        Transition::None
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) -> Transition {
        Transition::None
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        renderer.clear(Rgba::BLACK);
        let (width, height) = renderer.screen_size();
        draw_centered_text(renderer, "Customize", height * 0.15, TITLE_SIZE, Rgba::GOLD);
        draw_panel(renderer, width * 0.25, height * 0.25, width * 0.5, height * 0.5);

        let custom = &ctx.customization;
        let class = custom
            .selected_class()
            .and_then(|id| ctx.templates.get(id).map(|t| t.name.as_str()))
            .unwrap_or("-");
        let rows = [
            format!("Name: {}_", custom.player_name()),
            format!("Class: < {} >", class),
            "Color: <     >".to_string(),
            "Done".to_string(),
        ];
        for (index, row) in rows.iter().enumerate() {
            let y = height * 0.35 + index as f32 * (MENU_SIZE + 16.0);
            let color = if index == self.field { HIGHLIGHT } else { Rgba::WHITE };
            draw_centered_text(renderer, row, y, MENU_SIZE, color);
        }

        let swatch_y = height * 0.35 + 2.0 * (MENU_SIZE + 16.0) - MENU_SIZE * 0.7;
        renderer.draw_rect(width / 2.0 + 10.0, swatch_y, 30.0, MENU_SIZE * 0.7, custom.tint());

        if let Some(template) = custom.selected_class().and_then(|id| ctx.templates.get(id)) {
            let summary = format!(
                "HP {}  ATK {}  DEF {}  SPD {}",
                template.max_health,
                template.stats.attack_power,
                template.stats.defense,
                template.stats.initiative
            );
            draw_centered_text(renderer, &summary, height * 0.7, BODY_SIZE, Rgba::GRAY);
        }
    }

    fn wants_text_input(&self) -> bool {
        true
    }
}
