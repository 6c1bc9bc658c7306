//! # User Interface Elements
//!
//! Menus, panels, bars and the world view, drawn through any [`Renderer`].

use crate::components::{Health, Sprite, Transform};
use crate::ecs::EntityManager;
use crate::rendering::Renderer;
use crate::utils::Rgba;

pub const TITLE_SIZE: f32 = 48.0;
pub const MENU_SIZE: f32 = 28.0;
pub const BODY_SIZE: f32 = 20.0;

pub const PANEL_COLOR: Rgba = Rgba::rgb(20, 20, 30).with_alpha(220);
pub const HIGHLIGHT: Rgba = Rgba::GOLD;

pub fn draw_centered_text(renderer: &mut dyn Renderer, text: &str, y: f32, size: f32, color: Rgba) {
    let (width, _) = renderer.screen_size();
    let x = (width - renderer.measure_text(text, size)) / 2.0;
    renderer.draw_text(text, x, y, size, color);
}

/// A vertical menu with the selected entry highlighted and marked.
pub fn draw_menu(
    renderer: &mut dyn Renderer,
    options: &[&str],
    selected: usize,
    top: f32,
) {
    for (index, option) in options.iter().enumerate() {
        let y = top + index as f32 * (MENU_SIZE + 12.0);
        if index == selected {
            draw_centered_text(renderer, &format!("> {} <", option), y, MENU_SIZE, HIGHLIGHT);
        } else {
            draw_centered_text(renderer, option, y, MENU_SIZE, Rgba::WHITE);
        }
    }
}

pub fn draw_panel(renderer: &mut dyn Renderer, x: f32, y: f32, width: f32, height: f32) {
    renderer.draw_rect(x, y, width, height, PANEL_COLOR);
    renderer.draw_rect_outline(x, y, width, height, 2.0, Rgba::GRAY);
}

/// A horizontal bar filled to `fraction`.
pub fn draw_bar(
    renderer: &mut dyn Renderer,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    fraction: f32,
    fill: Rgba,
) {
    renderer.draw_rect(x, y, width, height, Rgba::rgb(50, 20, 20));
    renderer.draw_rect(x, y, width * fraction.clamp(0.0, 1.0), height, fill);
}

/// Color of a health bar at `fraction` health.
pub fn health_color(fraction: f32) -> Rgba {
    if fraction > 0.6 {
        Rgba::GREEN
    } else if fraction > 0.3 {
        Rgba::GOLD
    } else {
        Rgba::RED
    }
}

/// Draws every visible sprite in creation order, with a health bar over
/// wounded entities. Dead entities are drawn darkened.
pub fn draw_world(renderer: &mut dyn Renderer, world: &EntityManager) {
    for entity in world.entities_with::<(Transform, Sprite)>() {
        let (Some(transform), Some(sprite)) = (
            world.get_component::<Transform>(entity),
            world.get_component::<Sprite>(entity),
        ) else {
            continue;
        };
        if !sprite.visible {
            continue;
        }

        let health = world.get_component::<Health>(entity);
        let dead = health.map(Health::is_dead).unwrap_or(false);
        let tint = if dead { sprite.tint.scaled(0.35) } else { sprite.tint };
        let (x, y) = (transform.position.x, transform.position.y);
        renderer.draw_sprite(
            sprite.texture.as_deref(),
            x,
            y,
            sprite.width * transform.scale.x,
            sprite.height * transform.scale.y,
            tint,
        );

        if let Some(health) = health {
            let fraction = health.fraction();
            if !dead && fraction < 1.0 {
                draw_bar(renderer, x, y - 8.0, sprite.width, 4.0, fraction, health_color(fraction));
            }
        }
    }
}
