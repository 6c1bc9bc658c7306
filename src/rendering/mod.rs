//! # Rendering Module
//!
//! Drawing goes through the [`Renderer`] trait so game states never touch the
//! window directly. [`MacroquadRenderer`] draws to the macroquad window;
//! [`RecordingRenderer`] records draw calls for headless tests.

pub mod audio;
pub mod display;
pub mod ui;

pub use audio::SoundPlayer;
pub use display::MacroquadRenderer;
pub use ui::*;

use crate::utils::Rgba;

/// The drawing surface game states render to. Coordinates are screen pixels
/// with the origin at the top-left; text is positioned by its baseline.
pub trait Renderer {
    fn screen_size(&self) -> (f32, f32);

    fn clear(&mut self, color: Rgba);

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba);

    fn draw_rect_outline(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        thickness: f32,
        color: Rgba,
    );

    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba);

    /// Draws the texture at `texture`, or a `tint`-colored rectangle when
    /// there is no texture or it cannot be loaded.
    fn draw_sprite(
        &mut self,
        texture: Option<&str>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        tint: Rgba,
    );

    /// Approximate width of `text` at `size`.
    fn measure_text(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.5
    }
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
    },
    Outline {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Rgba,
    },
    Sprite {
        texture: Option<String>,
        x: f32,
        y: f32,
        tint: Rgba,
    },
}

/// Renderer that only records what it was asked to draw.
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingRenderer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Every string drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether any drawn string contains `needle`.
    pub fn drew_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|text| text.contains(needle))
    }

    pub fn sprite_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Sprite { .. }))
            .count()
    }
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl Renderer for RecordingRenderer {
    fn screen_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_rect_outline(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        _thickness: f32,
        color: Rgba,
    ) {
        self.commands.push(DrawCommand::Outline {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, _size: f32, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }

    fn draw_sprite(
        &mut self,
        texture: Option<&str>,
        x: f32,
        y: f32,
        _width: f32,
        _height: f32,
        tint: Rgba,
    ) {
        self.commands.push(DrawCommand::Sprite {
            texture: texture.map(str::to_string),
            x,
            y,
            tint,
        });
    }
}
