//! # Display Management
//!
//! The macroquad implementation of [`Renderer`].

use crate::rendering::Renderer;
use crate::utils::Rgba;
use log::{debug, warn};
use macroquad::prelude::*;
use std::collections::HashMap;

pub fn to_color(color: Rgba) -> Color {
    Color::from_rgba(color.r, color.g, color.b, color.a)
}

/// Draws to the macroquad window.
///
/// Textures are loaded from disk the first time a path is drawn and cached
/// by path. A path that fails to load is remembered and drawn as a
/// placeholder rectangle from then on.
#[derive(Default)]
pub struct MacroquadRenderer {
    /// `None` marks a path that failed to load
    textures: HashMap<String, Option<Texture2D>>,
}

impl MacroquadRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of paths attempted so far, loaded or not.
    pub fn cached_textures(&self) -> usize {
        self.textures.len()
    }

    fn texture(&mut self, path: &str) -> Option<&Texture2D> {
        self.textures
            .entry(path.to_string())
            .or_insert_with(|| load_texture_sync(path))
            .as_ref()
    }
}

fn load_texture_sync(path: &str) -> Option<Texture2D> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read texture {}: {}", path, e);
            return None;
        }
    };
    match Image::from_file_with_format(&bytes, None) {
        Ok(image) => {
            debug!("Loaded texture {} ({}x{})", path, image.width, image.height);
            let texture = Texture2D::from_image(&image);
            texture.set_filter(FilterMode::Nearest);
            Some(texture)
        }
        Err(e) => {
            warn!("Could not decode texture {}: {:?}", path, e);
            None
        }
    }
}

impl Renderer for MacroquadRenderer {
    fn screen_size(&self) -> (f32, f32) {
        (screen_width(), screen_height())
    }

    fn clear(&mut self, color: Rgba) {
        clear_background(to_color(color));
    }

    fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        draw_rectangle(x, y, width, height, to_color(color));
    }

    fn draw_rect_outline(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        thickness: f32,
        color: Rgba,
    ) {
        draw_rectangle_lines(x, y, width, height, thickness, to_color(color));
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba) {
        draw_text(text, x, y, size, to_color(color));
    }

    fn draw_sprite(
        &mut self,
        texture: Option<&str>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        tint: Rgba,
    ) {
        let loaded = texture.and_then(|path| self.texture(path)).cloned();
        match loaded {
            Some(texture) => draw_texture_ex(
                &texture,
                x,
                y,
                to_color(tint),
                DrawTextureParams {
                    dest_size: Some(vec2(width, height)),
                    ..Default::default()
                },
            ),
            None => draw_rectangle(x, y, width, height, to_color(tint)),
        }
    }

    fn measure_text(&self, text: &str, size: f32) -> f32 {
        measure_text(text, None, size as u16, 1.0).width
    }
}
