//! Components read by the renderer and audio layer.

use crate::ecs::Component;
use crate::utils::Rgba;

/// How an entity is drawn. A missing or unloadable texture falls back to a
/// rectangle in `tint`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: Option<String>,
    pub tint: Rgba,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
}

impl Sprite {
    pub fn new(texture: Option<String>, tint: Rgba, width: f32, height: f32) -> Self {
        Self {
            texture,
            tint,
            width,
            height,
            visible: true,
        }
    }
}

impl Component for Sprite {}

/// Frame-based animation clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub frame_count: u32,
    /// Seconds per frame
    pub frame_time: f32,
    pub current_frame: u32,
    pub looping: bool,
    pub playing: bool,
    pub finished: bool,
    pub(crate) timer: f32,
}

impl Animation {
    pub fn new(frame_count: u32, frame_time: f32, looping: bool) -> Self {
        Self {
            frame_count: frame_count.max(1),
            frame_time,
            current_frame: 0,
            looping,
            playing: true,
            finished: false,
            timer: 0.0,
        }
    }

    /// Rewinds to the first frame and starts playing.
    pub fn restart(&mut self) {
        self.current_frame = 0;
        self.timer = 0.0;
        self.finished = false;
        self.playing = true;
    }
}

impl Component for Animation {}

/// A sound an entity can emit. Setting `play_requested` asks the audio
/// system to queue it on the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    pub sound: String,
    pub volume: f32,
    pub play_requested: bool,
}

impl AudioSource {
    pub fn new(sound: impl Into<String>, volume: f32) -> Self {
        Self {
            sound: sound.into(),
            volume,
            play_requested: false,
        }
    }
}

impl Component for AudioSource {}
