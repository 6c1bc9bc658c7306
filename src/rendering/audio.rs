//! Sound playback for queued [`SoundRequest`]s.

use crate::systems::SoundRequest;
use log::{debug, warn};
use macroquad::audio::{load_sound_from_bytes, play_sound, PlaySoundParams, Sound};
use std::collections::HashMap;

/// Plays sounds through macroquad, caching them by path. A path that fails
/// to load is remembered and skipped afterwards.
pub struct SoundPlayer {
    sounds: HashMap<String, Option<Sound>>,
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub muted: bool,
}

impl SoundPlayer {
    pub fn new(master_volume: f32, sfx_volume: f32, muted: bool) -> Self {
        Self {
            sounds: HashMap::new(),
            master_volume,
            sfx_volume,
            muted,
        }
    }

    pub async fn play_all(&mut self, requests: Vec<SoundRequest>) {
        for request in requests {
            self.play(&request).await;
        }
    }

    pub async fn play(&mut self, request: &SoundRequest) {
        if self.muted {
            return;
        }
        if !self.sounds.contains_key(&request.sound) {
            let loaded = load(&request.sound).await;
            self.sounds.insert(request.sound.clone(), loaded);
        }

        if let Some(Some(sound)) = self.sounds.get(&request.sound) {
            let volume = (request.volume * self.master_volume * self.sfx_volume).clamp(0.0, 1.0);
            play_sound(
                sound,
                PlaySoundParams {
                    looped: false,
                    volume,
                },
            );
        }
    }
}

async fn load(path: &str) -> Option<Sound> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read sound {}: {}", path, e);
            return None;
        }
    };
    match load_sound_from_bytes(&bytes).await {
        Ok(sound) => {
            debug!("Loaded sound {}", path);
            Some(sound)
        }
        Err(e) => {
            warn!("Could not decode sound {}: {:?}", path, e);
            None
        }
    }
}
