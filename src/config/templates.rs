//! # Character Templates
//!
//! Data-driven descriptions of every playable class and enemy type.
//!
//! Templates live in one TOML file with a table per template:
//!
//! ```toml
//! [goblin]
//! name = "Goblin"
//! kind = "enemy"
//! max_health = 30
//! color = { r = 90, g = 160, b = 60 }
//!
//! [goblin.stats]
//! attack_power = 8
//! initiative = 60
//! ```
//!
//! Every field has a default, so a template only lists what differs.

use crate::components::{Ability, AiTuning, EntityKind, Stats, StatusKind};
use crate::utils::Rgba;
use crate::{GameError, GameResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTemplate {
    /// Display name
    pub name: String,
    pub kind: EntityKind,
    pub max_health: i32,
    pub stats: Stats,
    pub abilities: Vec<Ability>,
    pub max_mana: i32,
    /// Mana per second outside combat
    pub mana_regen: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgba,
    pub texture: Option<String>,
    /// Played when this character attacks
    pub attack_sound: Option<String>,
    pub animation_frames: u32,
    pub frame_time: f32,
    /// Only used for enemies
    pub ai: AiTuning,
}

impl Default for CharacterTemplate {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            kind: EntityKind::Enemy,
            max_health: 50,
            stats: Stats::default(),
            abilities: Vec::new(),
            max_mana: 0,
            mana_regen: 0.0,
            width: 32.0,
            height: 32.0,
            color: Rgba::GRAY,
            texture: None,
            attack_sound: None,
            animation_frames: 1,
            frame_time: 0.15,
            ai: AiTuning::default(),
        }
    }
}

/// All known templates, keyed by their table name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, CharacterTemplate>,
}

impl TemplateLibrary {
    /// The templates shipped with the game.
    pub fn builtin() -> Self {
        let mut library = Self::default();

        library.insert(
            "warrior",
            CharacterTemplate {
                name: "Warrior".to_string(),
                kind: EntityKind::Player,
                max_health: 120,
                stats: Stats {
                    attack_power: 16,
                    defense: 6,
                    accuracy: 90.0,
                    initiative: 50,
                    crit_chance: 0.05,
                    level: 1,
                    move_speed: 150.0,
                },
                abilities: vec![Ability::new("Cleave", 1.6, 0, 2)],
                color: Rgba::BLUE,
                ..CharacterTemplate::default()
            },
        );
        library.insert(
            "mage",
            CharacterTemplate {
                name: "Mage".to_string(),
                kind: EntityKind::Player,
                max_health: 70,
                stats: Stats {
                    attack_power: 10,
                    defense: 2,
                    accuracy: 95.0,
                    initiative: 60,
                    crit_chance: 0.1,
                    level: 1,
                    move_speed: 140.0,
                },
                abilities: vec![
                    Ability::new("Fireball", 2.5, 15, 1),
                    Ability::new("Frost Lance", 1.8, 8, 0).with_effect(StatusKind::Stun, 0.0, 1.0),
                ],
                max_mana: 40,
                mana_regen: 2.0,
                color: Rgba::PURPLE,
                ..CharacterTemplate::default()
            },
        );
        library.insert(
            "rogue",
            CharacterTemplate {
                name: "Rogue".to_string(),
                kind: EntityKind::Player,
                max_health: 85,
                stats: Stats {
                    attack_power: 13,
                    defense: 3,
                    accuracy: 92.0,
                    initiative: 80,
                    crit_chance: 0.25,
                    level: 1,
                    move_speed: 175.0,
                },
                abilities: vec![
                    Ability::new("Backstab", 2.0, 0, 3).with_effect(StatusKind::Poison, 3.0, 3.0)
                ],
                color: Rgba::GREEN,
                ..CharacterTemplate::default()
            },
        );
        library.insert(
            "slime",
            CharacterTemplate {
                name: "Slime".to_string(),
                kind: EntityKind::Enemy,
                max_health: 25,
                stats: Stats {
                    attack_power: 6,
                    defense: 1,
                    accuracy: 80.0,
                    initiative: 20,
                    move_speed: 60.0,
                    ..Stats::default()
                },
                color: Rgba::rgb(120, 200, 90),
                ai: AiTuning {
                    chase_speed: 60.0,
                    can_flee: false,
                    ..AiTuning::default()
                },
                ..CharacterTemplate::default()
            },
        );
        library.insert(
            "goblin",
            CharacterTemplate {
                name: "Goblin".to_string(),
                kind: EntityKind::Enemy,
                max_health: 40,
                stats: Stats {
                    attack_power: 10,
                    defense: 3,
                    initiative: 65,
                    level: 2,
                    ..Stats::default()
                },
                color: Rgba::rgb(200, 120, 40),
                ..CharacterTemplate::default()
            },
        );
        library.insert(
            "skeleton",
            CharacterTemplate {
                name: "Skeleton".to_string(),
                kind: EntityKind::Enemy,
                max_health: 60,
                stats: Stats {
                    attack_power: 14,
                    defense: 5,
                    initiative: 40,
                    level: 3,
                    ..Stats::default()
                },
                color: Rgba::rgb(220, 220, 200),
                ai: AiTuning {
                    detection_radius: 260.0,
                    can_flee: false,
                    ..AiTuning::default()
                },
                ..CharacterTemplate::default()
            },
        );

        library
    }

    /// Parses a template file. Templates that fail to deserialize are logged
    /// and skipped; only a file that is not valid TOML is an error.
    pub fn from_toml_str(text: &str) -> GameResult<Self> {
        let table: toml::Table = text.parse()?;
        let mut library = Self::default();

        for (id, value) in table {
            match value.try_into::<CharacterTemplate>() {
                Ok(template) => {
                    debug!("loaded template '{}'", id);
                    library.templates.insert(id, template);
                }
                Err(e) => warn!("Skipping malformed template '{}': {}", id, e),
            }
        }
        Ok(library)
    }

    pub fn load(path: &Path) -> GameResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let library = Self::from_toml_str(&text)?;
        info!(
            "Loaded {} character templates from {}",
            library.len(),
            path.display()
        );
        Ok(library)
    }

    /// Loads `path`, falling back to [`builtin`](Self::builtin) when the file
    /// is missing, unreadable or yields no usable template.
    pub fn load_or_builtin(path: &Path) -> Self {
        if !path.is_file() {
            debug!("No template file at {}, using built-ins", path.display());
            return Self::builtin();
        }
        match Self::load(path) {
            Ok(library) if !library.is_empty() => library,
            Ok(_) => {
                warn!("{} has no usable templates, using built-ins", path.display());
                Self::builtin()
            }
            Err(e) => {
                warn!("Could not load templates from {}: {}", path.display(), e);
                Self::builtin()
            }
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, template: CharacterTemplate) {
        self.templates.insert(id.into(), template);
    }

    pub fn get(&self, id: &str) -> Option<&CharacterTemplate> {
        self.templates.get(id)
    }

    /// Looks a template up, failing with [`GameError::Config`] when absent.
    pub fn require(&self, id: &str) -> GameResult<&CharacterTemplate> {
        self.get(id)
            .ok_or_else(|| GameError::Config(format!("no character template named '{}'", id)))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template IDs of the given kind, sorted.
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<&str> {
        self.templates
            .iter()
            .filter(|(_, template)| template.kind == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CharacterTemplate)> {
        self.templates.iter().map(|(id, t)| (id.as_str(), t))
    }

    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_toml_string(&self) -> GameResult<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> GameResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
