//! # Settings
//!
//! Typed game settings backed by a sectioned TOML file.
//!
//! Every setting is declared up front with a type, a default, an optional
//! range and a one-line description. Loading only overrides values that are
//! declared and well-formed; anything else is logged and skipped so a broken
//! file never stops the game from starting.

use crate::{GameError, GameResult};
use log::{debug, info, warn};
use std::fmt;
use std::path::Path;

/// A setting's value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// One of the options listed in the setting's definition
    Enum(String),
}

impl SettingValue {
    fn kind_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Int(_) => "integer",
            SettingValue::Float(_) => "float",
            SettingValue::Str(_) => "string",
            SettingValue::Enum(_) => "enum",
        }
    }

    fn to_toml(&self) -> toml::Value {
        match self {
            SettingValue::Bool(value) => toml::Value::Boolean(*value),
            SettingValue::Int(value) => toml::Value::Integer(*value),
            SettingValue::Float(value) => toml::Value::Float(*value),
            SettingValue::Str(value) | SettingValue::Enum(value) => {
                toml::Value::String(value.clone())
            }
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_toml())
    }
}

/// Declaration of one setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDef {
    pub section: &'static str,
    pub key: &'static str,
    pub description: &'static str,
    pub default: SettingValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Allowed values for [`SettingValue::Enum`] settings
    pub options: &'static [&'static str],
}

impl SettingDef {
    pub fn new(
        section: &'static str,
        key: &'static str,
        description: &'static str,
        default: SettingValue,
    ) -> Self {
        Self {
            section,
            key,
            description,
            default,
            min: None,
            max: None,
            options: &[],
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn options(mut self, options: &'static [&'static str]) -> Self {
        self.options = options;
        self
    }

    /// Checks the type of `value` against the default and clamps numbers into
    /// range. Integers are accepted for float settings.
    fn coerce(&self, value: SettingValue) -> GameResult<SettingValue> {
        let clamp = |v: f64| {
            let v = self.min.map_or(v, |min| v.max(min));
            self.max.map_or(v, |max| v.min(max))
        };

        match (&self.default, value) {
            (SettingValue::Bool(_), SettingValue::Bool(v)) => Ok(SettingValue::Bool(v)),
            (SettingValue::Int(_), SettingValue::Int(v)) => {
                Ok(SettingValue::Int(clamp(v as f64).round() as i64))
            }
            (SettingValue::Float(_), SettingValue::Float(v)) => Ok(SettingValue::Float(clamp(v))),
            (SettingValue::Float(_), SettingValue::Int(v)) => {
                Ok(SettingValue::Float(clamp(v as f64)))
            }
            (SettingValue::Str(_), SettingValue::Str(v)) => Ok(SettingValue::Str(v)),
            (SettingValue::Enum(_), SettingValue::Enum(v) | SettingValue::Str(v)) => {
                if self.options.iter().any(|option| option.eq_ignore_ascii_case(&v)) {
                    Ok(SettingValue::Enum(v.to_ascii_lowercase()))
                } else {
                    Err(GameError::Config(format!(
                        "{}.{}: '{}' is not one of {:?}",
                        self.section, self.key, v, self.options
                    )))
                }
            }
            (expected, got) => Err(GameError::Config(format!(
                "{}.{}: expected {}, got {}",
                self.section,
                self.key,
                expected.kind_name(),
                got.kind_name()
            ))),
        }
    }

    fn from_toml(&self, value: &toml::Value) -> GameResult<SettingValue> {
        let value = match value {
            toml::Value::Boolean(v) => SettingValue::Bool(*v),
            toml::Value::Integer(v) => SettingValue::Int(*v),
            toml::Value::Float(v) => SettingValue::Float(*v),
            toml::Value::String(v) => SettingValue::Str(v.clone()),
            other => {
                return Err(GameError::Config(format!(
                    "{}.{}: unsupported value {}",
                    self.section, self.key, other
                )))
            }
        };
        self.coerce(value)
    }
}

type ChangeListener = Box<dyn FnMut(&str, &str, &SettingValue)>;

struct Entry {
    def: SettingDef,
    value: SettingValue,
}

/// The settings registry.
///
/// # Examples
///
/// ```
/// use emberfall::config::{SettingValue, Settings};
///
/// let mut settings = Settings::new();
/// settings.set("audio", "master_volume", SettingValue::Float(3.0)).unwrap();
/// assert_eq!(settings.get_float("audio", "master_volume"), Some(1.0));
/// ```
pub struct Settings {
    entries: Vec<Entry>,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("entries", &self.entries.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// The game's settings at their default values.
    pub fn new() -> Self {
        let mut settings = Self::empty();
        for def in builtin_definitions() {
            settings.define(def);
        }
        settings
    }

    /// A registry with no settings declared.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Declares a setting, or replaces the declaration with the same
    /// section and key. The value starts at the default.
    pub fn define(&mut self, def: SettingDef) {
        let value = def.default.clone();
        match self.index_of(def.section, def.key) {
            Some(index) => self.entries[index] = Entry { def, value },
            None => self.entries.push(Entry { def, value }),
        }
    }

    pub fn definitions(&self) -> impl Iterator<Item = &SettingDef> {
        self.entries.iter().map(|entry| &entry.def)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&SettingValue> {
        self.index_of(section, key)
            .map(|index| &self.entries[index].value)
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        match self.get(section, key)? {
            SettingValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        match self.get(section, key)? {
            SettingValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Float settings, with integer settings widened.
    pub fn get_float(&self, section: &str, key: &str) -> Option<f64> {
        match self.get(section, key)? {
            SettingValue::Float(value) => Some(*value),
            SettingValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// String and enum settings.
    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        match self.get(section, key)? {
            SettingValue::Str(value) | SettingValue::Enum(value) => Some(value),
            _ => None,
        }
    }

    /// Sets a value, clamping numbers into range. Listeners are notified
    /// only when the stored value actually changes.
    pub fn set(&mut self, section: &str, key: &str, value: SettingValue) -> GameResult<()> {
        let index = self
            .index_of(section, key)
            .ok_or_else(|| GameError::Config(format!("unknown setting {}.{}", section, key)))?;
        let value = self.entries[index].def.coerce(value)?;
        self.store(index, value);
        Ok(())
    }

    /// Registers a callback run with `(section, key, new_value)` after every
    /// change.
    pub fn on_change(&mut self, listener: impl FnMut(&str, &str, &SettingValue) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn reset_to_defaults(&mut self) {
        for index in 0..self.entries.len() {
            let default = self.entries[index].def.default.clone();
            self.store(index, default);
        }
    }

    /// Applies values from TOML text. Unknown keys and bad values are logged
    /// and skipped. Returns how many values were applied; only a file that
    /// is not valid TOML at all is an error.
    pub fn load_from_str(&mut self, text: &str) -> GameResult<usize> {
        let table: toml::Table = text.parse()?;
        let mut applied = 0;

        for (section, body) in &table {
            let Some(body) = body.as_table() else {
                warn!("settings: ignoring top-level key '{}' outside a section", section);
                continue;
            };
            for (key, raw) in body {
                let Some(index) = self.index_of(section, key) else {
                    warn!("settings: unknown key {}.{}, ignoring", section, key);
                    continue;
                };
                match self.entries[index].def.from_toml(raw) {
                    Ok(value) => {
                        self.store(index, value);
                        applied += 1;
                    }
                    Err(e) => warn!("settings: {}, keeping {}", e, self.entries[index].value),
                }
            }
        }

        debug!("settings: applied {} values", applied);
        Ok(applied)
    }

    pub fn load(&mut self, path: &Path) -> GameResult<usize> {
        let text = std::fs::read_to_string(path)?;
        let applied = self.load_from_str(&text)?;
        info!("Loaded settings from {}", path.display());
        Ok(applied)
    }

    /// Defaults overlaid with `path` when it can be read. Failures are
    /// logged and leave the defaults in place.
    pub fn load_or_default(path: &Path) -> Self {
        let mut settings = Self::new();
        if path.is_file() {
            if let Err(e) = settings.load(path) {
                warn!("Could not load settings from {}: {}", path.display(), e);
            }
        } else {
            debug!("No settings file at {}, using defaults", path.display());
        }
        settings
    }

    /// Serializes every setting, grouped by section in declaration order,
    /// each preceded by its description as a `#` comment.
    pub fn to_config_string(&self) -> String {
        let mut sections: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !sections.contains(&entry.def.section) {
                sections.push(entry.def.section);
            }
        }

        let mut out = String::new();
        for (n, section) in sections.iter().enumerate() {
            if n > 0 {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            for entry in self.entries.iter().filter(|e| e.def.section == *section) {
                out.push_str(&format!("# {}\n", entry.def.description));
                if !entry.def.options.is_empty() {
                    out.push_str(&format!("# one of: {}\n", entry.def.options.join(", ")));
                }
                out.push_str(&format!("{} = {}\n", entry.def.key, entry.value));
            }
        }
        out
    }

    pub fn save(&self, path: &Path) -> GameResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    fn index_of(&self, section: &str, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.def.section == section && entry.def.key == key)
    }

    fn store(&mut self, index: usize, value: SettingValue) {
        if self.entries[index].value == value {
            return;
        }
        self.entries[index].value = value;
        let entry = &self.entries[index];
        debug!("setting {}.{} = {}", entry.def.section, entry.def.key, entry.value);
        for listener in &mut self.listeners {
            listener(entry.def.section, entry.def.key, &entry.value);
        }
    }
}

fn builtin_definitions() -> Vec<SettingDef> {
    use SettingValue::{Bool, Enum, Float, Int, Str};

    vec![
        SettingDef::new("display", "width", "Window width in pixels", Int(1280))
            .range(640.0, 3840.0),
        SettingDef::new("display", "height", "Window height in pixels", Int(720))
            .range(480.0, 2160.0),
        SettingDef::new("display", "fullscreen", "Start in fullscreen mode", Bool(false)),
        SettingDef::new("display", "show_fps", "Draw the frame rate counter", Bool(false)),
        SettingDef::new("audio", "master_volume", "Overall volume", Float(1.0)).range(0.0, 1.0),
        SettingDef::new("audio", "music_volume", "Music volume", Float(0.7)).range(0.0, 1.0),
        SettingDef::new("audio", "sfx_volume", "Sound effect volume", Float(0.8)).range(0.0, 1.0),
        SettingDef::new("audio", "muted", "Silence all audio", Bool(false)),
        SettingDef::new("gameplay", "difficulty", "Enemy toughness", Enum("normal".into()))
            .options(&["easy", "normal", "hard"]),
        SettingDef::new("gameplay", "enemy_count", "Enemies spawned per arena", Int(5))
            .range(1.0, 20.0),
        SettingDef::new("gameplay", "arena_width", "Arena width in world units", Float(1280.0))
            .range(320.0, 4096.0),
        SettingDef::new("gameplay", "arena_height", "Arena height in world units", Float(720.0))
            .range(240.0, 4096.0),
        SettingDef::new(
            "gameplay",
            "engage_radius",
            "Enemies this close to the player join a battle",
            Float(160.0),
        )
        .range(0.0, 1000.0),
        SettingDef::new("gameplay", "player_name", "Default player name", Str("Hero".into())),
        SettingDef::new(
            "combat",
            "damage_variance",
            "Random damage spread, 0.1 means +-10%",
            Float(0.1),
        )
        .range(0.0, 0.5),
        SettingDef::new("combat", "crit_multiplier", "Critical hit damage multiplier", Float(1.5))
            .range(1.0, 5.0),
        SettingDef::new("combat", "flee_success_rate", "Chance a flee attempt succeeds", Float(0.5))
            .range(0.0, 1.0),
        SettingDef::new("combat", "phase_delay", "Seconds on battle start and end banners", Float(0.8))
            .range(0.0, 5.0),
        SettingDef::new("combat", "action_delay", "Seconds before an action resolves", Float(0.4))
            .range(0.0, 5.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_defaults() {
        let settings = Settings::new();
        assert_eq!(settings.get_int("display", "width"), Some(1280));
        assert_eq!(settings.get_str("gameplay", "difficulty"), Some("normal"));
        assert_eq!(settings.get_bool("audio", "muted"), Some(false));
        assert_eq!(settings.get("nope", "nothing"), None);
    }

    #[test]
    fn test_set_clamps_and_checks_types() {
        let mut settings = Settings::new();
        settings
            .set("display", "width", SettingValue::Int(100))
            .unwrap();
        assert_eq!(settings.get_int("display", "width"), Some(640));

        settings
            .set("combat", "crit_multiplier", SettingValue::Int(2))
            .unwrap();
        assert_eq!(settings.get_float("combat", "crit_multiplier"), Some(2.0));

        assert!(settings
            .set("audio", "muted", SettingValue::Int(1))
            .is_err());
        assert!(settings
            .set("gameplay", "difficulty", SettingValue::Str("nightmare".into()))
            .is_err());
        assert!(settings
            .set("audio", "nope", SettingValue::Bool(true))
            .is_err());
    }

    #[test]
    fn test_listeners_fire_on_change_only() {
        let mut settings = Settings::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        settings.on_change(move |section, key, value| {
            sink.borrow_mut().push(format!("{}.{}={}", section, key, value));
        });

        settings.set("audio", "muted", SettingValue::Bool(true)).unwrap();
        settings.set("audio", "muted", SettingValue::Bool(true)).unwrap();
        assert_eq!(*seen.borrow(), vec!["audio.muted=true".to_string()]);
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let mut settings = Settings::new();
        let applied = settings
            .load_from_str(
                r#"
                stray = 1

                [display]
                width = 1920
                fullscreen = "yes"

                [gameplay]
                difficulty = "Hard"
                mystery = 4
                "#,
            )
            .unwrap();

        assert_eq!(applied, 2);
        assert_eq!(settings.get_int("display", "width"), Some(1920));
        assert_eq!(settings.get_bool("display", "fullscreen"), Some(false));
        assert_eq!(settings.get_str("gameplay", "difficulty"), Some("hard"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut settings = Settings::new();
        assert!(matches!(
            settings.load_from_str("[display\nwidth = "),
            Err(GameError::TomlParse(_))
        ));
    }

    #[test]
    fn test_config_string_round_trips() {
        let mut settings = Settings::new();
        settings
            .set("gameplay", "player_name", SettingValue::Str("Ash \"the\" Bold".into()))
            .unwrap();
        settings
            .set("audio", "sfx_volume", SettingValue::Float(0.25))
            .unwrap();

        let text = settings.to_config_string();
        assert!(text.contains("# Sound effect volume\nsfx_volume = 0.25\n"));

        let mut reloaded = Settings::new();
        reloaded.load_from_str(&text).unwrap();
        assert_eq!(
            reloaded.get_str("gameplay", "player_name"),
            Some("Ash \"the\" Bold")
        );
        assert_eq!(reloaded.get_float("audio", "sfx_volume"), Some(0.25));
        assert_eq!(reloaded.to_config_string(), text);
    }
}
