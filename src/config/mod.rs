//! # Configuration Module
//!
//! On-disk configuration: typed settings and character templates, plus the
//! layout of the configuration directory.

pub mod settings;
pub mod templates;

pub use settings::{SettingDef, SettingValue, Settings};
pub use templates::{CharacterTemplate, TemplateLibrary};

use std::path::{Path, PathBuf};

/// File names inside the configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    dir: PathBuf,
}

impl ConfigPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn settings(&self) -> PathBuf {
        self.dir.join(crate::SETTINGS_FILE)
    }

    pub fn templates(&self) -> PathBuf {
        self.dir.join(crate::TEMPLATES_FILE)
    }

    pub fn high_scores(&self) -> PathBuf {
        self.dir.join(crate::HIGH_SCORES_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new(crate::DEFAULT_CONFIG_DIR)
    }
}
