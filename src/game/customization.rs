//! Character creation choices.

use crate::utils::Rgba;

pub const MAX_NAME_LENGTH: usize = 16;
pub const DEFAULT_PLAYER_NAME: &str = "Hero";

/// Tints the player can pick from.
pub const TINT_PALETTE: [Rgba; 6] = [
    Rgba::BLUE,
    Rgba::RED,
    Rgba::GREEN,
    Rgba::GOLD,
    Rgba::PURPLE,
    Rgba::WHITE,
];

/// Name, class and tint chosen on the customization screen.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomizationManager {
    player_name: String,
    /// Player template IDs to choose from
    classes: Vec<String>,
    class_index: usize,
    tint_index: usize,
}

impl CustomizationManager {
    pub fn new(classes: Vec<String>) -> Self {
        Self {
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            classes,
            class_index: 0,
            tint_index: 0,
        }
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Sets the name, trimmed and cut to [`MAX_NAME_LENGTH`] characters.
    /// A blank name falls back to [`DEFAULT_PLAYER_NAME`].
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::game::CustomizationManager;
    ///
    /// let mut custom = CustomizationManager::new(vec![]);
    /// custom.set_name("  Bartholomew the Brave  ");
    /// assert_eq!(custom.player_name(), "Bartholomew the ");
    /// custom.set_name("   ");
    /// assert_eq!(custom.player_name(), "Hero");
    /// ```
    pub fn set_name(&mut self, name: &str) {
        let name: String = name.trim().chars().take(MAX_NAME_LENGTH).collect();
        self.player_name = if name.is_empty() {
            DEFAULT_PLAYER_NAME.to_string()
        } else {
            name
        };
    }

    /// Appends a typed character. Control characters and input past the
    /// length limit are ignored.
    pub fn push_char(&mut self, c: char) -> bool {
        if c.is_control() || self.player_name.chars().count() >= MAX_NAME_LENGTH {
            return false;
        }
        self.player_name.push(c);
        true
    }

    pub fn pop_char(&mut self) {
        self.player_name.pop();
    }

    /// The name to use for a new game, never blank.
    pub fn final_name(&self) -> String {
        let trimmed = self.player_name.trim();
        if trimmed.is_empty() {
            DEFAULT_PLAYER_NAME.to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn selected_class(&self) -> Option<&str> {
        self.classes.get(self.class_index).map(String::as_str)
    }

    /// Selects a class by template ID. Unknown IDs are ignored.
    pub fn select_class(&mut self, id: &str) -> bool {
        match self.classes.iter().position(|class| class == id) {
            Some(index) => {
                self.class_index = index;
                true
            }
            None => false,
        }
    }

    pub fn next_class(&mut self) {
        if !self.classes.is_empty() {
            self.class_index = (self.class_index + 1) % self.classes.len();
        }
    }

    pub fn previous_class(&mut self) {
        if !self.classes.is_empty() {
            self.class_index = (self.class_index + self.classes.len() - 1) % self.classes.len();
        }
    }

    pub fn tint(&self) -> Rgba {
        TINT_PALETTE[self.tint_index % TINT_PALETTE.len()]
    }

    pub fn next_tint(&mut self) {
        self.tint_index = (self.tint_index + 1) % TINT_PALETTE.len();
    }

    pub fn previous_tint(&mut self) {
        self.tint_index = (self.tint_index + TINT_PALETTE.len() - 1) % TINT_PALETTE.len();
    }
}
