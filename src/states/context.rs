//! Shared state handed to every game state.

use crate::combat::{CombatConfig, CombatReport};
use crate::components::EntityKind;
use crate::config::{ConfigPaths, Settings, TemplateLibrary};
use crate::ecs::EntityManager;
use crate::game::{
    CustomizationManager, Difficulty, EntityFactory, GameEvent, GameStatistics, HighScoreTable,
    PartyManager, PartyMember, MAX_PARTY_SIZE,
};
use crate::systems::{
    AbilitySystem, AiSystem, AnimationSystem, AudioSystem, CollisionSystem, HealthSystem,
    MovementSystem, SoundRequest, StatusEffectSystem,
};
use crate::utils::{Aabb, Vector2};
use crate::GameResult;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use std::rc::Rc;

/// Everything that outlives a single game state: the world, configuration,
/// the party and the run's bookkeeping.
///
/// There are no globals; states receive the context explicitly.
pub struct GameContext {
    pub world: EntityManager,
    pub settings: Settings,
    pub templates: TemplateLibrary,
    pub party: PartyManager,
    pub customization: CustomizationManager,
    pub high_scores: HighScoreTable,
    pub statistics: GameStatistics,
    pub rng: StdRng,
    /// Where to persist files; `None` keeps everything in memory
    pub paths: Option<ConfigPaths>,
    /// Left by the combat state for the state it returns to
    pub last_combat: Option<CombatReport>,
    settings_changed: Rc<Cell<bool>>,
}

impl GameContext {
    /// A context that never touches the disk.
    pub fn new(settings: Settings, templates: TemplateLibrary, seed: u64) -> Self {
        let classes = templates
            .ids_of_kind(EntityKind::Player)
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut customization = CustomizationManager::new(classes);
        if let Some(name) = settings.get_str("gameplay", "player_name") {
            customization.set_name(name);
        }

        let mut context = Self {
            world: EntityManager::new(),
            settings,
            templates,
            party: PartyManager::new(),
            customization,
            high_scores: HighScoreTable::new(),
            statistics: GameStatistics::new(),
            rng: StdRng::seed_from_u64(seed),
            paths: None,
            last_combat: None,
            settings_changed: Rc::new(Cell::new(false)),
        };

        let flag = Rc::clone(&context.settings_changed);
        context.settings.on_change(move |section, key, _| {
            debug!("setting {}.{} changed", section, key);
            flag.set(true);
        });
        context.install_systems();
        context
    }

    /// Loads settings, templates and high scores from `paths`. Missing
    /// files fall back to defaults; a missing settings file is written out
    /// so it can be edited.
    pub fn load(paths: ConfigPaths, seed: u64) -> Self {
        let settings_path = paths.settings();
        let settings = Settings::load_or_default(&settings_path);
        if !settings_path.exists() {
            if let Err(e) = settings.save(&settings_path) {
                warn!("Could not write default settings: {}", e);
            }
        }

        let templates = TemplateLibrary::load_or_builtin(&paths.templates());
        let high_scores = HighScoreTable::load_or_default(&paths.high_scores());

        let mut context = Self::new(settings, templates, seed);
        context.high_scores = high_scores;
        context.paths = Some(paths);
        context
    }

    /// Registers the world's systems in their run order.
    fn install_systems(&mut self) {
        let bounds = self.arena_bounds();
        let muted = self.settings.get_bool("audio", "muted").unwrap_or(false);

        self.world.add_system(AiSystem::new());
        self.world.add_system(StatusEffectSystem);
        self.world.add_system(MovementSystem::new(Some(bounds)));
        self.world.add_system(CollisionSystem::new());
        self.world.add_system(AbilitySystem::default());
        self.world.add_system(HealthSystem::new());
        self.world.add_system(AnimationSystem);
        let mut audio = AudioSystem::new();
        audio.muted = muted;
        self.world.add_system(audio);
    }

    /// Pushes changed settings into the running systems. Returns whether
    /// anything changed since the last call.
    pub fn apply_settings_changes(&mut self) -> bool {
        if !self.settings_changed.replace(false) {
            return false;
        }
        let bounds = self.arena_bounds();
        let muted = self.settings.get_bool("audio", "muted").unwrap_or(false);
        if let Some(movement) = self.world.get_system_mut::<MovementSystem>() {
            movement.bounds = Some(bounds);
        }
        if let Some(audio) = self.world.get_system_mut::<AudioSystem>() {
            audio.muted = muted;
        }
        true
    }

    pub fn arena_bounds(&self) -> Aabb {
        let width = self.settings.get_float("gameplay", "arena_width").unwrap_or(1280.0) as f32;
        let height = self.settings.get_float("gameplay", "arena_height").unwrap_or(720.0) as f32;
        Aabb::from_origin_size(Vector2::ZERO, width, height)
    }

    pub fn factory(&self) -> EntityFactory {
        let difficulty = self
            .settings
            .get_str("gameplay", "difficulty")
            .map(Difficulty::from_name)
            .unwrap_or_default();
        EntityFactory::new(difficulty)
    }

    pub fn combat_config(&self) -> CombatConfig {
        CombatConfig::from_settings(&self.settings)
    }

    /// Resets the world, party and statistics for a new run. The leader
    /// uses the customized name and class; the remaining player classes
    /// join as companions.
    pub fn start_new_run(&mut self) -> GameResult<()> {
        self.world.clear();
        self.party.clear();
        self.statistics = GameStatistics::new();
        self.last_combat = None;

        let leader_class = match self.customization.selected_class() {
            Some(class) => class.to_string(),
            None => self
                .templates
                .ids_of_kind(EntityKind::Player)
                .first()
                .map(|id| id.to_string())
                .unwrap_or_default(),
        };
        let template = self.templates.require(&leader_class)?;
        let name = self.customization.final_name();
        self.party
            .add_member(PartyMember::from_template(name.clone(), &leader_class, template));

        for id in self.templates.ids_of_kind(EntityKind::Player) {
            if id == leader_class || self.party.len() >= MAX_PARTY_SIZE {
                continue;
            }
            if let Some(template) = self.templates.get(id) {
                self.party.add_member(PartyMember::from_template(
                    template.name.clone(),
                    id,
                    template,
                ));
            }
        }

        info!(
            "New run: {} the {} with {} companions",
            name,
            leader_class,
            self.party.len() - 1
        );
        Ok(())
    }

    pub fn record_event(&mut self, event: GameEvent) {
        debug!("event: {:?}", event);
        self.statistics.update_from_event(&event);
    }

    /// Queues a sound that is not tied to an entity.
    pub fn play_sound(&mut self, sound: &str, volume: f32) {
        if let Some(audio) = self.world.get_system_mut::<AudioSystem>() {
            audio.request(sound, volume);
        }
    }

    /// Sounds queued since the last call, for the presentation layer.
    pub fn drain_sounds(&mut self) -> Vec<SoundRequest> {
        self.world
            .get_system_mut::<AudioSystem>()
            .map(|audio| audio.drain_requests())
            .unwrap_or_default()
    }

    /// Writes the high score table when a config directory is set. Failures
    /// are logged.
    pub fn save_high_scores(&self) {
        let Some(paths) = &self.paths else {
            return;
        };
        if let Err(e) = self.high_scores.save(&paths.high_scores()) {
            warn!("Could not save high scores: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingValue;

    fn context() -> GameContext {
        GameContext::new(Settings::new(), TemplateLibrary::builtin(), 7)
    }

    #[test]
    fn test_new_run_builds_party() {
        let mut ctx = context();
        ctx.customization.set_name("Ivy");
        ctx.customization.select_class("rogue");
        ctx.start_new_run().unwrap();

        let leader = ctx.party.leader().unwrap();
        assert_eq!(leader.name, "Ivy");
        assert_eq!(leader.template_id, "rogue");
        assert_eq!(ctx.party.len(), 3);
    }

    #[test]
    fn test_settings_changes_reach_systems() {
        let mut ctx = context();
        assert!(!ctx.apply_settings_changes());

        ctx.settings
            .set("audio", "muted", SettingValue::Bool(true))
            .unwrap();
        assert!(ctx.apply_settings_changes());
        assert!(ctx.world.get_system::<AudioSystem>().unwrap().muted);
        assert!(!ctx.apply_settings_changes());
    }

    #[test]
    fn test_systems_installed_once() {
        let ctx = context();
        assert_eq!(ctx.world.system_count(), 8);
    }
}
