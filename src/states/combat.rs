//! The battle screen.
//!
//! Wraps a [`CombatEngine`]: party members pick actions through a small menu,
//! enemies act on their own, and when the battle is over the result is left
//! in [`GameContext::last_combat`] for the playing state.

use crate::combat::{CombatAction, CombatEngine, CombatPhase, CombatOutcome, Team};
use crate::components::{Abilities, AudioSource, Health, Sprite, Stats, Transform};
use crate::ecs::Entity;
use crate::game::GameEvent;
use crate::input::{GameInput, InputFrame};
use crate::rendering::{
    draw_bar, draw_centered_text, draw_panel, health_color, Renderer, BODY_SIZE, HIGHLIGHT,
    MENU_SIZE, TITLE_SIZE,
};
use crate::states::menu::step_selection;
use crate::states::{GameContext, GameState, StateKind, Transition};
use crate::utils::{Rgba, Vector2};
use crate::{GameError, GameResult};
use log::{debug, info, warn};
use std::collections::HashMap;

pub const ACTION_OPTIONS: [&str; 4] = ["Attack", "Defend", "Ability", "Flee"];
const LOG_LINES_SHOWN: usize = 5;
const SLOT_HEIGHT: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionChoice {
    Attack,
    Defend,
    Ability,
    Flee,
}

impl ActionChoice {
    fn from_index(index: usize) -> Self {
        match index {
            0 => ActionChoice::Attack,
            1 => ActionChoice::Defend,
            2 => ActionChoice::Ability,
            _ => ActionChoice::Flee,
        }
    }
}

pub struct CombatState {
    enemies: Vec<Entity>,
    /// Entities spawned for companions, removed when the battle closes
    companions: Vec<Entity>,
    engine: CombatEngine,
    starting_health: HashMap<Entity, i32>,
    selected: usize,
    ability: usize,
    /// Index into the living enemies while picking a target
    targeting: Option<usize>,
    notice: Option<String>,
    reported: bool,
}

impl CombatState {
    pub fn new(enemies: Vec<Entity>) -> Self {
        Self {
            enemies,
            companions: Vec::new(),
            engine: CombatEngine::new(Default::default()),
            starting_health: HashMap::new(),
            selected: 0,
            ability: 0,
            targeting: None,
            notice: None,
            reported: false,
        }
    }

    pub fn engine(&self) -> &CombatEngine {
        &self.engine
    }

    pub fn selected_action(&self) -> ActionChoice {
        ActionChoice::from_index(self.selected)
    }

    pub fn is_targeting(&self) -> bool {
        self.targeting.is_some()
    }

    /// Why the last chosen action was refused, if it was.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Brings every living companion into the world next to the leader.
    fn spawn_companions(&mut self, ctx: &mut GameContext) -> GameResult<Vec<Entity>> {
        let leader = ctx
            .party
            .leader()
            .and_then(|member| member.entity)
            .ok_or_else(|| GameError::InvalidState("the leader is not in the world".to_string()))?;
        let origin = ctx
            .world
            .get_component::<Transform>(leader)
            .map(|transform| transform.position)
            .unwrap_or(Vector2::ZERO);

        let factory = ctx.factory();
        let mut party = vec![leader];
        for slot in 1..ctx.party.len() {
            let Some(member) = ctx.party.member(slot) else {
                continue;
            };
            if !member.is_alive() {
                continue;
            }
            let Some(template) = ctx.templates.get(&member.template_id) else {
                warn!("No template {} for {}", member.template_id, member.name);
                continue;
            };
            let at = Vector2::new(origin.x - 40.0 * slot as f32, origin.y);
            let entity = factory.spawn_player(
                &mut ctx.world,
                template,
                member,
                slot,
                at,
                template.color,
            );
            if let Some(member) = ctx.party.member_mut(slot) {
                member.entity = Some(entity);
            }
            self.companions.push(entity);
            party.push(entity);
        }
        Ok(party)
    }

    fn despawn_companions(&mut self, ctx: &mut GameContext) {
        for entity in self.companions.drain(..) {
            if let Some(slot) = ctx.party.slot_of(entity) {
                if let Some(member) = ctx.party.member_mut(slot) {
                    member.entity = None;
                }
            }
            ctx.world.destroy_entity(entity);
        }
        ctx.world.flush_destroyed();
    }

    fn living_targets(&self) -> Vec<Entity> {
        self.engine.living(Team::Enemy)
    }

    fn submit(&mut self, action: CombatAction, ctx: &mut GameContext) {
        match self.engine.select_action(action, &ctx.world) {
            Ok(()) => {
                self.notice = None;
                self.targeting = None;
            }
            Err(e) => {
                debug!("action refused: {}", e);
                self.notice = Some(e.to_string());
            }
        }
    }

    fn handle_targeting(&mut self, index: usize, input: &InputFrame, ctx: &mut GameContext) {
        let targets = self.living_targets();
        if targets.is_empty() || input.pressed(GameInput::Back) {
            self.targeting = None;
            return;
        }
        let mut index = index % targets.len();
        if input.pressed(GameInput::Left) || input.pressed(GameInput::Up) {
            index = (index + targets.len() - 1) % targets.len();
        }
        if input.pressed(GameInput::Right) || input.pressed(GameInput::Down) {
            index = (index + 1) % targets.len();
        }
        self.targeting = Some(index);

        if input.pressed(GameInput::Confirm) {
            let target = targets[index];
            let action = match self.selected_action() {
                ActionChoice::Ability => CombatAction::Ability {
                    index: self.ability,
                    target,
                },
                _ => CombatAction::Attack { target },
            };
            self.submit(action, ctx);
        }
    }

    fn actor_abilities<'a>(&self, ctx: &'a GameContext) -> Option<&'a Abilities> {
        let actor = self.engine.current_actor()?;
        ctx.world.get_component::<Abilities>(actor.entity)
    }

    /// Records statistics and leaves the report for the playing state.
    fn report(&mut self, ctx: &mut GameContext) {
        self.reported = true;
        let Some(report) = self.engine.report() else {
            return;
        };

        let mut dealt = 0;
        let mut taken = 0;
        for participant in self.engine.participants() {
            let before = self
                .starting_health
                .get(&participant.entity)
                .copied()
                .unwrap_or(participant.health);
            let lost = (before - participant.health).max(0);
            match participant.team {
                Team::Enemy => dealt += lost,
                Team::Player => taken += lost,
            }
        }
        ctx.record_event(GameEvent::DamageDealt { amount: dealt });
        ctx.record_event(GameEvent::DamageTaken { amount: taken });
        for &enemy in &report.defeated_enemies {
            let level = ctx
                .world
                .get_component::<Stats>(enemy)
                .map(|stats| stats.level)
                .unwrap_or(1);
            ctx.record_event(GameEvent::EnemyDefeated { level });
        }
        ctx.record_event(GameEvent::BattleEnded {
            outcome: report.outcome,
        });

        ctx.party.sync_from_world(&ctx.world);
        info!(
            "Battle over after {} rounds: {:?}",
            report.rounds, report.outcome
        );
        ctx.last_combat = Some(report);
    }

    fn draw_side(&self, ctx: &GameContext, renderer: &mut dyn Renderer, team: Team, x: f32) {
        let target = self
            .targeting
            .and_then(|index| self.living_targets().get(index).copied());
        let actor = self.engine.current_actor().map(|actor| actor.entity);

        let members = self.engine.participants().iter().filter(|p| p.team == team);
        for (row, participant) in members.enumerate() {
            let y = 120.0 + row as f32 * SLOT_HEIGHT;
            let sprite = ctx.world.get_component::<Sprite>(participant.entity);
            let tint = sprite.map(|s| s.tint).unwrap_or(Rgba::WHITE);
            let tint = if participant.is_alive() { tint } else { tint.scaled(0.35) };
            renderer.draw_sprite(
                sprite.and_then(|s| s.texture.as_deref()),
                x,
                y,
                48.0,
                48.0,
                tint,
            );

            let fraction = ctx
                .world
                .get_component::<Health>(participant.entity)
                .map(Health::fraction)
                .unwrap_or(0.0);
            let color = if actor == Some(participant.entity) { HIGHLIGHT } else { Rgba::WHITE };
            let label = if participant.defending {
                format!("{} [guard]", participant.name)
            } else {
                participant.name.clone()
            };
            renderer.draw_text(&label, x + 60.0, y + 18.0, BODY_SIZE, color);
            renderer.draw_text(
                &format!("{} HP", participant.health.max(0)),
                x + 60.0,
                y + 40.0,
                BODY_SIZE * 0.8,
                Rgba::GRAY,
            );
            draw_bar(renderer, x + 150.0, y + 30.0, 100.0, 8.0, fraction, health_color(fraction));

            if target == Some(participant.entity) {
                renderer.draw_rect_outline(x - 4.0, y - 4.0, 56.0, 56.0, 2.0, HIGHLIGHT);
            }
        }
    }

    fn draw_action_menu(&self, ctx: &GameContext, renderer: &mut dyn Renderer, top: f32) {
        let ability = self
            .actor_abilities(ctx)
            .and_then(|abilities| abilities.list.get(self.ability).map(|a| (a, abilities)));
        for (index, option) in ACTION_OPTIONS.iter().enumerate() {
            let text = match (ActionChoice::from_index(index), ability) {
                (ActionChoice::Ability, Some((ability, pool))) => format!(
                    "Ability: < {} > ({}/{} MP)",
                    ability.name, ability.mana_cost, pool.mana
                ),
                (ActionChoice::Ability, None) => "Ability: none".to_string(),
                _ => option.to_string(),
            };
            let color = if index == self.selected { HIGHLIGHT } else { Rgba::WHITE };
            let marker = if index == self.selected { "> " } else { "  " };
            let y = top + index as f32 * (BODY_SIZE + 8.0);
            renderer.draw_text(&format!("{}{}", marker, text), 40.0, y, BODY_SIZE, color);
        }
    }
}

impl GameState for CombatState {
    fn kind(&self) -> StateKind {
        StateKind::Combat
    }

    fn on_enter(&mut self, ctx: &mut GameContext) -> GameResult<()> {
        let party = self.spawn_companions(ctx)?;
        for &entity in party.iter().chain(&self.enemies) {
            if let Some(health) = ctx.world.get_component::<Health>(entity) {
                self.starting_health.insert(entity, health.current);
            }
        }

        self.engine = CombatEngine::new(ctx.combat_config());
        if let Err(e) = self
            .engine
            .initialize_combat(&ctx.world, &party, &self.enemies, &mut ctx.rng)
        {
            self.despawn_companions(ctx);
            return Err(e);
        }
        ctx.record_event(GameEvent::BattleStarted {
            enemies: self.engine.living(Team::Enemy).len(),
        });
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        if !self.reported && self.engine.is_finished() {
            self.report(ctx);
        }
        self.despawn_companions(ctx);
    }

    fn handle_input(&mut self, input: &InputFrame, ctx: &mut GameContext) -> Transition {
        if self.engine.phase() != CombatPhase::ActionSelect {
            return Transition::None;
        }
        if let Some(index) = self.targeting {
            self.handle_targeting(index, input, ctx);
            return Transition::None;
        }

        self.selected = step_selection(self.selected, ACTION_OPTIONS.len(), input);
        if self.selected_action() == ActionChoice::Ability {
            let count = self
                .actor_abilities(ctx)
                .map(|abilities| abilities.list.len())
                .unwrap_or(0);
            if count > 0 {
                if input.pressed(GameInput::Left) {
                    self.ability = (self.ability + count - 1) % count;
                }
                if input.pressed(GameInput::Right) {
                    self.ability = (self.ability + 1) % count;
                }
                self.ability %= count;
            }
        }

        if input.pressed(GameInput::Confirm) {
            match self.selected_action() {
                ActionChoice::Attack | ActionChoice::Ability => self.targeting = Some(0),
                ActionChoice::Defend => self.submit(CombatAction::Defend, ctx),
                ActionChoice::Flee => self.submit(CombatAction::Flee, ctx),
            }
        }
        Transition::None
    }

    fn update(&mut self, dt: f32, ctx: &mut GameContext) -> Transition {
        let executing = self.engine.phase() == CombatPhase::ActionExecute;
        let actor = self.engine.current_actor().map(|actor| actor.entity);

        self.engine.update(dt, &mut ctx.world, &mut ctx.rng);

        if executing && self.engine.phase() != CombatPhase::ActionExecute {
            let sound = actor
                .and_then(|actor| ctx.world.get_component::<AudioSource>(actor))
                .map(|source| (source.sound.clone(), source.volume));
            if let Some((sound, volume)) = sound {
                ctx.play_sound(&sound, volume);
            }
        }

        if self.engine.is_finished() {
            if !self.reported {
                self.report(ctx);
            }
            return Transition::Pop;
        }
        Transition::None
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        renderer.clear(Rgba::rgb(16, 12, 24));
        let (width, height) = renderer.screen_size();

        renderer.draw_text(
            &format!("Round {}", self.engine.round()),
            20.0,
            40.0,
            MENU_SIZE,
            Rgba::WHITE,
        );
        let order: Vec<&str> = self
            .engine
            .turn_order()
            .filter(|p| p.is_alive())
            .map(|p| p.name.as_str())
            .collect();
        renderer.draw_text(
            &format!("Order: {}", order.join(" > ")),
            20.0,
            76.0,
            BODY_SIZE,
            Rgba::GRAY,
        );

        self.draw_side(ctx, renderer, Team::Player, 40.0);
        self.draw_side(ctx, renderer, Team::Enemy, width - 300.0);

        let panel_top = height - 200.0;
        draw_panel(renderer, 20.0, panel_top, width - 40.0, 180.0);
        if self.engine.phase() == CombatPhase::ActionSelect {
            self.draw_action_menu(ctx, renderer, panel_top + 34.0);
            if self.targeting.is_some() {
                renderer.draw_text("Choose a target", width * 0.5, panel_top + 34.0, BODY_SIZE, HIGHLIGHT);
            }
        }

        let log = self.engine.log();
        let shown = &log[log.len().saturating_sub(LOG_LINES_SHOWN)..];
        for (index, line) in shown.iter().enumerate() {
            let y = panel_top + 34.0 + index as f32 * (BODY_SIZE + 6.0);
            renderer.draw_text(line, width * 0.5, y + 30.0, BODY_SIZE * 0.8, Rgba::WHITE);
        }
        if let Some(notice) = &self.notice {
            renderer.draw_text(notice, 40.0, panel_top + 170.0, BODY_SIZE * 0.8, Rgba::RED);
        }

        let banner = match (self.engine.phase(), self.engine.outcome()) {
            (CombatPhase::BattleStart, _) => Some(("Battle!", Rgba::GOLD)),
            (_, Some(CombatOutcome::Victory)) => Some(("Victory!", Rgba::GOLD)),
            (_, Some(CombatOutcome::Defeat)) => Some(("Defeat...", Rgba::RED)),
            (_, Some(CombatOutcome::Fled)) => Some(("Escaped!", Rgba::WHITE)),
            _ => None,
        };
        if let Some((text, color)) = banner {
            draw_centered_text(renderer, text, height * 0.35, TITLE_SIZE, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SettingValue, Settings, TemplateLibrary};
    use crate::states::{PlayingState, StateMachine};

    /// A context in the middle of a run with delays switched off.
    fn context() -> GameContext {
        let mut settings = Settings::new();
        settings
            .set("combat", "phase_delay", SettingValue::Float(0.0))
            .unwrap();
        settings
            .set("combat", "action_delay", SettingValue::Float(0.0))
            .unwrap();
        let mut ctx = GameContext::new(settings, TemplateLibrary::builtin(), 5);
        ctx.start_new_run().unwrap();
        ctx
    }

    fn spawn_leader(ctx: &mut GameContext) -> Entity {
        let factory = ctx.factory();
        let member = ctx.party.leader().unwrap().clone();
        let template = ctx.templates.get(&member.template_id).unwrap().clone();
        let entity = factory.spawn_player(
            &mut ctx.world,
            &template,
            &member,
            0,
            Vector2::new(100.0, 100.0),
            Rgba::BLUE,
        );
        ctx.party.member_mut(0).unwrap().entity = Some(entity);
        entity
    }

    fn spawn_slime(ctx: &mut GameContext) -> Entity {
        let template = ctx.templates.get("slime").unwrap().clone();
        ctx.factory()
            .spawn_enemy(&mut ctx.world, &template, Vector2::new(200.0, 100.0), Vec::new())
    }

    fn run_until_select(state: &mut CombatState, ctx: &mut GameContext) {
        for _ in 0..50 {
            if state.engine().phase() == CombatPhase::ActionSelect || state.engine().is_finished() {
                return;
            }
            state.update(0.1, ctx);
        }
    }

    #[test]
    fn test_enter_spawns_companions() {
        let mut ctx = context();
        spawn_leader(&mut ctx);
        let slime = spawn_slime(&mut ctx);

        let mut state = CombatState::new(vec![slime]);
        state.on_enter(&mut ctx).unwrap();

        assert_eq!(state.engine().living(Team::Player).len(), ctx.party.len());
        assert!(ctx.party.members().iter().all(|m| m.entity.is_some()));
        assert_eq!(ctx.statistics.battles_fought, 1);

        state.on_exit(&mut ctx);
        assert_eq!(
            ctx.party.members().iter().filter(|m| m.entity.is_some()).count(),
            1
        );
    }

    #[test]
    fn test_enter_without_enemies_fails_cleanly() {
        let mut ctx = context();
        spawn_leader(&mut ctx);
        let before = ctx.world.entity_count();

        let mut state = CombatState::new(Vec::new());
        assert!(state.on_enter(&mut ctx).is_err());
        assert_eq!(ctx.world.entity_count(), before);
    }

    #[test]
    fn test_attack_menu_targets_and_fights_to_the_end() {
        let mut ctx = context();
        spawn_leader(&mut ctx);
        let slime = spawn_slime(&mut ctx);
        let mut state = CombatState::new(vec![slime]);
        state.on_enter(&mut ctx).unwrap();

        for _ in 0..200 {
            run_until_select(&mut state, &mut ctx);
            if state.engine().is_finished() {
                break;
            }
            state.handle_input(&InputFrame::pressed_once(GameInput::Confirm), &mut ctx);
            assert!(state.is_targeting() || state.engine().phase() != CombatPhase::ActionSelect);
            state.handle_input(&InputFrame::pressed_once(GameInput::Confirm), &mut ctx);
            if matches!(state.update(0.1, &mut ctx), Transition::Pop) {
                break;
            }
        }

        assert!(state.engine().is_finished());
        let report = ctx.last_combat.as_ref().unwrap();
        assert_ne!(report.outcome, CombatOutcome::Fled);
        assert_eq!(
            ctx.statistics.battles_won,
            u32::from(report.outcome == CombatOutcome::Victory)
        );
    }

    #[test]
    fn test_refused_action_sets_notice() {
        let mut ctx = context();
        spawn_leader(&mut ctx);
        let slime = spawn_slime(&mut ctx);
        let mut state = CombatState::new(vec![slime]);
        state.on_enter(&mut ctx).unwrap();
        for member in state.engine().living(Team::Player) {
            let abilities = ctx.world.get_component_mut::<Abilities>(member).unwrap();
            abilities.mana = 0;
            for ability in &mut abilities.list {
                ability.mana_cost = ability.mana_cost.max(1);
            }
        }

        run_until_select(&mut state, &mut ctx);
        assert_eq!(state.engine().phase(), CombatPhase::ActionSelect);
        let down = InputFrame::pressed_once(GameInput::Down);
        state.handle_input(&down, &mut ctx);
        state.handle_input(&down, &mut ctx);
        assert_eq!(state.selected_action(), ActionChoice::Ability);
        state.handle_input(&InputFrame::pressed_once(GameInput::Confirm), &mut ctx);
        state.handle_input(&InputFrame::pressed_once(GameInput::Confirm), &mut ctx);

        assert!(state.notice().is_some());
        assert_eq!(state.engine().phase(), CombatPhase::ActionSelect);
    }

    #[test]
    fn test_report_reaches_playing_state() {
        let mut ctx = context();
        let mut machine = StateMachine::new();
        machine.push(Box::new(PlayingState::new()), &mut ctx);
        let leader = ctx.party.leader().unwrap().entity.unwrap();
        let slime = spawn_slime(&mut ctx);
        ctx.world.get_component_mut::<Health>(slime).unwrap().current = 1;
        ctx.world.get_component_mut::<Stats>(leader).unwrap().accuracy = 100.0;

        machine.push(Box::new(CombatState::new(vec![slime])), &mut ctx);
        assert_eq!(machine.current_kind(), Some(StateKind::Combat));

        for _ in 0..200 {
            if machine.current_kind() != Some(StateKind::Combat) {
                break;
            }
            machine.update(0.1, &mut ctx);
            machine.handle_input(&InputFrame::pressed_once(GameInput::Confirm), &mut ctx);
        }
        assert_eq!(machine.current_kind(), Some(StateKind::Playing));
        assert!(ctx.last_combat.is_none());
        assert_eq!(ctx.statistics.battles_won, 1);
    }
}
