//! Real-time exploration of the arena.
//!
//! The party leader walks around collecting pickups while enemies patrol and
//! hunt. Touching an enemy, or being attacked by one, starts a battle with
//! every living enemy nearby. Clearing the arena brings the next wave.

use crate::combat::CombatOutcome;
use crate::components::{EntityKind, Health, Pickup, Stats, Tag, Velocity};
use crate::ecs::{Entity, EntityManager};
use crate::game::GameEvent;
use crate::input::{GameInput, InputFrame};
use crate::rendering::{
    draw_bar, draw_centered_text, draw_panel, draw_world, health_color, Renderer, BODY_SIZE,
    MENU_SIZE,
};
use crate::states::{
    CombatState, GameContext, GameOverState, GameState, PauseState, StateKind, Transition,
};
use crate::systems::{center_of, AiSystem, CollisionSystem, HealthSystem};
use crate::utils::{Rgba, Vector2};
use crate::GameResult;
use log::{debug, info};
use rand::Rng;

/// Seconds after a battle during which touching an enemy does nothing.
pub const ENGAGE_GRACE: f32 = 1.5;
/// Longer grace after running away.
pub const FLEE_GRACE: f32 = 3.0;
pub const PICKUPS_PER_WAVE: usize = 3;
pub const PICKUP_HEAL: i32 = 15;
pub const PICKUP_SCORE: u32 = 50;
pub const PICKUP_SOUND: &str = "assets/sounds/pickup.wav";
/// Enemies spawn at least this far from the leader.
const SPAWN_CLEARANCE: f32 = 220.0;
const SPAWN_MARGIN: f32 = 40.0;
const PATROL_REACH: f32 = 120.0;
const MESSAGE_TIME: f32 = 2.5;
/// Hit points a member downed in a won battle gets back.
pub const REVIVE_HEALTH: i32 = 1;

#[derive(Debug, Default)]
pub struct PlayingState {
    leader: Option<Entity>,
    engage_cooldown: f32,
    wave: u32,
    /// Set when a battle was lost; the next update ends the run
    defeated: bool,
    message: Option<(String, f32)>,
}

impl PlayingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leader(&self) -> Option<Entity> {
        self.leader
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    fn announce(&mut self, text: impl Into<String>) {
        self.message = Some((text.into(), MESSAGE_TIME));
    }

    fn spawn_leader(&mut self, ctx: &mut GameContext) -> GameResult<()> {
        let factory = ctx.factory();
        let center = ctx.arena_bounds().center();
        let Some(member) = ctx.party.leader() else {
            return Err(crate::GameError::InvalidState("the party is empty".to_string()));
        };
        let template = ctx.templates.require(&member.template_id)?;
        let tint = ctx.customization.tint();
        let entity = factory.spawn_player(&mut ctx.world, template, member, 0, center, tint);

        if let Some(leader) = ctx.party.member_mut(0) {
            leader.entity = Some(entity);
        }
        self.leader = Some(entity);
        Ok(())
    }

    fn spawn_wave(&mut self, ctx: &mut GameContext) {
        self.wave += 1;
        let factory = ctx.factory();
        let bounds = ctx.arena_bounds();
        let avoid = self
            .leader
            .and_then(|leader| center_of(&ctx.world, leader))
            .unwrap_or_else(|| bounds.center());
        let count = ctx
            .settings
            .get_int("gameplay", "enemy_count")
            .unwrap_or(5)
            .max(1) as usize;

        let enemy_ids = ctx.templates.ids_of_kind(EntityKind::Enemy);
        if enemy_ids.is_empty() {
            return;
        }
        for _ in 0..count {
            let id = enemy_ids[ctx.rng.gen_range(0..enemy_ids.len())];
            let Some(template) = ctx.templates.get(id) else {
                continue;
            };
            let position = random_point_away_from(&mut ctx.rng, bounds.min, bounds.max, avoid);
            let waypoint = Vector2::new(
                (position.x + ctx.rng.gen_range(-PATROL_REACH..PATROL_REACH))
                    .clamp(bounds.min.x + SPAWN_MARGIN, bounds.max.x - SPAWN_MARGIN),
                (position.y + ctx.rng.gen_range(-PATROL_REACH..PATROL_REACH))
                    .clamp(bounds.min.y + SPAWN_MARGIN, bounds.max.y - SPAWN_MARGIN),
            );
            factory.spawn_enemy(&mut ctx.world, template, position, vec![position, waypoint]);
        }

        for _ in 0..PICKUPS_PER_WAVE {
            let position = random_point_away_from(&mut ctx.rng, bounds.min, bounds.max, avoid);
            factory.spawn_pickup(&mut ctx.world, position, PICKUP_HEAL, PICKUP_SCORE);
        }

        info!("Wave {} with {} enemies", self.wave, count);
        self.announce(format!("Wave {}", self.wave));
    }

    fn collect_pickup(&mut self, ctx: &mut GameContext, leader: Entity, pickup: Entity) {
        if ctx.world.is_pending_destroy(pickup) {
            return;
        }
        let Some(&Pickup { heal, score }) = ctx.world.get_component::<Pickup>(pickup) else {
            return;
        };
        if let Some(health) = ctx.world.get_component_mut::<Health>(leader) {
            let healed = health.heal(heal);
            debug!("pickup healed {} for {}", leader, healed);
        }
        ctx.world.destroy_entity(pickup);
        ctx.play_sound(PICKUP_SOUND, 1.0);
        ctx.record_event(GameEvent::PickupCollected { score });
        ctx.party.sync_from_world(&ctx.world);
    }

    /// Living enemies close enough to join a battle started by `trigger`.
    fn gather_enemies(&self, ctx: &GameContext, leader: Entity, trigger: Entity) -> Vec<Entity> {
        let radius = ctx
            .settings
            .get_float("gameplay", "engage_radius")
            .unwrap_or(160.0) as f32;
        let origin = center_of(&ctx.world, leader).unwrap_or(Vector2::ZERO);

        let mut enemies: Vec<Entity> = living_enemies(&ctx.world)
            .into_iter()
            .filter(|&enemy| {
                enemy == trigger
                    || center_of(&ctx.world, enemy)
                        .map(|at| at.distance(origin) <= radius)
                        .unwrap_or(false)
            })
            .collect();
        if !enemies.contains(&trigger) && is_living_enemy(&ctx.world, trigger) {
            enemies.insert(0, trigger);
        }
        enemies
    }

    /// Applies the result of the battle that just ended.
    fn apply_combat_report(&mut self, ctx: &mut GameContext) {
        let Some(report) = ctx.last_combat.take() else {
            return;
        };
        self.engage_cooldown = ENGAGE_GRACE;

        match report.outcome {
            CombatOutcome::Victory => {
                for &enemy in &report.defeated_enemies {
                    ctx.world.destroy_entity(enemy);
                }
                ctx.record_event(GameEvent::ScoreGained {
                    points: report.rewards.score,
                });
                for (member, level) in ctx.party.award_experience(report.rewards.experience) {
                    ctx.record_event(GameEvent::PartyLevelUp { member, level });
                }
                let revived = ctx.party.revive_fallen(REVIVE_HEALTH);
                if !revived.is_empty() {
                    info!("Revived {} fallen party members", revived.len());
                }
                self.refresh_leader(ctx);
                self.announce(format!(
                    "Victory! +{} XP, +{} score",
                    report.rewards.experience, report.rewards.score
                ));
            }
            CombatOutcome::Fled => {
                self.engage_cooldown = FLEE_GRACE;
                self.announce("Got away safely");
            }
            CombatOutcome::Defeat => {
                info!("The party has fallen");
                self.defeated = true;
            }
        }
    }

    /// Copies the leader's level, stats and health onto its entity.
    fn refresh_leader(&self, ctx: &mut GameContext) {
        let (Some(entity), Some(member)) = (self.leader, ctx.party.leader()) else {
            return;
        };
        let (stats, max, current) = (member.stats.clone(), member.max_health, member.current_health);
        if let Some(entity_stats) = ctx.world.get_component_mut::<Stats>(entity) {
            *entity_stats = stats;
        }
        if let Some(health) = ctx.world.get_component_mut::<Health>(entity) {
            health.max = max;
            health.current = current.clamp(0, max);
            health.dead = health.current <= 0;
        }
    }
}

fn is_living_enemy(world: &EntityManager, entity: Entity) -> bool {
    let enemy = world
        .get_component::<Tag>(entity)
        .map(|tag| tag.is(EntityKind::Enemy))
        .unwrap_or(false);
    let alive = world
        .get_component::<Health>(entity)
        .map(|health| !health.is_dead())
        .unwrap_or(false);
    enemy && alive && !world.is_pending_destroy(entity)
}

pub fn living_enemies(world: &EntityManager) -> Vec<Entity> {
    world
        .entities_with::<(Tag, Health)>()
        .into_iter()
        .filter(|&entity| is_living_enemy(world, entity))
        .collect()
}

/// A random point inside the margin of `min..max`, preferably at least
/// [`SPAWN_CLEARANCE`] from `avoid`.
fn random_point_away_from(
    rng: &mut impl Rng,
    min: Vector2,
    max: Vector2,
    avoid: Vector2,
) -> Vector2 {
    let low = Vector2::new(min.x + SPAWN_MARGIN, min.y + SPAWN_MARGIN);
    let high = Vector2::new(
        (max.x - SPAWN_MARGIN).max(low.x + 1.0),
        (max.y - SPAWN_MARGIN).max(low.y + 1.0),
    );
    let mut point = low;
    for _ in 0..20 {
        point = Vector2::new(rng.gen_range(low.x..high.x), rng.gen_range(low.y..high.y));
        if point.distance(avoid) >= SPAWN_CLEARANCE {
            break;
        }
    }
    point
}

impl GameState for PlayingState {
    fn kind(&self) -> StateKind {
        StateKind::Playing
    }

    fn on_enter(&mut self, ctx: &mut GameContext) -> GameResult<()> {
        ctx.start_new_run()?;
        self.spawn_leader(ctx)?;
        self.spawn_wave(ctx);
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        ctx.world.clear();
        ctx.party.detach_entities();
    }

    fn on_pause(&mut self, ctx: &mut GameContext) {
        if let Some(velocity) = self
            .leader
            .and_then(|leader| ctx.world.get_component_mut::<Velocity>(leader))
        {
            velocity.0 = Vector2::ZERO;
        }
    }

    fn on_resume(&mut self, ctx: &mut GameContext) {
        self.apply_combat_report(ctx);
    }

    fn handle_input(&mut self, input: &InputFrame, ctx: &mut GameContext) -> Transition {
        if input.pressed(GameInput::Back) || input.pressed(GameInput::Pause) {
            return Transition::Push(Box::new(PauseState::new()));
        }
        let Some(leader) = self.leader else {
            return Transition::None;
        };
        let speed = ctx
            .world
            .get_component::<Stats>(leader)
            .map(|stats| stats.move_speed)
            .unwrap_or_default();
        if let Some(velocity) = ctx.world.get_component_mut::<Velocity>(leader) {
            velocity.0 = input.movement * speed;
        }
        Transition::None
    }

    fn update(&mut self, dt: f32, ctx: &mut GameContext) -> Transition {
        if self.defeated {
            return Transition::Switch(Box::new(GameOverState::new()));
        }
        ctx.statistics.play_time += dt;
        self.engage_cooldown = (self.engage_cooldown - dt).max(0.0);
        if let Some((_, timer)) = &mut self.message {
            *timer -= dt;
            if *timer <= 0.0 {
                self.message = None;
            }
        }

        ctx.world.update(dt);

        let collisions = ctx
            .world
            .get_system_mut::<CollisionSystem>()
            .map(|system| system.drain_collisions())
            .unwrap_or_default();
        let attacks = ctx
            .world
            .get_system_mut::<AiSystem>()
            .map(|system| system.drain_attacks())
            .unwrap_or_default();
        if let Some(health) = ctx.world.get_system_mut::<HealthSystem>() {
            health.drain_deaths();
        }

        let Some(leader) = self.leader else {
            return Transition::None;
        };

        let mut trigger = None;
        for collision in &collisions {
            let Some(other) = collision.other(leader) else {
                continue;
            };
            if ctx.world.has_component::<Pickup>(other) {
                self.collect_pickup(ctx, leader, other);
            } else if trigger.is_none() && is_living_enemy(&ctx.world, other) {
                trigger = Some(other);
            }
        }
        if trigger.is_none() {
            trigger = attacks
                .iter()
                .find(|attack| attack.target == leader)
                .map(|attack| attack.attacker);
        }

        if let Some(trigger) = trigger {
            if self.engage_cooldown <= 0.0 {
                let enemies = self.gather_enemies(ctx, leader, trigger);
                if !enemies.is_empty() {
                    info!("Engaging {} enemies", enemies.len());
                    return Transition::Push(Box::new(CombatState::new(enemies)));
                }
            }
        }

        if living_enemies(&ctx.world).is_empty() {
            self.spawn_wave(ctx);
        }
        Transition::None
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        renderer.clear(Rgba::rgb(24, 32, 24));
        let bounds = ctx.arena_bounds();
        renderer.draw_rect_outline(
            bounds.min.x,
            bounds.min.y,
            bounds.width(),
            bounds.height(),
            2.0,
            Rgba::GRAY,
        );
        draw_world(renderer, &ctx.world);

        draw_panel(renderer, 10.0, 10.0, 280.0, 30.0 + ctx.party.len() as f32 * 24.0);
        renderer.draw_text(
            &format!("Score {}   Wave {}", ctx.statistics.score, self.wave),
            20.0,
            32.0,
            BODY_SIZE,
            Rgba::GOLD,
        );
        for (slot, member) in ctx.party.members().iter().enumerate() {
            let y = 40.0 + slot as f32 * 24.0;
            let fraction = if member.max_health > 0 {
                member.current_health as f32 / member.max_health as f32
            } else {
                0.0
            };
            let leader_health = (slot == 0)
                .then(|| self.leader)
                .flatten()
                .and_then(|leader| ctx.world.get_component::<Health>(leader))
                .map(Health::fraction);
            let fraction = leader_health.unwrap_or(fraction);
            renderer.draw_text(
                &format!("{} Lv{}", member.name, member.level),
                20.0,
                y + 16.0,
                BODY_SIZE * 0.8,
                Rgba::WHITE,
            );
            draw_bar(renderer, 160.0, y + 6.0, 120.0, 10.0, fraction, health_color(fraction));
        }

        if let Some((text, _)) = &self.message {
            let (_, height) = renderer.screen_size();
            draw_centered_text(renderer, text, height * 0.2, MENU_SIZE, Rgba::WHITE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{CombatReport, Rewards};
    use crate::components::Transform;
    use crate::config::{Settings, TemplateLibrary};

    fn context() -> GameContext {
        GameContext::new(Settings::new(), TemplateLibrary::builtin(), 11)
    }

    fn transform_distance(world: &EntityManager, a: Entity, b: Entity) -> Option<f32> {
        let a = world.get_component::<Transform>(a)?.position;
        let b = world.get_component::<Transform>(b)?.position;
        Some(a.distance(b))
    }

    fn entered() -> (PlayingState, GameContext) {
        let mut ctx = context();
        let mut state = PlayingState::new();
        state.on_enter(&mut ctx).unwrap();
        (state, ctx)
    }

    #[test]
    fn test_enter_spawns_leader_and_wave() {
        let (state, ctx) = entered();
        assert!(state.leader().is_some());
        assert_eq!(state.wave(), 1);
        assert_eq!(living_enemies(&ctx.world).len(), 5);
        assert_eq!(ctx.world.component_count::<Pickup>(), PICKUPS_PER_WAVE);
        assert_eq!(ctx.party.leader().unwrap().entity, state.leader());
    }

    #[test]
    fn test_enemies_spawn_away_from_leader() {
        let (state, ctx) = entered();
        let leader = state.leader().unwrap();
        for enemy in living_enemies(&ctx.world) {
            let distance = transform_distance(&ctx.world, leader, enemy).unwrap();
            assert!(distance > 100.0, "enemy spawned {} away", distance);
        }
    }

    #[test]
    fn test_movement_input_sets_velocity() {
        let (mut state, mut ctx) = entered();
        let leader = state.leader().unwrap();
        let speed = ctx.world.get_component::<Stats>(leader).unwrap().move_speed;

        state.handle_input(&InputFrame::with_movement(Vector2::new(1.0, 0.0)), &mut ctx);
        let velocity = ctx.world.get_component::<Velocity>(leader).unwrap().0;
        assert_eq!(velocity, Vector2::new(speed, 0.0));
    }

    #[test]
    fn test_pause_pushes_overlay() {
        let (mut state, mut ctx) = entered();
        let transition = state.handle_input(&InputFrame::pressed_once(GameInput::Pause), &mut ctx);
        assert!(matches!(transition, Transition::Push(next) if next.kind() == StateKind::Pause));
    }

    #[test]
    fn test_touching_pickup_collects_it() {
        let (mut state, mut ctx) = entered();
        let leader = state.leader().unwrap();
        let at = ctx.world.get_component::<Transform>(leader).unwrap().position;
        ctx.world.get_component_mut::<Health>(leader).unwrap().current -= 20;
        let before = ctx.world.get_component::<Health>(leader).unwrap().current;

        ctx.factory().spawn_pickup(&mut ctx.world, at, PICKUP_HEAL, PICKUP_SCORE);
        state.update(0.016, &mut ctx);

        assert_eq!(ctx.statistics.pickups_collected, 1);
        assert_eq!(ctx.statistics.score, PICKUP_SCORE as u64);
        assert_eq!(
            ctx.world.get_component::<Health>(leader).unwrap().current,
            before + PICKUP_HEAL
        );
    }

    #[test]
    fn test_touching_enemy_starts_combat() {
        let (mut state, mut ctx) = entered();
        let leader = state.leader().unwrap();
        let at = ctx.world.get_component::<Transform>(leader).unwrap().position;
        let template = ctx.templates.get("slime").unwrap().clone();
        ctx.factory().spawn_enemy(&mut ctx.world, &template, at, Vec::new());

        let transition = state.update(0.016, &mut ctx);
        assert!(matches!(transition, Transition::Push(next) if next.kind() == StateKind::Combat));
    }

    #[test]
    fn test_grace_period_blocks_engagement() {
        let (mut state, mut ctx) = entered();
        let leader = state.leader().unwrap();
        let at = ctx.world.get_component::<Transform>(leader).unwrap().position;
        let template = ctx.templates.get("slime").unwrap().clone();
        ctx.factory().spawn_enemy(&mut ctx.world, &template, at, Vec::new());

        ctx.last_combat = Some(CombatReport {
            outcome: CombatOutcome::Fled,
            rewards: Rewards::default(),
            defeated_enemies: Vec::new(),
            party_health: Vec::new(),
            rounds: 1,
        });
        state.on_resume(&mut ctx);
        assert!(matches!(state.update(0.016, &mut ctx), Transition::None));
    }

    #[test]
    fn test_victory_report_awards_and_removes_enemies() {
        let (mut state, mut ctx) = entered();
        let enemy = living_enemies(&ctx.world)[0];
        ctx.last_combat = Some(CombatReport {
            outcome: CombatOutcome::Victory,
            rewards: Rewards {
                experience: 150,
                score: 300,
            },
            defeated_enemies: vec![enemy],
            party_health: Vec::new(),
            rounds: 2,
        });

        state.on_resume(&mut ctx);

        assert!(ctx.world.is_pending_destroy(enemy));
        assert_eq!(ctx.statistics.score, 300);
        assert_eq!(ctx.party.leader().unwrap().level, 2);
        let leader = state.leader().unwrap();
        let stats_level = ctx.world.get_component::<Stats>(leader).unwrap().level;
        assert_eq!(stats_level, 2);
    }

    #[test]
    fn test_victory_with_fallen_leader_revives_and_moves() {
        let (mut state, mut ctx) = entered();
        let leader = state.leader().unwrap();
        let start = ctx.world.get_component::<Transform>(leader).unwrap().position;
        {
            let health = ctx.world.get_component_mut::<Health>(leader).unwrap();
            health.current = 0;
            health.dead = true;
        }
        ctx.party.sync_from_world(&ctx.world);
        ctx.last_combat = Some(CombatReport {
            outcome: CombatOutcome::Victory,
            rewards: Rewards::default(),
            defeated_enemies: Vec::new(),
            party_health: vec![(leader, 0)],
            rounds: 4,
        });

        state.on_resume(&mut ctx);

        let health = ctx.world.get_component::<Health>(leader).unwrap();
        assert_eq!(health.current, REVIVE_HEALTH);
        assert!(!health.is_dead());
        assert!(ctx.party.leader().unwrap().is_alive());

        state.handle_input(&InputFrame::with_movement(Vector2::new(1.0, 0.0)), &mut ctx);
        state.update(0.1, &mut ctx);
        let now = ctx.world.get_component::<Transform>(leader).unwrap().position;
        assert!(now.x > start.x, "leader stayed at {:?}", now);
    }

    #[test]
    fn test_defeat_report_ends_run() {
        let (mut state, mut ctx) = entered();
        ctx.last_combat = Some(CombatReport {
            outcome: CombatOutcome::Defeat,
            rewards: Rewards::default(),
            defeated_enemies: Vec::new(),
            party_health: Vec::new(),
            rounds: 3,
        });
        state.on_resume(&mut ctx);
        let transition = state.update(0.016, &mut ctx);
        assert!(matches!(transition, Transition::Switch(next) if next.kind() == StateKind::GameOver));
    }

    #[test]
    fn test_cleared_arena_spawns_next_wave() {
        let (mut state, mut ctx) = entered();
        for enemy in living_enemies(&ctx.world) {
            ctx.world.destroy_entity(enemy);
        }
        ctx.world.flush_destroyed();
        state.update(0.016, &mut ctx);
        assert_eq!(state.wave(), 2);
        assert_eq!(living_enemies(&ctx.world).len(), 5);
    }
}
