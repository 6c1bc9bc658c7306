//! Enemy AI state machine.
//!
//! ```text
//! Idle ──target──▶ Chase ──in range──▶ Attack
//!   ▲                │  ▲                 │
//!   │              lost └──out of range───┤
//!   │                ▼                  lost
//!   └──timeout── Search ◀─────────────────┘
//! ```
//!
//! Any live state can drop into `Flee` when health is low, and a dead entity
//! is forced into the terminal `Dead` state.

use crate::components::{
    AiComponent, AiState, Collider, EntityKind, Health, Tag, Transform, Velocity,
};
use crate::ecs::{Entity, EntityManager, System};
use crate::utils::Vector2;
use log::debug;
use std::any::Any;

/// Distance at which a waypoint or search point counts as reached.
pub const WAYPOINT_TOLERANCE: f32 = 4.0;

/// An attack fired by an entity in the `Attack` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackEvent {
    pub attacker: Entity,
    pub target: Entity,
}

/// Drives every entity with an [`AiComponent`] and [`Transform`].
///
/// The system only writes [`Velocity`]; integration is the movement system's
/// job. Attacks are queued as [`AttackEvent`]s for the game state to resolve.
#[derive(Debug, Default)]
pub struct AiSystem {
    attacks: Vec<AttackEvent>,
}

impl AiSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain_attacks(&mut self) -> Vec<AttackEvent> {
        std::mem::take(&mut self.attacks)
    }

    fn think(
        &mut self,
        world: &EntityManager,
        entity: Entity,
        ai: &mut AiComponent,
        dt: f32,
    ) -> Vector2 {
        if ai.is_dead() {
            return Vector2::ZERO;
        }

        let health_fraction = match world.get_component::<Health>(entity) {
            Some(health) if health.is_dead() => {
                ai.change_state(AiState::Dead);
                ai.target = None;
                return Vector2::ZERO;
            }
            Some(health) => health.fraction(),
            None => 1.0,
        };

        let Some(position) = center_of(world, entity) else {
            return Vector2::ZERO;
        };
        ai.state_timer += dt;

        let mut target_position = ai.target.and_then(|target| live_position(world, target));
        if target_position.is_none() {
            ai.target = None;
        }

        if ai.target.is_none() && matches!(ai.state, AiState::Idle | AiState::Patrol | AiState::Search) {
            if let Some((target, found_at)) =
                find_nearest_player(world, entity, position, ai.tuning.detection_radius)
            {
                ai.target = Some(target);
                target_position = Some(found_at);
            }
        }

        if ai.tuning.can_flee
            && health_fraction < ai.tuning.flee_health_threshold
            && target_position.is_some()
        {
            ai.change_state(AiState::Flee);
        }

        self.transition(entity, ai, position, target_position, health_fraction);
        steer(ai, position, target_position)
    }

    fn transition(
        &mut self,
        entity: Entity,
        ai: &mut AiComponent,
        position: Vector2,
        target_position: Option<Vector2>,
        health_fraction: f32,
    ) {
        let before = ai.state;
        if let Some(found_at) = target_position {
            ai.last_known_target = Some(found_at);
        }
        let distance = target_position.map(|p| position.distance(p));

        match ai.state {
            AiState::Idle => {
                if ai.target.is_some() {
                    ai.change_state(AiState::Chase);
                } else if !ai.patrol_points.is_empty()
                    && ai.state_timer >= ai.tuning.idle_duration
                {
                    ai.change_state(AiState::Patrol);
                }
            }
            AiState::Patrol => {
                if ai.target.is_some() {
                    ai.change_state(AiState::Chase);
                }
            }
            AiState::Chase => match distance {
                Some(d) if d > ai.tuning.lose_target_radius => lose_target(ai),
                Some(d) if d <= ai.tuning.attack_range => ai.change_state(AiState::Attack),
                Some(_) => {}
                None => lose_target(ai),
            },
            AiState::Attack => match (distance, ai.target) {
                (Some(d), _) if d > ai.tuning.lose_target_radius => lose_target(ai),
                (Some(d), _) if d > ai.tuning.attack_range => ai.change_state(AiState::Chase),
                (Some(_), Some(target)) => {
                    if ai.state_timer - ai.last_attack_time >= ai.tuning.attack_cooldown {
                        ai.last_attack_time = ai.state_timer;
                        self.attacks.push(AttackEvent {
                            attacker: entity,
                            target,
                        });
                    }
                }
                _ => lose_target(ai),
            },
            AiState::Search => {
                if ai.target.is_some() {
                    ai.change_state(AiState::Chase);
                } else if ai.state_timer >= ai.tuning.search_duration {
                    ai.last_known_target = None;
                    rest(ai);
                }
            }
            AiState::Flee => match distance {
                Some(d) if d > ai.tuning.lose_target_radius => {
                    ai.target = None;
                    rest(ai);
                }
                Some(_) if health_fraction >= ai.tuning.flee_health_threshold => {
                    ai.change_state(AiState::Chase);
                }
                Some(_) => {}
                None => rest(ai),
            },
            AiState::Dead => {}
        }

        if ai.state != before {
            debug!("{} ai {:?} -> {:?}", entity, before, ai.state);
        }
    }
}

impl System for AiSystem {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn update(&mut self, world: &mut EntityManager, dt: f32) {
        for entity in world.entities_with::<(AiComponent, Transform)>() {
            // Taken out so the rest of the world can be read while it changes
            let Some(mut ai) = world.remove_component::<AiComponent>(entity) else {
                continue;
            };
            let velocity = self.think(world, entity, &mut ai, dt);
            world.add_component(entity, ai);

            if let Some(current) = world.get_component_mut::<Velocity>(entity) {
                current.0 = velocity;
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Velocity for the current state.
fn steer(ai: &mut AiComponent, position: Vector2, target_position: Option<Vector2>) -> Vector2 {
    match ai.state {
        AiState::Idle | AiState::Attack | AiState::Dead => Vector2::ZERO,
        AiState::Patrol => {
            let Some(mut waypoint) = ai.current_waypoint() else {
                return Vector2::ZERO;
            };
            if position.distance(waypoint) <= WAYPOINT_TOLERANCE {
                ai.advance_waypoint();
                waypoint = ai.current_waypoint().unwrap_or(position);
            }
            position.direction_to(waypoint) * ai.tuning.patrol_speed
        }
        AiState::Chase => target_position
            .map(|target| position.direction_to(target) * ai.tuning.chase_speed)
            .unwrap_or(Vector2::ZERO),
        AiState::Search => match ai.last_known_target {
            Some(spot) if position.distance(spot) > WAYPOINT_TOLERANCE => {
                position.direction_to(spot) * ai.tuning.patrol_speed
            }
            _ => Vector2::ZERO,
        },
        AiState::Flee => target_position
            .map(|threat| threat.direction_to(position) * ai.tuning.flee_speed)
            .unwrap_or(Vector2::ZERO),
    }
}

fn lose_target(ai: &mut AiComponent) {
    ai.target = None;
    ai.change_state(AiState::Search);
}

/// Idle, or patrol when there is a route to walk.
fn rest(ai: &mut AiComponent) {
    if ai.patrol_points.is_empty() {
        ai.change_state(AiState::Idle);
    } else {
        ai.change_state(AiState::Patrol);
    }
}

/// Center of the entity's collider, or its transform position without one.
pub fn center_of(world: &EntityManager, entity: Entity) -> Option<Vector2> {
    let transform = world.get_component::<Transform>(entity)?;
    Some(match world.get_component::<Collider>(entity) {
        Some(collider) => collider.bounds(transform).center(),
        None => transform.position,
    })
}

/// Position of `entity` if it exists and is not dead.
fn live_position(world: &EntityManager, entity: Entity) -> Option<Vector2> {
    if !world.is_valid(entity) || is_dead(world, entity) {
        return None;
    }
    center_of(world, entity)
}

fn is_dead(world: &EntityManager, entity: Entity) -> bool {
    world
        .get_component::<Health>(entity)
        .map(|health| health.is_dead())
        .unwrap_or(false)
}

/// Nearest living player within `radius`. Ties go to the first one found.
pub fn find_nearest_player(
    world: &EntityManager,
    seeker: Entity,
    position: Vector2,
    radius: f32,
) -> Option<(Entity, Vector2)> {
    let mut best: Option<(Entity, Vector2, f32)> = None;

    for candidate in world.entities_with::<(Tag, Transform)>() {
        if candidate == seeker {
            continue;
        }
        let is_player = world
            .get_component::<Tag>(candidate)
            .map(|tag| tag.is(EntityKind::Player))
            .unwrap_or(false);
        if !is_player || is_dead(world, candidate) {
            continue;
        }
        let Some(at) = center_of(world, candidate) else {
            continue;
        };

        let distance = position.distance(at);
        if distance > radius {
            continue;
        }
        if best.map(|(_, _, d)| distance < d).unwrap_or(true) {
            best = Some((candidate, at, distance));
        }
    }

    best.map(|(entity, at, _)| (entity, at))
}
