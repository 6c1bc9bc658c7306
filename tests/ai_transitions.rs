//! Enemy AI driven through a full world with movement.

use emberfall::systems::{center_of, find_nearest_player, WAYPOINT_TOLERANCE};
use emberfall::{
    AiComponent, AiState, AiSystem, EntityKind, EntityManager, Health, HealthSystem,
    MovementSystem, Tag, Transform, Vector2, Velocity,
};

fn world() -> EntityManager {
    let mut world = EntityManager::new();
    world.add_system(AiSystem::new());
    world.add_system(MovementSystem::new(None));
    world.add_system(HealthSystem::new());
    world
}

fn spawn(world: &mut EntityManager, at: Vector2, kind: EntityKind) -> emberfall::Entity {
    let e = world.create_entity();
    world.add_component(e, Transform::at(at));
    world.add_component(e, Velocity::default());
    world.add_component(e, Tag(kind));
    world.add_component(e, Health::new(50));
    e
}

fn state_of(world: &EntityManager, e: emberfall::Entity) -> AiState {
    world.get_component::<AiComponent>(e).unwrap().state
}

#[test]
fn test_enemy_closes_distance_and_attacks() {
    let mut world = world();
    let player = spawn(&mut world, Vector2::new(150.0, 0.0), EntityKind::Player);
    let enemy = spawn(&mut world, Vector2::ZERO, EntityKind::Enemy);
    world.add_component(enemy, AiComponent::default());

    let mut attacks = Vec::new();
    for _ in 0..40 {
        world.update(0.1);
        if let Some(ai) = world.get_system_mut::<AiSystem>() {
            attacks.extend(ai.drain_attacks());
        }
    }

    assert_eq!(state_of(&world, enemy), AiState::Attack);
    let x = world.get_component::<Transform>(enemy).unwrap().position.x;
    assert!(x > 100.0, "enemy only reached x = {}", x);
    assert!(!attacks.is_empty());
    assert!(attacks.iter().all(|a| a.attacker == enemy && a.target == player));
}

#[test]
fn test_patrol_turns_around_at_route_end() {
    let mut world = world();
    let enemy = spawn(&mut world, Vector2::ZERO, EntityKind::Enemy);
    let ai = AiComponent::default().with_patrol(vec![Vector2::ZERO, Vector2::new(100.0, 0.0)]);
    world.add_component(enemy, ai);

    let mut went_back = false;
    let mut furthest: f32 = 0.0;
    for _ in 0..80 {
        world.update(0.1);
        let x = world.get_component::<Transform>(enemy).unwrap().position.x;
        furthest = furthest.max(x);
        if world.get_component::<Velocity>(enemy).unwrap().0.x < 0.0 {
            went_back = true;
        }
    }

    assert_eq!(state_of(&world, enemy), AiState::Patrol);
    assert!(furthest >= 96.0);
    assert!(furthest <= 105.0 + WAYPOINT_TOLERANCE);
    assert!(went_back);
}

#[test]
fn test_killed_enemy_dies_and_despawns() {
    let mut world = world();
    spawn(&mut world, Vector2::new(50.0, 0.0), EntityKind::Player);
    let enemy = spawn(&mut world, Vector2::ZERO, EntityKind::Enemy);
    world.add_component(enemy, AiComponent::default());

    world.update(0.1);
    assert_eq!(state_of(&world, enemy), AiState::Chase);

    world.get_component_mut::<Health>(enemy).unwrap().apply_damage(100);
    world.update(0.1);
    assert_eq!(state_of(&world, enemy), AiState::Dead);
    assert_eq!(world.get_component::<Velocity>(enemy).unwrap().0, Vector2::ZERO);

    for _ in 0..20 {
        world.update(0.1);
    }
    assert!(!world.is_valid(enemy));
}

#[test]
fn test_dead_player_is_not_hunted() {
    let mut world = world();
    let player = spawn(&mut world, Vector2::new(50.0, 0.0), EntityKind::Player);
    world.get_component_mut::<Health>(player).unwrap().current = 0;
    let enemy = spawn(&mut world, Vector2::ZERO, EntityKind::Enemy);
    world.add_component(enemy, AiComponent::default());

    for _ in 0..5 {
        world.update(0.1);
    }
    assert_eq!(state_of(&world, enemy), AiState::Idle);
    assert!(world.is_valid(player));
}

#[test]
fn test_nearest_player_helpers_are_public() {
    let mut world = world();
    let near = spawn(&mut world, Vector2::new(40.0, 0.0), EntityKind::Player);
    spawn(&mut world, Vector2::new(90.0, 0.0), EntityKind::Player);
    let enemy = spawn(&mut world, Vector2::ZERO, EntityKind::Enemy);

    assert_eq!(center_of(&world, near), Some(Vector2::new(40.0, 0.0)));
    let found = find_nearest_player(&world, enemy, Vector2::ZERO, 200.0);
    assert_eq!(found.map(|(e, _)| e), Some(near));
    assert!(find_nearest_player(&world, enemy, Vector2::ZERO, 10.0).is_none());
}
