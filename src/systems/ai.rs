//! Enemy decision systems.
//!
//! Regular enemies never move themselves: each tick they publish a
//! `MoveIntent` that the physics stage resolves. Bosses are driven by their
//! own pattern systems in `systems::boss`.

use crate::boss::BossAi;
use crate::components::*;
use crate::world::GameState;
use bevy_ecs::prelude::*;

/// Sideways share of an evasive sidestep; the rest keeps descending.
const DODGE_DESCENT: f32 = 0.4;

// ============================================================================
// ENEMY AI SYSTEM
// ============================================================================

/// Direction an enemy wants to fly this tick, before speed scaling.
fn steer(ai: &EnemyAi, at: &Transform, player: Option<&Transform>, elapsed: f32) -> (f32, f32) {
    match *ai {
        EnemyAi::Straight => (0.0, 1.0),
        EnemyAi::Sine { amplitude, frequency, phase } => {
            (amplitude * (elapsed * frequency + phase).cos(), 1.0)
        }
        EnemyAi::Chase => match player {
            Some(target) => {
                let dir = Velocity::new(target.x - at.x, target.y - at.y).normalized();
                if dir.magnitude() == 0.0 {
                    (0.0, 1.0)
                } else {
                    (dir.vx, dir.vy)
                }
            }
            None => (0.0, 1.0),
        },
    }
}

/// System that writes a velocity intent for every regular enemy.
///
/// ## Data Access
/// - Reads: GameState, EnemyAi, Transform, IncomingMissiles, player Transform
/// - Writes: MoveIntent (via commands)
pub fn enemy_ai_system(
    mut commands: Commands,
    state: Res<GameState>,
    players: Query<&Transform, (With<PlayerControlled>, Without<MarkedForDeletion>)>,
    enemies: Query<
        (Entity, &EnemyAi, &Transform, &Health, Option<&IncomingMissiles>, Has<Evasive>),
        (Without<BossAi>, Without<MarkedForDeletion>),
    >,
) {
    let player = players.iter().next();

    for (entity, ai, at, health, incoming, evasive) in enemies.iter() {
        if !health.is_alive() {
            continue;
        }
        let locked = incoming.is_some_and(|m| m.0 > 0);
        let (dx, dy) = if evasive && locked {
            let away = match player {
                Some(p) if at.x < p.x => -1.0,
                Some(_) => 1.0,
                None => 0.0,
            };
            (away, DODGE_DESCENT)
        } else {
            steer(ai, at, player, state.elapsed)
        };
        commands.entity(entity).insert(MoveIntent::velocity(dx, dy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(enemy_ai_system);
        schedule.run(world);
    }

    fn archetype(ai: EnemyAi) -> EnemyArchetype {
        EnemyArchetype { ai, ..EnemyArchetype::defaults()[0] }
    }

    #[test]
    fn test_straight_and_chase_intents() {
        let mut world = World::new();
        world.insert_resource(GameState::default());
        world.spawn(PlayerBundle::new(100.0, 400.0, crate::weapon::WeaponType::Vulcan));
        let straight = world.spawn(EnemyBundle::new(&archetype(EnemyAi::Straight), 50.0, 0.0)).id();
        let chaser = world.spawn(EnemyBundle::new(&archetype(EnemyAi::Chase), 100.0, 100.0)).id();

        run(&mut world);

        assert_eq!(*world.get::<MoveIntent>(straight).unwrap(), MoveIntent::velocity(0.0, 1.0));
        let chase = world.get::<MoveIntent>(chaser).unwrap();
        assert!(chase.dx.abs() < 1e-6 && (chase.dy - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sine_follows_elapsed_time() {
        let mut world = World::new();
        world.insert_resource(GameState { elapsed: 0.5, ..GameState::default() });
        let weaver = archetype(EnemyAi::Sine { amplitude: 2.0, frequency: std::f32::consts::PI, phase: 0.0 });
        let e = world.spawn(EnemyBundle::new(&weaver, 50.0, 0.0)).id();

        run(&mut world);

        let intent = world.get::<MoveIntent>(e).unwrap();
        assert!(intent.dx.abs() < 1e-5);
        assert_eq!(intent.dy, 1.0);
    }

    #[test]
    fn test_evasive_enemy_sidesteps_locked_missiles() {
        let mut world = World::new();
        world.insert_resource(GameState::default());
        world.spawn(PlayerBundle::new(200.0, 600.0, crate::weapon::WeaponType::Missile));
        let calm = world.spawn((EnemyBundle::new(&archetype(EnemyAi::Straight), 150.0, 100.0), Evasive)).id();
        let dodger = world
            .spawn((EnemyBundle::new(&archetype(EnemyAi::Straight), 150.0, 100.0), Evasive))
            .id();
        world.get_mut::<IncomingMissiles>(dodger).unwrap().lock();

        run(&mut world);

        assert_eq!(world.get::<MoveIntent>(calm).unwrap().dx, 0.0);
        assert_eq!(*world.get::<MoveIntent>(dodger).unwrap(), MoveIntent::velocity(-1.0, DODGE_DESCENT));
    }

    #[test]
    fn test_bosses_and_dead_enemies_are_skipped() {
        let mut world = World::new();
        world.insert_resource(GameState::default());
        let dead = world.spawn(EnemyBundle::new(&archetype(EnemyAi::Straight), 0.0, 0.0)).id();
        world.get_mut::<Health>(dead).unwrap().set_hp(0.0);
        let boss = world
            .spawn((
                EnemyBundle::new(&archetype(EnemyAi::Straight), 0.0, 0.0),
                BossAi::new(crate::boss::BossKind::Dreadnought, crate::boss::BossPattern::Hover, 0.0, 0.0),
            ))
            .id();

        run(&mut world);

        assert!(world.get::<MoveIntent>(dead).is_none());
        assert!(world.get::<MoveIntent>(boss).is_none());
    }
}
