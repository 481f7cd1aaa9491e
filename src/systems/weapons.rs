//! Weapon systems - player volleys per weapon kind and aimed enemy guns.

use crate::components::*;
use crate::config::{EngineConfig, GameData};
use crate::systems::movement::DeltaTime;
use crate::weapon::{Armory, FireControl, WeaponLevelStats, WeaponType};
use crate::world::GameState;
use bevy_ecs::prelude::*;
use log::trace;
use std::f32::consts::FRAC_PI_2;

/// Attenuation of laser segments per target passed.
pub const LASER_ATTENUATION: f32 = 0.5;
/// Rotation added to shuriken blades per tick.
pub const SHURIKEN_SPIN: f32 = 0.35;
const ENEMY_BULLET_SIZE: f32 = 8.0;
const ENEMY_BULLET_LIFETIME: f32 = 6.0;

/// Angle between neighbouring projectiles of a spread volley.
fn spread_step(weapon: WeaponType) -> f32 {
    match weapon {
        WeaponType::Vulcan => 0.12,
        WeaponType::Shuriken => 0.35,
        WeaponType::Missile => 0.5,
        _ => 0.08,
    }
}

fn bullet_size(weapon: WeaponType) -> f32 {
    match weapon {
        WeaponType::Vulcan | WeaponType::Tesla => 4.0,
        WeaponType::Laser => 6.0,
        WeaponType::Missile | WeaponType::Frost => 8.0,
        WeaponType::Shuriken => 14.0,
        WeaponType::Magma => 16.0,
    }
}

/// Candidate for a missile lock.
struct LockCandidate {
    entity: Entity,
    distance: f32,
    incoming: u32,
}

/// Pick the closest enemy nobody is locked on, falling back to the closest one.
fn pick_lock(candidates: &mut [LockCandidate]) -> Option<Entity> {
    let choice = candidates
        .iter_mut()
        .min_by(|a, b| {
            (a.incoming > 0, a.distance)
                .partial_cmp(&(b.incoming > 0, b.distance))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity.cmp(&b.entity))
        })?;
    choice.incoming += 1;
    Some(choice.entity)
}

/// Bullets of one volley: `(bullet, x offset, heading)`.
fn volley(weapon: WeaponType, stats: &WeaponLevelStats, damage: f32) -> Vec<(Bullet, f32, f32)> {
    let n = stats.projectiles.max(1);
    let centre = (n - 1) as f32 / 2.0;
    (0..n)
        .map(|i| {
            let slot = i as f32 - centre;
            match weapon {
                WeaponType::Laser => (
                    Bullet::penetrating(weapon, damage, LASER_ATTENUATION),
                    slot * 10.0,
                    -FRAC_PI_2,
                ),
                _ => (Bullet::new(weapon, damage), 0.0, -FRAC_PI_2 + slot * spread_step(weapon)),
            }
        })
        .collect()
}

/// Fire every equipped weapon whose cooldown elapsed while the trigger is held.
#[allow(clippy::too_many_arguments)]
pub fn player_fire_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    data: Res<GameData>,
    config: Res<EngineConfig>,
    state: Res<GameState>,
    mut players: Query<(&Transform, &Armory, &mut FireControl, &Health, Option<&Buffs>), With<PlayerControlled>>,
    mut enemies: Query<
        (Entity, &Transform, &Health, &mut IncomingMissiles),
        (With<Enemy>, Without<PlayerControlled>, Without<MarkedForDeletion>),
    >,
) {
    if state.game_over {
        return;
    }
    let delta = dt.0;

    for (at, armory, mut fire, health, buffs) in players.iter_mut() {
        if !fire.firing || !health.is_alive() {
            for cooldown in fire.cooldowns.values_mut() {
                *cooldown = (*cooldown - delta).max(0.0);
            }
            continue;
        }
        let interval_factor = buffs.map(|b| b.fire_interval_factor()).unwrap_or(1.0);
        let damage_factor = buffs.map(|b| b.damage_factor()).unwrap_or(1.0);

        let mut locks: Option<Vec<LockCandidate>> = None;

        for (&weapon, &level) in &armory.weapons {
            let Some(stats) = data.weapons.stats(weapon, level) else {
                continue;
            };
            if !fire.ready(weapon, delta, stats.fire_interval * interval_factor) {
                continue;
            }
            trace!("{} L{level} fires {} projectiles", weapon.name(), stats.projectiles);

            for (bullet, offset, heading) in volley(weapon, &stats, stats.damage * damage_factor) {
                let speed = if weapon == WeaponType::Missile {
                    stats.bullet_speed * 0.5
                } else {
                    stats.bullet_speed
                };
                let velocity = Velocity::new(heading.cos() * speed, heading.sin() * speed);
                let mut spawned = commands.spawn(BulletBundle::new(
                    bullet,
                    at.x + offset,
                    at.y,
                    velocity,
                    bullet_size(weapon),
                ));

                match weapon {
                    WeaponType::Missile => {
                        let candidates = locks.get_or_insert_with(|| {
                            enemies
                                .iter()
                                .filter(|(_, t, h, _)| h.is_alive() && t.y >= 0.0)
                                .map(|(entity, t, _, incoming)| LockCandidate {
                                    entity,
                                    distance: t.distance_to(at),
                                    incoming: incoming.0,
                                })
                                .collect()
                        });
                        let target = pick_lock(candidates);
                        if let Some(target) = target {
                            if let Ok((.., mut incoming)) = enemies.get_mut(target) {
                                incoming.lock();
                            }
                        }
                        spawned.insert((
                            Homing::new(target, config.missile_turn_rate, stats.bullet_speed),
                            Missile {
                                fuel: config.missile_fuel,
                                bounds_margin: config.missile_bounds_margin,
                            },
                        ));
                    }
                    WeaponType::Shuriken => {
                        spawned.insert((Bouncing::default(), Spin { speed: SHURIKEN_SPIN }));
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Aimed shots from enemies and bosses carrying an `EnemyGun`.
pub fn enemy_fire_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    state: Res<GameState>,
    players: Query<(&Transform, &Health), (With<PlayerControlled>, Without<MarkedForDeletion>)>,
    mut guns: Query<(&Transform, &mut EnemyGun, &Health), Without<MarkedForDeletion>>,
) {
    if state.game_over {
        return;
    }
    let Some((target, _)) = players.iter().find(|(_, h)| h.is_alive()) else {
        return;
    };

    for (at, mut gun, health) in guns.iter_mut() {
        if !health.is_alive() || !state.in_bounds(at.x, at.y, 0.0) {
            continue;
        }
        gun.cooldown -= dt.0;
        if gun.cooldown > 0.0 {
            continue;
        }
        gun.cooldown = gun.interval;

        let dir = Velocity::new(target.x - at.x, target.y - at.y).normalized();
        let velocity = Velocity::new(dir.vx * gun.bullet_speed, dir.vy * gun.bullet_speed);
        commands.spawn((
            EnemyBullet { damage: gun.damage },
            Transform { x: at.x, y: at.y, rotation: velocity.heading() },
            velocity,
            Collider::new(ENEMY_BULLET_SIZE, ENEMY_BULLET_SIZE, CollisionLayer::EnemyBullet),
            Lifetime::new(ENEMY_BULLET_LIFETIME),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.016));
        world.insert_resource(GameData::builtin());
        world.insert_resource(EngineConfig::default());
        world.insert_resource(GameState::default());
        world
    }

    fn fire_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((player_fire_system, enemy_fire_system).chain());
        schedule
    }

    fn spawn_player(world: &mut World, weapon: WeaponType) -> Entity {
        let player = world.spawn(PlayerBundle::new(240.0, 600.0, weapon)).id();
        world.get_mut::<FireControl>(player).unwrap().firing = true;
        player
    }

    #[test]
    fn test_vulcan_spread_volley() {
        let mut world = test_world();
        let player = spawn_player(&mut world, WeaponType::Vulcan);
        for _ in 0..4 {
            world.get_mut::<Armory>(player).unwrap().equip(WeaponType::Vulcan);
        }
        fire_schedule().run(&mut world);

        let mut bullets = world.query::<(&Bullet, &Velocity)>();
        let volley: Vec<_> = bullets.iter(&world).collect();
        assert_eq!(volley.len(), 5);
        assert!(volley.iter().all(|(_, v)| v.vy < 0.0));
        assert!(volley.iter().any(|(_, v)| v.vx < 0.0) && volley.iter().any(|(_, v)| v.vx > 0.0));
    }

    #[test]
    fn test_cooldown_blocks_next_volley() {
        let mut world = test_world();
        spawn_player(&mut world, WeaponType::Magma);
        let mut schedule = fire_schedule();
        schedule.run(&mut world);
        schedule.run(&mut world);
        let mut bullets = world.query::<&Bullet>();
        assert_eq!(bullets.iter(&world).count(), 1);
    }

    #[test]
    fn test_laser_is_penetrating_and_damage_buffed() {
        let mut world = test_world();
        let player = spawn_player(&mut world, WeaponType::Laser);
        world.get_mut::<Buffs>(player).unwrap().grant(BuffKind::DamageUp);
        fire_schedule().run(&mut world);

        let mut bullets = world.query::<&Bullet>();
        let laser = bullets.single(&world);
        assert!(laser.is_penetrating());
        assert_eq!(laser.damage, 15.0);
    }

    #[test]
    fn test_missiles_lock_distinct_targets() {
        let mut world = test_world();
        let player = spawn_player(&mut world, WeaponType::Missile);
        for _ in 0..2 {
            world.get_mut::<Armory>(player).unwrap().equip(WeaponType::Missile);
        }
        let drone = EnemyArchetype::defaults()[0];
        let near = world.spawn(EnemyBundle::new(&drone, 240.0, 400.0)).id();
        let far = world.spawn(EnemyBundle::new(&drone, 240.0, 100.0)).id();

        fire_schedule().run(&mut world);

        assert_eq!(world.get::<IncomingMissiles>(near).unwrap().0, 1);
        assert_eq!(world.get::<IncomingMissiles>(far).unwrap().0, 1);
        let mut homing = world.query::<&Homing>();
        let mut targets: Vec<_> = homing.iter(&world).filter_map(|h| h.target).collect();
        targets.sort();
        let mut expected = vec![near, far];
        expected.sort();
        assert_eq!(targets, expected);
    }

    #[test]
    fn test_enemy_gun_aims_at_player() {
        let mut world = test_world();
        world.spawn(PlayerBundle::new(240.0, 600.0, WeaponType::Vulcan));
        world.spawn((
            Transform::new(240.0, 100.0),
            EnemyGun::new(0.01, 4.0, 10.0),
            Health::new(10.0),
        ));
        fire_schedule().run(&mut world);

        let mut shots = world.query::<(&EnemyBullet, &Velocity)>();
        let (shot, v) = shots.single(&world);
        assert_eq!(shot.damage, 10.0);
        assert!((v.vy - 4.0).abs() < 1e-5 && v.vx.abs() < 1e-5);
    }
}
