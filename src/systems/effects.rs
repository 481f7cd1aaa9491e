//! Status effects and area entities spawned by synergies.

use crate::components::*;
use crate::events::{DamageDealtEvent, DamageSource};
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;

/// Damage-over-time from `Burning`.
pub fn burning_system(
    dt: Res<DeltaTime>,
    mut query: Query<(Entity, &mut Health, &mut Burning, &Transform), Without<MarkedForDeletion>>,
    mut damage_out: EventWriter<DamageDealtEvent>,
) {
    for (entity, mut health, mut burning, at) in query.iter_mut() {
        if burning.remaining <= 0.0 || !health.is_alive() {
            continue;
        }
        let tick = dt.0.min(burning.remaining);
        burning.remaining -= dt.0;
        let removed = health.damage(burning.damage_per_second * tick);
        if removed > 0.0 {
            damage_out.send(DamageDealtEvent {
                target: entity,
                amount: removed,
                source: DamageSource::Burn,
                x: at.x,
                y: at.y,
            });
        }
    }
}

/// Grow shockwaves, damage each enemy once and erase enemy bullets inside the ring.
pub fn shockwave_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    mut waves: Query<(Entity, &Transform, &mut Shockwave), Without<MarkedForDeletion>>,
    mut enemies: Query<(Entity, &mut Health, &Transform), (With<Enemy>, Without<Shockwave>)>,
    enemy_bullets: Query<(Entity, &Transform), (With<EnemyBullet>, Without<MarkedForDeletion>)>,
    mut damage_out: EventWriter<DamageDealtEvent>,
) {
    for (wave_entity, centre, mut wave) in waves.iter_mut() {
        wave.radius = (wave.radius + wave.growth * dt.0).min(wave.max_radius);

        for (enemy, mut health, at) in enemies.iter_mut() {
            if !health.is_alive() || wave.hit.contains(&enemy) || centre.distance_to(at) > wave.radius {
                continue;
            }
            wave.hit.push(enemy);
            let removed = health.damage(wave.damage);
            damage_out.send(DamageDealtEvent {
                target: enemy,
                amount: removed,
                source: DamageSource::Area,
                x: at.x,
                y: at.y,
            });
        }

        for (bullet, at) in enemy_bullets.iter() {
            if centre.distance_to(at) <= wave.radius {
                commands.entity(bullet).insert(MarkedForDeletion);
            }
        }

        wave.life -= dt.0;
        if wave.life <= 0.0 {
            commands.entity(wave_entity).insert(MarkedForDeletion);
        }
    }
}

/// Count meteors down to impact, strike once, then linger for their remaining life.
pub fn meteor_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    mut meteors: Query<(Entity, &Transform, &mut Meteor), Without<MarkedForDeletion>>,
    mut enemies: Query<(Entity, &mut Health, &Transform), (With<Enemy>, Without<Meteor>)>,
    mut damage_out: EventWriter<DamageDealtEvent>,
) {
    for (entity, centre, mut meteor) in meteors.iter_mut() {
        if meteor.delay > 0.0 {
            meteor.delay -= dt.0;
            if meteor.delay > 0.0 {
                continue;
            }
            for (enemy, mut health, at) in enemies.iter_mut() {
                if health.is_alive() && centre.distance_to(at) <= meteor.radius {
                    let removed = health.damage(meteor.damage);
                    damage_out.send(DamageDealtEvent {
                        target: enemy,
                        amount: removed,
                        source: DamageSource::Area,
                        x: at.x,
                        y: at.y,
                    });
                }
            }
            continue;
        }

        meteor.life -= dt.0;
        if meteor.life <= 0.0 {
            commands.entity(entity).insert(MarkedForDeletion);
        }
    }
}

/// Age slow fields; expired fields are removed at the end of the tick.
pub fn slow_field_decay_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    mut fields: Query<(Entity, &mut SlowField), Without<MarkedForDeletion>>,
) {
    for (entity, mut field) in fields.iter_mut() {
        field.life -= dt.0;
        if field.life <= 0.0 {
            commands.entity(entity).insert(MarkedForDeletion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::register_events;
    use bevy_ecs::event::Events;

    fn test_world(dt: f32) -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(dt));
        register_events(&mut world);
        world
    }

    fn spawn_enemy(world: &mut World, x: f32, y: f32) -> Entity {
        let drone = EnemyArchetype {
            max_hp: 100.0,
            ..EnemyArchetype::defaults()[0]
        };
        world.spawn(EnemyBundle::new(&drone, x, y)).id()
    }

    #[test]
    fn test_burn_deals_damage_over_time() {
        let mut world = test_world(0.5);
        let enemy = spawn_enemy(&mut world, 0.0, 0.0);
        world.entity_mut(enemy).insert(Burning { damage_per_second: 4.0, remaining: 1.0 });

        let mut schedule = Schedule::default();
        schedule.add_systems(burning_system);
        for _ in 0..4 {
            schedule.run(&mut world);
        }

        assert_eq!(world.get::<Health>(enemy).unwrap().hp(), 96.0);
        assert_eq!(world.resource::<Events<DamageDealtEvent>>().len(), 2);
    }

    #[test]
    fn test_shockwave_hits_each_enemy_once_and_erases_bullets() {
        let mut world = test_world(0.1);
        let near = spawn_enemy(&mut world, 20.0, 0.0);
        let far = spawn_enemy(&mut world, 300.0, 0.0);
        let shot = world.spawn((EnemyBullet { damage: 5.0 }, Transform::new(10.0, 0.0))).id();
        let wave = world
            .spawn((
                Transform::new(0.0, 0.0),
                Shockwave { radius: 0.0, max_radius: 120.0, growth: 360.0, damage: 20.0, life: 0.25, hit: Vec::new() },
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(shockwave_system);
        for _ in 0..3 {
            schedule.run(&mut world);
        }

        assert_eq!(world.get::<Health>(near).unwrap().hp(), 80.0);
        assert_eq!(world.get::<Health>(far).unwrap().hp(), 100.0);
        assert!(world.get::<MarkedForDeletion>(shot).is_some());
        assert!(world.get::<MarkedForDeletion>(wave).is_some());
    }

    #[test]
    fn test_meteor_strikes_after_delay() {
        let mut world = test_world(0.3);
        let enemy = spawn_enemy(&mut world, 10.0, 10.0);
        let meteor = world
            .spawn((Transform::new(0.0, 0.0), Meteor { delay: 0.5, radius: 56.0, damage: 30.0, life: 0.25 }))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(meteor_system);
        schedule.run(&mut world);
        assert_eq!(world.get::<Health>(enemy).unwrap().hp(), 100.0);
        schedule.run(&mut world);
        assert_eq!(world.get::<Health>(enemy).unwrap().hp(), 70.0);
        schedule.run(&mut world);
        assert_eq!(world.get::<Health>(enemy).unwrap().hp(), 70.0);
        assert!(world.get::<MarkedForDeletion>(meteor).is_some());
    }
}
