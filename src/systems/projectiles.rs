//! Bullet physics - homing, missile fuel, slow fields, integration, bounces.
//!
//! Projectile velocities are pixels per 60 Hz reference frame; integration
//! multiplies by [`DeltaTime::frame_scale`]. Homing turn rate, slow-field
//! damping and spin are per-tick constants.

use crate::components::*;
use crate::config::EngineConfig;
use crate::events::BulletBouncedEvent;
use crate::systems::movement::DeltaTime;
use crate::world::GameState;
use bevy_ecs::prelude::*;
use log::trace;

const DEFAULT_SLOW_FIELD_DAMPING: f32 = 0.75;

/// Steer homing projectiles toward their target, clearing invalid targets.
///
/// A target is invalid once despawned or at zero hp. The reference is then
/// cleared for good and the bullet keeps flying straight. When the target
/// still exists its incoming-missile counter is released here, exactly once.
pub fn homing_system(
    mut homers: Query<(Entity, &mut Homing, &mut Velocity, &Transform)>,
    mut targets: Query<(&Transform, Option<&Health>, Option<&mut IncomingMissiles>), Without<Homing>>,
) {
    for (entity, mut homing, mut velocity, transform) in homers.iter_mut() {
        let Some(target) = homing.target else {
            continue;
        };

        let aim = match targets.get_mut(target) {
            Ok((target_t, health, incoming)) => {
                if health.is_some_and(|h| !h.is_alive()) {
                    if let Some(mut incoming) = incoming {
                        incoming.release();
                    }
                    None
                } else {
                    Some((target_t.x, target_t.y))
                }
            }
            Err(_) => None,
        };

        let Some((tx, ty)) = aim else {
            trace!("{entity:?} lost homing target {target:?}");
            homing.target = None;
            continue;
        };

        let dir = Velocity::new(tx - transform.x, ty - transform.y).normalized();
        velocity.vx += dir.vx * homing.turn_rate;
        velocity.vy += dir.vy * homing.turn_rate;
        velocity.clamp_magnitude(homing.max_speed);
    }
}

/// Burn missile fuel and self-destruct on empty tanks or far outside the screen.
pub fn missile_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    state: Res<GameState>,
    mut query: Query<(Entity, &mut Missile, &Transform), Without<MarkedForDeletion>>,
) {
    for (entity, mut missile, transform) in query.iter_mut() {
        missile.fuel -= dt.0;
        let outside = !state.in_bounds(transform.x, transform.y, missile.bounds_margin);
        if missile.fuel <= 0.0 || outside {
            commands.entity(entity).insert(MarkedForDeletion);
        }
    }
}

/// Damp the velocity of every bullet inside an active slow field.
///
/// Each field multiplies again, so overlapping fields stack.
pub fn slow_field_system(
    config: Option<Res<EngineConfig>>,
    fields: Query<(&Transform, &SlowField)>,
    mut bullets: Query<(&Transform, &mut Velocity), Or<(With<Bullet>, With<EnemyBullet>)>>,
) {
    let damping = config
        .map(|c| c.slow_field_damping)
        .unwrap_or(DEFAULT_SLOW_FIELD_DAMPING);
    let active: Vec<(Transform, f32)> = fields
        .iter()
        .filter(|(_, f)| f.life > 0.0)
        .map(|(t, f)| (*t, f.radius))
        .collect();
    if active.is_empty() {
        return;
    }

    for (transform, mut velocity) in bullets.iter_mut() {
        for (centre, radius) in &active {
            if transform.distance_to(centre) < *radius {
                velocity.scale(damping);
            }
        }
    }
}

/// Integrate velocity-driven bodies, reflect bouncing bullets and orient projectiles.
///
/// Bouncing bullets reflect and clamp at the side walls and the ceiling,
/// never at the bottom edge.
pub fn projectile_motion_system(
    dt: Res<DeltaTime>,
    state: Res<GameState>,
    mut bounced: EventWriter<BulletBouncedEvent>,
    mut query: Query<
        (
            Entity,
            &mut Transform,
            &mut Velocity,
            Option<&mut Bouncing>,
            Option<&mut Bullet>,
            Option<&Spin>,
            Has<EnemyBullet>,
        ),
        Without<MarkedForDeletion>,
    >,
) {
    let scale = dt.frame_scale();
    for (entity, mut transform, mut velocity, bouncing, mut bullet, spin, enemy_bullet) in query.iter_mut() {
        transform.x += velocity.vx * scale;
        transform.y += velocity.vy * scale;

        if let Some(mut bouncing) = bouncing {
            let mut reflected = false;
            if transform.x < 0.0 {
                transform.x = 0.0;
                velocity.vx = velocity.vx.abs();
                reflected = true;
            } else if transform.x > state.width {
                transform.x = state.width;
                velocity.vx = -velocity.vx.abs();
                reflected = true;
            }
            if transform.y < 0.0 {
                transform.y = 0.0;
                velocity.vy = velocity.vy.abs();
                reflected = true;
            }
            if reflected {
                bouncing.bounces += 1;
                if let Some(bullet) = bullet.as_deref_mut() {
                    bullet.bounced = true;
                    bounced.send(BulletBouncedEvent {
                        bullet: entity,
                        weapon: bullet.weapon,
                        x: transform.x,
                        y: transform.y,
                    });
                }
            }
        }

        if bullet.is_none() && !enemy_bullet {
            continue;
        }
        match spin {
            Some(spin) => transform.rotation += spin.speed,
            None if velocity.magnitude() > 0.0 => transform.rotation = velocity.heading(),
            None => {}
        }
    }
}
