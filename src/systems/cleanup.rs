//! End-of-tick cleanup: expiry, culling and the despawn pass.
//!
//! Entities are never despawned mid-tick. Every system marks with
//! `MarkedForDeletion`; [`despawn_marked_system`] purges them last.

use crate::boss::BossAi;
use crate::components::*;
use crate::config::EngineConfig;
use crate::systems::movement::DeltaTime;
use crate::world::GameState;
use bevy_ecs::prelude::*;
use log::trace;

pub fn lifetime_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    mut query: Query<(Entity, &mut Lifetime), Without<MarkedForDeletion>>,
) {
    for (entity, mut lifetime) in query.iter_mut() {
        lifetime.remaining -= dt.0;
        if lifetime.expired() {
            commands.entity(entity).insert(MarkedForDeletion);
        }
    }
}

/// Cull bodies that left the playfield.
///
/// Projectiles are culled past any edge (missiles use their own margin in
/// `missile_system`). Enemies and powerups enter from above, so they are
/// culled only below the screen or past the sides. Bosses are never culled.
pub fn offscreen_cull_system(
    mut commands: Commands,
    state: Res<GameState>,
    config: Res<EngineConfig>,
    projectiles: Query<
        (Entity, &Transform),
        (Or<(With<Bullet>, With<EnemyBullet>)>, Without<Missile>, Without<MarkedForDeletion>),
    >,
    drifters: Query<
        (Entity, &Transform),
        (Or<(With<Enemy>, With<Powerup>)>, Without<BossAi>, Without<MarkedForDeletion>),
    >,
) {
    let margin = config.offscreen_margin;
    for (entity, at) in projectiles.iter() {
        if !state.in_bounds(at.x, at.y, margin) {
            commands.entity(entity).insert(MarkedForDeletion);
        }
    }
    for (entity, at) in drifters.iter() {
        let gone = at.y > state.height + margin || at.x < -margin || at.x > state.width + margin;
        if gone {
            commands.entity(entity).insert(MarkedForDeletion);
        }
    }
}

/// Removed missiles release the lock they still hold on their target.
pub fn missile_release_system(
    mut missiles: Query<&mut Homing, (With<Missile>, With<MarkedForDeletion>)>,
    mut targets: Query<&mut IncomingMissiles, Without<Homing>>,
) {
    for mut homing in missiles.iter_mut() {
        let Some(target) = homing.target.take() else {
            continue;
        };
        if let Ok(mut incoming) = targets.get_mut(target) {
            incoming.release();
        }
    }
}

/// Despawn every entity marked for deletion.
pub fn despawn_marked_system(mut commands: Commands, marked: Query<Entity, With<MarkedForDeletion>>) {
    let mut count = 0usize;
    for entity in marked.iter() {
        commands.entity(entity).despawn();
        count += 1;
    }
    if count > 0 {
        trace!("despawned {count} entities");
    }
}
