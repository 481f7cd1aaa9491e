//! Collision detection - overlap tests that publish events only.
//!
//! ## Phases
//!
//! 1. **Gather Phase** - O(n × k) where n = player bullets, k = enemies per
//!    grid query. Each bullet's probe is independent and only reads the
//!    spatial grid, so this phase is parallelizable.
//! 2. **Publish Phase** - sequential, in entity order, so event order never
//!    depends on thread scheduling.
//!
//! Detection never touches health, scores or entity lifetimes. Everything it
//! finds travels to the resolution stage as events.
//!
//! ## Parallel Feature
//!
//! When compiled with `--features parallel`, the gather phase uses rayon
//! for internal parallel iteration over the bullet probes.

use crate::components::*;
use crate::events::{BulletHitEvent, PlayerHitEvent, PlayerHitSource, PowerupCollectedEvent};
use crate::spatial::SpatialGrid;
use bevy_ecs::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Bullet data extracted for the gather phase.
#[derive(Clone)]
struct BulletProbe {
    entity: Entity,
    transform: Transform,
    collider: Collider,
    penetrating: bool,
    already_hit: Vec<Entity>,
}

/// Hits of one bullet: at most one unless penetrating, never a target it hit before.
fn probe_hits(probe: &BulletProbe, grid: &SpatialGrid) -> Vec<BulletHitEvent> {
    let overlapping = grid
        .query_overlapping(&probe.transform, &probe.collider, CollisionLayer::Enemy)
        .into_iter()
        .filter(|e| !probe.already_hit.contains(&e.entity))
        .map(|e| BulletHitEvent {
            bullet: probe.entity,
            target: e.entity,
        });

    if probe.penetrating {
        overlapping.collect()
    } else {
        overlapping.take(1).collect()
    }
}

/// System that tests the candidate pairs and publishes hit events.
///
/// Pairs: player bullet × enemy, enemy bullet × player, player × enemy
/// (contact) and player × powerup. Bullets never test against powerups.
pub fn collision_detection_system(
    grid: Res<SpatialGrid>,
    bullets: Query<(Entity, &Transform, &Collider, &Bullet), Without<MarkedForDeletion>>,
    players: Query<(Entity, &Transform, &Collider, &Health), (With<PlayerControlled>, Without<MarkedForDeletion>)>,
    mut bullet_hits: EventWriter<BulletHitEvent>,
    mut player_hits: EventWriter<PlayerHitEvent>,
    mut pickups: EventWriter<PowerupCollectedEvent>,
) {
    let mut probes: Vec<BulletProbe> = bullets
        .iter()
        .filter(|(_, _, collider, _)| collider.layer == CollisionLayer::PlayerBullet)
        .map(|(entity, transform, collider, bullet)| BulletProbe {
            entity,
            transform: *transform,
            collider: *collider,
            penetrating: bullet.is_penetrating(),
            already_hit: bullet.hit_targets.clone(),
        })
        .collect();
    probes.sort_by_key(|p| p.entity);

    #[cfg(feature = "parallel")]
    let hits: Vec<Vec<BulletHitEvent>> = probes.par_iter().map(|p| probe_hits(p, &grid)).collect();

    #[cfg(not(feature = "parallel"))]
    let hits: Vec<Vec<BulletHitEvent>> = probes.iter().map(|p| probe_hits(p, &grid)).collect();

    for hit in hits.into_iter().flatten() {
        bullet_hits.send(hit);
    }

    let mut players: Vec<_> = players.iter().filter(|(_, _, _, h)| h.is_alive()).collect();
    players.sort_by_key(|(e, ..)| *e);
    for (player, transform, collider, _) in players {
        for entry in grid.query_overlapping(transform, collider, CollisionLayer::EnemyBullet) {
            player_hits.send(PlayerHitEvent {
                player,
                source: entry.entity,
                kind: PlayerHitSource::Bullet,
            });
        }
        for entry in grid.query_overlapping(transform, collider, CollisionLayer::Enemy) {
            player_hits.send(PlayerHitEvent {
                player,
                source: entry.entity,
                kind: PlayerHitSource::Contact,
            });
        }
        for entry in grid.query_overlapping(transform, collider, CollisionLayer::Powerup) {
            pickups.send(PowerupCollectedEvent {
                player,
                powerup: entry.entity,
            });
        }
    }
}
