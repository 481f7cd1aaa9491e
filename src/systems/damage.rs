//! Damage resolution - the "decide and apply" half of collision handling.
//!
//! Collision detection publishes hit events; the systems here consume them in
//! the resolution stage, apply damage, consume bullets, run the synergy engine
//! and finally turn zero-hp entities into destruction events.

use crate::boss::BossAi;
use crate::components::*;
use crate::config::{EngineConfig, GameData};
use crate::events::*;
use crate::spatial::SpatialGrid;
use crate::synergy::{EffectType, SynergyEvent, TriggerKind};
use crate::weapon::{Armory, WeaponType};
use crate::world::GameState;
use bevy_ecs::prelude::*;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};

/// Seconds a burn synergy keeps burning.
pub const BURN_DURATION: f32 = 3.0;
/// Seconds a slow synergy lasts.
pub const SLOW_DURATION: f32 = 2.0;
/// Seconds a slow field stays active.
pub const SLOW_FIELD_LIFE: f32 = 3.0;
pub const SHOCKWAVE_MAX_RADIUS: f32 = 120.0;
/// Pixels per second.
pub const SHOCKWAVE_GROWTH: f32 = 360.0;
pub const METEOR_DELAY: f32 = 0.5;
pub const METEOR_RADIUS: f32 = 56.0;

/// Enemies in range of a point, with their distance, skipping the dead.
fn gather_candidates(
    grid: &SpatialGrid,
    x: f32,
    y: f32,
    range: f32,
    alive: impl Fn(Entity) -> bool,
) -> Vec<(Entity, f32)> {
    grid.query_radius(x, y, range, Some(CollisionLayer::Enemy))
        .into_iter()
        .filter(|e| alive(e.entity))
        .map(|e| (e.entity, ((e.x - x).powi(2) + (e.y - y).powi(2)).sqrt()))
        .collect()
}

fn equipped(armories: &Query<(Entity, &Armory), With<PlayerControlled>>) -> Option<(Entity, BTreeSet<WeaponType>)> {
    armories.iter().min_by_key(|(e, _)| *e).map(|(e, a)| (e, a.equipped_set()))
}

/// Apply player bullet hits.
///
/// Damage of the n-th hit of a bullet is `damage * attenuation^n`.
/// Non-penetrating bullets are marked for deletion on their hit. Hits on
/// enemies already at zero hp are ignored and do not consume the bullet.
#[allow(clippy::too_many_arguments)]
pub fn bullet_hit_system(
    mut commands: Commands,
    data: Res<GameData>,
    config: Res<EngineConfig>,
    grid: Res<SpatialGrid>,
    mut hits: EventReader<BulletHitEvent>,
    mut bullets: Query<&mut Bullet>,
    mut enemies: Query<(&mut Health, &Transform), With<Enemy>>,
    armories: Query<(Entity, &Armory), With<PlayerControlled>>,
    mut damage_out: EventWriter<DamageDealtEvent>,
    mut synergy_out: EventWriter<SynergyTriggeredEvent>,
) {
    let player = equipped(&armories);

    for hit in hits.read() {
        let Ok(mut bullet) = bullets.get_mut(hit.bullet) else {
            continue;
        };
        if bullet.has_hit(hit.target) || (!bullet.is_penetrating() && bullet.hit_count > 0) {
            continue;
        }
        let Ok((mut health, at)) = enemies.get_mut(hit.target) else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        let (x, y) = (at.x, at.y);
        let amount = bullet.register_hit(hit.target);
        let removed = health.damage(amount);
        let killed = !health.is_alive();
        damage_out.send(DamageDealtEvent {
            target: hit.target,
            amount: removed,
            source: DamageSource::Weapon(bullet.weapon),
            x,
            y,
        });
        if !bullet.is_penetrating() {
            commands.entity(hit.bullet).insert(MarkedForDeletion);
        }

        let Some((player, set)) = player.as_ref() else {
            continue;
        };
        let event = SynergyEvent {
            target: Some(hit.target),
            candidates: gather_candidates(&grid, x, y, config.synergy_range, |e| {
                enemies.get(e).is_ok_and(|(h, _)| h.is_alive())
            }),
            player: Some(*player),
            bounced: bullet.bounced,
            ..SynergyEvent::new(
                bullet.weapon,
                if killed { TriggerKind::Kill } else { TriggerKind::Hit },
                x,
                y,
            )
        };
        for effect in data.synergies.evaluate(set, &event) {
            debug!("{:?} triggered by {:?}", effect.synergy, bullet.weapon);
            synergy_out.send(SynergyTriggeredEvent { effect });
        }
    }
}

/// Run the synergy engine for wall reflections of bouncing bullets.
pub fn bounce_synergy_system(
    data: Res<GameData>,
    config: Res<EngineConfig>,
    grid: Res<SpatialGrid>,
    mut bounces: EventReader<BulletBouncedEvent>,
    enemies: Query<&Health, With<Enemy>>,
    armories: Query<(Entity, &Armory), With<PlayerControlled>>,
    mut synergy_out: EventWriter<SynergyTriggeredEvent>,
) {
    let Some((player, set)) = equipped(&armories) else {
        bounces.clear();
        return;
    };
    for bounce in bounces.read() {
        let event = SynergyEvent {
            candidates: gather_candidates(&grid, bounce.x, bounce.y, config.synergy_range, |e| {
                enemies.get(e).is_ok_and(|h| h.is_alive())
            }),
            player: Some(player),
            bounced: true,
            ..SynergyEvent::new(bounce.weapon, TriggerKind::Bounce, bounce.x, bounce.y)
        };
        for effect in data.synergies.evaluate(&set, &event) {
            debug!("{:?} triggered by a bounce", effect.synergy);
            synergy_out.send(SynergyTriggeredEvent { effect });
        }
    }
}

/// Turn synergy effects into world state: statuses, instant chain damage and area entities.
pub fn synergy_effect_system(
    mut commands: Commands,
    mut triggered: EventReader<SynergyTriggeredEvent>,
    mut enemies: Query<(&mut Health, &Transform, Option<&mut Burning>), With<Enemy>>,
    mut damage_out: EventWriter<DamageDealtEvent>,
) {
    for SynergyTriggeredEvent { effect } in triggered.read() {
        match effect.effect {
            EffectType::Burn => {
                for &target in &effect.targets {
                    let Ok((health, _, burning)) = enemies.get_mut(target) else {
                        continue;
                    };
                    if !health.is_alive() {
                        continue;
                    }
                    match burning {
                        Some(mut burning) => {
                            burning.damage_per_second = burning.damage_per_second.max(effect.value);
                            burning.remaining = BURN_DURATION;
                        }
                        None => {
                            commands.entity(target).try_insert(Burning {
                                damage_per_second: effect.value,
                                remaining: BURN_DURATION,
                            });
                        }
                    }
                }
            }
            EffectType::Chain => {
                for &target in &effect.targets {
                    let Ok((mut health, at, _)) = enemies.get_mut(target) else {
                        continue;
                    };
                    if !health.is_alive() {
                        continue;
                    }
                    let removed = health.damage(effect.value);
                    damage_out.send(DamageDealtEvent {
                        target,
                        amount: removed,
                        source: DamageSource::Synergy(effect.synergy),
                        x: at.x,
                        y: at.y,
                    });
                }
            }
            EffectType::Slow => {
                for &target in &effect.targets {
                    if enemies.get(target).is_ok_and(|(h, _, _)| h.is_alive()) {
                        commands.entity(target).try_insert(Slowed {
                            factor: effect.value.clamp(0.0, 1.0),
                            remaining: SLOW_DURATION,
                        });
                    }
                }
            }
            EffectType::SlowField => {
                commands.spawn((
                    Transform::new(effect.x, effect.y),
                    SlowField {
                        radius: effect.value.max(0.0),
                        life: SLOW_FIELD_LIFE,
                    },
                ));
            }
            EffectType::Shockwave => {
                commands.spawn((
                    Transform::new(effect.x, effect.y),
                    Shockwave {
                        radius: 0.0,
                        max_radius: SHOCKWAVE_MAX_RADIUS,
                        growth: SHOCKWAVE_GROWTH,
                        damage: effect.value,
                        life: SHOCKWAVE_MAX_RADIUS / SHOCKWAVE_GROWTH,
                        hit: Vec::new(),
                    },
                ));
            }
            EffectType::Meteor => {
                commands.spawn((
                    Transform::new(effect.x, effect.y),
                    Meteor {
                        delay: METEOR_DELAY,
                        radius: METEOR_RADIUS,
                        damage: effect.value,
                        life: 0.25,
                    },
                ));
            }
        }
    }
}

/// Apply enemy bullets and body contact to the player.
///
/// Shield charges absorb a hit before health does. Any hit that lands,
/// absorbed or not, starts the invincibility window. Enemy bullets are spent
/// on contact even when the player is invincible. A rammed enemy takes
/// `contact_damage` only when the hit lands, so ramming costs it at most once
/// per invincibility window; bosses are never hurt by contact.
#[allow(clippy::too_many_arguments)]
pub fn player_hit_system(
    mut commands: Commands,
    config: Res<EngineConfig>,
    mut hits: EventReader<PlayerHitEvent>,
    mut players: Query<(&mut Health, &Transform, &mut Invincibility, Option<&mut Buffs>), With<PlayerControlled>>,
    enemy_bullets: Query<&EnemyBullet>,
    mut enemies: Query<(&mut Health, &Transform, Has<BossAi>), (With<Enemy>, Without<PlayerControlled>)>,
    mut damage_out: EventWriter<DamageDealtEvent>,
    mut shield_out: EventWriter<ShieldChangedEvent>,
) {
    let mut consumed: Vec<Entity> = Vec::new();

    for hit in hits.read() {
        let amount = match hit.kind {
            PlayerHitSource::Bullet => {
                if consumed.contains(&hit.source) {
                    continue;
                }
                let Ok(bullet) = enemy_bullets.get(hit.source) else {
                    continue;
                };
                consumed.push(hit.source);
                commands.entity(hit.source).insert(MarkedForDeletion);
                bullet.damage
            }
            PlayerHitSource::Contact => config.contact_damage,
        };

        let Ok((mut health, at, mut invincibility, buffs)) = players.get_mut(hit.player) else {
            continue;
        };
        if invincibility.is_active() || !health.is_alive() {
            continue;
        }
        invincibility.remaining = config.player_invincibility;

        if hit.kind == PlayerHitSource::Contact {
            if let Ok((mut enemy_health, enemy_at, is_boss)) = enemies.get_mut(hit.source) {
                if !is_boss && enemy_health.is_alive() {
                    let removed = enemy_health.damage(config.contact_damage);
                    damage_out.send(DamageDealtEvent {
                        target: hit.source,
                        amount: removed,
                        source: DamageSource::Contact,
                        x: enemy_at.x,
                        y: enemy_at.y,
                    });
                }
            }
        }

        if let Some(charges) = buffs.and_then(|mut b| b.absorb_hit()) {
            debug!("shield absorbed a hit, {charges} charges left");
            shield_out.send(ShieldChangedEvent {
                player: hit.player,
                charges,
            });
            continue;
        }

        let removed = health.damage(amount);
        damage_out.send(DamageDealtEvent {
            target: hit.player,
            amount: removed,
            source: match hit.kind {
                PlayerHitSource::Bullet => DamageSource::EnemyFire,
                PlayerHitSource::Contact => DamageSource::Contact,
            },
            x: at.x,
            y: at.y,
        });
    }
}

/// Publish one `EntityDestroyedEvent` per entity whose health reached zero and mark it.
///
/// The weapon of the killing blow is the source of the last weapon damage the
/// entity took this tick.
pub fn death_system(
    mut commands: Commands,
    mut state: ResMut<GameState>,
    mut dealt: EventReader<DamageDealtEvent>,
    query: Query<
        (Entity, &Health, &Transform, Option<&Enemy>, Has<PlayerControlled>, Has<BossAi>),
        Without<MarkedForDeletion>,
    >,
    mut destroyed_out: EventWriter<EntityDestroyedEvent>,
) {
    let mut last_weapon: HashMap<Entity, Option<WeaponType>> = HashMap::new();
    for event in dealt.read() {
        let weapon = match event.source {
            DamageSource::Weapon(weapon) => Some(weapon),
            _ => None,
        };
        last_weapon.insert(event.target, weapon);
    }

    let mut dead: Vec<_> = query.iter().filter(|(_, health, ..)| !health.is_alive()).collect();
    dead.sort_by_key(|(entity, ..)| *entity);

    for (entity, _, at, enemy, is_player, is_boss) in dead {
        let kind = match (enemy, is_player) {
            (Some(enemy), _) => DestroyedKind::Enemy {
                kind: enemy.kind,
                score_value: enemy.score_value,
            },
            (None, true) => DestroyedKind::Player,
            (None, false) => {
                commands.entity(entity).insert(MarkedForDeletion);
                continue;
            }
        };
        if is_boss {
            state.boss_active = false;
            info!("boss destroyed at level {}", state.level);
        }
        if is_player {
            state.game_over = true;
            info!("player destroyed, final score {}", state.score);
        }

        destroyed_out.send(EntityDestroyedEvent {
            entity,
            kind,
            x: at.x,
            y: at.y,
            weapon: last_weapon.get(&entity).copied().flatten(),
        });
        commands.entity(entity).insert(MarkedForDeletion);
    }
}
