//! Game clock, difficulty curve and the spawn director.
//!
//! The director earns credits over time and spends them on enemy archetypes.
//! All randomness comes from the seeded [`SimRng`], so a session replays
//! identically for the same seed and tick deltas.

use crate::boss::BossAi;
use crate::components::*;
use crate::config::{EngineConfig, GameData};
use crate::systems::movement::DeltaTime;
use crate::world::{GameState, SimRng};
use bevy_ecs::prelude::*;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::TAU;

/// Upper bound on regular enemies bought in a single tick.
pub const MAX_SPAWNS_PER_TICK: usize = 4;
/// Boss anchor height as a share of the playfield height.
const BOSS_ANCHOR_HEIGHT: f32 = 0.18;

/// Advance elapsed time, grow difficulty and roll levels over.
pub fn game_clock_system(dt: Res<DeltaTime>, config: Res<EngineConfig>, mut state: ResMut<GameState>) {
    if state.game_over {
        return;
    }
    let delta = dt.0;
    state.elapsed += delta;
    state.level_time += delta;
    state.difficulty += config.difficulty_growth * delta;

    if state.level_time >= config.level_duration {
        state.level_time -= config.level_duration;
        state.level += 1;
        state.boss_pending = true;
        info!("level {} reached at {:.1}s, difficulty {:.2}", state.level, state.elapsed, state.difficulty);
    }
}

fn spawn_boss(commands: &mut Commands, data: &GameData, state: &GameState) -> bool {
    let Some(profile) = data.bosses.for_level(state.level) else {
        return false;
    };
    let Some(first) = profile.phases.first() else {
        return false;
    };
    let anchor_x = state.width / 2.0;
    let anchor_y = state.height * BOSS_ANCHOR_HEIGHT;
    let (interval, bullet_speed, damage) = profile.gun;

    let mut ai = BossAi::new(profile.kind, first.pattern, anchor_x, anchor_y);
    ai.speed_modifier = first.speed_modifier;

    let entity = commands
        .spawn((
            Enemy {
                kind: EnemyKind::Boss,
                score_value: profile.score_value,
            },
            ai,
            Transform { x: anchor_x, y: anchor_y, rotation: std::f32::consts::FRAC_PI_2 },
            profile.speed,
            Health::new(profile.max_hp),
            Collider::new(profile.size, profile.size, CollisionLayer::Enemy),
            IncomingMissiles::default(),
            EnemyGun::new(interval, bullet_speed, damage),
        ))
        .id();
    info!("{:?} {entity:?} spawned for level {}", profile.kind, state.level);
    true
}

/// Spend accrued credits on enemies; spawn the level boss when one is owed.
///
/// Credits do not accrue while a boss is alive.
pub fn spawn_director_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    config: Res<EngineConfig>,
    data: Res<GameData>,
    mut state: ResMut<GameState>,
    mut rng: ResMut<SimRng>,
) {
    if state.game_over {
        return;
    }

    if state.boss_pending && !state.boss_active {
        let spawned = spawn_boss(&mut commands, &data, &state);
        state.boss_pending = false;
        state.boss_active = spawned;
    }
    if state.boss_active {
        return;
    }

    state.spawn_credits += config.credit_rate * state.difficulty * dt.0;

    for _ in 0..MAX_SPAWNS_PER_TICK {
        let affordable: Vec<&EnemyArchetype> = data
            .enemies
            .iter()
            .filter(|a| a.min_difficulty <= state.difficulty && a.cost <= state.spawn_credits)
            .collect();
        let Some(&archetype) = affordable.choose(&mut rng.0) else {
            break;
        };
        state.spawn_credits -= archetype.cost;

        let half = archetype.size / 2.0;
        let x = if state.width > archetype.size {
            rng.0.gen_range(half..state.width - half)
        } else {
            state.width / 2.0
        };
        let mut archetype = *archetype;
        if let EnemyAi::Sine { amplitude, frequency, .. } = archetype.ai {
            archetype.ai = EnemyAi::Sine { amplitude, frequency, phase: rng.0.gen_range(0.0..TAU) };
        }

        let mut spawned = commands.spawn(EnemyBundle::new(&archetype, x, -archetype.size));
        if archetype.evasive {
            spawned.insert(Evasive);
        }
        if let Some((interval, bullet_speed, damage)) = archetype.gun {
            spawned.insert(EnemyGun::new(interval, bullet_speed, damage));
        }
        debug!("spawned {:?} {:?} at x={x:.0}", archetype.kind, spawned.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world(dt: f32) -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(dt));
        world.insert_resource(EngineConfig::default());
        world.insert_resource(GameData::builtin());
        world.insert_resource(GameState::default());
        world.insert_resource(SimRng::seeded(42));
        world
    }

    fn schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((game_clock_system, spawn_director_system).chain());
        schedule
    }

    fn enemy_positions(world: &mut World) -> Vec<(EnemyKind, u32, u32)> {
        let mut query = world.query::<(&Enemy, &Transform)>();
        let mut out: Vec<_> = query
            .iter(world)
            .map(|(e, t)| (e.kind, t.x.to_bits(), t.y.to_bits()))
            .collect();
        out.sort_by_key(|(_, x, y)| (*x, *y));
        out
    }

    #[test]
    fn test_credits_buy_enemies_above_screen() {
        let mut world = test_world(1.0);
        let mut schedule = schedule();
        for _ in 0..5 {
            schedule.run(&mut world);
        }
        let mut query = world.query::<(&Enemy, &Transform)>();
        let enemies: Vec<_> = query.iter(&world).collect();
        assert!(!enemies.is_empty());
        assert!(enemies.iter().all(|(_, t)| t.y < 0.0));
        assert!(world.resource::<GameState>().spawn_credits >= 0.0);
    }

    #[test]
    fn test_same_seed_same_waves() {
        let mut a = test_world(0.5);
        let mut b = test_world(0.5);
        let mut schedule_a = schedule();
        let mut schedule_b = schedule();
        for _ in 0..40 {
            schedule_a.run(&mut a);
            schedule_b.run(&mut b);
        }
        assert_eq!(enemy_positions(&mut a), enemy_positions(&mut b));
    }

    #[test]
    fn test_level_up_spawns_boss_and_pauses_credits() {
        let mut world = test_world(1.0);
        world.resource_mut::<EngineConfig>().level_duration = 2.0;
        let mut schedule = schedule();
        schedule.run(&mut world);
        schedule.run(&mut world);

        let state = world.resource::<GameState>();
        assert_eq!(state.level, 2);
        assert!(state.boss_active && !state.boss_pending);
        let credits = state.spawn_credits;

        let mut bosses = world.query::<(&BossAi, &Enemy)>();
        let (ai, enemy) = bosses.single(&world);
        assert_eq!(ai.kind, crate::boss::BossKind::Dreadnought);
        assert_eq!(enemy.kind, EnemyKind::Boss);

        schedule.run(&mut world);
        assert_eq!(world.resource::<GameState>().spawn_credits, credits);
    }

    #[test]
    fn test_game_over_freezes_clock() {
        let mut world = test_world(1.0);
        world.resource_mut::<GameState>().game_over = true;
        schedule().run(&mut world);
        assert_eq!(world.resource::<GameState>().elapsed, 0.0);
    }
}
