//! Global simulation state and snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation state
//! that the rendering collaborator consumes after each tick.

use crate::boss::{BossAi, BossPattern};
use crate::components::*;
use crate::config::EngineConfig;
use crate::weapon::{Armory, WeaponType};
use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Session-wide scalars.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub score: u64,
    pub difficulty: f32,
    pub level: u32,
    pub spawn_credits: f32,
    pub width: f32,
    pub height: f32,
    /// Seconds of simulated play.
    pub elapsed: f32,
    /// Seconds into the current level.
    pub level_time: f32,
    pub kills: u32,
    pub game_over: bool,
    /// A boss of the current level is alive.
    pub boss_active: bool,
    /// The level-up spawner owes a boss.
    pub boss_pending: bool,
}

impl GameState {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            score: 0,
            difficulty: 1.0,
            level: 1,
            spawn_credits: 0.0,
            width,
            height,
            elapsed: 0.0,
            level_time: 0.0,
            kills: 0,
            game_over: false,
            boss_active: false,
            boss_pending: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Whether a point lies inside the playfield expanded by `margin`.
    pub fn in_bounds(&self, x: f32, y: f32, margin: f32) -> bool {
        x >= -margin && x <= self.width + margin && y >= -margin && y <= self.height + margin
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Kill chain tracking for the score multiplier.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub chain: u32,
    /// Seconds left before the chain resets.
    pub timer: f32,
    pub best_chain: u32,
}

impl ComboState {
    pub fn multiplier(&self, max: f32) -> f32 {
        (1.0 + self.chain as f32 / 10.0).min(max)
    }
}

/// Seeded RNG shared by the spawn director and loot rolls.
#[derive(Resource, Debug)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Monotonic tick counter.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct TickCount(pub u64);

/// Snapshot of the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub health: f32,
    pub health_max: f32,
    pub weapons: Vec<(WeaponType, u8)>,
    pub buffs: Vec<BuffKind>,
    pub shield_charges: u32,
    pub invincible: bool,
}

/// Snapshot of an enemy or boss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub id: u64,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub health: f32,
    pub health_max: f32,
    pub burning: bool,
    pub slowed: bool,
    /// Active pattern for bosses.
    pub pattern: Option<BossPattern>,
}

/// Snapshot of any projectile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    /// `None` for enemy bullets.
    pub weapon: Option<WeaponType>,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub vx: f32,
    pub vy: f32,
}

/// Snapshot of an area effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSnapshot {
    pub id: u64,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub life: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupSnapshot {
    pub id: u64,
    pub kind: PowerupKind,
    pub x: f32,
    pub y: f32,
}

/// Complete read-only view of the simulation after a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub score: u64,
    pub level: u32,
    pub difficulty: f32,
    pub combo: u32,
    pub game_over: bool,
    pub player: Option<PlayerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub areas: Vec<AreaSnapshot>,
    pub powerups: Vec<PowerupSnapshot>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World) -> Self {
        let tick = world.get_resource::<TickCount>().map(|t| t.0).unwrap_or(0);
        let state = world.get_resource::<GameState>().cloned().unwrap_or_default();
        let combo = world.get_resource::<ComboState>().map(|c| c.chain).unwrap_or(0);

        let mut player_query = world.query_filtered::<(
            Entity,
            &Transform,
            &Health,
            Option<&Armory>,
            Option<&Buffs>,
            Option<&Invincibility>,
        ), With<PlayerControlled>>();
        let player = player_query
            .iter(world)
            .next()
            .map(|(entity, t, health, armory, buffs, inv)| PlayerSnapshot {
                id: entity.to_bits(),
                x: t.x,
                y: t.y,
                rotation: t.rotation,
                health: health.hp(),
                health_max: health.max(),
                weapons: armory
                    .map(|a| a.weapons.iter().map(|(w, l)| (*w, *l)).collect())
                    .unwrap_or_default(),
                buffs: buffs
                    .map(|b| b.active.iter().filter(|a| a.remaining > 0.0).map(|a| a.kind).collect())
                    .unwrap_or_default(),
                shield_charges: buffs.map(|b| b.shield_charges()).unwrap_or(0),
                invincible: inv.map(|i| i.is_active()).unwrap_or(false),
            });

        let mut enemy_query = world.query_filtered::<(
            Entity,
            &Enemy,
            &Transform,
            &Health,
            Has<Burning>,
            Has<Slowed>,
            Option<&BossAi>,
        ), Without<MarkedForDeletion>>();
        let mut enemies: Vec<EnemySnapshot> = enemy_query
            .iter(world)
            .map(|(entity, enemy, t, health, burning, slowed, boss)| EnemySnapshot {
                id: entity.to_bits(),
                kind: enemy.kind,
                x: t.x,
                y: t.y,
                rotation: t.rotation,
                health: health.hp(),
                health_max: health.max(),
                burning,
                slowed,
                pattern: boss.map(|b| b.pattern),
            })
            .collect();
        enemies.sort_by_key(|e| e.id);

        let mut projectiles = Vec::new();
        let mut bullet_query = world.query_filtered::<(
            Entity,
            &Transform,
            &Velocity,
            Option<&Bullet>,
            Has<EnemyBullet>,
        ), Without<MarkedForDeletion>>();
        for (entity, t, v, bullet, enemy_bullet) in bullet_query.iter(world) {
            if bullet.is_none() && !enemy_bullet {
                continue;
            }
            projectiles.push(ProjectileSnapshot {
                id: entity.to_bits(),
                weapon: bullet.map(|b| b.weapon),
                x: t.x,
                y: t.y,
                rotation: t.rotation,
                vx: v.vx,
                vy: v.vy,
            });
        }
        projectiles.sort_by_key(|p| p.id);

        let mut areas = Vec::new();
        let mut field_query = world.query::<(Entity, &Transform, &SlowField)>();
        for (entity, t, field) in field_query.iter(world) {
            areas.push(AreaSnapshot {
                id: entity.to_bits(),
                kind: "slow_field".to_string(),
                x: t.x,
                y: t.y,
                radius: field.radius,
                life: field.life,
            });
        }
        let mut wave_query = world.query::<(Entity, &Transform, &Shockwave)>();
        for (entity, t, wave) in wave_query.iter(world) {
            areas.push(AreaSnapshot {
                id: entity.to_bits(),
                kind: "shockwave".to_string(),
                x: t.x,
                y: t.y,
                radius: wave.radius,
                life: wave.life,
            });
        }
        let mut meteor_query = world.query::<(Entity, &Transform, &Meteor)>();
        for (entity, t, meteor) in meteor_query.iter(world) {
            areas.push(AreaSnapshot {
                id: entity.to_bits(),
                kind: "meteor".to_string(),
                x: t.x,
                y: t.y,
                radius: meteor.radius,
                life: meteor.delay.max(0.0) + meteor.life,
            });
        }
        areas.sort_by_key(|a| a.id);

        let mut powerup_query = world.query_filtered::<(Entity, &Powerup, &Transform), Without<MarkedForDeletion>>();
        let mut powerups: Vec<PowerupSnapshot> = powerup_query
            .iter(world)
            .map(|(entity, p, t)| PowerupSnapshot {
                id: entity.to_bits(),
                kind: p.kind,
                x: t.x,
                y: t.y,
            })
            .collect();
        powerups.sort_by_key(|p| p.id);

        Self {
            tick,
            time: state.elapsed,
            score: state.score,
            level: state.level,
            difficulty: state.difficulty,
            combo,
            game_over: state.game_over,
            player,
            enemies,
            projectiles,
            areas,
            powerups,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_multiplier_caps() {
        let mut combo = ComboState::default();
        assert_eq!(combo.multiplier(5.0), 1.0);
        combo.chain = 15;
        assert!((combo.multiplier(5.0) - 2.5).abs() < 1e-6);
        combo.chain = 400;
        assert_eq!(combo.multiplier(5.0), 5.0);
    }

    #[test]
    fn test_snapshot_lists_live_entities() {
        let mut world = World::new();
        world.insert_resource(GameState::default());
        world.spawn(PlayerBundle::new(240.0, 600.0, WeaponType::Vulcan));
        let drone = EnemyArchetype::defaults()[0];
        world.spawn(EnemyBundle::new(&drone, 100.0, 50.0));
        world.spawn((EnemyBundle::new(&drone, 120.0, 50.0), MarkedForDeletion));

        let snapshot = Snapshot::from_world(&mut world);
        let player = snapshot.player.as_ref().unwrap();
        assert_eq!(player.weapons, vec![(WeaponType::Vulcan, 1)]);
        assert_eq!(snapshot.enemies.len(), 1);
        assert!(snapshot.to_json().unwrap().contains("\"enemies\""));
    }

    #[test]
    fn test_snapshot_json_names_patterns_and_weapons() {
        let snapshot = Snapshot {
            tick: 42,
            enemies: vec![EnemySnapshot {
                id: 7,
                kind: EnemyKind::Boss,
                x: 240.0,
                y: 130.0,
                rotation: 1.57,
                health: 900.0,
                health_max: 1500.0,
                burning: true,
                slowed: false,
                pattern: Some(BossPattern::Sweep),
            }],
            powerups: vec![PowerupSnapshot {
                id: 11,
                kind: PowerupKind::Weapon(WeaponType::Frost),
                x: 5.0,
                y: 6.0,
            }],
            ..Snapshot::default()
        };

        let text = snapshot.to_json().unwrap();
        assert!(text.contains("\"Sweep\""));
        assert!(text.contains("\"Frost\""));
        let restored: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.tick, 42);
        assert_eq!(restored.enemies[0].pattern, Some(BossPattern::Sweep));
    }
}
