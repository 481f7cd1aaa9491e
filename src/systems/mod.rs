//! ECS Systems for the Skyfire simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Pipeline
//!
//! `GameWorld::tick` runs one schedule per stage, in this order. Within a
//! stage the systems are chained, so the listed order is the execution order.
//!
//! **Decision** - who wants to do what:
//! - `game_clock_system`, `spawn_director_system`
//! - `enemy_ai_system`, `boss_phase_system`, `boss_movement_system`
//!
//! **Weapons** - buffs tick, then volleys spawn:
//! - `status_tick_system`, `player_fire_system`, `enemy_fire_system`
//!
//! **Physics** - intents and velocities become positions:
//! - `movement_system`, `homing_system`, `missile_system`
//! - `slow_field_system`, `projectile_motion_system`
//! - `spatial_grid_update_system`
//!
//! **Collision** - overlap tests, events only:
//! - `collision_detection_system`
//!
//! **Resolution** - events become damage, effects, deaths, score:
//! - `bullet_hit_system`, `bounce_synergy_system`, `synergy_effect_system`
//! - `player_hit_system`, `burning_system`, `shockwave_system`, `meteor_system`
//! - `slow_field_decay_system`, `death_system`
//! - `loot_drop_system`, `powerup_collect_system`, `combo_system`
//!
//! **Cleanup** - expiry, culling, despawn, event drain:
//! - `lifetime_system`, `offscreen_cull_system`, `status_expiry_system`
//! - `missile_release_system`, `despawn_marked_system`, `drain_events_system`

pub mod ai;
pub mod boss;
pub mod buffs;
pub mod cleanup;
pub mod collision;
pub mod combo;
pub mod damage;
pub mod effects;
pub mod loot;
pub mod movement;
pub mod projectiles;
pub mod spawn;
pub mod weapons;

pub use ai::*;
pub use boss::*;
pub use buffs::*;
pub use cleanup::*;
pub use collision::*;
pub use combo::*;
pub use damage::*;
pub use effects::*;
pub use loot::*;
pub use movement::*;
pub use projectiles::*;
pub use spawn::*;
pub use weapons::*;
