//! Skyfire - Simulation Core
//!
//! A deterministic, variable-timestep ECS simulation for a vertical arcade
//! shoot-'em-up: player weapons and synergies, enemy waves, bosses, loot and
//! scoring. Uses `bevy_ecs` for the entity-component-system architecture.
//!
//! Rendering, audio and input live outside this crate; they talk to the
//! simulation through [`GameWorld`].

pub mod api;
pub mod boss;
pub mod components;
pub mod config;
pub mod events;
pub mod profiler;
pub mod spatial;
pub mod synergy;
pub mod systems;
pub mod weapon;
pub mod world;

pub use api::{GameWorld, Stage};
pub use boss::{BossPattern, BossRegistry};
pub use components::*;
pub use config::{ConfigError, EngineConfig, GameData};
pub use events::TickEvents;
pub use profiler::Profiler;
pub use spatial::{SpatialEntry, SpatialGrid};
pub use synergy::{SynergyTable, SynergyType};
pub use systems::DeltaTime;
pub use weapon::WeaponType;
pub use world::{GameState, Snapshot};
