//! Public API for the simulation.
//!
//! This module provides the main interface for the game shell (renderer,
//! input, audio and UI collaborators) to drive the simulation.
//!
//! ## Tick
//!
//! The driver calls [`GameWorld::tick`] once per animation frame with the
//! frame delta in milliseconds. The tick runs the six [`Stage`] schedules in
//! [`Stage::ORDER`]; every schedule is a chain, so the whole pipeline has a
//! single fixed order. Deferred commands are applied between systems, and
//! marked entities are purged at the very end.
//!
//! ## Collaborators
//!
//! - Input writes a `MoveIntent` and the trigger state onto the player
//!   before calling `tick` ([`GameWorld::set_player_intent`], [`GameWorld::set_fire`]).
//! - The renderer reads a [`Snapshot`] after each tick.
//! - Event sinks take the collected [`TickEvents`] with [`GameWorld::drain_events`].

use crate::components::*;
use crate::config::{ConfigError, EngineConfig, GameData};
use crate::events::{drain_events_system, register_events, TickEvents};
use crate::profiler::Profiler;
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::*;
use crate::weapon::{FireControl, WeaponType};
use crate::world::{ComboState, GameState, SimRng, Snapshot, TickCount};
use bevy_ecs::prelude::*;
use bevy_ecs::query::QueryFilter;
use log::{info, trace};
use std::time::Instant;

/// Pipeline stages, executed once per tick in [`Stage::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decision,
    Weapons,
    Physics,
    Collision,
    Resolution,
    Cleanup,
}

impl Stage {
    /// The one registration list of the pipeline.
    pub const ORDER: [Stage; 6] = [
        Stage::Decision,
        Stage::Weapons,
        Stage::Physics,
        Stage::Collision,
        Stage::Resolution,
        Stage::Cleanup,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Decision => "decision",
            Stage::Weapons => "weapons",
            Stage::Physics => "physics",
            Stage::Collision => "collision",
            Stage::Resolution => "resolution",
            Stage::Cleanup => "cleanup",
        }
    }

    fn build_schedule(self) -> Schedule {
        let mut schedule = Schedule::default();
        match self {
            Stage::Decision => {
                schedule.add_systems(
                    (
                        game_clock_system,
                        spawn_director_system,
                        enemy_ai_system,
                        boss_phase_system,
                        boss_movement_system,
                    )
                        .chain(),
                );
            }
            Stage::Weapons => {
                schedule.add_systems((status_tick_system, player_fire_system, enemy_fire_system).chain());
            }
            Stage::Physics => {
                schedule.add_systems(
                    (
                        movement_system,
                        homing_system,
                        missile_system,
                        slow_field_system,
                        projectile_motion_system,
                        spatial_grid_update_system,
                    )
                        .chain(),
                );
            }
            Stage::Collision => {
                schedule.add_systems(collision_detection_system);
            }
            Stage::Resolution => {
                schedule.add_systems(
                    (
                        bullet_hit_system,
                        bounce_synergy_system,
                        synergy_effect_system,
                        player_hit_system,
                        burning_system,
                        shockwave_system,
                        meteor_system,
                        slow_field_decay_system,
                        death_system,
                        loot_drop_system,
                        powerup_collect_system,
                        combo_system,
                    )
                        .chain(),
                );
            }
            Stage::Cleanup => {
                schedule.add_systems(
                    (
                        lifetime_system,
                        offscreen_cull_system,
                        status_expiry_system,
                        missile_release_system,
                        despawn_marked_system,
                        drain_events_system,
                    )
                        .chain(),
                );
            }
        }
        schedule
    }
}

/// The main simulation world container.
///
/// Holds the ECS world and the stage schedules, providing a clean API for:
/// - Initializing the simulation from configuration and static game data
/// - Stepping the simulation forward
/// - Extracting state snapshots and published events
/// - Feeding player input
pub struct GameWorld {
    world: World,
    stages: Vec<(Stage, Schedule)>,
    profiler: Option<Profiler>,
}

impl GameWorld {
    /// Create a session with the default configuration and built-in tables.
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), GameData::builtin())
    }

    /// Create a session with custom tuning and built-in tables.
    ///
    /// An invalid configuration falls back to the defaults with a warning.
    pub fn with_config(config: EngineConfig) -> Self {
        match config.validate() {
            Ok(()) => Self::build(config, GameData::builtin()),
            Err(err) => {
                log::warn!("{err}; using default configuration");
                Self::new()
            }
        }
    }

    /// Create a session from loaded configuration and game data.
    pub fn with_data(config: EngineConfig, data: GameData) -> Result<Self, ConfigError> {
        config.validate()?;
        data.validate()?;
        Ok(Self::build(config, data))
    }

    fn build(config: EngineConfig, data: GameData) -> Self {
        let mut world = World::new();

        world.insert_resource(GameState::from_config(&config));
        world.insert_resource(SimRng::seeded(config.rng_seed));
        world.insert_resource(ComboState::default());
        world.insert_resource(TickCount::default());
        world.insert_resource(DeltaTime::default());
        world.insert_resource(SpatialGrid::default());
        register_events(&mut world);
        info!(
            "game world {}x{} with {} synergy rules, seed {:#x}",
            config.width,
            config.height,
            data.synergies.len(),
            config.rng_seed
        );
        world.insert_resource(config);
        world.insert_resource(data);

        let stages = Stage::ORDER.iter().map(|&stage| (stage, stage.build_schedule())).collect();

        Self {
            world,
            stages,
            profiler: None,
        }
    }

    /// Advance the simulation by one frame of `delta_ms` milliseconds.
    ///
    /// Negative and NaN deltas count as zero; deltas above
    /// `EngineConfig::max_delta_ms` are clamped.
    pub fn tick(&mut self, delta_ms: f32) {
        let max_delta = self.world.resource::<EngineConfig>().max_delta_ms;
        let delta_ms = if delta_ms.is_nan() || delta_ms <= 0.0 {
            0.0
        } else {
            delta_ms.min(max_delta)
        };

        *self.world.resource_mut::<DeltaTime>() = DeltaTime::from_millis(delta_ms);
        let tick = {
            let mut count = self.world.resource_mut::<TickCount>();
            count.0 += 1;
            count.0
        };

        for (stage, schedule) in self.stages.iter_mut() {
            match self.profiler.as_mut() {
                Some(profiler) => {
                    let start = Instant::now();
                    schedule.run(&mut self.world);
                    profiler.record(stage.name(), start.elapsed());
                }
                None => schedule.run(&mut self.world),
            }
        }
        if let Some(profiler) = self.profiler.as_mut() {
            profiler.tick();
        }

        trace!("tick {tick} done ({delta_ms:.2} ms), {} entities", self.world.entities().len());
    }

    // ------------------------------------------------------------------
    // Entity registry
    // ------------------------------------------------------------------

    pub fn create_entity(&mut self) -> Entity {
        self.world.spawn_empty().id()
    }

    /// Attach a component. Returns false for unknown entities.
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> bool {
        if !self.world.entities().contains(entity) {
            return false;
        }
        self.world.entity_mut(entity).insert(component);
        true
    }

    pub fn get_component<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.world.get::<C>(entity)
    }

    /// Detach a component and hand it back. Unknown entities yield `None`.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> Option<C> {
        if !self.world.entities().contains(entity) {
            return None;
        }
        self.world.entity_mut(entity).take::<C>()
    }

    /// Entities matching a filter such as `(With<Enemy>, With<Health>)`, in id order.
    pub fn query<F: QueryFilter>(&mut self) -> Vec<Entity> {
        let mut query = self.world.query_filtered::<Entity, F>();
        let mut entities: Vec<Entity> = query.iter(&self.world).collect();
        entities.sort();
        entities
    }

    /// Flag an entity for removal at the end of the next tick.
    pub fn mark_for_deletion(&mut self, entity: Entity) -> bool {
        self.add_component(entity, MarkedForDeletion)
    }

    // ------------------------------------------------------------------
    // Player and input
    // ------------------------------------------------------------------

    pub fn spawn_player(&mut self, x: f32, y: f32, weapon: WeaponType) -> Entity {
        let entity = self.world.spawn(PlayerBundle::new(x, y, weapon)).id();
        info!("player {entity:?} spawned with {}", weapon.name());
        entity
    }

    pub fn player(&mut self) -> Option<Entity> {
        self.query::<(With<PlayerControlled>, Without<MarkedForDeletion>)>().into_iter().next()
    }

    /// Queue this tick's movement for the player. Returns false without a player.
    pub fn set_player_intent(&mut self, intent: MoveIntent) -> bool {
        match self.player() {
            Some(player) => self.add_component(player, intent),
            None => false,
        }
    }

    /// Hold or release the trigger.
    pub fn set_fire(&mut self, firing: bool) -> bool {
        let Some(player) = self.player() else {
            return false;
        };
        match self.world.get_mut::<FireControl>(player) {
            Some(mut fire) => {
                fire.firing = firing;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Take the events published by the last tick.
    ///
    /// Call once per tick; older events are already gone.
    pub fn drain_events(&mut self) -> TickEvents {
        std::mem::take(&mut *self.world.resource_mut::<TickEvents>())
    }

    pub fn state(&self) -> &GameState {
        self.world.resource::<GameState>()
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<TickCount>().0
    }

    pub fn enable_profiling(&mut self) {
        self.profiler.get_or_insert_with(Profiler::new);
    }

    /// Stop timing stages, log the collected summary and hand the profiler back.
    pub fn disable_profiling(&mut self) -> Option<Profiler> {
        let profiler = self.profiler.take()?;
        profiler.log_summary();
        Some(profiler)
    }

    pub fn profiler(&self) -> Option<&Profiler> {
        self.profiler.as_ref()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DestroyedKind;
    use crate::synergy::SynergyType;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const FRAME_MS: f32 = 1000.0 / 60.0;

    /// A session without the spawn director, so only hand-placed enemies exist.
    fn quiet_world() -> GameWorld {
        GameWorld::with_config(EngineConfig {
            credit_rate: 0.0,
            ..EngineConfig::default()
        })
    }

    fn spawn_enemy(game: &mut GameWorld, x: f32, y: f32, max_hp: f32) -> Entity {
        let archetype = EnemyArchetype {
            max_hp,
            speed: 30.0,
            ..EnemyArchetype::defaults()[0]
        };
        game.world_mut().spawn(EnemyBundle::new(&archetype, x, y)).id()
    }

    #[test]
    fn test_new_world() {
        let game = GameWorld::new();
        assert_eq!(game.current_tick(), 0);
        assert_eq!(game.state().level, 1);
    }

    #[test]
    fn test_tick_sanitizes_delta() {
        let mut game = quiet_world();
        game.tick(f32::NAN);
        assert_eq!(game.world().resource::<DeltaTime>().0, 0.0);
        game.tick(-40.0);
        assert_eq!(game.world().resource::<DeltaTime>().0, 0.0);
        game.tick(10_000.0);
        assert!((game.world().resource::<DeltaTime>().0 - 0.05).abs() < 1e-6);
        assert_eq!(game.current_tick(), 3);
    }

    #[test]
    fn test_entity_registry_tolerates_unknown_ids() {
        let mut game = quiet_world();
        let e = game.create_entity();
        assert!(game.add_component(e, Transform::new(1.0, 2.0)));
        assert!(game.add_component(e, Health::new(10.0)));
        assert_eq!(game.get_component::<Transform>(e).unwrap().y, 2.0);
        assert_eq!(game.query::<(With<Transform>, With<Health>)>(), vec![e]);

        assert!(game.remove_component::<Health>(e).is_some());
        assert!(game.query::<(With<Transform>, With<Health>)>().is_empty());

        assert!(game.mark_for_deletion(e));
        assert!(game.get_component::<Transform>(e).is_some());
        game.tick(FRAME_MS);

        // Gone after the cleanup pass; unknown ids are not errors.
        assert!(game.get_component::<Transform>(e).is_none());
        assert!(!game.add_component(e, Health::new(1.0)));
        assert!(game.remove_component::<Transform>(e).is_none());
        assert!(!game.mark_for_deletion(e));
    }

    #[test]
    fn test_player_intent_consumed_and_bounded() {
        let mut game = quiet_world();
        let player = game.spawn_player(240.0, 600.0, WeaponType::Vulcan);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..300 {
            let intent = if rng.gen_bool(0.5) {
                MoveIntent::velocity(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0))
            } else {
                MoveIntent::offset(rng.gen_range(-400.0..400.0), rng.gen_range(-400.0..400.0))
            };
            assert!(game.set_player_intent(intent));
            game.tick(FRAME_MS);

            assert!(game.get_component::<MoveIntent>(player).is_none());
            let at = *game.get_component::<Transform>(player).unwrap();
            let hitbox = *game.get_component::<Collider>(player).unwrap();
            let state = game.state();
            assert!(at.x >= hitbox.half_width && at.x <= state.width - hitbox.half_width);
            assert!(at.y >= hitbox.half_height && at.y <= state.height - hitbox.half_height);
        }
    }

    #[test]
    fn test_vulcan_kills_enemy_and_scores() {
        let mut game = quiet_world();
        game.spawn_player(240.0, 600.0, WeaponType::Vulcan);
        let drone = spawn_enemy(&mut game, 240.0, 450.0, 12.0);
        assert!(game.set_fire(true));

        let mut destroyed = Vec::new();
        for _ in 0..90 {
            game.tick(FRAME_MS);
            destroyed.extend(game.drain_events().destroyed);
        }

        let kill = destroyed.iter().find(|e| e.entity == drone).expect("drone destroyed");
        assert!(matches!(kill.kind, DestroyedKind::Enemy { .. }));
        assert_eq!(kill.weapon, Some(WeaponType::Vulcan));
        assert!(game.state().score >= 10);
        assert_eq!(game.state().kills, 1);
        assert!(game.get_component::<Health>(drone).is_none());
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_magma_shuriken_burns_struck_enemy() {
        let mut game = quiet_world();
        let player = game.spawn_player(240.0, 600.0, WeaponType::Shuriken);
        game.world_mut().get_mut::<crate::weapon::Armory>(player).unwrap().equip(WeaponType::Magma);
        let tank = spawn_enemy(&mut game, 240.0, 420.0, 5000.0);
        game.set_fire(true);

        let mut burned = false;
        let mut synergies = Vec::new();
        for _ in 0..120 {
            game.tick(FRAME_MS);
            burned |= game.get_component::<Burning>(tank).is_some();
            synergies.extend(game.drain_events().synergies);
        }

        assert!(synergies.iter().any(|s| s.effect.synergy == SynergyType::BlazingStar));
        assert!(burned);
    }

    #[test]
    fn test_undrained_events_stay_bounded() {
        let mut game = quiet_world();
        game.spawn_player(240.0, 600.0, WeaponType::Vulcan);
        spawn_enemy(&mut game, 240.0, 450.0, 1.0e6);
        game.set_fire(true);

        let mut seen_damage = false;
        for _ in 0..1000 {
            game.tick(1.0);
            let buffered = game.world().resource::<TickEvents>();
            seen_damage |= !buffered.damage.is_empty();
            assert!(buffered.damage.len() < 16);
        }
        assert!(seen_damage);
    }

    #[test]
    fn test_player_death_ends_game() {
        let mut game = quiet_world();
        let player = game.spawn_player(240.0, 600.0, WeaponType::Vulcan);
        game.world_mut().get_mut::<Health>(player).unwrap().set_hp(0.0);
        game.tick(FRAME_MS);

        assert!(game.state().game_over);
        let events = game.drain_events();
        assert!(events.destroyed.iter().any(|e| e.kind == DestroyedKind::Player));
        assert!(game.snapshot().game_over);
    }

    #[test]
    fn test_same_seed_same_session() {
        let run = || {
            let mut game = GameWorld::new();
            game.spawn_player(240.0, 600.0, WeaponType::Missile);
            game.set_fire(true);
            for i in 0..400 {
                let dx = if (i / 60) % 2 == 0 { 1.0 } else { -1.0 };
                game.set_player_intent(MoveIntent::velocity(dx, 0.0));
                game.tick(FRAME_MS);
            }
            game.snapshot_json()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_profiling_records_every_stage() {
        let mut game = quiet_world();
        game.enable_profiling();
        game.tick(FRAME_MS);
        game.tick(FRAME_MS);

        let profiler = game.profiler().unwrap();
        assert_eq!(profiler.tick_count(), 2);
        for stage in Stage::ORDER {
            assert_eq!(profiler.get_section(stage.name()).unwrap().call_count, 2);
        }

        let profiler = game.disable_profiling().unwrap();
        assert_eq!(profiler.tick_count(), 2);
        game.tick(FRAME_MS);
        assert!(game.profiler().is_none());
        assert!(game.disable_profiling().is_none());
    }

    #[test]
    fn test_invalid_data_rejected() {
        let config = EngineConfig {
            width: -1.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            GameWorld::with_data(config.clone(), GameData::builtin()),
            Err(ConfigError::Invalid(_))
        ));
        // The infallible constructor falls back to defaults.
        assert_eq!(GameWorld::with_config(config).state().width, EngineConfig::default().width);
    }
}
