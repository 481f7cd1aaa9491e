//! Typed event channels between systems.
//!
//! Every channel is a `bevy_ecs` `Events<T>` resource. Writers publish into the
//! current tick's buffer and readers scheduled later in the same tick see the
//! event immediately. The cleanup stage drains every channel at the end of the
//! tick, so nothing leaks into the next tick's earlier systems. The observer
//! buffer holds the most recent tick only.

use crate::components::EnemyKind;
use crate::synergy::{SynergyEffect, SynergyType};
use crate::weapon::WeaponType;
use bevy_ecs::event::Events;
use bevy_ecs::prelude::*;

/// A player bullet overlapped an enemy.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BulletHitEvent {
    pub bullet: Entity,
    pub target: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerHitSource {
    /// Body contact with an enemy or boss.
    Contact,
    /// Enemy bullet.
    Bullet,
}

/// Something hostile overlapped the player.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PlayerHitEvent {
    pub player: Entity,
    pub source: Entity,
    pub kind: PlayerHitSource,
}

/// The player touched a powerup.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PowerupCollectedEvent {
    pub player: Entity,
    pub powerup: Entity,
}

/// A bouncing bullet reflected off a wall this tick.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BulletBouncedEvent {
    pub bullet: Entity,
    pub weapon: WeaponType,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageSource {
    Weapon(WeaponType),
    Synergy(SynergyType),
    Burn,
    Area,
    Contact,
    EnemyFire,
}

/// Damage actually applied to an entity's health.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageDealtEvent {
    pub target: Entity,
    pub amount: f32,
    pub source: DamageSource,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DestroyedKind {
    Enemy { kind: EnemyKind, score_value: u32 },
    Player,
}

/// An entity's health reached zero. Published once per entity.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EntityDestroyedEvent {
    pub entity: Entity,
    pub kind: DestroyedKind,
    pub x: f32,
    pub y: f32,
    /// Weapon that dealt the killing blow, when one did.
    pub weapon: Option<WeaponType>,
}

/// A synergy rule fired.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SynergyTriggeredEvent {
    pub effect: SynergyEffect,
}

/// Shield charges changed on the player.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ShieldChangedEvent {
    pub player: Entity,
    pub charges: u32,
}

/// Events published during the last tick, handed to outside observers
/// (UI, audio, score display) by `GameWorld::drain_events`.
///
/// Replaced wholesale at every drain point; a host that never takes the
/// events loses them after one tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct TickEvents {
    pub damage: Vec<DamageDealtEvent>,
    pub destroyed: Vec<EntityDestroyedEvent>,
    pub powerups: Vec<PowerupCollectedEvent>,
    pub synergies: Vec<SynergyTriggeredEvent>,
    pub shields: Vec<ShieldChangedEvent>,
    pub player_hits: Vec<PlayerHitEvent>,
}

impl TickEvents {
    pub fn is_empty(&self) -> bool {
        self.damage.is_empty()
            && self.destroyed.is_empty()
            && self.powerups.is_empty()
            && self.synergies.is_empty()
            && self.shields.is_empty()
            && self.player_hits.is_empty()
    }
}

/// Register every event channel and the observer buffer on a world.
pub fn register_events(world: &mut World) {
    world.init_resource::<Events<BulletHitEvent>>();
    world.init_resource::<Events<PlayerHitEvent>>();
    world.init_resource::<Events<PowerupCollectedEvent>>();
    world.init_resource::<Events<BulletBouncedEvent>>();
    world.init_resource::<Events<DamageDealtEvent>>();
    world.init_resource::<Events<EntityDestroyedEvent>>();
    world.init_resource::<Events<SynergyTriggeredEvent>>();
    world.init_resource::<Events<ShieldChangedEvent>>();
    world.init_resource::<TickEvents>();
}

fn drain_into<E: Event>(world: &mut World, out: &mut Vec<E>) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        out.extend(events.drain());
    }
}

fn discard<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.clear();
    }
}

/// Drain point at the end of a tick: observer-facing channels move into a
/// fresh [`TickEvents`], internal channels are discarded.
pub fn drain_events_system(world: &mut World) {
    let mut collected = TickEvents::default();

    drain_into(world, &mut collected.damage);
    drain_into(world, &mut collected.destroyed);
    drain_into(world, &mut collected.powerups);
    drain_into(world, &mut collected.synergies);
    drain_into(world, &mut collected.shields);
    drain_into(world, &mut collected.player_hits);
    discard::<BulletHitEvent>(world);
    discard::<BulletBouncedEvent>(world);

    world.insert_resource(collected);
}
