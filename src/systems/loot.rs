//! Powerup drops and pickups.

use crate::components::*;
use crate::config::EngineConfig;
use crate::events::{DestroyedKind, EntityDestroyedEvent, PowerupCollectedEvent, ShieldChangedEvent};
use crate::weapon::{Armory, WeaponType};
use crate::world::SimRng;
use bevy_ecs::prelude::*;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

pub const POWERUP_SIZE: f32 = 20.0;
/// Downward drift in pixels per reference frame.
pub const POWERUP_DRIFT: f32 = 1.0;
pub const POWERUP_LIFETIME: f32 = 10.0;
pub const HEAL_AMOUNT: f32 = 25.0;

const BUFF_KINDS: [BuffKind; 3] = [BuffKind::RapidFire, BuffKind::DamageUp, BuffKind::Shield];

fn random_weapon<R: Rng + ?Sized>(rng: &mut R) -> PowerupKind {
    PowerupKind::Weapon(*WeaponType::ALL.choose(rng).unwrap_or(&WeaponType::Vulcan))
}

/// Roll the content of a drop. Bosses always drop a weapon.
fn roll_powerup<R: Rng + ?Sized>(rng: &mut R, boss: bool) -> PowerupKind {
    if boss {
        return random_weapon(rng);
    }
    match rng.gen_range(0..20) {
        0..=7 => random_weapon(rng),
        8..=14 => PowerupKind::Buff(*BUFF_KINDS.choose(rng).unwrap_or(&BuffKind::RapidFire)),
        _ => PowerupKind::Heal(HEAL_AMOUNT),
    }
}

pub fn spawn_powerup(commands: &mut Commands, kind: PowerupKind, x: f32, y: f32) -> Entity {
    commands
        .spawn((
            Powerup { kind },
            Transform::new(x, y),
            Velocity::new(0.0, POWERUP_DRIFT),
            Collider::new(POWERUP_SIZE, POWERUP_SIZE, CollisionLayer::Powerup),
            Lifetime::new(POWERUP_LIFETIME),
        ))
        .id()
}

/// Killed enemies drop a powerup with `loot_chance`; bosses always drop.
pub fn loot_drop_system(
    mut commands: Commands,
    config: Res<EngineConfig>,
    mut rng: ResMut<SimRng>,
    mut destroyed: EventReader<EntityDestroyedEvent>,
) {
    for event in destroyed.read() {
        let DestroyedKind::Enemy { kind, .. } = event.kind else {
            continue;
        };
        let boss = kind == EnemyKind::Boss;
        if !boss && !rng.0.gen_bool(config.loot_chance) {
            continue;
        }
        let drop = roll_powerup(&mut rng.0, boss);
        let entity = spawn_powerup(&mut commands, drop, event.x, event.y);
        debug!("{kind:?} dropped {drop:?} as {entity:?}");
    }
}

/// Apply collected powerups to the player and remove them.
///
/// A powerup touched twice in one tick is applied once.
pub fn powerup_collect_system(
    mut commands: Commands,
    mut pickups: EventReader<PowerupCollectedEvent>,
    powerups: Query<&Powerup, Without<MarkedForDeletion>>,
    mut players: Query<(&mut Armory, &mut Buffs, &mut Health), With<PlayerControlled>>,
    mut shield_out: EventWriter<ShieldChangedEvent>,
) {
    let mut collected = HashSet::new();
    for event in pickups.read() {
        if !collected.insert(event.powerup) {
            continue;
        }
        let Ok(powerup) = powerups.get(event.powerup) else {
            continue;
        };
        let Ok((mut armory, mut buffs, mut health)) = players.get_mut(event.player) else {
            continue;
        };
        match powerup.kind {
            PowerupKind::Weapon(weapon) => {
                let level = armory.equip(weapon);
                debug!("{} now level {level}", weapon.name());
            }
            PowerupKind::Buff(kind) => {
                buffs.grant(kind);
                if kind == BuffKind::Shield {
                    shield_out.send(ShieldChangedEvent {
                        player: event.player,
                        charges: buffs.shield_charges(),
                    });
                }
            }
            PowerupKind::Heal(amount) => {
                health.heal(amount);
            }
        }
        commands.entity(event.powerup).insert(MarkedForDeletion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::register_events;
    use bevy_ecs::event::Events;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(EngineConfig::default());
        world.insert_resource(SimRng::seeded(9));
        register_events(&mut world);
        world
    }

    fn destroyed(entity: Entity, kind: EnemyKind) -> EntityDestroyedEvent {
        EntityDestroyedEvent {
            entity,
            kind: DestroyedKind::Enemy { kind, score_value: 10 },
            x: 100.0,
            y: 50.0,
            weapon: None,
        }
    }

    #[test]
    fn test_boss_always_drops_weapon() {
        let mut world = test_world();
        world.resource_mut::<EngineConfig>().loot_chance = 0.0;
        world.send_event(destroyed(Entity::from_raw(5), EnemyKind::Drone));
        world.send_event(destroyed(Entity::from_raw(6), EnemyKind::Boss));

        let mut schedule = Schedule::default();
        schedule.add_systems(loot_drop_system);
        schedule.run(&mut world);

        let mut drops = world.query::<(&Powerup, &Transform, &Velocity)>();
        let (powerup, at, v) = drops.single(&world);
        assert!(matches!(powerup.kind, PowerupKind::Weapon(_)));
        assert_eq!((at.x, at.y), (100.0, 50.0));
        assert_eq!(v.vy, POWERUP_DRIFT);
    }

    #[test]
    fn test_full_loot_chance_drops_for_every_enemy() {
        let mut world = test_world();
        world.resource_mut::<EngineConfig>().loot_chance = 1.0;
        for i in 0..6 {
            world.send_event(destroyed(Entity::from_raw(i), EnemyKind::Drone));
        }
        let mut schedule = Schedule::default();
        schedule.add_systems(loot_drop_system);
        schedule.run(&mut world);

        let mut drops = world.query::<&Powerup>();
        assert_eq!(drops.iter(&world).count(), 6);
    }

    #[test]
    fn test_collect_applies_once() {
        let mut world = test_world();
        let player = world.spawn(PlayerBundle::new(0.0, 0.0, WeaponType::Vulcan)).id();
        let shield = world.spawn(Powerup { kind: PowerupKind::Buff(BuffKind::Shield) }).id();
        let vulcan = world.spawn(Powerup { kind: PowerupKind::Weapon(WeaponType::Vulcan) }).id();
        world.get_mut::<Health>(player).unwrap().set_hp(50.0);
        let heal = world.spawn(Powerup { kind: PowerupKind::Heal(HEAL_AMOUNT) }).id();
        for powerup in [shield, vulcan, vulcan, heal] {
            world.send_event(PowerupCollectedEvent { player, powerup });
        }

        let mut schedule = Schedule::default();
        schedule.add_systems(powerup_collect_system);
        schedule.run(&mut world);

        assert_eq!(world.get::<Armory>(player).unwrap().level(WeaponType::Vulcan), Some(2));
        assert_eq!(world.get::<Buffs>(player).unwrap().shield_charges(), 3);
        assert_eq!(world.get::<Health>(player).unwrap().hp(), 75.0);
        for powerup in [shield, vulcan, heal] {
            assert!(world.get::<MarkedForDeletion>(powerup).is_some());
        }
        let shields: Vec<_> = world.resource_mut::<Events<ShieldChangedEvent>>().drain().collect();
        assert_eq!(shields, vec![ShieldChangedEvent { player, charges: 3 }]);
    }
}
