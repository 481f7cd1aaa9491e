//! Buff, invincibility and status timers.
//!
//! Timers run down in the weapons stage so fire rates see this tick's buffs.
//! Expired entries are only removed in the cleanup stage.

use crate::components::*;
use crate::events::ShieldChangedEvent;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;
use log::debug;

pub fn status_tick_system(
    dt: Res<DeltaTime>,
    mut buffs: Query<&mut Buffs>,
    mut invincible: Query<&mut Invincibility>,
    mut slowed: Query<&mut Slowed>,
) {
    let delta = dt.0;
    for mut buffs in buffs.iter_mut() {
        for buff in buffs.active.iter_mut() {
            buff.remaining -= delta;
        }
    }
    for mut inv in invincible.iter_mut() {
        if inv.remaining > 0.0 {
            inv.remaining = (inv.remaining - delta).max(0.0);
        }
    }
    for mut slow in slowed.iter_mut() {
        slow.remaining -= delta;
    }
}

/// Drop expired buffs and statuses. A shield that times out with charges
/// left reports zero charges.
pub fn status_expiry_system(
    mut commands: Commands,
    mut buffs: Query<(Entity, &mut Buffs)>,
    slowed: Query<(Entity, &Slowed)>,
    burning: Query<(Entity, &Burning)>,
    mut shield_out: EventWriter<ShieldChangedEvent>,
) {
    for (entity, mut buffs) in buffs.iter_mut() {
        if buffs.active.iter().all(|b| b.remaining > 0.0) {
            continue;
        }
        for expired in buffs.active.iter().filter(|b| b.remaining <= 0.0) {
            debug!("{:?} expired on {entity:?}", expired.kind);
            if expired.kind == BuffKind::Shield && expired.charges > 0 {
                shield_out.send(ShieldChangedEvent {
                    player: entity,
                    charges: 0,
                });
            }
        }
        buffs.active.retain(|b| b.remaining > 0.0);
    }
    for (entity, slow) in slowed.iter() {
        if slow.remaining <= 0.0 {
            commands.entity(entity).remove::<Slowed>();
        }
    }
    for (entity, burn) in burning.iter() {
        if burn.remaining <= 0.0 {
            commands.entity(entity).remove::<Burning>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::register_events;
    use bevy_ecs::event::Events;

    #[test]
    fn test_buffs_expire_at_end_of_tick() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(4.0));
        register_events(&mut world);
        let mut buffs = Buffs::default();
        buffs.grant(BuffKind::Shield);
        buffs.grant(BuffKind::RapidFire);
        let e = world.spawn((buffs, Slowed { factor: 0.5, remaining: 2.0 })).id();

        let mut schedule = Schedule::default();
        schedule.add_systems((status_tick_system, status_expiry_system).chain());
        schedule.run(&mut world);
        // RapidFire (8s) and Shield (15s) still running, slow gone.
        assert_eq!(world.get::<Buffs>(e).unwrap().active.len(), 2);
        assert!(world.get::<Slowed>(e).is_none());

        schedule.run(&mut world);
        assert!(!world.get::<Buffs>(e).unwrap().has(BuffKind::RapidFire));
        schedule.run(&mut world);
        schedule.run(&mut world);
        assert!(world.get::<Buffs>(e).unwrap().active.is_empty());

        let shields: Vec<_> = world.resource_mut::<Events<ShieldChangedEvent>>().drain().collect();
        assert_eq!(shields, vec![ShieldChangedEvent { player: e, charges: 0 }]);
    }
}
