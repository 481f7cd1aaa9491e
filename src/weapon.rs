//! Weapon types, per-level growth tables and the player's armory.
//!
//! Growth tables are static data handed to the engine at construction; systems
//! only ever read them.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Highest level a weapon can be upgraded to.
pub const MAX_WEAPON_LEVEL: u8 = 5;

/// Weapon families the player can equip.
///
/// The derived ordering is used to canonicalize weapon pairs for the synergy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    /// Fast spread gun.
    Vulcan,
    /// Penetrating beam segment, loses damage with every target it passes.
    Laser,
    /// Homing missile with a limited fuel timer.
    Missile,
    /// Spinning blade that bounces off the side walls and the ceiling.
    Shuriken,
    /// Slow, heavy blob.
    Magma,
    /// Fast electric needle.
    Tesla,
    /// Medium-speed ice shard.
    Frost,
}

impl WeaponType {
    pub const ALL: [WeaponType; 7] = [
        WeaponType::Vulcan,
        WeaponType::Laser,
        WeaponType::Missile,
        WeaponType::Shuriken,
        WeaponType::Magma,
        WeaponType::Tesla,
        WeaponType::Frost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeaponType::Vulcan => "Vulcan",
            WeaponType::Laser => "Laser",
            WeaponType::Missile => "Missile",
            WeaponType::Shuriken => "Shuriken",
            WeaponType::Magma => "Magma",
            WeaponType::Tesla => "Tesla",
            WeaponType::Frost => "Frost",
        }
    }
}

/// Stats of one weapon at one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponLevelStats {
    /// Damage per bullet.
    pub damage: f32,
    /// Seconds between volleys.
    pub fire_interval: f32,
    /// Bullet speed in pixels per reference frame.
    pub bullet_speed: f32,
    /// Bullets per volley.
    pub projectiles: u32,
}

impl WeaponLevelStats {
    pub const fn new(damage: f32, fire_interval: f32, bullet_speed: f32, projectiles: u32) -> Self {
        Self {
            damage,
            fire_interval,
            bullet_speed,
            projectiles,
        }
    }
}

/// Per-weapon growth table indexed by level (level 1 = index 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponGrowth {
    pub levels: HashMap<WeaponType, Vec<WeaponLevelStats>>,
}

impl Default for WeaponGrowth {
    fn default() -> Self {
        use WeaponLevelStats as S;
        let mut levels = HashMap::new();
        levels.insert(
            WeaponType::Vulcan,
            vec![
                S::new(4.0, 0.12, 12.0, 1),
                S::new(4.0, 0.11, 12.0, 2),
                S::new(5.0, 0.10, 13.0, 3),
                S::new(5.0, 0.09, 13.0, 4),
                S::new(6.0, 0.08, 14.0, 5),
            ],
        );
        levels.insert(
            WeaponType::Laser,
            vec![
                S::new(10.0, 0.30, 16.0, 1),
                S::new(13.0, 0.28, 16.0, 1),
                S::new(16.0, 0.26, 17.0, 1),
                S::new(20.0, 0.24, 17.0, 2),
                S::new(24.0, 0.22, 18.0, 2),
            ],
        );
        levels.insert(
            WeaponType::Missile,
            vec![
                S::new(14.0, 0.80, 6.0, 1),
                S::new(16.0, 0.75, 6.5, 1),
                S::new(18.0, 0.70, 7.0, 2),
                S::new(20.0, 0.65, 7.5, 2),
                S::new(24.0, 0.60, 8.0, 3),
            ],
        );
        levels.insert(
            WeaponType::Shuriken,
            vec![
                S::new(8.0, 0.50, 8.0, 1),
                S::new(9.0, 0.46, 8.5, 1),
                S::new(10.0, 0.42, 9.0, 2),
                S::new(12.0, 0.38, 9.5, 2),
                S::new(14.0, 0.34, 10.0, 3),
            ],
        );
        levels.insert(
            WeaponType::Magma,
            vec![
                S::new(18.0, 0.90, 5.0, 1),
                S::new(22.0, 0.85, 5.0, 1),
                S::new(26.0, 0.80, 5.5, 1),
                S::new(30.0, 0.75, 5.5, 2),
                S::new(36.0, 0.70, 6.0, 2),
            ],
        );
        levels.insert(
            WeaponType::Tesla,
            vec![
                S::new(5.0, 0.20, 18.0, 1),
                S::new(6.0, 0.18, 18.0, 1),
                S::new(7.0, 0.16, 19.0, 2),
                S::new(8.0, 0.15, 19.0, 2),
                S::new(9.0, 0.14, 20.0, 3),
            ],
        );
        levels.insert(
            WeaponType::Frost,
            vec![
                S::new(7.0, 0.35, 10.0, 1),
                S::new(8.0, 0.33, 10.0, 1),
                S::new(9.0, 0.31, 11.0, 2),
                S::new(10.0, 0.29, 11.0, 2),
                S::new(12.0, 0.27, 12.0, 3),
            ],
        );
        Self { levels }
    }
}

impl WeaponGrowth {
    /// Stats for a weapon at a level. Levels outside the table clamp to its ends.
    pub fn stats(&self, weapon: WeaponType, level: u8) -> Option<WeaponLevelStats> {
        let table = self.levels.get(&weapon)?;
        if table.is_empty() {
            return None;
        }
        let index = (level.max(1) as usize - 1).min(table.len() - 1);
        Some(table[index])
    }

    /// Checks every table entry for usable values.
    pub fn validate(&self) -> Result<(), String> {
        for (weapon, table) in &self.levels {
            if table.is_empty() {
                return Err(format!("{} has an empty growth table", weapon.name()));
            }
            for (i, s) in table.iter().enumerate() {
                let finite = s.damage.is_finite() && s.fire_interval.is_finite() && s.bullet_speed.is_finite();
                if !finite || s.damage < 0.0 || s.fire_interval <= 0.0 || s.bullet_speed <= 0.0 {
                    return Err(format!("{} level {} has invalid stats", weapon.name(), i + 1));
                }
            }
        }
        Ok(())
    }
}

/// Weapons the player has equipped, with their levels.
///
/// The key set is the "equipped set" the synergy engine evaluates against.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Armory {
    pub weapons: BTreeMap<WeaponType, u8>,
}

impl Armory {
    pub fn with_weapon(weapon: WeaponType) -> Self {
        let mut armory = Self::default();
        armory.equip(weapon);
        armory
    }

    /// Equip a weapon at level 1, or upgrade it if already equipped.
    /// Returns the resulting level.
    pub fn equip(&mut self, weapon: WeaponType) -> u8 {
        let level = self.weapons.entry(weapon).or_insert(0);
        *level = (*level + 1).min(MAX_WEAPON_LEVEL);
        *level
    }

    pub fn unequip(&mut self, weapon: WeaponType) -> bool {
        self.weapons.remove(&weapon).is_some()
    }

    pub fn level(&self, weapon: WeaponType) -> Option<u8> {
        self.weapons.get(&weapon).copied()
    }

    pub fn equipped_set(&self) -> BTreeSet<WeaponType> {
        self.weapons.keys().copied().collect()
    }
}

/// Trigger state and per-weapon cooldowns of a firing entity.
#[derive(Component, Debug, Clone, Default)]
pub struct FireControl {
    /// Set by the input collaborator; weapons fire while held.
    pub firing: bool,
    pub cooldowns: BTreeMap<WeaponType, f32>,
}

impl FireControl {
    /// Advance the cooldown of `weapon`; returns true when a volley is due
    /// and rearms it with `interval`.
    pub fn ready(&mut self, weapon: WeaponType, dt: f32, interval: f32) -> bool {
        let cooldown = self.cooldowns.entry(weapon).or_insert(0.0);
        *cooldown -= dt;
        if *cooldown <= 0.0 {
            *cooldown = interval;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_clamps_levels() {
        let growth = WeaponGrowth::default();
        let first = growth.stats(WeaponType::Vulcan, 0).unwrap();
        let last = growth.stats(WeaponType::Vulcan, 99).unwrap();
        assert_eq!(first, growth.stats(WeaponType::Vulcan, 1).unwrap());
        assert_eq!(last, growth.stats(WeaponType::Vulcan, MAX_WEAPON_LEVEL).unwrap());
        assert!(growth.validate().is_ok());
    }

    #[test]
    fn test_armory_equip_levels_up() {
        let mut armory = Armory::with_weapon(WeaponType::Laser);
        assert_eq!(armory.level(WeaponType::Laser), Some(1));
        for _ in 0..10 {
            armory.equip(WeaponType::Laser);
        }
        assert_eq!(armory.level(WeaponType::Laser), Some(MAX_WEAPON_LEVEL));

        armory.equip(WeaponType::Magma);
        let set: Vec<_> = armory.equipped_set().into_iter().collect();
        assert_eq!(set, vec![WeaponType::Laser, WeaponType::Magma]);

        assert!(armory.unequip(WeaponType::Laser));
        assert!(!armory.unequip(WeaponType::Laser));
    }

    #[test]
    fn test_fire_control_cooldown() {
        let mut fire = FireControl::default();
        assert!(fire.ready(WeaponType::Vulcan, 0.016, 0.1));
        assert!(!fire.ready(WeaponType::Vulcan, 0.05, 0.1));
        assert!(fire.ready(WeaponType::Vulcan, 0.06, 0.1));
    }
}
