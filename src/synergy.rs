//! Weapon synergy engine.
//!
//! Synergies are emergent effects that fire when two specific weapons are
//! equipped together and one of them produces a matching combat event. The rule
//! table is static data keyed by a canonical (sorted) weapon pair, and
//! [`SynergyTable::evaluate`] is a pure function of the equipped set and the
//! event: the same inputs always produce the same ordered effect list.

use crate::config::ConfigError;
use crate::weapon::WeaponType;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Unordered weapon pair, stored with the smaller weapon first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeaponPair(WeaponType, WeaponType);

impl WeaponPair {
    pub fn new(a: WeaponType, b: WeaponType) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn first(&self) -> WeaponType {
        self.0
    }

    pub fn second(&self) -> WeaponType {
        self.1
    }

    pub fn contains(&self, weapon: WeaponType) -> bool {
        self.0 == weapon || self.1 == weapon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynergyType {
    BlazingStar,
    StormBlade,
    FrostRicochet,
    Firestorm,
    CryoBeam,
    ArcLance,
    IncendiaryRounds,
    ThunderSeeker,
    Barrage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    /// Damage over time on the targets; value = damage per second.
    Burn,
    /// Instant arc damage to nearby enemies; value = damage per target.
    Chain,
    /// Movement slow on the targets; value = speed factor.
    Slow,
    /// Bullet-damping field at the position; value = radius.
    SlowField,
    /// Expanding ring at the position; value = damage.
    Shockwave,
    /// Delayed strike at the position; value = damage.
    Meteor,
}

/// What kind of combat moment produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    Hit,
    Bounce,
    Kill,
}

/// Who receives a rule's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Targeting {
    /// The enemy struck by the triggering bullet.
    Struck,
    /// Up to n candidates closest to the event position, excluding the struck enemy.
    Nearest(usize),
    /// No entity; the effect is placed at the event position.
    Position,
}

/// One row of the synergy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyRule {
    pub synergy: SynergyType,
    pub pair: WeaponPair,
    /// Which of the two weapons must produce the event.
    pub weapon: WeaponType,
    /// Event kinds that trigger the rule.
    pub on: Vec<TriggerKind>,
    /// Only fire for bullets that already bounced.
    #[serde(default)]
    pub requires_bounce: bool,
    pub effect: EffectType,
    pub value: f32,
    pub targeting: Targeting,
}

impl SynergyRule {
    fn matches(&self, event: &SynergyEvent) -> bool {
        if event.weapon != self.weapon || !self.on.contains(&event.kind) {
            return false;
        }
        if self.requires_bounce && !event.bounced {
            return false;
        }
        match self.targeting {
            Targeting::Struck => event.target.is_some(),
            Targeting::Nearest(_) | Targeting::Position => true,
        }
    }

    fn apply(&self, event: &SynergyEvent) -> Option<SynergyEffect> {
        let targets = match self.targeting {
            Targeting::Struck => event.target.into_iter().collect(),
            Targeting::Position => Vec::new(),
            Targeting::Nearest(n) => {
                let mut candidates: Vec<(Entity, f32)> = event
                    .candidates
                    .iter()
                    .copied()
                    .filter(|(e, _)| Some(*e) != event.target)
                    .collect();
                candidates.sort_by(|a, b| {
                    a.1.partial_cmp(&b.1)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.0.cmp(&b.0))
                });
                candidates.dedup_by_key(|(e, _)| *e);
                let targets: Vec<Entity> = candidates.into_iter().take(n).map(|(e, _)| e).collect();
                if targets.is_empty() {
                    return None;
                }
                targets
            }
        };
        Some(SynergyEffect {
            synergy: self.synergy,
            effect: self.effect,
            value: self.value,
            targets,
            x: event.x,
            y: event.y,
        })
    }
}

/// A triggering combat event as seen by the synergy engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SynergyEvent {
    pub weapon: WeaponType,
    pub kind: TriggerKind,
    pub x: f32,
    pub y: f32,
    /// Enemy struck by the bullet, absent for bounces.
    pub target: Option<Entity>,
    /// Enemies in range with their distance to the event position.
    pub candidates: Vec<(Entity, f32)>,
    pub player: Option<Entity>,
    /// The bullet bounced at least once before this event.
    pub bounced: bool,
}

impl SynergyEvent {
    pub fn new(weapon: WeaponType, kind: TriggerKind, x: f32, y: f32) -> Self {
        Self {
            weapon,
            kind,
            x,
            y,
            target: None,
            candidates: Vec::new(),
            player: None,
            bounced: false,
        }
    }
}

/// An emergent effect produced by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyEffect {
    pub synergy: SynergyType,
    pub effect: EffectType,
    pub value: f32,
    #[serde(skip)]
    pub targets: Vec<Entity>,
    pub x: f32,
    pub y: f32,
}

/// Rule table keyed by canonical weapon pair.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SynergyRule>", into = "Vec<SynergyRule>")]
pub struct SynergyTable {
    rules: HashMap<WeaponPair, Vec<SynergyRule>>,
}

impl Default for SynergyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SynergyTable {
    /// Build a table, canonicalizing pairs and rejecting malformed or duplicate rules.
    pub fn from_rules(rules: Vec<SynergyRule>) -> Result<Self, ConfigError> {
        let mut table: HashMap<WeaponPair, Vec<SynergyRule>> = HashMap::new();
        let mut seen = Vec::new();
        for mut rule in rules {
            rule.pair = WeaponPair::new(rule.pair.first(), rule.pair.second());
            if rule.pair.first() == rule.pair.second() {
                return Err(ConfigError::Invalid(format!("{:?} pairs a weapon with itself", rule.synergy)));
            }
            if !rule.pair.contains(rule.weapon) {
                return Err(ConfigError::Invalid(format!(
                    "{:?} triggers on {} which is not part of its pair",
                    rule.synergy,
                    rule.weapon.name()
                )));
            }
            if rule.on.is_empty() || !rule.value.is_finite() {
                return Err(ConfigError::Invalid(format!("{:?} has no trigger or a bad value", rule.synergy)));
            }
            if seen.contains(&rule.synergy) {
                return Err(ConfigError::Invalid(format!("{:?} is defined twice", rule.synergy)));
            }
            seen.push(rule.synergy);
            table.entry(rule.pair).or_default().push(rule);
        }
        Ok(Self { rules: table })
    }

    pub fn builtin() -> Self {
        use EffectType as E;
        use Targeting as T;
        use TriggerKind as K;
        use WeaponType as W;

        #[allow(clippy::too_many_arguments)]
        fn rule(
            synergy: SynergyType,
            a: WeaponType,
            b: WeaponType,
            weapon: WeaponType,
            on: &[TriggerKind],
            requires_bounce: bool,
            effect: EffectType,
            value: f32,
            targeting: Targeting,
        ) -> SynergyRule {
            SynergyRule {
                synergy,
                pair: WeaponPair::new(a, b),
                weapon,
                on: on.to_vec(),
                requires_bounce,
                effect,
                value,
                targeting,
            }
        }

        let rules = vec![
            rule(SynergyType::BlazingStar, W::Magma, W::Shuriken, W::Shuriken, &[K::Hit], false, E::Burn, 5.0, T::Struck),
            rule(SynergyType::StormBlade, W::Tesla, W::Shuriken, W::Shuriken, &[K::Hit, K::Kill], true, E::Chain, 8.0, T::Nearest(3)),
            rule(SynergyType::FrostRicochet, W::Frost, W::Shuriken, W::Shuriken, &[K::Bounce], false, E::SlowField, 60.0, T::Position),
            rule(SynergyType::Firestorm, W::Magma, W::Missile, W::Missile, &[K::Kill], false, E::Shockwave, 20.0, T::Position),
            rule(SynergyType::CryoBeam, W::Frost, W::Laser, W::Laser, &[K::Hit], false, E::Slow, 0.5, T::Struck),
            rule(SynergyType::ArcLance, W::Tesla, W::Laser, W::Laser, &[K::Kill], false, E::Chain, 12.0, T::Nearest(2)),
            rule(SynergyType::IncendiaryRounds, W::Magma, W::Vulcan, W::Vulcan, &[K::Hit], false, E::Burn, 2.0, T::Struck),
            rule(SynergyType::ThunderSeeker, W::Tesla, W::Missile, W::Missile, &[K::Hit], false, E::Chain, 6.0, T::Nearest(2)),
            rule(SynergyType::Barrage, W::Missile, W::Vulcan, W::Vulcan, &[K::Kill], false, E::Meteor, 30.0, T::Position),
        ];

        Self::from_rules(rules).unwrap_or_else(|e| {
            log::error!("built-in synergy table rejected: {e}");
            Self { rules: HashMap::new() }
        })
    }

    pub fn rules_for(&self, a: WeaponType, b: WeaponType) -> &[SynergyRule] {
        self.rules
            .get(&WeaponPair::new(a, b))
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate every rule whose pair is contained in `equipped` against `event`.
    ///
    /// Pairs are visited in ascending order and rules in table order, so the
    /// result is deterministic.
    pub fn evaluate(&self, equipped: &BTreeSet<WeaponType>, event: &SynergyEvent) -> Vec<SynergyEffect> {
        let weapons: Vec<WeaponType> = equipped.iter().copied().collect();
        let mut effects = Vec::new();
        for (i, &a) in weapons.iter().enumerate() {
            for &b in &weapons[i + 1..] {
                for rule in self.rules_for(a, b) {
                    if rule.matches(event) {
                        if let Some(effect) = rule.apply(event) {
                            effects.push(effect);
                        }
                    }
                }
            }
        }
        effects
    }
}

impl TryFrom<Vec<SynergyRule>> for SynergyTable {
    type Error = ConfigError;

    fn try_from(rules: Vec<SynergyRule>) -> Result<Self, Self::Error> {
        Self::from_rules(rules)
    }
}

impl From<SynergyTable> for Vec<SynergyRule> {
    fn from(table: SynergyTable) -> Self {
        let mut pairs: Vec<_> = table.rules.into_iter().collect();
        pairs.sort_by_key(|(pair, _)| *pair);
        pairs.into_iter().flat_map(|(_, rules)| rules).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equipped(weapons: &[WeaponType]) -> BTreeSet<WeaponType> {
        weapons.iter().copied().collect()
    }

    fn shuriken_hit(bounced: bool) -> SynergyEvent {
        SynergyEvent {
            target: Some(Entity::from_raw(10)),
            candidates: vec![
                (Entity::from_raw(10), 0.0),
                (Entity::from_raw(12), 40.0),
                (Entity::from_raw(11), 20.0),
                (Entity::from_raw(13), 40.0),
                (Entity::from_raw(14), 90.0),
            ],
            bounced,
            ..SynergyEvent::new(WeaponType::Shuriken, TriggerKind::Hit, 100.0, 50.0)
        }
    }

    #[test]
    fn test_pair_is_canonical() {
        assert_eq!(
            WeaponPair::new(WeaponType::Shuriken, WeaponType::Magma),
            WeaponPair::new(WeaponType::Magma, WeaponType::Shuriken)
        );
        let table = SynergyTable::builtin();
        assert_eq!(
            table.rules_for(WeaponType::Shuriken, WeaponType::Magma),
            table.rules_for(WeaponType::Magma, WeaponType::Shuriken)
        );
    }

    #[test]
    fn test_magma_shuriken_burns_struck_enemy_without_bounce() {
        let table = SynergyTable::builtin();
        let effects = table.evaluate(&equipped(&[WeaponType::Magma, WeaponType::Shuriken]), &shuriken_hit(false));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].synergy, SynergyType::BlazingStar);
        assert_eq!(effects[0].effect, EffectType::Burn);
        assert_eq!(effects[0].value, 5.0);
        assert_eq!(effects[0].targets, vec![Entity::from_raw(10)]);
    }

    #[test]
    fn test_bounce_requirement() {
        let table = SynergyTable::builtin();
        let set = equipped(&[WeaponType::Tesla, WeaponType::Shuriken]);
        assert!(table.evaluate(&set, &shuriken_hit(false)).is_empty());

        let effects = table.evaluate(&set, &shuriken_hit(true));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].synergy, SynergyType::StormBlade);
        // Nearest three, struck enemy excluded, ties broken by entity id.
        assert_eq!(
            effects[0].targets,
            vec![Entity::from_raw(11), Entity::from_raw(12), Entity::from_raw(13)]
        );
    }

    #[test]
    fn test_multiple_pairs_fire_in_order() {
        let table = SynergyTable::builtin();
        let set = equipped(&[WeaponType::Tesla, WeaponType::Magma, WeaponType::Shuriken]);
        let effects = table.evaluate(&set, &shuriken_hit(true));
        let kinds: Vec<_> = effects.iter().map(|e| e.synergy).collect();
        // Shuriken < Magma < Tesla in weapon order.
        assert_eq!(kinds, vec![SynergyType::BlazingStar, SynergyType::StormBlade]);
    }

    #[test]
    fn test_evaluation_is_deterministic_and_unlatched() {
        let table = SynergyTable::builtin();
        let mut set = equipped(&[WeaponType::Magma, WeaponType::Shuriken, WeaponType::Vulcan]);
        let event = shuriken_hit(false);

        let first = table.evaluate(&set, &event);
        let second = table.evaluate(&set, &event);
        assert_eq!(first, second);
        assert!(!first.is_empty());

        set.remove(&WeaponType::Magma);
        assert!(table.evaluate(&set, &event).is_empty());
    }

    #[test]
    fn test_wrong_trigger_kind_does_not_fire() {
        let table = SynergyTable::builtin();
        let set = equipped(&[WeaponType::Magma, WeaponType::Missile]);
        let hit = SynergyEvent::new(WeaponType::Missile, TriggerKind::Hit, 0.0, 0.0);
        assert!(table.evaluate(&set, &hit).is_empty());

        let kill = SynergyEvent::new(WeaponType::Missile, TriggerKind::Kill, 0.0, 0.0);
        let effects = table.evaluate(&set, &kill);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect, EffectType::Shockwave);
        assert!(effects[0].targets.is_empty());
    }

    #[test]
    fn test_nearest_without_candidates_produces_nothing() {
        let table = SynergyTable::builtin();
        let set = equipped(&[WeaponType::Tesla, WeaponType::Missile]);
        let event = SynergyEvent {
            target: Some(Entity::from_raw(3)),
            candidates: vec![(Entity::from_raw(3), 0.0)],
            ..SynergyEvent::new(WeaponType::Missile, TriggerKind::Hit, 0.0, 0.0)
        };
        assert!(table.evaluate(&set, &event).is_empty());
    }

    #[test]
    fn test_from_rules_rejects_bad_rules() {
        let mut rules: Vec<SynergyRule> = SynergyTable::builtin().into();
        let mut dup = rules[0].clone();
        dup.pair = WeaponPair::new(dup.pair.second(), dup.pair.first());
        rules.push(dup);
        assert!(SynergyTable::from_rules(rules).is_err());

        let foreign = SynergyRule {
            synergy: SynergyType::CryoBeam,
            pair: WeaponPair::new(WeaponType::Frost, WeaponType::Laser),
            weapon: WeaponType::Vulcan,
            on: vec![TriggerKind::Hit],
            requires_bounce: false,
            effect: EffectType::Slow,
            value: 0.5,
            targeting: Targeting::Struck,
        };
        assert!(SynergyTable::from_rules(vec![foreign]).is_err());
    }

    #[test]
    fn test_table_json_roundtrip_keeps_rules() {
        let table = SynergyTable::builtin();
        let json = serde_json::to_string(&table).unwrap();
        let restored: SynergyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
        assert_eq!(restored.len(), 9);
    }
}
