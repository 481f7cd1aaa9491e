//! ECS Components for the Skyfire simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::weapon::WeaponType;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Position in screen pixels (y grows downward) and facing angle in radians.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

impl Transform {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, rotation: 0.0 }
    }

    pub fn distance_to(&self, other: &Transform) -> f32 {
        self.distance_to_point(other.x, other.y)
    }

    pub fn distance_to_point(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Velocity in pixels per reference frame (1/60 s).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    pub fn magnitude(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag < 0.0001 {
            Self::default()
        } else {
            Self {
                vx: self.vx / mag,
                vy: self.vy / mag,
            }
        }
    }

    pub fn scale(&mut self, factor: f32) {
        self.vx *= factor;
        self.vy *= factor;
    }

    /// Rescale so the magnitude does not exceed `max`.
    pub fn clamp_magnitude(&mut self, max: f32) {
        let mag = self.magnitude();
        if mag > max && mag > 0.0 {
            self.scale(max / mag);
        }
    }

    pub fn heading(&self) -> f32 {
        self.vy.atan2(self.vx)
    }
}

/// How a [`MoveIntent`] is interpreted by the movement system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Unit-ish direction scaled by `SpeedStat::max_linear` and dt.
    Velocity,
    /// Precomputed pixel delta applied verbatim.
    Offset,
    /// Anything else arriving from content data. Consumed as a no-op.
    #[serde(other)]
    Unknown,
}

/// Single-tick movement directive. Removed by the movement system in the tick
/// it was written, whatever its kind.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub dx: f32,
    pub dy: f32,
    pub kind: MoveKind,
}

impl MoveIntent {
    pub fn velocity(dx: f32, dy: f32) -> Self {
        Self { dx, dy, kind: MoveKind::Velocity }
    }

    pub fn offset(dx: f32, dy: f32) -> Self {
        Self { dx, dy, kind: MoveKind::Offset }
    }

    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

/// Speed caps applied when resolving `velocity` intents.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedStat {
    /// Pixels per second.
    pub max_linear: f32,
    /// Radians per second.
    pub max_angular: f32,
}

impl SpeedStat {
    pub fn new(max_linear: f32, max_angular: f32) -> Self {
        Self { max_linear, max_angular }
    }
}

impl Default for SpeedStat {
    fn default() -> Self {
        Self::new(240.0, std::f32::consts::TAU)
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Hit points. `0 <= hp <= max` holds after construction and every mutation.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    hp: f32,
    max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self::with_hp(max, max)
    }

    pub fn with_hp(hp: f32, max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        let mut health = Self { hp: 0.0, max };
        health.set_hp(hp);
        health
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.hp / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn set_hp(&mut self, hp: f32) {
        self.hp = if hp.is_nan() { 0.0 } else { hp.clamp(0.0, self.max) };
    }

    /// Apply damage and return the amount actually removed.
    pub fn damage(&mut self, amount: f32) -> f32 {
        if !(amount > 0.0) {
            return 0.0;
        }
        let before = self.hp;
        self.set_hp(before - amount);
        before - self.hp
    }

    /// Restore hp and return the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !(amount > 0.0) {
            return 0.0;
        }
        let before = self.hp;
        self.set_hp(before + amount);
        self.hp - before
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Collision layer tag deciding which pairs are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionLayer {
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
    Powerup,
}

/// Axis-aligned hitbox centred on the entity's transform.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub half_width: f32,
    pub half_height: f32,
    pub layer: CollisionLayer,
}

impl Collider {
    /// Hitbox from full width/height. Negative or non-finite sizes collapse to a point.
    pub fn new(width: f32, height: f32, layer: CollisionLayer) -> Self {
        let half = |v: f32| if v.is_finite() { (v * 0.5).max(0.0) } else { 0.0 };
        Self {
            half_width: half(width),
            half_height: half(height),
            layer,
        }
    }

    pub fn point(layer: CollisionLayer) -> Self {
        Self::new(0.0, 0.0, layer)
    }

    /// Inclusive box overlap test, so zero-sized boxes behave as points.
    pub fn overlaps(&self, at: &Transform, other: &Collider, other_at: &Transform) -> bool {
        (at.x - other_at.x).abs() <= self.half_width + other.half_width
            && (at.y - other_at.y).abs() <= self.half_height + other.half_height
    }
}

/// Post-hit invulnerability window.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Invincibility {
    pub remaining: f32,
}

impl Invincibility {
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

// ============================================================================
// ROLE COMPONENTS
// ============================================================================

/// Marker for the input-driven fighter. Its position is clamped to the screen.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerControlled;

/// Enemy archetype identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Drone,
    Weaver,
    Hunter,
    Gunship,
    Boss,
}

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    /// Score awarded on kill before the combo multiplier.
    pub score_value: u32,
}

/// Enemy decision behaviour.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyAi {
    /// Fly straight down.
    Straight,
    /// Fly down while swaying horizontally.
    Sine { amplitude: f32, frequency: f32, phase: f32 },
    /// Home in on the player.
    Chase,
}

/// Enemies with this marker sidestep while missiles are locked on them.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Evasive;

/// Number of homing missiles currently locked on this entity.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMissiles(pub u32);

impl IncomingMissiles {
    pub fn lock(&mut self) {
        self.0 += 1;
    }

    pub fn release(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }
}

/// Aimed gun carried by some enemies and bosses.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyGun {
    pub interval: f32,
    pub cooldown: f32,
    pub bullet_speed: f32,
    pub damage: f32,
}

impl EnemyGun {
    pub fn new(interval: f32, bullet_speed: f32, damage: f32) -> Self {
        Self {
            interval,
            cooldown: interval,
            bullet_speed,
            damage,
        }
    }
}

// ============================================================================
// PROJECTILE COMPONENTS
// ============================================================================

/// Player projectile fired by one of the equipped weapons.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub weapon: WeaponType,
    pub damage: f32,
    /// Damage factor per subsequent hit. Values below 1 make the bullet penetrating.
    pub attenuation: f32,
    /// Number of hits already registered.
    pub hit_count: u32,
    /// Bounced off a wall at least once.
    pub bounced: bool,
    #[serde(skip)]
    pub hit_targets: Vec<Entity>,
}

impl Bullet {
    pub fn new(weapon: WeaponType, damage: f32) -> Self {
        Self {
            weapon,
            damage,
            attenuation: 1.0,
            hit_count: 0,
            bounced: false,
            hit_targets: Vec::new(),
        }
    }

    pub fn penetrating(weapon: WeaponType, damage: f32, attenuation: f32) -> Self {
        Self {
            attenuation: attenuation.clamp(0.0, 1.0),
            ..Self::new(weapon, damage)
        }
    }

    pub fn is_penetrating(&self) -> bool {
        self.attenuation < 1.0
    }

    pub fn has_hit(&self, target: Entity) -> bool {
        self.hit_targets.contains(&target)
    }

    /// Damage the next hit would deal: `damage * attenuation^hit_count`.
    pub fn next_damage(&self) -> f32 {
        self.damage * self.attenuation.powi(self.hit_count as i32)
    }

    /// Register a hit on `target` and return the damage it deals.
    pub fn register_hit(&mut self, target: Entity) -> f32 {
        let damage = self.next_damage();
        self.hit_count += 1;
        self.hit_targets.push(target);
        damage
    }
}

/// Projectile fired by enemies at the player.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyBullet {
    pub damage: f32,
}

/// Weak reference to a homing target, resolved by id every tick.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Homing {
    pub target: Option<Entity>,
    /// Steering added per tick toward the target.
    pub turn_rate: f32,
    /// Speed cap in pixels per reference frame.
    pub max_speed: f32,
}

impl Homing {
    pub fn new(target: Option<Entity>, turn_rate: f32, max_speed: f32) -> Self {
        Self { target, turn_rate, max_speed }
    }
}

/// Missile fuel and culling margin.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Missile {
    /// Seconds of fuel left.
    pub fuel: f32,
    /// Distance outside the screen before the missile self-destructs.
    pub bounds_margin: f32,
}

/// Reflects off the side walls and the ceiling.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Bouncing {
    pub bounces: u32,
}

/// Visual spin: rotation accumulates `speed` every tick instead of following velocity.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Spin {
    pub speed: f32,
}

/// Remaining life in seconds.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    pub fn expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

// ============================================================================
// STATUS & ENVIRONMENT COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuffKind {
    /// Halves fire intervals.
    RapidFire,
    /// Multiplies bullet damage by 1.5.
    DamageUp,
    /// Absorbs incoming hits while charges remain.
    Shield,
}

impl BuffKind {
    pub fn default_duration(&self) -> f32 {
        match self {
            BuffKind::RapidFire => 8.0,
            BuffKind::DamageUp => 10.0,
            BuffKind::Shield => 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuff {
    pub kind: BuffKind,
    pub remaining: f32,
    /// Shield hits left. Unused by other kinds.
    pub charges: u32,
}

/// Timed buffs active on an entity.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Buffs {
    pub active: Vec<ActiveBuff>,
}

impl Buffs {
    /// Add a buff or refresh an existing one of the same kind.
    pub fn grant(&mut self, kind: BuffKind) {
        let charges = if kind == BuffKind::Shield { 3 } else { 0 };
        let duration = kind.default_duration();
        match self.active.iter_mut().find(|b| b.kind == kind) {
            Some(buff) => {
                buff.remaining = buff.remaining.max(duration);
                buff.charges = buff.charges.max(charges);
            }
            None => self.active.push(ActiveBuff { kind, remaining: duration, charges }),
        }
    }

    pub fn has(&self, kind: BuffKind) -> bool {
        self.active.iter().any(|b| b.kind == kind && b.remaining > 0.0)
    }

    pub fn fire_interval_factor(&self) -> f32 {
        if self.has(BuffKind::RapidFire) { 0.5 } else { 1.0 }
    }

    pub fn damage_factor(&self) -> f32 {
        if self.has(BuffKind::DamageUp) { 1.5 } else { 1.0 }
    }

    pub fn shield_charges(&self) -> u32 {
        self.active
            .iter()
            .find(|b| b.kind == BuffKind::Shield && b.remaining > 0.0)
            .map(|b| b.charges)
            .unwrap_or(0)
    }

    /// Spend one shield charge. Returns the charges left, or `None` if no shield absorbed the hit.
    pub fn absorb_hit(&mut self) -> Option<u32> {
        let shield = self
            .active
            .iter_mut()
            .find(|b| b.kind == BuffKind::Shield && b.remaining > 0.0 && b.charges > 0)?;
        shield.charges -= 1;
        if shield.charges == 0 {
            shield.remaining = 0.0;
        }
        Some(shield.charges)
    }
}

/// Damage-over-time applied by burn synergies.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Burning {
    pub damage_per_second: f32,
    pub remaining: f32,
}

/// Movement slow applied by frost synergies.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Slowed {
    /// Multiplier applied to movement intents (0..1).
    pub factor: f32,
    pub remaining: f32,
}

/// Area that damps the velocity of every bullet inside it.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlowField {
    pub radius: f32,
    pub life: f32,
}

/// Expanding ring that damages enemies once and erases enemy bullets.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Shockwave {
    pub radius: f32,
    pub max_radius: f32,
    /// Pixels per second.
    pub growth: f32,
    pub damage: f32,
    pub life: f32,
    #[serde(skip)]
    pub hit: Vec<Entity>,
}

/// Delayed area strike.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Meteor {
    /// Seconds until impact.
    pub delay: f32,
    pub radius: f32,
    pub damage: f32,
    pub life: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Equip the weapon, or level it up if already equipped.
    Weapon(WeaponType),
    Buff(BuffKind),
    Heal(f32),
}

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Powerup {
    pub kind: PowerupKind,
}

/// Flag for deferred removal. Purged by the cleanup pass at tick end.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MarkedForDeletion;

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning the player fighter.
#[derive(Bundle)]
pub struct PlayerBundle {
    pub marker: PlayerControlled,
    pub transform: Transform,
    pub speed: SpeedStat,
    pub health: Health,
    pub collider: Collider,
    pub armory: crate::weapon::Armory,
    pub fire: crate::weapon::FireControl,
    pub buffs: Buffs,
    pub invincibility: Invincibility,
}

impl PlayerBundle {
    pub fn new(x: f32, y: f32, starting_weapon: WeaponType) -> Self {
        Self {
            marker: PlayerControlled,
            transform: Transform { x, y, rotation: -std::f32::consts::FRAC_PI_2 },
            speed: SpeedStat::new(260.0, std::f32::consts::TAU),
            health: Health::new(100.0),
            collider: Collider::new(16.0, 20.0, CollisionLayer::Player),
            armory: crate::weapon::Armory::with_weapon(starting_weapon),
            fire: crate::weapon::FireControl::default(),
            buffs: Buffs::default(),
            invincibility: Invincibility::default(),
        }
    }
}

/// Static description of an enemy type, bought by the spawn director.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    pub kind: EnemyKind,
    pub cost: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub size: f32,
    pub score_value: u32,
    pub ai: EnemyAi,
    pub evasive: bool,
    /// `(interval, bullet_speed, damage)` of an aimed gun, if any.
    pub gun: Option<(f32, f32, f32)>,
    /// Difficulty needed before the director buys this archetype.
    pub min_difficulty: f32,
}

impl EnemyArchetype {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                kind: EnemyKind::Drone,
                cost: 1.0,
                max_hp: 12.0,
                speed: 90.0,
                size: 24.0,
                score_value: 10,
                ai: EnemyAi::Straight,
                evasive: false,
                gun: None,
                min_difficulty: 0.0,
            },
            Self {
                kind: EnemyKind::Weaver,
                cost: 2.0,
                max_hp: 20.0,
                speed: 80.0,
                size: 26.0,
                score_value: 25,
                ai: EnemyAi::Sine { amplitude: 1.0, frequency: 2.0, phase: 0.0 },
                evasive: true,
                gun: None,
                min_difficulty: 1.2,
            },
            Self {
                kind: EnemyKind::Hunter,
                cost: 3.0,
                max_hp: 30.0,
                speed: 110.0,
                size: 28.0,
                score_value: 40,
                ai: EnemyAi::Chase,
                evasive: true,
                gun: None,
                min_difficulty: 1.8,
            },
            Self {
                kind: EnemyKind::Gunship,
                cost: 5.0,
                max_hp: 60.0,
                speed: 50.0,
                size: 40.0,
                score_value: 80,
                ai: EnemyAi::Straight,
                evasive: false,
                gun: Some((1.6, 4.0, 10.0)),
                min_difficulty: 2.5,
            },
        ]
    }
}

/// Bundle for spawning a regular enemy.
#[derive(Bundle)]
pub struct EnemyBundle {
    pub enemy: Enemy,
    pub ai: EnemyAi,
    pub transform: Transform,
    pub speed: SpeedStat,
    pub health: Health,
    pub collider: Collider,
    pub incoming: IncomingMissiles,
}

impl EnemyBundle {
    pub fn new(archetype: &EnemyArchetype, x: f32, y: f32) -> Self {
        Self {
            enemy: Enemy {
                kind: archetype.kind,
                score_value: archetype.score_value,
            },
            ai: archetype.ai,
            transform: Transform { x, y, rotation: std::f32::consts::FRAC_PI_2 },
            speed: SpeedStat::new(archetype.speed, std::f32::consts::PI),
            health: Health::new(archetype.max_hp),
            collider: Collider::new(archetype.size, archetype.size, CollisionLayer::Enemy),
            incoming: IncomingMissiles::default(),
        }
    }
}

/// Bundle for a player projectile.
#[derive(Bundle)]
pub struct BulletBundle {
    pub bullet: Bullet,
    pub transform: Transform,
    pub velocity: Velocity,
    pub collider: Collider,
    pub lifetime: Lifetime,
}

impl BulletBundle {
    pub fn new(bullet: Bullet, x: f32, y: f32, velocity: Velocity, size: f32) -> Self {
        Self {
            bullet,
            transform: Transform { x, y, rotation: velocity.heading() },
            velocity,
            collider: Collider::new(size, size, CollisionLayer::PlayerBullet),
            lifetime: Lifetime::new(4.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_health_clamped_on_construction() {
        assert_eq!(Health::with_hp(150.0, 100.0).hp(), 100.0);
        assert_eq!(Health::with_hp(-5.0, 100.0).hp(), 0.0);
        assert_eq!(Health::with_hp(f32::NAN, 100.0).hp(), 0.0);
        assert_eq!(Health::with_hp(10.0, -3.0).max(), 0.0);
    }

    #[test]
    fn test_health_invariant_random_sequences() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let max = rng.gen_range(1.0..500.0);
            let mut health = Health::new(max);
            for _ in 0..100 {
                let amount: f32 = rng.gen_range(-200.0..600.0);
                match rng.gen_range(0..3) {
                    0 => {
                        health.damage(amount);
                    }
                    1 => {
                        health.heal(amount);
                    }
                    _ => health.set_hp(amount),
                }
                assert!(health.hp() >= 0.0 && health.hp() <= health.max());
            }
        }
    }

    #[test]
    fn test_damage_reports_amount_removed() {
        let mut health = Health::new(10.0);
        assert_eq!(health.damage(4.0), 4.0);
        assert_eq!(health.damage(100.0), 6.0);
        assert!(!health.is_alive());
        assert_eq!(health.damage(-3.0), 0.0);
    }

    #[test]
    fn test_collider_zero_size_is_point() {
        let point = Collider::point(CollisionLayer::PlayerBullet);
        let box_ = Collider::new(10.0, 10.0, CollisionLayer::Enemy);
        let origin = Transform::new(0.0, 0.0);
        assert!(point.overlaps(&Transform::new(5.0, -5.0), &box_, &origin));
        assert!(!point.overlaps(&Transform::new(5.1, 0.0), &box_, &origin));
        assert!(point.overlaps(&origin, &point, &origin));
        assert!(Collider::new(f32::NAN, -4.0, CollisionLayer::Enemy).half_width == 0.0);
    }

    #[test]
    fn test_penetrating_bullet_attenuates() {
        let mut bullet = Bullet::penetrating(WeaponType::Laser, 20.0, 0.5);
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        assert!(bullet.is_penetrating());
        assert_eq!(bullet.register_hit(a), 20.0);
        assert_eq!(bullet.register_hit(b), 10.0);
        assert!(bullet.has_hit(a) && bullet.has_hit(b));
        assert!(!Bullet::new(WeaponType::Vulcan, 4.0).is_penetrating());
    }

    #[test]
    fn test_shield_absorbs_until_empty() {
        let mut buffs = Buffs::default();
        buffs.grant(BuffKind::Shield);
        assert_eq!(buffs.absorb_hit(), Some(2));
        assert_eq!(buffs.absorb_hit(), Some(1));
        assert_eq!(buffs.absorb_hit(), Some(0));
        assert_eq!(buffs.absorb_hit(), None);
        assert_eq!(buffs.shield_charges(), 0);
    }

    #[test]
    fn test_move_kind_unknown_from_data() {
        let intent: MoveIntent = serde_json::from_str(r#"{"dx":1.0,"dy":0.0,"kind":"teleport"}"#).unwrap();
        assert_eq!(intent.kind, MoveKind::Unknown);
        let intent: MoveIntent = serde_json::from_str(r#"{"dx":1.0,"dy":0.0,"kind":"offset"}"#).unwrap();
        assert_eq!(intent.kind, MoveKind::Offset);
    }
}
