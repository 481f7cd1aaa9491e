//! Engine configuration and static game data.
//!
//! Both are plain serde structures loaded once at initialization (JSON) and
//! inserted as resources. Systems only read them.

use crate::boss::BossRegistry;
use crate::components::EnemyArchetype;
use crate::synergy::SynergyTable;
use crate::weapon::WeaponGrowth;
use bevy_ecs::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Value out of range or inconsistent table
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tuning knobs of the simulation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Playfield width in pixels.
    pub width: f32,
    /// Playfield height in pixels.
    pub height: f32,
    /// Largest delta a single tick integrates, in milliseconds.
    pub max_delta_ms: f32,
    /// Velocity factor applied per slow field per tick.
    pub slow_field_damping: f32,
    /// Distance outside the screen before a missile self-destructs.
    pub missile_bounds_margin: f32,
    /// Distance outside the screen before other projectiles and pickups are culled.
    pub offscreen_margin: f32,
    /// Seconds of fuel a missile starts with.
    pub missile_fuel: f32,
    /// Steering added per tick by homing missiles.
    pub missile_turn_rate: f32,
    /// Seconds of invulnerability after the player is hit.
    pub player_invincibility: f32,
    /// Contact damage dealt by enemies touching the player.
    pub contact_damage: f32,
    /// Seconds a kill keeps the combo chain alive.
    pub combo_window: f32,
    /// Upper bound of the combo score multiplier.
    pub combo_max_multiplier: f32,
    /// Spawn credits earned per second at difficulty 1.
    pub credit_rate: f32,
    /// Difficulty gained per second of play.
    pub difficulty_growth: f32,
    /// Seconds per level; a boss arrives on every level-up.
    pub level_duration: f32,
    /// Chance for a killed enemy to drop a powerup.
    pub loot_chance: f64,
    /// Radius in which synergy candidates are gathered.
    pub synergy_range: f32,
    /// Seed of the deterministic spawn/loot RNG.
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 720.0,
            max_delta_ms: 50.0,
            slow_field_damping: 0.75,
            missile_bounds_margin: 64.0,
            offscreen_margin: 32.0,
            missile_fuel: 3.0,
            missile_turn_rate: 0.6,
            player_invincibility: 1.0,
            contact_damage: 15.0,
            combo_window: 2.0,
            combo_max_multiplier: 5.0,
            credit_rate: 1.5,
            difficulty_growth: 0.01,
            level_duration: 90.0,
            loot_chance: 0.12,
            synergy_range: 150.0,
            rng_seed: 0x5eed,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("max_delta_ms", self.max_delta_ms),
            ("combo_window", self.combo_window),
            ("level_duration", self.level_duration),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.slow_field_damping) {
            return Err(ConfigError::Invalid("slow_field_damping must be within 0..=1".into()));
        }
        if !(0.0..=1.0).contains(&self.loot_chance) {
            return Err(ConfigError::Invalid("loot_chance must be within 0..=1".into()));
        }
        if self.combo_max_multiplier < 1.0 {
            return Err(ConfigError::Invalid("combo_max_multiplier must be at least 1".into()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path.as_ref()).and_then(|c: Self| {
            c.validate()?;
            Ok(c)
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Static tables the engine is driven by.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameData {
    pub weapons: WeaponGrowth,
    pub synergies: SynergyTable,
    pub bosses: BossRegistry,
    pub enemies: Vec<EnemyArchetype>,
}

impl Default for GameData {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GameData {
    /// Built-in tables.
    pub fn builtin() -> Self {
        Self {
            weapons: WeaponGrowth::default(),
            synergies: SynergyTable::builtin(),
            bosses: BossRegistry::default(),
            enemies: EnemyArchetype::defaults(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weapons.validate().map_err(ConfigError::Invalid)?;
        self.bosses.validate().map_err(ConfigError::Invalid)?;
        if self.enemies.iter().any(|e| !(e.cost > 0.0) || !(e.max_hp > 0.0)) {
            return Err(ConfigError::Invalid("enemy archetypes need positive cost and hp".into()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path.as_ref()).and_then(|d: Self| {
            d.validate()?;
            Ok(d)
        })
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)?;
    log::debug!("loaded {}", path.display());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(GameData::builtin().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "width": 640.0 }"#).unwrap();
        assert_eq!(config.width, 640.0);
        assert_eq!(config.height, EngineConfig::default().height);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_json(r#"{ "slow_field_damping": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_game_data_roundtrip() {
        let data = GameData::builtin();
        let json = serde_json::to_string(&data).unwrap();
        let restored = GameData::from_json(&json).unwrap();
        assert_eq!(restored.synergies, data.synergies);
        assert_eq!(restored.enemies.len(), data.enemies.len());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
