//! Arena configuration.
//!
//! [`ArenaConfig`] bundles the frame step, the RNG seed, the stage and combat
//! tuning from `catbrawl-world`, and the per-event tuning tables. Every field
//! has a default, so a JSON file only names what it overrides:
//!
//! ```
//! use catbrawl_engine::config::ArenaConfig;
//!
//! let config = ArenaConfig::from_json_str(r#"{ "seed": 9, "duel": { "prepare_secs": 3.0 } }"#).unwrap();
//! assert_eq!(config.seed, 9);
//! assert_eq!(config.duel.prepare_secs, 3.0);
//! assert_eq!(config.duel.fight_secs, 10.0);
//! ```

use std::path::Path;

use catbrawl_world::config::{CombatConfig, StageConfig};
use catbrawl_world::WorldError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for [`ArenaConfig`].
    #[error("failed to parse arena config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config field '{field}': {details}")]
    Invalid { field: &'static str, details: String },

    /// The stage section is invalid.
    #[error(transparent)]
    Stage(#[from] WorldError),
}

// ---------------------------------------------------------------------------
// Event tuning
// ---------------------------------------------------------------------------

/// Duel timing and outcome tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Seconds duelists get to walk to their corners. Also the prediction window.
    pub prepare_secs: f64,
    /// Seconds of fighting before the duel is decided on health.
    pub fight_secs: f64,
    /// Whether the loser and the crowd kiss the winner afterwards.
    pub reconcile: bool,
    /// Reason sent with a cancelled prediction on a draw.
    pub draw_reason: String,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            prepare_secs: 10.0,
            fight_secs: 10.0,
            reconcile: true,
            draw_reason: "Draw!".to_owned(),
        }
    }
}

/// Zombie invasion tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZombieConfig {
    /// Seconds viewers get to place predictions before zombies arrive.
    pub prediction_secs: f64,
    /// Seconds after arrival before zombies start to decay.
    pub fight_secs: f64,
    /// Zombies spawned per living viewer, rounded up, at least one.
    pub zombies_per_player: f64,
    /// Fraction of the stage width at each side that counts as out of bounds.
    pub border_ratio: f64,
    /// Impulse used to shove characters back from the borders.
    pub shove_velocity: f64,
    /// Seconds a zombie chases one victim before looking for another.
    pub hunt_secs: f64,
    /// Range of seconds a defender engages one zombie before re-targeting.
    pub defend_secs: (f64, f64),
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            prediction_secs: 30.0,
            fight_secs: 60.0,
            zombies_per_player: 0.5,
            border_ratio: 0.05,
            shove_velocity: 150.0,
            hunt_secs: 5.0,
            defend_secs: (5.0, 10.0),
        }
    }
}

/// Lightning storm tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StormConfig {
    /// Damage of the single lightning strike.
    pub damage: f64,
    /// Cloud speed as a fraction of stage width per second.
    pub speed_ratio: f64,
    /// Cloud width in pixels.
    pub cloud_width: f64,
    /// Cloud height in pixels.
    pub cloud_height: f64,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            damage: 51.0,
            speed_ratio: 0.2,
            cloud_width: 400.0,
            cloud_height: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ArenaConfig
// ---------------------------------------------------------------------------

/// Complete arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seconds per frame. Must be positive and finite.
    pub fixed_dt: f64,
    /// Seed of the arena's random number generator.
    pub seed: u64,
    /// Stage layout and movement.
    pub stage: StageConfig,
    /// Fist tuning.
    pub combat: CombatConfig,
    /// Duel tuning.
    pub duel: DuelConfig,
    /// Zombie invasion tuning.
    pub zombie: ZombieConfig,
    /// Storm tuning.
    pub storm: StormConfig,
    /// Redemption titles that are acknowledged and otherwise ignored.
    pub ignored_redeems: Vec<String>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            seed: 0,
            stage: StageConfig::default(),
            combat: CombatConfig::default(),
            duel: DuelConfig::default(),
            zombie: ZombieConfig::default(),
            storm: StormConfig::default(),
            ignored_redeems: vec!["order music".to_owned()],
        }
    }
}

impl ArenaConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "fixed_dt",
                details: format!("must be positive and finite, got {}", self.fixed_dt),
            });
        }
        self.stage.validate()?;

        let non_negative = [
            ("duel.prepare_secs", self.duel.prepare_secs),
            ("duel.fight_secs", self.duel.fight_secs),
            ("zombie.prediction_secs", self.zombie.prediction_secs),
            ("zombie.fight_secs", self.zombie.fight_secs),
            ("zombie.zombies_per_player", self.zombie.zombies_per_player),
            ("zombie.hunt_secs", self.zombie.hunt_secs),
            ("storm.damage", self.storm.damage),
            ("combat.fist_cooldown", self.combat.fist_cooldown),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    details: format!("must be non-negative and finite, got {value}"),
                });
            }
        }

        if !(0.0..0.5).contains(&self.zombie.border_ratio) {
            return Err(ConfigError::Invalid {
                field: "zombie.border_ratio",
                details: format!("must be in [0, 0.5), got {}", self.zombie.border_ratio),
            });
        }
        let (low, high) = self.zombie.defend_secs;
        if !(low >= 0.0 && low <= high && high.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "zombie.defend_secs",
                details: format!("expected 0 <= low <= high, got ({low}, {high})"),
            });
        }
        if !(self.storm.speed_ratio > 0.0 && self.storm.cloud_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "storm.speed_ratio",
                details: "the cloud must have a size and move".to_owned(),
            });
        }
        Ok(())
    }
}
