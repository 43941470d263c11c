//! Stage geometry, movement tuning and fist combat constants.
//!
//! Both structs deserialize with `#[serde(default)]`, so a config file only
//! needs to name the values it overrides.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::WorldError;

// ---------------------------------------------------------------------------
// StageConfig
// ---------------------------------------------------------------------------

/// Physical layout of the stage and default character tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Stage width in pixels.
    pub width: f64,
    /// Stage height in pixels. The floor is the bottom edge.
    pub height: f64,
    /// Default character box width.
    pub character_width: f64,
    /// Default character box height.
    pub character_height: f64,
    /// Grounded walking speed in pixels per second.
    pub move_speed: f64,
    /// Downward acceleration in pixels per second squared.
    pub gravity: f64,
    /// Fraction of horizontal velocity lost per second while airborne.
    pub air_resistance: f64,
    /// Default maximum health of a viewer character.
    pub max_health: f64,
    /// Upward impulse of a full jump.
    pub jump_velocity: f64,
    /// Distance above the bottom edge used for walk targets on the floor.
    pub floor_margin: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 270.0,
            character_width: 80.0,
            character_height: 80.0,
            move_speed: 100.0,
            gravity: 100.0,
            air_resistance: 0.3,
            max_health: 100.0,
            jump_velocity: 200.0,
            floor_margin: 5.0,
        }
    }
}

impl StageConfig {
    /// Horizontal position at fraction `k` of the stage width.
    pub fn scaled_x(&self, k: f64) -> f64 {
        (self.width * k).trunc()
    }

    /// A walk target standing on the floor at fraction `k` of the width.
    pub fn floor_point(&self, k: f64) -> Point {
        Point::new(self.scaled_x(k), self.height - self.floor_margin)
    }

    /// Random spawn point in the middle 80% of the stage, at the top edge.
    pub fn random_spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let low = self.scaled_x(0.1);
        let high = self.scaled_x(0.9);
        let x = if low < high { rng.gen_range(low..=high) } else { low };
        Point::new(x.trunc(), 0.0)
    }

    /// Whether a box at `(x, y)` with size `(w, h)` lies entirely off-stage.
    pub fn is_off_stage(&self, x: f64, y: f64, w: f64, h: f64) -> bool {
        x + w <= 0.0 || x >= self.width || y + h <= 0.0 || y >= self.height
    }

    /// Reject values that would make the simulation meaningless.
    pub fn validate(&self) -> Result<(), WorldError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("character_width", self.character_width),
            ("character_height", self.character_height),
            ("max_health", self.max_health),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(WorldError::InvalidConfig {
                    field,
                    details: format!("must be positive and finite, got {value}"),
                });
            }
        }
        if self.character_width > self.width || self.character_height > self.height {
            return Err(WorldError::InvalidConfig {
                field: "character_width",
                details: "character box does not fit on the stage".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CombatConfig
// ---------------------------------------------------------------------------

/// Fist weapon tuning shared by viewers and zombies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Minimum damage of a punch. The maximum is twice this value.
    pub fist_damage: f64,
    /// Upward knockback of hook and throw punches.
    pub hook_velocity: f64,
    /// Kick impulse; throw punches push sideways with half of it.
    pub kick_velocity: f64,
    /// Seconds between two punches.
    pub fist_cooldown: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            fist_damage: 10.0,
            hook_velocity: 150.0,
            kick_velocity: 300.0,
            fist_cooldown: 0.5,
        }
    }
}
