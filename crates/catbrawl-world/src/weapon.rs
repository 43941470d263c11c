//! Weapons a character can carry.
//!
//! Only fists exist today. [`Weapon`] stays an enum so that melee tasks can ask
//! "is this a fist-type weapon" without knowing every other kind.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CombatConfig;

/// A weapon slot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Weapon {
    /// Bare-handed melee.
    Fists(Fists),
}

impl Weapon {
    /// Fists built from the shared combat tuning.
    pub fn fists(config: &CombatConfig) -> Self {
        Self::Fists(Fists::from_config(config))
    }

    /// The fists, if this weapon is fist-type.
    pub fn as_fists(&self) -> Option<&Fists> {
        match self {
            Self::Fists(f) => Some(f),
        }
    }

    /// Mutable access to the fists, if this weapon is fist-type.
    pub fn as_fists_mut(&mut self) -> Option<&mut Fists> {
        match self {
            Self::Fists(f) => Some(f),
        }
    }

    /// Advance the cooldown clock.
    pub fn cool_down(&mut self, dt: f64) {
        match self {
            Self::Fists(f) => f.cool_down(dt),
        }
    }

    /// Whether the weapon can be used right now.
    pub fn ready_to_use(&self) -> bool {
        match self {
            Self::Fists(f) => f.ready_to_use(),
        }
    }
}

/// The three punch variants a fist swing can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PunchKind {
    /// Damage plus an upward launch.
    Hook,
    /// Damage only.
    Jab,
    /// Damage plus an up-and-away launch.
    Throw,
}

/// Fist weapon state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fists {
    /// Lower bound of the damage roll.
    pub min_damage: f64,
    /// Upper bound of the damage roll.
    pub max_damage: f64,
    /// Upward launch of hooks and throws.
    pub hook_power: f64,
    /// Sideways launch of throws.
    pub push_power: f64,
    /// Seconds the cooldown is reset to after a swing.
    pub cooldown: f64,
    cooldown_left: f64,
}

impl Fists {
    /// Fists with explicit damage range and knockback, starting ready.
    pub fn new(
        min_damage: f64,
        max_damage: f64,
        hook_power: f64,
        push_power: f64,
        cooldown: f64,
    ) -> Self {
        Self {
            min_damage,
            max_damage,
            hook_power,
            push_power,
            cooldown,
            cooldown_left: 0.0,
        }
    }

    /// Fists from combat tuning: damage in `[d, 2d]`, throws at half kick power.
    pub fn from_config(config: &CombatConfig) -> Self {
        Self::new(
            config.fist_damage,
            config.fist_damage * 2.0,
            config.hook_velocity,
            (config.kick_velocity / 2.0).trunc(),
            config.fist_cooldown,
        )
    }

    /// Whether the cooldown has elapsed.
    pub fn ready_to_use(&self) -> bool {
        self.cooldown_left <= 0.0
    }

    /// Seconds until the next swing is allowed.
    pub fn cooldown_left(&self) -> f64 {
        self.cooldown_left.max(0.0)
    }

    /// Advance the cooldown clock by `dt` seconds.
    pub fn cool_down(&mut self, dt: f64) {
        if !self.ready_to_use() {
            self.cooldown_left -= dt;
        }
    }

    /// Restart the cooldown after a swing.
    pub fn reset_cooldown(&mut self) {
        self.cooldown_left = self.cooldown;
    }

    /// Roll the punch variant: 2/11 hooks, 4/11 jabs, the rest throws.
    pub fn roll_kind<R: Rng + ?Sized>(&self, rng: &mut R) -> PunchKind {
        match rng.gen_range(0..=10) {
            0..=1 => PunchKind::Hook,
            2..=5 => PunchKind::Jab,
            _ => PunchKind::Throw,
        }
    }

    /// Roll the damage of one punch.
    pub fn roll_damage<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min_damage < self.max_damage {
            rng.gen_range(self.min_damage..=self.max_damage)
        } else {
            self.min_damage
        }
    }
}
