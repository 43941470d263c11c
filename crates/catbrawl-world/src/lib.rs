//! Catbrawl World -- characters, stage physics and the character registry.
//!
//! This crate holds everything that exists *physically* on the stage: the
//! [`Character`](character::Character) bodies viewers and zombies inhabit,
//! their [`Fists`](weapon::Fists), the fall/walk integration that moves them,
//! and the [`World`](world::World) registry that hands out generational
//! [`EntityId`](entity::EntityId)s. Behavior (tasks, AI, events) lives in
//! `catbrawl-engine` and acts on this crate only through effectors.
//!
//! # Quick Start
//!
//! ```
//! use catbrawl_world::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
//! let mut world = World::new(StageConfig::default(), CombatConfig::default());
//! let tom = world.spawn(CharacterSpec::viewer("Tom"), &mut rng).unwrap();
//!
//! // Spawned at the top edge; gravity brings the body down.
//! for _ in 0..600 {
//!     let stage = world.stage().clone();
//!     integrate(world.get_mut(tom).unwrap(), 1.0 / 60.0, &stage).unwrap();
//! }
//! assert!(world.get(tom).unwrap().on_the_ground());
//! ```

#![deny(unsafe_code)]

pub mod character;
pub mod config;
pub mod entity;
pub mod geometry;
pub mod physics;
pub mod weapon;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry and physics operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The id is stale or was never allocated.
    #[error("character {id} does not exist (stale or never allocated)")]
    UnknownEntity { id: entity::EntityId },

    /// A viewer with this name is already on stage.
    #[error("a character named '{name}' already exists")]
    DuplicateName { name: String },

    /// Integration produced a non-finite value.
    #[error("character {id} reached a corrupt state: {details}")]
    CorruptState {
        id: entity::EntityId,
        details: String,
    },

    /// A configuration value is out of range.
    #[error("invalid stage config field '{field}': {details}")]
    InvalidConfig {
        field: &'static str,
        details: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::character::{Appearance, Character, CharacterSpec, Faction, Rgb};
    pub use crate::config::{CombatConfig, StageConfig};
    pub use crate::entity::{EntityId, SlotAllocator};
    pub use crate::geometry::{Point, Rect};
    pub use crate::physics::{integrate, DESTRUCTION_REASON};
    pub use crate::weapon::{Fists, PunchKind, Weapon};
    pub use crate::world::{HitReport, StrikeRefusal, World};
    pub use crate::WorldError;
}
