//! Catbrawl Engine -- task-queue AI and event orchestration for the brawler stage.
//!
//! This crate builds on [`catbrawl_world`] to provide the behavior layer:
//! resumable [`Task`](task::Task)s composed into per-character
//! [`TaskQueue`](ai::TaskQueue)s, player and zombie [`Brain`](ai::Brain)s,
//! stage events (duels, zombie invasions, storms and visual effects) run by an
//! [`EventManager`](event::EventManager) that holds exclusive character claims,
//! the viewer [redemption](redeem) desk, and the fixed-timestep
//! [`Arena`](tick::Arena) that drives all of it deterministically.
//!
//! Side effects outside the simulation (chat, predictions, sounds) go through
//! the [`Services`](services::Services) collaborators; everything that
//! happened is also appended to the arena [`Journal`](journal::Journal).
//!
//! # Quick Start
//!
//! ```
//! use catbrawl_engine::prelude::*;
//! use catbrawl_engine::services::recording;
//!
//! let (services, recorder) = recording::services();
//! let mut arena = Arena::new(ArenaConfig::default(), services).unwrap();
//!
//! arena.redeem(&Redemption::new("Tom", "spawn")).unwrap();
//! arena.redeem(&Redemption::new("Jerry", "spawn")).unwrap();
//! arena
//!     .redeem(&Redemption::new("tom", "start duel").with_input("@jerry"))
//!     .unwrap();
//!
//! arena.run_ticks(60);
//! assert!(arena.any_event_blocking());
//! assert!(recorder.messages()[0].contains("challenged @jerry"));
//! ```

#![deny(unsafe_code)]

pub mod ai;
pub mod config;
pub mod event;
pub mod journal;
pub mod outbox;
pub mod prediction;
pub mod redeem;
pub mod services;
pub mod snapshot;
pub mod task;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the world crate for convenience.
pub use catbrawl_world;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the world prelude.
    pub use catbrawl_world::prelude::*;

    pub use crate::ai::{Brain, HuntPhase, Policy, TaskQueue};
    pub use crate::config::{ArenaConfig, ConfigError, DuelConfig, StormConfig, ZombieConfig};
    pub use crate::event::{
        CharacterGhost, DuelEvent, DuelStage, EventContext, EventError, EventId, EventLayer,
        EventManager, FlyingHeart, HitSpark, StageEvent, StormEvent, TitleEvent, ZombieEvent,
        ZombieStage, VIEWERS_OUTCOME, ZOMBIES_OUTCOME,
    };
    pub use crate::journal::{ArenaEvent, Journal, JournalEntry};
    pub use crate::outbox::{Outbox, SpawnRequest};
    pub use crate::prediction::{PredictionDriver, PredictionError, PredictionPhase};
    pub use crate::redeem::{RedeemError, RedeemKind, RedeemOutcome, Redemption};
    pub use crate::services::{PredictionRequest, PredictionUpdate, Services, SoundCue};
    pub use crate::snapshot::ArenaSummary;
    pub use crate::task::{Task, TaskContext, TaskFlags, TaskKind, TaskState};
    pub use crate::tick::{Arena, TickDiagnostics};
}
