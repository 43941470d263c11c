//! Arena summaries with BLAKE3 hashing.
//!
//! [`Arena::state_hash`] digests everything physical on stage (every character
//! with its health, position, velocities and weapon cooldown), the tick counter,
//! the frame step and the names of the running events. Two arenas built from
//! the same config and fed the same inputs produce the same hash at every tick,
//! which is what the determinism tests compare.
//!
//! ```
//! use catbrawl_engine::prelude::*;
//!
//! let run = || {
//!     let mut arena = Arena::new(ArenaConfig::default(), Services::silent()).unwrap();
//!     let tom = arena.spawn_viewer("tom").unwrap();
//!     arena.brain_mut(tom).unwrap().queue_mut().run_idle_walking();
//!     arena.run_ticks(120);
//!     arena.state_hash()
//! };
//! let hash = run();
//! assert_eq!(hash.len(), 64); // BLAKE3 hex digest
//! assert_eq!(hash, run());
//! ```
//!
//! Brains and task queues are not part of the hash: they only matter through
//! the motion and damage they cause, which is.

use catbrawl_world::character::Character;
use serde::{Deserialize, Serialize};

use crate::tick::Arena;

/// A serializable picture of the arena at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSummary {
    /// Ticks executed at capture time.
    pub tick_counter: u64,
    /// Simulation clock at capture time.
    pub sim_time: f64,
    /// Every character, in slot order.
    pub characters: Vec<Character>,
    /// Names of the running events, in launch order.
    pub events: Vec<String>,
    /// BLAKE3 hex digest of the state.
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

fn compute_hash(characters: &[&Character], events: &[&str], tick_counter: u64, fixed_dt: f64) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        characters: &'a [&'a Character],
        events: &'a [&'a str],
        tick_counter: u64,
        fixed_dt: f64,
    }

    let hashable = HashableState {
        characters,
        events,
        tick_counter,
        fixed_dt,
    };
    let json_bytes =
        serde_json::to_vec(&hashable).expect("arena state should always be JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}

impl Arena {
    /// BLAKE3 hex digest of the current state.
    pub fn state_hash(&self) -> String {
        let characters: Vec<&Character> = self.world().iter().collect();
        let events: Vec<&str> = self.events().iter().map(|(_, e)| e.name()).collect();
        compute_hash(&characters, &events, self.tick_count(), self.fixed_dt())
    }

    /// Capture a summary of the current state, hash included.
    pub fn capture_summary(&self) -> ArenaSummary {
        ArenaSummary {
            tick_counter: self.tick_count(),
            sim_time: self.sim_time(),
            characters: self.world().iter().cloned().collect(),
            events: self
                .events()
                .iter()
                .map(|(_, e)| e.name().to_owned())
                .collect(),
            hash: self.state_hash(),
        }
    }
}
