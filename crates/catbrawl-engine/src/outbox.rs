//! Side effects deferred to the end of the per-character phase.
//!
//! Tasks and brains run while the arena iterates its id snapshot, so they may
//! not add characters or events directly. They post requests here instead;
//! the arena applies them after dead characters are reaped.

use catbrawl_world::geometry::Point;

use crate::event::StageEvent;

/// A character the arena should add after the per-character phase.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    /// Raise a killed viewer as a zombie.
    ConvertedZombie {
        /// Name of the victim; the zombie is called `{victim}_zom`.
        victim: String,
        /// Top-left corner where the victim fell.
        position: Point,
        /// Sprite family inherited from the victim.
        skin: String,
    },
}

/// Deferred spawns and event launches.
#[derive(Debug, Default)]
pub struct Outbox {
    spawns: Vec<SpawnRequest>,
    events: Vec<Box<dyn StageEvent>>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a character to be spawned.
    pub fn request_spawn(&mut self, request: SpawnRequest) {
        self.spawns.push(request);
    }

    /// Ask for a stage event to be launched.
    pub fn request_event(&mut self, event: Box<dyn StageEvent>) {
        self.events.push(event);
    }

    /// Pending spawn requests.
    pub fn spawns(&self) -> &[SpawnRequest] {
        &self.spawns
    }

    /// Number of pending event launches.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty() && self.events.is_empty()
    }

    /// Take everything, leaving the outbox empty.
    pub(crate) fn take(&mut self) -> (Vec<SpawnRequest>, Vec<Box<dyn StageEvent>>) {
        (
            std::mem::take(&mut self.spawns),
            std::mem::take(&mut self.events),
        )
    }
}
