//! Typed log of what happened on stage.
//!
//! The arena appends one [`ArenaEvent`] per noteworthy change: spawns, deaths,
//! conversions, event lifecycle, prediction updates, announcements and faults.
//! Hosts drain the journal each frame to drive overlays or persistence; tests
//! read it to assert on outcomes without scraping log output.

use catbrawl_world::character::Faction;
use catbrawl_world::entity::EntityId;
use serde::{Deserialize, Serialize};

use crate::event::EventId;
use crate::services::PredictionUpdate;

/// One journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArenaEvent {
    /// A character entered the stage.
    Spawned {
        id: EntityId,
        name: String,
        faction: Faction,
    },
    /// A character died and was removed.
    Died {
        id: EntityId,
        name: String,
        reason: Option<String>,
    },
    /// A dead viewer came back as a zombie.
    Converted { victim: String, zombie: EntityId },
    /// A stage event started.
    EventStarted { event: EventId, name: String },
    /// A stage event was refused.
    EventRejected { name: String, reason: String },
    /// A stage event finished and was removed.
    EventFinished { event: EventId, name: String },
    /// An event pushed a prediction status change.
    Prediction {
        event: EventId,
        update: PredictionUpdate,
    },
    /// A chat message went out.
    Announced { text: String },
    /// A character's frame update failed and was rolled back.
    Fault { id: EntityId, details: String },
}

/// A journal record stamped with the frame it happened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Frame number (1-based; 0 for changes made between frames before the first).
    pub tick: u64,
    /// What happened.
    pub event: ArenaEvent,
}

/// Append-only journal.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    tick: u64,
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subsequent records with `tick`.
    pub(crate) fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Append a record.
    pub fn record(&mut self, event: ArenaEvent) {
        tracing::trace!(tick = self.tick, ?event, "journal");
        self.entries.push(JournalEntry {
            tick: self.tick,
            event,
        });
    }

    /// Records since the last drain.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Take every record, leaving the journal empty.
    pub fn drain(&mut self) -> Vec<JournalEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the bare events.
    pub fn events(&self) -> impl Iterator<Item = &ArenaEvent> {
        self.entries.iter().map(|e| &e.event)
    }
}
