//! Character identifiers and slot allocation.
//!
//! An [`EntityId`] packs a *generation* counter in the high 32 bits and a slot
//! *index* in the low 32 bits. Every time a slot is recycled its generation is
//! bumped, so a task or event still holding the id of a reaped character sees
//! a stale handle instead of silently addressing whoever took the slot next.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational character identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// SlotAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s for the character registry and recycles the slots
/// of reaped characters.
///
/// Free slots are reused in FIFO order so that a slot freed by a death is not
/// immediately handed to the zombie spawned from that same death.
#[derive(Debug, Default, Clone)]
pub struct SlotAllocator {
    generations: Vec<u32>,
    occupied: Vec<bool>,
    free: VecDeque<u32>,
}

impl SlotAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id, reusing a freed slot when one is available.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free.pop_front() {
            self.occupied[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.occupied.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Release the slot held by `id`, bumping its generation.
    ///
    /// Returns `false` for stale or already released ids.
    pub fn release(&mut self, id: EntityId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.occupied[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push_back(id.index());
        true
    }

    /// Whether `id` addresses an occupied slot with a matching generation.
    pub fn is_live(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len()
            && self.occupied[idx]
            && self.generations[idx] == id.generation()
    }

    /// Number of occupied slots.
    pub fn live_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    /// Total number of slots ever created.
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
