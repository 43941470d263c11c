//! Stage events: scripted episodes that take over characters for a while.
//!
//! An event is a state machine driven once per frame by the
//! [`EventManager`]. When launched it may *claim* characters; the manager
//! refuses a second event whose claims overlap an active one. While running,
//! an event redirects the task queues of the characters it involves and ends
//! by handing them back to idle behavior.
//!
//! # Lifecycle
//!
//! ```text
//! launch ─► begin ─► update … update ─► is_done ─► reaped
//! ```
//!
//! Visual-only events (ghosts, hearts, titles, hit sparks) use the same trait
//! and simply never claim anybody.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use catbrawl_world::character::CharacterSpec;
use catbrawl_world::entity::EntityId;
use catbrawl_world::geometry::Point;
use catbrawl_world::world::World;
use catbrawl_world::WorldError;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::ai::{self, Brain};
use crate::journal::{ArenaEvent, Journal};
use crate::prediction::PredictionDriver;
use crate::redeem::RedeemKind;
use crate::services::{PredictionUpdate, Services};

mod duel;
mod manager;
mod storm;
mod visual;
mod zombie;

pub use duel::{DuelEvent, DuelStage};
pub use manager::EventManager;
pub use storm::StormEvent;
pub use visual::{CharacterGhost, FlyingHeart, HitSpark, TitleEvent};
pub use zombie::{ZombieEvent, ZombieStage, VIEWERS_OUTCOME, ZOMBIES_OUTCOME};

// ---------------------------------------------------------------------------
// EventId / errors
// ---------------------------------------------------------------------------

/// Identifier of a launched event. Never reused within one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Wrap a raw id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Why an event could not be launched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// A character the event needs is already held by another event.
    #[error("{event} cannot claim {entity}: held by {holder}")]
    ClaimConflict {
        event: &'static str,
        entity: EntityId,
        holder: EventId,
    },
}

// ---------------------------------------------------------------------------
// StageEvent
// ---------------------------------------------------------------------------

/// Whether an event is presented behind or in front of the characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventLayer {
    /// Drawn before the characters.
    Behind,
    /// Drawn after the characters.
    Front,
}

/// A scripted episode driven by the [`EventManager`].
pub trait StageEvent: fmt::Debug {
    /// Stable identifier.
    fn name(&self) -> &'static str;

    /// Whether viewer actions must wait until the event ends.
    fn is_blocking(&self) -> bool {
        false
    }

    /// Redemptions refused while the event runs.
    fn blocked_redeems(&self) -> &'static [RedeemKind] {
        &[]
    }

    /// Presentation layer.
    fn layer(&self) -> EventLayer {
        EventLayer::Behind
    }

    /// Characters the event takes exclusive control of.
    fn claims(&self) -> Vec<EntityId> {
        Vec::new()
    }

    /// Where the renderer should anchor the event, if it has a position.
    fn anchor(&self) -> Option<Point> {
        None
    }

    /// Called once when launched.
    fn begin(&mut self, _ctx: &mut EventContext<'_>) {}

    /// Advance one frame.
    fn update(&mut self, ctx: &mut EventContext<'_>);

    /// Whether the event has finished and may be reaped.
    fn is_done(&self) -> bool;

    /// Stop the event. Events that hold characters hand them back on their
    /// next update and report done afterwards.
    fn cancel(&mut self);
}

// ---------------------------------------------------------------------------
// EventContext
// ---------------------------------------------------------------------------

static NO_CLAIMS: BTreeMap<EntityId, EventId> = BTreeMap::new();

/// Everything an event may read or touch during one call.
pub struct EventContext<'a> {
    /// The character registry.
    pub world: &'a mut World,
    /// Brains of every character.
    pub brains: &'a mut BTreeMap<EntityId, Brain>,
    /// The arena's random stream.
    pub rng: &'a mut Pcg64,
    /// Chat, prediction and sound collaborators.
    pub services: &'a mut Services,
    /// The arena journal.
    pub journal: &'a mut Journal,
    /// Events that were running when the frame's event phase began.
    pub running: &'a BTreeSet<EventId>,
    /// Which event holds which character, as of the start of the call.
    pub claims: &'a BTreeMap<EntityId, EventId>,
    /// Simulation clock at this frame.
    pub time: f64,
    /// Frame step.
    pub dt: f64,
    pub(crate) self_id: EventId,
}

impl<'a> EventContext<'a> {
    /// Bundle the per-frame borrows.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        world: &'a mut World,
        brains: &'a mut BTreeMap<EntityId, Brain>,
        rng: &'a mut Pcg64,
        services: &'a mut Services,
        journal: &'a mut Journal,
        running: &'a BTreeSet<EventId>,
        time: f64,
        dt: f64,
    ) -> Self {
        Self {
            world,
            brains,
            rng,
            services,
            journal,
            running,
            claims: &NO_CLAIMS,
            time,
            dt,
            self_id: EventId::new(0),
        }
    }

    /// Expose the active claims to the events driven through this context.
    pub fn with_claims(mut self, claims: &'a BTreeMap<EntityId, EventId>) -> Self {
        self.claims = claims;
        self
    }

    /// Id of the event currently being driven.
    pub fn self_id(&self) -> EventId {
        self.self_id
    }

    /// Whether `id` is held by an event other than the one being driven.
    pub fn claimed_by_other(&self, id: EntityId) -> bool {
        self.claims
            .get(&id)
            .is_some_and(|&holder| holder != self.self_id)
    }

    /// The brain of a player character, if it has one.
    pub fn player_brain(&mut self, id: EntityId) -> Option<&mut Brain> {
        self.brains.get_mut(&id).filter(|b| b.is_player())
    }

    /// Ids of every living viewer, in slot order.
    pub fn living_players(&self) -> Vec<EntityId> {
        self.world
            .iter()
            .filter(|c| c.is_player() && c.is_alive())
            .map(|c| c.id())
            .collect()
    }

    /// Spawn a character with a brain and journal it.
    pub fn admit(&mut self, spec: CharacterSpec, brain: Brain) -> Result<EntityId, WorldError> {
        ai::admit(self.world, self.brains, self.journal, self.rng, spec, brain)
    }

    /// Send a chat message and journal it.
    pub fn announce(&mut self, text: &str) {
        self.services.announce(text);
        self.journal.record(ArenaEvent::Announced {
            text: text.to_owned(),
        });
    }

    /// Forward a prediction transition to the board and the journal.
    pub fn publish_prediction(&mut self, update: PredictionUpdate) {
        tracing::info!(event = %self.self_id, ?update, "prediction update");
        self.services.update_prediction(&update);
        self.journal.record(ArenaEvent::Prediction {
            event: self.self_id,
            update,
        });
    }

    /// Apply `transition` to `driver` and publish the result. Repeated
    /// transitions are logged and dropped.
    pub(crate) fn drive_prediction<F>(&mut self, driver: &mut PredictionDriver, transition: F)
    where
        F: FnOnce(&mut PredictionDriver) -> Result<PredictionUpdate, crate::prediction::PredictionError>,
    {
        match transition(driver) {
            Ok(update) => self.publish_prediction(update),
            Err(e) => tracing::warn!(error = %e, event = %self.self_id, "prediction transition dropped"),
        }
    }
}
