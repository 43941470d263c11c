//! Active event list with per-character claims.

use std::collections::{BTreeMap, BTreeSet};

use catbrawl_world::entity::EntityId;

use super::{EventContext, EventError, EventId, EventLayer, StageEvent};
use crate::journal::{ArenaEvent, Journal};
use crate::redeem::RedeemKind;

#[derive(Debug)]
struct ActiveEvent {
    id: EventId,
    event: Box<dyn StageEvent>,
    claims: Vec<EntityId>,
}

/// Owns every running event, in launch order.
#[derive(Debug, Default)]
pub struct EventManager {
    events: Vec<ActiveEvent>,
    next_id: u64,
    claims: BTreeMap<EntityId, EventId>,
}

impl EventManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check claims, assign an id and call `begin`.
    ///
    /// Fails without side effects if any claimed character is already held by
    /// an active event.
    pub fn launch(
        &mut self,
        mut event: Box<dyn StageEvent>,
        ctx: &mut EventContext<'_>,
    ) -> Result<EventId, EventError> {
        let claims = event.claims();
        if let Some((&entity, &holder)) = claims
            .iter()
            .find_map(|e| self.claims.get_key_value(e))
        {
            return Err(EventError::ClaimConflict {
                event: event.name(),
                entity,
                holder,
            });
        }

        self.next_id += 1;
        let id = EventId::new(self.next_id);
        for &entity in &claims {
            self.claims.insert(entity, id);
        }

        ctx.self_id = id;
        event.begin(ctx);
        tracing::debug!(%id, name = event.name(), claims = claims.len(), "event launched");
        ctx.journal.record(ArenaEvent::EventStarted {
            event: id,
            name: event.name().to_owned(),
        });
        self.events.push(ActiveEvent { id, event, claims });
        Ok(id)
    }

    /// Advance every event that is not done yet, in launch order.
    pub fn update_all(&mut self, ctx: &mut EventContext<'_>) {
        for active in &mut self.events {
            if active.event.is_done() {
                continue;
            }
            ctx.self_id = active.id;
            active.event.update(ctx);
        }
    }

    /// Remove finished events and release their claims.
    pub fn reap_done(&mut self, journal: &mut Journal) -> Vec<EventId> {
        let mut reaped = Vec::new();
        let claims = &mut self.claims;
        self.events.retain(|active| {
            if !active.event.is_done() {
                return true;
            }
            for entity in &active.claims {
                claims.remove(entity);
            }
            tracing::debug!(id = %active.id, name = active.event.name(), "event finished");
            journal.record(ArenaEvent::EventFinished {
                event: active.id,
                name: active.event.name().to_owned(),
            });
            reaped.push(active.id);
            false
        });
        reaped
    }

    /// Cancel one event. Events that hold characters release them on their
    /// next update; the event is reaped once it reports done.
    pub fn cancel(&mut self, id: EventId) -> bool {
        match self.events.iter_mut().find(|a| a.id == id) {
            Some(active) => {
                active.event.cancel();
                true
            }
            None => false,
        }
    }

    // -- queries --------------------------------------------------------------

    /// Whether any running event blocks viewer actions.
    pub fn any_event_blocking(&self) -> bool {
        self.events
            .iter()
            .any(|a| !a.event.is_done() && a.event.is_blocking())
    }

    /// Whether a running event refuses `kind`.
    pub fn redeem_blocked_by_active_event(&self, kind: RedeemKind) -> bool {
        self.events
            .iter()
            .any(|a| !a.event.is_done() && a.event.blocked_redeems().contains(&kind))
    }

    /// Ids of events that are not done.
    pub fn running_ids(&self) -> BTreeSet<EventId> {
        self.events
            .iter()
            .filter(|a| !a.event.is_done())
            .map(|a| a.id)
            .collect()
    }

    /// Every claimed character with its holder.
    pub fn claims(&self) -> &BTreeMap<EntityId, EventId> {
        &self.claims
    }

    /// The event holding `entity`, if any.
    pub fn claim_of(&self, entity: EntityId) -> Option<EventId> {
        self.claims.get(&entity).copied()
    }

    /// Look up an event by id.
    pub fn get(&self, id: EventId) -> Option<&dyn StageEvent> {
        self.events
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.event.as_ref())
    }

    /// Events on `layer`, in launch order.
    pub fn iter_layer(&self, layer: EventLayer) -> impl Iterator<Item = (EventId, &dyn StageEvent)> {
        self.events
            .iter()
            .filter(move |a| a.event.layer() == layer)
            .map(|a| (a.id, a.event.as_ref()))
    }

    /// Every event with its id, in launch order.
    pub fn iter(&self) -> impl Iterator<Item = (EventId, &dyn StageEvent)> {
        self.events.iter().map(|a| (a.id, a.event.as_ref()))
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
