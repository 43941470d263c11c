//! Fixed-timestep arena loop.
//!
//! The [`Arena`] owns the character registry, one [`Brain`] per character, the
//! [`EventManager`], the collaborators and the arena's only random stream.
//! Each [`tick`](Arena::tick):
//!
//! 1. Every character, in slot order over a snapshot of ids, runs its brain
//!    (living characters only) and then its physics step. A step that leaves
//!    the character in a corrupt state is rolled back and journaled.
//! 2. Dead characters are removed. Viewers get a death announcement, and a
//!    ghost when their body asks for one.
//! 3. Spawns and event launches requested by tasks are applied.
//! 4. Every running event advances once, in launch order.
//! 5. Finished events are reaped and their claims released.
//!
//! The simulation clock is `tick_count * fixed_dt`, and the random stream is a
//! seeded PCG, so identical configs and inputs give identical runs.
//!
//! # Example
//!
//! ```
//! use catbrawl_engine::prelude::*;
//!
//! let mut arena = Arena::new(ArenaConfig::default(), Services::silent()).unwrap();
//! let tom = arena.spawn_viewer("tom").unwrap();
//! arena.brain_mut(tom).unwrap().queue_mut().run_idle_walking();
//!
//! arena.run_ticks(10);
//! assert_eq!(arena.tick_count(), 10);
//! assert!(arena.world().is_alive(tom));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use catbrawl_world::character::{CharacterSpec, Faction};
use catbrawl_world::entity::EntityId;
use catbrawl_world::physics::integrate;
use catbrawl_world::weapon::Weapon;
use catbrawl_world::world::World;
use catbrawl_world::WorldError;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::ai::{self, Brain};
use crate::config::{ArenaConfig, ConfigError};
use crate::event::{
    CharacterGhost, DuelEvent, EventContext, EventError, EventId, EventManager, StageEvent,
    StormEvent, TitleEvent, ZombieEvent,
};
use crate::journal::{ArenaEvent, Journal};
use crate::outbox::{Outbox, SpawnRequest};
use crate::redeem::{self, RedeemError, RedeemKind, RedeemOutcome, Redemption};
use crate::services::Services;
use crate::task::{Task, TaskContext};

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per phase, in order of execution.
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// The deterministic stage simulation.
pub struct Arena {
    config: ArenaConfig,
    world: World,
    brains: BTreeMap<EntityId, Brain>,
    events: EventManager,
    services: Services,
    journal: Journal,
    outbox: Outbox,
    rng: Pcg64,
    /// Number of ticks executed so far.
    tick_counter: u64,
    last_diagnostics: TickDiagnostics,
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("tick_counter", &self.tick_counter)
            .field("characters", &self.world.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Arena {
    /// Create an empty arena. The tick counter starts at 0 and simulation time
    /// at 0.0.
    pub fn new(config: ArenaConfig, services: Services) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = World::new(config.stage.clone(), config.combat.clone());
        let rng = Pcg64::seed_from_u64(config.seed);
        tracing::info!(seed = config.seed, fixed_dt = config.fixed_dt, "arena created");
        Ok(Self {
            config,
            world,
            brains: BTreeMap::new(),
            events: EventManager::new(),
            services,
            journal: Journal::new(),
            outbox: Outbox::new(),
            rng,
            tick_counter: 0,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    // -- characters -----------------------------------------------------------

    /// Spawn a viewer with fists at a random spawn point. Its queue starts
    /// empty.
    pub fn spawn_viewer(&mut self, name: &str) -> Result<EntityId, WorldError> {
        let spec = CharacterSpec::viewer(name).with_weapon(Weapon::fists(&self.config.combat));
        self.spawn_character(spec)
    }

    /// Spawn any character. Viewers get a player brain, zombies a hunting one.
    pub fn spawn_character(&mut self, spec: CharacterSpec) -> Result<EntityId, WorldError> {
        let brain = if spec.faction == Faction::Zombie {
            Brain::zombie(self.config.zombie.hunt_secs)
        } else {
            Brain::player()
        };
        let id = ai::admit(
            &mut self.world,
            &mut self.brains,
            &mut self.journal,
            &mut self.rng,
            spec,
            brain,
        )?;
        tracing::info!(%id, "character spawned");
        Ok(id)
    }

    /// Spawn a zombie with the stage's zombie stats.
    pub fn spawn_zombie(&mut self, name: &str) -> Result<EntityId, WorldError> {
        let spec = self.world.zombie_spec(name);
        self.spawn_character(spec)
    }

    /// Look up a viewer by name, ignoring case.
    pub fn find_viewer(&self, name: &str) -> Option<EntityId> {
        self.world.find_by_name(name)
    }

    /// The brain of a character.
    pub fn brain(&self, id: EntityId) -> Option<&Brain> {
        self.brains.get(&id)
    }

    /// Mutable brain of a character.
    pub fn brain_mut(&mut self, id: EntityId) -> Option<&mut Brain> {
        self.brains.get_mut(&id)
    }

    /// The head of a character's queue.
    pub fn current_task(&self, id: EntityId) -> Option<&Task> {
        self.brains.get(&id)?.queue().current_task()
    }

    /// Whether a character's head task may not be interrupted.
    pub fn current_task_is_blocking(&self, id: EntityId) -> bool {
        self.current_task(id).is_some_and(Task::is_blocking)
    }

    // -- events ---------------------------------------------------------------

    /// Launch any event between frames.
    pub fn launch(&mut self, event: Box<dyn StageEvent>) -> Result<EventId, EventError> {
        let time = self.sim_time();
        self.launch_at(event, time)
    }

    /// Start a duel, with a banner that lasts as long as the fight.
    pub fn start_duel(
        &mut self,
        challenger: EntityId,
        opponent: EntityId,
    ) -> Result<EventId, EventError> {
        let duel = DuelEvent::new(challenger, opponent, self.config.duel.clone());
        let id = self.launch(Box::new(duel))?;
        self.launch(Box::new(TitleEvent::new("!DUEL!").following(id)))?;
        Ok(id)
    }

    /// Start a zombie invasion against every living viewer.
    pub fn start_zombie_event(&mut self) -> Result<EventId, EventError> {
        let players: Vec<EntityId> = self
            .world
            .iter()
            .filter(|c| c.is_player() && c.is_alive())
            .map(|c| c.id())
            .collect();
        let event = ZombieEvent::new(self.config.zombie.clone(), players);
        let id = self.launch(Box::new(event))?;
        self.launch(Box::new(TitleEvent::new("!ZOMBIES ATTACK!").following(id)))?;
        Ok(id)
    }

    /// Send a storm across the stage.
    pub fn start_storm(&mut self) -> Result<EventId, EventError> {
        self.launch(Box::new(StormEvent::new(self.config.storm.clone())))
    }

    /// Whether any running event holds viewer actions back.
    pub fn any_event_blocking(&self) -> bool {
        self.events.any_event_blocking()
    }

    /// Whether a running event refuses `kind`.
    pub fn redeem_blocked_by_active_event(&self, kind: RedeemKind) -> bool {
        self.events.redeem_blocked_by_active_event(kind)
    }

    /// Validate and apply a viewer redemption.
    pub fn redeem(&mut self, redemption: &Redemption) -> Result<RedeemOutcome, RedeemError> {
        redeem::process(self, redemption)
    }

    fn launch_at(&mut self, event: Box<dyn StageEvent>, time: f64) -> Result<EventId, EventError> {
        let name = event.name();
        let running = self.events.running_ids();
        let claims = self.events.claims().clone();
        let mut ctx = EventContext::new(
            &mut self.world,
            &mut self.brains,
            &mut self.rng,
            &mut self.services,
            &mut self.journal,
            &running,
            time,
            self.config.fixed_dt,
        )
        .with_claims(&claims);
        let result = self.events.launch(event, &mut ctx);
        if let Err(e) = &result {
            tracing::info!(error = %e, name, "event rejected");
            self.journal.record(ArenaEvent::EventRejected {
                name: name.to_owned(),
                reason: e.to_string(),
            });
        }
        result
    }

    // -- simulation -----------------------------------------------------------

    /// Execute one frame.
    pub fn tick(&mut self) {
        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(5);
        let dt = self.config.fixed_dt;
        let next = self.tick_counter + 1;
        let time = next as f64 * dt;
        self.journal.set_tick(next);

        let phase = Instant::now();
        self.update_characters(time, dt);
        system_times.push(("characters".to_owned(), phase.elapsed()));

        let phase = Instant::now();
        self.reap_dead(time);
        system_times.push(("reap".to_owned(), phase.elapsed()));

        let phase = Instant::now();
        self.apply_outbox(time);
        system_times.push(("outbox".to_owned(), phase.elapsed()));

        let phase = Instant::now();
        let running = self.events.running_ids();
        let claims = self.events.claims().clone();
        let mut ctx = EventContext::new(
            &mut self.world,
            &mut self.brains,
            &mut self.rng,
            &mut self.services,
            &mut self.journal,
            &running,
            time,
            dt,
        )
        .with_claims(&claims);
        self.events.update_all(&mut ctx);
        system_times.push(("events".to_owned(), phase.elapsed()));

        let phase = Instant::now();
        self.events.reap_done(&mut self.journal);
        system_times.push(("reap_events".to_owned(), phase.elapsed()));

        self.tick_counter = next;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
        };
    }

    /// Run `count` frames in sequence.
    pub fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    fn update_characters(&mut self, time: f64, dt: f64) {
        let running = self.events.running_ids();
        let stage = self.world.stage().clone();
        for id in self.world.ids() {
            let Some(before) = self.world.get(id).cloned() else {
                continue;
            };
            if before.is_alive() {
                if let Some(brain) = self.brains.get_mut(&id) {
                    let mut ctx = TaskContext::new(
                        &mut self.world,
                        &mut self.rng,
                        &mut self.services,
                        &mut self.outbox,
                        &running,
                        time,
                        dt,
                    );
                    brain.update(id, &mut ctx);
                }
            }
            let stepped = match self.world.get_mut(id) {
                Some(ch) => integrate(ch, dt, &stage),
                None => Ok(()),
            };
            if let Err(e) = stepped {
                tracing::warn!(error = %e, %id, "character update failed, state rolled back");
                self.journal.record(ArenaEvent::Fault {
                    id,
                    details: e.to_string(),
                });
                if let Err(e) = self.world.restore(before) {
                    tracing::warn!(error = %e, %id, "rollback failed");
                }
            }
        }
    }

    fn reap_dead(&mut self, time: f64) {
        let dead: Vec<EntityId> = self
            .world
            .iter()
            .filter(|c| c.is_dead())
            .map(|c| c.id())
            .collect();
        for id in dead {
            let body = match self.world.despawn(id) {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(error = %e, %id, "failed to remove dead character");
                    continue;
                }
            };
            self.brains.remove(&id);
            let reason = body.death_reason().map(str::to_owned);
            tracing::info!(%id, name = body.name(), reason = ?reason, "character died");
            self.journal.record(ArenaEvent::Died {
                id,
                name: body.name().to_owned(),
                reason: reason.clone(),
            });

            if body.is_player() {
                let text = match &reason {
                    Some(reason) => format!("@{} died {reason}", body.name()),
                    None => format!("@{} died", body.name()),
                };
                self.services.announce(&text);
                self.journal.record(ArenaEvent::Announced { text });
            }
            if body.makes_ghost() {
                let ghost = CharacterGhost::new(body.name(), body.position(), body.size());
                if let Err(e) = self.launch_at(Box::new(ghost), time) {
                    tracing::warn!(error = %e, "ghost dropped");
                }
            }
        }
    }

    fn apply_outbox(&mut self, time: f64) {
        let (spawns, events) = self.outbox.take();
        for request in spawns {
            match request {
                SpawnRequest::ConvertedZombie {
                    victim,
                    position,
                    skin,
                } => {
                    let spec = self
                        .world
                        .zombie_spec(&format!("{victim}_zom"))
                        .at(position)
                        .with_skin(&skin);
                    let brain = Brain::zombie(self.config.zombie.hunt_secs);
                    match ai::admit(
                        &mut self.world,
                        &mut self.brains,
                        &mut self.journal,
                        &mut self.rng,
                        spec,
                        brain,
                    ) {
                        Ok(zombie) => {
                            tracing::info!(%victim, %zombie, "viewer rose as a zombie");
                            self.journal.record(ArenaEvent::Converted { victim, zombie });
                        }
                        Err(e) => tracing::warn!(error = %e, %victim, "conversion failed"),
                    }
                }
            }
        }
        for event in events {
            if let Err(e) = self.launch_at(event, time) {
                tracing::warn!(error = %e, "requested event dropped");
            }
        }
    }

    // -- accessors ------------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds, `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// Seconds per frame.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// The configuration the arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Read-only access to the registry.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the registry, for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Running events.
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Mutable event list, e.g. to cancel an event.
    pub fn events_mut(&mut self) -> &mut EventManager {
        &mut self.events
    }

    /// Ids of events that have not finished.
    pub fn running_events(&self) -> BTreeSet<EventId> {
        self.events.running_ids()
    }

    /// The journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// The journal, for draining.
    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    /// The collaborators.
    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
