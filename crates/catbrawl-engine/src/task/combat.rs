//! Fighting tasks: sensing, single punches, and the composite combat loops.

use catbrawl_world::character::Character;
use catbrawl_world::entity::EntityId;
use rand::Rng;

use super::movement::GoToPerson;
use super::{Task, TaskContext, TaskState};
use crate::event::HitSpark;
use crate::services::SoundCue;

// ---------------------------------------------------------------------------
// FindTarget
// ---------------------------------------------------------------------------

/// Which characters a [`FindTarget`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFilter {
    /// Living zombies.
    Zombies,
    /// Living non-zombies.
    Victims,
}

impl TargetFilter {
    /// Whether `ch` matches.
    pub fn accepts(self, ch: &Character) -> bool {
        match self {
            TargetFilter::Zombies => ch.is_zombie() && ch.is_alive(),
            TargetFilter::Victims => !ch.is_zombie() && ch.is_alive(),
        }
    }
}

/// Single-shot scan for the nearest matching character.
#[derive(Debug, Clone, PartialEq)]
pub struct FindTarget {
    filter: TargetFilter,
    found: Option<EntityId>,
}

impl FindTarget {
    /// Look for characters accepted by `filter`.
    pub fn new(filter: TargetFilter) -> Self {
        Self {
            filter,
            found: None,
        }
    }

    /// The picked target, once the task reported `Done`.
    pub fn found_target(&self) -> Option<EntityId> {
        self.found
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        let filter = self.filter;
        self.found = ctx.world.nearest(actor, |c| filter.accepts(c));
        match self.found {
            Some(_) => TaskState::Done,
            None => TaskState::Failed,
        }
    }
}

// ---------------------------------------------------------------------------
// HitWithFist
// ---------------------------------------------------------------------------

/// One fist swing: `Done` if it landed, `Failed` otherwise. Never waits.
#[derive(Debug, Clone, PartialEq)]
pub struct HitWithFist {
    target: EntityId,
}

impl HitWithFist {
    /// Punch `target`.
    pub fn new(target: EntityId) -> Self {
        Self { target }
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        match ctx.world.strike(actor, self.target, ctx.rng) {
            Ok(report) => {
                tracing::trace!(%actor, target = %self.target, ?report, "punch landed");
                ctx.services.play(SoundCue::Punch);
                if let Some(victim) = ctx.world.get(self.target) {
                    let facing = ctx.world.get(actor).map_or(1, |a| a.look_direction());
                    let spark = HitSpark::new(victim.center(), facing);
                    ctx.outbox.request_event(Box::new(spark));
                }
                TaskState::Done
            }
            Err(refusal) => {
                tracing::trace!(%actor, target = %self.target, ?refusal, "punch refused");
                TaskState::Failed
            }
        }
    }
}

// ---------------------------------------------------------------------------
// GoAndKill
// ---------------------------------------------------------------------------

/// Sub-step of a [`GoAndKill`].
#[derive(Debug, Clone, PartialEq)]
pub enum KillStep {
    /// Closing in on the target.
    Approach(GoToPerson),
    /// In reach; swinging.
    Strike(HitWithFist),
}

/// Approach and punch until the target dies.
///
/// There is no retry bound: a missed or refused punch goes back to
/// approaching, and the loop ends only when the target dies or the task is
/// replaced or times out.
#[derive(Debug, Clone, PartialEq)]
pub struct GoAndKill {
    target: EntityId,
    step: KillStep,
}

impl GoAndKill {
    /// Hunt `target` down.
    pub fn new(target: EntityId) -> Self {
        Self {
            target,
            step: KillStep::Approach(GoToPerson::new(target, true)),
        }
    }

    /// The victim.
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Current sub-step.
    pub fn step(&self) -> &KillStep {
        &self.step
    }

    fn approach(&mut self) {
        self.step = KillStep::Approach(GoToPerson::new(self.target, true));
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        if !ctx.world.is_alive(self.target) {
            return TaskState::Failed;
        }
        if let KillStep::Approach(go) = &mut self.step {
            match go.tick(actor, ctx) {
                TaskState::Done => self.step = KillStep::Strike(HitWithFist::new(self.target)),
                other => return other,
            }
        }
        let KillStep::Strike(hit) = &mut self.step else {
            return TaskState::InProgress;
        };
        match hit.tick(actor, ctx) {
            TaskState::Done if !ctx.world.is_alive(self.target) => TaskState::Done,
            _ => {
                self.approach();
                TaskState::InProgress
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DefendFromZombies
// ---------------------------------------------------------------------------

/// Sub-step of a [`DefendFromZombies`].
#[derive(Debug, Clone, PartialEq)]
pub enum DefendStep {
    /// Looking for the nearest zombie.
    Searching(FindTarget),
    /// Fighting one zombie until `deadline`.
    Engaging { kill: GoAndKill, deadline: f64 },
}

/// Fight zombies until none are left, then go back to wandering.
#[derive(Debug, Clone, PartialEq)]
pub struct DefendFromZombies {
    step: DefendStep,
    engage_secs: (f64, f64),
}

impl DefendFromZombies {
    /// Each engagement lasts a random time within `engage_secs`.
    pub fn new(engage_secs: (f64, f64)) -> Self {
        Self {
            step: DefendStep::Searching(FindTarget::new(TargetFilter::Zombies)),
            engage_secs,
        }
    }

    /// Current sub-step.
    pub fn step(&self) -> &DefendStep {
        &self.step
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        match &mut self.step {
            DefendStep::Searching(find) => match find.tick(actor, ctx) {
                TaskState::Done => {
                    let Some(zombie) = find.found_target() else {
                        return TaskState::InProgress;
                    };
                    let (low, high) = self.engage_secs;
                    let secs = if low < high { ctx.rng.gen_range(low..=high) } else { low };
                    self.step = DefendStep::Engaging {
                        kill: GoAndKill::new(zombie),
                        deadline: ctx.time + secs,
                    };
                    TaskState::InProgress
                }
                TaskState::Failed => {
                    ctx.enqueue_follow_up(Task::idle_walk());
                    TaskState::Done
                }
                TaskState::InProgress => TaskState::InProgress,
            },
            DefendStep::Engaging { kill, deadline } => {
                let expired = ctx.time > *deadline;
                if kill.tick(actor, ctx) != TaskState::InProgress || expired {
                    self.step = DefendStep::Searching(FindTarget::new(TargetFilter::Zombies));
                }
                TaskState::InProgress
            }
        }
    }
}
