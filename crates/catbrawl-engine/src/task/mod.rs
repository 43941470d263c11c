//! Tasks: the units of autonomous behavior a character's queue runs.
//!
//! A [`Task`] is ticked once per frame while it is the head of its queue and
//! reports a [`TaskState`]. `InProgress` is the only way to yield: the next
//! frame resumes the same instance with whatever state it keeps in its own
//! fields. `Done` and `Failed` are terminal; the queue pops the task and never
//! ticks that instance again.
//!
//! # Composition
//!
//! Composite tasks ([`GoAndKill`], [`DefendFromZombies`], [`IdleWalk`]) own
//! their sub-tasks inside an explicit step enum. Switching sub-task is an
//! internal transition of the composite and is invisible to the queue.
//!
//! # Flags
//!
//! | flag | meaning |
//! |------|---------|
//! | `blocking` | viewer actions must not interrupt the task |
//! | `endless` | never completes on its own; must be replaced |
//! | `skippable` | may be dropped in favor of a new request |
//!
//! The queue does not enforce these; controllers check them before mutating.
//!
//! # Timeouts
//!
//! A task may carry an absolute simulation-clock deadline. Once the frame time
//! passes it, [`Task::tick`] reports `Failed` without ticking the behavior.

use std::collections::BTreeSet;

use catbrawl_world::entity::EntityId;
use catbrawl_world::geometry::Point;
use catbrawl_world::world::World;
use rand_pcg::Pcg64;

use crate::event::EventId;
use crate::outbox::Outbox;
use crate::services::Services;

mod combat;
mod movement;
mod social;

pub use combat::{DefendFromZombies, DefendStep, FindTarget, GoAndKill, HitWithFist, KillStep, TargetFilter};
pub use movement::{GoTo, GoToPerson, IdleStep, IdleWalk};
pub use social::{Cheer, GoAndKick, GoAndKiss};

// ---------------------------------------------------------------------------
// TaskState
// ---------------------------------------------------------------------------

/// Result of one task tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// The task reached its goal.
    Done,
    /// Still working; tick again next frame.
    InProgress,
    /// The task gave up.
    Failed,
}

impl TaskState {
    /// Whether the queue must pop the task.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::InProgress)
    }
}

// ---------------------------------------------------------------------------
// TaskContext
// ---------------------------------------------------------------------------

/// Everything a task may read or touch during one tick.
pub struct TaskContext<'a> {
    /// The character registry.
    pub world: &'a mut World,
    /// The arena's random stream.
    pub rng: &'a mut Pcg64,
    /// Chat, prediction and sound collaborators.
    pub services: &'a mut Services,
    /// Deferred spawns and event launches.
    pub outbox: &'a mut Outbox,
    /// Ids of events that have not finished yet.
    pub running_events: &'a BTreeSet<EventId>,
    /// Simulation clock at this frame.
    pub time: f64,
    /// Frame step.
    pub dt: f64,
    follow_ups: Vec<Task>,
}

impl<'a> TaskContext<'a> {
    /// Bundle the per-frame borrows.
    pub fn new(
        world: &'a mut World,
        rng: &'a mut Pcg64,
        services: &'a mut Services,
        outbox: &'a mut Outbox,
        running_events: &'a BTreeSet<EventId>,
        time: f64,
        dt: f64,
    ) -> Self {
        Self {
            world,
            rng,
            services,
            outbox,
            running_events,
            time,
            dt,
            follow_ups: Vec::new(),
        }
    }

    /// Append `task` to the acting character's queue once the tick returns.
    pub fn enqueue_follow_up(&mut self, task: Task) {
        self.follow_ups.push(task);
    }

    /// Take the follow-ups posted so far.
    pub(crate) fn take_follow_ups(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.follow_ups)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Capability flags of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFlags {
    /// Viewer actions must not interrupt this task.
    pub blocking: bool,
    /// The task never completes on its own.
    pub endless: bool,
    /// The task may be dropped for a new request.
    pub skippable: bool,
}

/// The behavior a task runs.
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Walk to a fixed point.
    GoTo(GoTo),
    /// Stand still forever.
    DoNothing,
    /// Wander around the stage.
    IdleWalk(IdleWalk),
    /// Walk up to another character.
    GoToPerson(GoToPerson),
    /// Punch once.
    HitWithFist(HitWithFist),
    /// Chase and punch until the target dies.
    GoAndKill(GoAndKill),
    /// Pick the nearest matching character.
    FindTarget(FindTarget),
    /// Hunt zombies until none are left.
    DefendFromZombies(DefendFromZombies),
    /// Jump around while an event runs.
    Cheer(Cheer),
    /// Walk up to someone and kick them.
    GoAndKick(GoAndKick),
    /// Walk up to someone and kiss them.
    GoAndKiss(GoAndKiss),
}

impl TaskKind {
    /// Stable identifier.
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::GoTo(_) => "go_to",
            TaskKind::DoNothing => "do_nothing",
            TaskKind::IdleWalk(_) => "idle_walk",
            TaskKind::GoToPerson(_) => "go_to_person",
            TaskKind::HitWithFist(_) => "hit_with_fist",
            TaskKind::GoAndKill(_) => "kill",
            TaskKind::FindTarget(_) => "find_target",
            TaskKind::DefendFromZombies(_) => "defend_from_zombies",
            TaskKind::Cheer(_) => "cheer",
            TaskKind::GoAndKick(_) => "go_and_kick",
            TaskKind::GoAndKiss(_) => "go_and_kiss",
        }
    }

    /// Text shown to viewers.
    pub fn verbal_name(&self) -> &'static str {
        match self {
            TaskKind::GoTo(_) => "walking somewhere",
            TaskKind::DoNothing => "resting",
            TaskKind::IdleWalk(_) => "wandering around",
            TaskKind::GoToPerson(_) => "following someone",
            TaskKind::HitWithFist(_) => "punching",
            TaskKind::GoAndKill(_) => "fighting",
            TaskKind::FindTarget(_) => "looking around",
            TaskKind::DefendFromZombies(_) => "defending from zombies",
            TaskKind::Cheer(_) => "cheering",
            TaskKind::GoAndKick(_) => "kicking someone",
            TaskKind::GoAndKiss(_) => "kissing someone",
        }
    }

    fn default_flags(&self) -> TaskFlags {
        match self {
            TaskKind::IdleWalk(_) | TaskKind::DoNothing => TaskFlags {
                endless: true,
                skippable: true,
                ..TaskFlags::default()
            },
            TaskKind::Cheer(_) => TaskFlags {
                endless: true,
                ..TaskFlags::default()
            },
            _ => TaskFlags::default(),
        }
    }

    /// Run one tick of the behavior.
    pub fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        match self {
            TaskKind::GoTo(t) => t.tick(actor, ctx),
            TaskKind::DoNothing => {
                if ctx.world.contains(actor) {
                    TaskState::InProgress
                } else {
                    TaskState::Failed
                }
            }
            TaskKind::IdleWalk(t) => t.tick(actor, ctx),
            TaskKind::GoToPerson(t) => t.tick(actor, ctx),
            TaskKind::HitWithFist(t) => t.tick(actor, ctx),
            TaskKind::GoAndKill(t) => t.tick(actor, ctx),
            TaskKind::FindTarget(t) => t.tick(actor, ctx),
            TaskKind::DefendFromZombies(t) => t.tick(actor, ctx),
            TaskKind::Cheer(t) => t.tick(actor, ctx),
            TaskKind::GoAndKick(t) => t.tick(actor, ctx),
            TaskKind::GoAndKiss(t) => t.tick(actor, ctx),
        }
    }
}

/// A queued unit of behavior with its flags and optional deadline.
#[derive(Debug, Clone)]
pub struct Task {
    kind: TaskKind,
    flags: TaskFlags,
    timeout: Option<f64>,
}

impl From<TaskKind> for Task {
    fn from(kind: TaskKind) -> Self {
        let flags = kind.default_flags();
        Self {
            kind,
            flags,
            timeout: None,
        }
    }
}

impl Task {
    // -- constructors ---------------------------------------------------------

    /// Walk to `target`.
    pub fn go_to(target: Point) -> Self {
        TaskKind::GoTo(GoTo::new(target)).into()
    }

    /// Walk to `target`, then face `look_direction`.
    pub fn go_to_facing(target: Point, look_direction: i8) -> Self {
        TaskKind::GoTo(GoTo::new(target).facing(look_direction)).into()
    }

    /// Stand still until replaced.
    pub fn do_nothing() -> Self {
        TaskKind::DoNothing.into()
    }

    /// Wander around until replaced.
    pub fn idle_walk() -> Self {
        TaskKind::IdleWalk(IdleWalk::new()).into()
    }

    /// Wander around until the first internal timeout, then report Done.
    pub fn idle_walk_once() -> Self {
        TaskKind::IdleWalk(IdleWalk::stop_on_timeout()).into()
    }

    /// Walk up to `target`.
    pub fn go_to_person(target: EntityId, wait_for_flying_person: bool) -> Self {
        TaskKind::GoToPerson(GoToPerson::new(target, wait_for_flying_person)).into()
    }

    /// Punch `target` once.
    pub fn hit_with_fist(target: EntityId) -> Self {
        TaskKind::HitWithFist(HitWithFist::new(target)).into()
    }

    /// Chase and punch `target` until it dies.
    pub fn go_and_kill(target: EntityId) -> Self {
        TaskKind::GoAndKill(GoAndKill::new(target)).into()
    }

    /// Pick the nearest character accepted by `filter`.
    pub fn find_target(filter: TargetFilter) -> Self {
        TaskKind::FindTarget(FindTarget::new(filter)).into()
    }

    /// Hunt zombies; engagements last a random time within `engage_secs`.
    pub fn defend_from_zombies(engage_secs: (f64, f64)) -> Self {
        TaskKind::DefendFromZombies(DefendFromZombies::new(engage_secs)).into()
    }

    /// Cheer while `event` runs, facing `look_direction`.
    pub fn cheer(event: EventId, look_direction: i8, jump_velocity: f64) -> Self {
        TaskKind::Cheer(Cheer::new(event, look_direction, jump_velocity)).into()
    }

    /// Walk up to `target` and kick them with `kick_velocity`.
    pub fn go_and_kick(target: EntityId, kick_velocity: f64) -> Self {
        TaskKind::GoAndKick(GoAndKick::new(target, kick_velocity)).into()
    }

    /// Walk up to `target` and kiss them.
    pub fn go_and_kiss(target: EntityId) -> Self {
        TaskKind::GoAndKiss(GoAndKiss::new(target)).into()
    }

    // -- builders -------------------------------------------------------------

    /// Mark the task as blocking viewer actions.
    pub fn blocking(mut self) -> Self {
        self.flags.blocking = true;
        self
    }

    /// Fail the task once the clock passes `deadline`.
    pub fn with_timeout(mut self, deadline: f64) -> Self {
        self.timeout = Some(deadline);
        self
    }

    // -- accessors ------------------------------------------------------------

    /// Stable identifier.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Text shown to viewers.
    pub fn verbal_name(&self) -> &'static str {
        self.kind.verbal_name()
    }

    /// Capability flags.
    pub fn flags(&self) -> TaskFlags {
        self.flags
    }

    /// Whether viewer actions must not interrupt this task.
    pub fn is_blocking(&self) -> bool {
        self.flags.blocking
    }

    /// Whether the task never completes on its own.
    pub fn is_endless(&self) -> bool {
        self.flags.endless
    }

    /// Whether the task may be dropped for a new request.
    pub fn is_skippable(&self) -> bool {
        self.flags.skippable
    }

    /// Absolute deadline, if any.
    pub fn timeout(&self) -> Option<f64> {
        self.timeout
    }

    /// The behavior.
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// The target a finished [`FindTarget`] picked.
    pub fn found_target(&self) -> Option<EntityId> {
        match &self.kind {
            TaskKind::FindTarget(t) => t.found_target(),
            _ => None,
        }
    }

    /// Run one tick.
    pub fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        if self.timeout.is_some_and(|deadline| ctx.time > deadline) {
            tracing::trace!(%actor, task = self.name(), "task timed out");
            return TaskState::Failed;
        }
        self.kind.tick(actor, ctx)
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::testing::Bench;
    use super::*;

    #[test]
    fn default_flags_follow_kind() {
        let walk = Task::idle_walk();
        assert!(walk.is_endless() && walk.is_skippable() && !walk.is_blocking());

        let cheer = Task::cheer(EventId::new(1), 1, 200.0);
        assert!(cheer.is_endless() && !cheer.is_skippable());

        let go = Task::go_to(Point::new(1.0, 1.0)).blocking();
        assert!(go.is_blocking() && !go.is_endless() && !go.is_skippable());
        assert_eq!(go.name(), "go_to");
    }

    #[test]
    fn expired_timeout_fails_without_ticking() {
        let mut bench = Bench::new();
        let me = bench.viewer("me", 100.0);
        bench.time = 5.0;
        let mut task = Task::go_to(Point::new(1500.0, 265.0)).with_timeout(4.0);
        assert_eq!(task.tick(me, &mut bench.ctx()), TaskState::Failed);
        assert_eq!(bench.world.get(me).unwrap().move_direction(), 0);
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::Done.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::InProgress.is_terminal());
    }

    #[test]
    fn do_nothing_fails_for_missing_actor() {
        let mut bench = Bench::new();
        let me = bench.viewer("me", 100.0);
        bench.world.despawn(me).unwrap();
        assert_eq!(Task::do_nothing().tick(me, &mut bench.ctx()), TaskState::Failed);
    }
}
