//! Per-character task queues and the policies that feed them.
//!
//! Every character in the arena owns exactly one [`Brain`]: a FIFO
//! [`TaskQueue`] plus a [`Policy`] deciding what happens when the queue runs
//! dry or a task finishes. Player brains are passive; their queues are filled
//! by events and redemptions. Zombie brains run their own hunt loop, tracked
//! by an explicit [`HuntPhase`].
//!
//! # Queue discipline
//!
//! Only the head task is ticked. A terminal result pops it, so a finished task
//! is never ticked again. Priority is expressed by callers with
//! [`TaskQueue::clear`] followed by [`TaskQueue::add_task`]; the queue itself
//! never reorders.

use std::collections::{BTreeMap, VecDeque};

use catbrawl_world::character::CharacterSpec;
use catbrawl_world::entity::EntityId;
use catbrawl_world::world::World;
use catbrawl_world::WorldError;
use rand::Rng;

use crate::journal::{ArenaEvent, Journal};
use crate::outbox::SpawnRequest;
use crate::task::{TargetFilter, Task, TaskContext, TaskState};

// ---------------------------------------------------------------------------
// TaskQueue
// ---------------------------------------------------------------------------

/// Outcome of one queue update.
#[derive(Debug)]
pub struct QueueTick {
    /// What the head task reported.
    pub state: TaskState,
    /// The popped task, when `state` was terminal.
    pub finished: Option<Task>,
}

/// Ordered tasks of one character.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task at the back.
    pub fn add_task(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// The head task.
    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.front()
    }

    /// Mutable head task.
    pub fn current_task_mut(&mut self) -> Option<&mut Task> {
        self.tasks.front_mut()
    }

    /// Drop the head task without ticking it.
    pub fn finish_current_task(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Discard every task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Append an endless idle walk.
    pub fn run_idle_walking(&mut self) {
        self.add_task(Task::idle_walk());
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate queued tasks, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Tick the head task, pop it on a terminal result, then append any
    /// follow-ups it posted. Returns `None` for an empty queue.
    pub fn update(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> Option<QueueTick> {
        let head = self.tasks.front_mut()?;
        let state = head.tick(actor, ctx);
        let finished = if state.is_terminal() {
            tracing::trace!(%actor, task = head.name(), ?state, "task finished");
            self.tasks.pop_front()
        } else {
            None
        };
        self.tasks.extend(ctx.take_follow_ups());
        Some(QueueTick { state, finished })
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Where a zombie is in its hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntPhase {
    /// Looking for the nearest living viewer.
    Searching,
    /// Nobody to hunt; wandering before the next search.
    Roaming,
    /// Chasing one victim.
    Fighting { victim: EntityId },
}

/// Zombie hunt loop state.
#[derive(Debug, Clone, PartialEq)]
pub struct ZombieHunt {
    phase: HuntPhase,
    hunt_secs: f64,
}

impl ZombieHunt {
    /// A hunt that gives up on a victim after `hunt_secs`.
    pub fn new(hunt_secs: f64) -> Self {
        Self {
            phase: HuntPhase::Searching,
            hunt_secs,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> HuntPhase {
        self.phase
    }
}

/// What drives a brain besides its queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    /// Runs whatever was queued, nothing more.
    Player,
    /// Hunts viewers and converts them.
    Zombie(ZombieHunt),
}

// ---------------------------------------------------------------------------
// Brain
// ---------------------------------------------------------------------------

/// Queue plus policy of one character.
#[derive(Debug, Clone)]
pub struct Brain {
    queue: TaskQueue,
    policy: Policy,
}

impl Brain {
    /// A passive brain with an empty queue.
    pub fn player() -> Self {
        Self {
            queue: TaskQueue::new(),
            policy: Policy::Player,
        }
    }

    /// A hunting brain.
    pub fn zombie(hunt_secs: f64) -> Self {
        Self {
            queue: TaskQueue::new(),
            policy: Policy::Zombie(ZombieHunt::new(hunt_secs)),
        }
    }

    /// Whether events and redemptions may redirect this brain.
    pub fn is_player(&self) -> bool {
        matches!(self.policy, Policy::Player)
    }

    /// The task queue.
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Mutable task queue.
    pub fn queue_mut(&mut self) -> &mut TaskQueue {
        &mut self.queue
    }

    /// The policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Hunt phase, for zombie brains.
    pub fn hunt_phase(&self) -> Option<HuntPhase> {
        match &self.policy {
            Policy::Zombie(hunt) => Some(hunt.phase),
            Policy::Player => None,
        }
    }

    /// Run one frame of behavior. Returns what the head task reported, or
    /// `None` if nothing was ticked.
    pub fn update(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> Option<TaskState> {
        match &mut self.policy {
            Policy::Player => self.queue.update(actor, ctx).map(|t| t.state),
            Policy::Zombie(hunt) => hunt.update(&mut self.queue, actor, ctx),
        }
    }
}

impl ZombieHunt {
    fn update(
        &mut self,
        queue: &mut TaskQueue,
        actor: EntityId,
        ctx: &mut TaskContext<'_>,
    ) -> Option<TaskState> {
        if queue.is_empty() {
            queue.add_task(Task::find_target(TargetFilter::Victims));
            self.phase = HuntPhase::Searching;
            return None;
        }
        let QueueTick { state, finished } = queue.update(actor, ctx)?;
        if state == TaskState::InProgress {
            return Some(state);
        }

        match (self.phase, state) {
            (HuntPhase::Searching, TaskState::Done) => {
                match finished.as_ref().and_then(Task::found_target) {
                    Some(victim) => {
                        let deadline = ctx.time + self.hunt_secs;
                        queue.add_task(Task::go_and_kill(victim).with_timeout(deadline));
                        self.phase = HuntPhase::Fighting { victim };
                    }
                    None => self.roam(queue),
                }
            }
            (HuntPhase::Searching, _) => self.roam(queue),
            (HuntPhase::Roaming, _) => {
                if queue.is_empty() {
                    queue.add_task(Task::find_target(TargetFilter::Victims));
                }
                self.phase = HuntPhase::Searching;
            }
            (HuntPhase::Fighting { victim }, TaskState::Done) => {
                if let (Some(corpse), Some(zombie)) = (ctx.world.get(victim), ctx.world.get(actor)) {
                    if corpse.is_player() {
                        tracing::debug!(victim = corpse.name(), zombie = zombie.name(), "victim will rise");
                        ctx.outbox.request_spawn(SpawnRequest::ConvertedZombie {
                            victim: corpse.name().to_owned(),
                            position: corpse.position(),
                            skin: corpse.skin().to_owned(),
                        });
                    }
                }
                queue.clear();
                self.phase = HuntPhase::Searching;
            }
            (HuntPhase::Fighting { .. }, _) => {
                queue.clear();
                self.phase = HuntPhase::Searching;
            }
        }
        Some(state)
    }

    fn roam(&mut self, queue: &mut TaskQueue) {
        queue.clear();
        queue.add_task(Task::idle_walk_once());
        queue.add_task(Task::find_target(TargetFilter::Victims));
        self.phase = HuntPhase::Roaming;
    }
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Spawn a character, give it a brain and journal the arrival.
pub(crate) fn admit<R: Rng + ?Sized>(
    world: &mut World,
    brains: &mut BTreeMap<EntityId, Brain>,
    journal: &mut Journal,
    rng: &mut R,
    spec: CharacterSpec,
    brain: Brain,
) -> Result<EntityId, WorldError> {
    let faction = spec.faction;
    let id = world.spawn(spec, rng)?;
    let name = world.get(id).map(|c| c.name().to_owned()).unwrap_or_default();
    brains.insert(id, brain);
    journal.record(ArenaEvent::Spawned { id, name, faction });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::Bench;
    use catbrawl_world::geometry::Point;

    #[test]
    fn update_pops_terminal_head_and_keeps_order() {
        let mut bench = Bench::new();
        let me = bench.viewer("me", 100.0);
        let mut queue = TaskQueue::new();
        queue.add_task(Task::go_to(Point::new(120.0, 265.0)));
        queue.add_task(Task::do_nothing());

        let tick = queue.update(me, &mut bench.ctx()).unwrap();
        assert_eq!(tick.state, TaskState::Done);
        assert_eq!(tick.finished.unwrap().name(), "go_to");
        assert_eq!(queue.current_task().unwrap().name(), "do_nothing");

        let tick = queue.update(me, &mut bench.ctx()).unwrap();
        assert_eq!(tick.state, TaskState::InProgress);
        assert!(tick.finished.is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn empty_queue_reports_nothing() {
        let mut bench = Bench::new();
        let me = bench.viewer("me", 100.0);
        assert!(TaskQueue::new().update(me, &mut bench.ctx()).is_none());
    }

    #[test]
    fn cleared_queue_has_no_current_task() {
        let mut queue = TaskQueue::new();
        queue.add_task(Task::idle_walk());
        queue.add_task(Task::do_nothing());
        queue.clear();
        assert!(queue.current_task().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn follow_ups_are_appended_after_the_tick() {
        let mut bench = Bench::new();
        let me = bench.boxer("me", 100.0, 10.0, 0.0);
        let mut queue = TaskQueue::new();
        queue.add_task(Task::defend_from_zombies((5.0, 10.0)));

        let tick = queue.update(me, &mut bench.ctx()).unwrap();
        assert_eq!(tick.state, TaskState::Done);
        assert_eq!(queue.current_task().unwrap().name(), "idle_walk");
    }

    #[test]
    fn zombie_seeds_search_on_empty_queue() {
        let mut bench = Bench::new();
        let zombie = bench.zombie("z", 100.0);
        let mut brain = Brain::zombie(5.0);
        assert_eq!(brain.update(zombie, &mut bench.ctx()), None);
        assert_eq!(brain.queue().current_task().unwrap().name(), "find_target");
        assert_eq!(brain.hunt_phase(), Some(HuntPhase::Searching));
    }

    #[test]
    fn zombie_roams_when_nobody_is_around() {
        let mut bench = Bench::new();
        let zombie = bench.zombie("z", 100.0);
        let mut brain = Brain::zombie(5.0);
        brain.update(zombie, &mut bench.ctx());
        assert_eq!(brain.update(zombie, &mut bench.ctx()), Some(TaskState::Failed));
        assert_eq!(brain.hunt_phase(), Some(HuntPhase::Roaming));
        let names: Vec<_> = brain.queue().iter().map(Task::name).collect();
        assert_eq!(names, vec!["idle_walk", "find_target"]);
    }

    #[test]
    fn zombie_hunts_with_a_deadline() {
        let mut bench = Bench::new();
        let zombie = bench.zombie("z", 100.0);
        let victim = bench.viewer("victim", 900.0);
        bench.time = 2.0;
        let mut brain = Brain::zombie(5.0);
        brain.update(zombie, &mut bench.ctx());
        assert_eq!(brain.update(zombie, &mut bench.ctx()), Some(TaskState::Done));
        assert_eq!(brain.hunt_phase(), Some(HuntPhase::Fighting { victim }));
        let head = brain.queue().current_task().unwrap();
        assert_eq!(head.name(), "kill");
        assert_eq!(head.timeout(), Some(7.0));
    }

    #[test]
    fn zombie_restarts_after_timeout() {
        let mut bench = Bench::new();
        let zombie = bench.zombie("z", 100.0);
        bench.viewer("victim", 1500.0);
        let mut brain = Brain::zombie(1.0);
        brain.update(zombie, &mut bench.ctx());
        brain.update(zombie, &mut bench.ctx());
        bench.time = 5.0;
        assert_eq!(brain.update(zombie, &mut bench.ctx()), Some(TaskState::Failed));
        assert!(brain.queue().is_empty());
        assert_eq!(brain.hunt_phase(), Some(HuntPhase::Searching));
    }

    #[test]
    fn zombie_kill_requests_conversion() {
        let mut bench = Bench::new();
        let zombie = bench.zombie("z", 100.0);
        let victim = bench.viewer("victim", 120.0);
        bench.world.get_mut(victim).unwrap().damage(95.0, "test");
        let mut brain = Brain::zombie(5.0);
        brain.update(zombie, &mut bench.ctx());
        brain.update(zombie, &mut bench.ctx());

        let mut converted = false;
        for _ in 0..50 {
            brain.update(zombie, &mut bench.ctx());
            if !bench.outbox.spawns().is_empty() {
                converted = true;
                break;
            }
            bench.step_physics();
        }
        assert!(converted);
        match &bench.outbox.spawns()[0] {
            SpawnRequest::ConvertedZombie { victim, skin, .. } => {
                assert_eq!(victim, "victim");
                assert_eq!(skin, "cat");
            }
        }
        assert!(brain.queue().is_empty());
    }
}
