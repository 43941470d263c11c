//! Walking tasks: fixed destinations, other characters, and idle wandering.

use catbrawl_world::entity::EntityId;
use catbrawl_world::geometry::Point;
use rand::Rng;

use super::{TaskContext, TaskState};

/// Seconds an idle sub-step lasts before a new one is picked.
const IDLE_STEP_SECS: (f64, f64) = (3.0, 10.0);

// ---------------------------------------------------------------------------
// GoTo
// ---------------------------------------------------------------------------

/// Walk until the character's box contains a fixed point.
///
/// While airborne the task only waits; physics owns the body until it lands.
#[derive(Debug, Clone, PartialEq)]
pub struct GoTo {
    target: Point,
    look_direction: Option<i8>,
}

impl GoTo {
    /// Walk to `target`.
    pub fn new(target: Point) -> Self {
        Self {
            target,
            look_direction: None,
        }
    }

    /// Face `direction` on arrival.
    pub fn facing(mut self, direction: i8) -> Self {
        self.look_direction = Some(direction);
        self
    }

    /// Destination.
    pub fn target(&self) -> Point {
        self.target
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        let Some(ch) = ctx.world.get_mut(actor) else {
            return TaskState::Failed;
        };
        if ch.is_falling() {
            return TaskState::InProgress;
        }
        if ch.on_position(self.target) {
            ch.stop();
            if let Some(direction) = self.look_direction {
                ch.set_look_direction(f64::from(direction));
            }
            return TaskState::Done;
        }
        ch.walk_towards(self.target.x);
        TaskState::InProgress
    }
}

// ---------------------------------------------------------------------------
// IdleWalk
// ---------------------------------------------------------------------------

/// What an idle wanderer is doing right now.
#[derive(Debug, Clone, PartialEq)]
pub enum IdleStep {
    /// Walking to a random spot on the floor.
    Walk(GoTo),
    /// Standing still.
    Rest,
}

/// Alternate between random walks and rests, forever.
///
/// Each sub-step runs until it completes or a random 3-10 s timeout passes,
/// then a new one is drawn. In stop-on-timeout mode the first deadline is
/// never re-armed and ends the task with `Done`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleWalk {
    step: Option<IdleStep>,
    deadline: f64,
    stop_on_timeout: bool,
}

impl Default for IdleWalk {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleWalk {
    /// Wander until replaced.
    pub fn new() -> Self {
        Self {
            step: None,
            deadline: 0.0,
            stop_on_timeout: false,
        }
    }

    /// Wander until the first timeout.
    pub fn stop_on_timeout() -> Self {
        Self {
            stop_on_timeout: true,
            ..Self::new()
        }
    }

    /// Current sub-step, if one has been drawn.
    pub fn step(&self) -> Option<&IdleStep> {
        self.step.as_ref()
    }

    /// When the current sub-step expires.
    pub fn deadline(&self) -> f64 {
        self.deadline
    }

    fn reseed(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>, rearm: bool) {
        if rearm {
            self.deadline = ctx.time + ctx.rng.gen_range(IDLE_STEP_SECS.0..=IDLE_STEP_SECS.1);
        }
        self.step = if ctx.rng.gen_bool(0.5) {
            let spot = ctx.world.stage().floor_point(ctx.rng.gen_range(0.05..0.95));
            Some(IdleStep::Walk(GoTo::new(spot)))
        } else {
            if let Some(ch) = ctx.world.get_mut(actor) {
                ch.stop();
            }
            Some(IdleStep::Rest)
        };
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        if !ctx.world.contains(actor) {
            return TaskState::Failed;
        }
        if self.step.is_none() {
            self.reseed(actor, ctx, true);
        } else if ctx.time > self.deadline {
            if self.stop_on_timeout {
                if let Some(ch) = ctx.world.get_mut(actor) {
                    ch.stop();
                }
                return TaskState::Done;
            }
            self.reseed(actor, ctx, true);
        }

        let state = match self.step.as_mut() {
            Some(IdleStep::Walk(go)) => go.tick(actor, ctx),
            Some(IdleStep::Rest) | None => TaskState::InProgress,
        };
        match state {
            TaskState::Failed => TaskState::Failed,
            TaskState::Done => {
                let rearm = !self.stop_on_timeout;
                self.reseed(actor, ctx, rearm);
                TaskState::InProgress
            }
            TaskState::InProgress => TaskState::InProgress,
        }
    }
}

// ---------------------------------------------------------------------------
// GoToPerson
// ---------------------------------------------------------------------------

/// Walk until the character's box overlaps a moving target's box.
#[derive(Debug, Clone, PartialEq)]
pub struct GoToPerson {
    target: EntityId,
    wait_for_flying_person: bool,
}

impl GoToPerson {
    /// Follow `target`. When it flies directly overhead, either wait for it
    /// to land or give up.
    pub fn new(target: EntityId, wait_for_flying_person: bool) -> Self {
        Self {
            target,
            wait_for_flying_person,
        }
    }

    /// Who is being followed.
    pub fn target(&self) -> EntityId {
        self.target
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        let Some(target) = ctx.world.get(self.target).filter(|t| t.is_alive()) else {
            return TaskState::Failed;
        };
        let target_rect = target.rect();
        let target_center = target.center();
        let target_falling = target.is_falling();

        let Some(ch) = ctx.world.get_mut(actor) else {
            return TaskState::Failed;
        };
        if ch.is_falling() {
            return TaskState::InProgress;
        }
        if ch.rect().intersects(&target_rect) {
            ch.stop();
            ch.set_look_direction(target_center.x - ch.center().x);
            return TaskState::Done;
        }
        if target_falling && ch.rect().spans_x(target_center.x) {
            if !self.wait_for_flying_person {
                return TaskState::Failed;
            }
            ch.stop();
            return TaskState::InProgress;
        }
        ch.walk_towards(target_center.x);
        TaskState::InProgress
    }
}
