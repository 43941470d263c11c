//! Crowd behavior: cheering for an event, kicking and kissing other viewers.

use catbrawl_world::entity::EntityId;
use rand::Rng;

use super::movement::GoToPerson;
use super::{TaskContext, TaskState};
use crate::event::{EventId, FlyingHeart};
use crate::services::SoundCue;

// ---------------------------------------------------------------------------
// Cheer
// ---------------------------------------------------------------------------

/// Hop in place, facing the action, while an event keeps running.
#[derive(Debug, Clone, PartialEq)]
pub struct Cheer {
    event: EventId,
    look_direction: i8,
    jump_velocity: f64,
    next_jump: f64,
}

impl Cheer {
    /// Cheer for `event`.
    pub fn new(event: EventId, look_direction: i8, jump_velocity: f64) -> Self {
        Self {
            event,
            look_direction,
            jump_velocity,
            next_jump: 0.0,
        }
    }

    /// The event being cheered for.
    pub fn event(&self) -> EventId {
        self.event
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        if !ctx.running_events.contains(&self.event) {
            return TaskState::Done;
        }
        let Some(ch) = ctx.world.get_mut(actor) else {
            return TaskState::Failed;
        };
        ch.set_look_direction(f64::from(self.look_direction));
        if ctx.time < self.next_jump {
            return TaskState::InProgress;
        }
        if ch.on_the_ground() {
            let sway = f64::from(ctx.rng.gen_range(-5_i32..=5));
            let lift = self.jump_velocity * ctx.rng.gen_range(0.1..=1.0);
            ch.push(sway, lift);
        } else {
            self.next_jump = ctx.time + f64::from(ctx.rng.gen_range(0_u32..=5));
        }
        TaskState::InProgress
    }
}

// ---------------------------------------------------------------------------
// GoAndKick
// ---------------------------------------------------------------------------

/// Walk up to someone and send them flying.
#[derive(Debug, Clone, PartialEq)]
pub struct GoAndKick {
    approach: GoToPerson,
    kick_velocity: f64,
}

impl GoAndKick {
    /// Kick `target` with `kick_velocity`.
    pub fn new(target: EntityId, kick_velocity: f64) -> Self {
        Self {
            approach: GoToPerson::new(target, false),
            kick_velocity,
        }
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        let state = self.approach.tick(actor, ctx);
        if state != TaskState::Done {
            return state;
        }
        let Some((kicker, victim)) = ctx.world.pair_mut(actor, self.approach.target()) else {
            return TaskState::Failed;
        };
        let direction = if victim.position().x < kicker.position().x {
            -1.0
        } else {
            1.0
        };
        victim.set_horizontal_velocity(direction * self.kick_velocity);
        victim.push(0.0, self.kick_velocity);
        ctx.services.play(SoundCue::Kick);
        TaskState::Done
    }
}

// ---------------------------------------------------------------------------
// GoAndKiss
// ---------------------------------------------------------------------------

/// Walk up to someone and float a heart over both of them.
#[derive(Debug, Clone, PartialEq)]
pub struct GoAndKiss {
    approach: GoToPerson,
}

impl GoAndKiss {
    /// Kiss `target`.
    pub fn new(target: EntityId) -> Self {
        Self {
            approach: GoToPerson::new(target, false),
        }
    }

    /// Who gets kissed.
    pub fn target(&self) -> EntityId {
        self.approach.target()
    }

    pub(crate) fn tick(&mut self, actor: EntityId, ctx: &mut TaskContext<'_>) -> TaskState {
        let state = self.approach.tick(actor, ctx);
        if state != TaskState::Done {
            return state;
        }
        for id in [self.approach.target(), actor] {
            if let Some(ch) = ctx.world.get(id) {
                let heart = FlyingHeart::new(ch.position());
                ctx.outbox.request_event(Box::new(heart));
            }
        }
        TaskState::Done
    }
}

#[cfg(test)]
mod tests {
    use catbrawl_world::geometry::Point;

    use super::super::testing::Bench;
    use super::super::Task;
    use super::*;
    use crate::services::recording;

    #[test]
    fn cheer_runs_until_event_stops() {
        let mut bench = Bench::new();
        let fan = bench.viewer("fan", 100.0);
        let event = EventId::new(7);
        bench.running.insert(event);

        let mut cheer = Task::cheer(event, -1, 200.0);
        for _ in 0..50 {
            assert_eq!(cheer.tick(fan, &mut bench.ctx()), TaskState::InProgress);
            bench.step_physics();
        }
        assert_eq!(bench.world.get(fan).unwrap().look_direction(), -1);

        bench.running.clear();
        assert_eq!(cheer.tick(fan, &mut bench.ctx()), TaskState::Done);
    }

    #[test]
    fn cheer_jumps_from_the_ground() {
        let mut bench = Bench::new();
        let fan = bench.viewer("fan", 100.0);
        let event = EventId::new(1);
        bench.running.insert(event);

        let mut cheer = Cheer::new(event, 1, 200.0);
        cheer.tick(fan, &mut bench.ctx());
        let vy = bench.world.get(fan).unwrap().vertical_velocity();
        assert!((-200.0..=-20.0).contains(&vy), "vertical velocity {vy}");
    }

    #[test]
    fn kick_launches_target_away_from_kicker() {
        let (services, recorder) = recording::services();
        let mut bench = Bench::new();
        bench.services = services;
        let me = bench.viewer("me", 300.0);
        let you = bench.viewer("you", 250.0);

        let mut kick = Task::go_and_kick(you, 300.0);
        assert_eq!(kick.tick(me, &mut bench.ctx()), TaskState::Done);
        let target = bench.world.get(you).unwrap();
        assert_eq!(target.horizontal_velocity(), -300.0);
        assert_eq!(target.vertical_velocity(), -300.0);
        assert_eq!(recorder.snapshot().sounds, vec![SoundCue::Kick]);
    }

    #[test]
    fn kick_gives_up_on_a_flyer_overhead() {
        let mut bench = Bench::new();
        let me = bench.viewer("me", 300.0);
        let you = bench.viewer("you", 310.0);
        bench.world.get_mut(you).unwrap().set_position(Point::new(310.0, -120.0));
        assert_eq!(Task::go_and_kick(you, 300.0).tick(me, &mut bench.ctx()), TaskState::Failed);
    }

    #[test]
    fn kiss_posts_two_hearts() {
        let mut bench = Bench::new();
        let me = bench.viewer("me", 300.0);
        let you = bench.viewer("you", 340.0);
        assert_eq!(Task::go_and_kiss(you).tick(me, &mut bench.ctx()), TaskState::Done);
        assert_eq!(bench.outbox.pending_events(), 2);
    }
}
