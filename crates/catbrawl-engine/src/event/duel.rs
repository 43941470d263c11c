//! One-on-one duel between two viewers, with a crowd and a prediction.

use catbrawl_world::entity::EntityId;
use catbrawl_world::geometry::Point;

use super::{EventContext, StageEvent};
use crate::config::DuelConfig;
use crate::prediction::PredictionDriver;
use crate::redeem::RedeemKind;
use crate::services::PredictionRequest;
use crate::task::Task;

/// Where duelists line up, as fractions of the stage width.
const CORNERS: (f64, f64) = (0.25, 0.75);
/// Where the crowd gathers.
const VIEWER_AREAS: (f64, f64) = (0.1, 0.9);
const CANCEL_REASON: &str = "Duel canceled";

/// Duel progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuelStage {
    /// Created but not launched.
    NotStarted,
    /// Duelists walk to their corners; predictions are open.
    Preparing { remaining: f64 },
    /// Duelists fight until one falls or the timer runs out.
    Fighting { remaining: f64 },
    /// Outcome published; the event is done.
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Winner(usize),
    Draw,
}

/// A timed fight between two viewers.
#[derive(Debug)]
pub struct DuelEvent {
    duelists: [EntityId; 2],
    names: [String; 2],
    config: DuelConfig,
    stage: DuelStage,
    prediction: PredictionDriver,
    crowd: Vec<EntityId>,
    canceled: bool,
}

impl DuelEvent {
    /// `challenger` against `opponent`.
    pub fn new(challenger: EntityId, opponent: EntityId, config: DuelConfig) -> Self {
        Self {
            duelists: [challenger, opponent],
            names: [String::new(), String::new()],
            config,
            stage: DuelStage::NotStarted,
            prediction: PredictionDriver::new(),
            crowd: Vec::new(),
            canceled: false,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> DuelStage {
        self.stage
    }

    /// Challenger and opponent.
    pub fn duelists(&self) -> [EntityId; 2] {
        self.duelists
    }

    /// Bystanders sent to watch.
    pub fn crowd(&self) -> &[EntityId] {
        &self.crowd
    }

    fn start_fight(&mut self, ctx: &mut EventContext<'_>) {
        ctx.drive_prediction(&mut self.prediction, PredictionDriver::lock);
        let [a, b] = self.duelists;
        for (me, foe) in [(a, b), (b, a)] {
            if let Some(brain) = ctx.player_brain(me) {
                brain.queue_mut().clear();
                brain.queue_mut().add_task(Task::go_and_kill(foe).blocking());
            }
        }
        tracing::info!(a = %self.names[0], b = %self.names[1], "duel fight started");
        self.stage = DuelStage::Fighting {
            remaining: self.config.fight_secs,
        };
    }

    fn decide(&self, ctx: &EventContext<'_>, timer_expired: bool) -> Option<Outcome> {
        let [a, b] = self.duelists;
        match (ctx.world.is_alive(a), ctx.world.is_alive(b)) {
            (false, false) => Some(Outcome::Draw),
            (false, true) => Some(Outcome::Winner(1)),
            (true, false) => Some(Outcome::Winner(0)),
            (true, true) if timer_expired => {
                let health = |id: EntityId| ctx.world.get(id).map_or(0.0, |c| c.health());
                let (ha, hb) = (health(a), health(b));
                Some(if ha == hb {
                    Outcome::Draw
                } else if ha < hb {
                    Outcome::Winner(1)
                } else {
                    Outcome::Winner(0)
                })
            }
            (true, true) => None,
        }
    }

    fn resolve(&mut self, ctx: &mut EventContext<'_>, outcome: Outcome) {
        match outcome {
            Outcome::Draw => {
                tracing::info!(a = %self.names[0], b = %self.names[1], "duel ended in a draw");
                let reason = self.config.draw_reason.clone();
                ctx.drive_prediction(&mut self.prediction, |p| p.cancel(&reason));
            }
            Outcome::Winner(i) => {
                let winner = self.names[i].clone();
                tracing::info!(%winner, loser = %self.names[1 - i], "duel won");
                ctx.announce(&format!("@{winner} won the duel!"));
                ctx.drive_prediction(&mut self.prediction, |p| p.resolve(&winner, ""));
            }
        }

        self.stand_down_duelists(ctx);
        if self.config.reconcile {
            self.reconcile(ctx, outcome);
        }
        self.release(ctx);
        self.stage = DuelStage::Resolved;
    }

    fn abort(&mut self, ctx: &mut EventContext<'_>) {
        tracing::info!(a = %self.names[0], b = %self.names[1], "duel canceled");
        ctx.drive_prediction(&mut self.prediction, |p| p.cancel(CANCEL_REASON));
        self.stand_down_duelists(ctx);
        self.release(ctx);
        self.stage = DuelStage::Resolved;
    }

    fn stand_down_duelists(&self, ctx: &mut EventContext<'_>) {
        for id in self.duelists {
            if let Some(ch) = ctx.world.get_mut(id) {
                ch.restore_health();
            }
            if let Some(brain) = ctx.player_brain(id) {
                brain.queue_mut().clear();
            }
        }
    }

    /// The loser kisses the winner and so does the crowd. On a draw the
    /// challenger makes the first move and each fan picks the nearer duelist.
    fn reconcile(&self, ctx: &mut EventContext<'_>, outcome: Outcome) {
        let [a, b] = self.duelists;
        let (giver, receiver) = match outcome {
            Outcome::Winner(i) => (self.duelists[1 - i], self.duelists[i]),
            Outcome::Draw => (a, b),
        };
        if ctx.world.is_alive(giver) && ctx.world.is_alive(receiver) {
            if let Some(brain) = ctx.player_brain(giver) {
                brain.queue_mut().add_task(Task::go_and_kiss(receiver));
            }
        }

        for &fan in &self.crowd {
            if !ctx.world.is_alive(fan) || ctx.claimed_by_other(fan) {
                continue;
            }
            let target = match outcome {
                Outcome::Winner(i) => Some(self.duelists[i]),
                Outcome::Draw => self.nearest_living_duelist(ctx, fan),
            };
            let Some(target) = target.filter(|&t| ctx.world.is_alive(t)) else {
                continue;
            };
            if let Some(brain) = ctx.player_brain(fan) {
                brain.queue_mut().add_task(Task::go_and_kiss(target));
            }
        }
    }

    fn nearest_living_duelist(&self, ctx: &EventContext<'_>, fan: EntityId) -> Option<EntityId> {
        let from = ctx.world.get(fan)?.position();
        self.duelists
            .iter()
            .filter_map(|&id| ctx.world.get(id).filter(|c| c.is_alive()))
            .min_by(|x, y| {
                from.distance(x.position())
                    .total_cmp(&from.distance(y.position()))
            })
            .map(|c| c.id())
    }

    /// Hand the duelists and the crowd back to idle walking.
    fn release(&self, ctx: &mut EventContext<'_>) {
        for &id in self.duelists.iter().chain(&self.crowd) {
            if ctx.claimed_by_other(id) {
                continue;
            }
            if let Some(brain) = ctx.player_brain(id) {
                brain.queue_mut().run_idle_walking();
            }
        }
    }
}

fn facing_center(spot: Point, stage_width: f64) -> i8 {
    if spot.x < stage_width / 2.0 {
        1
    } else {
        -1
    }
}

impl StageEvent for DuelEvent {
    fn name(&self) -> &'static str {
        "duel"
    }

    fn is_blocking(&self) -> bool {
        true
    }

    fn blocked_redeems(&self) -> &'static [RedeemKind] {
        &[RedeemKind::StartDuel, RedeemKind::ZombieAttack]
    }

    fn claims(&self) -> Vec<EntityId> {
        self.duelists.to_vec()
    }

    fn begin(&mut self, ctx: &mut EventContext<'_>) {
        let [a, b] = self.duelists;
        let (Some(first), Some(second)) = (ctx.world.get(a), ctx.world.get(b)) else {
            tracing::warn!(%a, %b, "duelist missing, duel dropped");
            self.stage = DuelStage::Resolved;
            return;
        };
        self.names = [first.name().to_owned(), second.name().to_owned()];
        let (pos_a, pos_b) = (first.position(), second.position());

        let stage = ctx.world.stage().clone();
        let left = stage.floor_point(CORNERS.0);
        let right = stage.floor_point(CORNERS.1);
        let corners = if pos_a.distance(left) < pos_b.distance(left) {
            [left, right]
        } else {
            [right, left]
        };
        for (id, corner) in self.duelists.into_iter().zip(corners) {
            if let Some(ch) = ctx.world.get_mut(id) {
                ch.restore_health();
            }
            if let Some(brain) = ctx.player_brain(id) {
                brain.queue_mut().clear();
                let face = facing_center(corner, stage.width);
                brain.queue_mut().add_task(Task::go_to_facing(corner, face).blocking());
            }
        }

        let areas = [
            stage.floor_point(VIEWER_AREAS.0),
            stage.floor_point(VIEWER_AREAS.1),
        ];
        let event = ctx.self_id();
        for id in ctx.living_players() {
            if self.duelists.contains(&id) || ctx.claimed_by_other(id) {
                continue;
            }
            let Some(pos) = ctx.world.get(id).map(|c| c.position()) else {
                continue;
            };
            let area = if pos.distance(areas[0]) < pos.distance(areas[1]) {
                areas[0]
            } else {
                areas[1]
            };
            let face = facing_center(area, stage.width);
            if let Some(brain) = ctx.player_brain(id) {
                let queue = brain.queue_mut();
                if queue.current_task().is_some_and(|t| !t.is_blocking()) {
                    queue.clear();
                }
                queue.add_task(Task::go_to_facing(area, face));
                queue.add_task(Task::cheer(event, face, stage.jump_velocity));
                self.crowd.push(id);
            }
        }

        let [name_a, name_b] = &self.names;
        ctx.announce(&format!("ATTENTION! @{name_a} challenged @{name_b} to a duel!"));
        ctx.services.create_prediction(&PredictionRequest {
            title: "Who will win?".to_owned(),
            outcomes: self.names.to_vec(),
            window_secs: self.config.prepare_secs,
        });
        tracing::info!(a = %name_a, b = %name_b, "duel started");
        self.stage = DuelStage::Preparing {
            remaining: self.config.prepare_secs,
        };
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) {
        if self.canceled && self.stage != DuelStage::Resolved {
            self.abort(ctx);
            return;
        }
        match self.stage {
            DuelStage::Preparing { remaining } => {
                let remaining = remaining - ctx.dt;
                if remaining <= 0.0 {
                    self.start_fight(ctx);
                } else {
                    self.stage = DuelStage::Preparing { remaining };
                }
            }
            DuelStage::Fighting { remaining } => {
                let remaining = remaining - ctx.dt;
                self.stage = DuelStage::Fighting { remaining };
                if let Some(outcome) = self.decide(ctx, remaining <= 0.0) {
                    self.resolve(ctx, outcome);
                }
            }
            DuelStage::NotStarted | DuelStage::Resolved => {}
        }
    }

    fn is_done(&self) -> bool {
        self.stage == DuelStage::Resolved
    }

    fn cancel(&mut self) {
        match self.stage {
            DuelStage::NotStarted => self.stage = DuelStage::Resolved,
            DuelStage::Resolved => {}
            DuelStage::Preparing { .. } | DuelStage::Fighting { .. } => self.canceled = true,
        }
    }
}
