//! Zombie invasion: viewers defend the stage against a wave of zombies.

use catbrawl_world::character::Faction;
use catbrawl_world::entity::EntityId;

use super::{EventContext, StageEvent};
use crate::ai::Brain;
use crate::config::ZombieConfig;
use crate::prediction::PredictionDriver;
use crate::redeem::RedeemKind;
use crate::services::PredictionRequest;
use crate::task::{Task, TaskKind};

/// Prediction outcome paid out when the viewers survive.
pub const VIEWERS_OUTCOME: &str = "viewers";
/// Prediction outcome paid out when the zombies take over.
pub const ZOMBIES_OUTCOME: &str = "zombies";
const CANCEL_REASON: &str = "Invasion canceled";

/// Invasion progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZombieStage {
    /// Created but not launched.
    NotStarted,
    /// Predictions are open; the zombies have not arrived yet.
    Waiting { remaining: f64 },
    /// Zombies are on stage. Once `decay_in` runs out they start to rot.
    Fighting { decay_in: f64 },
    /// Outcome published; the event is done.
    Resolved,
}

/// A wave of zombies against every viewer on stage.
#[derive(Debug)]
pub struct ZombieEvent {
    config: ZombieConfig,
    tracked: Vec<EntityId>,
    stage: ZombieStage,
    prediction: PredictionDriver,
    spawned: Vec<EntityId>,
    canceled: bool,
}

impl ZombieEvent {
    /// An invasion against `players`.
    pub fn new(config: ZombieConfig, players: Vec<EntityId>) -> Self {
        Self {
            config,
            tracked: players,
            stage: ZombieStage::NotStarted,
            prediction: PredictionDriver::new(),
            spawned: Vec::new(),
            canceled: false,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> ZombieStage {
        self.stage
    }

    /// Zombies spawned by the wave.
    pub fn spawned(&self) -> &[EntityId] {
        &self.spawned
    }

    fn arrive(&mut self, ctx: &mut EventContext<'_>) {
        ctx.drive_prediction(&mut self.prediction, PredictionDriver::lock);

        let defenders: Vec<EntityId> = self
            .tracked
            .iter()
            .copied()
            .filter(|&id| ctx.world.is_alive(id))
            .collect();
        for &id in &defenders {
            if let Some(brain) = ctx.player_brain(id) {
                brain.queue_mut().clear();
                brain
                    .queue_mut()
                    .add_task(Task::defend_from_zombies(self.config.defend_secs).blocking());
            }
        }

        let wave = (defenders.len() as f64 * self.config.zombies_per_player).ceil() as usize;
        for k in 1..=wave.max(1) {
            let spec = ctx.world.zombie_spec(&format!("zombie_{k}"));
            match ctx.admit(spec, Brain::zombie(self.config.hunt_secs)) {
                Ok(id) => self.spawned.push(id),
                Err(e) => tracing::warn!(error = %e, "failed to spawn zombie"),
            }
        }
        tracing::info!(defenders = defenders.len(), zombies = self.spawned.len(), "zombies arrived");
        self.stage = ZombieStage::Fighting {
            decay_in: self.config.fight_secs,
        };
    }

    fn shove_from_borders(&self, ctx: &mut EventContext<'_>) {
        let stage = ctx.world.stage();
        let border = stage.width * self.config.border_ratio;
        let right_edge = stage.width - border;
        let shove = self.config.shove_velocity;
        for id in ctx.world.ids() {
            let Some(ch) = ctx.world.get_mut(id) else {
                continue;
            };
            if !ch.is_alive() || ch.is_falling() {
                continue;
            }
            let rect = ch.rect();
            if rect.x < border {
                ch.push(shove, shove);
            } else if rect.right() > right_edge {
                ch.push(-shove, shove);
            }
        }
    }

    fn rot_all_zombies(&self, ctx: &mut EventContext<'_>) {
        for id in ctx.world.ids() {
            if ctx.world.get(id).is_some_and(|c| c.is_zombie()) {
                ctx.world.enable_destruction(id, ctx.rng);
            }
        }
    }

    fn resolve(&mut self, ctx: &mut EventContext<'_>, winner: Option<&'static str>) {
        match winner {
            Some(winner) => {
                tracing::info!(%winner, "zombie invasion resolved");
                ctx.announce(&format!("The invasion is over: the {winner} won!"));
                ctx.drive_prediction(&mut self.prediction, |p| p.resolve(winner, ""));
            }
            None => {
                tracing::info!("zombie invasion left nobody standing");
                ctx.drive_prediction(&mut self.prediction, |p| p.cancel("Nobody survived"));
            }
        }
        self.release(ctx);
        self.stage = ZombieStage::Resolved;
    }

    fn abort(&mut self, ctx: &mut EventContext<'_>) {
        tracing::info!(zombies = self.spawned.len(), "zombie invasion canceled");
        ctx.drive_prediction(&mut self.prediction, |p| p.cancel(CANCEL_REASON));
        for &id in &self.spawned {
            if ctx.world.is_alive(id) {
                ctx.world.enable_destruction(id, ctx.rng);
            }
        }
        self.release(ctx);
        self.stage = ZombieStage::Resolved;
    }

    /// Send tracked viewers still defending back to idle walking.
    fn release(&self, ctx: &mut EventContext<'_>) {
        for &id in &self.tracked {
            if let Some(brain) = ctx.player_brain(id) {
                let defending = brain
                    .queue()
                    .current_task()
                    .is_some_and(|t| matches!(t.kind(), TaskKind::DefendFromZombies(_)));
                if defending {
                    brain.queue_mut().clear();
                    brain.queue_mut().run_idle_walking();
                }
            }
        }
    }
}

impl StageEvent for ZombieEvent {
    fn name(&self) -> &'static str {
        "zombies_event"
    }

    fn is_blocking(&self) -> bool {
        true
    }

    fn blocked_redeems(&self) -> &'static [RedeemKind] {
        &[RedeemKind::StartDuel, RedeemKind::ZombieAttack]
    }

    fn claims(&self) -> Vec<EntityId> {
        self.tracked.clone()
    }

    fn begin(&mut self, ctx: &mut EventContext<'_>) {
        ctx.announce("ATTENTION! Zombies are coming! Get ready and place your bets!");
        ctx.services.create_prediction(&PredictionRequest {
            title: "Who will win?".to_owned(),
            outcomes: vec![VIEWERS_OUTCOME.to_owned(), ZOMBIES_OUTCOME.to_owned()],
            window_secs: self.config.prediction_secs,
        });
        tracing::info!(players = self.tracked.len(), "zombie invasion announced");
        self.stage = ZombieStage::Waiting {
            remaining: self.config.prediction_secs,
        };
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) {
        if self.canceled && self.stage != ZombieStage::Resolved {
            self.abort(ctx);
            return;
        }
        match self.stage {
            ZombieStage::Waiting { remaining } => {
                let remaining = remaining - ctx.dt;
                if remaining <= 0.0 {
                    self.arrive(ctx);
                } else {
                    self.stage = ZombieStage::Waiting { remaining };
                }
            }
            ZombieStage::Fighting { decay_in } => {
                self.shove_from_borders(ctx);
                let decay_in = decay_in - ctx.dt;
                self.stage = ZombieStage::Fighting { decay_in };
                if decay_in <= 0.0 {
                    self.rot_all_zombies(ctx);
                }

                let viewers = ctx.world.count_alive(Faction::Viewer);
                let zombies = ctx.world.count_alive(Faction::Zombie);
                match (viewers, zombies) {
                    (0, 0) => self.resolve(ctx, None),
                    (0, _) => {
                        self.rot_all_zombies(ctx);
                        self.resolve(ctx, Some(ZOMBIES_OUTCOME));
                    }
                    (_, 0) => self.resolve(ctx, Some(VIEWERS_OUTCOME)),
                    _ => {}
                }
            }
            ZombieStage::NotStarted | ZombieStage::Resolved => {}
        }
    }

    fn is_done(&self) -> bool {
        self.stage == ZombieStage::Resolved
    }

    fn cancel(&mut self) {
        match self.stage {
            ZombieStage::NotStarted => self.stage = ZombieStage::Resolved,
            ZombieStage::Resolved => {}
            ZombieStage::Waiting { .. } | ZombieStage::Fighting { .. } => self.canceled = true,
        }
    }
}
