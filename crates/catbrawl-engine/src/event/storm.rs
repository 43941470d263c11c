//! A thundercloud that crosses the stage and strikes one character.

use catbrawl_world::entity::EntityId;
use catbrawl_world::geometry::{Point, Rect};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{EventContext, StageEvent};
use crate::config::StormConfig;
use crate::services::SoundCue;

/// Death reason recorded for lightning victims.
pub const STORM_REASON: &str = "storm";

/// Non-blocking storm. The cloud enters from a random side, travels at a fixed
/// fraction of the stage width per second and strikes its target once, when
/// the hitbox under the cloud spans the target's center.
#[derive(Debug)]
pub struct StormEvent {
    config: StormConfig,
    direction: f64,
    cloud_x: f64,
    target: Option<EntityId>,
    struck: bool,
    done: bool,
}

impl StormEvent {
    /// A storm with the given tuning.
    pub fn new(config: StormConfig) -> Self {
        Self {
            config,
            direction: 1.0,
            cloud_x: 0.0,
            target: None,
            struck: false,
            done: false,
        }
    }

    /// The character the lightning is aimed at.
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Whether the lightning already struck.
    pub fn has_struck(&self) -> bool {
        self.struck
    }

    fn pick_target(ctx: &mut EventContext<'_>) -> Option<EntityId> {
        let living: Vec<EntityId> = ctx
            .world
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| c.id())
            .collect();
        living.choose(ctx.rng).copied()
    }

    fn hitbox(&self, ctx: &EventContext<'_>) -> Rect {
        let stage = ctx.world.stage();
        Rect::new(
            self.cloud_x + self.config.cloud_width / 2.0,
            0.0,
            stage.character_width,
            stage.character_height,
        )
    }
}

impl StageEvent for StormEvent {
    fn name(&self) -> &'static str {
        "storm"
    }

    fn anchor(&self) -> Option<Point> {
        Some(Point::new(self.cloud_x, 0.0))
    }

    fn begin(&mut self, ctx: &mut EventContext<'_>) {
        let width = ctx.world.stage().width;
        self.direction = if ctx.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.cloud_x = if self.direction > 0.0 {
            -self.config.cloud_width + 2.0
        } else {
            width - 2.0
        };
        self.target = Self::pick_target(ctx);
        tracing::info!(target = ?self.target, direction = self.direction, "storm gathering");
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) {
        let stage = ctx.world.stage().clone();
        let speed = stage.width * self.config.speed_ratio;
        self.cloud_x += ctx.dt * speed * self.direction;

        if !self.target.is_some_and(|t| ctx.world.is_alive(t)) {
            self.target = Self::pick_target(ctx);
        }
        if let (false, Some(target)) = (self.struck, self.target) {
            let hitbox = self.hitbox(ctx);
            if let Some(ch) = ctx.world.get_mut(target) {
                if hitbox.spans_x(ch.center().x) {
                    self.struck = true;
                    ch.damage(self.config.damage, STORM_REASON);
                    tracing::info!(name = ch.name(), "struck by lightning");
                    ctx.services.play(SoundCue::Thunder);
                }
            }
        }

        self.done = stage.is_off_stage(
            self.cloud_x,
            0.0,
            self.config.cloud_width,
            self.config.cloud_height,
        );
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn cancel(&mut self) {
        self.done = true;
    }
}
