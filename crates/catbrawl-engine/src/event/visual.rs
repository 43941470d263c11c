//! Presentation-only events. They move a sprite anchor around and finish on
//! their own; none of them touch characters.

use catbrawl_world::geometry::Point;

use super::{EventContext, EventId, EventLayer, StageEvent};

/// Upward drift of ghosts and hearts, pixels per second.
const RISE_SPEED: f64 = 50.0;
/// Heart sprite edge, pixels.
const HEART_SIZE: f64 = 40.0;
/// How long a hit spark stays on screen.
const SPARK_SECS: f64 = 0.3;

// ---------------------------------------------------------------------------
// CharacterGhost
// ---------------------------------------------------------------------------

/// The ghost of a dead viewer floating off the top of the stage.
#[derive(Debug, Clone)]
pub struct CharacterGhost {
    name: String,
    position: Point,
    size: (f64, f64),
    done: bool,
}

impl CharacterGhost {
    /// A ghost of `name` rising from `position` with the body's `size`.
    pub fn new(name: &str, position: Point, size: (f64, f64)) -> Self {
        Self {
            name: name.to_owned(),
            position,
            size,
            done: false,
        }
    }

    /// Whose ghost this is.
    pub fn owner(&self) -> &str {
        &self.name
    }
}

impl StageEvent for CharacterGhost {
    fn name(&self) -> &'static str {
        "character_ghost"
    }

    fn anchor(&self) -> Option<Point> {
        Some(self.position)
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) {
        self.position.y -= RISE_SPEED * ctx.dt;
        self.position.x += (ctx.time * 2.0).cos() * self.size.0 * 0.025;
        let (w, h) = self.size;
        self.done = ctx
            .world
            .stage()
            .is_off_stage(self.position.x, self.position.y, w, h);
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn cancel(&mut self) {
        self.done = true;
    }
}

// ---------------------------------------------------------------------------
// FlyingHeart
// ---------------------------------------------------------------------------

/// A heart rising straight up until it leaves the stage.
#[derive(Debug, Clone)]
pub struct FlyingHeart {
    position: Point,
    done: bool,
}

impl FlyingHeart {
    /// A heart starting at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            position,
            done: false,
        }
    }
}

impl StageEvent for FlyingHeart {
    fn name(&self) -> &'static str {
        "flying_heart"
    }

    fn anchor(&self) -> Option<Point> {
        Some(self.position)
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) {
        self.position.y -= RISE_SPEED * ctx.dt;
        self.done = ctx.world.stage().is_off_stage(
            self.position.x,
            self.position.y,
            HEART_SIZE,
            HEART_SIZE,
        );
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn cancel(&mut self) {
        self.done = true;
    }
}

// ---------------------------------------------------------------------------
// TitleEvent
// ---------------------------------------------------------------------------

/// A banner at the top of the stage.
///
/// Lives as long as the event it follows, until its timeout, or both
/// (whichever ends first). A title with neither finishes immediately.
#[derive(Debug, Clone)]
pub struct TitleEvent {
    text: String,
    follow: Option<EventId>,
    timeout: Option<f64>,
    until: Option<f64>,
    done: bool,
}

impl TitleEvent {
    /// A banner showing `text`.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            follow: None,
            timeout: None,
            until: None,
            done: false,
        }
    }

    /// Finish together with `event`.
    pub fn following(mut self, event: EventId) -> Self {
        self.follow = Some(event);
        self
    }

    /// Finish `secs` after launch.
    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Banner text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl StageEvent for TitleEvent {
    fn name(&self) -> &'static str {
        "title_event"
    }

    fn begin(&mut self, ctx: &mut EventContext<'_>) {
        self.until = self.timeout.map(|secs| ctx.time + secs);
        if self.follow.is_none() && self.until.is_none() {
            self.done = true;
        }
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) {
        if let Some(event) = self.follow {
            self.done = !ctx.running.contains(&event);
        }
        if let Some(until) = self.until {
            self.done |= until < ctx.time;
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn cancel(&mut self) {
        self.done = true;
    }
}

// ---------------------------------------------------------------------------
// HitSpark
// ---------------------------------------------------------------------------

/// A short flash where a punch landed, drawn over the characters.
#[derive(Debug, Clone)]
pub struct HitSpark {
    position: Point,
    direction: i8,
    remaining: f64,
}

impl HitSpark {
    /// A spark at `position`, mirrored when `direction` is negative.
    pub fn new(position: Point, direction: i8) -> Self {
        Self {
            position,
            direction,
            remaining: SPARK_SECS,
        }
    }

    /// Facing of the sprite.
    pub fn direction(&self) -> i8 {
        self.direction
    }
}

impl StageEvent for HitSpark {
    fn name(&self) -> &'static str {
        "hit_visual_effect"
    }

    fn layer(&self) -> EventLayer {
        EventLayer::Front
    }

    fn anchor(&self) -> Option<Point> {
        Some(self.position)
    }

    fn update(&mut self, ctx: &mut EventContext<'_>) {
        self.remaining -= ctx.dt;
    }

    fn is_done(&self) -> bool {
        self.remaining < 0.0
    }

    fn cancel(&mut self) {
        self.remaining = -1.0;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use catbrawl_world::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::journal::Journal;
    use crate::services::Services;

    fn drive(event: &mut dyn StageEvent, running: &BTreeSet<EventId>, frames: usize) -> usize {
        let mut world = World::new(StageConfig::default(), CombatConfig::default());
        let mut brains = BTreeMap::new();
        let mut rng = Pcg64::seed_from_u64(9);
        let mut services = Services::silent();
        let mut journal = Journal::new();
        let dt = 0.1;
        {
            let mut ctx = EventContext::new(
                &mut world,
                &mut brains,
                &mut rng,
                &mut services,
                &mut journal,
                running,
                0.0,
                dt,
            );
            event.begin(&mut ctx);
        }
        for frame in 1..=frames {
            if event.is_done() {
                return frame - 1;
            }
            let mut ctx = EventContext::new(
                &mut world,
                &mut brains,
                &mut rng,
                &mut services,
                &mut journal,
                running,
                frame as f64 * dt,
                dt,
            );
            event.update(&mut ctx);
        }
        frames
    }

    #[test]
    fn heart_rises_off_stage() {
        let mut heart = FlyingHeart::new(Point::new(100.0, 190.0));
        let frames = drive(&mut heart, &BTreeSet::new(), 1_000);
        assert!(heart.is_done());
        // 230 px at 5 px per frame.
        assert_eq!(frames, 46);
        assert!(heart.anchor().unwrap().y <= -HEART_SIZE);
    }

    #[test]
    fn ghost_drifts_up_and_finishes() {
        let mut ghost = CharacterGhost::new("tom", Point::new(500.0, 190.0), (80.0, 80.0));
        drive(&mut ghost, &BTreeSet::new(), 1_000);
        assert!(ghost.is_done());
        assert_eq!(ghost.owner(), "tom");
    }

    #[test]
    fn title_without_anchor_finishes_immediately() {
        let mut title = TitleEvent::new("hello");
        assert_eq!(drive(&mut title, &BTreeSet::new(), 10), 0);
    }

    #[test]
    fn title_follows_running_event() {
        let followed = EventId::new(4);
        let running: BTreeSet<_> = [followed].into_iter().collect();
        let mut title = TitleEvent::new("!ZOMBIES ATTACK!").following(followed);
        assert_eq!(drive(&mut title, &running, 20), 20);
        assert!(!title.is_done());
        drive(&mut title, &BTreeSet::new(), 1);
        assert!(title.is_done());
    }

    #[test]
    fn title_times_out() {
        let mut title = TitleEvent::new("soon").with_timeout(1.0);
        let frames = drive(&mut title, &BTreeSet::new(), 100);
        assert!(title.is_done());
        assert!((10..=12).contains(&frames), "frames {frames}");
    }

    #[test]
    fn spark_lasts_a_third_of_a_second() {
        let mut spark = HitSpark::new(Point::new(0.0, 0.0), -1);
        assert_eq!(spark.layer(), EventLayer::Front);
        let frames = drive(&mut spark, &BTreeSet::new(), 100);
        assert!((3..=4).contains(&frames), "frames {frames}");
    }
}
