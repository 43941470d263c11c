//! Viewer redemptions: named actions bought with channel points.
//!
//! [`process`] validates a [`Redemption`] against the arena's current state
//! and, only if every check passes, applies it. Checks run in a fixed order so
//! the viewer always hears about the first thing that is wrong. A rejection is
//! a [`RedeemError`] whose `Display` text is meant to be sent back to the
//! viewer as-is.

use catbrawl_world::character::Rgb;
use catbrawl_world::entity::EntityId;
use catbrawl_world::WorldError;
use serde::{Deserialize, Serialize};

use crate::event::EventError;
use crate::task::{Task, TaskKind};
use crate::tick::Arena;

/// Stage background; a character painted this color would vanish.
pub const CHROMA_KEY: Rgb = Rgb(0, 255, 0);

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Every redemption the arena understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedeemKind {
    Spawn,
    Jump,
    RecolorBody,
    RecolorEyes,
    SetDirection,
    EverybodyJump,
    StartStorm,
    WalkAround,
    Kiss,
    Kick,
    StartDuel,
    ZombieAttack,
}

impl RedeemKind {
    /// Every kind, in menu order.
    pub const ALL: [RedeemKind; 12] = [
        RedeemKind::Spawn,
        RedeemKind::Jump,
        RedeemKind::RecolorBody,
        RedeemKind::RecolorEyes,
        RedeemKind::SetDirection,
        RedeemKind::EverybodyJump,
        RedeemKind::StartStorm,
        RedeemKind::WalkAround,
        RedeemKind::Kiss,
        RedeemKind::Kick,
        RedeemKind::StartDuel,
        RedeemKind::ZombieAttack,
    ];

    /// Reward title as configured on the channel, lower-case.
    pub fn title(self) -> &'static str {
        match self {
            RedeemKind::Spawn => "spawn",
            RedeemKind::Jump => "jump",
            RedeemKind::RecolorBody => "recolor body",
            RedeemKind::RecolorEyes => "recolor eyes",
            RedeemKind::SetDirection => "change direction",
            RedeemKind::EverybodyJump => "everybody else jump",
            RedeemKind::StartStorm => "start storm",
            RedeemKind::WalkAround => "wander",
            RedeemKind::Kiss => "kiss",
            RedeemKind::Kick => "kick",
            RedeemKind::StartDuel => "start duel",
            RedeemKind::ZombieAttack => "zombie attack",
        }
    }

    /// Match a reward title, ignoring case and surrounding whitespace.
    pub fn from_title(title: &str) -> Option<Self> {
        let title = title.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| k.title() == title)
    }
}

/// One redemption as delivered by the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    /// Display name of the viewer who redeemed.
    pub user: String,
    /// Reward title.
    pub title: String,
    /// Free-text input, for rewards that take one.
    #[serde(default)]
    pub input: Option<String>,
}

impl Redemption {
    /// A redemption without input.
    pub fn new(user: &str, title: &str) -> Self {
        Self {
            user: user.to_owned(),
            title: title.to_owned(),
            input: None,
        }
    }

    /// Attach the viewer's text input.
    pub fn with_input(mut self, input: &str) -> Self {
        self.input = Some(input.to_owned());
        self
    }

    fn input(&self) -> &str {
        self.input.as_deref().unwrap_or("")
    }
}

/// What a successful redemption did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The action was carried out.
    Applied,
    /// The title is on the ignore list.
    Ignored,
    /// Nothing to do (already spawned, airborne, silenced by an event...).
    NoOp,
}

/// A redemption refused by policy. `Display` is the text shown to the viewer.
#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    #[error("{title} is not available yet")]
    Unknown { title: String },

    #[error("({input}) is not a color value")]
    NotAColor { input: String },

    #[error("({input}) is a prohibited color value")]
    ProhibitedColor { input: String },

    #[error("value can only be -1 (left), 0 (stop) or 1 (right), not \"{input}\"")]
    BadDirection { input: String },

    #[error("another event is running")]
    EventRunning,

    #[error("YOUR character does not exist. Spawn it first.")]
    NoCharacter,

    #[error("character named {name} does not exist")]
    NoTarget { name: String },

    #[error("you cannot fight yourself!")]
    SelfDuel,

    #[error("the character is finishing {task}")]
    BlockingTask { task: &'static str },

    #[error("the character is busy {task}")]
    Busy { task: &'static str },

    #[error("a task that cannot be skipped is running")]
    Unskippable,

    #[error("the opponent is running a task that cannot be skipped")]
    OpponentUnskippable,

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    World(#[from] WorldError),
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// Normalize a viewer-typed nickname: trimmed, no leading `@`, lower-case.
pub fn normalize_nickname(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_lowercase()
}

/// Validate `redemption` and apply it to `arena`.
pub fn process(arena: &mut Arena, redemption: &Redemption) -> Result<RedeemOutcome, RedeemError> {
    tracing::info!(
        user = %redemption.user,
        title = %redemption.title,
        input = ?redemption.input,
        "redemption received"
    );
    let title = redemption.title.trim().to_lowercase();
    if arena
        .config()
        .ignored_redeems
        .iter()
        .any(|ignored| ignored.trim().to_lowercase() == title)
    {
        return Ok(RedeemOutcome::Ignored);
    }
    let Some(kind) = RedeemKind::from_title(&title) else {
        return Err(RedeemError::Unknown {
            title: redemption.title.clone(),
        });
    };

    let user = normalize_nickname(&redemption.user);
    let outcome = match kind {
        RedeemKind::Spawn => spawn(arena, &user),
        RedeemKind::Jump => Ok(jump(arena, &user)),
        RedeemKind::RecolorBody => recolor(arena, &user, redemption.input(), Paint::Body),
        RedeemKind::RecolorEyes => recolor(arena, &user, redemption.input(), Paint::Eyes),
        RedeemKind::SetDirection => set_direction(arena, &user, redemption.input()),
        RedeemKind::EverybodyJump => Ok(everybody_jump(arena, &user)),
        RedeemKind::StartStorm => start_storm(arena),
        RedeemKind::WalkAround => walk_around(arena, &user),
        RedeemKind::Kiss | RedeemKind::Kick => interact(arena, &user, redemption.input(), kind),
        RedeemKind::StartDuel => start_duel(arena, &user, redemption.input()),
        RedeemKind::ZombieAttack => zombie_attack(arena),
    };
    if let Err(e) = &outcome {
        tracing::info!(user = %user, ?kind, reason = %e, "redemption rejected");
    }
    outcome
}

// -- validators ---------------------------------------------------------------

fn own_character(arena: &Arena, user: &str) -> Result<EntityId, RedeemError> {
    arena.find_viewer(user).ok_or(RedeemError::NoCharacter)
}

fn target_character(arena: &Arena, name: &str) -> Result<EntityId, RedeemError> {
    arena.find_viewer(name).ok_or_else(|| RedeemError::NoTarget {
        name: name.to_owned(),
    })
}

fn not_blocking(arena: &Arena, id: EntityId) -> Result<(), RedeemError> {
    match arena.current_task(id) {
        Some(task) if task.is_blocking() => Err(RedeemError::BlockingTask { task: task.name() }),
        _ => Ok(()),
    }
}

fn no_blocking_event(arena: &Arena, kind: RedeemKind) -> Result<(), RedeemError> {
    if arena.any_event_blocking() || arena.redeem_blocked_by_active_event(kind) {
        return Err(RedeemError::EventRunning);
    }
    Ok(())
}

// -- handlers -----------------------------------------------------------------

fn spawn(arena: &mut Arena, user: &str) -> Result<RedeemOutcome, RedeemError> {
    if arena.find_viewer(user).is_some() {
        return Ok(RedeemOutcome::NoOp);
    }
    arena.spawn_viewer(user)?;
    Ok(RedeemOutcome::Applied)
}

fn jump(arena: &mut Arena, user: &str) -> RedeemOutcome {
    let velocity = arena.config().stage.jump_velocity;
    let Some(id) = arena.find_viewer(user) else {
        return RedeemOutcome::NoOp;
    };
    match arena.world_mut().get_mut(id) {
        Some(ch) if ch.on_the_ground() => {
            ch.push(0.0, velocity);
            RedeemOutcome::Applied
        }
        _ => RedeemOutcome::NoOp,
    }
}

fn everybody_jump(arena: &mut Arena, user: &str) -> RedeemOutcome {
    let velocity = arena.config().stage.jump_velocity;
    let world = arena.world_mut();
    for id in world.ids() {
        if let Some(ch) = world.get_mut(id) {
            if ch.name() != user && ch.on_the_ground() {
                ch.push(0.0, velocity);
            }
        }
    }
    RedeemOutcome::Applied
}

#[derive(Debug, Clone, Copy)]
enum Paint {
    Body,
    Eyes,
}

fn recolor(
    arena: &mut Arena,
    user: &str,
    input: &str,
    paint: Paint,
) -> Result<RedeemOutcome, RedeemError> {
    let color = parse_color(input)?;
    let Some(ch) = arena.find_viewer(user).and_then(|id| arena.world_mut().get_mut(id)) else {
        return Ok(RedeemOutcome::NoOp);
    };
    match paint {
        Paint::Body => ch.set_body_color(color),
        Paint::Eyes => ch.set_eyes_color(color),
    }
    Ok(RedeemOutcome::Applied)
}

fn set_direction(arena: &mut Arena, user: &str, input: &str) -> Result<RedeemOutcome, RedeemError> {
    if arena.any_event_blocking() {
        return Ok(RedeemOutcome::NoOp);
    }
    let raw = input.trim();
    let direction = match raw.parse::<i8>() {
        Ok(d @ -1..=1) => d,
        _ => {
            return Err(RedeemError::BadDirection {
                input: raw.to_owned(),
            })
        }
    };
    let Some(id) = arena.find_viewer(user) else {
        return Ok(RedeemOutcome::NoOp);
    };
    if direction == 0 {
        if let Some(brain) = arena.brain_mut(id) {
            brain.queue_mut().clear();
        }
    }
    if let Some(ch) = arena.world_mut().get_mut(id) {
        ch.set_move_direction(direction);
    }
    Ok(RedeemOutcome::Applied)
}

fn start_storm(arena: &mut Arena) -> Result<RedeemOutcome, RedeemError> {
    if arena.any_event_blocking() {
        return Err(RedeemError::EventRunning);
    }
    arena.start_storm()?;
    Ok(RedeemOutcome::Applied)
}

fn walk_around(arena: &mut Arena, user: &str) -> Result<RedeemOutcome, RedeemError> {
    if arena.any_event_blocking() {
        return Ok(RedeemOutcome::NoOp);
    }
    let Some(id) = arena.find_viewer(user) else {
        return Ok(RedeemOutcome::NoOp);
    };
    let Some(brain) = arena.brain_mut(id) else {
        return Ok(RedeemOutcome::NoOp);
    };
    match brain.queue().current_task() {
        None => {
            brain.queue_mut().run_idle_walking();
            Ok(RedeemOutcome::Applied)
        }
        Some(task) if matches!(task.kind(), TaskKind::IdleWalk(_)) => Ok(RedeemOutcome::NoOp),
        Some(task) => Err(RedeemError::Busy {
            task: task.verbal_name(),
        }),
    }
}

fn interact(
    arena: &mut Arena,
    user: &str,
    input: &str,
    kind: RedeemKind,
) -> Result<RedeemOutcome, RedeemError> {
    if arena.any_event_blocking() {
        return Ok(RedeemOutcome::NoOp);
    }
    let target_name = normalize_nickname(input);
    let me = own_character(arena, user)?;
    let target = target_character(arena, &target_name)?;
    not_blocking(arena, me)?;

    let task = match kind {
        RedeemKind::Kick => Task::go_and_kick(target, arena.config().combat.kick_velocity),
        _ => Task::go_and_kiss(target),
    };
    let Some(brain) = arena.brain_mut(me) else {
        return Ok(RedeemOutcome::NoOp);
    };
    let queue = brain.queue_mut();
    if queue
        .current_task()
        .is_some_and(|t| t.is_endless() && t.is_skippable())
    {
        queue.finish_current_task();
    }
    queue.add_task(task);
    Ok(RedeemOutcome::Applied)
}

fn start_duel(arena: &mut Arena, user: &str, input: &str) -> Result<RedeemOutcome, RedeemError> {
    let target_name = normalize_nickname(input);
    if target_name == user {
        return Err(RedeemError::SelfDuel);
    }
    let me = own_character(arena, user)?;
    let opponent = target_character(arena, &target_name)?;
    not_blocking(arena, me)?;
    not_blocking(arena, opponent)?;
    no_blocking_event(arena, RedeemKind::StartDuel)?;

    if arena.current_task(me).is_some_and(|t| !t.is_skippable()) {
        return Err(RedeemError::Unskippable);
    }
    if arena.current_task(opponent).is_some_and(|t| !t.is_skippable()) {
        return Err(RedeemError::OpponentUnskippable);
    }
    arena.start_duel(me, opponent)?;
    Ok(RedeemOutcome::Applied)
}

fn zombie_attack(arena: &mut Arena) -> Result<RedeemOutcome, RedeemError> {
    no_blocking_event(arena, RedeemKind::ZombieAttack)?;
    arena.start_zombie_event()?;
    Ok(RedeemOutcome::Applied)
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", Rgb(0, 0, 0)),
    ("white", Rgb(255, 255, 255)),
    ("gray", Rgb(190, 190, 190)),
    ("grey", Rgb(190, 190, 190)),
    ("red", Rgb(255, 0, 0)),
    ("green", Rgb(0, 255, 0)),
    ("blue", Rgb(0, 0, 255)),
    ("yellow", Rgb(255, 255, 0)),
    ("orange", Rgb(255, 165, 0)),
    ("purple", Rgb(160, 32, 240)),
    ("pink", Rgb(255, 192, 203)),
    ("brown", Rgb(165, 42, 42)),
    ("cyan", Rgb(0, 255, 255)),
    ("magenta", Rgb(255, 0, 255)),
];

/// Parse a viewer-typed color.
///
/// Accepts three 1-3 digit components separated by commas and/or spaces
/// (`"10, 20, 300"`, values clamped to 255), `#rrggbb`, or a color name.
pub fn parse_color(input: &str) -> Result<Rgb, RedeemError> {
    let not_a_color = || RedeemError::NotAColor {
        input: input.to_owned(),
    };
    let text = input.trim().to_lowercase();
    let color = parse_components(&text)
        .or_else(|| parse_hex(&text))
        .or_else(|| {
            NAMED_COLORS
                .iter()
                .find(|(name, _)| *name == text)
                .map(|&(_, rgb)| rgb)
        })
        .ok_or_else(not_a_color)?;
    if color == CHROMA_KEY {
        return Err(RedeemError::ProhibitedColor {
            input: input.to_owned(),
        });
    }
    Ok(color)
}

fn parse_components(text: &str) -> Option<Rgb> {
    let parts: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    let [r, g, b] = parts.as_slice() else {
        return None;
    };
    let channel = |p: &str| -> Option<u8> {
        if p.is_empty() || p.len() > 3 || !p.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u16 = p.parse().ok()?;
        Some(value.min(255) as u8)
    };
    Some(Rgb(channel(*r)?, channel(*g)?, channel(*b)?))
}

fn parse_hex(text: &str) -> Option<Rgb> {
    let hex = text.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_round_trip_case_insensitively() {
        for kind in RedeemKind::ALL {
            assert_eq!(RedeemKind::from_title(kind.title()), Some(kind));
        }
        assert_eq!(RedeemKind::from_title("  Start Duel "), Some(RedeemKind::StartDuel));
        assert_eq!(RedeemKind::from_title("order music"), None);
    }

    #[test]
    fn colors_parse_and_clamp() {
        assert_eq!(parse_color("10, 20, 300").unwrap(), Rgb(10, 20, 255));
        assert_eq!(parse_color("1 2 3").unwrap(), Rgb(1, 2, 3));
        assert_eq!(parse_color("#ff8000").unwrap(), Rgb(255, 128, 0));
        assert_eq!(parse_color(" Pink ").unwrap(), Rgb(255, 192, 203));
    }

    #[test]
    fn bad_and_prohibited_colors_are_rejected() {
        assert!(matches!(parse_color("blurple"), Err(RedeemError::NotAColor { .. })));
        assert!(matches!(parse_color("1, 2"), Err(RedeemError::NotAColor { .. })));
        assert!(matches!(parse_color("1000, 2, 3"), Err(RedeemError::NotAColor { .. })));
        assert!(matches!(parse_color("green"), Err(RedeemError::ProhibitedColor { .. })));
        assert!(matches!(parse_color("0,255,0"), Err(RedeemError::ProhibitedColor { .. })));
    }

    #[test]
    fn nicknames_are_normalized() {
        assert_eq!(normalize_nickname("  @Tom "), "tom");
        assert_eq!(normalize_nickname("Jerry"), "jerry");
    }

    #[test]
    fn error_text_is_user_facing() {
        assert_eq!(RedeemError::SelfDuel.to_string(), "you cannot fight yourself!");
        assert_eq!(
            RedeemError::NoTarget { name: "bob".into() }.to_string(),
            "character named bob does not exist"
        );
    }
}
