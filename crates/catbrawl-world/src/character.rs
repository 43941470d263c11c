//! Characters: the physical state tasks act on.
//!
//! A [`Character`] is plain data plus a handful of *effectors* (`push`,
//! `damage`, `heal`, `stop`, `walk_towards`). Tasks never write positions or
//! velocities directly; they set intents through effectors and let
//! [`physics::integrate`](crate::physics::integrate) move the body.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::geometry::{Point, Rect};
use crate::weapon::Weapon;

// ---------------------------------------------------------------------------
// Faction / Appearance
// ---------------------------------------------------------------------------

/// Which side of a zombie invasion a character is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// A viewer's avatar.
    Viewer,
    /// A zombie, either spawned by an invasion or converted from a viewer.
    Zombie,
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Colors the renderer uses to tint a character sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    /// Body tint.
    pub body: Rgb,
    /// Eye tint.
    pub eyes: Rgb,
}

impl Appearance {
    /// Grey body, black eyes.
    pub const VIEWER: Appearance = Appearance {
        body: Rgb(190, 190, 190),
        eyes: Rgb(0, 0, 0),
    };

    /// Pale blue body, red eyes.
    pub const ZOMBIE: Appearance = Appearance {
        body: Rgb(200, 200, 250),
        eyes: Rgb(255, 0, 0),
    };
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// A character standing (or flying) on the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    id: EntityId,
    name: String,
    faction: Faction,
    skin: String,
    pub(crate) position: Point,
    width: f64,
    height: f64,
    floor_y: f64,
    pub(crate) move_direction: i8,
    pub(crate) speed: f64,
    pub(crate) horizontal_velocity: f64,
    pub(crate) vertical_velocity: f64,
    look_direction: i8,
    health: f64,
    max_health: f64,
    alive: bool,
    death_reason: Option<String>,
    pub(crate) weapon: Option<Weapon>,
    make_ghost: bool,
    pub(crate) destruction_rate: Option<f64>,
    appearance: Appearance,
}

/// Everything needed to construct a [`Character`] except its id and floor.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSpec {
    /// Display name. Viewer names are lower-cased and must be unique.
    pub name: String,
    /// Side the character fights on.
    pub faction: Faction,
    /// Sprite family used by the renderer.
    pub skin: String,
    /// Top-left spawn position. `None` picks a random spawn point.
    pub position: Option<Point>,
    /// Box size. `None` uses the stage default.
    pub size: Option<(f64, f64)>,
    /// Walking speed. `None` uses the stage default.
    pub speed: Option<f64>,
    /// Maximum health. `None` uses the stage default.
    pub max_health: Option<f64>,
    /// Starting health. `None` starts at maximum.
    pub health: Option<f64>,
    /// Initial walking direction.
    pub move_direction: i8,
    /// Equipped weapon.
    pub weapon: Option<Weapon>,
    /// Whether dying leaves a ghost behind.
    pub make_ghost: bool,
    /// Sprite tint.
    pub appearance: Appearance,
}

impl CharacterSpec {
    /// A viewer avatar with stage defaults.
    pub fn viewer(name: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            faction: Faction::Viewer,
            skin: "cat".to_owned(),
            position: None,
            size: None,
            speed: None,
            max_health: None,
            health: None,
            move_direction: 0,
            weapon: None,
            make_ghost: true,
            appearance: Appearance::VIEWER,
        }
    }

    /// A zombie. Callers usually also set doubled health, boosted speed and
    /// fists; [`World::zombie_spec`](crate::world::World::zombie_spec) builds that.
    pub fn zombie(name: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            faction: Faction::Zombie,
            make_ghost: false,
            appearance: Appearance::ZOMBIE,
            ..Self::viewer(name)
        }
    }

    /// Place the character at a fixed top-left position.
    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Equip a weapon.
    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Remove any weapon.
    pub fn unarmed(mut self) -> Self {
        self.weapon = None;
        self
    }

    /// Override maximum health.
    pub fn with_max_health(mut self, max_health: f64) -> Self {
        self.max_health = Some(max_health);
        self
    }

    /// Override starting health.
    pub fn with_health(mut self, health: f64) -> Self {
        self.health = Some(health);
        self
    }

    /// Override walking speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Override the sprite family.
    pub fn with_skin(mut self, skin: &str) -> Self {
        self.skin = skin.to_owned();
        self
    }
}

impl Character {
    pub(crate) fn from_spec(
        id: EntityId,
        spec: CharacterSpec,
        position: Point,
        size: (f64, f64),
        speed: f64,
        max_health: f64,
        stage_height: f64,
    ) -> Self {
        let health = spec.health.unwrap_or(max_health).clamp(0.0, max_health);
        Self {
            id,
            name: spec.name,
            faction: spec.faction,
            skin: spec.skin,
            position,
            width: size.0,
            height: size.1,
            floor_y: stage_height - size.1,
            move_direction: spec.move_direction.signum(),
            speed,
            horizontal_velocity: 0.0,
            vertical_velocity: 0.0,
            look_direction: 1,
            health,
            max_health,
            alive: health >= 1.0,
            death_reason: None,
            weapon: spec.weapon,
            make_ghost: spec.make_ghost,
            destruction_rate: None,
            appearance: spec.appearance,
        }
    }

    // -- identity -------------------------------------------------------------

    /// Registry id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Faction.
    pub fn faction(&self) -> Faction {
        self.faction
    }

    /// Whether this is a zombie.
    pub fn is_zombie(&self) -> bool {
        self.faction == Faction::Zombie
    }

    /// Whether this is a viewer avatar.
    pub fn is_player(&self) -> bool {
        self.faction == Faction::Viewer
    }

    /// Sprite family.
    pub fn skin(&self) -> &str {
        &self.skin
    }

    /// Sprite tint.
    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    /// Replace the body tint.
    pub fn set_body_color(&mut self, color: Rgb) {
        self.appearance.body = color;
    }

    /// Replace the eye tint.
    pub fn set_eyes_color(&mut self, color: Rgb) {
        self.appearance.eyes = color;
    }

    /// Whether dying should leave a ghost.
    pub fn makes_ghost(&self) -> bool {
        self.make_ghost
    }

    // -- body -----------------------------------------------------------------

    /// Top-left corner.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Teleport the top-left corner.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Bounding box.
    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Box size as `(width, height)`.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// The y coordinate at which the character rests on the floor.
    pub fn floor_y(&self) -> f64 {
        self.floor_y
    }

    /// Whether the character is above the floor line.
    pub fn is_falling(&self) -> bool {
        self.position.y < self.floor_y - 1.0
    }

    /// Whether the character stands on the floor.
    pub fn on_the_ground(&self) -> bool {
        !self.is_falling()
    }

    /// Whether the bounding box contains `point`.
    pub fn on_position(&self, point: Point) -> bool {
        self.rect().contains_point(point)
    }

    /// Current walking intent: -1 left, 0 stopped, 1 right.
    pub fn move_direction(&self) -> i8 {
        self.move_direction
    }

    /// Set the walking intent. Values are clamped to their sign.
    pub fn set_move_direction(&mut self, direction: i8) {
        self.move_direction = direction.signum();
    }

    /// Walk towards a horizontal coordinate.
    pub fn walk_towards(&mut self, x: f64) {
        self.move_direction = if x < self.center().x { -1 } else { 1 };
    }

    /// Drop the walking intent.
    pub fn stop(&mut self) {
        self.move_direction = 0;
    }

    /// Walking speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Horizontal velocity.
    pub fn horizontal_velocity(&self) -> f64 {
        self.horizontal_velocity
    }

    /// Vertical velocity (positive is downward).
    pub fn vertical_velocity(&self) -> f64 {
        self.vertical_velocity
    }

    /// Add an impulse. `vertical` is *upward* strength.
    pub fn push(&mut self, horizontal: f64, vertical: f64) {
        self.horizontal_velocity += horizontal;
        self.vertical_velocity -= vertical;
    }

    /// Overwrite horizontal velocity, as a kick does.
    pub fn set_horizontal_velocity(&mut self, velocity: f64) {
        self.horizontal_velocity = velocity;
    }

    /// Facing: -1 left, 1 right.
    pub fn look_direction(&self) -> i8 {
        self.look_direction
    }

    /// Face the sign of `direction`. Zero leaves facing unchanged.
    pub fn set_look_direction(&mut self, direction: f64) {
        if direction == 0.0 {
            return;
        }
        self.look_direction = if direction < 0.0 { -1 } else { 1 };
    }

    // -- health ---------------------------------------------------------------

    /// Current health, always within `[0, max_health]`.
    pub fn health(&self) -> f64 {
        self.health
    }

    /// Maximum health.
    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    /// Whether the character is alive.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the character is dead.
    pub fn is_dead(&self) -> bool {
        !self.alive
    }

    /// Why the character died, if it did and a reason was given.
    pub fn death_reason(&self) -> Option<&str> {
        self.death_reason.as_deref()
    }

    /// Subtract health. Returns `true` if this call killed the character.
    ///
    /// Death happens once, the first time health drops below 1; later damage
    /// on a dead character is ignored. Non-finite amounts are ignored too.
    pub fn damage(&mut self, amount: f64, reason: &str) -> bool {
        if !self.alive || !amount.is_finite() {
            return false;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        if self.health < 1.0 {
            self.alive = false;
            if !reason.is_empty() {
                self.death_reason = Some(reason.to_owned());
            }
            return true;
        }
        false
    }

    /// Add health, capped at maximum. Dead characters stay dead.
    pub fn heal(&mut self, amount: f64) {
        if self.alive && amount.is_finite() {
            self.health = (self.health + amount).clamp(0.0, self.max_health);
        }
    }

    /// Refill health to maximum.
    pub fn restore_health(&mut self) {
        if self.alive {
            self.health = self.max_health;
        }
    }

    // -- weapon ---------------------------------------------------------------

    /// Equipped weapon.
    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    /// Mutable equipped weapon.
    pub fn weapon_mut(&mut self) -> Option<&mut Weapon> {
        self.weapon.as_mut()
    }

    // -- zombie decay ---------------------------------------------------------

    /// Start losing `rate` health per second until dead.
    pub fn enable_destruction(&mut self, rate: f64) {
        self.destruction_rate = Some(rate);
    }

    /// Whether self-destruction is active.
    pub fn destruction_enabled(&self) -> bool {
        self.destruction_rate.is_some()
    }

    /// Every float field, for corruption checks.
    pub(crate) fn float_fields(&self) -> [(&'static str, f64); 5] {
        [
            ("x", self.position.x),
            ("y", self.position.y),
            ("horizontal_velocity", self.horizontal_velocity),
            ("vertical_velocity", self.vertical_velocity),
            ("health", self.health),
        ]
    }
}
