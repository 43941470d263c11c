//! The character registry.
//!
//! [`World`] owns every live [`Character`] in a slot vector addressed by
//! generational [`EntityId`]s. Viewer characters are also indexed by their
//! lower-cased name, which is unique among viewers; zombie names may repeat.
//!
//! Nothing here knows about tasks or events. Callers that need to iterate
//! while spawning or despawning take an id snapshot with [`World::ids`] first.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::character::{Character, CharacterSpec, Faction};
use crate::config::{CombatConfig, StageConfig};
use crate::entity::{EntityId, SlotAllocator};
use crate::geometry::Point;
use crate::weapon::{PunchKind, Weapon};
use crate::WorldError;

// ---------------------------------------------------------------------------
// Strikes
// ---------------------------------------------------------------------------

/// Outcome of a landed fist swing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    /// Punch variant that was rolled.
    pub kind: PunchKind,
    /// Damage dealt.
    pub damage: f64,
    /// Whether the punch killed the target.
    pub killed: bool,
}

/// Why a fist swing did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeRefusal {
    /// Attacker or target is not in the registry.
    UnknownEntity,
    /// The attacker carries no fist-type weapon.
    NoFists,
    /// The fists are still cooling down.
    CoolingDown,
    /// The two bounding boxes do not overlap.
    OutOfReach,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Registry of live characters plus the stage they stand on.
#[derive(Debug, Clone)]
pub struct World {
    stage: StageConfig,
    combat: CombatConfig,
    slots: SlotAllocator,
    characters: Vec<Option<Character>>,
    viewers_by_name: BTreeMap<String, EntityId>,
}

impl World {
    /// Create an empty world.
    pub fn new(stage: StageConfig, combat: CombatConfig) -> Self {
        Self {
            stage,
            combat,
            slots: SlotAllocator::new(),
            characters: Vec::new(),
            viewers_by_name: BTreeMap::new(),
        }
    }

    /// Stage layout.
    pub fn stage(&self) -> &StageConfig {
        &self.stage
    }

    /// Fist tuning.
    pub fn combat(&self) -> &CombatConfig {
        &self.combat
    }

    // -- lifecycle ------------------------------------------------------------

    /// Add a character. Missing position, size, speed and health fall back to
    /// stage defaults; a missing position is a random spawn point.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        mut spec: CharacterSpec,
        rng: &mut R,
    ) -> Result<EntityId, WorldError> {
        if spec.faction == Faction::Viewer && self.viewers_by_name.contains_key(&spec.name) {
            return Err(WorldError::DuplicateName { name: spec.name });
        }

        let position = spec
            .position
            .take()
            .unwrap_or_else(|| self.stage.random_spawn_position(rng));
        let size = spec
            .size
            .unwrap_or((self.stage.character_width, self.stage.character_height));
        let speed = spec.speed.unwrap_or(self.stage.move_speed);
        let max_health = spec.max_health.unwrap_or(self.stage.max_health);

        let id = self.slots.allocate();
        let character = Character::from_spec(
            id,
            spec,
            position,
            size,
            speed,
            max_health,
            self.stage.height,
        );
        if character.is_player() {
            self.viewers_by_name.insert(character.name().to_owned(), id);
        }
        tracing::debug!(%id, name = character.name(), faction = ?character.faction(), "spawned character");

        let idx = id.index() as usize;
        if idx >= self.characters.len() {
            self.characters.resize_with(idx + 1, || None);
        }
        self.characters[idx] = Some(character);
        Ok(id)
    }

    /// A zombie [`CharacterSpec`]: doubled health, faster walk, fists.
    pub fn zombie_spec(&self, name: &str) -> CharacterSpec {
        CharacterSpec::zombie(name)
            .with_max_health(self.stage.max_health * 2.0)
            .with_speed(self.stage.move_speed * 1.2)
            .with_weapon(Weapon::fists(&self.combat))
    }

    /// Remove a character from the registry, returning it.
    pub fn despawn(&mut self, id: EntityId) -> Result<Character, WorldError> {
        if !self.slots.is_live(id) {
            return Err(WorldError::UnknownEntity { id });
        }
        let character = self.characters[id.index() as usize]
            .take()
            .ok_or(WorldError::UnknownEntity { id })?;
        self.slots.release(id);
        if character.is_player() {
            self.viewers_by_name.remove(character.name());
        }
        Ok(character)
    }

    /// Replace a character's state wholesale, keeping its id.
    pub fn restore(&mut self, character: Character) -> Result<(), WorldError> {
        let id = character.id();
        let slot = self.get_mut(id).ok_or(WorldError::UnknownEntity { id })?;
        *slot = character;
        Ok(())
    }

    // -- lookup ---------------------------------------------------------------

    /// Whether `id` addresses a registered character (dead or alive).
    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.is_live(id)
    }

    /// Borrow a character.
    pub fn get(&self, id: EntityId) -> Option<&Character> {
        if !self.slots.is_live(id) {
            return None;
        }
        self.characters.get(id.index() as usize)?.as_ref()
    }

    /// Mutably borrow a character.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        if !self.slots.is_live(id) {
            return None;
        }
        self.characters.get_mut(id.index() as usize)?.as_mut()
    }

    /// Mutably borrow two distinct characters at once.
    pub fn pair_mut(
        &mut self,
        a: EntityId,
        b: EntityId,
    ) -> Option<(&mut Character, &mut Character)> {
        if a.index() == b.index() || !self.slots.is_live(a) || !self.slots.is_live(b) {
            return None;
        }
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        if ia < ib {
            let (lo, hi) = self.characters.split_at_mut(ib);
            Some((lo[ia].as_mut()?, hi[0].as_mut()?))
        } else {
            let (lo, hi) = self.characters.split_at_mut(ia);
            Some((hi[0].as_mut()?, lo[ib].as_mut()?))
        }
    }

    /// Look up a viewer by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.viewers_by_name
            .get(&name.trim().to_lowercase())
            .copied()
    }

    /// Whether `id` is registered and alive. Stale ids count as dead.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(Character::is_alive)
    }

    /// Snapshot of every registered id, in slot order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(Character::id).collect()
    }

    /// Iterate registered characters in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().flatten()
    }

    /// Number of registered characters.
    pub fn len(&self) -> usize {
        self.slots.live_count()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Living characters of one faction.
    pub fn count_alive(&self, faction: Faction) -> usize {
        self.iter()
            .filter(|c| c.faction() == faction && c.is_alive())
            .count()
    }

    /// The closest other character accepted by `filter`, measured between
    /// top-left corners. Ties go to the lower slot.
    pub fn nearest<F>(&self, from: EntityId, filter: F) -> Option<EntityId>
    where
        F: Fn(&Character) -> bool,
    {
        let origin = self.get(from)?.position();
        self.iter()
            .filter(|c| c.id() != from && filter(c))
            .map(|c| (c.position().distance(origin), c.id()))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    // -- effects --------------------------------------------------------------

    /// Swing the attacker's fists at the target.
    ///
    /// Checks run in order: both exist, fists equipped, fists ready, boxes
    /// overlap. On success the target takes damage and a knockback matching
    /// the rolled punch kind, and the fists start cooling down.
    pub fn strike<R: Rng + ?Sized>(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        rng: &mut R,
    ) -> Result<HitReport, StrikeRefusal> {
        let (hitter, victim) = self
            .pair_mut(attacker, target)
            .ok_or(StrikeRefusal::UnknownEntity)?;
        let attacker_x = hitter.position().x;
        let reach = hitter.rect().intersects(&victim.rect());
        let reason = format!("knocked out by {}", hitter.name());

        let fists = hitter
            .weapon_mut()
            .and_then(Weapon::as_fists_mut)
            .ok_or(StrikeRefusal::NoFists)?;
        if !fists.ready_to_use() {
            return Err(StrikeRefusal::CoolingDown);
        }
        if !reach {
            return Err(StrikeRefusal::OutOfReach);
        }

        let kind = fists.roll_kind(rng);
        let damage = fists.roll_damage(rng);
        let (hook, push) = (fists.hook_power, fists.push_power);
        fists.reset_cooldown();

        let killed = victim.damage(damage, &reason);
        match kind {
            PunchKind::Jab => {}
            PunchKind::Hook => victim.push(0.0, hook),
            PunchKind::Throw => {
                let side = if attacker_x > victim.position().x { -1.0 } else { 1.0 };
                victim.push(push * side, hook);
            }
        }
        Ok(HitReport {
            kind,
            damage,
            killed,
        })
    }

    /// Turn on self-destruction: `max_health / U{5..9}` health per second.
    pub fn enable_destruction<R: Rng + ?Sized>(&mut self, id: EntityId, rng: &mut R) -> bool {
        let divisor = f64::from(rng.gen_range(5_u32..10));
        match self.get_mut(id) {
            Some(ch) if !ch.destruction_enabled() => {
                let rate = ch.max_health() / divisor;
                ch.enable_destruction(rate);
                true
            }
            _ => false,
        }
    }

    /// A random spawn point for a new character.
    pub fn random_spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        self.stage.random_spawn_position(rng)
    }
}
