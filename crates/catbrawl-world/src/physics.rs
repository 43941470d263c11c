//! Per-character physics integration.
//!
//! Each frame a character falls, then moves, then cools its weapon down, then
//! takes self-destruction damage if that is enabled. Tasks only set intents
//! (`move_direction`, impulses); [`integrate`] turns them into motion.
//!
//! The step is all-or-nothing from the caller's point of view: if any float
//! becomes non-finite, [`integrate`] returns [`WorldError::CorruptState`] and
//! the caller is expected to restore its pre-step copy of the character.

use crate::character::Character;
use crate::config::StageConfig;
use crate::WorldError;

/// Damage reason recorded when self-destruction finishes a zombie off.
pub const DESTRUCTION_REASON: &str = "destruction";

/// Advance one character by `dt` seconds.
pub fn integrate(ch: &mut Character, dt: f64, stage: &StageConfig) -> Result<(), WorldError> {
    fall(ch, dt, stage);
    walk(ch, dt, stage);

    if let Some(weapon) = ch.weapon.as_mut() {
        weapon.cool_down(dt);
    }

    if let Some(rate) = ch.destruction_rate {
        ch.damage(rate * dt, DESTRUCTION_REASON);
    }

    if let Some((field, value)) = ch.float_fields().into_iter().find(|(_, v)| !v.is_finite()) {
        return Err(WorldError::CorruptState {
            id: ch.id(),
            details: format!("{field} became {value}"),
        });
    }
    Ok(())
}

fn fall(ch: &mut Character, dt: f64, stage: &StageConfig) {
    if ch.vertical_velocity == 0.0 && !ch.is_falling() {
        return;
    }
    ch.position.y += ch.vertical_velocity * dt;
    ch.vertical_velocity += stage.gravity * dt;

    let (_, h) = ch.size();
    let ceiling = -(h * 2.0);
    if ch.position.y < ceiling {
        ch.position.y = ceiling;
        ch.vertical_velocity = 0.0;
    } else if ch.position.y > ch.floor_y() {
        ch.position.y = ch.floor_y();
        ch.vertical_velocity = 0.0;
    }
}

fn walk(ch: &mut Character, dt: f64, stage: &StageConfig) {
    if ch.move_direction == 0 && ch.horizontal_velocity == 0.0 {
        return;
    }
    if ch.is_falling() {
        if ch.horizontal_velocity != 0.0 {
            let slowed = ch.horizontal_velocity * (1.0 - stage.air_resistance * dt);
            ch.horizontal_velocity = (slowed * 100.0).round() / 100.0;
        }
    } else {
        ch.horizontal_velocity = f64::from(ch.move_direction) * ch.speed;
    }

    let dx = ch.horizontal_velocity * dt;
    ch.position.x += dx;
    ch.set_look_direction(dx);

    let (w, _) = ch.size();
    let right_limit = stage.width - w;
    if ch.position.x > right_limit {
        ch.position.x = right_limit;
        ch.move_direction = -1;
    } else if ch.position.x < 1.0 {
        ch.position.x = 0.0;
        ch.move_direction = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterSpec;
    use crate::entity::EntityId;
    use crate::geometry::Point;

    fn body_at(x: f64, y: f64, stage: &StageConfig) -> Character {
        Character::from_spec(
            EntityId::new(0, 0),
            CharacterSpec::viewer("tester"),
            Point::new(x, y),
            (stage.character_width, stage.character_height),
            stage.move_speed,
            stage.max_health,
            stage.height,
        )
    }

    #[test]
    fn airborne_body_lands_on_floor() {
        let stage = StageConfig::default();
        let mut ch = body_at(500.0, 0.0, &stage);
        for _ in 0..600 {
            integrate(&mut ch, 1.0 / 60.0, &stage).unwrap();
        }
        assert_eq!(ch.position().y, ch.floor_y());
        assert_eq!(ch.vertical_velocity(), 0.0);
        assert!(ch.on_the_ground());
    }

    #[test]
    fn grounded_walk_uses_speed() {
        let stage = StageConfig::default();
        let mut ch = body_at(500.0, stage.height - stage.character_height, &stage);
        ch.set_move_direction(1);
        integrate(&mut ch, 0.5, &stage).unwrap();
        assert_eq!(ch.position().x, 550.0);
        assert_eq!(ch.look_direction(), 1);
    }

    #[test]
    fn stage_edges_flip_direction() {
        let stage = StageConfig::default();
        let floor = stage.height - stage.character_height;
        let mut ch = body_at(stage.width - stage.character_width - 1.0, floor, &stage);
        ch.set_move_direction(1);
        integrate(&mut ch, 0.5, &stage).unwrap();
        assert_eq!(ch.position().x, stage.width - stage.character_width);
        assert_eq!(ch.move_direction(), -1);

        let mut left = body_at(10.0, floor, &stage);
        left.set_move_direction(-1);
        integrate(&mut left, 0.5, &stage).unwrap();
        assert_eq!(left.position().x, 0.0);
        assert_eq!(left.move_direction(), 1);
    }

    #[test]
    fn jump_is_capped_by_ceiling() {
        let stage = StageConfig::default();
        let mut ch = body_at(500.0, stage.height - stage.character_height, &stage);
        ch.push(0.0, 10_000.0);
        integrate(&mut ch, 1.0, &stage).unwrap();
        assert_eq!(ch.position().y, -(stage.character_height * 2.0));
        assert_eq!(ch.vertical_velocity(), 0.0);
    }

    #[test]
    fn air_resistance_slows_drift() {
        let stage = StageConfig::default();
        let mut ch = body_at(500.0, 0.0, &stage);
        ch.push(100.0, 0.0);
        integrate(&mut ch, 0.1, &stage).unwrap();
        assert_eq!(ch.horizontal_velocity(), 97.0);
    }

    #[test]
    fn destruction_kills_with_reason() {
        let stage = StageConfig::default();
        let mut ch = body_at(500.0, stage.height - stage.character_height, &stage);
        ch.enable_destruction(50.0);
        for _ in 0..3 {
            integrate(&mut ch, 1.0, &stage).unwrap();
        }
        assert!(ch.is_dead());
        assert_eq!(ch.death_reason(), Some(DESTRUCTION_REASON));
    }

    #[test]
    fn non_finite_velocity_is_reported() {
        let stage = StageConfig::default();
        let mut ch = body_at(500.0, 0.0, &stage);
        ch.push(f64::NAN, 0.0);
        let err = integrate(&mut ch, 0.1, &stage).unwrap_err();
        assert!(matches!(err, WorldError::CorruptState { .. }));
    }
}
