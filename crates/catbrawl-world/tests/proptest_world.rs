//! Property tests for the character registry and body physics.
//!
//! Random sequences of effector calls and physics steps must never break the
//! health range, the single-death rule, or the stage bounds.

use catbrawl_world::prelude::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Operations applied to a random character.
#[derive(Debug, Clone)]
enum BodyOp {
    Damage(usize, f64),
    Heal(usize, f64),
    Push(usize, f64, f64),
    Walk(usize, i8),
    Step(f64),
    Despawn(usize),
    Spawn,
}

fn body_op_strategy() -> impl Strategy<Value = BodyOp> {
    prop_oneof![
        (0..8usize, 0.0..150.0f64).prop_map(|(i, d)| BodyOp::Damage(i, d)),
        (0..8usize, 0.0..150.0f64).prop_map(|(i, h)| BodyOp::Heal(i, h)),
        (0..8usize, -400.0..400.0f64, -400.0..400.0f64)
            .prop_map(|(i, h, v)| BodyOp::Push(i, h, v)),
        (0..8usize, -1i8..=1).prop_map(|(i, d)| BodyOp::Walk(i, d)),
        (0.001..0.2f64).prop_map(BodyOp::Step),
        (0..8usize).prop_map(BodyOp::Despawn),
        Just(BodyOp::Spawn),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn bodies_stay_in_bounds_and_die_once(ops in prop::collection::vec(body_op_strategy(), 1..80)) {
        let mut rng = Pcg64::seed_from_u64(42);
        let mut world = World::new(StageConfig::default(), CombatConfig::default());
        let stage = world.stage().clone();
        let mut spawned = 0usize;
        let mut deaths = 0usize;

        for op in ops {
            let ids = world.ids();
            let pick = |i: usize| if ids.is_empty() { None } else { Some(ids[i % ids.len()]) };
            match op {
                BodyOp::Spawn => {
                    spawned += 1;
                    world.spawn(CharacterSpec::viewer(&format!("v{spawned}")), &mut rng).unwrap();
                }
                BodyOp::Damage(i, d) => {
                    if let Some(ch) = pick(i).and_then(|id| world.get_mut(id)) {
                        if ch.damage(d, "test") {
                            deaths += 1;
                        }
                    }
                }
                BodyOp::Heal(i, h) => {
                    if let Some(ch) = pick(i).and_then(|id| world.get_mut(id)) {
                        ch.heal(h);
                    }
                }
                BodyOp::Push(i, h, v) => {
                    if let Some(ch) = pick(i).and_then(|id| world.get_mut(id)) {
                        ch.push(h, v);
                    }
                }
                BodyOp::Walk(i, d) => {
                    if let Some(ch) = pick(i).and_then(|id| world.get_mut(id)) {
                        ch.set_move_direction(d);
                    }
                }
                BodyOp::Step(dt) => {
                    for id in &ids {
                        let ch = world.get_mut(*id).unwrap();
                        integrate(ch, dt, &stage).unwrap();
                    }
                }
                BodyOp::Despawn(i) => {
                    if let Some(id) = pick(i) {
                        world.despawn(id).unwrap();
                    }
                }
            }

            let dead_on_stage = world.iter().filter(|c| c.is_dead()).count();
            prop_assert!(dead_on_stage <= deaths);
            for ch in world.iter() {
                prop_assert!(ch.health() >= 0.0 && ch.health() <= ch.max_health());
                prop_assert_eq!(ch.is_alive(), ch.health() >= 1.0);
                prop_assert!(ch.position().x >= 0.0);
                prop_assert!(ch.position().x <= stage.width - stage.character_width);
                prop_assert!(ch.position().y <= ch.floor_y());
                prop_assert!(ch.position().y >= -(stage.character_height * 2.0));
            }
        }
    }
}
