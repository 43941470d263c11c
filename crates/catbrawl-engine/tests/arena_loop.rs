//! Whole-frame behavior: determinism, deaths, conversions and storms.

use catbrawl_engine::prelude::*;
use catbrawl_engine::services::recording::{self, Recorder};

// -- helpers ----------------------------------------------------------------

fn arena(seed: u64) -> (Arena, Recorder) {
    let config = ArenaConfig {
        seed,
        ..Default::default()
    };
    let (services, recorder) = recording::services();
    (Arena::new(config, services).unwrap(), recorder)
}

fn floor_point(arena: &Arena, x: f64) -> Point {
    let stage = arena.world().stage();
    Point::new(x, stage.height - stage.character_height)
}

/// Spawn, wander, duel, storm and invade; identical scripts must give
/// identical runs.
fn scripted_run(seed: u64) -> (Vec<String>, Vec<JournalEntry>) {
    let (mut arena, _) = arena(seed);
    for name in ["tom", "jerry", "spike", "tyke"] {
        arena.redeem(&Redemption::new(name, "spawn")).unwrap();
        arena.redeem(&Redemption::new(name, "wander")).unwrap();
    }
    arena
        .redeem(&Redemption::new("tom", "start duel").with_input("jerry"))
        .unwrap();

    let mut hashes = Vec::new();
    for frame in 0..3_000 {
        if frame == 1_500 {
            let _ = arena.redeem(&Redemption::new("spike", "start storm"));
        }
        if frame == 2_000 {
            let _ = arena.redeem(&Redemption::new("tyke", "zombie attack"));
        }
        arena.tick();
        if frame % 250 == 0 {
            hashes.push(arena.state_hash());
        }
    }
    (hashes, arena.journal().entries().to_vec())
}

// -- tests ------------------------------------------------------------------

#[test]
fn identical_scripts_give_identical_runs() {
    let (hashes_a, journal_a) = scripted_run(77);
    let (hashes_b, journal_b) = scripted_run(77);
    assert_eq!(hashes_a, hashes_b);
    assert_eq!(journal_a, journal_b);
    assert!(journal_a
        .iter()
        .any(|e| matches!(&e.event, ArenaEvent::EventStarted { name, .. } if name == "duel")));
}

#[test]
fn zombie_kill_raises_the_victim() {
    let (mut arena, recorder) = arena(3);
    let tom_at = floor_point(&arena, 500.0);
    let tom = arena
        .spawn_character(CharacterSpec::viewer("tom").at(tom_at).with_health(1.0))
        .unwrap();
    let spec = arena.world().zombie_spec("z").at(floor_point(&arena, 520.0));
    let zombie = arena.spawn_character(spec).unwrap();
    assert_eq!(arena.brain(zombie).unwrap().hunt_phase(), Some(HuntPhase::Searching));

    // Seed the hunt, find the victim, land the punch.
    arena.run_ticks(3);

    assert!(!arena.world().contains(tom));
    assert_eq!(arena.find_viewer("tom"), None);
    let risen = arena
        .world()
        .iter()
        .find(|c| c.name() == "tom_zom")
        .expect("tom rose as a zombie");
    assert!(risen.is_zombie());
    assert!((risen.position().x - tom_at.x).abs() < 1.0);
    assert!(arena.brain(risen.id()).is_some_and(|b| !b.is_player()));

    assert!(arena.journal().events().any(|e| matches!(
        e,
        ArenaEvent::Converted { victim, .. } if victim == "tom"
    )));
    assert!(recorder
        .messages()
        .contains(&"@tom died knocked out by z".to_owned()));
    assert!(recorder.snapshot().sounds.contains(&SoundCue::Punch));
}

#[test]
fn ghost_rises_and_finishes() {
    let (mut arena, _) = arena(1);
    let tom = arena.spawn_viewer("tom").unwrap();
    arena.world_mut().get_mut(tom).unwrap().damage(500.0, "");
    arena.tick();
    let ghost = arena
        .events()
        .iter()
        .find(|(_, e)| e.name() == "character_ghost")
        .map(|(id, _)| id)
        .unwrap();

    // An 80 px body rising at 50 px/s from near the top edge.
    arena.run_ticks(4 * 60);
    assert!(arena.events().get(ghost).is_none());
    assert!(arena.journal().events().any(|e| matches!(
        e,
        ArenaEvent::EventFinished { event, .. } if *event == ghost
    )));
    assert!(arena
        .journal()
        .events()
        .any(|e| matches!(e, ArenaEvent::Announced { text } if text == "@tom died")));
}

#[test]
fn storm_strikes_once_and_leaves() {
    let (mut arena, recorder) = arena(9);
    let tom_at = floor_point(&arena, 900.0);
    let tom = arena
        .spawn_character(CharacterSpec::viewer("tom").at(tom_at))
        .unwrap();
    let storm = arena.start_storm().unwrap();

    // 1920 + 400 px at 384 px/s.
    arena.run_ticks(8 * 60);
    assert_eq!(arena.world().get(tom).unwrap().health(), 49.0);
    assert_eq!(
        recorder
            .snapshot()
            .sounds
            .iter()
            .filter(|&&s| s == SoundCue::Thunder)
            .count(),
        1
    );
    assert!(arena.events().get(storm).is_none());
}

#[test]
fn storm_can_be_lethal() {
    let (mut arena, recorder) = arena(9);
    let tom_at = floor_point(&arena, 900.0);
    arena
        .spawn_character(CharacterSpec::viewer("tom").at(tom_at).with_health(40.0))
        .unwrap();
    arena.start_storm().unwrap();
    arena.run_ticks(8 * 60);

    assert!(arena.world().is_empty());
    assert!(recorder.messages().contains(&"@tom died storm".to_owned()));
}

#[test]
fn journal_drains_between_frames() {
    let (mut arena, _) = arena(2);
    arena.spawn_viewer("tom").unwrap();
    arena.tick();
    let drained = arena.journal_mut().drain();
    assert!(matches!(drained[0].event, ArenaEvent::Spawned { .. }));
    assert_eq!(drained[0].tick, 0);
    assert!(arena.journal().is_empty());
}
