//! Duel lifecycle through the arena: corners, countdown, fight, resolution.

use catbrawl_engine::prelude::*;
use catbrawl_engine::services::recording::{self, Recorder};

// -- helpers ----------------------------------------------------------------

/// A 100 px wide stage with 80 px bodies: both corner targets lie inside both
/// duelists' boxes, and the boxes overlap, so nobody has to walk.
fn small_arena(prepare_secs: f64) -> (Arena, Recorder) {
    small_arena_with(DuelConfig {
        prepare_secs,
        fight_secs: 10.0,
        reconcile: false,
        ..Default::default()
    })
}

fn small_arena_with(duel: DuelConfig) -> (Arena, Recorder) {
    let config = ArenaConfig {
        fixed_dt: 0.05,
        seed: 7,
        stage: StageConfig {
            width: 100.0,
            ..Default::default()
        },
        duel,
        ..Default::default()
    };
    let (services, recorder) = recording::services();
    (Arena::new(config, services).unwrap(), recorder)
}

fn grounded(arena: &Arena, x: f64) -> Point {
    let stage = arena.world().stage();
    Point::new(x, stage.height - stage.character_height)
}

fn boxer(arena: &mut Arena, name: &str, x: f64, damage: f64) -> EntityId {
    let at = grounded(arena, x);
    arena
        .spawn_character(
            CharacterSpec::viewer(name)
                .at(at)
                .with_weapon(Weapon::Fists(Fists::new(damage, damage, 0.0, 0.0, 0.0))),
        )
        .unwrap()
}

fn bystander(arena: &mut Arena, name: &str, x: f64) -> EntityId {
    let at = grounded(arena, x);
    arena.spawn_character(CharacterSpec::viewer(name).at(at)).unwrap()
}

fn health(arena: &Arena, id: EntityId) -> f64 {
    arena.world().get(id).map_or(0.0, |c| c.health())
}

fn duel_stage(arena: &Arena, id: EventId) -> Option<String> {
    arena.events().get(id).map(|e| format!("{e:?}"))
}

fn queue_names(arena: &Arena, id: EntityId) -> Vec<&'static str> {
    arena
        .brain(id)
        .unwrap()
        .queue()
        .iter()
        .map(Task::name)
        .collect()
}

fn kiss_targets(arena: &Arena, id: EntityId) -> Vec<EntityId> {
    arena
        .brain(id)
        .unwrap()
        .queue()
        .iter()
        .filter_map(|t| match t.kind() {
            TaskKind::GoAndKiss(kiss) => Some(kiss.target()),
            _ => None,
        })
        .collect()
}

/// Tick until `duel` is reaped, stopping right after the resolving frame.
fn run_until_reaped(arena: &mut Arena, duel: EventId, limit: u64) {
    for _ in 0..limit {
        if arena.events().get(duel).is_none() {
            return;
        }
        arena.tick();
    }
    panic!("duel still running after {limit} frames");
}

// -- tests ------------------------------------------------------------------

#[test]
fn ten_damage_fists_take_thirty_health_in_three_fight_frames() {
    let (mut arena, recorder) = small_arena(0.05);
    let a = boxer(&mut arena, "a", 0.0, 10.0);
    let b = bystander(&mut arena, "b", 20.0);

    let duel = arena.start_duel(a, b).unwrap();
    assert!(arena.any_event_blocking());
    assert!(arena.redeem_blocked_by_active_event(RedeemKind::StartDuel));
    assert_eq!(
        recorder.messages(),
        vec!["ATTENTION! @a challenged @b to a duel!".to_owned()]
    );
    assert_eq!(recorder.snapshot().created[0].outcomes, vec!["a", "b"]);

    // Corners reached and the countdown expires.
    arena.tick();
    assert!(duel_stage(&arena, duel).unwrap().contains("Fighting"));
    assert_eq!(recorder.updates(), vec![PredictionUpdate::Locked]);

    arena.run_ticks(3);
    assert_eq!(health(&arena, b), 70.0);
    assert_eq!(health(&arena, a), 100.0);
    assert!(arena.events().get(duel).is_some_and(|e| !e.is_done()));
}

#[test]
fn knockout_resolves_to_the_winner() {
    let (mut arena, recorder) = small_arena(0.05);
    let a = boxer(&mut arena, "a", 0.0, 30.0);
    let b = bystander(&mut arena, "b", 20.0);
    let duel = arena.start_duel(a, b).unwrap();

    arena.run_ticks(10);
    assert!(!arena.world().contains(b), "loser is reaped");
    assert!(arena.events().get(duel).is_none(), "duel is reaped");
    assert!(!arena.any_event_blocking());
    assert_eq!(
        recorder.updates(),
        vec![
            PredictionUpdate::Locked,
            PredictionUpdate::Resolved {
                winner: "a".to_owned(),
                reason: String::new(),
            },
        ]
    );
    assert!(recorder.messages().contains(&"@a won the duel!".to_owned()));
    assert!(recorder
        .messages()
        .contains(&"@b died knocked out by a".to_owned()));

    // The winner is healed and wanders again.
    assert_eq!(health(&arena, a), 100.0);
    let head = arena.current_task(a).unwrap();
    assert_eq!(head.name(), "idle_walk");
    assert!(!head.is_blocking());
}

#[test]
fn simultaneous_death_cancels_with_the_draw_reason() {
    let (mut arena, recorder) = small_arena(0.05);
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    arena.start_duel(a, b).unwrap();
    arena.tick();

    for id in [a, b] {
        arena.world_mut().get_mut(id).unwrap().damage(1_000.0, "lightning");
    }
    arena.tick();

    assert_eq!(
        recorder.updates().last(),
        Some(&PredictionUpdate::Canceled {
            reason: "Draw!".to_owned(),
        })
    );
    assert!(!arena.any_event_blocking());
}

#[test]
fn timer_expiry_decides_on_health() {
    let (mut arena, recorder) = small_arena(0.05);
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    let fight_frames = (10.0_f64 / 0.05).round() as u64;

    arena.start_duel(a, b).unwrap();
    arena.tick();
    arena.world_mut().get_mut(a).unwrap().damage(5.0, "");
    arena.run_ticks(fight_frames + 2);

    assert!(matches!(
        recorder.updates().last(),
        Some(PredictionUpdate::Resolved { winner, .. }) if winner == "b"
    ));
}

#[test]
fn bystanders_gather_and_cheer_until_the_duel_ends() {
    let (mut arena, _recorder) = small_arena(0.05);
    let a = boxer(&mut arena, "a", 0.0, 30.0);
    let b = bystander(&mut arena, "b", 20.0);
    let fan = bystander(&mut arena, "fan", 10.0);
    let duel = arena.start_duel(a, b).unwrap();

    let queue: Vec<&str> = arena
        .brain(fan)
        .unwrap()
        .queue()
        .iter()
        .map(Task::name)
        .collect();
    assert_eq!(queue, ["go_to", "cheer"]);
    assert!(arena.events().claim_of(fan).is_none());
    assert_eq!(arena.events().claim_of(a), Some(duel));

    arena.run_ticks(10);
    assert!(arena.events().get(duel).is_none());
    assert!(arena
        .brain(fan)
        .unwrap()
        .queue()
        .iter()
        .all(|t| t.name() != "cheer"));
}

#[test]
fn duelists_cannot_be_claimed_twice() {
    let (mut arena, _recorder) = small_arena(5.0);
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    let c = bystander(&mut arena, "c", 10.0);
    let first = arena.start_duel(a, b).unwrap();

    let err = arena.start_duel(b, c).unwrap_err();
    assert!(matches!(
        err,
        EventError::ClaimConflict { entity, holder, .. } if entity == b && holder == first
    ));
    assert!(arena.journal().events().any(|e| matches!(
        e,
        ArenaEvent::EventRejected { name, .. } if name == "duel"
    )));
}

#[test]
fn cancelling_a_fight_hands_the_duelists_back() {
    let (mut arena, recorder) = small_arena(0.05);
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    let duel = arena.start_duel(a, b).unwrap();
    arena.tick();
    assert_eq!(arena.current_task(a).unwrap().name(), "kill");
    arena.world_mut().get_mut(a).unwrap().damage(5.0, "");

    assert!(arena.events_mut().cancel(duel));
    assert!(arena.any_event_blocking(), "cleanup waits for the next frame");
    arena.tick();

    assert!(arena.events().get(duel).is_none());
    assert!(!arena.any_event_blocking());
    assert_eq!(
        recorder.updates(),
        vec![
            PredictionUpdate::Locked,
            PredictionUpdate::Canceled {
                reason: "Duel canceled".to_owned(),
            },
        ]
    );
    for id in [a, b] {
        assert_eq!(queue_names(&arena, id), ["idle_walk"]);
        assert!(!arena.current_task(id).unwrap().is_blocking());
        assert_eq!(health(&arena, id), 100.0);
        assert!(arena.events().claim_of(id).is_none());
    }
}

#[test]
fn cancelling_during_preparation_releases_the_crowd() {
    let (mut arena, recorder) = small_arena(5.0);
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    let fan = bystander(&mut arena, "fan", 10.0);
    let duel = arena.start_duel(a, b).unwrap();

    arena.events_mut().cancel(duel);
    arena.tick();

    assert!(arena.events().get(duel).is_none());
    assert_eq!(
        recorder.updates(),
        vec![PredictionUpdate::Canceled {
            reason: "Duel canceled".to_owned(),
        }]
    );
    assert_eq!(queue_names(&arena, fan).last(), Some(&"idle_walk"));
    assert_eq!(queue_names(&arena, a), ["idle_walk"]);
}

#[test]
fn a_second_duel_leaves_the_first_duelists_alone() {
    let (mut arena, _recorder) = small_arena(5.0);
    let p = bystander(&mut arena, "p", 0.0);
    let r = bystander(&mut arena, "r", 20.0);
    let s = bystander(&mut arena, "s", 40.0);
    let t = bystander(&mut arena, "t", 60.0);

    let first = arena.start_duel(p, r).unwrap();
    let before = [queue_names(&arena, p), queue_names(&arena, r)];
    assert_eq!(before[0], ["go_to"]);

    let second = arena.start_duel(s, t).unwrap();
    assert_eq!(arena.events().claim_of(p), Some(first));
    assert_eq!([queue_names(&arena, p), queue_names(&arena, r)], before);

    // Ending the second duel does not touch the first one's duelists either.
    arena.events_mut().cancel(second);
    arena.tick();
    assert!(arena.events().get(second).is_none());
    for id in [p, r] {
        let queue = queue_names(&arena, id);
        assert!(!queue.contains(&"idle_walk"), "{queue:?}");
        assert!(!queue.contains(&"cheer"), "{queue:?}");
    }
    for id in [s, t] {
        assert_eq!(queue_names(&arena, id), ["idle_walk"]);
    }
    assert_eq!(arena.events().claim_of(p), Some(first));
}

#[test]
fn reconciliation_sends_loser_and_crowd_to_kiss_the_winner() {
    let (mut arena, _recorder) = small_arena_with(DuelConfig {
        prepare_secs: 0.05,
        fight_secs: 1.0,
        reconcile: true,
        ..Default::default()
    });
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    let fan = bystander(&mut arena, "fan", 10.0);
    let duel = arena.start_duel(a, b).unwrap();
    arena.tick();
    arena.world_mut().get_mut(a).unwrap().damage(5.0, "");

    run_until_reaped(&mut arena, duel, 100);

    // b has more health when the timer runs out.
    assert_eq!(queue_names(&arena, a), ["go_and_kiss", "idle_walk"]);
    assert_eq!(kiss_targets(&arena, a), [b]);
    assert_eq!(queue_names(&arena, b), ["idle_walk"]);
    assert_eq!(kiss_targets(&arena, fan), [b]);
    assert_eq!(queue_names(&arena, fan).last(), Some(&"idle_walk"));
}

#[test]
fn reconciliation_on_a_draw_starts_with_the_challenger() {
    let (mut arena, _recorder) = small_arena_with(DuelConfig {
        prepare_secs: 0.05,
        fight_secs: 1.0,
        reconcile: true,
        ..Default::default()
    });
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    let duel = arena.start_duel(a, b).unwrap();

    run_until_reaped(&mut arena, duel, 100);

    assert_eq!(kiss_targets(&arena, a), [b]);
    assert!(kiss_targets(&arena, b).is_empty());
}

#[test]
fn no_reconciliation_when_disabled() {
    let (mut arena, _recorder) = small_arena(0.05);
    let a = bystander(&mut arena, "a", 0.0);
    let b = bystander(&mut arena, "b", 20.0);
    let fan = bystander(&mut arena, "fan", 10.0);
    let duel = arena.start_duel(a, b).unwrap();
    arena.tick();
    arena.world_mut().get_mut(a).unwrap().damage(5.0, "");

    run_until_reaped(&mut arena, duel, 400);

    for id in [a, b, fan] {
        assert!(kiss_targets(&arena, id).is_empty());
    }
    assert_eq!(queue_names(&arena, a), ["idle_walk"]);
}
