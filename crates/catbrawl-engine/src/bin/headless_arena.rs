//! Headless arena run: a handful of viewers, a duel, a storm and a zombie
//! invasion, driven by redemptions. Prints the journal and the final state hash.
//!
//! Usage: `headless_arena [config.json] [ticks]`

use anyhow::Context;
use catbrawl_engine::prelude::*;
use catbrawl_engine::services::recording;

const VIEWERS: [&str; 6] = ["tom", "jerry", "spike", "tyke", "butch", "toodles"];

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ArenaConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => ArenaConfig::default(),
    };
    let ticks: u64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("bad tick count {raw:?}"))?,
        None => 6_000,
    };

    let (services, recorder) = recording::services();
    let mut arena = Arena::new(config, services)?;

    for name in VIEWERS {
        arena.redeem(&Redemption::new(name, "spawn"))?;
        arena.redeem(&Redemption::new(name, "wander"))?;
    }
    arena.redeem(&Redemption::new("tom", "start duel").with_input("@jerry"))?;

    let storm_at = ticks / 3;
    let invasion_at = ticks / 2;
    let mut invaded = false;
    for tick in 0..ticks {
        if tick == storm_at {
            if let Err(e) = arena.redeem(&Redemption::new("spike", "start storm")) {
                tracing::info!(reason = %e, "storm refused");
            }
        }
        if !invaded && tick >= invasion_at && !arena.any_event_blocking() {
            match arena.redeem(&Redemption::new("tyke", "zombie attack")) {
                Ok(_) => {
                    invaded = true;
                    tracing::info!(tick, "invasion started");
                }
                Err(e) => tracing::debug!(reason = %e, "invasion refused"),
            }
        }
        arena.tick();
    }

    for entry in arena.journal().entries() {
        println!("{:>6} {}", entry.tick, serde_json::to_string(&entry.event)?);
    }
    let recorded = recorder.snapshot();
    println!(
        "messages={} predictions={} updates={} sounds={}",
        recorded.messages.len(),
        recorded.created.len(),
        recorded.updates.len(),
        recorded.sounds.len()
    );
    println!(
        "tick={} alive_viewers={} alive_zombies={} hash={}",
        arena.tick_count(),
        arena.world().count_alive(Faction::Viewer),
        arena.world().count_alive(Faction::Zombie),
        arena.state_hash()
    );
    Ok(())
}
