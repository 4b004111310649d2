//! Snack Dash headless driver
//!
//! Runs a full session without a renderer: a naive autoplay policy consumes
//! good foods and rejects bad ones, then the post-game summary is printed as
//! JSON. Useful for balancing runs and determinism checks.
//!
//! Usage: snack-dash [--seed N] [--tier NAME] [--mode classic|life]

use snack_dash::consts::{FAST_TICKS_PER_SECOND, SIM_DT};
use snack_dash::difficulty::DifficultyProfile;
use snack_dash::sim::{Action, Mode, Notification, SessionClock, SimEvent};
use snack_dash::summary::SessionSummary;

struct Args {
    seed: u64,
    tier: String,
    mode: Mode,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        seed: 42,
        tier: "standard".to_string(),
        mode: Mode::Life,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match flag.as_str() {
            "--seed" => {
                args.seed = value()?
                    .parse()
                    .map_err(|e| format!("invalid seed: {e}"))?;
            }
            "--tier" => args.tier = value()?,
            "--mode" => {
                args.mode = match value()?.to_lowercase().as_str() {
                    "classic" => Mode::Classic,
                    "life" => Mode::Life,
                    other => return Err(format!("unknown mode '{other}'")),
                };
            }
            other => return Err(format!("unknown flag '{other}'")),
        }
    }
    Ok(args)
}

/// One autoplay decision per countdown tick: act on the lowest entity
fn autoplay_step(clock: &mut SessionClock) {
    let Some(target) = clock
        .snapshot()
        .entities
        .iter()
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
    else {
        return;
    };
    let action = if target.is_good() {
        Action::Consume
    } else {
        Action::Reject
    };
    let event = SimEvent::Action {
        entity_id: target.id,
        action,
    };
    clock.submit(&event);
}

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("snack-dash: {err}");
            std::process::exit(2);
        }
    };
    let profile = DifficultyProfile::from_tier_name(&args.tier);
    log::info!(
        "Session start: seed={} tier={} mode={:?} ({}s)",
        args.seed,
        profile.tier.as_str(),
        args.mode,
        profile.duration_secs
    );

    let mut clock = SessionClock::new(args.seed, args.mode, profile);
    while !clock.snapshot().is_terminal() {
        clock.advance(SIM_DT, None);
        if clock.snapshot().fast_ticks % FAST_TICKS_PER_SECOND == 0 {
            autoplay_step(&mut clock);
        }
        for note in clock.state.drain_notifications() {
            match note {
                Notification::FoodConsumed { food, nutrients } => {
                    log::debug!("Consumed {food:?}: {nutrients:?}");
                }
            }
        }
    }

    let summary = SessionSummary::from_state(clock.snapshot(), &clock.profile);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("snack-dash: failed to encode summary: {err}");
            std::process::exit(1);
        }
    }
}
