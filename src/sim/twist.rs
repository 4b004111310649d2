//! Plot twist scheduler (Life mode only)
//!
//! Twists are temporary global events: an immediate metrics jolt, an ongoing
//! per-second delta, and bonus multipliers for listed actions. At most one is
//! active at a time and at most two fire per session. Selection may go
//! through an injected verifiable-randomness provider; on any failure the
//! scheduler falls back to the session's local RNG and never blocks.

use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::state::{Action, MetricDelta, Mode, SessionState};

/// Closed set of plot twist kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlotTwistId {
    SugarCrash,
    HeatWave,
    PartyInvite,
    SecondWind,
    MindfulMoment,
}

impl PlotTwistId {
    pub fn name(&self) -> &'static str {
        match self {
            PlotTwistId::SugarCrash => "Sugar Crash",
            PlotTwistId::HeatWave => "Heat Wave",
            PlotTwistId::PartyInvite => "Party Invite",
            PlotTwistId::SecondWind => "Second Wind",
            PlotTwistId::MindfulMoment => "Mindful Moment",
        }
    }
}

/// A plot twist definition, copied into the session while active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotTwist {
    pub id: PlotTwistId,
    pub duration_secs: u32,
    /// Applied once when the twist fires
    pub immediate: MetricDelta,
    /// Applied every countdown tick while active
    pub ongoing: MetricDelta,
    /// Actions earning a 1.5x bonus while active
    pub bonus_actions: Vec<Action>,
    /// Shares earn an extra 2.0x while active
    pub share_bonus: bool,
}

/// Mode-appropriate twist pool
pub static TWIST_POOL: LazyLock<Vec<PlotTwist>> = LazyLock::new(|| {
    vec![
        PlotTwist {
            id: PlotTwistId::SugarCrash,
            duration_secs: 8,
            immediate: MetricDelta::new(-10.0, 0.0, 0.0, -6.0),
            ongoing: MetricDelta::new(-1.0, 0.0, 0.0, -0.5),
            bonus_actions: vec![Action::Consume],
            share_bonus: false,
        },
        PlotTwist {
            id: PlotTwistId::HeatWave,
            duration_secs: 10,
            immediate: MetricDelta::new(0.0, -12.0, 0.0, 0.0),
            ongoing: MetricDelta::new(0.0, -1.5, 0.0, 0.0),
            bonus_actions: vec![Action::Consume],
            share_bonus: false,
        },
        PlotTwist {
            id: PlotTwistId::PartyInvite,
            duration_secs: 12,
            immediate: MetricDelta::new(5.0, 0.0, 0.0, 0.0),
            ongoing: MetricDelta::ZERO,
            bonus_actions: vec![Action::Share],
            share_bonus: true,
        },
        PlotTwist {
            id: PlotTwistId::SecondWind,
            duration_secs: 8,
            immediate: MetricDelta::new(8.0, 0.0, 0.0, 4.0),
            ongoing: MetricDelta::new(2.0, 0.0, 0.0, 0.0),
            bonus_actions: vec![Action::Save],
            share_bonus: false,
        },
        PlotTwist {
            id: PlotTwistId::MindfulMoment,
            duration_secs: 10,
            immediate: MetricDelta::new(0.0, 0.0, 0.0, 10.0),
            ongoing: MetricDelta::new(0.0, 0.0, 0.0, 1.0),
            bonus_actions: vec![Action::Reject],
            share_bonus: false,
        },
    ]
});

/// Error from an external randomness provider
#[derive(Debug)]
pub struct RandomnessError(pub String);

impl fmt::Display for RandomnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "randomness provider failed: {}", self.0)
    }
}

impl std::error::Error for RandomnessError {}

/// Optional external collaborator supplying verifiable random values for
/// twist selection. Failure must never block or abort the session.
pub trait RandomnessProvider {
    fn random_u64(&mut self) -> Result<u64, RandomnessError>;
}

/// Schedule the next twist check a random 15-35s from now
pub fn schedule_next_check(state: &mut SessionState) {
    if state.twist.triggered >= MAX_TWISTS_PER_SESSION {
        state.twist.next_check_tick = None;
        return;
    }
    let delay = state
        .rng()
        .random_range(TWIST_DELAY_MIN_SECS..=TWIST_DELAY_MAX_SECS) as u64;
    state.twist.next_check_tick = Some(state.fast_ticks + delay * FAST_TICKS_PER_SECOND);
}

/// Run the scheduler once per countdown tick. Fires at most one twist, and
/// only when none is active, fewer than two have triggered, and at least ten
/// seconds remain.
pub fn run_scheduler(state: &mut SessionState, provider: Option<&mut dyn RandomnessProvider>) {
    if state.mode != Mode::Life {
        return;
    }
    let Some(check_at) = state.twist.next_check_tick else {
        return;
    };
    if state.fast_ticks < check_at || state.twist.active.is_some() {
        return;
    }
    state.twist.next_check_tick = None;
    if state.twist.triggered >= MAX_TWISTS_PER_SESSION
        || state.time_remaining < TWIST_MIN_TIME_LEFT
    {
        return;
    }

    let pool = &*TWIST_POOL;
    let idx = match provider.map(|p| p.random_u64()) {
        Some(Ok(value)) => (value % pool.len() as u64) as usize,
        Some(Err(err)) => {
            log::warn!("{err}; falling back to local randomness");
            state.rng().random_range(0..pool.len())
        }
        None => state.rng().random_range(0..pool.len()),
    };
    let twist = pool[idx].clone();

    log::info!(
        "Plot twist '{}' fired at t-{}s (#{} this session)",
        twist.id.name(),
        state.time_remaining,
        state.twist.triggered + 1
    );
    state.metrics.apply(&twist.immediate);
    state.twist.remaining = twist.duration_secs;
    state.twist.triggered += 1;
    state.announce(format!("Plot twist: {}!", twist.id.name()));
    state.twist.active = Some(twist);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::{DifficultyProfile, Tier};

    struct FailingProvider;
    impl RandomnessProvider for FailingProvider {
        fn random_u64(&mut self) -> Result<u64, RandomnessError> {
            Err(RandomnessError("timeout".into()))
        }
    }

    struct FixedProvider(u64);
    impl RandomnessProvider for FixedProvider {
        fn random_u64(&mut self) -> Result<u64, RandomnessError> {
            Ok(self.0)
        }
    }

    fn life_state(profile: &DifficultyProfile) -> SessionState {
        SessionState::new(99, Mode::Life, profile)
    }

    #[test]
    fn test_fires_when_check_is_due() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = life_state(&profile);
        state.twist.next_check_tick = Some(0);
        run_scheduler(&mut state, Some(&mut FixedProvider(2)));
        let active = state.twist.active.as_ref().expect("twist should fire");
        assert_eq!(active.id, TWIST_POOL[2].id);
        assert_eq!(state.twist.triggered, 1);
        assert_eq!(state.twist.remaining, active.duration_secs);
    }

    #[test]
    fn test_provider_failure_falls_back_locally() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = life_state(&profile);
        state.twist.next_check_tick = Some(0);
        run_scheduler(&mut state, Some(&mut FailingProvider));
        assert!(state.twist.active.is_some(), "fallback must still fire");
    }

    #[test]
    fn test_never_fires_in_classic_mode() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = SessionState::new(99, Mode::Classic, &profile);
        state.twist.next_check_tick = Some(0);
        run_scheduler(&mut state, None);
        assert!(state.twist.active.is_none());
    }

    #[test]
    fn test_third_trigger_never_fires() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = life_state(&profile);
        state.twist.triggered = MAX_TWISTS_PER_SESSION;
        state.twist.next_check_tick = Some(0);
        run_scheduler(&mut state, None);
        assert!(state.twist.active.is_none());
        assert_eq!(state.twist.next_check_tick, None);
    }

    #[test]
    fn test_no_fire_with_under_ten_seconds_left() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = life_state(&profile);
        state.time_remaining = 9;
        state.twist.next_check_tick = Some(0);
        run_scheduler(&mut state, None);
        assert!(state.twist.active.is_none());
    }

    #[test]
    fn test_no_overlap_while_twist_active() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = life_state(&profile);
        state.twist.active = Some(TWIST_POOL[0].clone());
        state.twist.remaining = 5;
        state.twist.triggered = 1;
        state.twist.next_check_tick = Some(0);
        run_scheduler(&mut state, None);
        // Still exactly one active twist, and the counter did not move
        assert_eq!(state.twist.triggered, 1);
        assert_eq!(state.twist.active.as_ref().unwrap().id, TWIST_POOL[0].id);
    }
}
