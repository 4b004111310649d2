//! Session clock and result evaluation
//!
//! The whole engine is an explicit state machine: a closed `SimEvent` set and
//! a single `apply` transition on `SessionState`. Two fixed-rate loops drive
//! it - a ~30 Hz movement loop and a 1 Hz countdown loop - and player input
//! funnels through the same transition, so every update is atomic and the
//! external snapshot is always consistent.

use crate::consts::*;
use crate::difficulty::DifficultyProfile;
use crate::sim::movement::movement_tick;
use crate::sim::resolve::{PowerUp, invoke_power_up, resolve};
use crate::sim::spawn::run_spawner;
use crate::sim::state::{Action, MetricDelta, Mode, SessionResult, SessionState};
use crate::sim::twist::{RandomnessProvider, run_scheduler, schedule_next_check};

/// Life-mode base drain per countdown tick, before morning-condition scaling
pub const BASE_DRAIN: MetricDelta = MetricDelta::new(0.20, 0.25, 0.15, 0.10);

/// All events the simulation can consume. Timer events come from the
/// `SessionClock`; the rest are queued in from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Fast-loop tick (~30 Hz): spawning, movement, miss detection
    MovementTick,
    /// Slow-loop tick (1 Hz): countdown, drains, twists, result evaluation
    CountdownTick,
    /// Player swipe/tap resolved against an entity
    Action { entity_id: u32, action: Action },
    /// Charge-gated power-up invocation
    PowerUp(PowerUp),
    /// Gesture hold state: held entities do not advance
    Hold { entity_id: u32, held: bool },
    Pause,
    Resume,
}

/// Apply one event to the session. This is the single serialization point:
/// every mutation goes through here, one event at a time.
///
/// Terminal results are sticky - once the session is decided, every further
/// event is a no-op. Pausing freezes everything except `Resume`.
pub fn apply(
    state: &mut SessionState,
    profile: &DifficultyProfile,
    provider: Option<&mut dyn RandomnessProvider>,
    event: &SimEvent,
) {
    if state.is_terminal() {
        return;
    }
    match event {
        SimEvent::Pause => state.paused = true,
        SimEvent::Resume => state.paused = false,
        _ if state.paused => {}
        SimEvent::MovementTick => {
            state.fast_ticks += 1;
            run_spawner(state, profile);
            movement_tick(state, profile);
            state.normalize_order();
        }
        SimEvent::CountdownTick => countdown_tick(state, profile, provider),
        SimEvent::Action { entity_id, action } => resolve(state, profile, *entity_id, *action),
        SimEvent::PowerUp(kind) => invoke_power_up(state, *kind),
        SimEvent::Hold { entity_id, held } => {
            if let Some(entity) = state.entities.iter_mut().find(|e| e.id == *entity_id) {
                entity.held = *held;
            }
        }
    }
}

/// One countdown (1 Hz) tick: time, drains, twist lifecycle, history, result
fn countdown_tick(
    state: &mut SessionState,
    profile: &DifficultyProfile,
    provider: Option<&mut dyn RandomnessProvider>,
) {
    state.time_remaining = state.time_remaining.saturating_sub(1);

    // Body-state drain (Life mode), scaled by how the morning went
    if state.mode == Mode::Life {
        let rate = BASE_DRAIN.mul(&state.morning.drain_multipliers());
        state.metrics.drain(&rate);
    }

    // Active twist: ongoing effect, then lifetime decay
    if let Some(twist) = &state.twist.active {
        let ongoing = twist.ongoing;
        state.metrics.apply(&ongoing);
        state.twist.remaining = state.twist.remaining.saturating_sub(1);
        if state.twist.remaining == 0 {
            let name = twist.id.name();
            log::info!("Plot twist '{name}' expired");
            state.twist.active = None;
            state.announce(format!("{name} is over"));
            schedule_next_check(state);
        }
    }

    run_scheduler(state, provider);

    // Age the transient announcement
    if let Some(announcement) = &mut state.announcement {
        announcement.remaining_secs = announcement.remaining_secs.saturating_sub(1);
        if announcement.remaining_secs == 0 {
            state.announcement = None;
        }
    }

    let elapsed = state.elapsed_secs(profile);
    state.record_history(elapsed);

    evaluate_result(state, profile);
}

/// Immediate defeat check: fires mid-tick from the movement loop, after
/// action resolution, and at the top of every countdown evaluation.
pub(crate) fn check_immediate_defeat(state: &mut SessionState) {
    if state.is_terminal() {
        return;
    }
    let defeated = match state.mode {
        Mode::Classic => {
            state.metrics.stability <= CLASSIC_DEFEAT_LOW
                || state.metrics.stability >= CLASSIC_DEFEAT_HIGH
        }
        Mode::Life => state.metrics.any_at_or_below(LIFE_DEFEAT_FLOOR),
    };
    if defeated {
        log::info!(
            "Defeat: metrics hit a critical floor (stability {:.1})",
            state.metrics.stability
        );
        state.result = SessionResult::Defeat;
        state.announce("Defeat...");
    }
}

/// Full result evaluation: immediate defeat takes precedence, then the
/// time-up win predicate.
fn evaluate_result(state: &mut SessionState, profile: &DifficultyProfile) {
    check_immediate_defeat(state);
    if state.is_terminal() || state.time_remaining > 0 {
        return;
    }
    let won = match state.mode {
        Mode::Classic => {
            let (lo, hi) = profile.classic_win_band;
            (lo..=hi).contains(&state.metrics.stability) && state.score > 0
        }
        Mode::Life => state.metrics.all_above(profile.life_win_floor) && state.score > 0,
    };
    state.result = if won {
        SessionResult::Victory
    } else {
        SessionResult::Defeat
    };
    log::info!(
        "Session over by time: {:?} (score {}, stability {:.1})",
        state.result,
        state.score,
        state.metrics.stability
    );
    state.announce(match state.result {
        SessionResult::Victory => "Victory!",
        _ => "Time's up...",
    });
}

/// Fixed-timestep driver wrapping the event transition.
///
/// Converts wall-clock frame deltas into movement ticks, emitting one
/// countdown tick per simulated second. Player events go through `submit`
/// into the same serialized transition.
pub struct SessionClock {
    pub state: SessionState,
    pub profile: DifficultyProfile,
    accumulator: f32,
}

impl SessionClock {
    pub fn new(seed: u64, mode: Mode, profile: DifficultyProfile) -> Self {
        Self {
            state: SessionState::new(seed, mode, &profile),
            profile,
            accumulator: 0.0,
        }
    }

    /// Queue a player event into the serialized updater
    pub fn submit(&mut self, event: &SimEvent) {
        apply(&mut self.state, &self.profile, None, event);
    }

    /// Advance simulated time. While paused or terminal no ticks fire, so
    /// elapsed state is preserved exactly across pause/resume.
    pub fn advance(&mut self, dt: f32, mut provider: Option<&mut dyn RandomnessProvider>) {
        if self.state.paused || self.state.is_terminal() {
            return;
        }
        self.accumulator += dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            apply(&mut self.state, &self.profile, None, &SimEvent::MovementTick);
            if self.state.fast_ticks % FAST_TICKS_PER_SECOND == 0 {
                // Reborrow per substep so the provider survives the loop
                let p = provider
                    .as_mut()
                    .map(|p| &mut **p as &mut dyn RandomnessProvider);
                apply(&mut self.state, &self.profile, p, &SimEvent::CountdownTick);
            }
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    /// Immutable post-update snapshot for the rendering collaborator
    pub fn snapshot(&self) -> &SessionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::difficulty::Tier;
    use crate::sim::twist::{PlotTwist, PlotTwistId};

    fn setup(mode: Mode) -> (SessionState, DifficultyProfile) {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        (SessionState::new(404, mode, &profile), profile)
    }

    #[test]
    fn test_countdown_decrements_time_and_records_history() {
        let (mut state, profile) = setup(Mode::Life);
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert_eq!(state.time_remaining, profile.duration_secs - 1);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_life_drain_uses_morning_multipliers() {
        let (mut state, profile) = setup(Mode::Life);
        state.morning = crate::sim::state::MorningCondition::Groggy;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        // Groggy: energy drains at 0.20 * 1.5
        assert!((state.metrics.energy - 49.7).abs() < 1e-4);
        assert!((state.metrics.hydration - 49.75).abs() < 1e-4);
    }

    #[test]
    fn test_classic_mode_never_drains() {
        let (mut state, profile) = setup(Mode::Classic);
        for _ in 0..10 {
            apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        }
        assert_eq!(state.metrics.energy, 50.0);
        assert_eq!(state.metrics.stability, 50.0);
    }

    #[test]
    fn test_twist_drain_defeats_on_the_same_tick() {
        let (mut state, profile) = setup(Mode::Life);
        state.morning = crate::sim::state::MorningCondition::Rested;
        state.metrics.energy = 10.0;
        state.twist.active = Some(PlotTwist {
            id: PlotTwistId::SugarCrash,
            duration_secs: 8,
            immediate: MetricDelta::ZERO,
            ongoing: MetricDelta::new(-6.0, 0.0, 0.0, 0.0),
            bonus_actions: vec![],
            share_bonus: false,
        });
        state.twist.remaining = 5;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        // 10 - 0.2 (base drain) - 6 (twist) = 3.8, below the critical floor
        assert!((state.metrics.energy - 3.8).abs() < 1e-4);
        assert_eq!(state.result, SessionResult::Defeat);
    }

    #[test]
    fn test_drain_clamps_at_zero_never_negative() {
        let (mut state, profile) = setup(Mode::Life);
        state.metrics.hydration = 0.1;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert_eq!(state.metrics.hydration, 0.0);
    }

    #[test]
    fn test_twist_expiry_clears_and_reschedules() {
        let (mut state, profile) = setup(Mode::Life);
        state.twist.active = Some(crate::sim::twist::TWIST_POOL[0].clone());
        state.twist.remaining = 1;
        state.twist.triggered = 1;
        state.twist.next_check_tick = None;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert!(state.twist.active.is_none());
        assert!(
            state.twist.next_check_tick.is_some(),
            "a second twist may still fire"
        );
    }

    #[test]
    fn test_twist_expiry_after_cap_stops_scheduling() {
        let (mut state, profile) = setup(Mode::Life);
        state.twist.active = Some(crate::sim::twist::TWIST_POOL[0].clone());
        state.twist.remaining = 1;
        state.twist.triggered = MAX_TWISTS_PER_SESSION;
        state.twist.next_check_tick = None;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert!(state.twist.active.is_none());
        assert_eq!(state.twist.next_check_tick, None);
    }

    #[test]
    fn test_classic_time_up_victory_in_band() {
        let (mut state, profile) = setup(Mode::Classic);
        state.time_remaining = 1;
        state.score = 100;
        state.metrics.stability = 55.0;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert_eq!(state.result, SessionResult::Victory);
    }

    #[test]
    fn test_classic_time_up_defeat_outside_band() {
        let (mut state, profile) = setup(Mode::Classic);
        state.time_remaining = 1;
        state.score = 100;
        state.metrics.stability = 75.0;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert_eq!(state.result, SessionResult::Defeat);
    }

    #[test]
    fn test_zero_score_never_wins() {
        let (mut state, profile) = setup(Mode::Classic);
        state.time_remaining = 1;
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert_eq!(state.result, SessionResult::Defeat);
    }

    #[test]
    fn test_life_time_up_victory_needs_all_metrics_above_floor() {
        let (mut state, profile) = setup(Mode::Life);
        state.time_remaining = 1;
        state.score = 50;
        state.metrics.nutrition = 15.0; // at the floor, not above it
        apply(&mut state, &profile, None, &SimEvent::CountdownTick);
        assert_eq!(state.result, SessionResult::Defeat);
    }

    #[test]
    fn test_terminal_state_is_sticky_and_idempotent() {
        let (mut state, profile) = setup(Mode::Life);
        state.result = SessionResult::Victory;
        let score = state.score;
        let metrics = state.metrics;
        for _ in 0..5 {
            apply(&mut state, &profile, None, &SimEvent::CountdownTick);
            apply(&mut state, &profile, None, &SimEvent::MovementTick);
            apply(
                &mut state,
                &profile,
                None,
                &SimEvent::Action {
                    entity_id: 1,
                    action: Action::Consume,
                },
            );
        }
        assert_eq!(state.result, SessionResult::Victory);
        assert_eq!(state.score, score);
        assert_eq!(state.metrics, metrics);
    }

    #[test]
    fn test_pause_freezes_both_loops() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut clock = SessionClock::new(11, Mode::Life, profile);
        clock.submit(&SimEvent::Pause);
        clock.advance(5.0, None);
        assert_eq!(clock.state.fast_ticks, 0);
        assert_eq!(clock.state.time_remaining, clock.profile.duration_secs);

        clock.submit(&SimEvent::Resume);
        clock.advance(1.0, None);
        assert!(clock.state.fast_ticks > 0, "resume restarts the loops");
    }

    #[test]
    fn test_clock_emits_one_countdown_per_second() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let duration = profile.duration_secs;
        let mut clock = SessionClock::new(11, Mode::Classic, profile);
        // Feed three simulated seconds in frame-sized bites
        for _ in 0..(3 * FAST_TICKS_PER_SECOND) {
            clock.advance(SIM_DT, None);
        }
        assert_eq!(clock.state.fast_ticks, 3 * FAST_TICKS_PER_SECOND);
        assert_eq!(clock.state.time_remaining, duration - 3);
    }

    #[test]
    fn test_clock_threads_provider_into_twist_selection() {
        struct FixedProvider(u64);
        impl RandomnessProvider for FixedProvider {
            fn random_u64(&mut self) -> Result<u64, crate::sim::twist::RandomnessError> {
                Ok(self.0)
            }
        }
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut clock = SessionClock::new(9, Mode::Life, profile);
        clock.state.twist.next_check_tick = Some(0);
        let mut provider = FixedProvider(1);
        // One provider borrow across many frames, including multi-substep ones
        clock.advance(0.1, Some(&mut provider));
        for _ in 0..(3 * FAST_TICKS_PER_SECOND) {
            clock.advance(SIM_DT, Some(&mut provider));
        }
        let active = clock.state.twist.active.as_ref().expect("twist fires");
        assert_eq!(active.id, crate::sim::twist::TWIST_POOL[1].id);
    }

    #[test]
    fn test_determinism_same_seed_same_run() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut a = SessionClock::new(777, Mode::Life, profile.clone());
        let mut b = SessionClock::new(777, Mode::Life, profile);
        for _ in 0..(20 * FAST_TICKS_PER_SECOND) {
            a.advance(SIM_DT, None);
            b.advance(SIM_DT, None);
        }
        assert_eq!(a.state.fast_ticks, b.state.fast_ticks);
        assert_eq!(a.state.score, b.state.score);
        assert_eq!(a.state.entities.len(), b.state.entities.len());
        assert_eq!(a.state.metrics, b.state.metrics);
    }

    #[test]
    fn test_hold_keeps_entity_from_advancing() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut clock = SessionClock::new(42, Mode::Classic, profile);
        // Run until something spawns
        while clock.state.entities.is_empty() {
            clock.advance(SIM_DT, None);
        }
        let id = clock.state.entities[0].id;
        clock.submit(&SimEvent::Hold {
            entity_id: id,
            held: true,
        });
        let y = clock.state.entities[0].pos.y;
        clock.advance(SIM_DT, None);
        let entity = clock.state.entities.iter().find(|e| e.id == id).unwrap();
        assert_eq!(entity.pos.y, y);
    }

    proptest! {
        /// Metrics stay on the [0,100] scale, the entity count respects the
        /// cap, and score never decreases, for arbitrary event interleavings.
        #[test]
        fn prop_invariants_hold_under_random_events(
            seed in 0u64..1000,
            events in prop::collection::vec((0u8..5, 0u32..40), 1..400)
        ) {
            let profile = DifficultyProfile::for_tier(Tier::Intense);
            let mut state = SessionState::new(seed, Mode::Life, &profile);
            let mut last_score = 0u64;

            for (kind, id) in events {
                let event = match kind {
                    0 => SimEvent::MovementTick,
                    1 => SimEvent::CountdownTick,
                    2 => SimEvent::Action { entity_id: id, action: Action::Consume },
                    3 => SimEvent::Action { entity_id: id, action: Action::Reject },
                    _ => SimEvent::PowerUp(PowerUp::Ration),
                };
                apply(&mut state, &profile, None, &event);

                for metric in state.metrics.as_array() {
                    prop_assert!((0.0..=100.0).contains(&metric));
                }
                prop_assert!(state.entities.len() <= profile.max_concurrent_entities);
                prop_assert!(state.score >= last_score);
                last_score = state.score;
            }
        }
    }
}
