//! Action resolution
//!
//! Consumes discrete player swipe/tap events, validates them against an
//! entity and the active mode's rules, and produces score, metric and combo
//! deltas. Stale entity ids and disallowed actions are validated no-ops.

use crate::difficulty::DifficultyProfile;
use crate::sim::combo::tier_multiplier;
use crate::sim::state::{
    Action, MetricDelta, Mode, Notification, SavedFood, SessionState,
};
use crate::sim::tick::check_immediate_defeat;

/// Bonus multiplier when the active twist lists the action
const TWIST_ACTION_BONUS: f32 = 1.5;
/// Extra multiplier on Share while a share-bonus twist is active
const TWIST_SHARE_BONUS: f32 = 2.0;
/// Multiplier on Share when the social meter is charged
const SOCIAL_METER_BONUS: f32 = 1.5;
/// Social meter level that unlocks the share bonus
const SOCIAL_METER_THRESHOLD: u32 = 70;
/// Nutrition lost for rejecting a good food
const REJECT_GOOD_PENALTY: f32 = 3.0;

/// Charge-gated power-ups (max 3 invocations each per session)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUp {
    Exercise,
    Ration,
}

/// Resolve a player action against a live entity.
///
/// Resolving against a nonexistent entity is a silent no-op: it may already
/// have been missed or resolved. An action outside the mode's or profile's
/// allowed set is rejected with no state change and no penalty.
pub fn resolve(
    state: &mut SessionState,
    profile: &DifficultyProfile,
    entity_id: u32,
    action: Action,
) {
    if state.is_terminal() || state.paused {
        return;
    }
    if !state.mode.allows(action) || !profile.allows(action) {
        log::debug!("Action {action:?} not allowed in {:?} mode, ignored", state.mode);
        return;
    }
    let Some(idx) = state.entities.iter().position(|e| e.id == entity_id) else {
        log::debug!("Action {action:?} on stale entity #{entity_id}, ignored");
        return;
    };

    let entity = state.entities[idx].clone();
    let good = entity.is_good();
    let now = state.fast_ticks;
    let phase_scale = state.current_phase(profile).modifier().abs();

    let correct;
    let points_base;
    match action {
        Action::Consume => {
            correct = good;
            if correct {
                // Full positive effects, scaled by the phase modifier
                let delta = mode_effects(state.mode, &entity.effects.scaled(phase_scale));
                state.metrics.apply(&delta);
                points_base = entity.base_points as f32;
            } else {
                // You ate it anyway: full negative effects, half points
                let delta = mode_effects(state.mode, &entity.effects);
                state.metrics.apply(&delta);
                points_base = entity.base_points as f32 * 0.5;
            }
            // The nutrient payload goes to the external health collaborator
            // whether or not eating it was the right call.
            state.outbox.push(Notification::FoodConsumed {
                food: entity.food,
                nutrients: entity.effects,
            });
        }
        Action::Reject => {
            correct = !good;
            if correct {
                points_base = entity.base_points as f32;
            } else {
                points_base = 0.0;
                let penalty = MetricDelta::new(0.0, 0.0, -REJECT_GOOD_PENALTY, 0.0);
                state.metrics.apply(&mode_effects(state.mode, &penalty));
            }
        }
        Action::Save => {
            let Some(slot) = state.saved_slots.iter_mut().find(|s| s.is_none()) else {
                // All three slots occupied: zero points, entity stays put
                log::debug!("Save rejected, all slots full");
                state.announce("Pantry is full!");
                return;
            };
            *slot = Some(SavedFood {
                food: entity.food,
                effects: entity.effects,
            });
            correct = true;
            points_base = entity.base_points as f32;
        }
        Action::Share => {
            correct = true;
            points_base = entity.base_points as f32;
        }
    }

    // The multiplier uses the streak the action lands on, so the third
    // correct action in a row already scores at the first tier.
    let streak = if correct { state.combo.prospective(now) } else { 0 };
    let mut multiplier = tier_multiplier(streak);

    if let Some((optimal, bonus)) = entity.optimal {
        if action == optimal {
            multiplier *= bonus;
            state.counters.optimal_choices += 1;
        }
    }
    if let Some(twist) = &state.twist.active {
        if twist.bonus_actions.contains(&action) {
            multiplier *= TWIST_ACTION_BONUS;
        }
        if twist.share_bonus && action == Action::Share {
            multiplier *= TWIST_SHARE_BONUS;
        }
    }
    if action == Action::Share && state.social.meter >= SOCIAL_METER_THRESHOLD {
        multiplier *= SOCIAL_METER_BONUS;
    }

    if correct {
        state.combo.record_correct(now);
        state.counters.correct += 1;
    } else {
        state.combo.reset();
        state.counters.incorrect += 1;
    }

    if action == Action::Share {
        state.social.record_share();
    } else {
        state.social.break_streak();
    }

    let points = (points_base * multiplier).round() as u64;
    state.score += points;
    state.entities.remove(idx);

    let verdict = if correct { "+" } else { "x" };
    state.announce(format!("{verdict}{points} {}", entity.food.as_str()));
    log::debug!(
        "Resolved {:?} on {:?}: correct={correct} streak={} mult={multiplier:.2} +{points}",
        action,
        entity.food,
        state.combo.count
    );

    // Effects may have pushed a metric into the critical floor
    check_immediate_defeat(state);
}

/// In Classic mode only the stability component of an effect vector is live
fn mode_effects(mode: Mode, effects: &MetricDelta) -> MetricDelta {
    match mode {
        Mode::Classic => MetricDelta::new(0.0, 0.0, 0.0, effects.stability),
        Mode::Life => *effects,
    }
}

/// Invoke a power-up. Zero remaining charges is a rejected no-op.
pub fn invoke_power_up(state: &mut SessionState, kind: PowerUp) {
    if state.is_terminal() || state.paused {
        return;
    }
    let charges = match kind {
        PowerUp::Exercise => &mut state.charges.exercise,
        PowerUp::Ration => &mut state.charges.ration,
    };
    if *charges == 0 {
        log::debug!("{kind:?} invoked with no charges left, ignored");
        return;
    }
    *charges -= 1;

    match (kind, state.mode) {
        (PowerUp::Exercise, Mode::Life) => {
            state.metrics.apply(&MetricDelta::new(-4.0, 0.0, 0.0, 8.0));
        }
        (PowerUp::Ration, Mode::Life) => {
            state.metrics.apply(&MetricDelta::new(0.0, 10.0, 6.0, 0.0));
        }
        // Classic power-ups nudge stability back toward balanced
        (PowerUp::Exercise, Mode::Classic) => nudge_stability(state, 8.0),
        (PowerUp::Ration, Mode::Classic) => nudge_stability(state, 5.0),
    }
    state.announce(match kind {
        PowerUp::Exercise => "Exercise!",
        PowerUp::Ration => "Ration break!",
    });
}

fn nudge_stability(state: &mut SessionState, step: f32) {
    let gap = crate::consts::METRIC_BALANCED - state.metrics.stability;
    let delta = gap.clamp(-step, step);
    state
        .metrics
        .apply(&MetricDelta::new(0.0, 0.0, 0.0, delta));
}
