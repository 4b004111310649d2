//! Movement and miss detection
//!
//! Runs every fast tick: entities not held by a gesture advance along the
//! travel axis; an unresolved entity crossing its boundary is a miss. Misses
//! zero the combo, apply the tier-scaled penalty, and run the immediate
//! defeat check without waiting for the next countdown tick.

use crate::difficulty::DifficultyProfile;
use crate::sim::state::{FoodEntity, MetricDelta, Mode, SessionState};
use crate::sim::tick::check_immediate_defeat;

/// Advance all entities one fast tick and resolve any misses
pub fn movement_tick(state: &mut SessionState, profile: &DifficultyProfile) {
    for entity in &mut state.entities {
        if !entity.held {
            entity.pos.y += entity.speed;
        }
    }

    // Split off everything past the boundary, then apply penalties in id
    // order so the outcome is deterministic.
    let mut missed = Vec::new();
    state.entities.retain(|e| {
        if e.pos.y >= e.boundary {
            missed.push(e.clone());
            false
        } else {
            true
        }
    });

    for entity in missed {
        if state.is_terminal() {
            break;
        }
        apply_miss(state, profile, &entity);
    }
}

fn apply_miss(state: &mut SessionState, profile: &DifficultyProfile, entity: &FoodEntity) {
    state.combo.reset();
    let penalties = &profile.penalties;

    // Contextual misses are penalized by their resolved goodness
    let delta = if entity.is_good() {
        match state.mode {
            Mode::Classic => MetricDelta::new(0.0, 0.0, 0.0, -penalties.ally_missed),
            Mode::Life => MetricDelta::new(0.0, 0.0, -penalties.ally_missed, 0.0),
        }
    } else {
        MetricDelta::new(
            -penalties.enemy_energy,
            0.0,
            0.0,
            -penalties.enemy_get_through,
        )
    };
    state.metrics.apply(&delta);

    log::debug!(
        "Miss: {:?} (#{}) crossed the boundary, stability now {:.1}",
        entity.food,
        entity.id,
        state.metrics.stability
    );
    state.announce(format!("{} got away!", entity.food.as_str()));

    // Extreme values must not wait a full second for the countdown loop
    check_immediate_defeat(state);
}
