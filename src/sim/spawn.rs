//! Entity spawner
//!
//! Cadence is derived from elapsed time and the difficulty profile; the
//! interval ramps down in discrete 10-second steps. A spawn tick at the
//! concurrency cap is skipped, the cadence keeps running.

use glam::Vec2;
use rand::Rng;

use crate::consts::*;
use crate::difficulty::DifficultyProfile;
use crate::foods::{ALLY_TABLE, ENEMY_TABLE};
use crate::sim::state::{Faction, FoodEntity, Mode, SessionState};

/// Fixed ally/enemy pool split
pub const ALLY_SPAWN_PROBABILITY: f32 = 0.65;

/// Horizontal spawn bounds for the mode. Life mode reserves wider side
/// margins for its fixed panels.
pub fn spawn_bounds(mode: Mode) -> (f32, f32) {
    let margin = match mode {
        Mode::Classic => CLASSIC_SIDE_MARGIN,
        Mode::Life => LIFE_SIDE_MARGIN,
    };
    (margin, BOARD_WIDTH - margin)
}

/// Run once per fast tick; spawns at most one entity when the cadence fires
pub fn run_spawner(state: &mut SessionState, profile: &DifficultyProfile) {
    if state.fast_ticks < state.next_spawn_tick {
        return;
    }
    let interval = profile.spawn_interval_at(state.elapsed_secs(profile));
    state.next_spawn_tick =
        state.fast_ticks + (interval * FAST_TICKS_PER_SECOND as f32).max(1.0) as u64;

    if state.entities.len() >= profile.max_concurrent_entities {
        log::debug!(
            "Spawn skipped: {} live entities at cap {}",
            state.entities.len(),
            profile.max_concurrent_entities
        );
        return;
    }
    spawn_one(state, profile);
}

fn spawn_one(state: &mut SessionState, profile: &DifficultyProfile) {
    let roll: f32 = state.rng().random();
    let def = if roll < ALLY_SPAWN_PROBABILITY {
        ALLY_TABLE.sample(state.rng())
    } else {
        ENEMY_TABLE.sample(state.rng())
    };

    let (lo, hi) = spawn_bounds(state.mode);
    let x = state.rng().random_range(lo..hi);

    // Contextual foods resolve their goodness once, at spawn, from the sign
    // of the current phase modifier.
    let contextually_good = (def.faction == Faction::Contextual)
        .then(|| state.current_phase(profile).modifier() > 0.0);

    let id = state.next_entity_id();
    log::debug!("Spawned {:?} (#{id}) at x={x:.1}", def.id);
    state.entities.push(FoodEntity {
        id,
        food: def.id,
        faction: def.faction,
        effects: def.effects,
        pos: Vec2::new(x, SPAWN_Y),
        speed: def.speed,
        boundary: MISS_BOUNDARY_Y,
        base_points: def.base_points,
        optimal: def.optimal,
        contextually_good,
        held: false,
    });
}
