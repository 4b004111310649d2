//! Combo engine
//!
//! Streaks of correct actions inside a recency window map to score
//! multipliers through an ascending tier table.

use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_WINDOW_SECS, FAST_TICKS_PER_SECOND};

/// A combo tier: minimum streak, multiplier, display title
#[derive(Debug, Clone, Copy)]
pub struct ComboTier {
    pub min_streak: u32,
    pub multiplier: f32,
    pub title: &'static str,
}

/// Ascending tier thresholds. The applicable tier is the highest whose
/// threshold is <= the current streak.
pub const COMBO_TIERS: [ComboTier; 6] = [
    ComboTier { min_streak: 3, multiplier: 1.5, title: "Warming Up" },
    ComboTier { min_streak: 5, multiplier: 2.0, title: "On a Roll" },
    ComboTier { min_streak: 8, multiplier: 2.5, title: "Snack Master" },
    ComboTier { min_streak: 12, multiplier: 3.0, title: "Unstoppable" },
    ComboTier { min_streak: 18, multiplier: 4.0, title: "Legendary" },
    ComboTier { min_streak: 25, multiplier: 5.0, title: "Nutrition Deity" },
];

/// Multiplier for a given streak count (1.0 below the first tier)
pub fn tier_multiplier(streak: u32) -> f32 {
    tier_for(streak).map(|t| t.multiplier).unwrap_or(1.0)
}

/// Highest tier reached by a streak, if any
pub fn tier_for(streak: u32) -> Option<&'static ComboTier> {
    COMBO_TIERS.iter().rev().find(|t| streak >= t.min_streak)
}

/// Current streak state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ComboState {
    pub count: u32,
    /// Longest streak reached this session
    pub best: u32,
    /// Fast tick of the last correct action
    pub last_action_tick: u64,
}

impl ComboState {
    /// Maximum gap between correct actions for the streak to continue
    pub fn window_ticks() -> u64 {
        (COMBO_WINDOW_SECS * FAST_TICKS_PER_SECOND as f32) as u64
    }

    /// Streak count this correct action would reach: continue if within the
    /// window, otherwise start a new streak at 1.
    pub fn prospective(&self, now: u64) -> u32 {
        if self.count > 0 && now.saturating_sub(self.last_action_tick) <= Self::window_ticks() {
            self.count + 1
        } else {
            1
        }
    }

    /// Commit a correct action at the given tick
    pub fn record_correct(&mut self, now: u64) {
        self.count = self.prospective(now);
        self.best = self.best.max(self.count);
        self.last_action_tick = now;
    }

    /// Any incorrect action or miss zeroes the streak
    pub fn reset(&mut self) {
        self.count = 0;
    }
}
