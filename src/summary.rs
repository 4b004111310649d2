//! Post-game summary
//!
//! A flat, serializable report built from the terminal session state and its
//! bounded per-second metrics history. This is what the results screen and
//! the headless driver print.

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyProfile;
use crate::sim::state::{BodyMetrics, SessionResult, SessionState};

/// Observed low/high water marks for one metric over the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub seed: u64,
    pub tier: String,
    pub result: SessionResult,
    pub score: u64,
    pub elapsed_secs: u32,
    pub final_metrics: BodyMetrics,
    /// [energy, hydration, nutrition, stability] ranges over the history
    pub metric_ranges: [MetricRange; 4],
    /// Correct actions over all actions taken, in [0, 1]
    pub accuracy: f32,
    pub best_combo: u32,
    pub optimal_choices: u32,
    pub shares: u32,
}

impl SessionSummary {
    pub fn from_state(state: &SessionState, profile: &DifficultyProfile) -> Self {
        let total_actions = state.counters.correct + state.counters.incorrect;
        let accuracy = if total_actions > 0 {
            state.counters.correct as f32 / total_actions as f32
        } else {
            0.0
        };

        // Fold the history into per-metric water marks, seeded from the
        // final values so an empty history still yields a sane range.
        let mut ranges = state.metrics.as_array().map(|v| MetricRange { min: v, max: v });
        for sample in &state.history {
            for (range, value) in ranges.iter_mut().zip(sample.metrics.as_array()) {
                range.min = range.min.min(value);
                range.max = range.max.max(value);
            }
        }

        Self {
            seed: state.seed,
            tier: profile.tier.as_str().to_string(),
            result: state.result,
            score: state.score,
            elapsed_secs: state.elapsed_secs(profile),
            final_metrics: state.metrics,
            metric_ranges: ranges,
            accuracy,
            best_combo: state.combo.best,
            optimal_choices: state.counters.optimal_choices,
            shares: state.social.shares,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Tier;
    use crate::sim::state::Mode;

    #[test]
    fn test_summary_folds_history_water_marks() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = SessionState::new(3, Mode::Life, &profile);
        state.metrics.energy = 40.0;
        state.record_history(1);
        state.metrics.energy = 80.0;
        state.record_history(2);
        state.metrics.energy = 60.0;

        let summary = SessionSummary::from_state(&state, &profile);
        assert_eq!(summary.metric_ranges[0].min, 40.0);
        assert_eq!(summary.metric_ranges[0].max, 80.0);
        assert_eq!(summary.final_metrics.energy, 60.0);
    }

    #[test]
    fn test_accuracy_handles_zero_actions() {
        let profile = DifficultyProfile::for_tier(Tier::Gentle);
        let state = SessionState::new(3, Mode::Classic, &profile);
        let summary = SessionSummary::from_state(&state, &profile);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.tier, "Gentle");
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        let mut state = SessionState::new(3, Mode::Life, &profile);
        state.score = 420;
        state.counters.correct = 9;
        state.counters.incorrect = 1;

        let summary = SessionSummary::from_state(&state, &profile);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"score\":420"));
        assert!((summary.accuracy - 0.9).abs() < 1e-6);
    }
}
