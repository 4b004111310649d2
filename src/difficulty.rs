//! Difficulty profiles
//!
//! A profile is an injected, session-immutable policy bundle: pacing, the
//! concurrency cap, allowed actions, miss penalties and win predicates. The
//! simulation core never hard-codes tier constants beyond the defaults here.

use serde::{Deserialize, Serialize};

use crate::sim::state::Action;

/// Built-in difficulty tiers, most lenient first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Tier {
    #[default]
    Gentle,
    Standard,
    Intense,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gentle => "Gentle",
            Tier::Standard => "Standard",
            Tier::Intense => "Intense",
        }
    }
}

/// Miss penalty magnitudes (metric points subtracted)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MissPenalties {
    /// Stability lost when an enemy crosses the boundary
    pub enemy_get_through: f32,
    /// Extra energy lost on an enemy miss (hardest tier only, 0 elsewhere)
    pub enemy_energy: f32,
    /// Nutrition (Life) or stability (Classic) lost when an ally is missed
    pub ally_missed: f32,
}

/// Immutable per-session difficulty policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub tier: Tier,
    /// Session length in seconds
    pub duration_secs: u32,
    /// Spawn interval at t=0, in seconds
    pub spawn_interval_initial: f32,
    /// Spawn interval floor, in seconds
    pub spawn_interval_min: f32,
    /// Interval reduction applied once per 10 elapsed seconds
    pub spawn_interval_decay: f32,
    /// Concurrency cap on live entities
    pub max_concurrent_entities: usize,
    /// Actions this profile accepts (further gated by mode)
    pub allowed_actions: Vec<Action>,
    pub penalties: MissPenalties,
    /// Classic victory requires stability inside this band at time-up
    pub classic_win_band: (f32, f32),
    /// Life victory requires every metric above this floor at time-up
    pub life_win_floor: f32,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self::for_tier(Tier::Gentle)
    }
}

impl DifficultyProfile {
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Gentle => Self {
                tier,
                duration_secs: 120,
                spawn_interval_initial: 3.5,
                spawn_interval_min: 1.6,
                spawn_interval_decay: 0.2,
                max_concurrent_entities: 4,
                allowed_actions: Action::ALL.to_vec(),
                penalties: MissPenalties {
                    enemy_get_through: 5.0,
                    enemy_energy: 0.0,
                    ally_missed: 2.0,
                },
                classic_win_band: (30.0, 70.0),
                life_win_floor: 15.0,
            },
            Tier::Standard => Self {
                tier,
                duration_secs: 150,
                spawn_interval_initial: 3.0,
                spawn_interval_min: 1.4,
                spawn_interval_decay: 0.25,
                max_concurrent_entities: 5,
                allowed_actions: Action::ALL.to_vec(),
                penalties: MissPenalties {
                    enemy_get_through: 8.0,
                    enemy_energy: 0.0,
                    ally_missed: 3.0,
                },
                classic_win_band: (30.0, 70.0),
                life_win_floor: 15.0,
            },
            Tier::Intense => Self {
                tier,
                duration_secs: 180,
                spawn_interval_initial: 2.4,
                spawn_interval_min: 1.0,
                spawn_interval_decay: 0.3,
                max_concurrent_entities: 6,
                allowed_actions: Action::ALL.to_vec(),
                penalties: MissPenalties {
                    enemy_get_through: 12.0,
                    enemy_energy: 4.0,
                    ally_missed: 4.0,
                },
                classic_win_band: (30.0, 70.0),
                life_win_floor: 15.0,
            },
        }
    }

    /// Parse a tier name. Unknown or malformed keys fall back to the most
    /// lenient known profile rather than failing the session.
    pub fn from_tier_name(name: &str) -> Self {
        let tier = match name.to_lowercase().as_str() {
            "gentle" | "easy" => Tier::Gentle,
            "standard" | "normal" => Tier::Standard,
            "intense" | "hard" => Tier::Intense,
            other => {
                log::warn!("Unknown difficulty tier '{other}', falling back to Gentle");
                Tier::Gentle
            }
        };
        Self::for_tier(tier)
    }

    /// Current spawn interval in seconds. Difficulty ramps in discrete
    /// 10-second steps down to the interval floor.
    pub fn spawn_interval_at(&self, elapsed_secs: u32) -> f32 {
        let steps = (elapsed_secs / 10) as f32;
        (self.spawn_interval_initial - steps * self.spawn_interval_decay)
            .max(self.spawn_interval_min)
    }

    pub fn allows(&self, action: Action) -> bool {
        self.allowed_actions.contains(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tier_falls_back_to_gentle() {
        let profile = DifficultyProfile::from_tier_name("nightmare");
        assert_eq!(profile.tier, Tier::Gentle);
    }

    #[test]
    fn test_spawn_interval_ramps_in_ten_second_steps() {
        let profile = DifficultyProfile::for_tier(Tier::Standard);
        assert_eq!(profile.spawn_interval_at(0), 3.0);
        assert_eq!(profile.spawn_interval_at(9), 3.0);
        assert_eq!(profile.spawn_interval_at(10), 2.75);
        assert_eq!(profile.spawn_interval_at(25), 2.5);
        // Clamped at the floor no matter how long the session runs
        assert_eq!(profile.spawn_interval_at(10_000), 1.4);
    }

    #[test]
    fn test_only_intense_drains_energy_on_enemy_miss() {
        assert_eq!(DifficultyProfile::for_tier(Tier::Gentle).penalties.enemy_energy, 0.0);
        assert_eq!(DifficultyProfile::for_tier(Tier::Standard).penalties.enemy_energy, 0.0);
        assert!(DifficultyProfile::for_tier(Tier::Intense).penalties.enemy_energy > 0.0);
    }
}
